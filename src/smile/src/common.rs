// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::ops::Add;

#[cfg(feature = "serde")]
use serde::Serialize;
use thiserror::Error;

/// Tabs in a rendered source line are expanded to this many columns so
/// the caret under it lines up.
pub const TAB_WIDTH: usize = 8;

/// Pos is a byte offset into the (normalized) text of a single equation.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(pub usize);

impl Pos {
    pub fn offset(self) -> usize {
        self.0
    }
}

impl Add<usize> for Pos {
    type Output = Pos;

    fn add(self, rhs: usize) -> Pos {
        Pos(self.0 + rhs)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position is a Pos resolved to a human-facing line and column,
/// both 1-based.  Columns count characters, not bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// LineTable records the offset at which each line starts.  The lexer
/// grows it as it consumes newlines, so a Pos can be resolved as soon
/// as the token carrying it has been scanned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineTable {
    lines: Vec<usize>,
}

impl Default for LineTable {
    fn default() -> Self {
        LineTable { lines: vec![0] }
    }
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// add_line records that a new line begins at `offset`.  Offsets
    /// must be added in increasing order; stale ones are ignored.
    pub fn add_line(&mut self, offset: usize) {
        if offset > *self.lines.last().unwrap_or(&0) {
            self.lines.push(offset);
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// position resolves `pos` against `text`, the source the table
    /// was built from.
    pub fn position(&self, text: &str, pos: Pos) -> Position {
        let offset = pos.offset();
        let line = self.lines.partition_point(|&start| start <= offset).max(1);
        let line_start = self.lines[line - 1];
        let column = text
            .get(line_start..offset.min(text.len()))
            .map_or(0, |prefix| prefix.chars().count())
            + 1;

        Position {
            offset,
            line,
            column,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnrecognizedChar,
    UnclosedStringLiteral,
    UnexpectedToken,
    UnexpectedEof,
    ExpectedRParen,
    ExpectedRBracket,
    BadCallArgs,
    ExtraToken,
    EmptyEquation,
    MissingTerminator,
    NestingTooDeep,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            UnrecognizedChar => "unrecognized_char",
            UnclosedStringLiteral => "unclosed_string_literal",
            UnexpectedToken => "unexpected_token",
            UnexpectedEof => "unexpected_eof",
            ExpectedRParen => "expected_rparen",
            ExpectedRBracket => "expected_rbracket",
            BadCallArgs => "bad_call_args",
            ExtraToken => "extra_token",
            EmptyEquation => "empty_equation",
            MissingTerminator => "missing_terminator",
            NestingTooDeep => "nesting_too_deep",
        };

        write!(f, "{name}")
    }
}

impl ErrorCode {
    pub fn is_lexical(self) -> bool {
        matches!(
            self,
            ErrorCode::UnrecognizedChar | ErrorCode::UnclosedStringLiteral
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub pos: Position,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, pos: Position, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

/// Diagnostics accumulates errors in the order they were reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn append(&mut self, other: &mut Diagnostics) {
        self.0.append(&mut other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// into_sorted orders diagnostics by position, keeping report order
    /// for ties, and drops every diagnostic at an already-reported
    /// position.  Later errors at the same spot are almost always
    /// cascades of the first.
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut errs = self.0;
        errs.sort_by_key(|err| err.pos.offset);
        errs.dedup_by_key(|err| err.pos.offset);
        errs
    }
}

/// ParseError is returned when an equation can't be turned into an
/// AST.  `diagnostics` is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{name}:{}", summarize(.diagnostics))]
pub struct ParseError {
    pub name: String,
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "no errors".to_owned(),
        [first] => format!("{}: error: {}", first.pos, first.message),
        [first, rest @ ..] => format!(
            "{}: error: {} (and {} more errors)",
            first.pos,
            first.message,
            rest.len()
        ),
    }
}

impl ParseError {
    pub fn first(&self) -> &Diagnostic {
        &self.diagnostics[0]
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    /// render formats every diagnostic compiler-style: a header, the
    /// offending line, and a caret under the column at fault.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for diag in self.diagnostics.iter() {
            let line = source_line(&self.text, diag.pos);
            let prefix: usize = line
                .chars()
                .take(diag.pos.column - 1)
                .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
                .sum();
            let expanded = line.replace('\t', &" ".repeat(TAB_WIDTH));

            out.push_str(&format!(
                "{}:{}: error: {}\n",
                self.name, diag.pos, diag.message
            ));
            out.push_str(&expanded);
            out.push('\n');
            out.push_str(&" ".repeat(prefix));
            out.push_str("^\n");
        }
        out
    }
}

fn source_line(text: &str, pos: Position) -> &str {
    let offset = pos.offset.min(text.len());
    let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = text[start..].find('\n').map_or(text.len(), |i| start + i);
    &text[start..end]
}

#[test]
fn test_line_table_position() {
    let text = "a +\n\tbb *\n c";
    let mut lines = LineTable::new();
    lines.add_line(4);
    lines.add_line(10);
    // out of order adds are ignored
    lines.add_line(4);
    assert_eq!(3, lines.line_count());

    let pos = lines.position(text, Pos(0));
    assert_eq!((1, 1), (pos.line, pos.column));
    let pos = lines.position(text, Pos(2));
    assert_eq!((1, 3), (pos.line, pos.column));
    let pos = lines.position(text, Pos(5));
    assert_eq!((2, 2), (pos.line, pos.column));
    let pos = lines.position(text, Pos(11));
    assert_eq!((3, 2), (pos.line, pos.column));
    assert_eq!("3:2", pos.to_string());
}

#[test]
fn test_position_counts_chars() {
    let text = "é + x";
    let lines = LineTable::new();
    // 'é' is two bytes wide, but only one column
    let pos = lines.position(text, Pos(5));
    assert_eq!(5, pos.column);
}

#[test]
fn test_diagnostics_sorted_and_deduplicated() {
    let at = |offset| Position {
        offset,
        line: 1,
        column: offset + 1,
    };
    let mut errs = Diagnostics::new();
    errs.push(Diagnostic::new(ErrorCode::UnexpectedToken, at(4), "second"));
    errs.push(Diagnostic::new(ErrorCode::UnexpectedEof, at(1), "first"));
    errs.push(Diagnostic::new(ErrorCode::BadCallArgs, at(4), "cascade"));
    assert_eq!(3, errs.len());

    let errs = errs.into_sorted();
    let messages: Vec<&str> = errs.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(vec!["first", "second"], messages);
}

#[test]
fn test_parse_error_display_and_render() {
    let err = ParseError {
        name: "flow".to_owned(),
        text: "a +\n\tb )".to_owned(),
        diagnostics: vec![
            Diagnostic::new(
                ErrorCode::ExtraToken,
                Position {
                    offset: 7,
                    line: 2,
                    column: 4,
                },
                "expected end-of-equation",
            ),
            Diagnostic::new(
                ErrorCode::UnexpectedEof,
                Position {
                    offset: 8,
                    line: 2,
                    column: 5,
                },
                "unexpected end of equation",
            ),
        ],
    };

    assert_eq!(
        "flow:2:4: error: expected end-of-equation (and 1 more errors)",
        err.to_string()
    );

    let rendered = err.render();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!("flow:2:4: error: expected end-of-equation", lines[0]);
    assert_eq!("        b )", lines[1]);
    assert_eq!("          ^", lines[2]);
    assert_eq!(6, lines.len());
}
