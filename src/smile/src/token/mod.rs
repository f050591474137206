// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Pull lexer for equations, with one token of lookahead.
//!
//! Scanning happens on demand: each call to `peek` or `next_token`
//! runs the dispatch loop only as far as needed to produce the next
//! token.  Newlines act as statement terminators when the previous
//! token could end a statement, in the same way Go inserts semicolons.
//! Only `//` line comments are recognized.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use lazy_static::lazy_static;
use regex::Regex;
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::common::{Diagnostic, Diagnostics, ErrorCode, LineTable, Pos, Position};

#[cfg(test)]
mod test;

pub const TERMINATOR: char = ';';

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Ident,
    Num,
    /// a double-quoted string literal; the token text excludes the quotes
    Str,
    /// statement terminator, either an explicit `;` or an inserted one
    Semi,
    Operator,
    /// literal brackets: `{` and `}`
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

impl TokenKind {
    /// can_end_statement reports whether a newline directly after a
    /// token of this kind terminates the statement.
    pub fn can_end_statement(self) -> bool {
        use TokenKind::*;
        matches!(self, Ident | Num | Str | RParen | RBracket | RBrace)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind::*;
        let name = match self {
            Eof => "eof",
            Ident => "ident",
            Num => "num",
            Str => "lit",
            Semi => "semi",
            Operator => "op",
            LBrace => "lbrace",
            RBrace => "rbrace",
            LParen => "lparen",
            RParen => "rparen",
            LBracket => "lbracket",
            RBracket => "rbracket",
        };

        write!(f, "{name}")
    }
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token<'input> {
    pub kind: TokenKind,
    pub pos: Pos,
    pub text: &'input str,
}

impl<'input> Token<'input> {
    fn new(kind: TokenKind, pos: usize, text: &'input str) -> Self {
        Token {
            kind,
            pos: Pos(pos),
            text,
        }
    }

    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    /// end is the offset just past the token's text in the source.
    pub fn end(&self) -> Pos {
        self.pos + self.text.len()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            TokenKind::Semi => write!(f, "({} ;)", self.kind),
            TokenKind::Eof => write!(f, "({})", self.kind),
            _ => write!(f, "({} {})", self.kind, self.text),
        }
    }
}

/// normalize makes sure the equation ends with an explicit statement
/// terminator, so scanning always reaches a terminal state.
pub fn normalize(eqn: &str) -> Cow<'_, str> {
    if eqn.trim_end().ends_with(TERMINATOR) {
        Cow::Borrowed(eqn)
    } else {
        Cow::Owned(format!("{eqn}{TERMINATOR}"))
    }
}

fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        ',' | '+'
            | '-'
            | '*'
            | '/'
            | '^'
            | '|'
            | '&'
            | '='
            | '<'
            | '>'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
    )
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn is_identifier_start(c: char) -> bool {
    !(c.is_ascii_digit()
        || c.is_whitespace()
        || c.is_control()
        || is_punctuation(c)
        || c == '"'
        || c == TERMINATOR)
}

fn is_identifier_continue(c: char) -> bool {
    !(c.is_whitespace() || c.is_control() || is_punctuation(c) || c == TERMINATOR)
}

pub struct Lexer<'input> {
    text: &'input str,
    chars: Peekable<CharIndices<'input>>,
    lines: LineTable,
    // scanned tokens not yet handed to the caller; holds at most the
    // lookahead token plus a synthesized `*`
    pending: VecDeque<Token<'input>>,
    can_terminate: bool,
    done: bool,
    eof: Token<'input>,
    errors: Diagnostics,
}

impl<'input> Lexer<'input> {
    /// new returns a lexer over `text`, which should already be
    /// normalized.
    pub fn new(text: &'input str) -> Self {
        Lexer {
            text,
            chars: text.char_indices().peekable(),
            lines: LineTable::new(),
            pending: VecDeque::with_capacity(2),
            can_terminate: false,
            done: false,
            eof: Token::new(TokenKind::Eof, text.len(), ""),
            errors: Diagnostics::new(),
        }
    }

    pub fn text(&self) -> &'input str {
        self.text
    }

    /// peek returns the next token without consuming it.
    pub fn peek(&mut self) -> Token<'input> {
        self.fill();
        self.pending.front().copied().unwrap_or(self.eof)
    }

    /// next_token consumes and returns the next token.  Once the end of
    /// input has been reached it keeps returning the Eof token.
    pub fn next_token(&mut self) -> Token<'input> {
        self.fill();
        self.pending.pop_front().unwrap_or(self.eof)
    }

    /// resolve turns `pos` into a line and column.  Only positions of
    /// tokens that have already been scanned are guaranteed to be on
    /// the right line.
    pub fn resolve(&self, pos: Pos) -> Position {
        self.lines.position(self.text, pos)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn take_errors(&mut self) -> Diagnostics {
        std::mem::take(&mut self.errors)
    }

    fn fill(&mut self) {
        if self.pending.is_empty() && !self.done {
            self.scan();
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((i, '\n')) = next {
            self.lines.add_line(i + 1);
        }
        next
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.text.len(), |&(i, _)| i)
    }

    fn take_until<F>(&mut self, mut terminate: F) -> Option<usize>
    where
        F: FnMut(char) -> bool,
    {
        while let Some(&(i, c)) = self.chars.peek() {
            if terminate(c) {
                return Some(i);
            }
            self.bump();
        }
        None
    }

    fn advance_to(&mut self, end: usize) {
        while let Some(&(i, _)) = self.chars.peek() {
            if i >= end {
                break;
            }
            self.bump();
        }
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.pending
            .push_back(Token::new(kind, start, &self.text[start..end]));
        self.can_terminate = kind.can_end_statement();
    }

    fn emit_eof(&mut self, at: usize) {
        self.eof = Token::new(TokenKind::Eof, at, "");
        self.pending.push_back(self.eof);
        self.done = true;
    }

    fn error(&mut self, code: ErrorCode, at: usize, msg: String) {
        let pos = self.resolve(Pos(at));
        tracing::debug!(%pos, %code, "lexical error: {msg}");
        self.errors.push(Diagnostic::new(code, pos, msg));
        self.emit_eof(at);
    }

    /// scan runs the dispatch loop until at least one token has been
    /// queued.
    fn scan(&mut self) {
        loop {
            let Some((i, c)) = self.bump() else {
                let end = self.text.len();
                if self.can_terminate {
                    self.emit(TokenKind::Semi, end, end);
                }
                self.emit_eof(end);
                return;
            };

            match c {
                '/' if self.peek_char() == Some('/') => self.line_comment(),
                TERMINATOR => return self.emit(TokenKind::Semi, i, i + 1),
                '\n' if self.can_terminate => return self.emit(TokenKind::Semi, i, i + 1),
                c if c.is_whitespace() => {}
                c if is_number_start(c) => return self.number(i),
                '"' => return self.literal(i),
                c if is_punctuation(c) => return self.punctuation(i, c),
                c if is_identifier_start(c) => return self.identifier(i),
                c => {
                    let msg = format!("unrecognized character {:?} (U+{:04X})", c, c as u32);
                    return self.error(ErrorCode::UnrecognizedChar, i, msg);
                }
            }
        }
    }

    fn line_comment(&mut self) {
        self.take_until(|c| c == '\n');
    }

    /// block_comment skips a `/* ... */` comment.  It isn't reachable
    /// from `scan`: `/*` lexes as two operators.
    #[allow(dead_code)]
    fn block_comment(&mut self) {
        // eat the '*' of the opening delimiter so `/*/` isn't a
        // complete comment
        self.bump();
        while let Some((_, c)) = self.bump() {
            if c == '*' && self.peek_char() == Some('/') {
                self.bump();
                return;
            }
        }
    }

    fn number(&mut self, start: usize) {
        lazy_static! {
            static ref NUMBER_RE: Regex =
                Regex::new(r"^[0-9]*(\.[0-9]*)?([eE][-+]?[0-9]*)?").unwrap();
        }

        let len = NUMBER_RE
            .find(&self.text[start..])
            .map_or(1, |m| m.end().max(1));
        let end = start + len;
        self.advance_to(end);
        self.emit(TokenKind::Num, start, end);
    }

    fn literal(&mut self, start: usize) {
        match self.take_until(|c| c == '"') {
            Some(end) => {
                // eat the closing '"'
                self.bump();
                self.emit(TokenKind::Str, start + 1, end);
            }
            None => {
                let msg = "string literal not terminated".to_owned();
                self.error(ErrorCode::UnclosedStringLiteral, start, msg)
            }
        }
    }

    fn punctuation(&mut self, start: usize, c: char) {
        use TokenKind::*;
        let kind = match c {
            '{' => LBrace,
            '}' => RBrace,
            '(' => LParen,
            ')' => RParen,
            '[' => LBracket,
            ']' => RBracket,
            _ => Operator,
        };
        self.emit(kind, start, start + 1);

        // `(a)(b)` means `(a)*(b)`.  The synthesized operator doesn't
        // change whether a newline may terminate the statement.
        if c == ')' && self.peek_char() == Some('(') {
            let at = self.offset();
            self.pending.push_back(Token::new(Operator, at, "*"));
        }
    }

    fn identifier(&mut self, start: usize) {
        let end = self
            .take_until(|c| !is_identifier_continue(c))
            .unwrap_or(self.text.len());
        self.emit(TokenKind::Ident, start, end);
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Token<'input>;

    /// next yields every token up to and including Eof, then None.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done && self.pending.is_empty() {
            return None;
        }
        Some(self.next_token())
    }
}
