// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use super::TokenKind::*;
use super::{Lexer, TokenKind, normalize};
use crate::common::{ErrorCode, Pos};

// each expected span marks the token's text with `~`s; an empty text
// (an inserted terminator) is marked with a single `^`
fn test(input: &str, expected: Vec<(&str, TokenKind, &str)>) {
    let mut lexer = Lexer::new(input);
    for (expected_span, expected_kind, expected_text) in expected.into_iter() {
        let tok = lexer.next_token();
        let expected_start = expected_span
            .find(['~', '^'])
            .expect("span marker missing");
        assert_eq!(expected_kind, tok.kind, "kind of {tok} in {input:?}");
        assert_eq!(expected_text, tok.text, "text of {tok} in {input:?}");
        assert_eq!(Pos(expected_start), tok.pos, "pos of {tok} in {input:?}");
        if expected_span.contains('~') {
            let expected_end = expected_span.rfind('~').unwrap() + 1;
            assert_eq!(Pos(expected_end), tok.end());
        }
    }

    assert_eq!(Eof, lexer.next_token().kind, "trailing tokens in {input:?}");
    assert!(!lexer.has_errors());
}

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input).map(|tok| tok.kind).collect()
}

fn test_err(input: &str, expected: (&str, ErrorCode)) {
    let mut lexer = Lexer::new(input);
    let last = lexer.by_ref().last().unwrap();
    assert_eq!(Eof, last.kind);

    let (expected_span, expected_code) = expected;
    let expected_start = expected_span.find('~').unwrap();
    let errs = lexer.take_errors().into_sorted();
    assert_eq!(1, errs.len());
    assert_eq!(expected_code, errs[0].code);
    assert!(errs[0].code.is_lexical());
    assert_eq!(expected_start, errs[0].pos.offset);
    assert_eq!(Pos(expected_start), last.pos);
}

#[test]
fn arithmetic() {
    test(
        "population*.08",
        vec![
            ("~~~~~~~~~~    ", Ident, "population"),
            ("          ~   ", Operator, "*"),
            ("           ~~~", Num, ".08"),
            ("              ^", Semi, ""),
        ],
    );
}

#[test]
fn call() {
    test(
        "MIN(a, b)+c;",
        vec![
            ("~~~         ", Ident, "MIN"),
            ("   ~        ", LParen, "("),
            ("    ~       ", Ident, "a"),
            ("     ~      ", Operator, ","),
            ("       ~    ", Ident, "b"),
            ("        ~   ", RParen, ")"),
            ("         ~  ", Operator, "+"),
            ("          ~ ", Ident, "c"),
            ("           ~", Semi, ";"),
        ],
    );
}

#[test]
fn punctuation() {
    test(
        "^|&=<>[]{}-/",
        vec![
            ("~           ", Operator, "^"),
            (" ~          ", Operator, "|"),
            ("  ~         ", Operator, "&"),
            ("   ~        ", Operator, "="),
            ("    ~       ", Operator, "<"),
            ("     ~      ", Operator, ">"),
            ("      ~     ", LBracket, "["),
            ("       ~    ", RBracket, "]"),
            ("        ~   ", LBrace, "{"),
            ("         ~  ", RBrace, "}"),
            ("          ~ ", Operator, "-"),
            ("           ~", Operator, "/"),
        ],
    );
}

#[test]
fn numbers() {
    test("1e10", vec![("~~~~", Num, "1e10"), ("    ^", Semi, "")]);
    test("2.5E-3", vec![("~~~~~~", Num, "2.5E-3"), ("      ^", Semi, "")]);
    test("3.", vec![("~~", Num, "3."), ("  ^", Semi, "")]);
    // a lone '.' is a (degenerate) number
    test(".", vec![("~", Num, "."), (" ^", Semi, "")]);
    // numbers stop at the first rune that can't continue them
    test(
        "2x",
        vec![("~ ", Num, "2"), (" ~", Ident, "x"), ("  ^", Semi, "")],
    );
}

#[test]
fn idents() {
    test("oh.no", vec![("~~~~~", Ident, "oh.no"), ("     ^", Semi, "")]);
    test("_3 n3_", vec![("~~    ", Ident, "_3"), ("   ~~~", Ident, "n3_"), ("      ^", Semi, "")]);
    test("året", vec![("~~~~~", Ident, "året"), ("     ^", Semi, "")]);
    test("$x", vec![("~~", Ident, "$x"), ("  ^", Semi, "")]);
}

#[test]
fn string_literal() {
    test(
        "\"a b\" x",
        vec![(" ~~~   ", Str, "a b"), ("      ~", Ident, "x"), ("       ^", Semi, "")],
    );
    // no escape processing
    test(
        r#""a\n""#,
        vec![(" ~~~ ", Str, r"a\n"), ("     ^", Semi, "")],
    );
}

#[test]
fn line_comment() {
    test(
        "a // ignored\nb",
        vec![
            ("~             ", Ident, "a"),
            ("            ~ ", Semi, "\n"),
            ("             ~", Ident, "b"),
            ("              ^", Semi, ""),
        ],
    );
}

#[test]
fn slash_star_is_not_a_comment() {
    test(
        "a/*b",
        vec![
            ("~   ", Ident, "a"),
            (" ~  ", Operator, "/"),
            ("  ~ ", Operator, "*"),
            ("   ~", Ident, "b"),
            ("    ^", Semi, ""),
        ],
    );
}

#[test]
fn newline_termination() {
    // newlines only terminate a statement after a token that can end one
    assert_eq!(
        vec![Ident, Operator, Ident, Semi, Eof],
        kinds("a +\nb")
    );
    assert_eq!(
        vec![Ident, Semi, Ident, Semi, Eof],
        kinds("a\nb")
    );
    assert_eq!(
        vec![LParen, Ident, RParen, Semi, Num, Semi, Eof],
        kinds("(a)\n\n1")
    );
    assert_eq!(vec![Num, Semi, Semi, Eof], kinds("1\n;"));
    // nothing to terminate
    assert_eq!(vec![Eof], kinds("\n\n"));
    assert_eq!(vec![Eof], kinds("// just a comment"));
}

#[test]
fn implicit_multiplication() {
    test(
        "(a)(b)",
        vec![
            ("~     ", LParen, "("),
            (" ~    ", Ident, "a"),
            ("  ~   ", RParen, ")"),
            ("   ^  ", Operator, "*"),
            ("   ~  ", LParen, "("),
            ("    ~ ", Ident, "b"),
            ("     ~", RParen, ")"),
            ("      ^", Semi, ""),
        ],
    );
    // only directly adjacent parens multiply
    assert_eq!(
        vec![LParen, Ident, RParen, LParen, Ident, RParen, Semi, Eof],
        kinds("(a) (b)")
    );
}

#[test]
fn peek_does_not_consume() {
    let mut lexer = Lexer::new("a+b");
    assert_eq!("a", lexer.peek().text);
    assert_eq!("a", lexer.peek().text);
    assert_eq!("a", lexer.next_token().text);
    assert_eq!("+", lexer.peek().text);
    assert_eq!("+", lexer.next_token().text);
    assert_eq!("b", lexer.next_token().text);
    assert_eq!(Semi, lexer.next_token().kind);
    assert_eq!(Eof, lexer.next_token().kind);
    // the end marker is sticky
    assert_eq!(Eof, lexer.peek().kind);
    assert_eq!(Eof, lexer.next_token().kind);
}

#[test]
fn iterator_is_finite() {
    let toks: Vec<_> = Lexer::new("a").collect();
    assert_eq!(3, toks.len());
    assert_eq!(Eof, toks[2].kind);
}

#[test]
fn line_table_tracks_newlines() {
    let mut lexer = Lexer::new("a +\n  b\n\t* c");
    let toks: Vec<_> = lexer.by_ref().collect();
    let c = toks.iter().find(|t| t.text == "c").unwrap();
    let pos = lexer.resolve(c.pos);
    assert_eq!((3, 4), (pos.line, pos.column));
    let b = toks.iter().find(|t| t.text == "b").unwrap();
    let pos = lexer.resolve(b.pos);
    assert_eq!((2, 3), (pos.line, pos.column));
}

#[test]
fn errors() {
    test_err("a + \u{7}b", ("    ~  ", ErrorCode::UnrecognizedChar));
    test_err("x + \"abc", ("    ~~~~", ErrorCode::UnclosedStringLiteral));
}

#[test]
fn error_positions_resolve_to_lines() {
    let mut lexer = Lexer::new("a +\n  \u{1}");
    assert_eq!(3, lexer.by_ref().count());
    let errs = lexer.take_errors().into_sorted();
    assert_eq!(ErrorCode::UnrecognizedChar, errs[0].code);
    assert_eq!(6, errs[0].pos.offset);
    assert_eq!((2, 3), (errs[0].pos.line, errs[0].pos.column));
}

#[test]
fn scanning_stops_at_first_error() {
    let mut lexer = Lexer::new("a \u{0} b \u{1} c");
    let toks: Vec<_> = lexer.by_ref().collect();
    assert_eq!(vec![Ident, Eof], toks.iter().map(|t| t.kind).collect::<Vec<_>>());
    assert_eq!(1, lexer.take_errors().len());
}

#[test]
fn normalization() {
    assert_eq!("a+b;", normalize("a+b"));
    assert_eq!("a+b;", normalize("a+b;"));
    assert_eq!("a+b; \n", normalize("a+b; \n"));
    assert_eq!("a\n;", normalize("a\n"));
    assert_eq!(";", normalize(""));
}
