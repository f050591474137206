// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for the equation parser.
//!
//! These tests verify that:
//! 1. parsing is deterministic
//! 2. printing a parsed equation preserves its token sequence
//! 3. every node's span covers its children and ends where its last
//!    child or closing delimiter does
//! 4. arbitrary input never panics the parser

use proptest::prelude::*;

use crate::ast::{Expr, print_eqn};
use crate::parser::parse;
use crate::token::{Lexer, TokenKind};
use crate::walk::inspect;

fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,7}".prop_map(|s| s.to_string())
}

fn number_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..10000).prop_map(|n| n.to_string()),
        "[0-9]{1,3}\\.[0-9]{1,3}",
        "\\.[0-9]{1,3}",
        "[1-9]e[0-9]",
    ]
}

fn function_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("MIN".to_string()),
        Just("MAX".to_string()),
        Just("SMTH1".to_string()),
        Just("PULSE".to_string()),
        "[A-Z][A-Z0-9_]{0,5}",
    ]
}

fn op_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("^")]
}

fn spacing_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(""), Just(" "), Just("\t"), Just("  ")]
}

/// equation_strategy generates syntactically valid equations.
fn equation_strategy() -> BoxedStrategy<String> {
    let leaf = prop_oneof![ident_strategy(), number_strategy()];
    leaf.prop_recursive(6, 48, 4, |inner| {
        prop_oneof![
            (inner.clone(), spacing_strategy(), op_strategy(), inner.clone())
                .prop_map(|(l, sp, op, r)| format!("{l}{sp}{op}{sp}{r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("-{e}")),
            (function_strategy(), prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(f, args)| format!("{f}({})", args.join(", "))),
            (ident_strategy(), inner).prop_map(|(x, i)| format!("{x}[{i}]")),
        ]
    })
    .boxed()
}

fn significant_tokens(eqn: &str) -> Vec<(TokenKind, String)> {
    Lexer::new(eqn)
        .filter(|tok| !matches!(tok.kind, TokenKind::Semi | TokenKind::Eof))
        .map(|tok| (tok.kind, tok.text.to_string()))
        .collect()
}

fn check_spans(root: &Expr) -> Result<(), String> {
    let mut failure = None;
    inspect(root, &mut |e| {
        if e.pos() > e.end() {
            failure = Some(format!("inverted span for {e}"));
        }
        for child in e.children() {
            if child.pos() < e.pos() || child.end() > e.end() {
                failure = Some(format!("{child} escapes the span of {e}"));
            }
        }
        let expected_end = match e {
            Expr::Binary(b) => Some(b.y.end()),
            Expr::Unary(u) => Some(u.x.end()),
            Expr::Paren(p) => Some(p.rparen + 1),
            Expr::Call(c) => Some(c.rparen + 1),
            Expr::Index(i) => Some(i.rbrack + 1),
            _ => None,
        };
        if let Some(expected_end) = expected_end
            && e.end() != expected_end
        {
            failure = Some(format!("{e} ends at {}, not {expected_end}", e.end()));
        }
        failure.is_none()
    });
    match failure {
        Some(msg) => Err(msg),
        None => Ok(()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn parse_is_deterministic(eqn in equation_strategy()) {
        let first = parse("prop", &eqn);
        let second = parse("prop", &eqn);
        prop_assert!(first.is_ok(), "{eqn:?} failed to parse");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn printing_preserves_tokens(eqn in equation_strategy()) {
        let ast = parse("prop", &eqn).unwrap();
        let printed = print_eqn(&ast);
        prop_assert_eq!(significant_tokens(&eqn), significant_tokens(&printed));
    }

    #[test]
    fn printing_is_stable(eqn in equation_strategy()) {
        let printed = print_eqn(&parse("prop", &eqn).unwrap());
        let reparsed = parse("prop", &printed).unwrap();
        prop_assert_eq!(&printed, &print_eqn(&reparsed));
    }

    #[test]
    fn spans_are_consistent(eqn in equation_strategy()) {
        let ast = parse("prop", &eqn).unwrap();
        prop_assert_eq!(Ok(()), check_spans(&ast));
    }

    #[test]
    fn arbitrary_input_never_panics(input in "(?s).{0,40}") {
        if let Err(err) = parse("prop", &input) {
            prop_assert!(!err.diagnostics.is_empty());
            let offsets: Vec<usize> = err.diagnostics.iter().map(|d| d.pos.offset).collect();
            prop_assert!(offsets.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(!err.render().is_empty());
        }
    }
}
