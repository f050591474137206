// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Finding the model variables an equation depends on.

use std::collections::BTreeSet;

use crate::ast::Expr;
use crate::walk::inspect;

/// references returns the identifiers `expr` refers to, in source
/// order and exactly as written.  The name of a called function is not
/// a reference.
pub fn references(expr: &Expr) -> Vec<String> {
    let mut refs = Vec::new();
    // the callee is the first node visited after its call
    let mut callee_next = false;
    inspect(expr, &mut |e| {
        let is_callee = std::mem::replace(&mut callee_next, false);
        if let Some(id) = e.as_ident()
            && !is_callee
        {
            refs.push(id.name.clone());
        }
        callee_next = matches!(e, Expr::Call(_));
        true
    });
    refs
}

/// canonicalize turns a variable name into the form used to match
/// references against model variables.
pub fn canonicalize(name: &str) -> String {
    // trim before checking for quotes; a quoted name is taken as-is
    let name = name.trim();
    let bytes = name.as_bytes();
    let name = if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
        &name[1..name.len() - 1]
    } else {
        name
    };

    replace_whitespace_with_underscore(name).to_lowercase()
}

/// replace_whitespace_with_underscore collapses each run of whitespace,
/// including escaped `\n` and `\r` sequences, into a single `_`.
fn replace_whitespace_with_underscore(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut in_whitespace = false;

    while let Some(c) = chars.next() {
        let is_space = if c == '\\' && matches!(chars.peek(), Some('n' | 'r')) {
            chars.next();
            true
        } else {
            c.is_whitespace()
        };

        if is_space {
            if !in_whitespace {
                result.push('_');
            }
            in_whitespace = true;
        } else {
            result.push(c);
            in_whitespace = false;
        }
    }

    result
}

/// identifier_set returns the canonicalized names of every variable
/// `expr` depends on.
pub fn identifier_set(expr: &Expr) -> BTreeSet<String> {
    references(expr)
        .iter()
        .map(|name| canonicalize(name))
        .collect()
}

#[test]
fn test_canonicalize() {
    let cases: &[(&str, &str)] = &[
        ("a", "a"),
        ("Birth Rate", "birth_rate"),
        ("  Birth   Rate ", "birth_rate"),
        ("birth\\nrate", "birth_rate"),
        ("birth \\n rate", "birth_rate"),
        ("\"Total Pop\"", "total_pop"),
        ("\"a.b\"", "a.b"),
        ("Max\tValue", "max_value"),
        ("back\\slash", "back\\slash"),
        ("ÅRET", "året"),
    ];

    for (input, expected) in cases.iter() {
        assert_eq!(*expected, canonicalize(input), "canonicalize({input:?})");
    }
}

#[test]
fn test_references() {
    let cases: &[(&str, &[&str])] = &[
        ("population*.08", &["population"]),
        ("MIN(a,b)+c", &["a", "b", "c"]),
        ("MAX(PULSE(x, y), x)", &["x", "y", "x"]),
        ("-(a)(b)", &["a", "b"]),
        ("stock[region] / 2", &["stock", "region"]),
        ("42", &[]),
        ("TIME()", &[]),
    ];

    for (eqn, expected) in cases.iter() {
        let ast = crate::parser::parse("test", eqn).unwrap();
        let refs = references(&ast);
        assert_eq!(*expected, refs.as_slice(), "references of {eqn:?}");
    }
}

#[test]
fn test_identifier_sets() {
    let cases: &[(&str, &[&str])] = &[
        ("Birth_Rate * Population", &["birth_rate", "population"]),
        ("a + A + MIN(a, b)", &["a", "b"]),
        ("SMTH1(inflow, delay)", &["delay", "inflow"]),
    ];

    for (eqn, expected) in cases.iter() {
        let ast = crate::parser::parse("test", eqn).unwrap();
        let expected: BTreeSet<String> = expected.iter().map(|s| s.to_string()).collect();
        assert_eq!(expected, identifier_set(&ast), "identifier_set of {eqn:?}");
    }
}
