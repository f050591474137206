// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::ast::Expr;

/// inspect traverses `expr` in depth-first pre-order: it calls `f` on a
/// node and, if `f` returns true, then on each of the node's children
/// in source order.
pub fn inspect<F>(expr: &Expr, f: &mut F)
where
    F: FnMut(&Expr) -> bool,
{
    if !f(expr) {
        return;
    }
    for child in expr.children() {
        inspect(child, f);
    }
}

#[cfg(test)]
fn parse_ok(eqn: &str) -> Expr {
    crate::parser::parse("test", eqn).unwrap()
}

#[test]
fn test_preorder() {
    let ast = parse_ok("MIN(a, b*c) + -d");
    let mut visited = Vec::new();
    inspect(&ast, &mut |e| {
        visited.push(match e {
            Expr::Ident(id) => id.name.clone(),
            Expr::Binary(b) => b.op.to_string(),
            Expr::Unary(_) => "neg".to_owned(),
            Expr::Call(_) => "call".to_owned(),
            other => panic!("unexpected node {other:?}"),
        });
        true
    });
    assert_eq!(
        vec!["+", "call", "MIN", "a", "*", "b", "c", "neg", "d"],
        visited
    );
}

#[test]
fn test_skip_subtree() {
    let ast = parse_ok("(a + b) * c[i]");
    let mut idents = Vec::new();
    inspect(&ast, &mut |e| match e {
        Expr::Paren(_) => false,
        Expr::Ident(id) => {
            idents.push(id.name.as_str().to_owned());
            true
        }
        _ => true,
    });
    assert_eq!(vec!["c", "i"], idents);
}

#[test]
fn test_stop_at_root() {
    let ast = parse_ok("a + b");
    let mut count = 0;
    inspect(&ast, &mut |_| {
        count += 1;
        false
    });
    assert_eq!(1, count);
}
