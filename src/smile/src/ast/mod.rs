// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Expression trees for parsed equations.
//!
//! Every node knows where it starts (`pos`) and the offset just past
//! its last character (`end`).  Composite nodes compute `end` from
//! their rightmost child or closing delimiter rather than storing it,
//! so a node's span always covers its children.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::common::Pos;

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Exp,
}

impl BinaryOp {
    pub fn from_token(text: &str) -> Option<BinaryOp> {
        let op = match text {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "^" => BinaryOp::Exp,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Exp => "^",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Positive,
    Negative,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Positive => "+",
            UnaryOp::Negative => "-",
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LitKind {
    Number,
}

/// BadExpr is a placeholder for an expression that couldn't be
/// parsed.  The parser never hands one to callers; it exists for tools
/// that build or rewrite trees.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BadExpr {
    pub from: Pos,
    pub to: Pos,
}

/// Ident is a reference to a variable or the name of a called
/// function, exactly as written.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name_pos: Pos,
    pub name: String,
}

/// BasicLit keeps a literal's source text verbatim; converting numbers
/// (and choosing a precision) is left to the consumer.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicLit {
    pub value_pos: Pos,
    pub kind: LitKind,
    pub value: String,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParenExpr {
    pub lparen: Pos,
    pub x: Box<Expr>,
    pub rparen: Pos,
}

/// IndexExpr is a subscripted reference like `population[region]`.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexExpr {
    pub x: Box<Expr>,
    pub lbrack: Pos,
    pub index: Box<Expr>,
    pub rbrack: Pos,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    pub lparen: Pos,
    pub args: Vec<Expr>,
    pub rparen: Pos,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnaryExpr {
    pub op_pos: Pos,
    pub op: UnaryOp,
    pub x: Box<Expr>,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryExpr {
    pub x: Box<Expr>,
    pub op_pos: Pos,
    pub op: BinaryOp,
    pub y: Box<Expr>,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Bad(BadExpr),
    Ident(Ident),
    BasicLit(BasicLit),
    Paren(ParenExpr),
    Index(IndexExpr),
    Call(CallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
}

impl BadExpr {
    pub fn pos(&self) -> Pos {
        self.from
    }

    pub fn end(&self) -> Pos {
        self.to
    }
}

impl Ident {
    pub fn new(name_pos: Pos, name: impl Into<String>) -> Self {
        Ident {
            name_pos,
            name: name.into(),
        }
    }

    pub fn pos(&self) -> Pos {
        self.name_pos
    }

    pub fn end(&self) -> Pos {
        self.name_pos + self.name.len()
    }
}

impl BasicLit {
    pub fn pos(&self) -> Pos {
        self.value_pos
    }

    pub fn end(&self) -> Pos {
        self.value_pos + self.value.len()
    }
}

impl ParenExpr {
    pub fn pos(&self) -> Pos {
        self.lparen
    }

    pub fn end(&self) -> Pos {
        self.rparen + 1
    }
}

impl IndexExpr {
    pub fn pos(&self) -> Pos {
        self.x.pos()
    }

    pub fn end(&self) -> Pos {
        self.rbrack + 1
    }
}

impl CallExpr {
    pub fn pos(&self) -> Pos {
        self.fun.pos()
    }

    pub fn end(&self) -> Pos {
        self.rparen + 1
    }
}

impl UnaryExpr {
    pub fn pos(&self) -> Pos {
        self.op_pos
    }

    pub fn end(&self) -> Pos {
        self.x.end()
    }
}

impl BinaryExpr {
    pub fn pos(&self) -> Pos {
        self.x.pos()
    }

    pub fn end(&self) -> Pos {
        self.y.end()
    }
}

impl Expr {
    /// pos is the position of the first character of the expression.
    pub fn pos(&self) -> Pos {
        match self {
            Expr::Bad(e) => e.pos(),
            Expr::Ident(e) => e.pos(),
            Expr::BasicLit(e) => e.pos(),
            Expr::Paren(e) => e.pos(),
            Expr::Index(e) => e.pos(),
            Expr::Call(e) => e.pos(),
            Expr::Unary(e) => e.pos(),
            Expr::Binary(e) => e.pos(),
        }
    }

    /// end is the position immediately after the expression.
    pub fn end(&self) -> Pos {
        match self {
            Expr::Bad(e) => e.end(),
            Expr::Ident(e) => e.end(),
            Expr::BasicLit(e) => e.end(),
            Expr::Paren(e) => e.end(),
            Expr::Index(e) => e.end(),
            Expr::Call(e) => e.end(),
            Expr::Unary(e) => e.end(),
            Expr::Binary(e) => e.end(),
        }
    }

    /// children returns the direct subexpressions in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Bad(_) | Expr::Ident(_) | Expr::BasicLit(_) => vec![],
            Expr::Paren(e) => vec![&*e.x],
            Expr::Index(e) => vec![&*e.x, &*e.index],
            Expr::Call(e) => std::iter::once(e.fun.as_ref()).chain(e.args.iter()).collect(),
            Expr::Unary(e) => vec![&*e.x],
            Expr::Binary(e) => vec![&*e.x, &*e.y],
        }
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(id) => Some(id),
            _ => None,
        }
    }
}

/// print_eqn turns an AST back into equation text.  Parens are
/// explicit nodes, so the output re-parses to the same tree.
pub fn print_eqn(expr: &Expr) -> String {
    match expr {
        Expr::Bad(_) => "<bad expression>".to_owned(),
        Expr::Ident(id) => id.name.clone(),
        Expr::BasicLit(lit) => match lit.kind {
            LitKind::Number => lit.value.clone(),
        },
        Expr::Paren(e) => format!("({})", print_eqn(&e.x)),
        Expr::Index(e) => format!("{}[{}]", print_eqn(&e.x), print_eqn(&e.index)),
        Expr::Call(e) => {
            let args: Vec<String> = e.args.iter().map(print_eqn).collect();
            format!("{}({})", print_eqn(&e.fun), args.join(", "))
        }
        Expr::Unary(e) => format!("{}{}", e.op.as_str(), print_eqn(&e.x)),
        Expr::Binary(e) => format!(
            "{} {} {}",
            print_eqn(&e.x),
            e.op.as_str(),
            print_eqn(&e.y)
        ),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&print_eqn(self))
    }
}

#[test]
fn test_binary_op_tokens() {
    for op in [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Exp,
    ] {
        assert_eq!(Some(op), BinaryOp::from_token(op.as_str()));
    }
    assert_eq!(None, BinaryOp::from_token("="));
    assert_eq!(None, BinaryOp::from_token(","));
}

#[test]
fn test_spans() {
    // a * (b + 1)
    let sum = Expr::Binary(BinaryExpr {
        x: Box::new(Expr::Ident(Ident::new(Pos(5), "b"))),
        op_pos: Pos(7),
        op: BinaryOp::Add,
        y: Box::new(Expr::BasicLit(BasicLit {
            value_pos: Pos(9),
            kind: LitKind::Number,
            value: "1".to_owned(),
        })),
    });
    assert_eq!(Pos(5), sum.pos());
    assert_eq!(Pos(10), sum.end());

    let paren = Expr::Paren(ParenExpr {
        lparen: Pos(4),
        x: Box::new(sum),
        rparen: Pos(10),
    });
    let product = Expr::Binary(BinaryExpr {
        x: Box::new(Expr::Ident(Ident::new(Pos(0), "a"))),
        op_pos: Pos(2),
        op: BinaryOp::Mul,
        y: Box::new(paren),
    });
    assert_eq!(Pos(0), product.pos());
    assert_eq!(Pos(11), product.end());
    assert_eq!("a * (b + 1)", product.to_string());
    assert_eq!(2, product.children().len());
}

#[test]
fn test_print_call_and_index() {
    let call = Expr::Call(CallExpr {
        fun: Box::new(Expr::Ident(Ident::new(Pos(0), "MAX"))),
        lparen: Pos(3),
        args: vec![
            Expr::Unary(UnaryExpr {
                op_pos: Pos(4),
                op: UnaryOp::Negative,
                x: Box::new(Expr::Ident(Ident::new(Pos(5), "a"))),
            }),
            Expr::Index(IndexExpr {
                x: Box::new(Expr::Ident(Ident::new(Pos(8), "b"))),
                lbrack: Pos(9),
                index: Box::new(Expr::Ident(Ident::new(Pos(10), "i"))),
                rbrack: Pos(11),
            }),
        ],
        rparen: Pos(12),
    });
    assert_eq!("MAX(-a, b[i])", print_eqn(&call));
    assert_eq!(Pos(13), call.end());
    assert_eq!(3, call.children().len());
}
