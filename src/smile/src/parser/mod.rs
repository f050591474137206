// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Precedence-climbing parser for equations.
//!
//! Binary operators are grouped into levels, loosest first.  Each level
//! parses an operand at the next tighter level and then folds any run
//! of its own operators to the left, so every level (exponentiation
//! included) is left-associative.

use crate::ast::{
    BasicLit, BinaryExpr, BinaryOp, CallExpr, Expr, Ident, IndexExpr, LitKind, ParenExpr,
    UnaryExpr, UnaryOp,
};
use crate::common::{Diagnostic, Diagnostics, ErrorCode, ParseError, Pos};
use crate::token::{Lexer, Token, TokenKind, normalize};


/// Binary operator precedence levels, from loosest to tightest binding.
pub const LEVELS: &[&[BinaryOp]] = &[
    &[BinaryOp::Add, BinaryOp::Sub],
    &[BinaryOp::Mul, BinaryOp::Div],
    &[BinaryOp::Exp],
];

/// check_levels panics if a precedence table is unusable: it must have
/// at least one level, no empty levels, and list each operator once.
pub fn check_levels(levels: &[&[BinaryOp]]) {
    assert!(!levels.is_empty(), "precedence table has no levels");
    let mut seen: Vec<BinaryOp> = Vec::new();
    for (n, level) in levels.iter().enumerate() {
        assert!(!level.is_empty(), "precedence level {n} is empty");
        for op in level.iter() {
            assert!(
                !seen.contains(op),
                "operator '{op}' appears in more than one precedence level"
            );
            seen.push(*op);
        }
    }
}

/// Maximum depth of nested parens, calls, indexes and signs.  Deeper
/// input is rejected rather than risking the stack.
pub const MAX_NESTING: usize = 100;

type ParseResult<T> = Result<T, Diagnostic>;

struct Parser<'input> {
    lexer: Lexer<'input>,
    levels: &'static [&'static [BinaryOp]],
    errors: Diagnostics,
    depth: usize,
}

impl<'input> Parser<'input> {
    fn new(lexer: Lexer<'input>, levels: &'static [&'static [BinaryOp]]) -> Self {
        check_levels(levels);
        Parser {
            lexer,
            levels,
            errors: Diagnostics::new(),
            depth: 0,
        }
    }

    fn peek(&mut self) -> Token<'input> {
        self.lexer.peek()
    }

    fn advance(&mut self) -> Token<'input> {
        self.lexer.next_token()
    }

    /// consume takes the next token if it has the given kind.
    fn consume(&mut self, kind: TokenKind) -> Option<Token<'input>> {
        if self.peek().kind == kind {
            Some(self.advance())
        } else {
            None
        }
    }

    /// consume_any_of takes the next token if it is one of `ops`.
    fn consume_any_of(&mut self, ops: &[BinaryOp]) -> Option<(BinaryOp, Pos)> {
        let la = self.peek();
        if la.kind != TokenKind::Operator {
            return None;
        }
        let op = BinaryOp::from_token(la.text).filter(|op| ops.contains(op))?;
        self.advance();
        Some((op, la.pos))
    }

    fn diagnostic(&self, code: ErrorCode, tok: Token<'input>, msg: String) -> Diagnostic {
        Diagnostic::new(code, self.lexer.resolve(tok.pos), msg)
    }

    /// unexpected builds the diagnostic for finding `tok` where an
    /// operand should start.
    fn unexpected(&self, tok: Token<'input>) -> Diagnostic {
        match tok.kind {
            TokenKind::Eof | TokenKind::Semi => self.diagnostic(
                ErrorCode::UnexpectedEof,
                tok,
                "unexpected end of equation".to_owned(),
            ),
            _ => self.diagnostic(
                ErrorCode::UnexpectedToken,
                tok,
                format!("unexpected token {tok}"),
            ),
        }
    }

    fn report(&mut self, err: Diagnostic) {
        self.errors.push(err);
    }

    /// parse_equation parses a whole equation, including its statement
    /// terminator.  On failure the diagnostics have been recorded.
    fn parse_equation(&mut self) -> Option<Expr> {
        let first = self.peek();
        if matches!(first.kind, TokenKind::Semi | TokenKind::Eof) && !self.lexer.has_errors() {
            let err = self.diagnostic(
                ErrorCode::EmptyEquation,
                first,
                "empty equation".to_owned(),
            );
            self.report(err);
            return None;
        }

        let expr = match self.expr() {
            Ok(expr) => expr,
            Err(err) => {
                self.report(err);
                return None;
            }
        };

        let la = self.peek();
        match la.kind {
            TokenKind::Semi => {
                while self.consume(TokenKind::Semi).is_some() {}
                let trailing = self.peek();
                if trailing.kind != TokenKind::Eof {
                    let msg = format!("expected end-of-equation, got {trailing}");
                    let err = self.diagnostic(ErrorCode::ExtraToken, trailing, msg);
                    self.report(err);
                }
            }
            TokenKind::Eof => {
                // normalization guarantees a terminator unless scanning
                // stopped early on a lexical error
                debug_assert!(
                    self.lexer.has_errors(),
                    "missing statement terminator in {:?}",
                    self.lexer.text()
                );
                let err = self.diagnostic(
                    ErrorCode::MissingTerminator,
                    la,
                    "expected end-of-equation".to_owned(),
                );
                self.report(err);
            }
            _ => {
                let msg = format!("expected end-of-equation, got {la}");
                let err = self.diagnostic(ErrorCode::ExtraToken, la, msg);
                self.report(err);
            }
        }

        Some(expr)
    }

    fn expr(&mut self) -> ParseResult<Expr> {
        self.binary(0)
    }

    /// binary parses the precedence level `n`.
    fn binary(&mut self, n: usize) -> ParseResult<Expr> {
        assert!(
            n < self.levels.len(),
            "illegal precedence level {n} (max {})",
            self.levels.len() - 1
        );
        let ops = self.levels[n];

        let mut lhs = self.operand(n)?;
        while let Some((op, op_pos)) = self.consume_any_of(ops) {
            let rhs = self.operand(n)?;
            lhs = Expr::Binary(BinaryExpr {
                x: Box::new(lhs),
                op_pos,
                op,
                y: Box::new(rhs),
            });
        }

        Ok(lhs)
    }

    /// operand parses whatever binds tighter than level `n`.
    fn operand(&mut self, n: usize) -> ParseResult<Expr> {
        if n + 1 < self.levels.len() {
            self.binary(n + 1)
        } else {
            self.factor()
        }
    }

    /// factor parses a single operand.  Every nested construct passes
    /// through here, so this is where nesting depth is tracked.
    fn factor(&mut self) -> ParseResult<Expr> {
        if self.depth >= MAX_NESTING {
            let la = self.peek();
            let msg = format!("expression nested more than {MAX_NESTING} levels deep");
            return Err(self.diagnostic(ErrorCode::NestingTooDeep, la, msg));
        }
        self.depth += 1;
        let result = self.nested_factor();
        self.depth -= 1;
        result
    }

    fn nested_factor(&mut self) -> ParseResult<Expr> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::LParen => {
                self.advance();
                let x = self.expr()?;
                let rparen = self.expect(TokenKind::RParen, ErrorCode::ExpectedRParen, "')'")?;
                Ok(Expr::Paren(ParenExpr {
                    lparen: tok.pos,
                    x: Box::new(x),
                    rparen: rparen.pos,
                }))
            }
            TokenKind::Num => {
                self.advance();
                Ok(Expr::BasicLit(BasicLit {
                    value_pos: tok.pos,
                    kind: LitKind::Number,
                    value: tok.text.to_owned(),
                }))
            }
            TokenKind::Ident => {
                self.advance();
                let ident = Expr::Ident(Ident::new(tok.pos, tok.text));
                if let Some(lparen) = self.consume(TokenKind::LParen) {
                    self.call(ident, lparen)
                } else if let Some(lbrack) = self.consume(TokenKind::LBracket) {
                    self.index(ident, lbrack)
                } else {
                    Ok(ident)
                }
            }
            TokenKind::Operator if tok.text == "-" || tok.text == "+" => {
                self.advance();
                self.unary(tok)
            }
            _ => Err(self.unexpected(tok)),
        }
    }

    fn expect(
        &mut self,
        kind: TokenKind,
        code: ErrorCode,
        what: &str,
    ) -> ParseResult<Token<'input>> {
        if let Some(tok) = self.consume(kind) {
            return Ok(tok);
        }
        let la = self.peek();
        Err(self.diagnostic(code, la, format!("expected {what}, got {la}")))
    }

    /// unary applies a sign to an operand at the tightest binary level,
    /// so `-a^2` is `-(a^2)`.
    fn unary(&mut self, op_tok: Token<'input>) -> ParseResult<Expr> {
        let op = if op_tok.text == "-" {
            UnaryOp::Negative
        } else {
            UnaryOp::Positive
        };
        let x = self.binary(self.levels.len() - 1)?;
        Ok(Expr::Unary(UnaryExpr {
            op_pos: op_tok.pos,
            op,
            x: Box::new(x),
        }))
    }

    fn call(&mut self, fun: Expr, lparen: Token<'input>) -> ParseResult<Expr> {
        let mut args = Vec::new();

        let rparen = match self.consume(TokenKind::RParen) {
            Some(rparen) => rparen,
            None => loop {
                match self.expr() {
                    Ok(arg) => args.push(arg),
                    Err(err) => {
                        self.report(err);
                        let la = self.peek();
                        let msg = format!("call: expected expression argument, got {la}");
                        return Err(self.diagnostic(ErrorCode::BadCallArgs, la, msg));
                    }
                }
                if self.peek().is_op(",") {
                    self.advance();
                    continue;
                }
                if let Some(rparen) = self.consume(TokenKind::RParen) {
                    break rparen;
                }
                let la = self.peek();
                let msg = format!("call: expected ',' or ')', got {la}");
                return Err(self.diagnostic(ErrorCode::BadCallArgs, la, msg));
            },
        };

        Ok(Expr::Call(CallExpr {
            fun: Box::new(fun),
            lparen: lparen.pos,
            args,
            rparen: rparen.pos,
        }))
    }

    fn index(&mut self, x: Expr, lbrack: Token<'input>) -> ParseResult<Expr> {
        let index = self.expr()?;
        let rbrack = self.expect(TokenKind::RBracket, ErrorCode::ExpectedRBracket, "']'")?;
        Ok(Expr::Index(IndexExpr {
            x: Box::new(x),
            lbrack: lbrack.pos,
            index: Box::new(index),
            rbrack: rbrack.pos,
        }))
    }

    /// finish merges lexical and syntax errors.  Lexical errors go
    /// first so that, at a shared position, they win over the syntax
    /// errors they caused.
    fn finish(mut self) -> Diagnostics {
        let mut errs = self.lexer.take_errors();
        errs.append(&mut self.errors);
        errs
    }
}

/// parse turns an equation into an expression tree.  `name` is only
/// used to attribute diagnostics, usually to the variable the equation
/// belongs to.
pub fn parse(name: &str, eqn: &str) -> Result<Expr, ParseError> {
    tracing::trace!(name, eqn, "parsing equation");

    let text = normalize(eqn);
    let mut parser = Parser::new(Lexer::new(&text), LEVELS);
    let expr = parser.parse_equation();
    let errs = parser.finish();

    match expr {
        Some(expr) if errs.is_empty() => Ok(expr),
        _ => {
            let diagnostics = errs.into_sorted();
            debug_assert!(!diagnostics.is_empty());
            tracing::debug!(name, errors = diagnostics.len(), "equation failed to parse");
            Err(ParseError {
                name: name.to_owned(),
                text: text.into_owned(),
                diagnostics,
            })
        }
    }
}
