// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Parsing for system dynamics equations like `population*.08` or
//! `MIN(a,b)+c` into expression trees, along with the tree walk that
//! dependency extraction is built on.

#![forbid(unsafe_code)]

pub mod ast;
pub mod common;
mod deps;
mod parser;
pub mod token;
mod walk;

#[cfg(test)]
mod parser_proptest;

pub use self::ast::{Expr, print_eqn};
pub use self::common::{Diagnostic, ErrorCode, ParseError, Pos, Position};
pub use self::deps::{canonicalize, identifier_set, references};
pub use self::parser::{LEVELS, MAX_NESTING, check_levels, parse};
pub use self::token::{Lexer, Token, TokenKind, normalize};
pub use self::walk::inspect;
