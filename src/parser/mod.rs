//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into an Abstract Syntax Tree. It uses a Pratt parser for expressions
//! with proper operator precedence and handles:
//!
//! - Statement parsing (variable declarations, functions, structs, impls,
//!   control flow)
//! - Expression parsing (binary and unary ops, assignment, calls, literals)
//! - Type name parsing for declarations
//! - Error recovery and reporting
//!
//! Each token kind maps to a rule holding an optional prefix handler, an
//! optional infix handler and a precedence.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
