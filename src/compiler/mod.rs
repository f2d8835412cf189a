//! Code generation module for the compiler.
//!
//! This module walks the AST and emits instructions through the `Backend`
//! trait. It handles:
//!
//! - Compilation of expressions and statements
//! - Scope tracking and name resolution
//! - Struct types, `impl` methods and multi-value returns
//! - The default in-memory IR backend, plus LLVM behind the `llvm` feature

pub mod backend;
pub mod compiler;
pub mod expr;
pub mod ir;
#[cfg(feature = "llvm")]
pub mod llvm;
pub mod scope;
pub mod stmt;

#[cfg(test)]
mod tests;
