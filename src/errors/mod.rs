//! Error types and the diagnostics channel for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Error structures with source span and severity information
//! - Specific error variants for the lexing, parsing and codegen phases
//! - The `Diagnostics` channel every phase reports through
//! - Helpful error messages and suggestions

pub mod diagnostics;
pub mod errors;

#[cfg(test)]
mod tests;
