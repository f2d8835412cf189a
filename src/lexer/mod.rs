//! Lexical analysis.
//!
//! Converts the source buffer held by the `CompilerContext` into a stream of
//! tokens for the parser. It handles:
//!
//! - Decimal, float, hex and octal numbers (matched with regex patterns)
//! - Keywords, identifiers and user type names
//! - Operators and their compound-assignment siblings
//! - Line/column tracking, with tabs counted by the configured tab width
//! - Whitespace and `//` comments

pub mod lexer;
pub mod tokens;
