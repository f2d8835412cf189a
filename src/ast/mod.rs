/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Node enums, discriminants and visitor traits
/// - expressions: Definitions for the expression nodes
/// - statements: Definitions for the statement nodes
/// - types: Type names as written in declarations
/// - printer: S-expression rendering of a tree
pub mod ast;
pub mod expressions;
pub mod printer;
pub mod statements;
pub mod types;
