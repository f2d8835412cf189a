use crate::{lexer::tokens::Token, Span};

use super::ast::Expr;

/// Literal Expression
/// Numbers, strings, booleans, `null` and identifiers. Identifiers are kept
/// as literals and resolved by name during code generation.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub token: Token,
    pub span: Span,
}

/// Assignment Expression
/// `name = value`. Compound assignments are desugared by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub target: Token,
    pub value: Box<Expr>,
    pub span: Span,
}

/// Binary Expression
/// Arithmetic, comparison, equality and logical operators.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
    pub span: Span,
}

/// Unary Expression
/// `-operand` or `!operand`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: Token,
    pub operand: Box<Expr>,
    pub span: Span,
}

/// Call Expression
/// `callee(arguments...)`. `paren` is the opening parenthesis, used to
/// position diagnostics about the argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub paren: Token,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

impl CallExpr {
    /// Name of the callee when it is a plain identifier.
    pub fn callee_name(&self) -> Option<&str> {
        match self.callee.as_ref() {
            Expr::Literal(literal) if literal.is_identifier() => Some(&literal.token.value),
            _ => None,
        }
    }
}

impl LiteralExpr {
    pub fn is_identifier(&self) -> bool {
        self.token.kind == crate::lexer::tokens::TokenKind::Identifier
    }
}
