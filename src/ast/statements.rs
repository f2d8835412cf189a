use std::slice::Iter;

use crate::Span;

use super::{ast::Stmt, ast::Expr, types::TypeName};

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl BlockStmt {
    pub fn iter(&self) -> Iter<'_, Stmt> {
        self.body.iter()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
    pub span: Span,
}

/// `var name [type] [= initializer];`
///
/// The parser guarantees at least one of `declared_type` and `initializer`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub name: String,
    pub declared_type: Option<TypeName>,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

/// Both `for` and `while` loops: the body runs while `condition` holds.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// Callable signature.
///
/// `owner_type_name` is set for functions declared inside an `impl` block;
/// those receive an implicit `self` parameter ahead of `parameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrototypeStmt {
    pub name: String,
    pub owner_type_name: Option<String>,
    /// In declaration order.
    pub parameters: Vec<(String, TypeName)>,
    pub return_types: Vec<TypeName>,
    pub is_declaration_only: bool,
    pub span: Span,
}

impl PrototypeStmt {
    /// Symbol the function is emitted under: methods are qualified by their
    /// owner, `Point.sum`.
    pub fn symbol_name(&self) -> String {
        match &self.owner_type_name {
            Some(owner) => format!("{}.{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

/// `body` is `None` exactly when `prototype.is_declaration_only`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStmt {
    pub prototype: PrototypeStmt,
    pub body: Option<BlockStmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub expressions: Vec<Expr>,
    pub span: Span,
}

/// Members are variable declarations that always carry a type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclStmt {
    pub name: String,
    pub members: Vec<VarDeclStmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplDeclStmt {
    pub type_name: String,
    pub member_functions: Vec<FunctionStmt>,
    pub span: Span,
}
