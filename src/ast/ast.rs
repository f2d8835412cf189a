use crate::Span;

use super::{
    expressions::{AssignExpr, BinaryExpr, CallExpr, LiteralExpr, UnaryExpr},
    statements::{
        BlockStmt, ExpressionStmt, FunctionStmt, IfStmt, ImplDeclStmt, LoopStmt, PrototypeStmt,
        ReturnStmt, StructDeclStmt, VarDeclStmt,
    },
};

/// Statement Types
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum StmtType {
    VarDeclStmt,
    ExpressionStmt,
    IfStmt,
    LoopStmt,
    PrototypeStmt,
    FunctionStmt,
    BlockStmt,
    ReturnStmt,
    StructDeclStmt,
    ImplDeclStmt,
}

/// Expression Types
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ExprType {
    Literal,
    Assign,
    Binary,
    Unary,
    Call,
}

/// Every statement node. Each node owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VarDeclStmt),
    Expression(ExpressionStmt),
    If(IfStmt),
    Loop(LoopStmt),
    Prototype(PrototypeStmt),
    Function(FunctionStmt),
    Block(BlockStmt),
    Return(ReturnStmt),
    StructDecl(StructDeclStmt),
    ImplDecl(ImplDeclStmt),
}

/// Every expression node. Expressions carry no type information.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
    Assign(AssignExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Call(CallExpr),
}

impl Stmt {
    pub fn get_stmt_type(&self) -> StmtType {
        match self {
            Stmt::VarDecl(_) => StmtType::VarDeclStmt,
            Stmt::Expression(_) => StmtType::ExpressionStmt,
            Stmt::If(_) => StmtType::IfStmt,
            Stmt::Loop(_) => StmtType::LoopStmt,
            Stmt::Prototype(_) => StmtType::PrototypeStmt,
            Stmt::Function(_) => StmtType::FunctionStmt,
            Stmt::Block(_) => StmtType::BlockStmt,
            Stmt::Return(_) => StmtType::ReturnStmt,
            Stmt::StructDecl(_) => StmtType::StructDeclStmt,
            Stmt::ImplDecl(_) => StmtType::ImplDeclStmt,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::VarDecl(stmt) => &stmt.span,
            Stmt::Expression(stmt) => &stmt.span,
            Stmt::If(stmt) => &stmt.span,
            Stmt::Loop(stmt) => &stmt.span,
            Stmt::Prototype(stmt) => &stmt.span,
            Stmt::Function(stmt) => &stmt.span,
            Stmt::Block(stmt) => &stmt.span,
            Stmt::Return(stmt) => &stmt.span,
            Stmt::StructDecl(stmt) => &stmt.span,
            Stmt::ImplDecl(stmt) => &stmt.span,
        }
    }

    pub fn accept<V: StmtVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Stmt::VarDecl(stmt) => visitor.visit_var_decl(stmt),
            Stmt::Expression(stmt) => visitor.visit_expression(stmt),
            Stmt::If(stmt) => visitor.visit_if(stmt),
            Stmt::Loop(stmt) => visitor.visit_loop(stmt),
            Stmt::Prototype(stmt) => visitor.visit_prototype(stmt),
            Stmt::Function(stmt) => visitor.visit_function(stmt),
            Stmt::Block(stmt) => visitor.visit_block(stmt),
            Stmt::Return(stmt) => visitor.visit_return(stmt),
            Stmt::StructDecl(stmt) => visitor.visit_struct_decl(stmt),
            Stmt::ImplDecl(stmt) => visitor.visit_impl_decl(stmt),
        }
    }
}

impl Expr {
    pub fn get_expr_type(&self) -> ExprType {
        match self {
            Expr::Literal(_) => ExprType::Literal,
            Expr::Assign(_) => ExprType::Assign,
            Expr::Binary(_) => ExprType::Binary,
            Expr::Unary(_) => ExprType::Unary,
            Expr::Call(_) => ExprType::Call,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Literal(expr) => &expr.span,
            Expr::Assign(expr) => &expr.span,
            Expr::Binary(expr) => &expr.span,
            Expr::Unary(expr) => &expr.span,
            Expr::Call(expr) => &expr.span,
        }
    }

    pub fn accept<V: ExprVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Literal(expr) => visitor.visit_literal(expr),
            Expr::Assign(expr) => visitor.visit_assign(expr),
            Expr::Binary(expr) => visitor.visit_binary(expr),
            Expr::Unary(expr) => visitor.visit_unary(expr),
            Expr::Call(expr) => visitor.visit_call(expr),
        }
    }
}

/// Double dispatch over statements; `Stmt::accept` selects the method.
pub trait StmtVisitor {
    type Output;

    fn visit_var_decl(&mut self, stmt: &VarDeclStmt) -> Self::Output;
    fn visit_expression(&mut self, stmt: &ExpressionStmt) -> Self::Output;
    fn visit_if(&mut self, stmt: &IfStmt) -> Self::Output;
    fn visit_loop(&mut self, stmt: &LoopStmt) -> Self::Output;
    fn visit_prototype(&mut self, stmt: &PrototypeStmt) -> Self::Output;
    fn visit_function(&mut self, stmt: &FunctionStmt) -> Self::Output;
    fn visit_block(&mut self, stmt: &BlockStmt) -> Self::Output;
    fn visit_return(&mut self, stmt: &ReturnStmt) -> Self::Output;
    fn visit_struct_decl(&mut self, stmt: &StructDeclStmt) -> Self::Output;
    fn visit_impl_decl(&mut self, stmt: &ImplDeclStmt) -> Self::Output;
}

/// Double dispatch over expressions; `Expr::accept` selects the method.
pub trait ExprVisitor {
    type Output;

    fn visit_literal(&mut self, expr: &LiteralExpr) -> Self::Output;
    fn visit_assign(&mut self, expr: &AssignExpr) -> Self::Output;
    fn visit_binary(&mut self, expr: &BinaryExpr) -> Self::Output;
    fn visit_unary(&mut self, expr: &UnaryExpr) -> Self::Output;
    fn visit_call(&mut self, expr: &CallExpr) -> Self::Output;
}
