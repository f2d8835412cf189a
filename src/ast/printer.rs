//! S-expression rendering of the tree, used by `--dump-ast` and by tests that
//! compare tree shapes.

use super::{
    ast::{Expr, ExprVisitor, Stmt, StmtVisitor},
    expressions::{AssignExpr, BinaryExpr, CallExpr, LiteralExpr, UnaryExpr},
    statements::{
        BlockStmt, ExpressionStmt, FunctionStmt, IfStmt, ImplDeclStmt, LoopStmt, PrototypeStmt,
        ReturnStmt, StructDeclStmt, VarDeclStmt,
    },
};

#[derive(Debug, Default)]
pub struct Printer;

impl Printer {
    pub fn print_stmt(&mut self, stmt: &Stmt) -> String {
        stmt.accept(self)
    }

    pub fn print_expr(&mut self, expr: &Expr) -> String {
        expr.accept(self)
    }

    fn parenthesize(&mut self, head: &str, parts: Vec<String>) -> String {
        if parts.is_empty() {
            return format!("({})", head);
        }

        format!("({} {})", head, parts.join(" "))
    }
}

/// One line per top-level statement.
pub fn print_program(program: &[Stmt]) -> String {
    let mut printer = Printer;

    program
        .iter()
        .map(|stmt| printer.print_stmt(stmt))
        .collect::<Vec<String>>()
        .join("\n")
}

impl ExprVisitor for Printer {
    type Output = String;

    fn visit_literal(&mut self, expr: &LiteralExpr) -> String {
        expr.token.value.clone()
    }

    fn visit_assign(&mut self, expr: &AssignExpr) -> String {
        let value = self.print_expr(&expr.value);
        self.parenthesize("=", vec![expr.target.value.clone(), value])
    }

    fn visit_binary(&mut self, expr: &BinaryExpr) -> String {
        let left = self.print_expr(&expr.left);
        let right = self.print_expr(&expr.right);
        self.parenthesize(&expr.operator.value, vec![left, right])
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) -> String {
        let operand = self.print_expr(&expr.operand);
        self.parenthesize(&expr.operator.value, vec![operand])
    }

    fn visit_call(&mut self, expr: &CallExpr) -> String {
        let mut parts = vec![self.print_expr(&expr.callee)];
        parts.extend(expr.arguments.iter().map(|argument| self.print_expr(argument)));
        self.parenthesize("call", parts)
    }
}

impl StmtVisitor for Printer {
    type Output = String;

    fn visit_var_decl(&mut self, stmt: &VarDeclStmt) -> String {
        let mut parts = vec![stmt.name.clone()];
        if let Some(declared_type) = &stmt.declared_type {
            parts.push(declared_type.to_string());
        }
        if let Some(initializer) = &stmt.initializer {
            parts.push(self.print_expr(initializer));
        }
        self.parenthesize("var", parts)
    }

    fn visit_expression(&mut self, stmt: &ExpressionStmt) -> String {
        let expression = self.print_expr(&stmt.expression);
        self.parenthesize("expr", vec![expression])
    }

    fn visit_if(&mut self, stmt: &IfStmt) -> String {
        let mut parts = vec![
            self.print_expr(&stmt.condition),
            self.print_stmt(&stmt.then_branch),
        ];
        if let Some(else_branch) = &stmt.else_branch {
            parts.push(self.print_stmt(else_branch));
        }
        self.parenthesize("if", parts)
    }

    fn visit_loop(&mut self, stmt: &LoopStmt) -> String {
        let parts = vec![self.print_expr(&stmt.condition), self.print_stmt(&stmt.body)];
        self.parenthesize("loop", parts)
    }

    fn visit_prototype(&mut self, stmt: &PrototypeStmt) -> String {
        let parameters = stmt
            .parameters
            .iter()
            .map(|(name, type_name)| format!("{} {}", type_name, name))
            .collect::<Vec<String>>()
            .join(", ");
        let return_types = stmt
            .return_types
            .iter()
            .map(|type_name| type_name.to_string())
            .collect::<Vec<String>>()
            .join(", ");

        self.parenthesize(
            "proto",
            vec![
                stmt.symbol_name(),
                format!("({})", parameters),
                format!("({})", return_types),
            ],
        )
    }

    fn visit_function(&mut self, stmt: &FunctionStmt) -> String {
        let mut parts = vec![self.visit_prototype(&stmt.prototype)];
        if let Some(body) = &stmt.body {
            parts.push(self.visit_block(body));
        }
        self.parenthesize("func", parts)
    }

    fn visit_block(&mut self, stmt: &BlockStmt) -> String {
        let parts = stmt.iter().map(|inner| self.print_stmt(inner)).collect();
        self.parenthesize("block", parts)
    }

    fn visit_return(&mut self, stmt: &ReturnStmt) -> String {
        let parts = stmt
            .expressions
            .iter()
            .map(|expression| self.print_expr(expression))
            .collect();
        self.parenthesize("return", parts)
    }

    fn visit_struct_decl(&mut self, stmt: &StructDeclStmt) -> String {
        let mut parts = vec![stmt.name.clone()];
        parts.extend(stmt.members.iter().map(|member| self.visit_var_decl(member)));
        self.parenthesize("struct", parts)
    }

    fn visit_impl_decl(&mut self, stmt: &ImplDeclStmt) -> String {
        let mut parts = vec![stmt.type_name.clone()];
        parts.extend(
            stmt.member_functions
                .iter()
                .map(|function| self.visit_function(function)),
        );
        self.parenthesize("impl", parts)
    }
}
