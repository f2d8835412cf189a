//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Variable declarations
//! - Function declarations and prototypes
//! - Expressions, precedence and assignment
//! - Control flow statements
//! - Struct and impl blocks
//! - Error reporting and recovery

use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::{Expr, Stmt, StmtType},
        printer::print_program,
        types::{PrimitiveType, TypeName},
    },
    errors::errors::ErrorImpl,
    lexer::{lexer::tokenize, tokens::TokenKind},
    CompilerContext,
};

use super::parser::parse;

fn parse_source(source: &str) -> (Vec<Stmt>, CompilerContext) {
    let mut context = CompilerContext::new(source, Some(String::from("test.bsh")));
    let tokens = tokenize(&mut context);
    let program = parse(tokens, &mut context);
    (program, context)
}

fn error_kinds(context: &CompilerContext) -> Vec<ErrorImpl> {
    context
        .diagnostics
        .iter()
        .map(|error| error.get_kind().clone())
        .collect()
}

const INT32: TypeName = TypeName::Primitive(PrimitiveType::Int32);

#[test]
fn test_parse_precedence_multiplication_binds_tighter() {
    let (program, context) = parse_source("var x int32 = 1 + 2 * 3;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(program.len(), 1);

    let Stmt::VarDecl(var_decl) = &program[0] else {
        panic!("expected a variable declaration, got {:?}", program[0]);
    };
    assert_eq!(var_decl.name, "x");
    assert_eq!(var_decl.declared_type, Some(INT32));

    let Some(Expr::Binary(sum)) = &var_decl.initializer else {
        panic!("expected a binary initializer");
    };
    assert_eq!(sum.operator.kind, TokenKind::Plus);

    let Expr::Binary(product) = sum.right.as_ref() else {
        panic!("expected the right operand to be a product");
    };
    assert_eq!(product.operator.kind, TokenKind::Star);
}

#[test]
fn test_parse_binary_operators_associate_left() {
    let (program, _) = parse_source("x = 10 - 4 - 3; y = 8 / 4 / 2;");

    assert_eq!(
        print_program(&program),
        "(expr (= x (- (- 10 4) 3)))\n(expr (= y (/ (/ 8 4) 2)))"
    );
}

#[test]
fn test_parse_precedence_ladder() {
    let (program, context) = parse_source("r = a or b and c == d < e + f * -g;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(
        print_program(&program),
        "(expr (= r (or a (and b (== c (< d (+ e (* f (- g)))))))))"
    );
}

#[test]
fn test_parse_bitwise_precedence_ladder() {
    let (program, context) =
        parse_source("r = a and b | c ^ d & e == f; s = a < b << c + d; t = x ^ y ^ z;");

    assert!(context.diagnostics.is_empty(), "{:?}", error_kinds(&context));
    assert_eq!(
        print_program(&program),
        "(expr (= r (and a (| b (^ c (& d (== e f)))))))\n\
         (expr (= s (< a (<< b (+ c d)))))\n\
         (expr (= t (^ (^ x y) z)))"
    );
}

#[test]
fn test_parse_grouping_overrides_precedence() {
    let (program, _) = parse_source("v = (1 + 2) * 3;");

    assert_eq!(print_program(&program), "(expr (= v (* (+ 1 2) 3)))");
}

#[test]
fn test_parse_assignment_is_right_associative() {
    let (program, context) = parse_source("a = b = 3;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(print_program(&program), "(expr (= a (= b 3)))");
}

#[test]
fn test_parse_compound_assignment_desugars() {
    let (program, context) = parse_source("total += 2 * n; total %= 7;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(
        print_program(&program),
        "(expr (= total (+ total (* 2 n))))\n(expr (= total (% total 7)))"
    );
}

#[test]
fn test_parse_invalid_assignment_target() {
    let (program, context) = parse_source("a + b = c;");

    assert!(program.is_empty());
    assert_eq!(error_kinds(&context), vec![ErrorImpl::InvalidAssignmentTarget]);
}

#[test]
fn test_parse_literal_assignment_target() {
    let (_, context) = parse_source("1 = 2;");

    assert_eq!(error_kinds(&context), vec![ErrorImpl::InvalidAssignmentTarget]);
}

#[test]
fn test_parse_missing_expression() {
    let (_, context) = parse_source("var a = ;");

    assert!(matches!(
        error_kinds(&context).as_slice(),
        [ErrorImpl::ExpectedExpression { .. }]
    ));
}

#[test]
fn test_parse_function_definition() {
    let (program, context) = parse_source("func add(int32 a, int32 b)(int32) { return a + b; }");

    assert!(context.diagnostics.is_empty());
    assert_eq!(program.len(), 1);

    let Stmt::Function(function) = &program[0] else {
        panic!("expected a function");
    };
    let prototype = &function.prototype;
    assert_eq!(prototype.name, "add");
    assert_eq!(prototype.owner_type_name, None);
    assert_eq!(
        prototype.parameters,
        vec![(String::from("a"), INT32), (String::from("b"), INT32)]
    );
    assert_eq!(prototype.return_types, vec![INT32]);
    assert!(!prototype.is_declaration_only);

    let body = function.body.as_ref().expect("function has a body");
    assert_eq!(body.len(), 1);
    let Stmt::Return(return_stmt) = &body.body[0] else {
        panic!("expected a return");
    };
    assert_eq!(return_stmt.expressions.len(), 1);
}

#[test]
fn test_parse_function_declaration_only() {
    let (program, context) = parse_source("func tick()();");

    assert!(context.diagnostics.is_empty());
    let Stmt::Function(function) = &program[0] else {
        panic!("expected a function");
    };
    assert!(function.prototype.is_declaration_only);
    assert!(function.body.is_none());
    assert!(function.prototype.return_types.is_empty());
}

#[test]
fn test_parse_parameters_share_a_type() {
    let (program, context) = parse_source("func mix(float64 x, y, int8 z)(float64, int8) { }");

    assert!(context.diagnostics.is_empty());
    let Stmt::Function(function) = &program[0] else {
        panic!("expected a function");
    };
    let float64 = TypeName::Primitive(PrimitiveType::Float64);
    let int8 = TypeName::Primitive(PrimitiveType::Int8);
    assert_eq!(
        function.prototype.parameters,
        vec![
            (String::from("x"), float64.clone()),
            (String::from("y"), float64.clone()),
            (String::from("z"), int8.clone()),
        ]
    );
    assert_eq!(function.prototype.return_types, vec![float64, int8]);
}

#[test]
fn test_parse_duplicate_parameter() {
    let (program, context) = parse_source("func f(int32 a, int32 a)() { }");

    assert!(program.is_empty());
    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::DuplicateParameter {
            parameter: String::from("a")
        }]
    );
}

#[test]
fn test_parse_return_multiple_and_none() {
    let (program, context) = parse_source("func f()(int32, bool) { return 1, true; } func g()() { return; }");

    assert!(context.diagnostics.is_empty());
    assert_eq!(
        print_program(&program),
        "(func (proto f () (int32, bool)) (block (return 1 true)))\n\
         (func (proto g () ()) (block (return)))"
    );
}

#[test]
fn test_parse_struct_and_impl() {
    let source = "struct Point { var x int32; var y int32; } \
                  impl Point { func sum()(int32) { return self.x; } }";
    let (program, context) = parse_source(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(program.len(), 2);

    let Stmt::StructDecl(struct_decl) = &program[0] else {
        panic!("expected a struct");
    };
    assert_eq!(struct_decl.name, "Point");
    let members: Vec<(&str, Option<&TypeName>)> = struct_decl
        .members
        .iter()
        .map(|member| (member.name.as_str(), member.declared_type.as_ref()))
        .collect();
    assert_eq!(members, vec![("x", Some(&INT32)), ("y", Some(&INT32))]);

    let Stmt::ImplDecl(impl_decl) = &program[1] else {
        panic!("expected an impl");
    };
    assert_eq!(impl_decl.type_name, "Point");
    assert_eq!(impl_decl.member_functions.len(), 1);

    let prototype = &impl_decl.member_functions[0].prototype;
    assert_eq!(prototype.owner_type_name.as_deref(), Some("Point"));
    assert_eq!(prototype.symbol_name(), "Point.sum");
    assert!(prototype.parameters.is_empty());
}

#[test]
fn test_parse_owner_does_not_leak_past_impl() {
    let (program, _) = parse_source("struct S { var v int8; } impl S { func m()() { } } func free()() { }");

    let Stmt::Function(function) = &program[2] else {
        panic!("expected a function");
    };
    assert_eq!(function.prototype.owner_type_name, None);
}

#[test]
fn test_parse_struct_member_needs_type() {
    let (program, context) = parse_source("struct Bad { var x; var y int32; }");

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::MissingMemberType {
            member: String::from("x")
        }]
    );
    let Stmt::StructDecl(struct_decl) = &program[0] else {
        panic!("expected a struct");
    };
    assert_eq!(struct_decl.members.len(), 1);
    assert_eq!(struct_decl.members[0].name, "y");
}

#[test]
fn test_parse_impl_method_needs_body() {
    let (program, context) = parse_source("struct T { var a int32; } impl T { func m()(); func n()() { } }");

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::MethodWithoutBody {
            function: String::from("m")
        }]
    );
    let Stmt::ImplDecl(impl_decl) = &program[1] else {
        panic!("expected an impl");
    };
    assert_eq!(impl_decl.member_functions.len(), 1);
    assert_eq!(impl_decl.member_functions[0].prototype.name, "n");
}

#[test]
fn test_parse_var_without_type_or_initializer() {
    let (program, context) = parse_source("var y;");

    assert!(program.is_empty());
    assert_eq!(context.diagnostics.error_count(), 1);
    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::MissingTypeOrInitializer {
            variable: String::from("y")
        }]
    );
}

#[test]
fn test_parse_recovers_and_reports_every_error() {
    let source = "var a int32 = 1;\n\
                  var b = ;\n\
                  var c;\n\
                  var d = 4;\n\
                  1 = 2;\n\
                  var e int8;";
    let (program, context) = parse_source(source);

    assert_eq!(context.diagnostics.error_count(), 3);
    let names: Vec<String> = program
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::VarDecl(var_decl) => Some(var_decl.name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["a", "d", "e"]);
}

#[test]
fn test_parse_recovers_inside_block() {
    let (program, context) = parse_source("func f()() { var y; var z = 1; }");

    assert_eq!(context.diagnostics.error_count(), 1);
    let Stmt::Function(function) = &program[0] else {
        panic!("expected a function");
    };
    assert_eq!(function.body.as_ref().map(|body| body.len()), Some(1));
}

#[test]
fn test_parse_if_else_and_loops() {
    let source = "if a < 1 { b = 1; } else { b = 2; } while b > 0 { b -= 1; } for i < 3 i = i + 1;";
    let (program, context) = parse_source(source);

    assert!(context.diagnostics.is_empty());
    let kinds: Vec<StmtType> = program.iter().map(|stmt| stmt.get_stmt_type()).collect();
    assert_eq!(kinds, vec![StmtType::IfStmt, StmtType::LoopStmt, StmtType::LoopStmt]);
    assert_eq!(
        print_program(&program[..1]),
        "(if (< a 1) (block (expr (= b 1))) (block (expr (= b 2))))"
    );
}

#[test]
fn test_parse_call_expression() {
    let (program, context) = parse_source("r = add(1, 2 * 3)(); ping();");

    assert!(context.diagnostics.is_empty());
    assert_eq!(
        print_program(&program),
        "(expr (= r (call (call add 1 (* 2 3)))))\n(expr (call ping))"
    );
}

#[test]
fn test_parse_bare_semicolons_are_skipped() {
    let (program, context) = parse_source(";; var a = 1; ;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(program.len(), 1);
}

#[test]
fn test_parse_spans_cover_statement() {
    let (program, context) = parse_source("var answer = 42;");

    let span = program[0].get_span();
    assert_eq!(context.slice(span), "var answer = 42;");
}
