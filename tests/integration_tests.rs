//! Integration tests for end-to-end compilation.
//!
//! These tests drive the public pipeline the way the binary does: source
//! text through tokenization, parsing and code generation into the IR
//! backend, then execution of the module initialiser.

use baasha::{
    ast::{
        ast::{Expr, Stmt},
        printer::print_program,
        types::{PrimitiveType, TypeName},
    },
    compile_source,
    compiler::{
        compiler::{compile, MODULE_INIT},
        ir::{module::Module, types::IrType, Interpreter, IrBackend, RuntimeValue},
    },
    errors::errors::ErrorImpl,
    lexer::{
        lexer::{classify_lexeme, object_type_names, tokenize},
        tokens::{Token, TokenKind},
    },
    parse_source, render_diagnostic, CompilerContext, CompilerOptions,
};
use pretty_assertions::assert_eq;

fn context_for(source: &str) -> CompilerContext {
    CompilerContext::new(source, Some(String::from("test.bsh")))
}

fn tokens_of(source: &str) -> Vec<Token> {
    let mut context = context_for(source);
    tokenize(&mut context)
}

fn compile_program(source: &str) -> (Module, CompilerContext) {
    let mut context = context_for(source);
    let backend = compile_source(&mut context, IrBackend::new("test"));
    (backend.into_module(), context)
}

fn run_init(module: &Module) -> Vec<(String, RuntimeValue)> {
    let mut interpreter = Interpreter::new(module);
    interpreter
        .call(MODULE_INIT, vec![])
        .expect("module initialiser runs");

    interpreter
        .globals()
        .into_iter()
        .map(|(name, value)| (String::from(name), value.clone()))
        .collect()
}

#[test]
fn test_number_literals_lex_to_single_tokens() {
    let cases = [
        ("123", TokenKind::IntLiteral),
        ("0x1F", TokenKind::HexLiteral),
        ("0o17", TokenKind::OctalLiteral),
        ("3.14", TokenKind::FloatLiteral),
        ("3.14e-2", TokenKind::FloatLiteral),
    ];

    for (source, kind) in cases {
        let kinds: Vec<TokenKind> = tokens_of(source).iter().map(|token| token.kind).collect();
        assert_eq!(kinds, vec![kind, TokenKind::EndOfFile], "lexing {:?}", source);
    }
}

#[test]
fn test_token_streams_end_with_one_end_of_file() {
    let sources = [
        "",
        "var x int32 = 1 + 2 * 3;",
        "func add(int32 a, int32 b)(int32) { return a + b; }",
        "\"unterminated",
        "# $ @",
        "// only a comment",
    ];

    for source in sources {
        let tokens = tokens_of(source);
        let ends = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::EndOfFile)
            .count();

        assert_eq!(ends, 1, "source {:?}", source);
        assert_eq!(tokens.last().map(|token| token.kind), Some(TokenKind::EndOfFile));
    }
}

#[test]
fn test_relexing_token_text_gives_same_kind() {
    let source = "struct Pair { var left int64; }\n\
                  var total int64 = 0x10 + 0o7 * 2.5e3; if total >= 1 { total -= 1; } // done\n\
                  var pair Pair; pair.left = total ^ 3 | 1 << 2;";
    let context = context_for(source);
    let tokens = tokens_of(source);

    for (index, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::EndOfFile {
            continue;
        }
        let text = context.slice(&token.span);
        let object_types = object_type_names(&tokens[..=index]);
        assert_eq!(
            classify_lexeme(text, &object_types),
            Some(token.kind),
            "re-lexing {:?}",
            text
        );
    }
    assert!(tokens.iter().any(|token| token.kind == TokenKind::ObjectType));
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let mut context = context_for("var x int32 = 1 + 2 * 3;");
    let program = parse_source(&mut context);

    assert!(context.diagnostics.is_empty());
    assert_eq!(program.len(), 1);

    let Stmt::VarDecl(var_decl) = &program[0] else {
        panic!("expected a variable declaration");
    };
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
fn test_function_declaration_shape() {
    let mut context = context_for("func add(int32 a, int32 b)(int32) { return a + b; }");
    let program = parse_source(&mut context);

    assert!(context.diagnostics.is_empty());
    let Stmt::Function(function) = &program[0] else {
        panic!("expected a function");
    };

    let int32 = TypeName::Primitive(PrimitiveType::Int32);
    assert_eq!(
        function.prototype.parameters,
        vec![
            (String::from("a"), int32.clone()),
            (String::from("b"), int32.clone())
        ]
    );
    assert_eq!(function.prototype.return_types, vec![int32]);

    let body = function.body.as_ref().expect("function has a body");
    assert_eq!(body.len(), 1);
    let Some(Stmt::Return(ret)) = body.iter().next() else {
        panic!("expected a return");
    };
    assert_eq!(ret.expressions.len(), 1);
}

#[test]
fn test_impl_method_receives_self_first() {
    let source = "struct Point { var x int32; var y int32; }\n\
                  impl Point { func sum()(int32) { return self.x; } }";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    let sum = module.function("Point.sum").expect("method is emitted");
    let names: Vec<&str> = sum.params.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["self"]);
    assert!(matches!(sum.params[0].1, IrType::Pointer(_)));
}

#[test]
fn test_var_without_type_or_initializer() {
    let (module, context) = compile_program("var y;");

    assert_eq!(context.diagnostics.error_count(), 1);
    assert!(module.global("y").is_none());
    assert_eq!(run_init(&module), vec![]);
}

#[test]
fn test_global_reassignment_evaluates_to_six() {
    let (module, context) = compile_program("var z = 5; z = z + 1;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(
        run_init(&module),
        vec![(String::from("z"), RuntimeValue::Int { bits: 64, value: 6 })]
    );
}

#[test]
fn test_program_with_structs_functions_and_loops() {
    let source = "struct Pair { var left int32; var right int32; }\n\
                  impl Pair { func total()(int32) { return self.left + self.right; } }\n\
                  func fib(int64 n)(int64) {\n\
                      var a int64 = 0;\n\
                      var b int64 = 1;\n\
                      while n > 0 { var next = a + b; a = b; b = next; n -= 1; }\n\
                      return a;\n\
                  }\n\
                  func divmod(int64 a, int64 b)(int64, int64) { return a / b, a % b; }\n\
                  var p Pair;\n\
                  var f = fib(10);\n\
                  var t = p.total();\n\
                  var big = f > 50;";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty(), "{:?}", context.diagnostics);
    let globals = run_init(&module);
    let value = |name: &str| {
        globals
            .iter()
            .find(|(global, _)| global == name)
            .map(|(_, value)| value.to_string())
    };

    assert_eq!(value("f"), Some(String::from("55")));
    assert_eq!(value("t"), Some(String::from("0")));
    assert_eq!(value("big"), Some(String::from("true")));

    let mut interpreter = Interpreter::new(&module);
    let result = interpreter
        .call(
            "divmod",
            vec![
                RuntimeValue::Int { bits: 64, value: 17 },
                RuntimeValue::Int { bits: 64, value: 5 },
            ],
        )
        .expect("divmod runs");
    assert_eq!(result.to_string(), "{ 3, 2 }");
}

#[test]
fn test_every_error_in_a_run_is_reported() {
    let source = "var a = ;\n\
                  var b;\n\
                  c = 1;\n\
                  var d int32 = 4;\n\
                  return d;";
    let (module, context) = compile_program(source);

    let kinds: Vec<ErrorImpl> = context
        .diagnostics
        .iter()
        .map(|error| error.get_kind().clone())
        .collect();
    assert_eq!(kinds.len(), 4);
    assert!(matches!(kinds[0], ErrorImpl::ExpectedExpression { .. }));
    assert_eq!(
        kinds[1],
        ErrorImpl::MissingTypeOrInitializer {
            variable: String::from("b")
        }
    );
    assert_eq!(
        kinds[2],
        ErrorImpl::AssignToUnknownVariable {
            variable: String::from("c")
        }
    );
    assert_eq!(kinds[3], ErrorImpl::ReturnOutsideFunction);

    assert!(module.global("d").is_some());
}

#[test]
fn test_rendered_diagnostic_points_at_source() {
    let source = "var ok = 1;\nmissing = 2;\n";
    let (_, context) = compile_program(source);

    let error = context.diagnostics.iter().next().expect("one diagnostic");
    let rendered = render_diagnostic(error, &context.source, &context.file);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(
        lines,
        vec![
            "error: AssignToUnknownVariable (Can't assign to `missing`, it was never declared)",
            "-> test.bsh",
            "  |",
            "2 | missing = 2;",
            "  | ^",
        ]
    );
}

#[test]
fn test_module_prints_as_text() {
    let (module, context) = compile_program("var z = 5;");

    assert!(context.diagnostics.is_empty());
    let text = module.to_string();
    assert!(text.starts_with("; module 'test'"));
    assert!(text.contains("@z = global i64 0"));
    assert!(text.contains("store i64 5, i64* @z"));
    assert!(text.contains(&format!("define {{}} @{}()", MODULE_INIT)));
}

#[test]
fn test_tab_width_option_moves_columns() {
    let options = CompilerOptions {
        tab_width: 8,
        ..CompilerOptions::default()
    };
    let mut context = CompilerContext::with_options("\tvar", None, options);
    let tokens = tokenize(&mut context);

    assert_eq!(tokens[0].span.column, 8);
    assert_eq!(context.file.as_str(), "shell");
}

#[test]
fn test_compile_reuses_parsed_program() {
    let mut context = context_for("func one()(int8) { return 1; } var r = one();");
    let program = parse_source(&mut context);
    assert_eq!(
        print_program(&program[1..]),
        "(var r (call one))"
    );

    let backend = compile(&program, &mut context, IrBackend::new("again"));
    let module = backend.into_module();
    assert!(context.diagnostics.is_empty());
    assert_eq!(
        run_init(&module),
        vec![(String::from("r"), RuntimeValue::Int { bits: 64, value: 1 })]
    );
}
