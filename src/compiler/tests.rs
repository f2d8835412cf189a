//! Unit tests for code generation.
//!
//! Programs are compiled into the in-memory IR backend and, where the
//! behaviour matters more than the shape, executed with the interpreter.

use pretty_assertions::assert_eq;

use crate::{
    compile_source,
    compiler::ir::{
        module::Module,
        types::IrType,
        IrBackend, Interpreter, RuntimeValue,
    },
    errors::errors::{ErrorImpl, Severity},
    CompilerContext,
};

use super::{
    compiler::{Compiler, MODULE_INIT},
    scope::Scope,
};

fn compile_program(source: &str) -> (Module, CompilerContext) {
    let mut context = CompilerContext::new(source, Some(String::from("test.bsh")));
    let backend = compile_source(&mut context, IrBackend::new("test"));
    (backend.into_module(), context)
}

fn error_kinds(context: &CompilerContext) -> Vec<ErrorImpl> {
    context
        .diagnostics
        .iter()
        .filter(|error| error.get_severity() != Severity::Warning)
        .map(|error| error.get_kind().clone())
        .collect()
}

fn warning_kinds(context: &CompilerContext) -> Vec<ErrorImpl> {
    context
        .diagnostics
        .iter()
        .filter(|error| error.get_severity() == Severity::Warning)
        .map(|error| error.get_kind().clone())
        .collect()
}

/// Runs the module initialiser and returns the final value of `name`.
fn global_after_init(module: &Module, name: &str) -> Option<RuntimeValue> {
    let mut interpreter = Interpreter::new(module);
    interpreter.call(MODULE_INIT, vec![]).ok()?;
    interpreter.global(name).cloned()
}

fn int(bits: u32, value: i64) -> RuntimeValue {
    RuntimeValue::Int { bits, value }
}

#[test]
fn test_global_assignment_reads_previous_value() {
    let (module, context) = compile_program("var z = 5; z = z + 1;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "z"), Some(int(64, 6)));
}

#[test]
fn test_var_without_type_or_initializer_creates_nothing() {
    let (module, context) = compile_program("var y;");

    assert_eq!(context.diagnostics.error_count(), 1);
    assert!(module.global("y").is_none());
}

#[test]
fn test_typed_global_converts_initializer() {
    let (module, context) = compile_program("var x int32 = 1 + 2 * 3; var f float32 = 2;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(module.global("x").map(|g| g.ty.clone()), Some(IrType::Int(32)));
    assert_eq!(global_after_init(&module, "x"), Some(int(32, 7)));
    assert_eq!(global_after_init(&module, "f"), Some(RuntimeValue::Float32(2.0)));
}

#[test]
fn test_typed_global_without_initializer_is_zero() {
    let (module, context) = compile_program("var flag bool; var count int16;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "flag"), Some(int(1, 0)));
    assert_eq!(global_after_init(&module, "count"), Some(int(16, 0)));
}

#[test]
fn test_hex_and_octal_literals() {
    let (module, context) = compile_program("var h = 0x1F; var o = 0o17; var d = 0x10 + 0o10;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "h"), Some(int(64, 31)));
    assert_eq!(global_after_init(&module, "o"), Some(int(64, 15)));
    assert_eq!(global_after_init(&module, "d"), Some(int(64, 24)));
}

#[test]
fn test_float_arithmetic_and_comparison() {
    let (module, context) = compile_program("var a = 3.14 * 2.0; var b = a > 6.0; var c = -a;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "a"), Some(RuntimeValue::Float64(6.28)));
    assert_eq!(global_after_init(&module, "b"), Some(int(1, 1)));
    assert_eq!(global_after_init(&module, "c"), Some(RuntimeValue::Float64(-6.28)));
}

#[test]
fn test_mixed_categories_are_rejected() {
    let (module, context) = compile_program("var a = 1 / 2.0;");

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::OperandMismatch {
            operator: String::from("/"),
            left: String::from("i64"),
            right: String::from("float64"),
        }]
    );
    assert!(module.global("a").is_none());
}

#[test]
fn test_narrow_right_operand_follows_left_width() {
    let source = "var small int8 = 3; var wide int64 = 1000; var r = wide + small;";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 1003)));
}

#[test]
fn test_assign_to_unknown_variable() {
    let (_, context) = compile_program("nope = 1;");

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::AssignToUnknownVariable {
            variable: String::from("nope")
        }]
    );
}

#[test]
fn test_undeclared_variable_is_a_warning() {
    let (_, context) = compile_program("var a int32 = missing;");

    assert_eq!(
        warning_kinds(&context),
        vec![ErrorImpl::VariableNotDeclared {
            variable: String::from("missing")
        }]
    );
    assert!(!context.diagnostics.has_errors());
}

#[test]
fn test_null_initializer_without_type() {
    let (module, context) = compile_program("var n = null;");

    assert_eq!(error_kinds(&context), vec![ErrorImpl::NullValue]);
    assert!(module.global("n").is_none());
}

#[test]
fn test_function_call_and_single_return() {
    let source = "func add(int32 a, int32 b)(int32) { return a + b; }\n\
                  var r = add(2, 3);";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    let add = module.function("add").expect("add is declared");
    assert_eq!(add.return_type, IrType::Tuple(vec![IrType::Int(32)]));
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 5)));
}

#[test]
fn test_multiple_return_values() {
    let source = "func pair()(int32, bool) { return 7, true; }";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    let mut interpreter = Interpreter::new(&module);
    let result = interpreter.call("pair", vec![]).expect("pair runs");
    assert_eq!(
        result,
        RuntimeValue::Aggregate(vec![int(32, 7), int(1, 1)])
    );
}

#[test]
fn test_call_before_definition() {
    let source = "var r = twice(21);\n\
                  func twice(int64 n)(int64) { return n * 2; }";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 42)));
}

#[test]
fn test_body_falling_off_end_returns_zero() {
    let source = "func nothing()(int32, float64) { var a = 1; }";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    let mut interpreter = Interpreter::new(&module);
    let result = interpreter.call("nothing", vec![]).expect("nothing runs");
    assert_eq!(
        result,
        RuntimeValue::Aggregate(vec![int(32, 0), RuntimeValue::Float64(0.0)])
    );
}

#[test]
fn test_return_arity_mismatch_is_reported() {
    let source = "func f()(int32, int32) { return 1; }";
    let (module, context) = compile_program(source);

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::ReturnArityMismatch {
            expected: 2,
            received: 1
        }]
    );

    let mut interpreter = Interpreter::new(&module);
    let result = interpreter.call("f", vec![]).expect("f runs");
    assert_eq!(result, RuntimeValue::Aggregate(vec![int(32, 1), int(32, 0)]));
}

#[test]
fn test_return_outside_function() {
    let (_, context) = compile_program("return 1;");

    assert_eq!(error_kinds(&context), vec![ErrorImpl::ReturnOutsideFunction]);
}

#[test]
fn test_argument_count_mismatch() {
    let source = "func one(int32 a)(int32) { return a; } var r = one(1, 2);";
    let (_, context) = compile_program(source);

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::ArgumentCountMismatch {
            function: String::from("one"),
            expected: 1,
            received: 2,
        }]
    );
}

#[test]
fn test_unknown_function() {
    let (_, context) = compile_program("var r = ghost();");

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::UnknownFunction {
            function: String::from("ghost")
        }]
    );
}

#[test]
fn test_function_defined_twice() {
    let source = "func f()() { } func f()() { }";
    let (_, context) = compile_program(source);

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::FunctionAlreadyDefined {
            function: String::from("f")
        }]
    );
}

#[test]
fn test_unreachable_statements_are_skipped() {
    let source = "func f()(int32) { return 1; var a = 2; a = 3; }";
    let (module, context) = compile_program(source);

    assert_eq!(warning_kinds(&context), vec![ErrorImpl::UnreachableCode]);
    assert!(!context.diagnostics.has_errors());

    let f = module.function("f").expect("f is declared");
    assert_eq!(f.blocks.len(), 1);
}

#[test]
fn test_if_else_selects_branch() {
    let source = "var a = 0;\n\
                  if 3 > 2 { a = 10; } else { a = 20; }\n\
                  var b = 0;\n\
                  if false { b = 1; }";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "a"), Some(int(64, 10)));
    assert_eq!(global_after_init(&module, "b"), Some(int(64, 0)));
}

#[test]
fn test_while_loop_accumulates() {
    let source = "func sum(int64 n)(int64) {\n\
                      var total int64 = 0;\n\
                      while n > 0 { total += n; n -= 1; }\n\
                      return total;\n\
                  }\n\
                  var r = sum(10);";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 55)));
}

#[test]
fn test_integer_condition_and_not() {
    let source = "var n = 3; var hits = 0;\n\
                  for n { hits += 1; n -= 1; }\n\
                  var none = !n;";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "hits"), Some(int(64, 3)));
    assert_eq!(global_after_init(&module, "none"), Some(int(1, 1)));
}

#[test]
fn test_logical_keywords_on_booleans() {
    let source = "var a = true and false; var b = true or false; var c = !b;";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "a"), Some(int(1, 0)));
    assert_eq!(global_after_init(&module, "b"), Some(int(1, 1)));
    assert_eq!(global_after_init(&module, "c"), Some(int(1, 0)));
}

#[test]
fn test_remainder_and_signed_division() {
    let (module, context) = compile_program("var q = -7 / 2; var r = -7 % 2;");

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "q"), Some(int(64, -3)));
    assert_eq!(global_after_init(&module, "r"), Some(int(64, -1)));
}

#[test]
fn test_method_takes_receiver_first() {
    let source = "struct Point { var x int32; var y int32; }\n\
                  impl Point { func sum()(int32) { return self.x; } }";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    let sum = module.function("Point.sum").expect("method is declared");
    let point = module.struct_index("Point").expect("struct is declared");
    assert_eq!(sum.params.len(), 1);
    assert_eq!(sum.params[0].0, "self");
    assert_eq!(
        sum.params[0].1,
        IrType::Pointer(Box::new(IrType::Struct(point)))
    );
    assert_eq!(
        module.structs[point].fields,
        Some(vec![IrType::Int(32), IrType::Int(32)])
    );
}

#[test]
fn test_method_call_reads_members() {
    let source = "struct Counter { var step int32; var total int32; }\n\
                  impl Counter {\n\
                      func next(int32 base)(int32) { return base + self.step + self.total; }\n\
                  }\n\
                  var c Counter;\n\
                  var r = c.next(5);\n\
                  var s = c.step;";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 5)));
    assert_eq!(global_after_init(&module, "s"), Some(int(64, 0)));
}

#[test]
fn test_unknown_member() {
    let source = "struct P { var x int32; } var p P; var v = p.z;";
    let (_, context) = compile_program(source);

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::UnknownMember {
            type_: String::from("P"),
            member: String::from("z"),
        }]
    );
}

#[test]
fn test_member_access_on_scalar() {
    let (_, context) = compile_program("var n = 1; var v = n.x;");

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::NotAnObject {
            variable: String::from("n")
        }]
    );
}

#[test]
fn test_struct_defined_twice() {
    let source = "struct S { var a int8; } struct S { var b int8; }";
    let (_, context) = compile_program(source);

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::StructAlreadyDefined {
            name: String::from("S")
        }]
    );
}

#[test]
fn test_global_declared_twice() {
    let (_, context) = compile_program("var g = 1; var g = 2;");

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::GlobalRedeclared {
            variable: String::from("g")
        }]
    );
}

#[test]
fn test_function_locals_are_not_globals() {
    let source = "func f()() { var local = 1; } var r = local;";
    let (module, context) = compile_program(source);

    assert!(module.global("local").is_none());
    assert_eq!(
        warning_kinds(&context),
        vec![ErrorImpl::VariableNotDeclared {
            variable: String::from("local")
        }]
    );
}

#[test]
fn test_functions_see_globals() {
    let source = "var base = 40; func plus()(int64) { return base + 2; } var r = plus();";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 42)));
}

#[test]
fn test_every_function_verifies() {
    let source = "func f(int32 a)(int32) { if a > 0 { return 1; } return 0; }\n\
                  var r = f(5);";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    for index in 0..module.functions.len() {
        assert_eq!(super::ir::verify::verify_function(&module, index), Ok(()));
    }
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 1)));
}

#[test]
fn test_prototype_declares_without_body() {
    let (module, context) = compile_program("func later(int32 a)(int32);");

    assert!(context.diagnostics.is_empty());
    let later = module.function("later").expect("prototype is declared");
    assert!(!later.has_body());
    assert_eq!(later.params, vec![(String::from("a"), IrType::Int(32))]);
}

#[test]
fn test_storage_of_impl_only_struct() {
    let source = "impl Ghost { func f()() { } } var g Ghost;";
    let (module, context) = compile_program(source);

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::UnknownType {
            type_: String::from("Ghost")
        }]
    );
    assert!(module.global("g").is_none());
    assert!(module.function("Ghost.f").is_some());
}

#[test]
fn test_storage_may_name_a_later_struct() {
    let source = "var p Point;\n\
                  func f()(int32) { var q Point; return q.x; }\n\
                  var r = f();\n\
                  struct Point { var x int32; }";
    let (module, context) = compile_program(source);

    assert_eq!(error_kinds(&context), vec![]);
    assert!(module.global("p").is_some());
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 0)));
}

#[test]
fn test_struct_containing_itself() {
    let (module, context) = compile_program("struct Node { var next Node; } var n Node; var k = 1;");

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::RecursiveStruct {
            name: String::from("Node")
        }]
    );
    assert!(module.global("n").is_none());
    assert_eq!(global_after_init(&module, "k"), Some(int(64, 1)));
}

#[test]
fn test_structs_containing_each_other() {
    let source = "struct A { var b B; } struct B { var a A; } var a A;";
    let (module, context) = compile_program(source);

    assert_eq!(
        error_kinds(&context),
        vec![
            ErrorImpl::RecursiveStruct {
                name: String::from("A")
            },
            ErrorImpl::RecursiveStruct {
                name: String::from("B")
            },
        ]
    );
    assert!(module.global("a").is_none());
}

#[test]
fn test_holder_of_recursive_struct_keeps_other_members() {
    let source = "struct Node { var next Node; }\n\
                  struct Holder { var inner Node; var x int32; }\n\
                  func read()(int32) { var h Holder; return h.x; }\n\
                  var r = read();";
    let (module, context) = compile_program(source);

    assert_eq!(
        error_kinds(&context),
        vec![ErrorImpl::RecursiveStruct {
            name: String::from("Node")
        }]
    );
    assert_eq!(global_after_init(&module, "r"), Some(int(64, 0)));
}

#[test]
fn test_unsigned_division_and_comparison() {
    let source = "var a uint8 = 200; var b = a > 100;\n\
                  var c uint8 = 200; var d = c / 2;\n\
                  var e uint8 = 255; var m = e % 10; var s = e >> 4;\n\
                  var w uint64 = a;\n\
                  var g float64 = e;";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "b"), Some(int(1, 1)));
    assert_eq!(global_after_init(&module, "d"), Some(int(64, 100)));
    assert_eq!(global_after_init(&module, "m"), Some(int(64, 5)));
    assert_eq!(global_after_init(&module, "s"), Some(int(64, 15)));
    assert_eq!(global_after_init(&module, "w"), Some(int(64, 200)));
    assert_eq!(global_after_init(&module, "g"), Some(RuntimeValue::Float64(255.0)));
}

#[test]
fn test_unsigned_return_widens_with_zeros() {
    let source = "func id(uint8 x)(uint8) { return x; } var h = id(250);";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "h"), Some(int(64, 250)));
}

#[test]
fn test_bitwise_operators() {
    let source = "var a = 6; a ^= 3;\n\
                  var b = 6; b = b ^ 3;\n\
                  var c = 1 | 2 & 3;\n\
                  var d = 1 << 4 >> 2;\n\
                  var e = 1 + 1 << 2;\n\
                  var f = 12 & 10 | 1;";
    let (module, context) = compile_program(source);

    assert!(context.diagnostics.is_empty());
    assert_eq!(global_after_init(&module, "a"), Some(int(64, 5)));
    assert_eq!(global_after_init(&module, "b"), Some(int(64, 5)));
    assert_eq!(global_after_init(&module, "c"), Some(int(64, 3)));
    assert_eq!(global_after_init(&module, "d"), Some(int(64, 4)));
    assert_eq!(global_after_init(&module, "e"), Some(int(64, 8)));
    assert_eq!(global_after_init(&module, "f"), Some(int(64, 9)));
}

#[test]
fn test_trait_scope_is_restored() {
    let mut context = CompilerContext::new("", None);
    let mut compiler = Compiler::new(&mut context, IrBackend::new("test"));

    {
        let guard = compiler.enter_scope(Scope::Trait);
        assert_eq!(guard.scope(), Scope::Trait);
        assert!(!guard.in_function());
    }
    assert_eq!(compiler.scope(), Scope::Global);
}
