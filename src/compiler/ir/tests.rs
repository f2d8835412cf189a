//! Unit tests for the IR backend: builder, printer, verifier and
//! interpreter, driven through the `Backend` trait directly.

use pretty_assertions::assert_eq;

use crate::compiler::backend::{Backend, IntBinaryOp, IntPredicate};

use super::{
    instructions::Instruction,
    types::IrType,
    verify::{verify_function, VerifyError},
    EvalError, Interpreter, IrBackend, RuntimeValue,
};

/// `func add(i32 a, i32 b) -> { i32 }`, returning `a + b`.
fn build_add(backend: &mut IrBackend) {
    let int32 = backend.int_type(32);
    let ret = backend.tuple_type(&[int32.clone()]);
    let add = backend.declare_function(
        "add",
        &ret,
        &[
            (String::from("a"), int32.clone()),
            (String::from("b"), int32.clone()),
        ],
    );
    let entry = backend.append_block(&add, "entry");
    backend.position_at_end(&entry);

    let params = backend.function_params(&add);
    let sum = backend.build_int_binary(IntBinaryOp::Add, &params[0], &params[1]);
    let slot = backend.build_alloca(&ret, "retval");
    let field = backend.build_field_ptr(&ret, &slot, 0);
    backend.build_store(&field, &sum);
    let value = backend.build_load(&ret, &slot, "ret");
    backend.build_return(&value);
}

#[test]
fn test_print_module() {
    let mut backend = IrBackend::new("demo");
    let int64 = backend.int_type(64);
    let five = backend.const_int(&int64, 5);
    backend.add_global("z", &int64, &five);
    let point = backend.named_struct("Point");
    let int32 = backend.int_type(32);
    backend.set_struct_body(&point, &[int32.clone(), int32]);
    build_add(&mut backend);

    let expected = "; module 'demo'\n\
                    \n\
                    %Point = type { i32, i32 }\n\
                    \n\
                    @z = global i64 5\n\
                    \n\
                    define { i32 } @add(i32 %a, i32 %b) {\n\
                    entry:\n  \
                    %0 = add i32 %a, %b\n  \
                    %1 = alloca { i32 }\n  \
                    %2 = getelementptr { i32 }, { i32 }* %1, i32 0, i32 0\n  \
                    store i32 %0, i32* %2\n  \
                    %3 = load { i32 }, { i32 }* %1\n  \
                    ret { i32 } %3\n\
                    }\n";
    assert_eq!(backend.module().to_string(), expected);
}

#[test]
fn test_print_declaration_and_opaque_struct() {
    let mut backend = IrBackend::new("decl");
    backend.named_struct("Later");
    let unit = backend.tuple_type(&[]);
    backend.declare_function("tick", &unit, &[]);

    assert_eq!(
        backend.module().to_string(),
        "; module 'decl'\n\n%Later = type opaque\n\ndeclare {} @tick()\n"
    );
}

#[test]
fn test_named_struct_is_reused() {
    let mut backend = IrBackend::new("structs");
    let first = backend.named_struct("S");
    let second = backend.named_struct("S");

    assert_eq!(first, second);
    assert_eq!(backend.lookup_struct("S"), Some(first));
    assert_eq!(backend.lookup_struct("T"), None);
    assert_eq!(backend.module().structs.len(), 1);
}

#[test]
fn test_block_names_are_unique() {
    let mut backend = IrBackend::new("blocks");
    let unit = backend.tuple_type(&[]);
    let function = backend.declare_function("f", &unit, &[]);
    backend.append_block(&function, "then");
    backend.append_block(&function, "then");

    let names: Vec<&str> = backend.module().functions[0]
        .blocks
        .iter()
        .map(|block| block.name.as_str())
        .collect();
    assert_eq!(names, vec!["then", "then1"]);
}

#[test]
fn test_instructions_without_position_are_dropped() {
    let mut backend = IrBackend::new("loose");
    let int32 = backend.int_type(32);
    let one = backend.const_int(&int32, 1);
    let value = backend.build_int_binary(IntBinaryOp::Add, &one, &one);

    assert!(value.is_constant());
    assert!(backend.module().functions.is_empty());
}

#[test]
fn test_cast_between_scalars_only() {
    let mut backend = IrBackend::new("casts");
    let unit = backend.tuple_type(&[]);
    let function = backend.declare_function("f", &unit, &[]);
    let entry = backend.append_block(&function, "entry");
    backend.position_at_end(&entry);

    let int8 = backend.int_type(8);
    let float64 = backend.float_type(64);
    let value = backend.const_int(&int8, 3);

    assert!(backend.build_cast(&value, &float64, false).is_some());
    assert_eq!(backend.build_cast(&value, &int8, false), Some(value.clone()));
    assert!(backend.build_cast(&value, &unit, true).is_none());
}

#[test]
fn test_print_widening_by_signedness() {
    let mut backend = IrBackend::new("widen");
    let int8 = backend.int_type(8);
    let int64 = backend.int_type(64);
    let function = backend.declare_function("f", &int64, &[(String::from("x"), int8)]);
    let entry = backend.append_block(&function, "entry");
    backend.position_at_end(&entry);

    let x = backend.function_params(&function)[0].clone();
    backend.build_cast(&x, &int64, false);
    let widened = backend.build_cast(&x, &int64, true).expect("ints cast");
    backend.build_return(&widened);

    let expected = "; module 'widen'\n\
                    \n\
                    define i64 @f(i8 %x) {\n\
                    entry:\n  \
                    %0 = sext i8 %x to i64\n  \
                    %1 = zext i8 %x to i64\n  \
                    ret i64 %1\n\
                    }\n";
    assert_eq!(backend.module().to_string(), expected);

    let module = backend.into_module();
    let result = Interpreter::new(&module).call("f", vec![RuntimeValue::Int { bits: 8, value: -56 }]);
    assert_eq!(result, Ok(RuntimeValue::Int { bits: 64, value: 200 }));
}

#[test]
fn test_verify_accepts_well_formed_function() {
    let mut backend = IrBackend::new("ok");
    build_add(&mut backend);

    assert_eq!(verify_function(backend.module(), 0), Ok(()));
    let add = backend.get_function("add").expect("add is declared");
    assert_eq!(backend.verify_function(&add), Ok(()));
}

#[test]
fn test_verify_missing_terminator() {
    let mut backend = IrBackend::new("open");
    let unit = backend.tuple_type(&[]);
    let function = backend.declare_function("open", &unit, &[]);
    backend.append_block(&function, "entry");

    assert_eq!(
        verify_function(backend.module(), 0),
        Err(VerifyError::MissingTerminator {
            function: String::from("open"),
            block: String::from("entry"),
        })
    );
    assert!(backend.verify_function(&function).is_err());
}

#[test]
fn test_verify_store_type_mismatch() {
    let mut backend = IrBackend::new("store");
    let unit = backend.tuple_type(&[]);
    let function = backend.declare_function("f", &unit, &[]);
    let entry = backend.append_block(&function, "entry");
    backend.position_at_end(&entry);

    let int32 = backend.int_type(32);
    let float32 = backend.float_type(32);
    let slot = backend.build_alloca(&int32, "x");
    let value = backend.const_float(&float32, 1.5);
    backend.build_store(&slot, &value);
    let zero = backend.const_zero(&unit);
    backend.build_return(&zero);

    assert_eq!(
        verify_function(backend.module(), 0),
        Err(VerifyError::StoreTypeMismatch {
            function: String::from("f"),
            value: String::from("float"),
            pointer: String::from("i32*"),
        })
    );
}

#[test]
fn test_verify_return_type_mismatch() {
    let mut backend = IrBackend::new("ret");
    let int32 = backend.int_type(32);
    let ret = backend.tuple_type(&[int32.clone()]);
    let function = backend.declare_function("f", &ret, &[]);
    let entry = backend.append_block(&function, "entry");
    backend.position_at_end(&entry);
    let one = backend.const_int(&int32, 1);
    backend.build_return(&one);

    assert!(matches!(
        verify_function(backend.module(), 0),
        Err(VerifyError::ReturnTypeMismatch { .. })
    ));
}

#[test]
fn test_terminators_and_successors() {
    let branch = Instruction::Branch { target: 2 };

    assert!(branch.is_terminator());
    assert_eq!(branch.successors(), vec![2]);
}

#[test]
fn test_interpreter_runs_call() {
    let mut backend = IrBackend::new("run");
    build_add(&mut backend);
    let module = backend.into_module();

    let mut interpreter = Interpreter::new(&module);
    let result = interpreter
        .call(
            "add",
            vec![
                RuntimeValue::Int { bits: 32, value: 40 },
                RuntimeValue::Int { bits: 32, value: 2 },
            ],
        )
        .expect("add runs");

    assert_eq!(
        result,
        RuntimeValue::Aggregate(vec![RuntimeValue::Int { bits: 32, value: 42 }])
    );
    assert!(interpreter.steps() > 0);
}

#[test]
fn test_interpreter_wraps_to_width() {
    let mut backend = IrBackend::new("wrap");
    let int8 = backend.int_type(8);
    let function = backend.declare_function("f", &int8, &[]);
    let entry = backend.append_block(&function, "entry");
    backend.position_at_end(&entry);
    let max = backend.const_int(&int8, 127);
    let one = backend.const_int(&int8, 1);
    let sum = backend.build_int_binary(IntBinaryOp::Add, &max, &one);
    backend.build_return(&sum);
    let module = backend.into_module();

    let result = Interpreter::new(&module).call("f", vec![]);
    assert_eq!(result, Ok(RuntimeValue::Int { bits: 8, value: -128 }));
}

#[test]
fn test_interpreter_division_by_zero() {
    let mut backend = IrBackend::new("div");
    let int64 = backend.int_type(64);
    let function = backend.declare_function("f", &int64, &[]);
    let entry = backend.append_block(&function, "entry");
    backend.position_at_end(&entry);
    let one = backend.const_int(&int64, 1);
    let zero = backend.const_int(&int64, 0);
    let quotient = backend.build_int_binary(IntBinaryOp::SDiv, &one, &zero);
    backend.build_return(&quotient);
    let module = backend.into_module();

    let result = Interpreter::new(&module).call("f", vec![]);
    assert_eq!(result, Err(EvalError::DivisionByZero));
}

#[test]
fn test_interpreter_unsigned_operations() {
    let mut backend = IrBackend::new("unsigned");
    let int8 = backend.int_type(8);
    let int1 = backend.int_type(1);
    let ret = backend.tuple_type(&[int8.clone(), int8.clone(), int8.clone(), int1]);
    let function = backend.declare_function("f", &ret, &[]);
    let entry = backend.append_block(&function, "entry");
    backend.position_at_end(&entry);

    // 200 and 255 as i8 bit patterns
    let big = backend.const_int(&int8, -56);
    let full = backend.const_int(&int8, -1);
    let two = backend.const_int(&int8, 2);
    let ten = backend.const_int(&int8, 10);
    let four = backend.const_int(&int8, 4);
    let hundred = backend.const_int(&int8, 100);

    let results = [
        backend.build_int_binary(IntBinaryOp::UDiv, &big, &two),
        backend.build_int_binary(IntBinaryOp::URem, &full, &ten),
        backend.build_int_binary(IntBinaryOp::LShr, &full, &four),
        backend.build_int_compare(IntPredicate::Ugt, &big, &hundred),
    ];
    let slot = backend.build_alloca(&ret, "retval");
    for (index, value) in results.iter().enumerate() {
        let field = backend.build_field_ptr(&ret, &slot, index as u32);
        backend.build_store(&field, value);
    }
    let value = backend.build_load(&ret, &slot, "ret");
    backend.build_return(&value);
    let module = backend.into_module();

    assert_eq!(
        Interpreter::new(&module).call("f", vec![]),
        Ok(RuntimeValue::Aggregate(vec![
            RuntimeValue::Int { bits: 8, value: 100 },
            RuntimeValue::Int { bits: 8, value: 5 },
            RuntimeValue::Int { bits: 8, value: 15 },
            RuntimeValue::Int { bits: 1, value: 1 },
        ]))
    );
}

#[test]
fn test_zero_of_self_containing_struct_terminates() {
    let mut backend = IrBackend::new("cycle");
    let node = backend.named_struct("Node");
    backend.set_struct_body(&node, &[node.clone()]);
    let zero = backend.const_zero(&node);
    backend.add_global("n", &node, &zero);
    let module = backend.into_module();

    assert_eq!(
        RuntimeValue::zero(&module, &IrType::Struct(0)),
        RuntimeValue::Aggregate(vec![RuntimeValue::Aggregate(vec![])])
    );
    assert_eq!(
        Interpreter::new(&module).global("n"),
        Some(&RuntimeValue::Aggregate(vec![RuntimeValue::Aggregate(vec![])]))
    );
}

#[test]
fn test_interpreter_step_limit() {
    let mut backend = IrBackend::new("spin");
    let unit = backend.tuple_type(&[]);
    let function = backend.declare_function("spin", &unit, &[]);
    let entry = backend.append_block(&function, "entry");
    let body = backend.append_block(&function, "body");
    let exit = backend.append_block(&function, "exit");

    backend.position_at_end(&entry);
    backend.build_branch(&body);
    backend.position_at_end(&body);
    let int32 = backend.int_type(32);
    let one = backend.const_int(&int32, 1);
    let always = backend.build_int_compare(IntPredicate::Eq, &one, &one);
    backend.build_cond_branch(&always, &body, &exit);
    backend.position_at_end(&exit);
    let zero = backend.const_zero(&unit);
    backend.build_return(&zero);
    let module = backend.into_module();

    let result = Interpreter::new(&module).with_step_limit(100).call("spin", vec![]);
    assert_eq!(result, Err(EvalError::StepLimitExceeded(100)));
}

#[test]
fn test_interpreter_rejects_bad_calls() {
    let mut backend = IrBackend::new("calls");
    build_add(&mut backend);
    let int32 = backend.int_type(32);
    backend.declare_function("external", &int32, &[]);
    let module = backend.into_module();
    let mut interpreter = Interpreter::new(&module);

    assert_eq!(
        interpreter.call("missing", vec![]),
        Err(EvalError::UnknownFunction(String::from("missing")))
    );
    assert_eq!(
        interpreter.call("external", vec![]),
        Err(EvalError::MissingBody(String::from("external")))
    );
    assert_eq!(
        interpreter.call("add", vec![]),
        Err(EvalError::ArityMismatch {
            function: String::from("add"),
            expected: 2,
            received: 0,
        })
    );
}

#[test]
fn test_global_values_after_store() {
    let mut backend = IrBackend::new("globals");
    let int64 = backend.int_type(64);
    let zero = backend.const_zero(&int64);
    let global = backend.add_global("g", &int64, &zero);

    let unit = backend.tuple_type(&[]);
    let init = backend.declare_function("init", &unit, &[]);
    let entry = backend.append_block(&init, "entry");
    backend.position_at_end(&entry);
    let nine = backend.const_int(&int64, 9);
    backend.build_store(&global, &nine);
    let unit_zero = backend.const_zero(&unit);
    backend.build_return(&unit_zero);

    let (_, ty) = backend.get_global("g").expect("g exists");
    assert_eq!(ty, IrType::Int(64));

    let module = backend.into_module();
    let mut interpreter = Interpreter::new(&module);
    assert_eq!(interpreter.global("g"), Some(&RuntimeValue::Int { bits: 64, value: 0 }));
    interpreter.call("init", vec![]).expect("init runs");

    let globals: Vec<String> = interpreter
        .globals()
        .iter()
        .map(|(name, value)| format!("{} = {}", name, value))
        .collect();
    assert_eq!(globals, vec!["g = 9"]);
}
