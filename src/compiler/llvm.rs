//! LLVM backend, built on inkwell.
//!
//! Only compiled with the `llvm` feature. Handles are the inkwell values
//! themselves, so the module can be printed or written as textual IR once
//! code generation is done.

use std::{collections::HashMap, path::Path};

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::Module,
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum},
    values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue, PointerValue},
    AddressSpace,
};
use tracing::error;

use super::backend::{
    Backend, FloatBinaryOp, FloatPredicate, IntBinaryOp, IntPredicate, ValueCategory,
};

/// Runs a builder call, logging and substituting `$fallback` when inkwell
/// rejects the instruction.
macro_rules! emit {
    ($s:ident . $method:ident ( $($arg:expr),* $(,)? ) else $fallback:expr) => {
        match $s.builder.$method( $($arg),* ) {
            Ok(value) => value,
            Err(err) => {
                error!(instruction = stringify!($method), %err, "LLVM builder rejected instruction");
                $fallback
            }
        }
    };
}

pub struct LlvmBackend<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    globals: HashMap<String, (PointerValue<'ctx>, BasicTypeEnum<'ctx>)>,
}

impl<'ctx> LlvmBackend<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        LlvmBackend {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            globals: HashMap::new(),
        }
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Textual IR of the whole module.
    pub fn print_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn save_module_to_file(&self, path: &Path) -> Result<(), String> {
        self.module
            .print_to_file(path)
            .map_err(|err| err.to_string())
    }

    fn unit(&self) -> BasicTypeEnum<'ctx> {
        self.context.struct_type(&[], false).into()
    }

    fn null_pointer(&self) -> PointerValue<'ctx> {
        self.context
            .i8_type()
            .ptr_type(AddressSpace::default())
            .const_null()
    }

    fn zero_of(&self, ty: BasicTypeEnum<'ctx>) -> BasicValueEnum<'ctx> {
        match ty {
            BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
            BasicTypeEnum::FloatType(t) => t.const_zero().into(),
            BasicTypeEnum::IntType(t) => t.const_zero().into(),
            BasicTypeEnum::PointerType(t) => t.const_zero().into(),
            BasicTypeEnum::StructType(t) => t.const_zero().into(),
            BasicTypeEnum::VectorType(t) => t.const_zero().into(),
        }
    }

    fn is_f32(&self, ty: BasicTypeEnum<'ctx>) -> bool {
        ty == self.context.f32_type().as_basic_type_enum()
    }
}

fn set_value_name(value: &BasicValueEnum<'_>, name: &str) {
    match value {
        BasicValueEnum::ArrayValue(v) => v.set_name(name),
        BasicValueEnum::IntValue(v) => v.set_name(name),
        BasicValueEnum::FloatValue(v) => v.set_name(name),
        BasicValueEnum::PointerValue(v) => v.set_name(name),
        BasicValueEnum::StructValue(v) => v.set_name(name),
        BasicValueEnum::VectorValue(v) => v.set_name(name),
    }
}

impl<'ctx> Backend for LlvmBackend<'ctx> {
    type Type = BasicTypeEnum<'ctx>;
    type Value = BasicValueEnum<'ctx>;
    type Pointer = PointerValue<'ctx>;
    type Function = FunctionValue<'ctx>;
    type Block = BasicBlock<'ctx>;

    fn int_type(&mut self, bits: u32) -> Self::Type {
        self.context.custom_width_int_type(bits).into()
    }

    fn float_type(&mut self, bits: u32) -> Self::Type {
        match bits {
            32 => self.context.f32_type().into(),
            _ => self.context.f64_type().into(),
        }
    }

    fn bool_type(&mut self) -> Self::Type {
        self.context.bool_type().into()
    }

    fn pointer_type(&mut self, pointee: &Self::Type) -> Self::Type {
        pointee.ptr_type(AddressSpace::default()).into()
    }

    fn named_struct(&mut self, name: &str) -> Self::Type {
        match self.context.get_struct_type(name) {
            Some(struct_type) => struct_type.into(),
            None => self.context.opaque_struct_type(name).into(),
        }
    }

    fn lookup_struct(&self, name: &str) -> Option<Self::Type> {
        self.context.get_struct_type(name).map(Into::into)
    }

    fn set_struct_body(&mut self, ty: &Self::Type, fields: &[Self::Type]) {
        if let BasicTypeEnum::StructType(struct_type) = ty {
            struct_type.set_body(fields, false);
        }
    }

    fn tuple_type(&mut self, fields: &[Self::Type]) -> Self::Type {
        self.context.struct_type(fields, false).into()
    }

    fn struct_field_types(&self, ty: &Self::Type) -> Vec<Self::Type> {
        match ty {
            BasicTypeEnum::StructType(struct_type) => struct_type.get_field_types(),
            _ => vec![],
        }
    }

    fn type_of(&self, value: &Self::Value) -> Self::Type {
        value.get_type()
    }

    fn category(&self, ty: &Self::Type) -> ValueCategory {
        match ty {
            BasicTypeEnum::IntType(int) if int.get_bit_width() == 1 => ValueCategory::Bool,
            BasicTypeEnum::IntType(int) => ValueCategory::Integer(int.get_bit_width()),
            BasicTypeEnum::FloatType(_) if self.is_f32(*ty) => ValueCategory::Float32,
            BasicTypeEnum::FloatType(_) => ValueCategory::Float64,
            BasicTypeEnum::PointerType(_) => ValueCategory::Pointer,
            _ => ValueCategory::Aggregate,
        }
    }

    fn const_int(&mut self, ty: &Self::Type, value: i64) -> Self::Value {
        match ty {
            BasicTypeEnum::IntType(int) => int.const_int(value as u64, true).into(),
            _ => self.zero_of(*ty),
        }
    }

    fn const_float(&mut self, ty: &Self::Type, value: f64) -> Self::Value {
        match ty {
            BasicTypeEnum::FloatType(float) => float.const_float(value).into(),
            _ => self.zero_of(*ty),
        }
    }

    fn const_bool(&mut self, value: bool) -> Self::Value {
        self.context
            .bool_type()
            .const_int(value as u64, false)
            .into()
    }

    fn const_zero(&mut self, ty: &Self::Type) -> Self::Value {
        self.zero_of(*ty)
    }

    fn add_global(
        &mut self,
        name: &str,
        ty: &Self::Type,
        initializer: &Self::Value,
    ) -> Self::Pointer {
        let global = self.module.add_global(*ty, None, name);
        global.set_initializer(initializer);
        let pointer = global.as_pointer_value();
        self.globals.insert(String::from(name), (pointer, *ty));
        pointer
    }

    fn get_global(&self, name: &str) -> Option<(Self::Pointer, Self::Type)> {
        self.globals.get(name).copied()
    }

    fn declare_function(
        &mut self,
        name: &str,
        return_type: &Self::Type,
        params: &[(String, Self::Type)],
    ) -> Self::Function {
        let param_types = params
            .iter()
            .map(|(_, ty)| (*ty).into())
            .collect::<Vec<BasicMetadataTypeEnum>>();
        let fn_type = return_type.fn_type(&param_types, false);
        let function = self.module.add_function(name, fn_type, None);

        for (param, (param_name, _)) in function.get_param_iter().zip(params.iter()) {
            set_value_name(&param, param_name);
        }
        function
    }

    fn get_function(&self, name: &str) -> Option<Self::Function> {
        self.module.get_function(name)
    }

    fn function_name(&self, function: &Self::Function) -> String {
        function.get_name().to_string_lossy().into_owned()
    }

    fn function_params(&self, function: &Self::Function) -> Vec<Self::Value> {
        function.get_params()
    }

    fn function_param_types(&self, function: &Self::Function) -> Vec<Self::Type> {
        function
            .get_params()
            .iter()
            .map(|param| param.get_type())
            .collect()
    }

    fn function_return_type(&self, function: &Self::Function) -> Self::Type {
        function
            .get_type()
            .get_return_type()
            .unwrap_or_else(|| self.unit())
    }

    fn function_has_body(&self, function: &Self::Function) -> bool {
        function.count_basic_blocks() > 0
    }

    fn append_block(&mut self, function: &Self::Function, name: &str) -> Self::Block {
        self.context.append_basic_block(*function, name)
    }

    fn position_at_end(&mut self, block: &Self::Block) {
        self.builder.position_at_end(*block);
    }

    fn insert_block(&self) -> Option<Self::Block> {
        self.builder.get_insert_block()
    }

    fn current_block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    fn verify_function(&self, function: &Self::Function) -> Result<(), String> {
        if function.verify(false) {
            Ok(())
        } else {
            Err(format!(
                "LLVM rejected function '{}'",
                self.function_name(function)
            ))
        }
    }

    fn build_alloca(&mut self, ty: &Self::Type, name: &str) -> Self::Pointer {
        emit!(self.build_alloca(*ty, name) else self.null_pointer())
    }

    fn build_load(&mut self, ty: &Self::Type, pointer: &Self::Pointer, name: &str) -> Self::Value {
        emit!(self.build_load(*pointer, name) else self.zero_of(*ty))
    }

    fn build_store(&mut self, pointer: &Self::Pointer, value: &Self::Value) {
        emit!(self.build_store(*pointer, *value) else return);
    }

    fn build_field_ptr(
        &mut self,
        _struct_type: &Self::Type,
        pointer: &Self::Pointer,
        index: u32,
    ) -> Self::Pointer {
        emit!(self.build_struct_gep(*pointer, index, "") else self.null_pointer())
    }

    fn build_extract_field(&mut self, aggregate: &Self::Value, index: u32) -> Self::Value {
        let BasicValueEnum::StructValue(value) = aggregate else {
            return *aggregate;
        };

        let field_type = value
            .get_type()
            .get_field_type_at_index(index)
            .unwrap_or_else(|| self.unit());
        emit!(self.build_extract_value(*value, index, "") else self.zero_of(field_type))
    }

    fn build_int_binary(
        &mut self,
        op: IntBinaryOp,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Self::Value {
        let (l, r) = (left.into_int_value(), right.into_int_value());
        let result = match op {
            IntBinaryOp::Add => self.builder.build_int_add(l, r, ""),
            IntBinaryOp::Sub => self.builder.build_int_sub(l, r, ""),
            IntBinaryOp::Mul => self.builder.build_int_mul(l, r, ""),
            IntBinaryOp::SDiv => self.builder.build_int_signed_div(l, r, ""),
            IntBinaryOp::UDiv => self.builder.build_int_unsigned_div(l, r, ""),
            IntBinaryOp::SRem => self.builder.build_int_signed_rem(l, r, ""),
            IntBinaryOp::URem => self.builder.build_int_unsigned_rem(l, r, ""),
            IntBinaryOp::And => self.builder.build_and(l, r, ""),
            IntBinaryOp::Or => self.builder.build_or(l, r, ""),
            IntBinaryOp::Xor => self.builder.build_xor(l, r, ""),
            IntBinaryOp::Shl => self.builder.build_left_shift(l, r, ""),
            IntBinaryOp::AShr => self.builder.build_right_shift(l, r, true, ""),
            IntBinaryOp::LShr => self.builder.build_right_shift(l, r, false, ""),
        };

        match result {
            Ok(value) => value.into(),
            Err(err) => {
                error!(op = op.mnemonic(), %err, "LLVM builder rejected instruction");
                l.get_type().const_zero().into()
            }
        }
    }

    fn build_float_binary(
        &mut self,
        op: FloatBinaryOp,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Self::Value {
        let (l, r) = (left.into_float_value(), right.into_float_value());
        let result = match op {
            FloatBinaryOp::Add => self.builder.build_float_add(l, r, ""),
            FloatBinaryOp::Sub => self.builder.build_float_sub(l, r, ""),
            FloatBinaryOp::Mul => self.builder.build_float_mul(l, r, ""),
            FloatBinaryOp::Div => self.builder.build_float_div(l, r, ""),
            FloatBinaryOp::Rem => self.builder.build_float_rem(l, r, ""),
        };

        match result {
            Ok(value) => value.into(),
            Err(err) => {
                error!(op = op.mnemonic(), %err, "LLVM builder rejected instruction");
                l.get_type().const_zero().into()
            }
        }
    }

    fn build_int_compare(
        &mut self,
        predicate: IntPredicate,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Self::Value {
        let predicate = match predicate {
            IntPredicate::Eq => inkwell::IntPredicate::EQ,
            IntPredicate::Ne => inkwell::IntPredicate::NE,
            IntPredicate::Slt => inkwell::IntPredicate::SLT,
            IntPredicate::Sle => inkwell::IntPredicate::SLE,
            IntPredicate::Sgt => inkwell::IntPredicate::SGT,
            IntPredicate::Sge => inkwell::IntPredicate::SGE,
            IntPredicate::Ult => inkwell::IntPredicate::ULT,
            IntPredicate::Ule => inkwell::IntPredicate::ULE,
            IntPredicate::Ugt => inkwell::IntPredicate::UGT,
            IntPredicate::Uge => inkwell::IntPredicate::UGE,
        };
        let (l, r) = (left.into_int_value(), right.into_int_value());
        let value = emit!(self.build_int_compare(predicate, l, r, "") else self.context.bool_type().const_zero());
        value.into()
    }

    fn build_float_compare(
        &mut self,
        predicate: FloatPredicate,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Self::Value {
        let predicate = match predicate {
            FloatPredicate::Oeq => inkwell::FloatPredicate::OEQ,
            FloatPredicate::One => inkwell::FloatPredicate::ONE,
            FloatPredicate::Olt => inkwell::FloatPredicate::OLT,
            FloatPredicate::Ole => inkwell::FloatPredicate::OLE,
            FloatPredicate::Ogt => inkwell::FloatPredicate::OGT,
            FloatPredicate::Oge => inkwell::FloatPredicate::OGE,
        };
        let (l, r) = (left.into_float_value(), right.into_float_value());
        let value = emit!(self.build_float_compare(predicate, l, r, "") else self.context.bool_type().const_zero());
        value.into()
    }

    fn build_int_neg(&mut self, value: &Self::Value) -> Self::Value {
        let int = value.into_int_value();
        let negated = emit!(self.build_int_neg(int, "") else int.get_type().const_zero());
        negated.into()
    }

    fn build_float_neg(&mut self, value: &Self::Value) -> Self::Value {
        let float = value.into_float_value();
        let negated = emit!(self.build_float_neg(float, "") else float.get_type().const_zero());
        negated.into()
    }

    fn build_not(&mut self, value: &Self::Value) -> Self::Value {
        let int = value.into_int_value();
        let inverted = emit!(self.build_not(int, "") else int.get_type().const_zero());
        inverted.into()
    }

    fn build_cast(
        &mut self,
        value: &Self::Value,
        target: &Self::Type,
        unsigned: bool,
    ) -> Option<Self::Value> {
        let source = value.get_type();
        if source == *target {
            return Some(*value);
        }

        let cast: BasicValueEnum = match (value, target) {
            (BasicValueEnum::IntValue(int), BasicTypeEnum::IntType(to)) => {
                let from = int.get_type().get_bit_width();
                let width = to.get_bit_width();
                if from < width && (from == 1 || unsigned) {
                    emit!(self.build_int_z_extend(*int, *to, "") else to.const_zero()).into()
                } else if from < width {
                    emit!(self.build_int_s_extend(*int, *to, "") else to.const_zero()).into()
                } else {
                    emit!(self.build_int_truncate(*int, *to, "") else to.const_zero()).into()
                }
            }
            (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(to)) if unsigned => {
                emit!(self.build_unsigned_int_to_float(*int, *to, "") else to.const_zero()).into()
            }
            (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(to)) => {
                emit!(self.build_signed_int_to_float(*int, *to, "") else to.const_zero()).into()
            }
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::IntType(to)) if unsigned => {
                emit!(self.build_float_to_unsigned_int(*float, *to, "") else to.const_zero()).into()
            }
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::IntType(to)) => {
                emit!(self.build_float_to_signed_int(*float, *to, "") else to.const_zero()).into()
            }
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::FloatType(to)) => {
                emit!(self.build_float_cast(*float, *to, "") else to.const_zero()).into()
            }
            _ => return None,
        };
        Some(cast)
    }

    fn build_call(&mut self, function: &Self::Function, args: &[Self::Value]) -> Self::Value {
        let return_type = self.function_return_type(function);
        let args = args
            .iter()
            .map(|arg| (*arg).into())
            .collect::<Vec<BasicMetadataValueEnum>>();

        let call = emit!(self.build_call(*function, &args, "") else return self.zero_of(return_type));
        call.try_as_basic_value()
            .left()
            .unwrap_or_else(|| self.zero_of(return_type))
    }

    fn build_return(&mut self, value: &Self::Value) {
        emit!(self.build_return(Some(value as &dyn BasicValue)) else return);
    }

    fn build_branch(&mut self, target: &Self::Block) {
        emit!(self.build_unconditional_branch(*target) else return);
    }

    fn build_cond_branch(
        &mut self,
        condition: &Self::Value,
        then_block: &Self::Block,
        else_block: &Self::Block,
    ) {
        let condition = condition.into_int_value();
        emit!(self.build_conditional_branch(condition, *then_block, *else_block) else return);
    }

    fn pointer_as_value(&mut self, pointer: &Self::Pointer) -> Self::Value {
        (*pointer).into()
    }

    fn value_as_pointer(&mut self, value: &Self::Value) -> Option<Self::Pointer> {
        match value {
            BasicValueEnum::PointerValue(pointer) => Some(*pointer),
            _ => None,
        }
    }
}
