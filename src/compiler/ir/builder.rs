//! `Backend` implementation that records instructions into a `Module`.

use crate::compiler::backend::{
    Backend, FloatBinaryOp, FloatPredicate, IntBinaryOp, IntPredicate, ValueCategory,
};

use super::{
    instructions::Instruction,
    module::{Block, Function, Global, Module, StructDef},
    types::{BlockRef, FunctionRef, IrType, IrValue, Operand},
    verify::verify_function,
};

pub struct IrBackend {
    module: Module,
    /// Function and block instructions are appended to.
    position: Option<(usize, usize)>,
}

impl IrBackend {
    pub fn new(module_name: &str) -> Self {
        IrBackend {
            module: Module::new(module_name),
            position: None,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    /// Appends the instruction made by `make` and returns its result
    /// register. Without an insertion point nothing is recorded and a zero
    /// of `ty` stands in for the result.
    fn build(&mut self, ty: IrType, make: impl FnOnce(u32) -> Instruction) -> IrValue {
        let Some((function, block)) = self.position else {
            return IrValue::zero(ty);
        };

        let function = &mut self.module.functions[function];
        let dest = function.registers.len() as u32;
        function.registers.push(ty.clone());
        function.blocks[block].instructions.push(make(dest));

        IrValue::new(Operand::Register(dest), ty)
    }

    fn emit(&mut self, instruction: Instruction) {
        if let Some((function, block)) = self.position {
            self.module.functions[function].blocks[block]
                .instructions
                .push(instruction);
        }
    }
}

impl Backend for IrBackend {
    type Type = IrType;
    type Value = IrValue;
    type Pointer = IrValue;
    type Function = FunctionRef;
    type Block = BlockRef;

    fn int_type(&mut self, bits: u32) -> IrType {
        IrType::Int(bits)
    }

    fn float_type(&mut self, bits: u32) -> IrType {
        if bits <= 32 {
            IrType::Float32
        } else {
            IrType::Float64
        }
    }

    fn bool_type(&mut self) -> IrType {
        IrType::bool()
    }

    fn pointer_type(&mut self, pointee: &IrType) -> IrType {
        IrType::Pointer(Box::new(pointee.clone()))
    }

    fn named_struct(&mut self, name: &str) -> IrType {
        if let Some(index) = self.module.struct_index(name) {
            return IrType::Struct(index);
        }

        self.module.structs.push(StructDef {
            name: String::from(name),
            fields: None,
        });
        IrType::Struct(self.module.structs.len() - 1)
    }

    fn lookup_struct(&self, name: &str) -> Option<IrType> {
        self.module.struct_index(name).map(IrType::Struct)
    }

    fn set_struct_body(&mut self, ty: &IrType, fields: &[IrType]) {
        if let IrType::Struct(index) = ty {
            if let Some(def) = self.module.structs.get_mut(*index) {
                def.fields = Some(fields.to_vec());
            }
        }
    }

    fn tuple_type(&mut self, fields: &[IrType]) -> IrType {
        IrType::Tuple(fields.to_vec())
    }

    fn struct_field_types(&self, ty: &IrType) -> Vec<IrType> {
        self.module.field_types(ty)
    }

    fn type_of(&self, value: &IrValue) -> IrType {
        value.ty.clone()
    }

    fn category(&self, ty: &IrType) -> ValueCategory {
        match ty {
            IrType::Int(1) => ValueCategory::Bool,
            IrType::Int(bits) => ValueCategory::Integer(*bits),
            IrType::Float32 => ValueCategory::Float32,
            IrType::Float64 => ValueCategory::Float64,
            IrType::Pointer(_) => ValueCategory::Pointer,
            IrType::Struct(_) | IrType::Tuple(_) => ValueCategory::Aggregate,
        }
    }

    fn const_int(&mut self, ty: &IrType, value: i64) -> IrValue {
        IrValue::new(Operand::Int(value), ty.clone())
    }

    fn const_float(&mut self, ty: &IrType, value: f64) -> IrValue {
        IrValue::new(Operand::Float(value), ty.clone())
    }

    fn const_bool(&mut self, value: bool) -> IrValue {
        IrValue::new(Operand::Int(value as i64), IrType::bool())
    }

    fn const_zero(&mut self, ty: &IrType) -> IrValue {
        IrValue::zero(ty.clone())
    }

    fn add_global(&mut self, name: &str, ty: &IrType, initializer: &IrValue) -> IrValue {
        let pointer_type = IrType::Pointer(Box::new(ty.clone()));

        if let Some(index) = self.module.global_index(name) {
            return IrValue::new(Operand::Global(index), pointer_type);
        }

        self.module.globals.push(Global {
            name: String::from(name),
            ty: ty.clone(),
            initializer: initializer.clone(),
        });
        IrValue::new(Operand::Global(self.module.globals.len() - 1), pointer_type)
    }

    fn get_global(&self, name: &str) -> Option<(IrValue, IrType)> {
        let index = self.module.global_index(name)?;
        let ty = self.module.globals[index].ty.clone();

        Some((
            IrValue::new(Operand::Global(index), IrType::Pointer(Box::new(ty.clone()))),
            ty,
        ))
    }

    fn declare_function(
        &mut self,
        name: &str,
        return_type: &IrType,
        params: &[(String, IrType)],
    ) -> FunctionRef {
        if let Some(index) = self.module.function_index(name) {
            return FunctionRef(index);
        }

        self.module.functions.push(Function {
            name: String::from(name),
            params: params.to_vec(),
            return_type: return_type.clone(),
            blocks: vec![],
            registers: vec![],
        });
        FunctionRef(self.module.functions.len() - 1)
    }

    fn get_function(&self, name: &str) -> Option<FunctionRef> {
        self.module.function_index(name).map(FunctionRef)
    }

    fn function_name(&self, function: &FunctionRef) -> String {
        self.module.functions[function.0].name.clone()
    }

    fn function_params(&self, function: &FunctionRef) -> Vec<IrValue> {
        self.module.functions[function.0]
            .params
            .iter()
            .enumerate()
            .map(|(index, (_, ty))| IrValue::new(Operand::Param(index as u32), ty.clone()))
            .collect()
    }

    fn function_param_types(&self, function: &FunctionRef) -> Vec<IrType> {
        self.module.functions[function.0]
            .params
            .iter()
            .map(|(_, ty)| ty.clone())
            .collect()
    }

    fn function_return_type(&self, function: &FunctionRef) -> IrType {
        self.module.functions[function.0].return_type.clone()
    }

    fn function_has_body(&self, function: &FunctionRef) -> bool {
        self.module.functions[function.0].has_body()
    }

    fn append_block(&mut self, function: &FunctionRef, name: &str) -> BlockRef {
        let target = &mut self.module.functions[function.0];
        let name = target.unique_block_name(name);
        target.blocks.push(Block {
            name,
            instructions: vec![],
        });

        BlockRef {
            function: function.0,
            index: target.blocks.len() - 1,
        }
    }

    fn position_at_end(&mut self, block: &BlockRef) {
        self.position = Some((block.function, block.index));
    }

    fn insert_block(&self) -> Option<BlockRef> {
        self.position
            .map(|(function, index)| BlockRef { function, index })
    }

    fn current_block_terminated(&self) -> bool {
        match self.position {
            Some((function, block)) => self.module.functions[function].blocks[block]
                .terminator()
                .is_some(),
            None => false,
        }
    }

    fn verify_function(&self, function: &FunctionRef) -> Result<(), String> {
        verify_function(&self.module, function.0).map_err(|error| error.to_string())
    }

    fn build_alloca(&mut self, ty: &IrType, _name: &str) -> IrValue {
        let pointer_type = IrType::Pointer(Box::new(ty.clone()));
        let ty = ty.clone();
        self.build(pointer_type, |dest| Instruction::Alloca { dest, ty })
    }

    fn build_load(&mut self, ty: &IrType, pointer: &IrValue, _name: &str) -> IrValue {
        let pointer = pointer.clone();
        let load_type = ty.clone();
        self.build(ty.clone(), |dest| Instruction::Load {
            dest,
            ty: load_type,
            pointer,
        })
    }

    fn build_store(&mut self, pointer: &IrValue, value: &IrValue) {
        self.emit(Instruction::Store {
            pointer: pointer.clone(),
            value: value.clone(),
        });
    }

    fn build_field_ptr(&mut self, struct_type: &IrType, pointer: &IrValue, index: u32) -> IrValue {
        let field_type = self
            .module
            .field_types(struct_type)
            .get(index as usize)
            .cloned()
            .unwrap_or(IrType::Tuple(vec![]));
        let struct_type = struct_type.clone();
        let pointer = pointer.clone();

        self.build(IrType::Pointer(Box::new(field_type)), |dest| {
            Instruction::FieldPtr {
                dest,
                struct_type,
                pointer,
                index,
            }
        })
    }

    fn build_extract_field(&mut self, aggregate: &IrValue, index: u32) -> IrValue {
        let field_type = self
            .module
            .field_types(&aggregate.ty)
            .get(index as usize)
            .cloned()
            .unwrap_or(IrType::Tuple(vec![]));
        let aggregate = aggregate.clone();

        self.build(field_type, |dest| Instruction::ExtractField {
            dest,
            aggregate,
            index,
        })
    }

    fn build_int_binary(&mut self, op: IntBinaryOp, left: &IrValue, right: &IrValue) -> IrValue {
        let (left, right) = (left.clone(), right.clone());
        self.build(left.ty.clone(), |dest| Instruction::IntBinary {
            dest,
            op,
            left,
            right,
        })
    }

    fn build_float_binary(
        &mut self,
        op: FloatBinaryOp,
        left: &IrValue,
        right: &IrValue,
    ) -> IrValue {
        let (left, right) = (left.clone(), right.clone());
        self.build(left.ty.clone(), |dest| Instruction::FloatBinary {
            dest,
            op,
            left,
            right,
        })
    }

    fn build_int_compare(
        &mut self,
        predicate: IntPredicate,
        left: &IrValue,
        right: &IrValue,
    ) -> IrValue {
        let (left, right) = (left.clone(), right.clone());
        self.build(IrType::bool(), |dest| Instruction::IntCompare {
            dest,
            predicate,
            left,
            right,
        })
    }

    fn build_float_compare(
        &mut self,
        predicate: FloatPredicate,
        left: &IrValue,
        right: &IrValue,
    ) -> IrValue {
        let (left, right) = (left.clone(), right.clone());
        self.build(IrType::bool(), |dest| Instruction::FloatCompare {
            dest,
            predicate,
            left,
            right,
        })
    }

    fn build_int_neg(&mut self, value: &IrValue) -> IrValue {
        let value = value.clone();
        self.build(value.ty.clone(), |dest| Instruction::IntNeg { dest, value })
    }

    fn build_float_neg(&mut self, value: &IrValue) -> IrValue {
        let value = value.clone();
        self.build(value.ty.clone(), |dest| Instruction::FloatNeg { dest, value })
    }

    fn build_not(&mut self, value: &IrValue) -> IrValue {
        let value = value.clone();
        self.build(value.ty.clone(), |dest| Instruction::Not { dest, value })
    }

    fn build_cast(&mut self, value: &IrValue, target: &IrType, unsigned: bool) -> Option<IrValue> {
        if value.ty == *target {
            return Some(value.clone());
        }

        let scalar = |ty: &IrType| matches!(ty, IrType::Int(_) | IrType::Float32 | IrType::Float64);
        if !scalar(&value.ty) || !scalar(target) {
            return None;
        }

        let value = value.clone();
        let ty = target.clone();
        Some(self.build(target.clone(), |dest| Instruction::Cast {
            dest,
            value,
            ty,
            unsigned,
        }))
    }

    fn build_call(&mut self, function: &FunctionRef, args: &[IrValue]) -> IrValue {
        let return_type = self.module.functions[function.0].return_type.clone();
        let args = args.to_vec();
        let function = function.0;

        self.build(return_type, |dest| Instruction::Call {
            dest,
            function,
            args,
        })
    }

    fn build_return(&mut self, value: &IrValue) {
        self.emit(Instruction::Return {
            value: value.clone(),
        });
    }

    fn build_branch(&mut self, target: &BlockRef) {
        self.emit(Instruction::Branch {
            target: target.index,
        });
    }

    fn build_cond_branch(&mut self, condition: &IrValue, then_block: &BlockRef, else_block: &BlockRef) {
        self.emit(Instruction::CondBranch {
            condition: condition.clone(),
            then_block: then_block.index,
            else_block: else_block.index,
        });
    }

    fn pointer_as_value(&mut self, pointer: &IrValue) -> IrValue {
        pointer.clone()
    }

    fn value_as_pointer(&mut self, value: &IrValue) -> Option<IrValue> {
        match value.ty {
            IrType::Pointer(_) => Some(value.clone()),
            _ => None,
        }
    }
}
