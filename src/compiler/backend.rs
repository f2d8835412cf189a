//! The seam between code generation and whatever consumes the instructions.
//!
//! The code generator only ever talks to a `Backend`. Handles for types,
//! values, storage, functions and blocks are opaque associated types, so the
//! same visitor drives the in-memory IR module and the LLVM builder.

use std::fmt::Debug;

/// Runtime category of a value, used to pick integer or float operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    Bool,
    Integer(u32),
    Float32,
    Float64,
    Pointer,
    Aggregate,
}

impl ValueCategory {
    /// Booleans are one bit integers as far as arithmetic is concerned.
    pub fn is_integral(&self) -> bool {
        matches!(self, ValueCategory::Bool | ValueCategory::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ValueCategory::Float32 | ValueCategory::Float64)
    }

    pub fn describe(&self) -> String {
        match self {
            ValueCategory::Bool => String::from("bool"),
            ValueCategory::Integer(bits) => format!("i{}", bits),
            ValueCategory::Float32 => String::from("float32"),
            ValueCategory::Float64 => String::from("float64"),
            ValueCategory::Pointer => String::from("pointer"),
            ValueCategory::Aggregate => String::from("aggregate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntBinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    AShr,
    LShr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

pub trait Backend {
    type Type: Clone + Debug + PartialEq;
    type Value: Clone + Debug;
    type Pointer: Clone + Debug;
    type Function: Clone + Debug;
    type Block: Clone + Debug;

    // Types

    fn int_type(&mut self, bits: u32) -> Self::Type;
    fn float_type(&mut self, bits: u32) -> Self::Type;
    fn bool_type(&mut self) -> Self::Type;
    fn pointer_type(&mut self, pointee: &Self::Type) -> Self::Type;
    /// Returns the named aggregate, creating an opaque one on first use.
    fn named_struct(&mut self, name: &str) -> Self::Type;
    fn lookup_struct(&self, name: &str) -> Option<Self::Type>;
    fn set_struct_body(&mut self, ty: &Self::Type, fields: &[Self::Type]);
    /// Anonymous aggregate, used for return values.
    fn tuple_type(&mut self, fields: &[Self::Type]) -> Self::Type;
    fn struct_field_types(&self, ty: &Self::Type) -> Vec<Self::Type>;
    fn type_of(&self, value: &Self::Value) -> Self::Type;
    fn category(&self, ty: &Self::Type) -> ValueCategory;

    // Constants and module storage

    fn const_int(&mut self, ty: &Self::Type, value: i64) -> Self::Value;
    fn const_float(&mut self, ty: &Self::Type, value: f64) -> Self::Value;
    fn const_bool(&mut self, value: bool) -> Self::Value;
    /// All-zero value of any type, aggregates included.
    fn const_zero(&mut self, ty: &Self::Type) -> Self::Value;
    fn add_global(&mut self, name: &str, ty: &Self::Type, initializer: &Self::Value)
        -> Self::Pointer;
    fn get_global(&self, name: &str) -> Option<(Self::Pointer, Self::Type)>;

    // Functions and blocks

    fn declare_function(
        &mut self,
        name: &str,
        return_type: &Self::Type,
        params: &[(String, Self::Type)],
    ) -> Self::Function;
    fn get_function(&self, name: &str) -> Option<Self::Function>;
    fn function_name(&self, function: &Self::Function) -> String;
    fn function_params(&self, function: &Self::Function) -> Vec<Self::Value>;
    fn function_param_types(&self, function: &Self::Function) -> Vec<Self::Type>;
    fn function_return_type(&self, function: &Self::Function) -> Self::Type;
    fn function_has_body(&self, function: &Self::Function) -> bool;
    fn append_block(&mut self, function: &Self::Function, name: &str) -> Self::Block;
    fn position_at_end(&mut self, block: &Self::Block);
    fn insert_block(&self) -> Option<Self::Block>;
    fn current_block_terminated(&self) -> bool;
    /// Checks the finished function, returning a description of the first
    /// problem found.
    fn verify_function(&self, function: &Self::Function) -> Result<(), String>;

    // Instructions

    fn build_alloca(&mut self, ty: &Self::Type, name: &str) -> Self::Pointer;
    fn build_load(&mut self, ty: &Self::Type, pointer: &Self::Pointer, name: &str)
        -> Self::Value;
    fn build_store(&mut self, pointer: &Self::Pointer, value: &Self::Value);
    fn build_field_ptr(
        &mut self,
        struct_type: &Self::Type,
        pointer: &Self::Pointer,
        index: u32,
    ) -> Self::Pointer;
    fn build_extract_field(&mut self, aggregate: &Self::Value, index: u32) -> Self::Value;
    fn build_int_binary(
        &mut self,
        op: IntBinaryOp,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Self::Value;
    fn build_float_binary(
        &mut self,
        op: FloatBinaryOp,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Self::Value;
    fn build_int_compare(
        &mut self,
        predicate: IntPredicate,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Self::Value;
    fn build_float_compare(
        &mut self,
        predicate: FloatPredicate,
        left: &Self::Value,
        right: &Self::Value,
    ) -> Self::Value;
    fn build_int_neg(&mut self, value: &Self::Value) -> Self::Value;
    fn build_float_neg(&mut self, value: &Self::Value) -> Self::Value;
    /// Flips a boolean, or inverts every bit of a wider integer.
    fn build_not(&mut self, value: &Self::Value) -> Self::Value;
    /// Converts between scalar types: integer resize, float resize and
    /// integer/float conversions. `unsigned` reads the integer side (the
    /// source, or the target of a float to integer conversion) as unsigned.
    /// `None` when no conversion exists.
    fn build_cast(
        &mut self,
        value: &Self::Value,
        target: &Self::Type,
        unsigned: bool,
    ) -> Option<Self::Value>;
    fn build_call(&mut self, function: &Self::Function, args: &[Self::Value]) -> Self::Value;
    fn build_return(&mut self, value: &Self::Value);
    fn build_branch(&mut self, target: &Self::Block);
    fn build_cond_branch(
        &mut self,
        condition: &Self::Value,
        then_block: &Self::Block,
        else_block: &Self::Block,
    );

    // Pointer values

    fn pointer_as_value(&mut self, pointer: &Self::Pointer) -> Self::Value;
    fn value_as_pointer(&mut self, value: &Self::Value) -> Option<Self::Pointer>;
}
