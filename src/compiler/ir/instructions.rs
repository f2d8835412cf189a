use crate::compiler::backend::{FloatBinaryOp, FloatPredicate, IntBinaryOp, IntPredicate};

use super::types::{IrType, IrValue};

/// One IR instruction. Every value producing instruction writes a fresh
/// register `dest`, whose type is recorded in `Function::registers`.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca {
        dest: u32,
        ty: IrType,
    },
    Load {
        dest: u32,
        ty: IrType,
        pointer: IrValue,
    },
    Store {
        pointer: IrValue,
        value: IrValue,
    },
    FieldPtr {
        dest: u32,
        struct_type: IrType,
        pointer: IrValue,
        index: u32,
    },
    ExtractField {
        dest: u32,
        aggregate: IrValue,
        index: u32,
    },
    IntBinary {
        dest: u32,
        op: IntBinaryOp,
        left: IrValue,
        right: IrValue,
    },
    FloatBinary {
        dest: u32,
        op: FloatBinaryOp,
        left: IrValue,
        right: IrValue,
    },
    IntCompare {
        dest: u32,
        predicate: IntPredicate,
        left: IrValue,
        right: IrValue,
    },
    FloatCompare {
        dest: u32,
        predicate: FloatPredicate,
        left: IrValue,
        right: IrValue,
    },
    IntNeg {
        dest: u32,
        value: IrValue,
    },
    FloatNeg {
        dest: u32,
        value: IrValue,
    },
    Not {
        dest: u32,
        value: IrValue,
    },
    Cast {
        dest: u32,
        value: IrValue,
        ty: IrType,
        unsigned: bool,
    },
    Call {
        dest: u32,
        function: usize,
        args: Vec<IrValue>,
    },
    Return {
        value: IrValue,
    },
    Branch {
        target: usize,
    },
    CondBranch {
        condition: IrValue,
        then_block: usize,
        else_block: usize,
    },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Return { .. } | Instruction::Branch { .. } | Instruction::CondBranch { .. }
        )
    }

    /// Blocks this instruction may transfer control to.
    pub fn successors(&self) -> Vec<usize> {
        match self {
            Instruction::Branch { target } => vec![*target],
            Instruction::CondBranch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => vec![],
        }
    }
}

/// LLVM spelling of a scalar conversion.
pub fn cast_mnemonic(from: &IrType, to: &IrType, unsigned: bool) -> &'static str {
    match (from, to) {
        (IrType::Int(from), IrType::Int(to)) if from > to => "trunc",
        (IrType::Int(1), IrType::Int(_)) => "zext",
        (IrType::Int(_), IrType::Int(_)) if unsigned => "zext",
        (IrType::Int(_), IrType::Int(_)) => "sext",
        (IrType::Int(_), _) if unsigned => "uitofp",
        (IrType::Int(_), _) => "sitofp",
        (_, IrType::Int(_)) if unsigned => "fptoui",
        (_, IrType::Int(_)) => "fptosi",
        (IrType::Float64, IrType::Float32) => "fptrunc",
        _ => "fpext",
    }
}

impl IntBinaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IntBinaryOp::Add => "add",
            IntBinaryOp::Sub => "sub",
            IntBinaryOp::Mul => "mul",
            IntBinaryOp::SDiv => "sdiv",
            IntBinaryOp::UDiv => "udiv",
            IntBinaryOp::SRem => "srem",
            IntBinaryOp::URem => "urem",
            IntBinaryOp::And => "and",
            IntBinaryOp::Or => "or",
            IntBinaryOp::Xor => "xor",
            IntBinaryOp::Shl => "shl",
            IntBinaryOp::AShr => "ashr",
            IntBinaryOp::LShr => "lshr",
        }
    }
}

impl FloatBinaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FloatBinaryOp::Add => "fadd",
            FloatBinaryOp::Sub => "fsub",
            FloatBinaryOp::Mul => "fmul",
            FloatBinaryOp::Div => "fdiv",
            FloatBinaryOp::Rem => "frem",
        }
    }
}

impl IntPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
            IntPredicate::Ult => "ult",
            IntPredicate::Ule => "ule",
            IntPredicate::Ugt => "ugt",
            IntPredicate::Uge => "uge",
        }
    }
}

impl FloatPredicate {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
        }
    }
}
