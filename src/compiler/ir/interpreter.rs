//! Executes an IR module directly.
//!
//! Memory is a flat list of cells, one per global and one per executed
//! `alloca`. Pointers address a cell plus a path of field indices into the
//! aggregate stored there.

use std::fmt::Display;

use thiserror::Error;

use crate::compiler::backend::{FloatBinaryOp, FloatPredicate, IntBinaryOp, IntPredicate};

use super::{
    instructions::Instruction,
    module::Module,
    types::{IrType, IrValue, Operand},
};

pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;
const MAX_CALL_DEPTH: usize = 256;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("function {0:?} not found")]
    UnknownFunction(String),
    #[error("function {0:?} has no body")]
    MissingBody(String),
    #[error("{function:?} expects {expected} arguments, received {received}")]
    ArityMismatch {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("step limit of {0} exceeded")]
    StepLimitExceeded(u64),
    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),
    #[error("register %{0} read before it was written")]
    UndefinedRegister(u32),
    #[error("invalid memory access")]
    InvalidAddress,
    #[error("division by zero")]
    DivisionByZero,
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("block {0:?} ended without a terminator")]
    FellThrough(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    cell: usize,
    path: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Int { bits: u32, value: i64 },
    Float32(f32),
    Float64(f64),
    Pointer(Option<Address>),
    Aggregate(Vec<RuntimeValue>),
}

impl RuntimeValue {
    pub fn zero(module: &Module, ty: &IrType) -> RuntimeValue {
        RuntimeValue::zero_within(module, ty, &mut vec![])
    }

    /// A struct already being filled in further up `open` is left empty, so
    /// a struct holding itself by value can't recurse forever.
    fn zero_within(module: &Module, ty: &IrType, open: &mut Vec<usize>) -> RuntimeValue {
        match ty {
            IrType::Int(bits) => RuntimeValue::Int {
                bits: *bits,
                value: 0,
            },
            IrType::Float32 => RuntimeValue::Float32(0.0),
            IrType::Float64 => RuntimeValue::Float64(0.0),
            IrType::Pointer(_) => RuntimeValue::Pointer(None),
            IrType::Struct(index) if open.contains(index) => RuntimeValue::Aggregate(vec![]),
            IrType::Struct(index) => {
                open.push(*index);
                let fields = module
                    .field_types(ty)
                    .iter()
                    .map(|field| RuntimeValue::zero_within(module, field, open))
                    .collect();
                open.pop();
                RuntimeValue::Aggregate(fields)
            }
            IrType::Tuple(_) => RuntimeValue::Aggregate(
                module
                    .field_types(ty)
                    .iter()
                    .map(|field| RuntimeValue::zero_within(module, field, open))
                    .collect(),
            ),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            RuntimeValue::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_int().map(|value| value != 0)
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            RuntimeValue::Float32(value) => Some(*value as f64),
            RuntimeValue::Float64(value) => Some(*value),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&[RuntimeValue]> {
        match self {
            RuntimeValue::Aggregate(fields) => Some(fields),
            _ => None,
        }
    }
}

impl Display for RuntimeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeValue::Int { bits: 1, value } => write!(f, "{}", *value != 0),
            RuntimeValue::Int { value, .. } => write!(f, "{}", value),
            RuntimeValue::Float32(value) => write!(f, "{:?}", value),
            RuntimeValue::Float64(value) => write!(f, "{:?}", value),
            RuntimeValue::Pointer(Some(_)) => write!(f, "ptr"),
            RuntimeValue::Pointer(None) => write!(f, "null"),
            RuntimeValue::Aggregate(fields) => {
                let fields = fields
                    .iter()
                    .map(|field| field.to_string())
                    .collect::<Vec<String>>();
                write!(f, "{{ {} }}", fields.join(", "))
            }
        }
    }
}

/// The low `bits` of `value` read as an unsigned number.
fn unsigned(bits: u32, value: i64) -> u64 {
    if bits >= 64 {
        value as u64
    } else {
        (value as u64) & ((1u64 << bits) - 1)
    }
}

/// Sign-wraps `value` into `bits` bits; booleans stay 0 or 1.
fn wrap(bits: u32, value: i64) -> i64 {
    match bits {
        1 => value & 1,
        bits if bits >= 64 => value,
        bits => {
            let shift = 64 - bits;
            (value << shift) >> shift
        }
    }
}

struct Frame {
    params: Vec<RuntimeValue>,
    registers: Vec<Option<RuntimeValue>>,
}

pub struct Interpreter<'m> {
    module: &'m Module,
    memory: Vec<RuntimeValue>,
    /// Memory cell of each global, by global index.
    globals: Vec<usize>,
    steps: u64,
    step_limit: u64,
    depth: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        let mut interpreter = Interpreter {
            module,
            memory: vec![],
            globals: vec![],
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            depth: 0,
        };

        let empty = Frame {
            params: vec![],
            registers: vec![],
        };
        for global in module.globals.iter() {
            let initial = interpreter
                .operand(&empty, &global.initializer)
                .unwrap_or_else(|_| RuntimeValue::zero(module, &global.ty));
            interpreter.memory.push(initial);
            interpreter.globals.push(interpreter.memory.len() - 1);
        }

        interpreter
    }

    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Current value of the global `name`.
    pub fn global(&self, name: &str) -> Option<&RuntimeValue> {
        let index = self.module.global_index(name)?;
        self.memory.get(self.globals[index])
    }

    /// Every global with its current value, in declaration order.
    pub fn globals(&self) -> Vec<(&str, &RuntimeValue)> {
        self.module
            .globals
            .iter()
            .zip(self.globals.iter())
            .map(|(global, cell)| (global.name.as_str(), &self.memory[*cell]))
            .collect()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn call(&mut self, name: &str, args: Vec<RuntimeValue>) -> Result<RuntimeValue, EvalError> {
        let index = self
            .module
            .function_index(name)
            .ok_or_else(|| EvalError::UnknownFunction(String::from(name)))?;

        self.call_index(index, args)
    }

    fn call_index(&mut self, index: usize, args: Vec<RuntimeValue>) -> Result<RuntimeValue, EvalError> {
        let module = self.module;
        let function = &module.functions[index];

        if !function.has_body() {
            return Err(EvalError::MissingBody(function.name.clone()));
        }
        if function.params.len() != args.len() {
            return Err(EvalError::ArityMismatch {
                function: function.name.clone(),
                expected: function.params.len(),
                received: args.len(),
            });
        }
        if self.depth >= MAX_CALL_DEPTH {
            return Err(EvalError::CallDepthExceeded(MAX_CALL_DEPTH));
        }

        self.depth += 1;
        let mut frame = Frame {
            params: args,
            registers: vec![None; function.registers.len()],
        };
        let result = self.run(index, &mut frame);
        self.depth -= 1;

        result
    }

    fn run(&mut self, index: usize, frame: &mut Frame) -> Result<RuntimeValue, EvalError> {
        let module = self.module;
        let function = &module.functions[index];
        let mut block = 0;

        'blocks: loop {
            let current = function
                .blocks
                .get(block)
                .ok_or(EvalError::InvalidAddress)?;

            for instruction in current.instructions.iter() {
                self.steps += 1;
                if self.steps > self.step_limit {
                    return Err(EvalError::StepLimitExceeded(self.step_limit));
                }

                match instruction {
                    Instruction::Return { value } => return self.operand(frame, value),
                    Instruction::Branch { target } => {
                        block = *target;
                        continue 'blocks;
                    }
                    Instruction::CondBranch {
                        condition,
                        then_block,
                        else_block,
                    } => {
                        let condition = self.operand(frame, condition)?;
                        block = match condition.as_bool() {
                            Some(true) => *then_block,
                            Some(false) => *else_block,
                            None => {
                                return Err(EvalError::TypeMismatch(String::from(
                                    "branch condition is not a boolean",
                                )))
                            }
                        };
                        continue 'blocks;
                    }
                    _ => self.execute(instruction, frame)?,
                }
            }

            return Err(EvalError::FellThrough(current.name.clone()));
        }
    }

    fn execute(&mut self, instruction: &Instruction, frame: &mut Frame) -> Result<(), EvalError> {
        let (dest, value) = match instruction {
            Instruction::Alloca { dest, ty } => {
                self.memory.push(RuntimeValue::zero(self.module, ty));
                let address = Address {
                    cell: self.memory.len() - 1,
                    path: vec![],
                };
                (*dest, RuntimeValue::Pointer(Some(address)))
            }
            Instruction::Load { dest, pointer, .. } => {
                let address = self.address(frame, pointer)?;
                (*dest, self.load(&address)?.clone())
            }
            Instruction::Store { pointer, value } => {
                let address = self.address(frame, pointer)?;
                let value = self.operand(frame, value)?;
                *self.slot(&address)? = value;
                return Ok(());
            }
            Instruction::FieldPtr {
                dest,
                pointer,
                index,
                ..
            } => {
                let mut address = self.address(frame, pointer)?;
                address.path.push(*index);
                (*dest, RuntimeValue::Pointer(Some(address)))
            }
            Instruction::ExtractField {
                dest,
                aggregate,
                index,
            } => {
                let aggregate = self.operand(frame, aggregate)?;
                let field = aggregate
                    .fields()
                    .and_then(|fields| fields.get(*index as usize))
                    .cloned()
                    .ok_or_else(|| {
                        EvalError::TypeMismatch(format!("no field {} to extract", index))
                    })?;
                (*dest, field)
            }
            Instruction::IntBinary {
                dest,
                op,
                left,
                right,
            } => {
                let (bits, left) = self.int_operand(frame, left)?;
                let (_, right) = self.int_operand(frame, right)?;
                let value = match op {
                    IntBinaryOp::Add => left.wrapping_add(right),
                    IntBinaryOp::Sub => left.wrapping_sub(right),
                    IntBinaryOp::Mul => left.wrapping_mul(right),
                    IntBinaryOp::SDiv
                    | IntBinaryOp::SRem
                    | IntBinaryOp::UDiv
                    | IntBinaryOp::URem
                        if right == 0 =>
                    {
                        return Err(EvalError::DivisionByZero)
                    }
                    IntBinaryOp::SDiv => left.wrapping_div(right),
                    IntBinaryOp::SRem => left.wrapping_rem(right),
                    IntBinaryOp::UDiv => (unsigned(bits, left) / unsigned(bits, right)) as i64,
                    IntBinaryOp::URem => (unsigned(bits, left) % unsigned(bits, right)) as i64,
                    IntBinaryOp::And => left & right,
                    IntBinaryOp::Or => left | right,
                    IntBinaryOp::Xor => left ^ right,
                    IntBinaryOp::Shl => left.wrapping_shl(right as u32),
                    IntBinaryOp::AShr => left.wrapping_shr(right as u32),
                    IntBinaryOp::LShr => unsigned(bits, left).wrapping_shr(right as u32) as i64,
                };
                (
                    *dest,
                    RuntimeValue::Int {
                        bits,
                        value: wrap(bits, value),
                    },
                )
            }
            Instruction::FloatBinary {
                dest,
                op,
                left,
                right,
            } => {
                let left_value = self.operand(frame, left)?;
                let right_value = self.operand(frame, right)?;
                let (Some(l), Some(r)) = (left_value.as_float(), right_value.as_float()) else {
                    return Err(EvalError::TypeMismatch(String::from(
                        "float operation on a non-float",
                    )));
                };
                let value = match op {
                    FloatBinaryOp::Add => l + r,
                    FloatBinaryOp::Sub => l - r,
                    FloatBinaryOp::Mul => l * r,
                    FloatBinaryOp::Div => l / r,
                    FloatBinaryOp::Rem => l % r,
                };
                (*dest, float_of(&left.ty, value))
            }
            Instruction::IntCompare {
                dest,
                predicate,
                left,
                right,
            } => {
                let (bits, l) = self.int_operand(frame, left)?;
                let (_, r) = self.int_operand(frame, right)?;
                let (ul, ur) = (unsigned(bits, l), unsigned(bits, r));
                let result = match predicate {
                    IntPredicate::Eq => l == r,
                    IntPredicate::Ne => l != r,
                    IntPredicate::Slt => l < r,
                    IntPredicate::Sle => l <= r,
                    IntPredicate::Sgt => l > r,
                    IntPredicate::Sge => l >= r,
                    IntPredicate::Ult => ul < ur,
                    IntPredicate::Ule => ul <= ur,
                    IntPredicate::Ugt => ul > ur,
                    IntPredicate::Uge => ul >= ur,
                };
                (*dest, bool_value(result))
            }
            Instruction::FloatCompare {
                dest,
                predicate,
                left,
                right,
            } => {
                let left = self.operand(frame, left)?;
                let right = self.operand(frame, right)?;
                let (Some(l), Some(r)) = (left.as_float(), right.as_float()) else {
                    return Err(EvalError::TypeMismatch(String::from(
                        "float comparison on a non-float",
                    )));
                };
                let result = match predicate {
                    FloatPredicate::Oeq => l == r,
                    FloatPredicate::One => l != r && !l.is_nan() && !r.is_nan(),
                    FloatPredicate::Olt => l < r,
                    FloatPredicate::Ole => l <= r,
                    FloatPredicate::Ogt => l > r,
                    FloatPredicate::Oge => l >= r,
                };
                (*dest, bool_value(result))
            }
            Instruction::IntNeg { dest, value } => {
                let (bits, value) = self.int_operand(frame, value)?;
                (
                    *dest,
                    RuntimeValue::Int {
                        bits,
                        value: wrap(bits, value.wrapping_neg()),
                    },
                )
            }
            Instruction::FloatNeg { dest, value } => {
                let operand = self.operand(frame, value)?;
                let float = operand.as_float().ok_or_else(|| {
                    EvalError::TypeMismatch(String::from("float negation on a non-float"))
                })?;
                (*dest, float_of(&value.ty, -float))
            }
            Instruction::Not { dest, value } => {
                let (bits, value) = self.int_operand(frame, value)?;
                (
                    *dest,
                    RuntimeValue::Int {
                        bits,
                        value: wrap(bits, !value),
                    },
                )
            }
            Instruction::Cast {
                dest,
                value,
                ty,
                unsigned,
            } => {
                let operand = self.operand(frame, value)?;
                (*dest, cast(&operand, ty, *unsigned)?)
            }
            Instruction::Call {
                dest,
                function,
                args,
            } => {
                let args = args
                    .iter()
                    .map(|arg| self.operand(frame, arg))
                    .collect::<Result<Vec<RuntimeValue>, EvalError>>()?;
                (*dest, self.call_index(*function, args)?)
            }
            Instruction::Return { .. }
            | Instruction::Branch { .. }
            | Instruction::CondBranch { .. } => return Ok(()),
        };

        match frame.registers.get_mut(dest as usize) {
            Some(register) => {
                *register = Some(value);
                Ok(())
            }
            None => Err(EvalError::UndefinedRegister(dest)),
        }
    }

    fn operand(&self, frame: &Frame, value: &IrValue) -> Result<RuntimeValue, EvalError> {
        match &value.operand {
            Operand::Int(int) => match value.ty {
                IrType::Int(bits) => Ok(RuntimeValue::Int {
                    bits,
                    value: wrap(bits, *int),
                }),
                _ => Ok(float_of(&value.ty, *int as f64)),
            },
            Operand::Float(float) => Ok(float_of(&value.ty, *float)),
            Operand::Zero => Ok(RuntimeValue::zero(self.module, &value.ty)),
            Operand::Register(register) => frame
                .registers
                .get(*register as usize)
                .cloned()
                .flatten()
                .ok_or(EvalError::UndefinedRegister(*register)),
            Operand::Param(index) => frame
                .params
                .get(*index as usize)
                .cloned()
                .ok_or(EvalError::InvalidAddress),
            Operand::Global(index) => {
                let cell = *self.globals.get(*index).ok_or(EvalError::InvalidAddress)?;
                Ok(RuntimeValue::Pointer(Some(Address { cell, path: vec![] })))
            }
        }
    }

    fn int_operand(&self, frame: &Frame, value: &IrValue) -> Result<(u32, i64), EvalError> {
        match self.operand(frame, value)? {
            RuntimeValue::Int { bits, value } => Ok((bits, value)),
            other => Err(EvalError::TypeMismatch(format!(
                "expected an integer, found {}",
                other
            ))),
        }
    }

    fn address(&self, frame: &Frame, pointer: &IrValue) -> Result<Address, EvalError> {
        match self.operand(frame, pointer)? {
            RuntimeValue::Pointer(Some(address)) => Ok(address),
            _ => Err(EvalError::InvalidAddress),
        }
    }

    fn load(&self, address: &Address) -> Result<&RuntimeValue, EvalError> {
        let mut value = self
            .memory
            .get(address.cell)
            .ok_or(EvalError::InvalidAddress)?;

        for index in address.path.iter() {
            value = match value {
                RuntimeValue::Aggregate(fields) => {
                    fields.get(*index as usize).ok_or(EvalError::InvalidAddress)?
                }
                _ => return Err(EvalError::InvalidAddress),
            };
        }

        Ok(value)
    }

    fn slot(&mut self, address: &Address) -> Result<&mut RuntimeValue, EvalError> {
        let mut value = self
            .memory
            .get_mut(address.cell)
            .ok_or(EvalError::InvalidAddress)?;

        for index in address.path.iter() {
            value = match value {
                RuntimeValue::Aggregate(fields) => fields
                    .get_mut(*index as usize)
                    .ok_or(EvalError::InvalidAddress)?,
                _ => return Err(EvalError::InvalidAddress),
            };
        }

        Ok(value)
    }
}

fn bool_value(value: bool) -> RuntimeValue {
    RuntimeValue::Int {
        bits: 1,
        value: value as i64,
    }
}

fn float_of(ty: &IrType, value: f64) -> RuntimeValue {
    match ty {
        IrType::Float32 => RuntimeValue::Float32(value as f32),
        _ => RuntimeValue::Float64(value),
    }
}

/// Integers widen by sign or zero extension as `unsigned` says; booleans
/// always widen to 0 or 1.
fn cast(value: &RuntimeValue, ty: &IrType, unsigned_int: bool) -> Result<RuntimeValue, EvalError> {
    match (value, ty) {
        (RuntimeValue::Int { bits: from, value }, IrType::Int(bits)) => {
            let value = if unsigned_int {
                unsigned(*from, *value) as i64
            } else {
                *value
            };
            Ok(RuntimeValue::Int {
                bits: *bits,
                value: wrap(*bits, value),
            })
        }
        (RuntimeValue::Int { bits, value }, IrType::Float32 | IrType::Float64) => {
            let float = if unsigned_int {
                unsigned(*bits, *value) as f64
            } else {
                *value as f64
            };
            Ok(float_of(ty, float))
        }
        (RuntimeValue::Float32(_) | RuntimeValue::Float64(_), IrType::Int(bits)) => {
            let float = value.as_float().unwrap_or_default();
            let value = if unsigned_int {
                float as u64 as i64
            } else {
                float as i64
            };
            Ok(RuntimeValue::Int {
                bits: *bits,
                value: wrap(*bits, value),
            })
        }
        (RuntimeValue::Float32(_) | RuntimeValue::Float64(_), IrType::Float32 | IrType::Float64) => {
            Ok(float_of(ty, value.as_float().unwrap_or_default()))
        }
        _ => Err(EvalError::TypeMismatch(format!(
            "can't cast {} to {:?}",
            value, ty
        ))),
    }
}
