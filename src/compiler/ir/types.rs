/// Types understood by the IR. Booleans are `Int(1)`.
#[derive(Debug, Clone, PartialEq)]
pub enum IrType {
    Int(u32),
    Float32,
    Float64,
    Pointer(Box<IrType>),
    /// Index into `Module::structs`.
    Struct(usize),
    /// Anonymous aggregate, laid out in field order.
    Tuple(Vec<IrType>),
}

impl IrType {
    pub fn bool() -> Self {
        IrType::Int(1)
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Pointer(pointee) => Some(pointee),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Float(f64),
    /// The all-zero value of the operand's type.
    Zero,
    Register(u32),
    Param(u32),
    /// Address of a module global.
    Global(usize),
}

/// An operand together with its type.
#[derive(Debug, Clone, PartialEq)]
pub struct IrValue {
    pub operand: Operand,
    pub ty: IrType,
}

impl IrValue {
    pub fn new(operand: Operand, ty: IrType) -> Self {
        IrValue { operand, ty }
    }

    pub fn zero(ty: IrType) -> Self {
        IrValue {
            operand: Operand::Zero,
            ty,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self.operand,
            Operand::Int(_) | Operand::Float(_) | Operand::Zero
        )
    }
}

/// Handle to a function in the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionRef(pub usize);

/// Handle to a block inside a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    pub function: usize,
    pub index: usize,
}
