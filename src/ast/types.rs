//! Type names as written in the source.
//!
//! The front end performs no type checking: a `TypeName` is only the
//! spelling of a datatype in a declaration, resolved to a backend type during
//! code generation.

use std::fmt::Display;

use crate::lexer::tokens::TokenKind;

/// Builtin scalar datatypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Bool,
}

impl PrimitiveType {
    pub fn from_token_kind(kind: TokenKind) -> Option<PrimitiveType> {
        Some(match kind {
            TokenKind::Int8 => PrimitiveType::Int8,
            TokenKind::Int16 => PrimitiveType::Int16,
            TokenKind::Int32 => PrimitiveType::Int32,
            TokenKind::Int64 => PrimitiveType::Int64,
            TokenKind::Uint8 => PrimitiveType::Uint8,
            TokenKind::Uint16 => PrimitiveType::Uint16,
            TokenKind::Uint32 => PrimitiveType::Uint32,
            TokenKind::Uint64 => PrimitiveType::Uint64,
            TokenKind::Float32 => PrimitiveType::Float32,
            TokenKind::Float64 => PrimitiveType::Float64,
            TokenKind::Bool => PrimitiveType::Bool,
            _ => return None,
        })
    }

    /// Width in bits. Backend integer types carry no sign; see `is_unsigned`.
    pub fn bits(&self) -> u32 {
        match self {
            PrimitiveType::Bool => 1,
            PrimitiveType::Int8 | PrimitiveType::Uint8 => 8,
            PrimitiveType::Int16 | PrimitiveType::Uint16 => 16,
            PrimitiveType::Int32 | PrimitiveType::Uint32 | PrimitiveType::Float32 => 32,
            PrimitiveType::Int64 | PrimitiveType::Uint64 | PrimitiveType::Float64 => 64,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveType::Float32 | PrimitiveType::Float64)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Uint8 | PrimitiveType::Uint16 | PrimitiveType::Uint32 | PrimitiveType::Uint64
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Uint8 => "uint8",
            PrimitiveType::Uint16 => "uint16",
            PrimitiveType::Uint32 => "uint32",
            PrimitiveType::Uint64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::Bool => "bool",
        }
    }
}

/// A datatype in a declaration: either builtin or a user defined aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Primitive(PrimitiveType),
    Object(String),
}

impl TypeName {
    pub fn is_unsigned(&self) -> bool {
        matches!(self, TypeName::Primitive(primitive) if primitive.is_unsigned())
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeName::Primitive(primitive) => write!(f, "{}", primitive.name()),
            TypeName::Object(name) => write!(f, "{}", name),
        }
    }
}
