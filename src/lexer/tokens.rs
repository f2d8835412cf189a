use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("var", TokenKind::Var);
        map.insert("struct", TokenKind::Struct);
        map.insert("impl", TokenKind::Impl);
        map.insert("trait", TokenKind::Trait);
        map.insert("func", TokenKind::Func);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("for", TokenKind::For);
        map.insert("while", TokenKind::While);
        map.insert("return", TokenKind::Return);
        map.insert("and", TokenKind::And);
        map.insert("or", TokenKind::Or);
        map.insert("null", TokenKind::Null);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);

        map.insert("int8", TokenKind::Int8);
        map.insert("int16", TokenKind::Int16);
        map.insert("int32", TokenKind::Int32);
        map.insert("int64", TokenKind::Int64);
        map.insert("uint8", TokenKind::Uint8);
        map.insert("uint16", TokenKind::Uint16);
        map.insert("uint32", TokenKind::Uint32);
        map.insert("uint64", TokenKind::Uint64);
        map.insert("float32", TokenKind::Float32);
        map.insert("float64", TokenKind::Float64);
        map.insert("bool", TokenKind::Bool);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EndOfFile,

    // Literals
    IntLiteral,
    FloatLiteral,
    HexLiteral,
    OctalLiteral,
    StringLiteral,
    True,
    False,

    Identifier,
    /// An identifier known to name a user defined aggregate.
    ObjectType,

    // Structural
    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Comma,
    Dot,
    Colon,
    Arrow,
    Dollar,
    Hash,

    // Operators
    Plus,
    PlusEqual,
    Minus,
    MinusEqual,
    Star,
    StarEqual,
    Slash,
    SlashEqual,
    Percent,
    PercentEqual,
    Equal,
    EqualEqual,
    Bang,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Caret,
    CaretEqual,
    Pipe,
    PipeEqual,
    Ampersand,
    AmpersandEqual,
    Tilde,
    ShiftLeft,
    ShiftLeftEqual,
    ShiftRight,
    ShiftRightEqual,

    // Reserved
    Var,
    Struct,
    Impl,
    Trait,
    Func,
    If,
    Else,
    For,
    While,
    Return,
    And,
    Or,
    Null,

    // Primitive types
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

impl TokenKind {
    /// Keywords naming a builtin datatype.
    pub fn is_primitive_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Int8
                | TokenKind::Int16
                | TokenKind::Int32
                | TokenKind::Int64
                | TokenKind::Uint8
                | TokenKind::Uint16
                | TokenKind::Uint32
                | TokenKind::Uint64
                | TokenKind::Float32
                | TokenKind::Float64
                | TokenKind::Bool
        )
    }

    /// Anything allowed where a datatype is expected.
    pub fn is_type_name(&self) -> bool {
        self.is_primitive_type() || *self == TokenKind::ObjectType
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::HexLiteral
                | TokenKind::OctalLiteral
                | TokenKind::StringLiteral
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// The binary operator a compound assignment applies, `+=` to `+` etc.
    pub fn compound_base(&self) -> Option<TokenKind> {
        match self {
            TokenKind::PlusEqual => Some(TokenKind::Plus),
            TokenKind::MinusEqual => Some(TokenKind::Minus),
            TokenKind::StarEqual => Some(TokenKind::Star),
            TokenKind::SlashEqual => Some(TokenKind::Slash),
            TokenKind::PercentEqual => Some(TokenKind::Percent),
            TokenKind::CaretEqual => Some(TokenKind::Caret),
            TokenKind::PipeEqual => Some(TokenKind::Pipe),
            TokenKind::AmpersandEqual => Some(TokenKind::Ampersand),
            TokenKind::ShiftLeftEqual => Some(TokenKind::ShiftLeft),
            TokenKind::ShiftRightEqual => Some(TokenKind::ShiftRight),
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A classified lexeme. `value` is the exact source text under `span`.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    fn is_one_of_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }

    /// One line dump used by `--dump-tokens`.
    pub fn debug(&self) -> String {
        if self.is_one_of_many(&[
            TokenKind::StringLiteral,
            TokenKind::Identifier,
            TokenKind::ObjectType,
            TokenKind::IntLiteral,
            TokenKind::FloatLiteral,
            TokenKind::HexLiteral,
            TokenKind::OctalLiteral,
        ]) {
            format!(
                "{}:{}\t{} ({})",
                self.span.line, self.span.column, self.kind, self.value
            )
        } else {
            format!("{}:{}\t{} ()", self.span.line, self.span.column, self.kind)
        }
    }
}
