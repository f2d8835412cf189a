use std::fmt::Display;

use thiserror::Error;

use crate::Span;

/// How bad a reported condition is.
///
/// `Crash` is reserved for host failures (unreadable input and the like);
/// whoever owns the process decides to exit on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
    Crash,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Crash => write!(f, "crash"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    span: Span,
    severity: Severity,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, span: Span, severity: Severity) -> Self {
        Error {
            internal_error: error_impl,
            span,
            severity,
        }
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    pub fn get_severity(&self) -> Severity {
        self.severity
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedCharacter { .. } => "UnrecognisedCharacter",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::UnterminatedNumber { .. } => "UnterminatedNumber",
            ErrorImpl::UnterminatedHexLiteral { .. } => "UnterminatedHexLiteral",
            ErrorImpl::UnterminatedOctalLiteral { .. } => "UnterminatedOctalLiteral",
            ErrorImpl::EmptySource => "EmptySource",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::ExpectedExpression { .. } => "ExpectedExpression",
            ErrorImpl::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            ErrorImpl::MissingTypeOrInitializer { .. } => "MissingTypeOrInitializer",
            ErrorImpl::MissingMemberType { .. } => "MissingMemberType",
            ErrorImpl::MethodWithoutBody { .. } => "MethodWithoutBody",
            ErrorImpl::DuplicateParameter { .. } => "DuplicateParameter",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnsupportedLiteral { .. } => "UnsupportedLiteral",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::AssignToUnknownVariable { .. } => "AssignToUnknownVariable",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::UnknownMember { .. } => "UnknownMember",
            ErrorImpl::NotAnObject { .. } => "NotAnObject",
            ErrorImpl::GlobalRedeclared { .. } => "GlobalRedeclared",
            ErrorImpl::StructAlreadyDefined { .. } => "StructAlreadyDefined",
            ErrorImpl::RecursiveStruct { .. } => "RecursiveStruct",
            ErrorImpl::FunctionAlreadyDefined { .. } => "FunctionAlreadyDefined",
            ErrorImpl::UnknownFunction { .. } => "UnknownFunction",
            ErrorImpl::NotCallable => "NotCallable",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::ReturnArityMismatch { .. } => "ReturnArityMismatch",
            ErrorImpl::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorImpl::OperandMismatch { .. } => "OperandMismatch",
            ErrorImpl::UnsupportedOperator { .. } => "UnsupportedOperator",
            ErrorImpl::NullValue => "NullValue",
            ErrorImpl::UnreachableCode => "UnreachableCode",
            ErrorImpl::FunctionVerificationFailed { .. } => "FunctionVerificationFailed",
            ErrorImpl::FileUnreadable { .. } => "FileUnreadable",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedCharacter { .. } => ErrorTip::None,
            ErrorImpl::UnterminatedString => {
                ErrorTip::Suggestion(String::from("String literal is missing its closing `\"`"))
            }
            ErrorImpl::UnterminatedNumber { token } => ErrorTip::Suggestion(format!(
                "Number `{}` ends before its exponent digits",
                token
            )),
            ErrorImpl::UnterminatedHexLiteral { token } => ErrorTip::Suggestion(format!(
                "Hex literal `{}` has no digits after the prefix",
                token
            )),
            ErrorImpl::UnterminatedOctalLiteral { token } => ErrorTip::Suggestion(format!(
                "Octal literal `{}` has no digits after the prefix",
                token
            )),
            ErrorImpl::EmptySource => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::ExpectedExpression { token } => {
                ErrorTip::Suggestion(format!("Expected an expression, found `{}`", token))
            }
            ErrorImpl::InvalidAssignmentTarget => ErrorTip::Suggestion(String::from(
                "Only a variable name can appear on the left of `=`",
            )),
            ErrorImpl::MissingTypeOrInitializer { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` needs either a type or an initializer",
                variable
            )),
            ErrorImpl::MissingMemberType { member } => ErrorTip::Suggestion(format!(
                "Struct member `{}` must declare its type",
                member
            )),
            ErrorImpl::MethodWithoutBody { function } => ErrorTip::Suggestion(format!(
                "Method `{}` inside an impl block must have a body",
                function
            )),
            ErrorImpl::DuplicateParameter { parameter } => ErrorTip::Suggestion(format!(
                "Parameter `{}` is declared more than once",
                parameter
            )),
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnsupportedLiteral { token } => ErrorTip::Suggestion(format!(
                "Literal `{}` cannot be used as a value here",
                token
            )),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::AssignToUnknownVariable { variable } => ErrorTip::Suggestion(format!(
                "Can't assign to `{}`, it was never declared",
                variable
            )),
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::UnknownMember { type_, member } => {
                ErrorTip::Suggestion(format!("`{}` has no member named `{}`", type_, member))
            }
            ErrorImpl::NotAnObject { variable } => ErrorTip::Suggestion(format!(
                "`{}` is not a struct value, it has no members",
                variable
            )),
            ErrorImpl::GlobalRedeclared { variable } => ErrorTip::Suggestion(format!(
                "Global `{}` is already declared, assign to it instead",
                variable
            )),
            ErrorImpl::StructAlreadyDefined { name } => {
                ErrorTip::Suggestion(format!("Struct `{}` already has a body", name))
            }
            ErrorImpl::RecursiveStruct { name } => ErrorTip::Suggestion(format!(
                "Struct `{}` contains itself by value, so it has no finite size",
                name
            )),
            ErrorImpl::FunctionAlreadyDefined { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already has a body", function))
            }
            ErrorImpl::UnknownFunction { function } => {
                ErrorTip::Suggestion(format!("Function `{}` not declared", function))
            }
            ErrorImpl::NotCallable => {
                ErrorTip::Suggestion(String::from("Only named functions can be called"))
            }
            ErrorImpl::ArgumentCountMismatch {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` expects {} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::ReturnArityMismatch { expected, received } => ErrorTip::Suggestion(
                format!("Expected {} return values, received {}", expected, received),
            ),
            ErrorImpl::ReturnOutsideFunction => {
                ErrorTip::Suggestion(String::from("`return` is only valid inside a function"))
            }
            ErrorImpl::OperandMismatch {
                operator,
                left,
                right,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` can't combine `{}` with `{}`",
                operator, left, right
            )),
            ErrorImpl::UnsupportedOperator { operator } => {
                ErrorTip::Suggestion(format!("Operator `{}` is not supported here", operator))
            }
            ErrorImpl::NullValue => ErrorTip::Suggestion(String::from(
                "Expression produced no value, an earlier error is likely the cause",
            )),
            ErrorImpl::UnreachableCode => ErrorTip::Suggestion(String::from(
                "Statements after a `return` are never executed",
            )),
            ErrorImpl::FunctionVerificationFailed { function } => ErrorTip::Suggestion(format!(
                "Generated code for `{}` failed verification",
                function
            )),
            ErrorImpl::FileUnreadable { path, reason } => {
                ErrorTip::Suggestion(format!("Couldn't read `{}`: {}", path, reason))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] [Line: {}, Col: {}] {}",
            self.severity, self.span.line, self.span.column, self.internal_error
        )
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    // Lexical
    #[error("unrecognised character: {character:?}")]
    UnrecognisedCharacter { character: char },
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated integer/float literal: {token:?}")]
    UnterminatedNumber { token: String },
    #[error("unterminated hex literal: {token:?}")]
    UnterminatedHexLiteral { token: String },
    #[error("unterminated octal literal: {token:?}")]
    UnterminatedOctalLiteral { token: String },
    #[error("file empty, didn't find source code")]
    EmptySource,

    // Syntax
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("expected an expression, found {token:?}")]
    ExpectedExpression { token: String },
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("variable {variable:?} needs either initializer or datatype")]
    MissingTypeOrInitializer { variable: String },
    #[error("struct member {member:?} has no datatype")]
    MissingMemberType { member: String },
    #[error("impl method {function:?} has no body")]
    MethodWithoutBody { function: String },
    #[error("parameter {parameter:?} declared twice")]
    DuplicateParameter { parameter: String },

    // Codegen
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("literal {token:?} has no value representation")]
    UnsupportedLiteral { token: String },
    #[error("trying to access undeclared variable {variable:?}")]
    VariableNotDeclared { variable: String },
    #[error("can't assign to variable {variable:?} that doesn't exist")]
    AssignToUnknownVariable { variable: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("type {type_} has no member {member:?}")]
    UnknownMember { type_: String, member: String },
    #[error("{variable:?} has no members")]
    NotAnObject { variable: String },
    #[error("global {variable:?} declared twice")]
    GlobalRedeclared { variable: String },
    #[error("struct {name:?} already defined")]
    StructAlreadyDefined { name: String },
    #[error("struct {name:?} contains itself")]
    RecursiveStruct { name: String },
    #[error("function {function:?} already defined")]
    FunctionAlreadyDefined { function: String },
    #[error("function {function:?} not declared")]
    UnknownFunction { function: String },
    #[error("callee is not a function name")]
    NotCallable,
    #[error("{function:?} expects {expected:?} arguments, received {received:?}")]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("return arity mismatch: expected {expected:?}, received {received:?}")]
    ReturnArityMismatch { expected: usize, received: usize },
    #[error("return outside of a function")]
    ReturnOutsideFunction,
    #[error("operands of {operator:?} do not match: {left} and {right}")]
    OperandMismatch {
        operator: String,
        left: String,
        right: String,
    },
    #[error("unsupported operator {operator:?}")]
    UnsupportedOperator { operator: String },
    #[error("expression has no value")]
    NullValue,
    #[error("unreachable statement skipped")]
    UnreachableCode,
    #[error("function {function:?} failed verification")]
    FunctionVerificationFailed { function: String },

    // Host
    #[error("couldn't read {path:?}: {reason}")]
    FileUnreadable { path: String, reason: String },
}
