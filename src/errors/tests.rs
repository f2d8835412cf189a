//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::diagnostics::Diagnostics;
use crate::errors::errors::{Error, ErrorImpl, ErrorTip, Severity};
use crate::Span;

fn at(offset: u32) -> Span {
    Span::new(offset, offset + 1, 1, offset)
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedCharacter { character: '@' },
        at(10),
        Severity::Error,
    );

    assert_eq!(error.get_error_name(), "UnrecognisedCharacter");
    assert_eq!(error.get_severity(), Severity::Error);
}

#[test]
fn test_error_span() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        at(42),
        Severity::Error,
    );

    assert_eq!(error.get_span().start, 42);
}

#[test]
fn test_missing_type_or_initializer_error() {
    let error = Error::new(
        ErrorImpl::MissingTypeOrInitializer {
            variable: "y".to_string(),
        },
        at(0),
        Severity::Error,
    );

    assert_eq!(error.get_error_name(), "MissingTypeOrInitializer");
    assert_eq!(
        error.get_tip().to_string(),
        "Variable `y` needs either a type or an initializer"
    );
}

#[test]
fn test_variable_not_declared_error() {
    let error = Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "foo".to_string(),
        },
        at(0),
        Severity::Warning,
    );

    assert_eq!(error.get_error_name(), "VariableNotDeclared");
}

#[test]
fn test_return_arity_mismatch_error() {
    let error = Error::new(
        ErrorImpl::ReturnArityMismatch {
            expected: 2,
            received: 1,
        },
        at(0),
        Severity::Error,
    );

    assert_eq!(error.get_error_name(), "ReturnArityMismatch");
    assert_eq!(
        error.get_tip().to_string(),
        "Expected 2 return values, received 1"
    );
}

#[test]
fn test_unknown_type_error() {
    let error = Error::new(
        ErrorImpl::UnknownType {
            type_: "CustomType".to_string(),
        },
        at(0),
        Severity::Error,
    );

    assert_eq!(error.get_error_name(), "UnknownType");
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedCharacter { character: '@' },
        at(0),
        Severity::Error,
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        at(0),
        Severity::Error,
    );

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_error_display_includes_position() {
    let error = Error::new(
        ErrorImpl::InvalidAssignmentTarget,
        Span::new(3, 4, 2, 7),
        Severity::Error,
    );

    assert_eq!(
        error.to_string(),
        "[error] [Line: 2, Col: 7] invalid assignment target"
    );
}

#[test]
fn test_severity_ordering() {
    assert!(Severity::Warning < Severity::Error);
    assert!(Severity::Error < Severity::Crash);
}

#[test]
fn test_diagnostics_counts_by_severity() {
    let mut diagnostics = Diagnostics::new();
    assert!(diagnostics.is_empty());

    diagnostics.warning(
        ErrorImpl::VariableNotDeclared {
            variable: "a".to_string(),
        },
        at(0),
    );
    assert!(!diagnostics.has_errors());

    diagnostics.error(ErrorImpl::InvalidAssignmentTarget, at(1));
    diagnostics.error(ErrorImpl::NotCallable, at(2));

    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics.warning_count(), 1);
    assert_eq!(diagnostics.error_count(), 2);
    assert!(diagnostics.has_errors());
    assert!(!diagnostics.has_crash());
}

#[test]
fn test_diagnostics_crash_does_not_exit() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.crash(
        ErrorImpl::FileUnreadable {
            path: "missing.bsh".to_string(),
            reason: "not found".to_string(),
        },
        Span::default(),
    );

    assert!(diagnostics.has_crash());
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.iter().count(), 1);
}
