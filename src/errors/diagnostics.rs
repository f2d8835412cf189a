//! The diagnostics channel.
//!
//! Every phase reports through a single `Diagnostics` value owned by the
//! `CompilerContext`. Reporting never aborts: the phase that reported keeps
//! going with a placeholder, and the driver decides what to do with the
//! collected errors once the run is over.

use std::slice::Iter;

use tracing::{error, warn};

use crate::Span;

use super::errors::{Error, ErrorImpl, Severity};

#[derive(Debug, Default)]
pub struct Diagnostics {
    reported: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { reported: vec![] }
    }

    /// Records `diagnostic` and emits it as a tracing event.
    pub fn report(&mut self, diagnostic: Error) {
        match diagnostic.get_severity() {
            Severity::Warning => warn!(
                line = diagnostic.get_span().line,
                col = diagnostic.get_span().column,
                "{}",
                diagnostic.get_kind()
            ),
            Severity::Error | Severity::Crash => error!(
                line = diagnostic.get_span().line,
                col = diagnostic.get_span().column,
                severity = %diagnostic.get_severity(),
                "{}",
                diagnostic.get_kind()
            ),
        }

        self.reported.push(diagnostic);
    }

    pub fn warning(&mut self, kind: ErrorImpl, span: Span) {
        self.report(Error::new(kind, span, Severity::Warning));
    }

    pub fn error(&mut self, kind: ErrorImpl, span: Span) {
        self.report(Error::new(kind, span, Severity::Error));
    }

    pub fn crash(&mut self, kind: ErrorImpl, span: Span) {
        self.report(Error::new(kind, span, Severity::Crash));
    }

    pub fn iter(&self) -> Iter<'_, Error> {
        self.reported.iter()
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.reported
            .iter()
            .any(|diagnostic| diagnostic.get_severity() >= Severity::Error)
    }

    pub fn has_crash(&self) -> bool {
        self.count(Severity::Crash) > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.reported
            .iter()
            .filter(|diagnostic| diagnostic.get_severity() == severity)
            .count()
    }
}
