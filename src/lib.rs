#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::{
    ast::ast::Stmt,
    compiler::{backend::Backend, compiler::compile},
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorTip},
    },
    lexer::lexer::tokenize,
    parser::parser::parse,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;

extern crate regex;

/// A half-open byte range into the source buffer plus the human readable
/// line/column of its first byte. Lines start at 1, columns at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Span {
            start,
            end,
            line,
            column,
        }
    }

    /// Span covering `self` through `other`, keeping the position of `self`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Knobs the driver can set for one compilation run.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Columns a tab advances the scanner by.
    pub tab_width: u32,
    /// Name given to the emitted module.
    pub module_name: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            tab_width: 4,
            module_name: String::from("main"),
        }
    }
}

/// Per-run state shared by the lexer, parser and code generator.
///
/// One context is created for each compilation unit and threaded by mutable
/// reference through every phase, so nothing about a run lives in globals.
#[derive(Debug)]
pub struct CompilerContext {
    pub file: Rc<String>,
    pub source: Rc<String>,
    pub options: CompilerOptions,
    pub diagnostics: Diagnostics,
}

impl CompilerContext {
    pub fn new(source: impl Into<String>, file: Option<String>) -> Self {
        Self::with_options(source, file, CompilerOptions::default())
    }

    pub fn with_options(
        source: impl Into<String>,
        file: Option<String>,
        options: CompilerOptions,
    ) -> Self {
        let file = file.unwrap_or_else(|| String::from("shell"));

        CompilerContext {
            file: Rc::new(file),
            source: Rc::new(source.into()),
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Text of the source covered by `span`.
    pub fn slice(&self, span: &Span) -> &str {
        let end = (span.end as usize).min(self.source.len());
        let start = (span.start as usize).min(end);
        &self.source[start..end]
    }
}

/// Runs the lexer and parser over the context's source.
pub fn parse_source(context: &mut CompilerContext) -> Vec<Stmt> {
    let tokens = tokenize(context);
    parse(tokens, context)
}

/// Runs every phase and returns the populated backend.
pub fn compile_source<B: Backend>(context: &mut CompilerContext, backend: B) -> B {
    let program = parse_source(context);
    compile(&program, context, backend)
}

/// Finds the line containing the byte offset `position`.
///
/// Returns the 1-based line number, the line text and the offset of
/// `position` inside that line.
pub fn get_line_at_position(content: &str, position: u32) -> (usize, String, usize) {
    let pos = (position as usize).min(content.len().saturating_sub(1));

    let mut start = 0;
    let mut line_number = 1;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return (line_number, line.to_string(), line_pos);
        }

        start = end;
        line_number += 1;
    }

    (line_number, String::new(), 0)
}

/// Renders one diagnostic with a caret pointing into the offending line.
pub fn render_diagnostic(error: &Error, source: &str, file: &str) -> String {
    /*
        error: message
        -> final.bsh
           |
        20 | var a = #;
           | --------^
    */

    let span = error.get_span();
    let (line, line_text, line_pos) = get_line_at_position(source, span.start);

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    let mut out = String::new();

    if let ErrorTip::None = error.get_tip() {
        out.push_str(&format!(
            "{}: {}\n",
            error.get_severity(),
            error.get_error_name()
        ));
    } else {
        out.push_str(&format!(
            "{}: {} ({})\n",
            error.get_severity(),
            error.get_error_name(),
            error.get_tip()
        ));
    }
    out.push_str(&format!("-> {}\n", file));
    out.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use crate::{
        errors::errors::{Error, ErrorImpl, Severity},
        Span,
    };

    #[test]
    fn test_get_line_at_position() {
        let content = "Hello, world!\nsecond\nthird\nTesting { }\n";

        let (line_number, line, line_pos) = super::get_line_at_position(content, 10);
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(content, 35);
        assert_eq!(line_number, 4);
        assert_eq!(line, "Testing { }\n");
        assert_eq!(line_pos, 8);
    }

    #[test]
    fn test_render_diagnostic_points_at_offset() {
        let source = "var x int32;\n    y = 1;\n";
        let error = Error::new(
            ErrorImpl::AssignToUnknownVariable {
                variable: String::from("y"),
            },
            Span::new(17, 18, 2, 4),
            Severity::Error,
        );

        let rendered = super::render_diagnostic(&error, source, "test.bsh");
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[0].starts_with("error: AssignToUnknownVariable"));
        assert_eq!(lines[1], "-> test.bsh");
        assert_eq!(lines[3], "2 | y = 1;");
        assert_eq!(lines[4], "  | ^");
    }

    #[test]
    fn test_span_to_joins_ranges() {
        let left = Span::new(4, 6, 1, 4);
        let right = Span::new(9, 12, 1, 9);
        let joined = left.to(&right);

        assert_eq!(joined.start, 4);
        assert_eq!(joined.end, 12);
        assert_eq!(joined.column, 4);
        assert_eq!(joined.len(), 8);
    }
}
