//! Utility macros for the compiler.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_SPAN!` - Creates a Span from offsets and a line/column pair

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's source text
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::IntLiteral, "42".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Creates a Span, converting every part to `u32`.
///
/// ```ignore
/// let span = MK_SPAN!(lexer.start, lexer.pos, lexer.start_line, lexer.start_column);
/// ```
#[macro_export]
macro_rules! MK_SPAN {
    ($start:expr, $end:expr, $line:expr, $column:expr) => {
        $crate::Span {
            start: $start as u32,
            end: $end as u32,
            line: $line as u32,
            column: $column as u32,
        }
    };
}
