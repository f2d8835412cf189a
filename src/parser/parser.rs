//! Parser implementation for building the Abstract Syntax Tree.
//!
//! The Parser owns the token stream and a cursor into it. Expression
//! parsing is driven by the static rule table in `lookups`, statement parsing
//! by the statement table keyed on the leading keyword.
//!
//! Handlers return `Result` and bail out with `?` on the first problem. The
//! loops that collect statements (top level, blocks, struct and impl bodies)
//! report the error, resynchronise and keep going, so one run surfaces every
//! independent syntax error.

use crate::{
    ast::ast::Stmt,
    errors::{
        diagnostics::Diagnostics,
        errors::{Error, ErrorImpl},
    },
    lexer::tokens::{Token, TokenKind},
    CompilerContext, Span,
};

use super::stmt::parse_stmt;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: &'a mut Diagnostics,
    /// Type named by the enclosing `impl` block, if any.
    impl_owner: Option<String>,
    /// Nesting of `{ }` bodies currently open.
    block_depth: usize,
}

impl<'a> Parser<'a> {
    /// The token stream must end with `EndOfFile`; one is appended if not.
    pub fn new(mut tokens: Vec<Token>, diagnostics: &'a mut Diagnostics) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::EndOfFile) {
            let span = tokens
                .last()
                .map(|token| Span::new(token.span.end, token.span.end, token.span.line, token.span.column))
                .unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::EndOfFile,
                value: String::new(),
                span,
            });
        }

        Parser {
            tokens,
            pos: 0,
            diagnostics,
            impl_owner: None,
            block_depth: 0,
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// The token after the current one.
    pub fn peek_kind(&self) -> TokenKind {
        let index = (self.pos + 1).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    pub fn previous_token(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|index| self.tokens.get(index))
    }

    /// Span of the last consumed token, or of the current one at the start.
    pub fn previous_span(&self) -> Span {
        match self.previous_token() {
            Some(token) => token.span,
            None => self.current_token().span,
        }
    }

    /// Advances to the next token and returns the previous token. Never moves
    /// past `EndOfFile`.
    pub fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.tokens[index].kind != TokenKind::EndOfFile {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current_token_kind() == kind
    }

    /// Consumes the current token if it is `kind`.
    pub fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }

        false
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        if self.current_token_kind() == expected_kind {
            return Ok(self.advance().clone());
        }

        match error {
            Some(error) => Err(error),
            None => Err(self.error_here(ErrorImpl::UnexpectedTokenDetailed {
                token: self.current_token().value.clone(),
                message: format!("expected {}", expected_kind),
            })),
        }
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// An error positioned at the current token.
    pub fn error_here(&self, kind: ErrorImpl) -> Error {
        Error::new(
            kind,
            self.current_token().span,
            crate::errors::errors::Severity::Error,
        )
    }

    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EndOfFile
    }

    pub fn report(&mut self, error: Error) {
        self.diagnostics.report(error);
    }

    pub fn impl_owner(&self) -> Option<&String> {
        self.impl_owner.as_ref()
    }

    /// Runs `handler` with `owner` as the enclosing impl type, restoring the
    /// previous owner afterwards whatever the outcome.
    pub fn with_impl_owner<T>(
        &mut self,
        owner: String,
        handler: impl FnOnce(&mut Parser<'a>) -> T,
    ) -> T {
        let previous = self.impl_owner.replace(owner);
        let result = handler(self);
        self.impl_owner = previous;
        result
    }

    /// Runs `handler` for the contents of a `{ }` body.
    pub fn within_block<T>(&mut self, handler: impl FnOnce(&mut Parser<'a>) -> T) -> T {
        self.block_depth += 1;
        let result = handler(self);
        self.block_depth -= 1;
        result
    }

    /// Runs `handler`; on failure reports the error, resynchronises and
    /// yields `None`.
    pub fn recovering<T>(
        &mut self,
        handler: impl FnOnce(&mut Parser<'a>) -> Result<T, Error>,
    ) -> Option<T> {
        match handler(self) {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(error);
                self.synchronise();
                None
            }
        }
    }

    /// Skips to the next statement boundary: just past a `;`, before a
    /// statement keyword, or before the `}` closing the current body.
    fn synchronise(&mut self) {
        let at_body_end = self.block_depth > 0 && self.check(TokenKind::CloseCurly);
        if !at_body_end {
            self.advance();
        }

        while self.has_tokens() {
            if self
                .previous_token()
                .is_some_and(|token| token.kind == TokenKind::Semicolon)
            {
                return;
            }

            match self.current_token_kind() {
                TokenKind::Var
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Impl
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Return => return,
                TokenKind::CloseCurly if self.block_depth > 0 => return,
                TokenKind::CloseCurly => {
                    // stray closer at the top level
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Parses every top-level statement. Syntax errors are reported to the
/// context's diagnostics; the statements they occur in are left out of the
/// result.
pub fn parse(tokens: Vec<Token>, context: &mut CompilerContext) -> Vec<Stmt> {
    let mut parser = Parser::new(tokens, &mut context.diagnostics);
    let mut body = vec![];

    while parser.has_tokens() {
        if parser.match_kind(TokenKind::Semicolon) {
            continue;
        }

        if let Some(stmt) = parser.recovering(parse_stmt) {
            body.push(stmt);
        }
    }

    body
}
