use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::{diagnostics::Diagnostics, errors::ErrorImpl},
    CompilerContext, Span, MK_SPAN, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

lazy_static! {
    static ref HEX_PATTERN: Regex = Regex::new("^0[xX][0-9a-fA-F]*").unwrap();
    static ref OCTAL_PATTERN: Regex = Regex::new("^0[oO][0-7]*").unwrap();
    static ref DECIMAL_PATTERN: Regex =
        Regex::new("^[0-9]+(?P<fraction>\\.[0-9]*)?(?P<exponent>[eE][+-]?(?P<digits>[0-9]*))?")
            .unwrap();
    static ref SYMBOL_PATTERN: Regex = Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*").unwrap();
}

/// Hand written scanner over the source buffer.
///
/// Reading past the end of the buffer yields `'\0'`, and the cursor never
/// moves beyond `source.len()`.
pub struct Lexer<'a> {
    source: &'a str,
    diagnostics: &'a mut Diagnostics,
    tokens: Vec<Token>,
    /// Names introduced by `struct`/`impl` or as a declared type so far.
    known_types: HashSet<String>,
    tab_width: u32,
    pos: usize,
    start: usize,
    line: u32,
    column: u32,
    start_line: u32,
    start_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, tab_width: u32, diagnostics: &'a mut Diagnostics) -> Lexer<'a> {
        Lexer {
            source,
            diagnostics,
            tokens: vec![],
            known_types: HashSet::new(),
            tab_width,
            pos: 0,
            start: 0,
            line: 1,
            column: 0,
            start_line: 1,
            start_column: 0,
        }
    }

    fn peek(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        if c == '\0' && self.at_eof() {
            return c;
        }

        self.pos += c.len_utf8();
        match c {
            '\n' => {
                self.line += 1;
                self.column = 0;
            }
            '\t' => self.column += self.tab_width,
            _ => self.column += 1,
        }

        c
    }

    fn advance_n(&mut self, n: usize) {
        let target = (self.pos + n).min(self.source.len());
        while self.pos < target {
            self.advance();
        }
    }

    /// Consumes the next character only if it is `expected`.
    fn match_(&mut self, expected: char) -> bool {
        if !self.at_eof() && self.peek() == expected {
            self.advance();
            return true;
        }

        false
    }

    fn current_span(&self) -> Span {
        MK_SPAN!(self.start, self.pos, self.start_line, self.start_column)
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.pos]
    }

    fn push(&mut self, kind: TokenKind) {
        let span = self.current_span();
        let value = String::from(self.lexeme());
        self.tokens.push(MK_TOKEN!(kind, value, span));
    }

    fn last_kind(&self, back: usize) -> Option<TokenKind> {
        self.tokens
            .len()
            .checked_sub(back + 1)
            .map(|index| self.tokens[index].kind)
    }

    fn skip_non_code(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\t' | '\r' | '\n' if !self.at_eof() => {
                    self.advance();
                }
                '/' if self.peek_next() == '/' => {
                    while !self.at_eof() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_token(&mut self) {
        self.skip_non_code();

        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = self.column;

        if self.at_eof() {
            return;
        }

        let c = self.peek();

        if c.is_ascii_digit() {
            return self.number();
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return self.identifier();
        }
        if c == '"' {
            return self.string();
        }

        self.advance();

        let kind = match c {
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '{' => TokenKind::OpenCurly,
            '}' => TokenKind::CloseCurly,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '$' => TokenKind::Dollar,
            '#' => TokenKind::Hash,
            '~' => TokenKind::Tilde,
            '+' => self.either('=', TokenKind::PlusEqual, TokenKind::Plus),
            '-' => {
                if self.match_('>') {
                    TokenKind::Arrow
                } else {
                    self.either('=', TokenKind::MinusEqual, TokenKind::Minus)
                }
            }
            '*' => self.either('=', TokenKind::StarEqual, TokenKind::Star),
            '/' => self.either('=', TokenKind::SlashEqual, TokenKind::Slash),
            '%' => self.either('=', TokenKind::PercentEqual, TokenKind::Percent),
            '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal),
            '!' => self.either('=', TokenKind::BangEqual, TokenKind::Bang),
            '^' => self.either('=', TokenKind::CaretEqual, TokenKind::Caret),
            '|' => self.either('=', TokenKind::PipeEqual, TokenKind::Pipe),
            '&' => self.either('=', TokenKind::AmpersandEqual, TokenKind::Ampersand),
            '<' => {
                if self.match_('<') {
                    self.either('=', TokenKind::ShiftLeftEqual, TokenKind::ShiftLeft)
                } else {
                    self.either('=', TokenKind::LessEqual, TokenKind::Less)
                }
            }
            '>' => {
                if self.match_('>') {
                    self.either('=', TokenKind::ShiftRightEqual, TokenKind::ShiftRight)
                } else {
                    self.either('=', TokenKind::GreaterEqual, TokenKind::Greater)
                }
            }
            other => {
                let span = self.current_span();
                self.diagnostics
                    .error(ErrorImpl::UnrecognisedCharacter { character: other }, span);
                return;
            }
        };

        self.push(kind);
    }

    fn either(&mut self, next: char, matched: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.match_(next) {
            matched
        } else {
            otherwise
        }
    }

    fn number(&mut self) {
        let remainder = &self.source[self.start..];

        if let Some(hex) = HEX_PATTERN.find(remainder) {
            self.advance_n(hex.end());
            if hex.end() == 2 {
                let span = self.current_span();
                self.diagnostics.error(
                    ErrorImpl::UnterminatedHexLiteral {
                        token: String::from(self.lexeme()),
                    },
                    span,
                );
            }
            return self.push(TokenKind::HexLiteral);
        }

        if let Some(octal) = OCTAL_PATTERN.find(remainder) {
            self.advance_n(octal.end());
            if octal.end() == 2 {
                let span = self.current_span();
                self.diagnostics.error(
                    ErrorImpl::UnterminatedOctalLiteral {
                        token: String::from(self.lexeme()),
                    },
                    span,
                );
            }
            return self.push(TokenKind::OctalLiteral);
        }

        let Some(captures) = DECIMAL_PATTERN.captures(remainder) else {
            // scan_token only dispatches here on a digit
            self.advance();
            return self.push(TokenKind::IntLiteral);
        };

        let length = captures.get(0).map_or(1, |m| m.end());
        let is_float = captures.name("fraction").is_some() || captures.name("exponent").is_some();
        let missing_exponent = captures.name("exponent").is_some()
            && captures.name("digits").map_or(true, |digits| digits.as_str().is_empty());

        self.advance_n(length);

        if missing_exponent {
            let span = self.current_span();
            self.diagnostics.error(
                ErrorImpl::UnterminatedNumber {
                    token: String::from(self.lexeme()),
                },
                span,
            );
        }

        if is_float {
            self.push(TokenKind::FloatLiteral);
        } else {
            self.push(TokenKind::IntLiteral);
        }
    }

    fn string(&mut self) {
        // opening quote
        self.advance();

        while !self.at_eof() && self.peek() != '"' {
            self.advance();
        }

        if self.at_eof() {
            let span = self.current_span();
            self.diagnostics.error(ErrorImpl::UnterminatedString, span);
        } else {
            // closing quote
            self.advance();
        }

        self.push(TokenKind::StringLiteral);
    }

    fn identifier(&mut self) {
        let length = SYMBOL_PATTERN
            .find(&self.source[self.start..])
            .map_or(1, |m| m.end());
        self.advance_n(length);

        let kind = self.classify(self.lexeme());
        self.push(kind);
    }

    /// Keyword, user type or plain identifier.
    fn classify(&mut self, word: &str) -> TokenKind {
        if let Some(kind) = RESERVED_LOOKUP.get(word) {
            return *kind;
        }

        let previous = self.last_kind(0);

        if matches!(previous, Some(TokenKind::Struct) | Some(TokenKind::Impl)) {
            self.known_types.insert(String::from(word));
            return TokenKind::ObjectType;
        }

        if self.known_types.contains(word) {
            return TokenKind::ObjectType;
        }

        // `var name Type`
        if previous == Some(TokenKind::Identifier) && self.last_kind(1) == Some(TokenKind::Var) {
            self.known_types.insert(String::from(word));
            return TokenKind::ObjectType;
        }

        TokenKind::Identifier
    }

    fn finish(mut self) -> Vec<Token> {
        self.start = self.source.len();
        self.pos = self.source.len();
        self.start_line = self.line;
        self.start_column = self.column;
        self.push(TokenKind::EndOfFile);
        self.tokens
    }
}

/// Classifies a single lexeme. Words in `object_types` are user type names,
/// which the scanner only recognises from the surrounding tokens.
pub fn classify_lexeme(lexeme: &str, object_types: &HashSet<String>) -> Option<TokenKind> {
    let mut diagnostics = Diagnostics::new();
    let tokens = scan(lexeme, 4, &mut diagnostics);

    match tokens.as_slice() {
        [token, eof] if eof.kind == TokenKind::EndOfFile && token.value == lexeme => {
            Some(match token.kind {
                TokenKind::Identifier if object_types.contains(lexeme) => TokenKind::ObjectType,
                kind => kind,
            })
        }
        _ => None,
    }
}

/// Spellings scanned as `ObjectType` in `tokens`. A name stays a type once
/// introduced, so for a prefix of the stream this is the context
/// `classify_lexeme` needs for its last token.
pub fn object_type_names(tokens: &[Token]) -> HashSet<String> {
    tokens
        .iter()
        .filter(|token| token.kind == TokenKind::ObjectType)
        .map(|token| token.value.clone())
        .collect()
}

fn scan(source: &str, tab_width: u32, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut lexer = Lexer::new(source, tab_width, diagnostics);

    while !lexer.at_eof() {
        lexer.scan_token();
    }

    lexer.finish()
}

/// Converts the context's source into tokens, always ending with exactly one
/// `EndOfFile`.
pub fn tokenize(context: &mut CompilerContext) -> Vec<Token> {
    let source = std::rc::Rc::clone(&context.source);

    if source.is_empty() {
        context
            .diagnostics
            .warning(ErrorImpl::EmptySource, Span::default());
    }

    scan(&source, context.options.tab_width, &mut context.diagnostics)
}
