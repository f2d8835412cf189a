use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{
    ast::ast::{Expr, Stmt},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::*, parser::Parser, stmt::*};

/// Binding strength, weakest first.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub enum Precedence {
    None,
    Assignment,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equality,
    Comparison,
    Shift,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// The level one step tighter; infix handlers parse their right operand
    /// here so equal operators associate to the left.
    pub fn next_higher(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::BitOr,
            Precedence::BitOr => Precedence::BitXor,
            Precedence::BitXor => Precedence::BitAnd,
            Precedence::BitAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Shift,
            Precedence::Shift => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

pub type StmtHandler = fn(&mut Parser) -> Result<Stmt, Error>;
/// Receives `can_assign`.
pub type PrefixHandler = fn(&mut Parser, bool) -> Result<Expr, Error>;
pub type InfixHandler = fn(&mut Parser, Expr, bool) -> Result<Expr, Error>;

#[derive(Clone, Copy)]
pub struct ParseRule {
    pub prefix: Option<PrefixHandler>,
    pub infix: Option<InfixHandler>,
    pub precedence: Precedence,
}

impl ParseRule {
    const EMPTY: ParseRule = ParseRule {
        prefix: None,
        infix: None,
        precedence: Precedence::None,
    };
}

fn rule(
    prefix: Option<PrefixHandler>,
    infix: Option<InfixHandler>,
    precedence: Precedence,
) -> ParseRule {
    ParseRule {
        prefix,
        infix,
        precedence,
    }
}

fn create_rule_lookups() -> HashMap<TokenKind, ParseRule> {
    let mut rules = HashMap::new();

    // Grouping and calls
    rules.insert(
        TokenKind::OpenParen,
        rule(
            Some(parse_grouping_expr),
            Some(parse_call_expr),
            Precedence::Call,
        ),
    );
    rules.insert(
        TokenKind::Dot,
        rule(None, Some(parse_member_expr), Precedence::Call),
    );

    // Prefix and additive
    rules.insert(
        TokenKind::Minus,
        rule(
            Some(parse_unary_expr),
            Some(parse_binary_expr),
            Precedence::Term,
        ),
    );
    rules.insert(
        TokenKind::Plus,
        rule(None, Some(parse_binary_expr), Precedence::Term),
    );
    rules.insert(
        TokenKind::Bang,
        rule(Some(parse_unary_expr), None, Precedence::None),
    );

    // Multiplicative
    for kind in [TokenKind::Star, TokenKind::Slash, TokenKind::Percent] {
        rules.insert(kind, rule(None, Some(parse_binary_expr), Precedence::Factor));
    }

    // Equality and comparison
    for kind in [TokenKind::EqualEqual, TokenKind::BangEqual] {
        rules.insert(kind, rule(None, Some(parse_binary_expr), Precedence::Equality));
    }
    for kind in [
        TokenKind::Less,
        TokenKind::LessEqual,
        TokenKind::Greater,
        TokenKind::GreaterEqual,
    ] {
        rules.insert(
            kind,
            rule(None, Some(parse_binary_expr), Precedence::Comparison),
        );
    }

    // Bitwise, C ordering: `|` weakest, shifts just above comparisons
    for (kind, precedence) in [
        (TokenKind::Pipe, Precedence::BitOr),
        (TokenKind::Caret, Precedence::BitXor),
        (TokenKind::Ampersand, Precedence::BitAnd),
        (TokenKind::ShiftLeft, Precedence::Shift),
        (TokenKind::ShiftRight, Precedence::Shift),
    ] {
        rules.insert(kind, rule(None, Some(parse_binary_expr), precedence));
    }

    // Logical
    rules.insert(
        TokenKind::And,
        rule(None, Some(parse_binary_expr), Precedence::And),
    );
    rules.insert(
        TokenKind::Or,
        rule(None, Some(parse_binary_expr), Precedence::Or),
    );

    // Literals and symbols
    rules.insert(
        TokenKind::Identifier,
        rule(Some(parse_identifier_expr), None, Precedence::None),
    );
    for kind in [
        TokenKind::IntLiteral,
        TokenKind::FloatLiteral,
        TokenKind::HexLiteral,
        TokenKind::OctalLiteral,
        TokenKind::StringLiteral,
        TokenKind::True,
        TokenKind::False,
        TokenKind::Null,
    ] {
        rules.insert(kind, rule(Some(parse_literal_expr), None, Precedence::None));
    }

    rules
}

fn create_stmt_lookups() -> HashMap<TokenKind, StmtHandler> {
    let mut statements: HashMap<TokenKind, StmtHandler> = HashMap::new();

    statements.insert(TokenKind::Var, parse_var_decl_stmt);
    statements.insert(TokenKind::Func, parse_fn_decl_stmt);
    statements.insert(TokenKind::Return, parse_return_stmt);
    statements.insert(TokenKind::Struct, parse_struct_decl_stmt);
    statements.insert(TokenKind::Impl, parse_impl_decl_stmt);
    statements.insert(TokenKind::If, parse_if_stmt);
    statements.insert(TokenKind::For, parse_loop_stmt);
    statements.insert(TokenKind::While, parse_loop_stmt);
    statements.insert(TokenKind::OpenCurly, parse_block_stmt);

    statements
}

lazy_static! {
    static ref RULE_LOOKUP: HashMap<TokenKind, ParseRule> = create_rule_lookups();
    static ref STMT_LOOKUP: HashMap<TokenKind, StmtHandler> = create_stmt_lookups();
}

/// Parse rule for `kind`; kinds without one get an empty rule.
pub fn get_rule(kind: TokenKind) -> ParseRule {
    RULE_LOOKUP.get(&kind).copied().unwrap_or(ParseRule::EMPTY)
}

pub fn get_stmt_handler(kind: TokenKind) -> Option<StmtHandler> {
    STMT_LOOKUP.get(&kind).copied()
}
