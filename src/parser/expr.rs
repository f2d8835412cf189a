use crate::{
    ast::{
        ast::Expr,
        expressions::{AssignExpr, BinaryExpr, CallExpr, LiteralExpr, UnaryExpr},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
};

use super::{
    lookups::{get_rule, Precedence},
    parser::Parser,
};

/// Parses an expression whose operators bind at least as tightly as
/// `precedence`.
pub fn parse_expr(parser: &mut Parser, precedence: Precedence) -> Result<Expr, Error> {
    let Some(prefix) = get_rule(parser.current_token_kind()).prefix else {
        return Err(parser.error_here(ErrorImpl::ExpectedExpression {
            token: parser.current_token().value.clone(),
        }));
    };

    let can_assign = precedence <= Precedence::Assignment;
    let mut left = prefix(parser, can_assign)?;

    loop {
        let rule = get_rule(parser.current_token_kind());
        let Some(infix) = rule.infix else {
            break;
        };
        if rule.precedence < precedence {
            break;
        }

        left = infix(parser, left, can_assign)?;
    }

    // An `=` the identifier handler did not absorb has no valid target.
    if can_assign
        && (parser.check(TokenKind::Equal)
            || parser.current_token_kind().compound_base().is_some())
    {
        return Err(parser.error_here(ErrorImpl::InvalidAssignmentTarget));
    }

    Ok(left)
}

/// Entry point for a full expression, assignment included.
pub fn parse_expression(parser: &mut Parser) -> Result<Expr, Error> {
    parse_expr(parser, Precedence::Assignment)
}

pub fn parse_literal_expr(parser: &mut Parser, _can_assign: bool) -> Result<Expr, Error> {
    let token = parser.advance().clone();

    Ok(Expr::Literal(LiteralExpr {
        span: token.span,
        token,
    }))
}

/// Identifier reads, plus `name = value` and `name op= value` when an
/// assignment is allowed here.
pub fn parse_identifier_expr(parser: &mut Parser, can_assign: bool) -> Result<Expr, Error> {
    let target = parser.advance().clone();

    if can_assign && parser.match_kind(TokenKind::Equal) {
        let value = parse_expression(parser)?;
        return Ok(Expr::Assign(AssignExpr {
            span: target.span.to(value.get_span()),
            target,
            value: Box::new(value),
        }));
    }

    if let Some(base) = parser.current_token_kind().compound_base() {
        if can_assign {
            let compound = parser.advance().clone();
            let value = parse_expression(parser)?;

            // `x += e` is `x = x + e`
            let operator = Token {
                kind: base,
                value: String::from(&compound.value[..compound.value.len() - 1]),
                span: compound.span,
            };
            let span = target.span.to(value.get_span());
            let current = Expr::Literal(LiteralExpr {
                span: target.span,
                token: target.clone(),
            });

            return Ok(Expr::Assign(AssignExpr {
                target,
                value: Box::new(Expr::Binary(BinaryExpr {
                    left: Box::new(current),
                    operator,
                    right: Box::new(value),
                    span,
                })),
                span,
            }));
        }
    }

    Ok(Expr::Literal(LiteralExpr {
        span: target.span,
        token: target,
    }))
}

pub fn parse_grouping_expr(parser: &mut Parser, _can_assign: bool) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expression(parser)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_unary_expr(parser: &mut Parser, _can_assign: bool) -> Result<Expr, Error> {
    let operator = parser.advance().clone();
    let operand = parse_expr(parser, Precedence::Unary)?;

    Ok(Expr::Unary(UnaryExpr {
        span: operator.span.to(operand.get_span()),
        operator,
        operand: Box::new(operand),
    }))
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: Expr,
    _can_assign: bool,
) -> Result<Expr, Error> {
    let operator = parser.advance().clone();
    let precedence = get_rule(operator.kind).precedence;
    let right = parse_expr(parser, precedence.next_higher())?;

    Ok(Expr::Binary(BinaryExpr {
        span: left.get_span().to(right.get_span()),
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }))
}

pub fn parse_call_expr(parser: &mut Parser, callee: Expr, _can_assign: bool) -> Result<Expr, Error> {
    let paren = parser.advance().clone();

    let mut arguments = vec![];
    if !parser.check(TokenKind::CloseParen) {
        loop {
            arguments.push(parse_expression(parser)?);
            if !parser.match_kind(TokenKind::Comma) {
                break;
            }
        }
    }

    let close = parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::Call(CallExpr {
        span: callee.get_span().to(&close.span),
        callee: Box::new(callee),
        paren,
        arguments,
    }))
}

/// `object.member`, kept as a binary node on the `.` operator.
pub fn parse_member_expr(
    parser: &mut Parser,
    object: Expr,
    _can_assign: bool,
) -> Result<Expr, Error> {
    let operator = parser.advance().clone();

    let error = parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
        token: parser.current_token().value.clone(),
        message: String::from("expected member name after '.'"),
    });
    let member = parser.expect_error(TokenKind::Identifier, Some(error))?;

    Ok(Expr::Binary(BinaryExpr {
        span: object.get_span().to(&member.span),
        left: Box::new(object),
        operator,
        right: Box::new(Expr::Literal(LiteralExpr {
            span: member.span,
            token: member,
        })),
    }))
}
