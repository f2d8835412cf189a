//! Type name parsing.
//!
//! A type position accepts a primitive type keyword or a user type name.
//! Identifiers are taken as user type names too, so a parameter may name a
//! struct the lexer has not seen declared yet.

use crate::{
    ast::types::{PrimitiveType, TypeName},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

/// Whether the current token can start a type.
pub fn at_type(parser: &Parser) -> bool {
    parser.current_token_kind().is_type_name()
}

pub fn parse_type(parser: &mut Parser) -> Result<TypeName, Error> {
    let kind = parser.current_token_kind();

    if let Some(primitive) = PrimitiveType::from_token_kind(kind) {
        parser.advance();
        return Ok(TypeName::Primitive(primitive));
    }

    match kind {
        TokenKind::ObjectType | TokenKind::Identifier => {
            Ok(TypeName::Object(parser.advance().value.clone()))
        }
        _ => Err(parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: String::from("expected a type"),
        })),
    }
}

/// `( [type {, type}] )`
pub fn parse_type_list(parser: &mut Parser) -> Result<Vec<TypeName>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut types = vec![];
    if !parser.check(TokenKind::CloseParen) {
        loop {
            types.push(parse_type(parser)?);
            if !parser.match_kind(TokenKind::Comma) {
                break;
            }
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(types)
}
