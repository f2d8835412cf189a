use crate::{
    ast::{
        ast::Stmt,
        statements::{
            BlockStmt, ExpressionStmt, FunctionStmt, IfStmt, ImplDeclStmt, LoopStmt,
            PrototypeStmt, ReturnStmt, StructDeclStmt, VarDeclStmt,
        },
        types::TypeName,
    },
    errors::errors::{Error, ErrorImpl, Severity},
    lexer::tokens::TokenKind,
};

use super::{
    expr::parse_expression,
    lookups::get_stmt_handler,
    parser::Parser,
    types::{at_type, parse_type, parse_type_list},
};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(handler) = get_stmt_handler(parser.current_token_kind()) {
        return handler(parser);
    }

    // A bare `;` does nothing.
    if parser.check(TokenKind::Semicolon) {
        let span = parser.advance().span;
        return Ok(Stmt::Block(BlockStmt { body: vec![], span }));
    }

    let expression = parse_expression(parser)?;
    let end = parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Expression(ExpressionStmt {
        span: expression.get_span().to(&end.span),
        expression,
    }))
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span;

    let error = parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
        token: parser.current_token().value.clone(),
        message: String::from("expected identifier during variable declaration"),
    });
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?;

    let declared_type = if at_type(parser) {
        Some(parse_type(parser)?)
    } else {
        None
    };

    let initializer = if parser.match_kind(TokenKind::Equal) {
        Some(parse_expression(parser)?)
    } else {
        None
    };

    if declared_type.is_none() && initializer.is_none() && parser.check(TokenKind::Semicolon) {
        return Err(parser.error_here(ErrorImpl::MissingTypeOrInitializer {
            variable: name.value,
        }));
    }

    let end = parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::VarDecl(VarDeclStmt {
        name: name.value,
        declared_type,
        initializer,
        span: start.to(&end.span),
    }))
}

pub fn parse_block(parser: &mut Parser) -> Result<BlockStmt, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span;

    let body = parser.within_block(|parser| {
        let mut body = vec![];
        while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
            if parser.match_kind(TokenKind::Semicolon) {
                continue;
            }
            if let Some(stmt) = parser.recovering(parse_stmt) {
                body.push(stmt);
            }
        }
        body
    });

    let end = parser.expect(TokenKind::CloseCurly)?;

    Ok(BlockStmt {
        body,
        span: start.to(&end.span),
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Block(parse_block(parser)?))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span;

    let condition = parse_expression(parser)?;
    let then_branch = parse_stmt(parser)?;

    let else_branch = if parser.match_kind(TokenKind::Else) {
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt::If(IfStmt {
        condition,
        then_branch: Box::new(then_branch),
        else_branch,
        span: start.to(&parser.previous_span()),
    }))
}

/// `for cond body` and `while cond body`.
pub fn parse_loop_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span;

    let condition = parse_expression(parser)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::Loop(LoopStmt {
        condition,
        body: Box::new(body),
        span: start.to(&parser.previous_span()),
    }))
}

/// `(type name, [type] name, ...)`; a name without a type reuses the
/// previous parameter's type.
fn parse_parameters(parser: &mut Parser) -> Result<Vec<(String, TypeName)>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters: Vec<(String, TypeName)> = vec![];
    let mut current_type: Option<TypeName> = None;

    if !parser.check(TokenKind::CloseParen) {
        loop {
            let names_type = at_type(parser)
                || (parser.check(TokenKind::Identifier)
                    && parser.peek_kind() == TokenKind::Identifier);
            if names_type {
                current_type = Some(parse_type(parser)?);
            }

            let Some(type_name) = current_type.clone() else {
                return Err(parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("expected parameter type"),
                }));
            };

            let error = parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected parameter name"),
            });
            let name = parser.expect_error(TokenKind::Identifier, Some(error))?;

            if parameters.iter().any(|(existing, _)| *existing == name.value) {
                return Err(Error::new(
                    ErrorImpl::DuplicateParameter {
                        parameter: name.value,
                    },
                    name.span,
                    Severity::Error,
                ));
            }

            parameters.push((name.value, type_name));

            if !parser.match_kind(TokenKind::Comma) {
                break;
            }
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(parameters)
}

pub fn parse_function(parser: &mut Parser) -> Result<FunctionStmt, Error> {
    let start = parser.expect(TokenKind::Func)?.span;

    let error = parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
        token: parser.current_token().value.clone(),
        message: String::from("expected function name"),
    });
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?;

    let parameters = parse_parameters(parser)?;
    let return_types = if parser.check(TokenKind::OpenParen) {
        parse_type_list(parser)?
    } else {
        vec![]
    };
    let signature_end = parser.previous_span();

    let body = if parser.match_kind(TokenKind::Semicolon) {
        None
    } else {
        Some(parse_block(parser)?)
    };

    let prototype = PrototypeStmt {
        name: name.value,
        owner_type_name: parser.impl_owner().cloned(),
        parameters,
        return_types,
        is_declaration_only: body.is_none(),
        span: start.to(&signature_end),
    };

    Ok(FunctionStmt {
        prototype,
        body,
        span: start.to(&parser.previous_span()),
    })
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Function(parse_function(parser)?))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span;

    let mut expressions = vec![];
    if !parser.check(TokenKind::Semicolon) {
        loop {
            expressions.push(parse_expression(parser)?);
            if !parser.match_kind(TokenKind::Comma) {
                break;
            }
        }
    }

    let end = parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Return(ReturnStmt {
        expressions,
        span: start.to(&end.span),
    }))
}

/// `var name type;` inside a struct body. The type is mandatory.
fn parse_struct_member(parser: &mut Parser) -> Result<VarDeclStmt, Error> {
    let start = parser.expect(TokenKind::Var)?.span;

    let error = parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
        token: parser.current_token().value.clone(),
        message: String::from("expected member name"),
    });
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?;

    if !at_type(parser) {
        return Err(parser.error_here(ErrorImpl::MissingMemberType { member: name.value }));
    }
    let declared_type = parse_type(parser)?;

    let end = parser.expect(TokenKind::Semicolon)?;

    Ok(VarDeclStmt {
        name: name.value,
        declared_type: Some(declared_type),
        initializer: None,
        span: start.to(&end.span),
    })
}

pub fn parse_struct_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span;

    let error = parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
        token: parser.current_token().value.clone(),
        message: String::from("expected struct name"),
    });
    let name = parser.expect_error(TokenKind::ObjectType, Some(error))?;

    parser.expect(TokenKind::OpenCurly)?;

    let members = parser.within_block(|parser| {
        let mut members = vec![];
        while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
            if let Some(member) = parser.recovering(parse_struct_member) {
                members.push(member);
            }
        }
        members
    });

    let end = parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::StructDecl(StructDeclStmt {
        name: name.value,
        members,
        span: start.to(&end.span),
    }))
}

pub fn parse_impl_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span;

    let error = parser.error_here(ErrorImpl::UnexpectedTokenDetailed {
        token: parser.current_token().value.clone(),
        message: String::from("expected type name after impl"),
    });
    let type_name = parser.expect_error(TokenKind::ObjectType, Some(error))?;

    parser.expect(TokenKind::OpenCurly)?;

    let member_functions = parser.with_impl_owner(type_name.value.clone(), |parser| {
        parser.within_block(|parser| {
            let mut functions = vec![];
            while !parser.check(TokenKind::CloseCurly) && parser.has_tokens() {
                if parser.match_kind(TokenKind::Semicolon) {
                    continue;
                }

                let Some(function) = parser.recovering(parse_function) else {
                    continue;
                };

                if function.body.is_none() {
                    parser.report(Error::new(
                        ErrorImpl::MethodWithoutBody {
                            function: function.prototype.name,
                        },
                        function.span,
                        Severity::Error,
                    ));
                    continue;
                }

                functions.push(function);
            }
            functions
        })
    });

    let end = parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::ImplDecl(ImplDeclStmt {
        type_name: type_name.value,
        member_functions,
        span: start.to(&end.span),
    }))
}
