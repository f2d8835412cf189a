use crate::{
    ast::{
        ast::{Expr, ExprVisitor},
        expressions::{AssignExpr, BinaryExpr, CallExpr, LiteralExpr, UnaryExpr},
    },
    errors::errors::ErrorImpl,
    lexer::tokens::{Token, TokenKind},
};

use super::{
    backend::{Backend, FloatBinaryOp, FloatPredicate, IntBinaryOp, IntPredicate, ValueCategory},
    compiler::Compiler,
};

enum IntOperation {
    Arithmetic(IntBinaryOp),
    Compare(IntPredicate),
}

enum FloatOperation {
    Arithmetic(FloatBinaryOp),
    Compare(FloatPredicate),
}

/// Integer lowering of `kind`. Division, remainder, right shift and
/// ordering follow `unsigned`.
fn int_operation(kind: TokenKind, unsigned: bool) -> Option<IntOperation> {
    use IntOperation::{Arithmetic, Compare};

    Some(match (kind, unsigned) {
        (TokenKind::Plus, _) => Arithmetic(IntBinaryOp::Add),
        (TokenKind::Minus, _) => Arithmetic(IntBinaryOp::Sub),
        (TokenKind::Star, _) => Arithmetic(IntBinaryOp::Mul),
        (TokenKind::Slash, false) => Arithmetic(IntBinaryOp::SDiv),
        (TokenKind::Slash, true) => Arithmetic(IntBinaryOp::UDiv),
        (TokenKind::Percent, false) => Arithmetic(IntBinaryOp::SRem),
        (TokenKind::Percent, true) => Arithmetic(IntBinaryOp::URem),
        (TokenKind::And | TokenKind::Ampersand, _) => Arithmetic(IntBinaryOp::And),
        (TokenKind::Or | TokenKind::Pipe, _) => Arithmetic(IntBinaryOp::Or),
        (TokenKind::Caret, _) => Arithmetic(IntBinaryOp::Xor),
        (TokenKind::ShiftLeft, _) => Arithmetic(IntBinaryOp::Shl),
        (TokenKind::ShiftRight, false) => Arithmetic(IntBinaryOp::AShr),
        (TokenKind::ShiftRight, true) => Arithmetic(IntBinaryOp::LShr),
        (TokenKind::EqualEqual, _) => Compare(IntPredicate::Eq),
        (TokenKind::BangEqual, _) => Compare(IntPredicate::Ne),
        (TokenKind::Less, false) => Compare(IntPredicate::Slt),
        (TokenKind::Less, true) => Compare(IntPredicate::Ult),
        (TokenKind::LessEqual, false) => Compare(IntPredicate::Sle),
        (TokenKind::LessEqual, true) => Compare(IntPredicate::Ule),
        (TokenKind::Greater, false) => Compare(IntPredicate::Sgt),
        (TokenKind::Greater, true) => Compare(IntPredicate::Ugt),
        (TokenKind::GreaterEqual, false) => Compare(IntPredicate::Sge),
        (TokenKind::GreaterEqual, true) => Compare(IntPredicate::Uge),
        _ => return None,
    })
}

fn float_operation(kind: TokenKind) -> Option<FloatOperation> {
    Some(match kind {
        TokenKind::Plus => FloatOperation::Arithmetic(FloatBinaryOp::Add),
        TokenKind::Minus => FloatOperation::Arithmetic(FloatBinaryOp::Sub),
        TokenKind::Star => FloatOperation::Arithmetic(FloatBinaryOp::Mul),
        TokenKind::Slash => FloatOperation::Arithmetic(FloatBinaryOp::Div),
        TokenKind::Percent => FloatOperation::Arithmetic(FloatBinaryOp::Rem),
        TokenKind::EqualEqual => FloatOperation::Compare(FloatPredicate::Oeq),
        TokenKind::BangEqual => FloatOperation::Compare(FloatPredicate::One),
        TokenKind::Less => FloatOperation::Compare(FloatPredicate::Olt),
        TokenKind::LessEqual => FloatOperation::Compare(FloatPredicate::Ole),
        TokenKind::Greater => FloatOperation::Compare(FloatPredicate::Ogt),
        TokenKind::GreaterEqual => FloatOperation::Compare(FloatPredicate::Oge),
        _ => return None,
    })
}

impl<'c, B: Backend> Compiler<'c, B> {
    fn unsupported_operator(&mut self, operator: &Token) -> Option<B::Value> {
        self.error(
            ErrorImpl::UnsupportedOperator {
                operator: operator.value.clone(),
            },
            operator.span,
        );
        None
    }

    fn gen_integer_literal(
        &mut self,
        token: &Token,
        digits: &str,
        radix: u32,
    ) -> Option<B::Value> {
        // Hex and octal spell a bit pattern, so the full unsigned range is
        // accepted there.
        let parsed = if radix == 10 {
            digits.parse::<i64>().ok()
        } else {
            u64::from_str_radix(digits, radix)
                .ok()
                .map(|value| value as i64)
        };

        let Some(value) = parsed else {
            self.error(
                ErrorImpl::NumberParseError {
                    token: token.value.clone(),
                },
                token.span,
            );
            return None;
        };

        let ty = self.backend.int_type(64);
        Some(self.backend.const_int(&ty, value))
    }

    fn gen_float_literal(&mut self, token: &Token) -> Option<B::Value> {
        let Ok(value) = token.value.parse::<f64>() else {
            self.error(
                ErrorImpl::NumberParseError {
                    token: token.value.clone(),
                },
                token.span,
            );
            return None;
        };

        let ty = self.backend.float_type(64);
        Some(self.backend.const_float(&ty, value))
    }

    fn gen_variable(&mut self, token: &Token) -> Option<B::Value> {
        let Some(binding) = self.lookup(&token.value) else {
            self.warning(
                ErrorImpl::VariableNotDeclared {
                    variable: token.value.clone(),
                },
                token.span,
            );
            return None;
        };

        Some(
            self.backend
                .build_load(&binding.ty, &binding.pointer, &token.value),
        )
    }

    /// Address of `object.member` together with the member's type.
    fn member_pointer(
        &mut self,
        object: &LiteralExpr,
        member: &Token,
    ) -> Option<(B::Pointer, B::Type)> {
        let name = &object.token.value;
        let Some(binding) = self.lookup(name) else {
            self.warning(
                ErrorImpl::VariableNotDeclared {
                    variable: name.clone(),
                },
                object.span,
            );
            return None;
        };

        let Some(type_name) = binding.object.clone() else {
            self.error(
                ErrorImpl::NotAnObject {
                    variable: name.clone(),
                },
                object.span,
            );
            return None;
        };

        let index = self
            .user_defined_types
            .get(&type_name)
            .and_then(|info| info.members.iter().position(|(m, _)| *m == member.value));
        let Some(index) = index else {
            self.error(
                ErrorImpl::UnknownMember {
                    type_: type_name,
                    member: member.value.clone(),
                },
                member.span,
            );
            return None;
        };

        let struct_type = self.ensure_struct(&type_name);
        let field_type = self
            .backend
            .struct_field_types(&struct_type)
            .get(index)
            .cloned()?;

        let base = if binding.by_reference {
            let value = self.backend.build_load(&binding.ty, &binding.pointer, name);
            self.backend.value_as_pointer(&value)?
        } else {
            binding.pointer
        };

        let pointer = self
            .backend
            .build_field_ptr(&struct_type, &base, index as u32);
        Some((pointer, field_type))
    }

    /// `object.member` as a value.
    fn gen_member_access(&mut self, expr: &BinaryExpr) -> Option<B::Value> {
        let (Expr::Literal(object), Expr::Literal(member)) = (expr.left.as_ref(), expr.right.as_ref())
        else {
            return self.unsupported_operator(&expr.operator);
        };

        let (pointer, field_type) = self.member_pointer(object, &member.token)?;
        Some(
            self.backend
                .build_load(&field_type, &pointer, &member.token.value),
        )
    }

    /// Resolves `object.method` to the owner's function and the receiver
    /// argument passed as `self`.
    fn method_target(&mut self, expr: &BinaryExpr) -> Option<(B::Function, B::Value)> {
        let (Expr::Literal(object), Expr::Literal(method)) = (expr.left.as_ref(), expr.right.as_ref())
        else {
            self.error(ErrorImpl::NotCallable, expr.span);
            return None;
        };

        let name = &object.token.value;
        let Some(binding) = self.lookup(name) else {
            self.warning(
                ErrorImpl::VariableNotDeclared {
                    variable: name.clone(),
                },
                object.span,
            );
            return None;
        };

        let Some(type_name) = binding.object.clone() else {
            self.error(
                ErrorImpl::NotAnObject {
                    variable: name.clone(),
                },
                object.span,
            );
            return None;
        };

        let symbol = format!("{}.{}", type_name, method.token.value);
        let Some(function) = self.backend.get_function(&symbol) else {
            self.error(ErrorImpl::UnknownFunction { function: symbol }, method.span);
            return None;
        };

        let receiver = if binding.by_reference {
            self.backend.build_load(&binding.ty, &binding.pointer, name)
        } else {
            self.backend.pointer_as_value(&binding.pointer)
        };

        Some((function, receiver))
    }

    fn gen_int_binary(
        &mut self,
        operator: &Token,
        left: &B::Value,
        right: &B::Value,
        unsigned: bool,
    ) -> Option<B::Value> {
        match int_operation(operator.kind, unsigned) {
            Some(IntOperation::Arithmetic(op)) => {
                Some(self.backend.build_int_binary(op, left, right))
            }
            Some(IntOperation::Compare(predicate)) => {
                Some(self.backend.build_int_compare(predicate, left, right))
            }
            None => self.unsupported_operator(operator),
        }
    }

    fn gen_float_binary(
        &mut self,
        operator: &Token,
        left: &B::Value,
        right: &B::Value,
    ) -> Option<B::Value> {
        match float_operation(operator.kind) {
            Some(FloatOperation::Arithmetic(op)) => {
                Some(self.backend.build_float_binary(op, left, right))
            }
            Some(FloatOperation::Compare(predicate)) => {
                Some(self.backend.build_float_compare(predicate, left, right))
            }
            None => self.unsupported_operator(operator),
        }
    }
}

impl<'c, B: Backend> ExprVisitor for Compiler<'c, B> {
    type Output = Option<B::Value>;

    fn visit_literal(&mut self, expr: &LiteralExpr) -> Option<B::Value> {
        let token = &expr.token;

        match token.kind {
            TokenKind::IntLiteral => self.gen_integer_literal(token, &token.value, 10),
            TokenKind::HexLiteral => {
                self.gen_integer_literal(token, token.value.get(2..).unwrap_or_default(), 16)
            }
            TokenKind::OctalLiteral => {
                self.gen_integer_literal(token, token.value.get(2..).unwrap_or_default(), 8)
            }
            TokenKind::FloatLiteral => self.gen_float_literal(token),
            TokenKind::True => Some(self.backend.const_bool(true)),
            TokenKind::False => Some(self.backend.const_bool(false)),
            TokenKind::Null => None,
            TokenKind::Identifier => self.gen_variable(token),
            _ => {
                self.error(
                    ErrorImpl::UnsupportedLiteral {
                        token: token.value.clone(),
                    },
                    token.span,
                );
                None
            }
        }
    }

    fn visit_assign(&mut self, expr: &AssignExpr) -> Option<B::Value> {
        let Some(binding) = self.lookup(&expr.target.value) else {
            self.error(
                ErrorImpl::AssignToUnknownVariable {
                    variable: expr.target.value.clone(),
                },
                expr.target.span,
            );
            return None;
        };

        let value = self.gen_expression(&expr.value)?;
        let value = self.coerce(
            &value,
            self.is_unsigned(&expr.value),
            &binding.ty,
            binding.unsigned,
            expr.span,
        )?;
        self.backend.build_store(&binding.pointer, &value);

        Some(value)
    }

    fn visit_binary(&mut self, expr: &BinaryExpr) -> Option<B::Value> {
        if expr.operator.kind == TokenKind::Dot {
            return self.gen_member_access(expr);
        }

        let left = self.gen_expression(&expr.left);
        let right = self.gen_expression(&expr.right);
        let (left, right) = (left?, right?);

        let left_type = self.backend.type_of(&left);
        let left_category = self.backend.category(&left_type);
        let right_category = {
            let right_type = self.backend.type_of(&right);
            self.backend.category(&right_type)
        };

        let same_kind = (left_category.is_integral() && right_category.is_integral())
            || (left_category.is_float() && right_category.is_float());
        if !same_kind {
            self.error(
                ErrorImpl::OperandMismatch {
                    operator: expr.operator.value.clone(),
                    left: left_category.describe(),
                    right: right_category.describe(),
                },
                expr.operator.span,
            );
            return None;
        }

        // Width and signedness follow the left operand.
        let right = if left_category == right_category {
            right
        } else {
            let right_unsigned = self.is_unsigned(&expr.right);
            self.backend.build_cast(&right, &left_type, right_unsigned)?
        };

        if left_category.is_integral() {
            let unsigned = self.is_unsigned(&expr.left);
            self.gen_int_binary(&expr.operator, &left, &right, unsigned)
        } else {
            self.gen_float_binary(&expr.operator, &left, &right)
        }
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) -> Option<B::Value> {
        let operand = self.gen_expression(&expr.operand)?;
        let ty = self.backend.type_of(&operand);
        let category = self.backend.category(&ty);

        match expr.operator.kind {
            TokenKind::Minus if category.is_float() => {
                Some(self.backend.build_float_neg(&operand))
            }
            TokenKind::Minus if category.is_integral() => {
                Some(self.backend.build_int_neg(&operand))
            }
            TokenKind::Bang if category == ValueCategory::Bool => {
                Some(self.backend.build_not(&operand))
            }
            // `!n` on an integer is `n == 0`.
            TokenKind::Bang if category.is_integral() => {
                let zero = self.backend.const_int(&ty, 0);
                Some(
                    self.backend
                        .build_int_compare(IntPredicate::Eq, &operand, &zero),
                )
            }
            _ => self.unsupported_operator(&expr.operator),
        }
    }

    fn visit_call(&mut self, expr: &CallExpr) -> Option<B::Value> {
        let (function, mut args) = match expr.callee.as_ref() {
            Expr::Literal(callee) if callee.is_identifier() => {
                let name = &callee.token.value;
                match self.backend.get_function(name) {
                    Some(function) => (function, vec![]),
                    None => {
                        self.error(
                            ErrorImpl::UnknownFunction {
                                function: name.clone(),
                            },
                            callee.span,
                        );
                        return None;
                    }
                }
            }
            Expr::Binary(member) if member.operator.kind == TokenKind::Dot => {
                let (function, receiver) = self.method_target(member)?;
                (function, vec![receiver])
            }
            callee => {
                self.error(ErrorImpl::NotCallable, *callee.get_span());
                return None;
            }
        };

        let param_types = self.backend.function_param_types(&function);
        let declared = self
            .signatures
            .get(&self.backend.function_name(&function))
            .map(|signature| signature.parameters.clone())
            .unwrap_or_default();
        let implicit = args.len();
        let expected = param_types.len().saturating_sub(implicit);

        if expr.arguments.len() != expected {
            let name = self.backend.function_name(&function);
            self.error(
                ErrorImpl::ArgumentCountMismatch {
                    function: name,
                    expected,
                    received: expr.arguments.len(),
                },
                expr.span,
            );
            return None;
        }

        for (index, (argument, ty)) in expr
            .arguments
            .iter()
            .zip(param_types.iter().skip(implicit))
            .enumerate()
        {
            let source_unsigned = self.is_unsigned(argument);
            let target_unsigned = declared.get(index).is_some_and(|ty| ty.is_unsigned());
            let value = self.gen_expression(argument).and_then(|value| {
                self.coerce(
                    &value,
                    source_unsigned,
                    ty,
                    target_unsigned,
                    *argument.get_span(),
                )
            });
            let value = match value {
                Some(value) => value,
                None => self.backend.const_zero(ty),
            };
            args.push(value);
        }

        let result = self.backend.build_call(&function, &args);
        let return_type = self.backend.type_of(&result);

        // A single return value is handed back directly.
        if self.backend.struct_field_types(&return_type).len() == 1 {
            return Some(self.backend.build_extract_field(&result, 0));
        }

        Some(result)
    }
}
