use crate::{
    ast::{
        ast::{Expr, StmtVisitor},
        statements::{
            BlockStmt, ExpressionStmt, FunctionStmt, IfStmt, ImplDeclStmt, LoopStmt,
            PrototypeStmt, ReturnStmt, StructDeclStmt, VarDeclStmt,
        },
        types::TypeName,
    },
    errors::errors::ErrorImpl,
};

use super::{
    backend::{Backend, FloatPredicate, IntPredicate, ValueCategory},
    compiler::{Binding, Compiler},
    scope::Scope,
};

impl<'c, B: Backend> Compiler<'c, B> {
    /// Visits the statements of `block` in order. Once the current block
    /// has a terminator the rest are reported and skipped.
    pub(super) fn gen_block(&mut self, block: &BlockStmt) {
        for stmt in block.iter() {
            if self.backend.current_block_terminated() {
                self.warning(ErrorImpl::UnreachableCode, *stmt.get_span());
                break;
            }
            self.gen_statement(stmt);
        }
    }

    /// Evaluates a branch condition down to a boolean. Integers and floats
    /// are true when non-zero.
    fn gen_condition(&mut self, condition: &Expr) -> Option<B::Value> {
        let value = self.gen_expression(condition)?;
        let ty = self.backend.type_of(&value);

        match self.backend.category(&ty) {
            ValueCategory::Bool => Some(value),
            ValueCategory::Integer(_) => {
                let zero = self.backend.const_int(&ty, 0);
                Some(
                    self.backend
                        .build_int_compare(IntPredicate::Ne, &value, &zero),
                )
            }
            ValueCategory::Float32 | ValueCategory::Float64 => {
                let zero = self.backend.const_float(&ty, 0.0);
                Some(
                    self.backend
                        .build_float_compare(FloatPredicate::One, &value, &zero),
                )
            }
            category => {
                self.error(
                    ErrorImpl::OperandMismatch {
                        operator: String::from("condition"),
                        left: String::from("bool"),
                        right: category.describe(),
                    },
                    *condition.get_span(),
                );
                None
            }
        }
    }

    /// Evaluates the initializer of a declaration. A missing value with no
    /// declared type to fall back on is reported unless evaluating the
    /// initializer already reported something.
    fn gen_initializer(&mut self, stmt: &VarDeclStmt) -> Option<B::Value> {
        let initializer = stmt.initializer.as_ref()?;

        let reported = self.reported();
        let value = self.gen_expression(initializer);

        if value.is_none() && stmt.declared_type.is_none() && self.reported() == reported {
            self.error(ErrorImpl::NullValue, *initializer.get_span());
        }

        value
    }

    /// Stores `value` converted to `ty`, or zero when there is nothing
    /// usable to store.
    fn store_initial(
        &mut self,
        pointer: &B::Pointer,
        ty: &B::Type,
        value: Option<B::Value>,
        stmt: &VarDeclStmt,
    ) {
        let source_unsigned = self.initializer_unsigned(stmt);
        let target_unsigned = self.declared_unsigned(stmt);
        let converted = value.and_then(|value| {
            self.coerce(&value, source_unsigned, ty, target_unsigned, stmt.span)
        });
        let stored = match converted {
            Some(value) => value,
            None => self.backend.const_zero(ty),
        };

        self.backend.build_store(pointer, &stored);
    }

    fn initializer_unsigned(&self, stmt: &VarDeclStmt) -> bool {
        stmt.initializer
            .as_ref()
            .is_some_and(|initializer| self.is_unsigned(initializer))
    }

    /// Untyped declarations take the signedness of their initializer.
    fn declared_unsigned(&self, stmt: &VarDeclStmt) -> bool {
        match &stmt.declared_type {
            Some(type_name) => type_name.is_unsigned(),
            None => self.initializer_unsigned(stmt),
        }
    }

    fn object_of(&self, stmt: &VarDeclStmt, ty: &B::Type) -> Option<String> {
        match &stmt.declared_type {
            Some(TypeName::Object(name)) => Some(name.clone()),
            _ => self.object_name(ty),
        }
    }

    fn gen_local(&mut self, stmt: &VarDeclStmt) {
        let value = self.gen_initializer(stmt);

        let ty = match (&stmt.declared_type, &value) {
            (Some(type_name), _) => self.resolve_type(type_name),
            (None, Some(value)) => self.backend.type_of(value),
            (None, None) => return,
        };

        let pointer = self.backend.build_alloca(&ty, &stmt.name);
        self.store_initial(&pointer, &ty, value, stmt);

        let object = self.object_of(stmt, &ty);
        let unsigned = self.declared_unsigned(stmt);
        self.named_values.insert(
            stmt.name.clone(),
            Binding {
                pointer,
                ty,
                object,
                by_reference: false,
                unsigned,
            },
        );
    }

    /// Untyped globals take their type from the initializer's category;
    /// every integer becomes 64 bits wide.
    fn inferred_global_type(&mut self, value: &B::Value) -> B::Type {
        let ty = self.backend.type_of(value);

        match self.backend.category(&ty) {
            ValueCategory::Integer(_) => self.backend.int_type(64),
            ValueCategory::Bool => self.backend.bool_type(),
            ValueCategory::Float32 => self.backend.float_type(32),
            ValueCategory::Float64 => self.backend.float_type(64),
            ValueCategory::Pointer | ValueCategory::Aggregate => ty,
        }
    }

    fn gen_global(&mut self, stmt: &VarDeclStmt) {
        if self.globals.contains_key(&stmt.name) {
            self.error(
                ErrorImpl::GlobalRedeclared {
                    variable: stmt.name.clone(),
                },
                stmt.span,
            );
            return;
        }

        let value = self.gen_initializer(stmt);

        let ty = match (&stmt.declared_type, &value) {
            (Some(type_name), _) => self.resolve_type(type_name),
            (None, Some(value)) => self.inferred_global_type(value),
            (None, None) => return,
        };

        let zero = self.backend.const_zero(&ty);
        let pointer = self.backend.add_global(&stmt.name, &ty, &zero);
        if value.is_some() {
            self.store_initial(&pointer, &ty, value, stmt);
        }

        let object = self.object_of(stmt, &ty);
        let unsigned = self.declared_unsigned(stmt);
        self.globals.insert(
            stmt.name.clone(),
            Binding {
                pointer,
                ty,
                object,
                by_reference: false,
                unsigned,
            },
        );
    }

    /// Gives every formal argument its own stack slot so it can be
    /// assigned like any local.
    fn bind_parameters(&mut self, prototype: &PrototypeStmt, function: &B::Function) {
        let mut names: Vec<(String, Option<String>, bool, bool)> = vec![];
        if let Some(owner) = &prototype.owner_type_name {
            names.push((String::from("self"), Some(owner.clone()), true, false));
        }
        for (name, type_name) in prototype.parameters.iter() {
            let object = match type_name {
                TypeName::Object(object) => Some(object.clone()),
                TypeName::Primitive(_) => None,
            };
            names.push((name.clone(), object, false, type_name.is_unsigned()));
        }

        let values = self.backend.function_params(function);
        let types = self.backend.function_param_types(function);

        for ((name, object, by_reference, unsigned), (value, ty)) in
            names.into_iter().zip(values.iter().zip(types.into_iter()))
        {
            let pointer = self.backend.build_alloca(&ty, &name);
            self.backend.build_store(&pointer, value);
            self.named_values.insert(
                name,
                Binding {
                    pointer,
                    ty,
                    object,
                    by_reference,
                    unsigned,
                },
            );
        }
    }
}

impl<'c, B: Backend> StmtVisitor for Compiler<'c, B> {
    type Output = ();

    fn visit_var_decl(&mut self, stmt: &VarDeclStmt) {
        if stmt.declared_type.is_none() && stmt.initializer.is_none() {
            self.error(
                ErrorImpl::MissingTypeOrInitializer {
                    variable: stmt.name.clone(),
                },
                stmt.span,
            );
            return;
        }

        // Storage needs a laid out struct; `impl` alone only names it. A
        // declared struct that couldn't be laid out was reported already.
        if let Some(TypeName::Object(name)) = &stmt.declared_type {
            let info = self.user_defined_types.get(name);
            if !info.is_some_and(|info| info.defined) {
                if !info.is_some_and(|info| info.declared_at.is_some()) {
                    self.error(ErrorImpl::UnknownType { type_: name.clone() }, stmt.span);
                }
                return;
            }
        }

        if self.scope() == Scope::Function {
            self.gen_local(stmt);
        } else {
            self.gen_global(stmt);
        }
    }

    fn visit_expression(&mut self, stmt: &ExpressionStmt) {
        self.gen_expression(&stmt.expression);
    }

    fn visit_if(&mut self, stmt: &IfStmt) {
        let Some(function) = self.current_function.clone() else {
            return;
        };
        let Some(condition) = self.gen_condition(&stmt.condition) else {
            return;
        };

        let then_block = self.backend.append_block(&function, "then");
        let else_block = match stmt.else_branch {
            Some(_) => Some(self.backend.append_block(&function, "else")),
            None => None,
        };
        let merge_block = self.backend.append_block(&function, "ifcont");

        self.backend.build_cond_branch(
            &condition,
            &then_block,
            else_block.as_ref().unwrap_or(&merge_block),
        );

        self.backend.position_at_end(&then_block);
        self.gen_statement(&stmt.then_branch);
        if !self.backend.current_block_terminated() {
            self.backend.build_branch(&merge_block);
        }

        if let (Some(else_branch), Some(else_block)) = (&stmt.else_branch, &else_block) {
            self.backend.position_at_end(else_block);
            self.gen_statement(else_branch);
            if !self.backend.current_block_terminated() {
                self.backend.build_branch(&merge_block);
            }
        }

        self.backend.position_at_end(&merge_block);
    }

    fn visit_loop(&mut self, stmt: &LoopStmt) {
        let Some(function) = self.current_function.clone() else {
            return;
        };

        let condition_block = self.backend.append_block(&function, "loop.cond");
        let body_block = self.backend.append_block(&function, "loop.body");
        let exit_block = self.backend.append_block(&function, "loop.exit");

        self.backend.build_branch(&condition_block);
        self.backend.position_at_end(&condition_block);
        match self.gen_condition(&stmt.condition) {
            Some(condition) => {
                self.backend
                    .build_cond_branch(&condition, &body_block, &exit_block)
            }
            None => self.backend.build_branch(&exit_block),
        }

        self.backend.position_at_end(&body_block);
        self.gen_statement(&stmt.body);
        if !self.backend.current_block_terminated() {
            self.backend.build_branch(&condition_block);
        }

        self.backend.position_at_end(&exit_block);
    }

    fn visit_prototype(&mut self, stmt: &PrototypeStmt) {
        self.declare_prototype(stmt);
    }

    fn visit_function(&mut self, stmt: &FunctionStmt) {
        let function = self.declare_prototype(&stmt.prototype);

        let Some(body) = &stmt.body else {
            return;
        };

        if self.backend.function_has_body(&function) {
            self.error(
                ErrorImpl::FunctionAlreadyDefined {
                    function: stmt.prototype.symbol_name(),
                },
                stmt.prototype.span,
            );
            return;
        }

        let saved_block = self.backend.insert_block();
        let saved_function = self.current_function.replace(function.clone());
        let saved_values = std::mem::take(&mut self.named_values);

        {
            let mut this = self.enter_scope(Scope::Function);

            let entry = this.backend.append_block(&function, "entry");
            this.backend.position_at_end(&entry);

            this.bind_parameters(&stmt.prototype, &function);
            this.gen_block(body);
            this.return_default(&function);
            this.verify(&function, stmt.span);
        }

        self.named_values = saved_values;
        self.current_function = saved_function;
        if let Some(block) = saved_block {
            self.backend.position_at_end(&block);
        }
    }

    fn visit_block(&mut self, stmt: &BlockStmt) {
        self.gen_block(stmt);
    }

    fn visit_return(&mut self, stmt: &ReturnStmt) {
        let function = match self.current_function.clone() {
            Some(function) if self.in_function() => function,
            _ => {
                self.error(ErrorImpl::ReturnOutsideFunction, stmt.span);
                return;
            }
        };

        let return_type = self.backend.function_return_type(&function);
        let fields = self.backend.struct_field_types(&return_type);
        let declared = self
            .signatures
            .get(&self.backend.function_name(&function))
            .map(|signature| signature.returns.clone())
            .unwrap_or_default();

        if stmt.expressions.len() != fields.len() {
            self.error(
                ErrorImpl::ReturnArityMismatch {
                    expected: fields.len(),
                    received: stmt.expressions.len(),
                },
                stmt.span,
            );
        }

        let slot = self.backend.build_alloca(&return_type, "retval");
        let zero = self.backend.const_zero(&return_type);
        self.backend.build_store(&slot, &zero);

        // Missing values stay zero; extra ones are evaluated but dropped.
        for (index, expression) in stmt.expressions.iter().enumerate() {
            let Some(value) = self.gen_expression(expression) else {
                continue;
            };
            let Some(field_type) = fields.get(index) else {
                continue;
            };
            let target_unsigned = declared.get(index).is_some_and(|ty| ty.is_unsigned());
            let Some(value) = self.coerce(
                &value,
                self.is_unsigned(expression),
                field_type,
                target_unsigned,
                *expression.get_span(),
            ) else {
                continue;
            };

            let field = self
                .backend
                .build_field_ptr(&return_type, &slot, index as u32);
            self.backend.build_store(&field, &value);
        }

        let aggregate = self.backend.build_load(&return_type, &slot, "ret");
        self.backend.build_return(&aggregate);
    }

    fn visit_struct_decl(&mut self, stmt: &StructDeclStmt) {
        let mut this = self.enter_scope(Scope::StructBody);

        let declared_at = this
            .user_defined_types
            .get(&stmt.name)
            .and_then(|info| info.declared_at);

        match declared_at {
            // Top level structs are laid out ahead of the pass.
            Some(span) if span == stmt.span => {}
            Some(_) => this.error(
                ErrorImpl::StructAlreadyDefined {
                    name: stmt.name.clone(),
                },
                stmt.span,
            ),
            None => {
                this.declare_struct(stmt);
                this.lay_out_struct(stmt);
            }
        }
    }

    fn visit_impl_decl(&mut self, stmt: &ImplDeclStmt) {
        let mut this = self.enter_scope(Scope::Impl);

        this.ensure_struct(&stmt.type_name);
        for function in stmt.member_functions.iter() {
            this.visit_function(function);
        }
    }
}
