//! Main compiler module.
//!
//! This module contains the core Compiler structure: the symbol tables, the
//! struct type registry and the helpers shared by the statement and
//! expression visitors. Instructions are handed to a `Backend`.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Expr, Stmt},
        expressions::BinaryExpr,
        statements::{PrototypeStmt, StructDeclStmt},
        types::{PrimitiveType, TypeName},
    },
    errors::errors::ErrorImpl,
    lexer::tokens::TokenKind,
    CompilerContext, Span,
};

use super::{
    backend::{Backend, ValueCategory},
    scope::Scope,
};

/// Name of the function holding top level statements.
pub const MODULE_INIT: &str = "__module_init";

/// Storage a name resolves to.
#[derive(Debug)]
pub struct Binding<B: Backend> {
    pub pointer: B::Pointer,
    /// Type of the value stored behind `pointer`.
    pub ty: B::Type,
    /// Struct name when the binding holds (or points to) a struct.
    pub object: Option<String>,
    /// The stored value is itself a pointer to the struct, as with `self`.
    pub by_reference: bool,
    /// Integer arithmetic on the stored value is unsigned.
    pub unsigned: bool,
}

impl<B: Backend> Clone for Binding<B> {
    fn clone(&self) -> Self {
        Binding {
            pointer: self.pointer.clone(),
            ty: self.ty.clone(),
            object: self.object.clone(),
            by_reference: self.by_reference,
            unsigned: self.unsigned,
        }
    }
}

/// A user defined aggregate known to the compiler.
#[derive(Debug)]
pub struct StructInfo<B: Backend> {
    pub ty: B::Type,
    /// Member names and datatypes in field order. Until the struct is laid
    /// out these are the typed members as declared.
    pub members: Vec<(String, TypeName)>,
    /// The `struct` declaration that owns this name.
    pub declared_at: Option<Span>,
    /// Set once the fields have been handed to the backend.
    pub defined: bool,
}

/// Declared datatypes of a callable, `self` excluded.
#[derive(Debug, Clone)]
pub struct Signature {
    pub parameters: Vec<TypeName>,
    pub returns: Vec<TypeName>,
}

/// The code generator.
///
/// This structure holds everything that lives for one compilation pass:
/// - The backend receiving instructions
/// - The context used for diagnostics
/// - The scope stack
/// - Local, global and type symbol tables
///
/// # Type Parameters
///
/// * `'c` - Lifetime of the borrowed compiler context
/// * `B` - The backend instructions are emitted to
pub struct Compiler<'c, B: Backend> {
    pub backend: B,
    pub(super) context: &'c mut CompilerContext,
    pub(super) scopes: Vec<Scope>,

    /// Locals of the function being generated
    pub(super) named_values: HashMap<String, Binding<B>>,
    /// Module level storage
    pub(super) globals: HashMap<String, Binding<B>>,
    pub(super) user_defined_types: HashMap<String, StructInfo<B>>,
    /// Declared datatypes per function symbol
    pub(super) signatures: HashMap<String, Signature>,

    /// Function instructions are currently emitted into
    pub(super) current_function: Option<B::Function>,
}

impl<'c, B: Backend> Compiler<'c, B> {
    pub fn new(context: &'c mut CompilerContext, backend: B) -> Self {
        Compiler {
            backend,
            context,
            scopes: vec![Scope::Global],
            named_values: HashMap::new(),
            globals: HashMap::new(),
            user_defined_types: HashMap::new(),
            signatures: HashMap::new(),
            current_function: None,
        }
    }

    pub fn gen_statement(&mut self, stmt: &Stmt) {
        stmt.accept(self)
    }

    /// Generates `expr`, returning `None` when it has no value.
    pub fn gen_expression(&mut self, expr: &Expr) -> Option<B::Value> {
        expr.accept(self)
    }

    pub(super) fn warning(&mut self, kind: ErrorImpl, span: Span) {
        self.context.diagnostics.warning(kind, span);
    }

    pub(super) fn error(&mut self, kind: ErrorImpl, span: Span) {
        self.context.diagnostics.error(kind, span);
    }

    pub(super) fn reported(&self) -> usize {
        self.context.diagnostics.len()
    }

    /// Looks `name` up among the locals first, then the globals.
    pub fn lookup(&self, name: &str) -> Option<Binding<B>> {
        self.named_values
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
    }

    /// Returns the handle for struct `name`, registering an empty
    /// placeholder the first time the name is seen.
    pub fn ensure_struct(&mut self, name: &str) -> B::Type {
        if let Some(info) = self.user_defined_types.get(name) {
            return info.ty.clone();
        }

        let ty = self.backend.named_struct(name);
        self.user_defined_types.insert(
            String::from(name),
            StructInfo {
                ty: ty.clone(),
                members: vec![],
                declared_at: None,
                defined: false,
            },
        );
        ty
    }

    /// Name of the struct whose handle is `ty`, if any.
    pub fn object_name(&self, ty: &B::Type) -> Option<String> {
        self.user_defined_types
            .iter()
            .find(|(_, info)| info.ty == *ty)
            .map(|(name, _)| name.clone())
    }

    /// Converts a declared datatype to a backend type.
    ///
    /// # Arguments
    ///
    /// * `type_name` - The datatype as written in the source
    ///
    /// # Returns
    ///
    /// The backend type; struct names resolve through the registry.
    pub fn resolve_type(&mut self, type_name: &TypeName) -> B::Type {
        match type_name {
            TypeName::Primitive(PrimitiveType::Bool) => self.backend.bool_type(),
            TypeName::Primitive(primitive) if primitive.is_float() => {
                self.backend.float_type(primitive.bits())
            }
            TypeName::Primitive(primitive) => self.backend.int_type(primitive.bits()),
            TypeName::Object(name) => self.ensure_struct(name),
        }
    }

    /// Converts `value` to `target` for a store, call or return.
    ///
    /// Scalars convert freely between each other; anything else must
    /// already have the target type. Integers widen by their source's
    /// signedness, floats become integers by the target's. A failed
    /// conversion is reported at `span`.
    pub fn coerce(
        &mut self,
        value: &B::Value,
        source_unsigned: bool,
        target: &B::Type,
        target_unsigned: bool,
        span: Span,
    ) -> Option<B::Value> {
        let source = self.backend.type_of(value);
        if source == *target {
            return Some(value.clone());
        }

        let from = self.backend.category(&source);
        let to = self.backend.category(target);
        let scalar = |category: &ValueCategory| category.is_integral() || category.is_float();

        if scalar(&from) && scalar(&to) {
            let unsigned = if from.is_integral() {
                source_unsigned
            } else {
                target_unsigned
            };
            if let Some(converted) = self.backend.build_cast(value, target, unsigned) {
                return Some(converted);
            }
        }

        self.error(
            ErrorImpl::OperandMismatch {
                operator: String::from("="),
                left: to.describe(),
                right: from.describe(),
            },
            span,
        );
        None
    }

    /// Declares the callable for `prototype` unless it already exists.
    ///
    /// Functions declared inside an `impl` block take a pointer to their
    /// owner as an implicit first parameter named `self`.
    pub fn declare_prototype(&mut self, prototype: &PrototypeStmt) -> B::Function {
        let symbol = prototype.symbol_name();
        if let Some(function) = self.backend.get_function(&symbol) {
            return function;
        }

        self.signatures.insert(
            symbol.clone(),
            Signature {
                parameters: prototype
                    .parameters
                    .iter()
                    .map(|(_, type_name)| type_name.clone())
                    .collect(),
                returns: prototype.return_types.clone(),
            },
        );

        let return_types = prototype
            .return_types
            .iter()
            .map(|type_name| self.resolve_type(type_name))
            .collect::<Vec<B::Type>>();
        let return_type = self.backend.tuple_type(&return_types);

        let mut params = vec![];
        if let Some(owner) = &prototype.owner_type_name {
            let owner_type = self.ensure_struct(owner);
            params.push((String::from("self"), self.backend.pointer_type(&owner_type)));
        }
        for (name, type_name) in prototype.parameters.iter() {
            params.push((name.clone(), self.resolve_type(type_name)));
        }

        trace!(function = %symbol, params = params.len(), "declaring function");
        self.backend.declare_function(&symbol, &return_type, &params)
    }

    /// Declares every top level function up front so calls may precede
    /// definitions.
    fn hoist_prototypes(&mut self, program: &[Stmt]) {
        for stmt in program.iter() {
            match stmt {
                Stmt::Function(function) => {
                    self.declare_prototype(&function.prototype);
                }
                Stmt::Prototype(prototype) => {
                    self.declare_prototype(prototype);
                }
                Stmt::ImplDecl(impl_decl) => {
                    for function in impl_decl.member_functions.iter() {
                        self.declare_prototype(&function.prototype);
                    }
                }
                _ => {}
            }
        }
    }

    /// Registers `stmt` as the declaration of its struct, recording the
    /// typed members. Returns `false` when another declaration already owns
    /// the name.
    pub(super) fn declare_struct(&mut self, stmt: &StructDeclStmt) -> bool {
        self.ensure_struct(&stmt.name);
        let Some(info) = self.user_defined_types.get_mut(&stmt.name) else {
            return false;
        };
        if info.declared_at.is_some() {
            return false;
        }

        info.declared_at = Some(stmt.span);
        info.members = stmt
            .members
            .iter()
            .filter_map(|member| {
                let type_name = member.declared_type.clone()?;
                Some((member.name.clone(), type_name))
            })
            .collect();
        true
    }

    /// Struct names held by value in the members of `name`.
    fn by_value_members(&self, name: &str) -> Vec<String> {
        self.user_defined_types
            .get(name)
            .map(|info| {
                info.members
                    .iter()
                    .filter_map(|(_, type_name)| match type_name {
                        TypeName::Object(object) => Some(object.clone()),
                        TypeName::Primitive(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether struct `name` reaches itself through by-value members.
    pub fn contains_itself(&self, name: &str) -> bool {
        let mut pending = self.by_value_members(name);
        let mut seen = HashSet::new();

        while let Some(next) = pending.pop() {
            if next == name {
                return true;
            }
            if seen.insert(next.clone()) {
                pending.extend(self.by_value_members(&next));
            }
        }

        false
    }

    /// Hands the fields of a declared struct to the backend.
    ///
    /// A struct containing itself is reported and left opaque. Members
    /// naming an undeclared struct are reported and dropped; members
    /// holding such an opaque struct are dropped too.
    pub(super) fn lay_out_struct(&mut self, stmt: &StructDeclStmt) {
        if self.contains_itself(&stmt.name) {
            self.error(
                ErrorImpl::RecursiveStruct {
                    name: stmt.name.clone(),
                },
                stmt.span,
            );
            return;
        }

        let ty = self.ensure_struct(&stmt.name);

        let mut members = vec![];
        let mut field_types = vec![];
        for member in stmt.members.iter() {
            let Some(type_name) = &member.declared_type else {
                self.error(
                    ErrorImpl::MissingMemberType {
                        member: member.name.clone(),
                    },
                    member.span,
                );
                continue;
            };

            if let TypeName::Object(object) = type_name {
                let declared = self
                    .user_defined_types
                    .get(object)
                    .is_some_and(|info| info.declared_at.is_some());
                if !declared {
                    self.error(
                        ErrorImpl::UnknownType {
                            type_: object.clone(),
                        },
                        member.span,
                    );
                    continue;
                }
                if self.contains_itself(object) {
                    continue;
                }
            }

            field_types.push(self.resolve_type(type_name));
            members.push((member.name.clone(), type_name.clone()));
        }

        self.backend.set_struct_body(&ty, &field_types);
        if let Some(info) = self.user_defined_types.get_mut(&stmt.name) {
            info.members = members;
            info.defined = true;
        }
    }

    /// Lays out every top level struct before the pass, so storage may name
    /// a struct declared further down.
    fn hoist_structs(&mut self, program: &[Stmt]) {
        let mut this = self.enter_scope(Scope::StructBody);

        let declared = program
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::StructDecl(struct_decl) => Some(struct_decl),
                _ => None,
            })
            .filter(|struct_decl| this.declare_struct(struct_decl))
            .collect::<Vec<&StructDeclStmt>>();

        for struct_decl in declared {
            this.lay_out_struct(struct_decl);
        }
    }

    /// Declared datatype of `object.member`.
    pub(super) fn member_type_name(&self, expr: &BinaryExpr) -> Option<TypeName> {
        let (Expr::Literal(object), Expr::Literal(member)) = (expr.left.as_ref(), expr.right.as_ref())
        else {
            return None;
        };

        let type_name = self.lookup(&object.token.value)?.object?;
        self.user_defined_types
            .get(&type_name)?
            .members
            .iter()
            .find(|(name, _)| *name == member.token.value)
            .map(|(_, member_type)| member_type.clone())
    }

    /// Symbol of the function `callee` names, methods included.
    pub(super) fn callee_symbol(&self, callee: &Expr) -> Option<String> {
        match callee {
            Expr::Literal(literal) if literal.is_identifier() => Some(literal.token.value.clone()),
            Expr::Binary(member) if member.operator.kind == TokenKind::Dot => {
                let (Expr::Literal(object), Expr::Literal(method)) =
                    (member.left.as_ref(), member.right.as_ref())
                else {
                    return None;
                };
                let owner = self.lookup(&object.token.value)?.object?;
                Some(format!("{}.{}", owner, method.token.value))
            }
            _ => None,
        }
    }

    /// Whether `expr` yields an unsigned integer.
    ///
    /// Backend integer types carry no sign, so this reads the declared
    /// datatypes the expression draws on. Arithmetic follows its left
    /// operand; comparisons yield booleans.
    pub fn is_unsigned(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Literal(literal) if literal.is_identifier() => self
                .lookup(&literal.token.value)
                .is_some_and(|binding| binding.unsigned),
            Expr::Literal(_) => false,
            Expr::Assign(assign) => self
                .lookup(&assign.target.value)
                .is_some_and(|binding| binding.unsigned),
            Expr::Binary(binary) => match binary.operator.kind {
                TokenKind::Dot => self
                    .member_type_name(binary)
                    .is_some_and(|type_name| type_name.is_unsigned()),
                TokenKind::EqualEqual
                | TokenKind::BangEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual => false,
                _ => self.is_unsigned(&binary.left),
            },
            Expr::Unary(unary) => {
                unary.operator.kind == TokenKind::Minus && self.is_unsigned(&unary.operand)
            }
            Expr::Call(call) => self
                .callee_symbol(&call.callee)
                .and_then(|symbol| self.signatures.get(&symbol))
                .is_some_and(|signature| {
                    matches!(signature.returns.as_slice(), [only] if only.is_unsigned())
                }),
        }
    }

    /// Returns a zero filled aggregate if the current block is still open.
    pub(super) fn return_default(&mut self, function: &B::Function) {
        if self.backend.current_block_terminated() {
            return;
        }

        let return_type = self.backend.function_return_type(function);
        let zero = self.backend.const_zero(&return_type);
        self.backend.build_return(&zero);
    }

    pub(super) fn verify(&mut self, function: &B::Function, span: Span) {
        if let Err(reason) = self.backend.verify_function(function) {
            let name = self.backend.function_name(function);
            debug!(function = %name, %reason, "verification failed");
            self.error(ErrorImpl::FunctionVerificationFailed { function: name }, span);
        }
    }

    fn begin_module_init(&mut self) {
        let unit = self.backend.tuple_type(&[]);
        let init = self.backend.declare_function(MODULE_INIT, &unit, &[]);
        let entry = self.backend.append_block(&init, "entry");
        self.backend.position_at_end(&entry);
        self.current_function = Some(init);
    }

    fn finish_module_init(&mut self, span: Span) {
        let Some(init) = self.current_function.clone() else {
            return;
        };

        self.return_default(&init);
        self.verify(&init, span);
    }
}

/// Generates code for `program` into `backend`.
///
/// This is the primary entry point for code generation. It:
/// 1. Lays out every top level struct and declares every function
///    prototype
/// 2. Opens the module initialiser that receives top level statements
/// 3. Visits each statement in source order
/// 4. Closes and verifies the module initialiser
///
/// # Arguments
///
/// * `program` - Top level statements, as produced by the parser
/// * `context` - The context diagnostics are reported to
/// * `backend` - The backend to emit to
///
/// # Returns
///
/// The backend, holding the generated module.
pub fn compile<B: Backend>(program: &[Stmt], context: &mut CompilerContext, backend: B) -> B {
    let mut compiler = Compiler::new(context, backend);

    compiler.hoist_structs(program);
    compiler.hoist_prototypes(program);
    compiler.begin_module_init();

    for stmt in program.iter() {
        compiler.gen_statement(stmt);
    }

    let end = program
        .last()
        .map(|stmt| *stmt.get_span())
        .unwrap_or_default();
    compiler.finish_module_init(end);

    debug!(
        statements = program.len(),
        diagnostics = compiler.reported(),
        "code generation finished"
    );
    compiler.backend
}
