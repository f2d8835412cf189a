use std::ops::{Deref, DerefMut};

use super::{backend::Backend, compiler::Compiler};

/// Declaration context the code generator is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Function,
    StructBody,
    Impl,
    /// `trait` is a reserved word; no declaration enters this scope yet.
    Trait,
}

/// Keeps a scope pushed for as long as it lives.
///
/// Obtained from `Compiler::enter_scope`; dereferences to the compiler and
/// pops the scope again when dropped, so every exit path restores the
/// previous one.
pub struct ScopeGuard<'g, 'c, B: Backend> {
    compiler: &'g mut Compiler<'c, B>,
}

impl<'c, B: Backend> Compiler<'c, B> {
    pub fn enter_scope(&mut self, scope: Scope) -> ScopeGuard<'_, 'c, B> {
        self.scopes.push(scope);
        ScopeGuard { compiler: self }
    }

    pub fn scope(&self) -> Scope {
        self.scopes.last().copied().unwrap_or(Scope::Global)
    }

    /// Whether any enclosing scope is a function body.
    pub fn in_function(&self) -> bool {
        self.scopes.contains(&Scope::Function)
    }
}

impl<'g, 'c, B: Backend> Deref for ScopeGuard<'g, 'c, B> {
    type Target = Compiler<'c, B>;

    fn deref(&self) -> &Self::Target {
        self.compiler
    }
}

impl<'g, 'c, B: Backend> DerefMut for ScopeGuard<'g, 'c, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.compiler
    }
}

impl<'g, 'c, B: Backend> Drop for ScopeGuard<'g, 'c, B> {
    fn drop(&mut self) {
        self.compiler.scopes.pop();
    }
}
