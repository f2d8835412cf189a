//! The default backend: an in-memory, SSA-like instruction module.
//!
//! `IrBackend` records what the code generator emits into a `Module`, which
//! can be printed, verified and executed by the `Interpreter`.

pub mod builder;
pub mod instructions;
pub mod interpreter;
pub mod module;
pub mod printer;
pub mod types;
pub mod verify;

#[cfg(test)]
mod tests;

pub use builder::IrBackend;
pub use interpreter::{EvalError, Interpreter, RuntimeValue};
pub use module::Module;
