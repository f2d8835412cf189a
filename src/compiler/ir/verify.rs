//! Structural checks run on each function once its body is complete.

use thiserror::Error;

use super::{instructions::Instruction, module::Module, types::IrType};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("no function with index {0}")]
    UnknownFunction(usize),
    #[error("block {block:?} in {function:?} does not end in a terminator")]
    MissingTerminator { function: String, block: String },
    #[error("block {block:?} in {function:?} has a terminator before its end")]
    EarlyTerminator { function: String, block: String },
    #[error("branch in {function:?} targets missing block {target}")]
    UnknownBlock { function: String, target: usize },
    #[error("{function:?} returns {found} but is declared to return {expected}")]
    ReturnTypeMismatch {
        function: String,
        expected: String,
        found: String,
    },
    #[error("store in {function:?} writes {value} through {pointer}")]
    StoreTypeMismatch {
        function: String,
        value: String,
        pointer: String,
    },
    #[error("branch condition in {function:?} is {found}, not i1")]
    NonBoolCondition { function: String, found: String },
    #[error("call in {function:?} passes {received} arguments to {callee:?}, which takes {expected}")]
    CallArity {
        function: String,
        callee: String,
        expected: usize,
        received: usize,
    },
}

/// Verifies the function at `index`. Declarations always pass.
pub fn verify_function(module: &Module, index: usize) -> Result<(), VerifyError> {
    let function = module
        .functions
        .get(index)
        .ok_or(VerifyError::UnknownFunction(index))?;
    let name = || function.name.clone();

    for block in function.blocks.iter() {
        match block.instructions.last() {
            Some(last) if last.is_terminator() => {}
            _ => {
                return Err(VerifyError::MissingTerminator {
                    function: name(),
                    block: block.name.clone(),
                })
            }
        }

        let body = &block.instructions[..block.instructions.len() - 1];
        if body.iter().any(|inst| inst.is_terminator()) {
            return Err(VerifyError::EarlyTerminator {
                function: name(),
                block: block.name.clone(),
            });
        }

        for instruction in block.instructions.iter() {
            if let Some(target) = instruction
                .successors()
                .into_iter()
                .find(|target| *target >= function.blocks.len())
            {
                return Err(VerifyError::UnknownBlock {
                    function: name(),
                    target,
                });
            }

            match instruction {
                Instruction::Return { value } if value.ty != function.return_type => {
                    return Err(VerifyError::ReturnTypeMismatch {
                        function: name(),
                        expected: module.type_name(&function.return_type),
                        found: module.type_name(&value.ty),
                    });
                }
                Instruction::Store { pointer, value } => {
                    if pointer.ty.pointee() != Some(&value.ty) {
                        return Err(VerifyError::StoreTypeMismatch {
                            function: name(),
                            value: module.type_name(&value.ty),
                            pointer: module.type_name(&pointer.ty),
                        });
                    }
                }
                Instruction::CondBranch { condition, .. } if condition.ty != IrType::bool() => {
                    return Err(VerifyError::NonBoolCondition {
                        function: name(),
                        found: module.type_name(&condition.ty),
                    });
                }
                Instruction::Call {
                    function: callee,
                    args,
                    ..
                } => {
                    if let Some(callee) = module.functions.get(*callee) {
                        if callee.params.len() != args.len() {
                            return Err(VerifyError::CallArity {
                                function: name(),
                                callee: callee.name.clone(),
                                expected: callee.params.len(),
                                received: args.len(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}
