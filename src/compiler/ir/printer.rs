//! Textual form of an IR module, loosely modelled on LLVM assembly.

use std::fmt::{Display, Formatter, Result};

use super::{
    instructions::{cast_mnemonic, Instruction},
    module::{Function, Module},
    types::{IrType, IrValue, Operand},
};

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "; module '{}'", self.name)?;

        if !self.structs.is_empty() {
            writeln!(f)?;
        }
        for def in self.structs.iter() {
            match &def.fields {
                Some(fields) => writeln!(
                    f,
                    "%{} = type {}",
                    def.name,
                    self.type_name(&IrType::Tuple(fields.clone()))
                )?,
                None => writeln!(f, "%{} = type opaque", def.name)?,
            }
        }

        if !self.globals.is_empty() {
            writeln!(f)?;
        }
        for global in self.globals.iter() {
            writeln!(
                f,
                "@{} = global {} {}",
                global.name,
                self.type_name(&global.ty),
                self.operand(None, &global.initializer)
            )?;
        }

        for function in self.functions.iter() {
            writeln!(f)?;
            self.fmt_function(f, function)?;
        }

        Ok(())
    }
}

impl Module {
    fn operand(&self, function: Option<&Function>, value: &IrValue) -> String {
        match &value.operand {
            Operand::Int(int) if value.ty == IrType::bool() => {
                String::from(if *int != 0 { "true" } else { "false" })
            }
            Operand::Int(int) => int.to_string(),
            Operand::Float(float) => format!("{:?}", float),
            Operand::Zero => match value.ty {
                IrType::Int(1) => String::from("false"),
                IrType::Int(_) => String::from("0"),
                IrType::Float32 | IrType::Float64 => String::from("0.0"),
                IrType::Pointer(_) => String::from("null"),
                IrType::Struct(_) | IrType::Tuple(_) => String::from("zeroinitializer"),
            },
            Operand::Register(register) => format!("%{}", register),
            Operand::Param(index) => match function.and_then(|f| f.params.get(*index as usize)) {
                Some((name, _)) => format!("%{}", name),
                None => format!("%arg{}", index),
            },
            Operand::Global(index) => match self.globals.get(*index) {
                Some(global) => format!("@{}", global.name),
                None => format!("@global{}", index),
            },
        }
    }

    fn typed(&self, function: &Function, value: &IrValue) -> String {
        format!(
            "{} {}",
            self.type_name(&value.ty),
            self.operand(Some(function), value)
        )
    }

    fn fmt_function(&self, f: &mut Formatter<'_>, function: &Function) -> Result {
        let params = function
            .params
            .iter()
            .map(|(name, ty)| format!("{} %{}", self.type_name(ty), name))
            .collect::<Vec<String>>()
            .join(", ");
        let keyword = if function.has_body() {
            "define"
        } else {
            "declare"
        };

        write!(
            f,
            "{} {} @{}({})",
            keyword,
            self.type_name(&function.return_type),
            function.name,
            params
        )?;

        if !function.has_body() {
            return writeln!(f);
        }

        writeln!(f, " {{")?;
        for block in function.blocks.iter() {
            writeln!(f, "{}:", block.name)?;
            for instruction in block.instructions.iter() {
                writeln!(f, "  {}", self.instruction(function, instruction))?;
            }
        }
        writeln!(f, "}}")
    }

    fn block_label(&self, function: &Function, index: usize) -> String {
        match function.blocks.get(index) {
            Some(block) => format!("%{}", block.name),
            None => format!("%<block {}>", index),
        }
    }

    fn instruction(&self, function: &Function, instruction: &Instruction) -> String {
        match instruction {
            Instruction::Alloca { dest, ty } => {
                format!("%{} = alloca {}", dest, self.type_name(ty))
            }
            Instruction::Load { dest, ty, pointer } => format!(
                "%{} = load {}, {}",
                dest,
                self.type_name(ty),
                self.typed(function, pointer)
            ),
            Instruction::Store { pointer, value } => format!(
                "store {}, {}",
                self.typed(function, value),
                self.typed(function, pointer)
            ),
            Instruction::FieldPtr {
                dest,
                struct_type,
                pointer,
                index,
            } => format!(
                "%{} = getelementptr {}, {}, i32 0, i32 {}",
                dest,
                self.type_name(struct_type),
                self.typed(function, pointer),
                index
            ),
            Instruction::ExtractField {
                dest,
                aggregate,
                index,
            } => format!(
                "%{} = extractvalue {}, {}",
                dest,
                self.typed(function, aggregate),
                index
            ),
            Instruction::IntBinary {
                dest,
                op,
                left,
                right,
            } => format!(
                "%{} = {} {}, {}",
                dest,
                op.mnemonic(),
                self.typed(function, left),
                self.operand(Some(function), right)
            ),
            Instruction::FloatBinary {
                dest,
                op,
                left,
                right,
            } => format!(
                "%{} = {} {}, {}",
                dest,
                op.mnemonic(),
                self.typed(function, left),
                self.operand(Some(function), right)
            ),
            Instruction::IntCompare {
                dest,
                predicate,
                left,
                right,
            } => format!(
                "%{} = icmp {} {}, {}",
                dest,
                predicate.mnemonic(),
                self.typed(function, left),
                self.operand(Some(function), right)
            ),
            Instruction::FloatCompare {
                dest,
                predicate,
                left,
                right,
            } => format!(
                "%{} = fcmp {} {}, {}",
                dest,
                predicate.mnemonic(),
                self.typed(function, left),
                self.operand(Some(function), right)
            ),
            Instruction::IntNeg { dest, value } => {
                format!("%{} = neg {}", dest, self.typed(function, value))
            }
            Instruction::FloatNeg { dest, value } => {
                format!("%{} = fneg {}", dest, self.typed(function, value))
            }
            Instruction::Not { dest, value } => {
                format!("%{} = not {}", dest, self.typed(function, value))
            }
            Instruction::Cast {
                dest,
                value,
                ty,
                unsigned,
            } => format!(
                "%{} = {} {} to {}",
                dest,
                cast_mnemonic(&value.ty, ty, *unsigned),
                self.typed(function, value),
                self.type_name(ty)
            ),
            Instruction::Call {
                dest,
                function: callee,
                args,
            } => {
                let args = args
                    .iter()
                    .map(|arg| self.typed(function, arg))
                    .collect::<Vec<String>>()
                    .join(", ");
                match self.functions.get(*callee) {
                    Some(callee) => format!(
                        "%{} = call {} @{}({})",
                        dest,
                        self.type_name(&callee.return_type),
                        callee.name,
                        args
                    ),
                    None => format!("%{} = call @<function {}>({})", dest, callee, args),
                }
            }
            Instruction::Return { value } => format!("ret {}", self.typed(function, value)),
            Instruction::Branch { target } => {
                format!("br label {}", self.block_label(function, *target))
            }
            Instruction::CondBranch {
                condition,
                then_block,
                else_block,
            } => format!(
                "br {}, label {}, label {}",
                self.typed(function, condition),
                self.block_label(function, *then_block),
                self.block_label(function, *else_block)
            ),
        }
    }
}
