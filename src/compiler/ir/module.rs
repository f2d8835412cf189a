use super::{
    instructions::Instruction,
    types::{IrType, IrValue},
};

/// A named aggregate. `fields` stays `None` until the body is set.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Option<Vec<IrType>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    pub ty: IrType,
    pub initializer: IrValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl Block {
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|inst| inst.is_terminator())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<(String, IrType)>,
    pub return_type: IrType,
    pub blocks: Vec<Block>,
    /// Type of each register, indexed by register number.
    pub registers: Vec<IrType>,
}

impl Function {
    /// A function without blocks is only a declaration.
    pub fn has_body(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// `name`, or `name` with the lowest free numeric suffix.
    pub fn unique_block_name(&self, name: &str) -> String {
        let taken = |candidate: &str| self.blocks.iter().any(|block| block.name == candidate);
        if !taken(name) {
            return String::from(name);
        }

        let mut suffix = 1;
        loop {
            let candidate = format!("{}{}", name, suffix);
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub structs: Vec<StructDef>,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(name: &str) -> Self {
        Module {
            name: String::from(name),
            structs: vec![],
            globals: vec![],
            functions: vec![],
        }
    }

    pub fn struct_index(&self, name: &str) -> Option<usize> {
        self.structs.iter().position(|def| def.name == name)
    }

    pub fn global_index(&self, name: &str) -> Option<usize> {
        self.globals.iter().position(|global| global.name == name)
    }

    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.functions
            .iter()
            .position(|function| function.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.function_index(name).map(|index| &self.functions[index])
    }

    pub fn global(&self, name: &str) -> Option<&Global> {
        self.global_index(name).map(|index| &self.globals[index])
    }

    /// Field types of an aggregate; empty for opaque structs and scalars.
    pub fn field_types(&self, ty: &IrType) -> Vec<IrType> {
        match ty {
            IrType::Struct(index) => self
                .structs
                .get(*index)
                .and_then(|def| def.fields.clone())
                .unwrap_or_default(),
            IrType::Tuple(fields) => fields.clone(),
            _ => vec![],
        }
    }

    /// Textual form of `ty`, naming structs by their declared name.
    pub fn type_name(&self, ty: &IrType) -> String {
        match ty {
            IrType::Int(bits) => format!("i{}", bits),
            IrType::Float32 => String::from("float"),
            IrType::Float64 => String::from("double"),
            IrType::Pointer(pointee) => format!("{}*", self.type_name(pointee)),
            IrType::Struct(index) => match self.structs.get(*index) {
                Some(def) => format!("%{}", def.name),
                None => String::from("%<unknown>"),
            },
            IrType::Tuple(fields) => {
                if fields.is_empty() {
                    return String::from("{}");
                }
                let fields = fields
                    .iter()
                    .map(|field| self.type_name(field))
                    .collect::<Vec<String>>();
                format!("{{ {} }}", fields.join(", "))
            }
        }
    }
}
