use crate::{Instruction, InstructionKind, Terminator, Type};

/// Identifier of an SSA value within a single function.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValueId(pub(crate) usize);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Hash, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// The entry block of every function with a body.
    pub const ENTRY: BlockId = BlockId(0);
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Location of an instruction within a function.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstLocation {
    pub block: BlockId,
    pub index: usize,
}

/// Defines the parameter types and result type of a function.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub parameters: Vec<Type>,
    pub result: Type,
}

impl Signature {
    pub fn new(parameters: Vec<Type>, result: Type) -> Self {
        Self { parameters, result }
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}) -> {}",
            self.parameters
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            self.result
        )
    }
}

/// Represents a basic block in the control flow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,

    /// Values bound when control enters the block. The arguments of the
    /// entry block are the parameters of the function.
    arguments: Vec<ValueId>,

    /// Defines all non-terminator instructions in the block.
    instructions: Vec<Instruction>,

    /// Defines the terminator of the block.
    terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        BasicBlock {
            id,
            arguments: Vec::new(),
            instructions: Vec::new(),
            terminator: None,
        }
    }

    pub fn arguments(&self) -> &[ValueId] {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut Vec<ValueId> {
        &mut self.arguments
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instructions_mut(&mut self) -> &mut Vec<Instruction> {
        &mut self.instructions
    }

    pub fn terminator(&self) -> Option<&Terminator> {
        self.terminator.as_ref()
    }

    /// Sets the terminator of the block, replacing any existing one.
    pub fn set_terminator(&mut self, term: Terminator) {
        self.terminator = Some(term);
    }
}

/// Type information about a single SSA value.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub id: ValueId,
    pub ty: Type,
}

/// Defines a function within a SIL module.
///
/// A function without any blocks is an external declaration: it is defined
/// outside of the current module and has no body to optimize.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub signature: Signature,

    values: Vec<Value>,
    blocks: Vec<BasicBlock>,
}

impl Function {
    /// Creates an external declaration with the given name and signature.
    pub fn declaration(name: impl Into<String>, signature: Signature) -> Self {
        Function {
            name: name.into(),
            signature,
            values: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Creates a function with an empty entry block, whose arguments are
    /// the parameters of the signature.
    pub fn with_body(name: impl Into<String>, signature: Signature) -> Self {
        let mut func = Self::declaration(name, signature);
        let entry = func.new_block();

        for ty in func.signature.parameters.clone() {
            func.add_block_argument(entry, ty);
        }

        func
    }

    /// Determines whether the function is declared, but not defined, in
    /// the current module.
    pub fn is_external_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Gets the function type of the function.
    pub fn ty(&self) -> Type {
        Type::function(self.signature.parameters.clone(), self.signature.result.clone())
    }

    /// Gets the values of the parameters of the function. External
    /// declarations have no parameter values.
    pub fn parameters(&self) -> &[ValueId] {
        match self.blocks.first() {
            Some(entry) => entry.arguments(),
            None => &[],
        }
    }

    /// Allocates a new value with the given type.
    pub fn add_value(&mut self, ty: Type) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(Value { id, ty });

        id
    }

    /// Gets the type of the given value.
    ///
    /// # Panics
    ///
    /// Panics if the given ID is invalid or out of bounds.
    pub fn value_ty(&self, id: ValueId) -> &Type {
        &self.values[id.0].ty
    }

    /// Iterates over all values within the function.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Returns a reference to the basic block with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the given ID is invalid or out of bounds.
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    /// Returns a mutable reference to the basic block with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the given ID is invalid or out of bounds.
    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0]
    }

    /// Allocates a new basic block and returns its ID.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock::new(id));

        id
    }

    /// Adds a new argument of the given type to a block and returns its value.
    pub fn add_block_argument(&mut self, block: BlockId, ty: Type) -> ValueId {
        let value = self.add_value(ty);
        self.block_mut(block).arguments.push(value);

        value
    }

    /// Iterates over all instructions in the function, along with their
    /// location.
    pub fn instructions(&self) -> impl Iterator<Item = (InstLocation, &Instruction)> {
        self.blocks.iter().flat_map(|block| {
            block
                .instructions
                .iter()
                .enumerate()
                .map(move |(index, inst)| (InstLocation { block: block.id, index }, inst))
        })
    }

    /// Returns the instruction at the given location.
    ///
    /// # Panics
    ///
    /// Panics if the location is out of bounds.
    pub fn instruction(&self, loc: InstLocation) -> &Instruction {
        &self.block(loc.block).instructions[loc.index]
    }

    /// Returns a mutable reference to the instruction at the given location.
    ///
    /// # Panics
    ///
    /// Panics if the location is out of bounds.
    pub fn instruction_mut(&mut self, loc: InstLocation) -> &mut Instruction {
        &mut self.block_mut(loc.block).instructions[loc.index]
    }

    /// Finds the location of the instruction which defines the given value.
    ///
    /// Returns [`None`] if the value is a block argument.
    pub fn find_instruction(&self, value: ValueId) -> Option<InstLocation> {
        self.instructions()
            .find(|(_, inst)| inst.result == value)
            .map(|(loc, _)| loc)
    }

    /// Gets the instruction which defines the given value, if any.
    pub fn defining_instruction(&self, value: ValueId) -> Option<&Instruction> {
        self.find_instruction(value).map(|loc| self.instruction(loc))
    }

    /// Gets the name of the function referenced by the given value, if it
    /// is defined by a `function_ref` instruction.
    pub fn referenced_function(&self, value: ValueId) -> Option<&str> {
        match self.defining_instruction(value).map(|inst| &inst.kind) {
            Some(InstructionKind::FunctionRef { function }) => Some(function.as_str()),
            _ => None,
        }
    }

    /// Iterates over all instructions which read the given value.
    pub fn users(&self, value: ValueId) -> impl Iterator<Item = (InstLocation, &Instruction)> {
        self.instructions().filter(move |(_, inst)| inst.uses(value))
    }

    /// Counts the number of times the given value is read, by instructions
    /// and terminators alike.
    pub fn use_count(&self, value: ValueId) -> usize {
        self.blocks
            .iter()
            .map(|block| {
                let in_insts = block
                    .instructions
                    .iter()
                    .flat_map(Instruction::operands)
                    .filter(|op| *op == value)
                    .count();

                let in_term = block
                    .terminator
                    .iter()
                    .flat_map(Terminator::operands)
                    .filter(|op| *op == value)
                    .count();

                in_insts + in_term
            })
            .sum()
    }

    /// Replaces every read of `old` with a read of `new`.
    pub fn replace_all_uses(&mut self, old: ValueId, new: ValueId) {
        for block in &mut self.blocks {
            for inst in &mut block.instructions {
                inst.replace_operand(old, new);
            }

            if let Some(term) = &mut block.terminator {
                term.replace_operand(old, new);
            }
        }
    }

    /// Inserts an instruction at the given location, shifting all following
    /// instructions in the block.
    ///
    /// # Panics
    ///
    /// Panics if the location is out of bounds.
    pub fn insert_instruction(&mut self, loc: InstLocation, inst: Instruction) {
        self.block_mut(loc.block).instructions.insert(loc.index, inst);
    }

    /// Removes the instruction at the given location.
    ///
    /// # Panics
    ///
    /// Panics if the location is out of bounds.
    pub fn remove_instruction(&mut self, loc: InstLocation) -> Instruction {
        self.block_mut(loc.block).instructions.remove(loc.index)
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_external_declaration() {
            return writeln!(f, "sil @{} : {}", self.name, self.signature);
        }

        writeln!(f, "sil @{} : {} {{", self.name, self.signature)?;

        for block in &self.blocks {
            let args = block
                .arguments
                .iter()
                .map(|arg| format!("{arg} : {}", self.value_ty(*arg)))
                .collect::<Vec<_>>();

            writeln!(f, "{}({}):", block.id, args.join(", "))?;

            for inst in &block.instructions {
                writeln!(f, "  {inst} : {}", self.value_ty(inst.result))?;
            }

            if let Some(term) = &block.terminator {
                writeln!(f, "  {term}")?;
            }
        }

        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Function {
        let mut func = Function::with_body("identity", Signature::new(vec![Type::int()], Type::int()));
        let param = func.parameters()[0];
        func.block_mut(BlockId::ENTRY).set_terminator(Terminator::Return(param));

        func
    }

    #[test]
    fn with_body_binds_parameters() {
        let func = Function::with_body("foo", Signature::new(vec![Type::int(), Type::bool()], Type::unit()));

        assert!(!func.is_external_declaration());
        assert_eq!(func.parameters().len(), 2);
        assert_eq!(func.value_ty(func.parameters()[1]), &Type::bool());
    }

    #[test]
    fn declaration_has_no_parameters() {
        let func = Function::declaration("foo", Signature::new(vec![Type::int()], Type::unit()));

        assert!(func.is_external_declaration());
        assert!(func.parameters().is_empty());
    }

    #[test]
    fn use_count_includes_terminators() {
        let func = identity();

        assert_eq!(func.use_count(func.parameters()[0]), 1);
    }

    #[test]
    fn replace_all_uses_rewrites_terminators() {
        let mut func = identity();
        let old = func.parameters()[0];
        let new = func.add_value(Type::int());

        func.replace_all_uses(old, new);

        assert_eq!(func.use_count(old), 0);
        assert_eq!(func.block(BlockId::ENTRY).terminator(), Some(&Terminator::Return(new)));
    }

    #[test]
    fn display_function() {
        let func = identity();

        assert_eq!(
            func.to_string(),
            "sil @identity : (std.Int) -> std.Int {\nbb0(%0 : std.Int):\n  return %0\n}\n"
        );
    }

    #[test]
    fn display_declaration() {
        let func = Function::declaration("puts", Signature::new(vec![Type::string()], Type::unit()));

        assert_eq!(func.to_string(), "sil @puts : (std.String) -> ()\n");
    }
}
