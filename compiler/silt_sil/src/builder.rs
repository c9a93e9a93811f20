use num::BigInt;

use crate::*;

/// Appends instructions to the end of a single block within a function.
pub struct FunctionBuilder<'f> {
    func: &'f mut Function,
    block: BlockId,
}

impl<'f> FunctionBuilder<'f> {
    /// Creates a new builder, which appends instructions to the entry block
    /// of the given function.
    ///
    /// # Panics
    ///
    /// Panics if the function is an external declaration.
    pub fn new(func: &'f mut Function) -> Self {
        assert!(
            !func.is_external_declaration(),
            "cannot build into external declaration {}",
            func.name
        );

        Self {
            func,
            block: BlockId::ENTRY,
        }
    }

    /// Gets the function which is being built.
    pub fn func(&self) -> &Function {
        self.func
    }

    /// Moves the insertion point to the end of the given block.
    pub fn position_at_end(&mut self, block: BlockId) {
        self.block = block;
    }

    /// Gets the value of the parameter at the given index.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn parameter(&self, index: usize) -> ValueId {
        self.func.parameters()[index]
    }

    /// Appends an instruction of the given kind, whose result has the type
    /// `ty`, and returns the result.
    pub fn push(&mut self, kind: InstructionKind, ty: Type) -> ValueId {
        let result = self.func.add_value(ty);

        self.func
            .block_mut(self.block)
            .instructions_mut()
            .push(Instruction { result, kind });

        result
    }

    pub fn function_ref(&mut self, function: &Function) -> ValueId {
        let kind = InstructionKind::FunctionRef {
            function: function.name.clone(),
        };

        self.push(kind, function.ty())
    }

    pub fn global_addr(&mut self, global: impl Into<String>, ty: Type) -> ValueId {
        self.push(InstructionKind::GlobalAddr { global: global.into() }, ty)
    }

    pub fn integer_literal(&mut self, value: impl Into<BigInt>, ty: Type) -> ValueId {
        self.push(InstructionKind::IntegerLiteral { value: value.into() }, ty)
    }

    pub fn float_literal(&mut self, value: f64) -> ValueId {
        self.push(InstructionKind::float64(value), Type::BuiltinFloat { bits: 64 })
    }

    pub fn float32_literal(&mut self, value: f32) -> ValueId {
        self.push(InstructionKind::float32(value), Type::BuiltinFloat { bits: 32 })
    }

    pub fn string_literal(&mut self, value: impl Into<String>, encoding: StringEncoding) -> ValueId {
        let kind = InstructionKind::StringLiteral {
            value: value.into(),
            encoding,
        };

        self.push(kind, Type::RawPointer)
    }

    pub fn partial_apply(&mut self, callee: ValueId, arguments: Vec<ValueId>, ty: Type) -> ValueId {
        self.partial_apply_generic(callee, Vec::new(), arguments, ty)
    }

    pub fn partial_apply_generic(
        &mut self,
        callee: ValueId,
        substitutions: Vec<Substitution>,
        arguments: Vec<ValueId>,
        ty: Type,
    ) -> ValueId {
        let kind = InstructionKind::PartialApply {
            callee,
            arguments,
            substitutions,
        };

        self.push(kind, ty)
    }

    pub fn apply(&mut self, callee: ValueId, arguments: Vec<ValueId>, ty: Type) -> ValueId {
        self.apply_generic(callee, Vec::new(), arguments, ty)
    }

    pub fn apply_generic(
        &mut self,
        callee: ValueId,
        substitutions: Vec<Substitution>,
        arguments: Vec<ValueId>,
        ty: Type,
    ) -> ValueId {
        let kind = InstructionKind::Apply {
            callee,
            arguments,
            substitutions,
        };

        self.push(kind, ty)
    }

    pub fn ret(&mut self, value: ValueId) {
        self.func.block_mut(self.block).set_terminator(Terminator::Return(value));
    }

    pub fn branch(&mut self, target: BlockId, arguments: Vec<ValueId>) {
        self.func
            .block_mut(self.block)
            .set_terminator(Terminator::Branch { target, arguments });
    }

    pub fn unreachable(&mut self) {
        self.func.block_mut(self.block).set_terminator(Terminator::Unreachable);
    }
}
