use num::BigInt;

use crate::{BlockId, Substitution, ValueId};

/// Encoding of the bytes in a string literal.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StringEncoding {
    Utf8 = 0,
    Utf16 = 1,
}

impl std::fmt::Display for StringEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => write!(f, "utf8"),
            Self::Utf16 => write!(f, "utf16"),
        }
    }
}

/// Represents a single instruction within a basic block.
///
/// Every instruction defines exactly one SSA value, `result`, which other
/// instructions refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub result: ValueId,
    pub kind: InstructionKind,
}

impl Instruction {
    /// Gets all values which the instruction reads, in operand order.
    pub fn operands(&self) -> Vec<ValueId> {
        match &self.kind {
            InstructionKind::PartialApply { callee, arguments, .. }
            | InstructionKind::Apply { callee, arguments, .. } => {
                std::iter::once(*callee).chain(arguments.iter().copied()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Determines whether the instruction reads the given value.
    pub fn uses(&self, value: ValueId) -> bool {
        self.operands().contains(&value)
    }

    /// Replaces every operand equal to `old` with `new`.
    pub fn replace_operand(&mut self, old: ValueId, new: ValueId) {
        if let InstructionKind::PartialApply { callee, arguments, .. }
        | InstructionKind::Apply { callee, arguments, .. } = &mut self.kind
        {
            if *callee == old {
                *callee = new;
            }

            for arg in arguments.iter_mut().filter(|arg| **arg == old) {
                *arg = new;
            }
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.result, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// Reference to a function within the module, by name.
    FunctionRef { function: String },

    /// Address of a global variable, by name.
    GlobalAddr { global: String },

    /// Integer literal of arbitrary precision.
    IntegerLiteral { value: BigInt },

    /// Floating-point literal, stored as its raw bit pattern of the given
    /// width. Only the lower `width` bits are significant.
    FloatLiteral { bits: u128, width: u8 },

    /// String literal with the given encoding.
    StringLiteral { value: String, encoding: StringEncoding },

    /// Creates a closure by binding the trailing arguments of `callee`.
    PartialApply {
        callee: ValueId,
        arguments: Vec<ValueId>,
        substitutions: Vec<Substitution>,
    },

    /// Calls `callee` with the given arguments.
    Apply {
        callee: ValueId,
        arguments: Vec<ValueId>,
        substitutions: Vec<Substitution>,
    },
}

impl InstructionKind {
    /// Creates a 32-bit floating-point literal from the given value.
    pub fn float32(value: f32) -> Self {
        InstructionKind::FloatLiteral {
            bits: u128::from(value.to_bits()),
            width: 32,
        }
    }

    /// Creates a 64-bit floating-point literal from the given value.
    pub fn float64(value: f64) -> Self {
        InstructionKind::FloatLiteral {
            bits: u128::from(value.to_bits()),
            width: 64,
        }
    }
}

fn fmt_values(values: &[ValueId]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn fmt_substitutions(substitutions: &[Substitution]) -> String {
    if substitutions.is_empty() {
        return String::new();
    }

    format!(
        "<{}>",
        substitutions.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )
}

impl std::fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FunctionRef { function } => write!(f, "function_ref @{function}"),
            Self::GlobalAddr { global } => write!(f, "global_addr @{global}"),
            Self::IntegerLiteral { value } => write!(f, "integer_literal {value}"),
            Self::FloatLiteral { bits, width } => write!(f, "float_literal f{width} {bits:#x}"),
            Self::StringLiteral { value, encoding } => write!(f, "string_literal {encoding} {value:?}"),
            Self::PartialApply {
                callee,
                arguments,
                substitutions,
            } => write!(
                f,
                "partial_apply {callee}{}({})",
                fmt_substitutions(substitutions),
                fmt_values(arguments)
            ),
            Self::Apply {
                callee,
                arguments,
                substitutions,
            } => write!(
                f,
                "apply {callee}{}({})",
                fmt_substitutions(substitutions),
                fmt_values(arguments)
            ),
        }
    }
}

/// Represents a terminator of a block, which defines how control flow is
/// transferred.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Returns the given value from the current function.
    Return(ValueId),

    /// Unconditionally transfers control flow to the given block, passing
    /// the given values as its block arguments.
    Branch { target: BlockId, arguments: Vec<ValueId> },

    /// Defines the terminator as being unreachable.
    Unreachable,
}

impl Terminator {
    /// Gets all values which the terminator reads.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Self::Return(value) => vec![*value],
            Self::Branch { arguments, .. } => arguments.clone(),
            Self::Unreachable => Vec::new(),
        }
    }

    /// Replaces every operand equal to `old` with `new`.
    pub fn replace_operand(&mut self, old: ValueId, new: ValueId) {
        match self {
            Self::Return(value) if *value == old => *value = new,
            Self::Branch { arguments, .. } => {
                for arg in arguments.iter_mut().filter(|arg| **arg == old) {
                    *arg = new;
                }
            }
            _ => {}
        }
    }
}

impl std::fmt::Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Return(value) => write!(f, "return {value}"),
            Self::Branch { target, arguments } if arguments.is_empty() => write!(f, "br {target}"),
            Self::Branch { target, arguments } => write!(f, "br {target}({})", fmt_values(arguments)),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(callee: usize, arguments: &[usize]) -> Instruction {
        Instruction {
            result: ValueId(10),
            kind: InstructionKind::Apply {
                callee: ValueId(callee),
                arguments: arguments.iter().copied().map(ValueId).collect(),
                substitutions: Vec::new(),
            },
        }
    }

    #[test]
    fn apply_operands_include_callee() {
        let inst = apply(0, &[1, 2]);

        assert_eq!(inst.operands(), vec![ValueId(0), ValueId(1), ValueId(2)]);
        assert!(inst.uses(ValueId(2)));
        assert!(!inst.uses(ValueId(10)));
    }

    #[test]
    fn replace_operand_rewrites_every_occurrence() {
        let mut inst = apply(1, &[1, 2, 1]);
        inst.replace_operand(ValueId(1), ValueId(5));

        assert_eq!(inst.operands(), vec![ValueId(5), ValueId(5), ValueId(2), ValueId(5)]);
    }

    #[test]
    fn literals_have_no_operands() {
        let inst = Instruction {
            result: ValueId(0),
            kind: InstructionKind::IntegerLiteral { value: BigInt::from(3) },
        };

        assert!(inst.operands().is_empty());
    }

    #[test]
    fn float_literal_keeps_sign_of_zero() {
        let positive = InstructionKind::float64(0.0);
        let negative = InstructionKind::float64(-0.0);

        assert_ne!(positive, negative);
        assert_eq!(
            negative,
            InstructionKind::FloatLiteral {
                bits: 0x8000_0000_0000_0000,
                width: 64
            }
        );
    }

    #[test]
    fn display_instructions() {
        assert_eq!(apply(0, &[1, 2]).to_string(), "%10 = apply %0(%1, %2)");
        assert_eq!(Terminator::Return(ValueId(3)).to_string(), "return %3");
        assert_eq!(
            Terminator::Branch {
                target: BlockId(1),
                arguments: vec![ValueId(2)]
            }
            .to_string(),
            "br bb1(%2)"
        );
    }
}
