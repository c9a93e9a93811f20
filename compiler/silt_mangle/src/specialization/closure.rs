use silt_sil::{Function, Instruction, InstructionKind, Type};

use crate::Mangler;

/// Indicator for an argument which was replaced by a closure.
pub const CLOSURE_PROP_INDICATOR: &str = "cl";

/// Closure which is propagated into a specialized function, in place of one
/// of its arguments.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct ClosurePayload {
    /// Name of the function which the closure applies.
    pub callee: String,

    /// Types of the arguments captured by the closure, in order.
    pub captured_types: Vec<Type>,
}

impl ClosurePayload {
    pub fn new(callee: impl Into<String>, captured_types: Vec<Type>) -> Self {
        Self {
            callee: callee.into(),
            captured_types,
        }
    }

    /// Creates a payload from a `partial_apply` instruction within `func`.
    ///
    /// # Panics
    ///
    /// Panics if the instruction is not a `partial_apply` or if its callee is
    /// not defined by a `function_ref` instruction.
    pub fn from_partial_apply(func: &Function, inst: &Instruction) -> Self {
        let InstructionKind::PartialApply { callee, arguments, .. } = &inst.kind else {
            panic!("bug!: expected partial_apply, found {inst}");
        };

        let Some(callee_name) = func.referenced_function(*callee) else {
            panic!("bug!: closure callee {callee} must be a function_ref");
        };

        let captured_types = arguments.iter().map(|arg| func.value_ty(*arg).clone()).collect();

        Self::new(callee_name, captured_types)
    }

    /// Mangles the payload as a closure propagated argument.
    pub fn mangle(&self, mangler: &mut Mangler) {
        mangler.push_str(CLOSURE_PROP_INDICATOR);
        mangler.mangle_identifier(&self.callee);

        for ty in &self.captured_types {
            mangler.mangle_type(ty);
        }
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use silt_sil::{FunctionBuilder, Signature};

    use super::*;

    fn mangle(payload: &ClosurePayload) -> String {
        let mut mangler = Mangler::new();
        payload.mangle(&mut mangler);
        mangler.finalize()
    }

    #[test]
    fn without_captures() {
        assert_snapshot!(mangle(&ClosurePayload::new("body", vec![])), @"cl4body");
    }

    #[test]
    fn with_captures() {
        let payload = ClosurePayload::new("body", vec![Type::int(), Type::bool()]);

        assert_snapshot!(mangle(&payload), @"cl4bodySiSb");
    }

    #[test]
    fn from_partial_apply() {
        let closed = Function::declaration("closed", Signature::new(vec![Type::int(), Type::bool()], Type::unit()));
        let mut func = Function::with_body("caller", Signature::new(vec![Type::bool()], Type::unit()));

        let mut builder = FunctionBuilder::new(&mut func);
        let flag = builder.parameter(0);
        let fref = builder.function_ref(&closed);
        let closure = builder.partial_apply(fref, vec![flag], Type::function(vec![Type::int()], Type::unit()));

        let inst = func.defining_instruction(closure).unwrap();
        let payload = ClosurePayload::from_partial_apply(&func, inst);

        assert_eq!(payload, ClosurePayload::new("closed", vec![Type::bool()]));
        assert_snapshot!(mangle(&payload), @"cl6closedSb");
    }

    #[test]
    #[should_panic(expected = "must be a function_ref")]
    fn indirect_callee() {
        let closure_ty = Type::function(vec![Type::int()], Type::unit());
        let mut func = Function::with_body("caller", Signature::new(vec![closure_ty.clone()], Type::unit()));

        let mut builder = FunctionBuilder::new(&mut func);
        let callee = builder.parameter(0);
        let closure = builder.partial_apply(callee, vec![], closure_ty);

        let inst = func.defining_instruction(closure).unwrap();
        let _ = ClosurePayload::from_partial_apply(&func, inst);
    }
}
