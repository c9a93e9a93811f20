use bitflags::bitflags;
use silt_sil::Function;

use crate::Mangler;
use crate::specialization::{ClosurePayload, LiteralPayload, SEPARATOR, SpecializationKind, SpecializationMangler};

bitflags! {
    /// Modifiers which can be combined on a single argument.
    #[derive(Hash, Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct ArgumentModifier: u8 {
        /// The argument is passed as guaranteed, instead of owned.
        const OWNED_TO_GUARANTEED = 1 << 1;

        /// The argument was exploded into its scalar components.
        const SROA = 1 << 2;
    }
}

/// Records how a single argument of the original function was transformed in
/// the specialization.
#[derive(Hash, Debug, Default, Clone, PartialEq, Eq)]
pub enum ArgumentRecord {
    /// The argument is passed as-is.
    #[default]
    Unmodified,

    /// The argument was removed, since it is never read.
    Dead,

    /// The argument is passed with one or more combinable modifiers.
    Modified(ArgumentModifier),

    /// The argument was replaced by a literal.
    ///
    /// Any modifiers set on the argument are kept, but do not take part in
    /// the mangling.
    ConstantProp {
        literal: LiteralPayload,
        modifiers: ArgumentModifier,
    },

    /// The argument was replaced by a closure.
    ///
    /// Any modifiers set on the argument are kept, but do not take part in
    /// the mangling.
    ClosureProp {
        closure: ClosurePayload,
        modifiers: ArgumentModifier,
    },
}

impl ArgumentRecord {
    /// Gets the combinable modifiers on the argument.
    pub fn modifiers(&self) -> ArgumentModifier {
        match self {
            Self::Unmodified | Self::Dead => ArgumentModifier::empty(),
            Self::Modified(modifiers)
            | Self::ConstantProp { modifiers, .. }
            | Self::ClosureProp { modifiers, .. } => *modifiers,
        }
    }

    fn add_modifier(&mut self, modifier: ArgumentModifier) {
        match self {
            Self::Unmodified | Self::Dead => *self = Self::Modified(modifier),
            Self::Modified(modifiers)
            | Self::ConstantProp { modifiers, .. }
            | Self::ClosureProp { modifiers, .. } => modifiers.insert(modifier),
        }
    }
}

/// Mangles a specialization which changes how individual arguments of a
/// function are passed.
///
/// Every argument of the original function starts out as
/// [`ArgumentRecord::Unmodified`] and is changed with the `set_argument_*`
/// methods, before the specialization is mangled.
pub struct FunctionSignatureSpecializationMangler<'m, 'f> {
    mangler: &'m mut Mangler,
    function: &'f Function,
    arguments: Vec<ArgumentRecord>,
}

impl<'m, 'f> FunctionSignatureSpecializationMangler<'m, 'f> {
    pub fn new(mangler: &'m mut Mangler, function: &'f Function) -> Self {
        let arguments = vec![ArgumentRecord::Unmodified; function.signature.parameters.len()];

        Self {
            mangler,
            function,
            arguments,
        }
    }

    /// Gets the records of all arguments, in declaration order.
    pub fn arguments(&self) -> &[ArgumentRecord] {
        &self.arguments
    }

    /// Gets the record of the argument at the given index.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn argument(&self, index: usize) -> &ArgumentRecord {
        self.check_index(index);

        &self.arguments[index]
    }

    fn argument_mut(&mut self, index: usize) -> &mut ArgumentRecord {
        self.check_index(index);

        &mut self.arguments[index]
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.arguments.len(),
            "argument index {index} out of bounds for {} with {} arguments",
            self.function.name,
            self.arguments.len()
        );
    }

    /// Marks the argument as dead, replacing any previous modification.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set_argument_dead(&mut self, index: usize) {
        *self.argument_mut(index) = ArgumentRecord::Dead;
    }

    /// Marks the argument as replaced by the given closure, replacing any
    /// previous modification.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set_argument_closure_prop(&mut self, index: usize, closure: ClosurePayload) {
        *self.argument_mut(index) = ArgumentRecord::ClosureProp {
            closure,
            modifiers: ArgumentModifier::empty(),
        };
    }

    /// Marks the argument as replaced by the given literal. Combinable
    /// modifiers which were already set are kept.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set_argument_constant_prop(&mut self, index: usize, literal: LiteralPayload) {
        let record = self.argument_mut(index);
        let modifiers = record.modifiers();

        *record = ArgumentRecord::ConstantProp { literal, modifiers };
    }

    /// Marks the argument as passed guaranteed, instead of owned.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set_argument_owned_to_guaranteed(&mut self, index: usize) {
        self.argument_mut(index)
            .add_modifier(ArgumentModifier::OWNED_TO_GUARANTEED);
    }

    /// Marks the argument as exploded into its scalar components.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set_argument_sroa(&mut self, index: usize) {
        self.argument_mut(index).add_modifier(ArgumentModifier::SROA);
    }

    /// Mangles the record of the argument at the given index, without any
    /// trailing separator.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds or if the record carries no
    /// modification which can be mangled.
    pub fn mangle_argument(&mut self, index: usize) {
        self.check_index(index);

        mangle_argument(self.mangler, index, &self.arguments[index]);
    }
}

fn mangle_argument(mangler: &mut Mangler, index: usize, record: &ArgumentRecord) {
    match record {
        ArgumentRecord::ConstantProp { literal, modifiers } => {
            warn_on_dropped_modifiers(index, *modifiers);
            literal.mangle(mangler);
        }
        ArgumentRecord::ClosureProp { closure, modifiers } => {
            warn_on_dropped_modifiers(index, *modifiers);
            closure.mangle(mangler);
        }
        ArgumentRecord::Unmodified => mangler.push('n'),
        ArgumentRecord::Dead => mangler.push('d'),
        ArgumentRecord::Modified(modifiers) => {
            let mut has_modifier = false;

            if modifiers.contains(ArgumentModifier::OWNED_TO_GUARANTEED) {
                mangler.push('g');
                has_modifier = true;
            }

            if modifiers.contains(ArgumentModifier::SROA) {
                mangler.push('s');
                has_modifier = true;
            }

            assert!(has_modifier, "unknown argument modifier on argument {index}: {modifiers:?}");
        }
    }
}

fn warn_on_dropped_modifiers(index: usize, modifiers: ArgumentModifier) {
    if !modifiers.is_empty() {
        tracing::warn!(
            target: "mangle",
            argument = index,
            ?modifiers,
            "modifiers on propagated argument are not mangled"
        );
    }
}

impl SpecializationMangler for FunctionSignatureSpecializationMangler<'_, '_> {
    const KIND: SpecializationKind = SpecializationKind::FunctionSignature;

    fn mangler(&mut self) -> &mut Mangler {
        self.mangler
    }

    fn original_name(&self) -> &str {
        &self.function.name
    }

    #[tracing::instrument(level = "TRACE", skip_all, fields(function = %self.function.name))]
    fn mangle_specialization(&mut self) {
        for (index, record) in self.arguments.iter().enumerate() {
            mangle_argument(self.mangler, index, record);
            self.mangler.push(SEPARATOR);
        }
    }
}
