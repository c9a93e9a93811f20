//! Mangling of specialized functions.
//!
//! When an optimizer clones a function and specializes the clone, either by
//! binding its generic parameters or by changing how individual arguments are
//! passed, the clone needs a symbol which is distinct from the original and
//! from every other specialization. The specialization manglers encode which
//! transformation was applied, so equal specializations always receive equal
//! names.

mod closure;
mod generic;
mod literal;
mod signature;

pub use closure::ClosurePayload;
pub use generic::GenericSpecializationMangler;
pub use literal::LiteralPayload;
pub use signature::{ArgumentModifier, ArgumentRecord, FunctionSignatureSpecializationMangler};

use crate::Mangler;

/// Prefix for all specialized symbol names.
pub const SPECIALIZATION_PREFIX: &str = "_TTS";

/// Separator appended after every substitution or argument in a
/// specialization, as well as between the specialization and the original
/// function name.
pub const SEPARATOR: char = '_';

/// Defines which kind of transformation produced a specialization.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecializationKind {
    /// Generic parameters of the function were bound to concrete types.
    Generic,

    /// Individual arguments of the function were removed or changed.
    FunctionSignature,
}

impl SpecializationKind {
    pub fn as_char(self) -> char {
        match self {
            Self::Generic => 'g',
            Self::FunctionSignature => 'f',
        }
    }
}

/// Defines a mangler which encodes a single specialization of a function into
/// a borrowed [`Mangler`].
pub trait SpecializationMangler {
    /// Defines which kind of specialization the mangler encodes.
    const KIND: SpecializationKind;

    /// Gets the mangler which the specialization is written into.
    fn mangler(&mut self) -> &mut Mangler;

    /// Gets the name of the function which is being specialized.
    fn original_name(&self) -> &str;

    /// Mangles the specialization itself, without any prefix or the name
    /// of the original function.
    fn mangle_specialization(&mut self);

    /// Mangles the complete symbol name of the specialization, in the form
    /// of `_TTS<kind><specialization>_<original name>`.
    fn mangle(&mut self) {
        let original_name = self.original_name().to_string();

        let mangler = self.mangler();
        mangler.push_str(SPECIALIZATION_PREFIX);
        mangler.push(Self::KIND.as_char());

        self.mangle_specialization();

        let mangler = self.mangler();
        mangler.push(SEPARATOR);
        mangler.push_str(&original_name);
    }
}
