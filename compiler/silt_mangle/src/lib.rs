mod mangler;
mod punycode;
pub mod specialization;

pub use mangler::{Mangler, is_symbol_char};
pub use specialization::{
    ArgumentModifier, ArgumentRecord, ClosurePayload, FunctionSignatureSpecializationMangler,
    GenericSpecializationMangler, LiteralPayload, SpecializationKind, SpecializationMangler,
};
