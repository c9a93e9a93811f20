use silt_sil::{Function, Substitution};

use crate::Mangler;
use crate::specialization::{SEPARATOR, SpecializationKind, SpecializationMangler};

/// Mangles a specialization which binds the generic parameters of a function
/// to the given substitutions.
pub struct GenericSpecializationMangler<'m, 'a> {
    mangler: &'m mut Mangler,
    function: &'a Function,
    substitutions: &'a [Substitution],
}

impl<'m, 'a> GenericSpecializationMangler<'m, 'a> {
    pub fn new(mangler: &'m mut Mangler, function: &'a Function, substitutions: &'a [Substitution]) -> Self {
        Self {
            mangler,
            function,
            substitutions,
        }
    }
}

impl SpecializationMangler for GenericSpecializationMangler<'_, '_> {
    const KIND: SpecializationKind = SpecializationKind::Generic;

    fn mangler(&mut self) -> &mut Mangler {
        self.mangler
    }

    fn original_name(&self) -> &str {
        &self.function.name
    }

    #[tracing::instrument(level = "TRACE", skip_all, fields(function = %self.function.name))]
    fn mangle_specialization(&mut self) {
        for substitution in self.substitutions {
            mangle_substitution(self.mangler, substitution);
            self.mangler.push(SEPARATOR);
        }
    }
}

/// Mangles the replacement type of the substitution, followed by its
/// conformances. Mangling stops at the first absent conformance.
fn mangle_substitution(mangler: &mut Mangler, substitution: &Substitution) {
    mangler.mangle_type(&substitution.replacement);

    for conformance in &substitution.conformances {
        let Some(conformance) = conformance else {
            return;
        };

        mangler.mangle_protocol_conformance(conformance);
    }
}
