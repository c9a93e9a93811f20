use std::fmt::Display;

use silt_sil::{NominalKind, NominalType, ProtocolConformance, ProtocolDecl, Type};

use crate::punycode;

/// Indicator for an identifier which had to be punycode-encoded, since it
/// contained characters outside of the symbol alphabet.
pub const PUNYCODE_INDICATOR: &str = "X";

/// Shortened mangling of the standard library module.
pub const STD_MODULE_SYM: &str = "Ss";

/// Indicator for the start of a builtin type.
pub const BUILTIN_INDICATOR: &str = "B";

/// Indicator for the start of a bound generic type, which is terminated by
/// [`LIST_TERMINATOR`].
pub const BOUND_GENERIC_INDICATOR: &str = "G";

/// Indicator for the start of a tuple type, which is terminated by
/// [`LIST_TERMINATOR`].
pub const TUPLE_INDICATOR: &str = "T";

/// Indicator for the start of a function type.
pub const FUNCTION_INDICATOR: &str = "F";

/// Indicator for the start of a generic parameter type.
pub const GENERIC_PARAM_INDICATOR: &str = "Q";

/// Terminates lists of variable length, as well as numeric indices.
pub const LIST_TERMINATOR: char = '_';

/// Determines whether the given character is part of the alphabet which
/// can appear verbatim in a mangled symbol.
#[inline]
pub fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Base mangler which owns the output buffer of a single mangling session.
///
/// All higher-level manglers write into a borrowed [`Mangler`], so a single
/// symbol can be built from multiple fragments.
#[derive(Default, Debug, Clone)]
pub struct Mangler {
    buffer: String,
}

impl Mangler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the mangler and returns the mangled symbol.
    pub fn finalize(self) -> String {
        self.buffer
    }

    pub fn push(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn push_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    /// Appends the textual form of the given value, such as a number.
    pub fn push_display(&mut self, value: impl Display) {
        self.buffer.push_str(&value.to_string());
    }

    /// Mangles an identifier, prefixed by its length.
    ///
    /// Identifiers containing characters outside of the symbol alphabet are
    /// punycode-encoded and marked with [`PUNYCODE_INDICATOR`].
    pub fn mangle_identifier(&mut self, ident: &str) {
        if ident.chars().all(is_symbol_char) {
            self.mangle_length_prefixed(ident);
            return;
        }

        self.push_str(PUNYCODE_INDICATOR);
        self.mangle_length_prefixed(&punycode::encode(ident));
    }

    /// Writes the length of `text` followed by the text itself.
    ///
    /// When the text starts with a digit or [`LIST_TERMINATOR`], the length is
    /// terminated by [`LIST_TERMINATOR`] so it cannot run into the text.
    fn mangle_length_prefixed(&mut self, text: &str) {
        self.push_display(text.len());

        if text.starts_with(|c: char| c.is_ascii_digit() || c == LIST_TERMINATOR) {
            self.push(LIST_TERMINATOR);
        }

        self.push_str(text);
    }

    /// Mangles the canonical form of the given type.
    ///
    /// The resulting mangling is self-delimiting, so multiple types can be
    /// mangled back-to-back without any separator.
    #[tracing::instrument(level = "TRACE", skip_all)]
    pub fn mangle_type(&mut self, ty: &Type) {
        match ty {
            Type::BuiltinInteger { bits } => {
                self.push_str(BUILTIN_INDICATOR);
                self.push('i');
                self.push_display(bits);
                self.push(LIST_TERMINATOR);
            }
            Type::BuiltinFloat { bits } => {
                self.push_str(BUILTIN_INDICATOR);
                self.push('f');
                self.push_display(bits);
                self.push(LIST_TERMINATOR);
            }
            Type::RawPointer => {
                self.push_str(BUILTIN_INDICATOR);
                self.push('p');
            }
            Type::Nominal(nominal) => {
                if let Some(sym) = std_shortcut(nominal) {
                    self.push_str(sym);
                } else {
                    self.mangle_nominal(nominal);
                }
            }
            Type::BoundGeneric { base, arguments } => {
                self.push_str(BOUND_GENERIC_INDICATOR);
                self.mangle_nominal(base);

                for arg in arguments {
                    self.mangle_type(arg);
                }

                self.push(LIST_TERMINATOR);
            }
            Type::Tuple(elements) => self.mangle_tuple(elements),
            Type::Function { parameters, result } => {
                self.push_str(FUNCTION_INDICATOR);
                self.mangle_tuple(parameters);
                self.mangle_type(result);
            }
            Type::GenericParam { depth, index } => {
                self.push_str(GENERIC_PARAM_INDICATOR);

                if *depth > 0 {
                    self.push('d');
                    self.push_display(depth);
                    self.push(LIST_TERMINATOR);
                }

                self.mangle_index(*index);
            }
        }
    }

    /// Mangles a protocol conformance as the conforming type, followed by the
    /// protocol and the module which declares the conformance.
    pub fn mangle_protocol_conformance(&mut self, conformance: &ProtocolConformance) {
        self.mangle_type(&conformance.conforming_type);
        self.mangle_protocol(&conformance.protocol);
        self.mangle_module(&conformance.module);
    }

    pub fn mangle_module(&mut self, module: &str) {
        if module == silt_sil::STD_MODULE {
            self.push_str(STD_MODULE_SYM);
        } else {
            self.mangle_identifier(module);
        }
    }

    fn mangle_protocol(&mut self, protocol: &ProtocolDecl) {
        self.mangle_module(&protocol.module);
        self.mangle_identifier(&protocol.name);
    }

    fn mangle_nominal(&mut self, nominal: &NominalType) {
        self.push(match nominal.kind {
            NominalKind::Struct => 'V',
            NominalKind::Enum => 'O',
            NominalKind::Class => 'C',
            NominalKind::Protocol => 'P',
        });

        self.mangle_module(&nominal.module);
        self.mangle_identifier(&nominal.name);
    }

    fn mangle_tuple(&mut self, elements: &[Type]) {
        self.push_str(TUPLE_INDICATOR);

        for element in elements {
            self.mangle_type(element);
        }

        self.push(LIST_TERMINATOR);
    }

    /// Mangles an index, where zero is mangled as a lone terminator and
    /// every other index is offset by one.
    fn mangle_index(&mut self, index: u32) {
        if index > 0 {
            self.push_display(index - 1);
        }

        self.push(LIST_TERMINATOR);
    }
}

/// Gets the shortened mangling of common standard library types, if any.
fn std_shortcut(nominal: &NominalType) -> Option<&'static str> {
    if !nominal.is_std() || nominal.kind != NominalKind::Struct {
        return None;
    }

    match nominal.name.as_str() {
        "Int" => Some("Si"),
        "UInt" => Some("Su"),
        "Bool" => Some("Sb"),
        "Float" => Some("Sf"),
        "Double" => Some("Sd"),
        "String" => Some("SS"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use silt_sil::STD_MODULE;

    use super::*;

    fn mangle_type(ty: &Type) -> String {
        let mut mangler = Mangler::new();
        mangler.mangle_type(ty);
        mangler.finalize()
    }

    fn mangle_identifier(ident: &str) -> String {
        let mut mangler = Mangler::new();
        mangler.mangle_identifier(ident);
        mangler.finalize()
    }

    #[test]
    fn plain_identifiers() {
        assert_snapshot!(mangle_identifier("foo"), @"3foo");
        assert_snapshot!(mangle_identifier("foo_bar$1"), @"9foo_bar$1");
        assert_snapshot!(mangle_identifier(""), @"0");
    }

    #[test]
    fn identifiers_with_leading_digit_or_underscore() {
        assert_snapshot!(mangle_identifier("0"), @"1_0");
        assert_snapshot!(mangle_identifier("1a"), @"2_1a");
        assert_snapshot!(mangle_identifier("_cpg7abcde"), @"10__cpg7abcde");
        assert_snapshot!(mangle_identifier("a_b"), @"3a_b");
        assert_snapshot!(mangle_identifier("0ü"), @"X5_0_eha");
    }

    #[test]
    fn leading_digits_do_not_extend_length() {
        let mut first = Mangler::new();
        first.mangle_identifier("0");
        first.mangle_identifier("abc");

        let mut second = Mangler::new();
        second.mangle_identifier("03abc");

        assert_snapshot!(first.finalize(), @"1_03abc");
        assert_snapshot!(second.finalize(), @"5_03abc");
    }

    #[test]
    fn punycode_identifiers() {
        assert_snapshot!(mangle_identifier("münchen"), @"X10mnchen_Dya");
        assert_snapshot!(mangle_identifier("ü"), @"X3tda");
        assert_snapshot!(mangle_identifier("foo bar"), @"X12foobar_dpJCa");
        assert_snapshot!(mangle_identifier("closure #1"), @"X16closure1_rtJBbEa");
    }

    #[test]
    fn builtin_types() {
        assert_snapshot!(mangle_type(&Type::BuiltinInteger { bits: 64 }), @"Bi64_");
        assert_snapshot!(mangle_type(&Type::BuiltinFloat { bits: 32 }), @"Bf32_");
        assert_snapshot!(mangle_type(&Type::RawPointer), @"Bp");
    }

    #[test]
    fn std_types_are_shortened() {
        assert_snapshot!(mangle_type(&Type::int()), @"Si");
        assert_snapshot!(mangle_type(&Type::uint()), @"Su");
        assert_snapshot!(mangle_type(&Type::bool()), @"Sb");
        assert_snapshot!(mangle_type(&Type::float()), @"Sf");
        assert_snapshot!(mangle_type(&Type::double()), @"Sd");
        assert_snapshot!(mangle_type(&Type::string()), @"SS");
    }

    #[test]
    fn nominal_types() {
        assert_snapshot!(mangle_type(&Type::nominal(NominalKind::Struct, "app", "Foo")), @"V3app3Foo");
        assert_snapshot!(mangle_type(&Type::nominal(NominalKind::Enum, STD_MODULE, "Optional")), @"OSs8Optional");
        assert_snapshot!(mangle_type(&Type::nominal(NominalKind::Class, "app", "Node")), @"C3app4Node");
        assert_snapshot!(mangle_type(&Type::nominal(NominalKind::Protocol, "app", "Shape")), @"P3app5Shape");
    }

    #[test]
    fn compound_types() {
        let boxed = Type::BoundGeneric {
            base: NominalType::new(NominalKind::Struct, "app", "Box"),
            arguments: vec![Type::int()],
        };

        assert_snapshot!(mangle_type(&boxed), @"GV3app3BoxSi_");
        assert_snapshot!(mangle_type(&Type::Tuple(vec![Type::int(), Type::bool()])), @"TSiSb_");
        assert_snapshot!(mangle_type(&Type::unit()), @"T_");
        assert_snapshot!(mangle_type(&Type::function(vec![Type::int()], Type::bool())), @"FTSi_Sb");
    }

    #[test]
    fn generic_params() {
        assert_snapshot!(mangle_type(&Type::GenericParam { depth: 0, index: 0 }), @"Q_");
        assert_snapshot!(mangle_type(&Type::GenericParam { depth: 0, index: 2 }), @"Q1_");
        assert_snapshot!(mangle_type(&Type::GenericParam { depth: 1, index: 0 }), @"Qd1__");
    }

    #[test]
    fn protocol_conformance() {
        let conformance = ProtocolConformance::new(
            Type::int(),
            ProtocolDecl::new(STD_MODULE, "Equatable"),
            STD_MODULE,
        );

        let mut mangler = Mangler::new();
        mangler.mangle_protocol_conformance(&conformance);

        assert_snapshot!(mangler.finalize(), @"SiSs9EquatableSs");
    }

    #[test]
    fn mangled_types_use_symbol_alphabet() {
        let ty = Type::function(
            vec![Type::nominal(NominalKind::Struct, "straße", "Größe")],
            Type::GenericParam { depth: 2, index: 5 },
        );

        assert!(mangle_type(&ty).chars().all(is_symbol_char));
    }
}
