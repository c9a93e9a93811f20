/// Name of the standard library module. Types declared within it receive
/// shortened manglings.
pub const STD_MODULE: &str = "std";

/// Defines the kind of a nominal type declaration.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalKind {
    Struct,
    Enum,
    Class,
    Protocol,
}

/// Refers to a nominal type declaration by the module it was declared in
/// and its name within that module.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct NominalType {
    pub kind: NominalKind,
    pub module: String,
    pub name: String,
}

impl NominalType {
    pub fn new(kind: NominalKind, module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            module: module.into(),
            name: name.into(),
        }
    }

    /// Determines whether the type is declared within the standard library.
    pub fn is_std(&self) -> bool {
        self.module == STD_MODULE
    }
}

impl std::fmt::Display for NominalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Defines a canonical type within SIL.
///
/// Types are always canonical: there are no aliases or sugared forms, so two
/// equal types are always structurally equal.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Builtin integer type with the given bit width.
    BuiltinInteger { bits: u16 },

    /// Builtin floating-point type with the given bit width.
    BuiltinFloat { bits: u16 },

    /// Builtin untyped pointer.
    RawPointer,

    /// Nominal type without any generic arguments.
    Nominal(NominalType),

    /// Nominal type with all of its generic parameters bound.
    BoundGeneric { base: NominalType, arguments: Vec<Type> },

    /// Tuple of zero-or-more element types. The empty tuple is the unit type.
    Tuple(Vec<Type>),

    /// Function type taking the given parameters and returning `result`.
    Function { parameters: Vec<Type>, result: Box<Type> },

    /// Generic parameter, identified by its depth and index within the
    /// generic signature.
    GenericParam { depth: u32, index: u32 },
}

impl Type {
    fn std_struct(name: &str) -> Self {
        Type::Nominal(NominalType::new(NominalKind::Struct, STD_MODULE, name))
    }

    pub fn int() -> Self {
        Self::std_struct("Int")
    }

    pub fn uint() -> Self {
        Self::std_struct("UInt")
    }

    pub fn bool() -> Self {
        Self::std_struct("Bool")
    }

    pub fn float() -> Self {
        Self::std_struct("Float")
    }

    pub fn double() -> Self {
        Self::std_struct("Double")
    }

    pub fn string() -> Self {
        Self::std_struct("String")
    }

    pub fn unit() -> Self {
        Type::Tuple(Vec::new())
    }

    pub fn nominal(kind: NominalKind, module: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Nominal(NominalType::new(kind, module, name))
    }

    pub fn function(parameters: Vec<Type>, result: Type) -> Self {
        Type::Function {
            parameters,
            result: Box::new(result),
        }
    }

    /// Gets the parameter types of a function type.
    ///
    /// # Panics
    ///
    /// Panics if the type is not a function type.
    pub fn function_parameters(&self) -> &[Type] {
        match self {
            Type::Function { parameters, .. } => parameters,
            _ => panic!("bug!: expected function type, found {self}"),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuiltinInteger { bits } => write!(f, "Builtin.Int{bits}"),
            Self::BuiltinFloat { bits } => write!(f, "Builtin.FPIEEE{bits}"),
            Self::RawPointer => write!(f, "Builtin.RawPointer"),
            Self::Nominal(nominal) => nominal.fmt(f),
            Self::BoundGeneric { base, arguments } => write!(
                f,
                "{base}<{}>",
                arguments
                    .iter()
                    .map(std::string::ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Tuple(elements) => write!(
                f,
                "({})",
                elements
                    .iter()
                    .map(std::string::ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Function { parameters, result } => write!(
                f,
                "({}) -> {result}",
                parameters
                    .iter()
                    .map(std::string::ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::GenericParam { depth, index } => write!(f, "T_{depth}_{index}"),
        }
    }
}

/// Refers to a protocol declaration.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDecl {
    pub module: String,
    pub name: String,
}

impl ProtocolDecl {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ProtocolDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Evidence that a type satisfies the requirements of a protocol, as
/// declared in some module.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConformance {
    pub conforming_type: Type,
    pub protocol: ProtocolDecl,

    /// Name of the module which declares the conformance.
    pub module: String,
}

impl ProtocolConformance {
    pub fn new(conforming_type: Type, protocol: ProtocolDecl, module: impl Into<String>) -> Self {
        Self {
            conforming_type,
            protocol,
            module: module.into(),
        }
    }
}

impl std::fmt::Display for ProtocolConformance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} module {}", self.conforming_type, self.protocol, self.module)
    }
}

/// Binding of a single generic parameter to a replacement type, along with
/// the conformances the replacement provides for the parameter's
/// requirements.
///
/// A conformance may be absent, in which case it is [`None`].
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub replacement: Type,
    pub conformances: Vec<Option<ProtocolConformance>>,
}

impl Substitution {
    pub fn new(replacement: Type, conformances: impl IntoIterator<Item = ProtocolConformance>) -> Self {
        Self {
            replacement,
            conformances: conformances.into_iter().map(Some).collect(),
        }
    }

    /// Creates a substitution where some of the conformances may be absent.
    pub fn with_optional_conformances(replacement: Type, conformances: Vec<Option<ProtocolConformance>>) -> Self {
        Self {
            replacement,
            conformances,
        }
    }
}

impl std::fmt::Display for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.replacement)?;

        for conformance in &self.conformances {
            match conformance {
                Some(conformance) => write!(f, ", {}", conformance.protocol)?,
                None => write!(f, ", <absent>")?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_function_type() {
        let ty = Type::function(vec![Type::int(), Type::bool()], Type::unit());

        assert_eq!(ty.to_string(), "(std.Int, std.Bool) -> ()");
    }

    #[test]
    fn display_bound_generic() {
        let ty = Type::BoundGeneric {
            base: NominalType::new(NominalKind::Struct, "app", "Box"),
            arguments: vec![Type::GenericParam { depth: 0, index: 1 }],
        };

        assert_eq!(ty.to_string(), "app.Box<T_0_1>");
    }

    #[test]
    fn function_parameters_of_function() {
        let ty = Type::function(vec![Type::int()], Type::int());

        assert_eq!(ty.function_parameters(), &[Type::int()]);
    }

    #[test]
    #[should_panic(expected = "expected function type")]
    fn function_parameters_of_non_function() {
        let _ = Type::int().function_parameters();
    }

    #[test]
    fn substitution_wraps_conformances() {
        let equatable = ProtocolDecl::new(STD_MODULE, "Equatable");
        let sub = Substitution::new(
            Type::int(),
            [ProtocolConformance::new(Type::int(), equatable, STD_MODULE)],
        );

        assert_eq!(sub.conformances.len(), 1);
        assert!(sub.conformances[0].is_some());
        assert_eq!(sub.to_string(), "std.Int, std.Equatable");
    }
}
