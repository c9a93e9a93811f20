mod builder;
pub mod errors;
mod function;
mod inst;
mod ty;

use indexmap::IndexMap;
use silt_errors::Result;

pub use crate::builder::FunctionBuilder;
pub use crate::function::*;
pub use crate::inst::*;
pub use crate::ty::*;

/// Represents all functions and globals within a single SIL module.
///
/// Functions are identified by their (mangled) name, which is unique within
/// the module. The map keeps insertion order, so iteration is deterministic.
#[derive(Default, Debug, Clone)]
pub struct Module {
    pub name: String,

    functions: IndexMap<String, Function>,
    globals: IndexMap<String, Type>,
}

impl Module {
    /// Creates a new empty [`Module`].
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds the given function to the module.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a function with the same name already exists.
    pub fn add_function(&mut self, func: Function) -> Result<()> {
        if self.functions.contains_key(&func.name) {
            return Err(errors::DuplicateFunction {
                name: func.name,
                module: self.name.clone(),
            }
            .into());
        }

        self.functions.insert(func.name.clone(), func);

        Ok(())
    }

    /// Returns a reference to the function with the given name, if any.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Returns a mutable reference to the function with the given name, if any.
    pub fn function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.get_mut(name)
    }

    /// Returns a reference to the function with the given name.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no function with the given name exists.
    pub fn expect_function(&self, name: &str) -> Result<&Function> {
        self.function(name).ok_or_else(|| {
            errors::MissingFunction {
                name: name.to_string(),
                module: self.name.clone(),
            }
            .into()
        })
    }

    /// Returns a mutable reference to the function with the given name.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no function with the given name exists.
    pub fn expect_function_mut(&mut self, name: &str) -> Result<&mut Function> {
        let module = self.name.clone();

        self.functions.get_mut(name).ok_or_else(|| {
            errors::MissingFunction {
                name: name.to_string(),
                module,
            }
            .into()
        })
    }

    /// Determines whether the module holds a function with the given name.
    pub fn contains_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Iterates over all functions in the module, in insertion order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    /// Declares a global variable of the given type.
    pub fn add_global(&mut self, name: impl Into<String>, ty: Type) {
        self.globals.insert(name.into(), ty);
    }

    /// Returns the type of the global with the given name, if any.
    pub fn global(&self, name: &str) -> Option<&Type> {
        self.globals.get(name)
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "sil_module {}", self.name)?;

        for (name, ty) in &self.globals {
            writeln!(f, "sil_global @{name} : {ty}")?;
        }

        for func in self.functions.values() {
            writeln!(f)?;
            write!(f, "{func}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use silt_errors::Result;

    use super::*;

    fn func(name: &str) -> Function {
        Function::declaration(name, Signature::new(vec![Type::int()], Type::unit()))
    }

    #[test]
    fn add_and_find_function() -> Result<()> {
        let mut module = Module::new("app");
        module.add_function(func("foo"))?;

        assert!(module.contains_function("foo"));
        assert_eq!(module.expect_function("foo")?.name, "foo");
        assert!(module.function("bar").is_none());

        Ok(())
    }

    #[test]
    fn duplicate_function_is_rejected() -> Result<()> {
        let mut module = Module::new("app");
        module.add_function(func("foo"))?;

        let err = module.add_function(func("foo")).unwrap_err();
        assert_eq!(err.message(), "function foo is already defined in module app");

        Ok(())
    }

    #[test]
    fn missing_function_is_reported() {
        let module = Module::new("app");
        let err = module.expect_function("foo").unwrap_err();

        assert_eq!(err.message(), "no function named foo in module app");
    }

    #[test]
    fn functions_keep_insertion_order() -> Result<()> {
        let mut module = Module::new("app");
        module.add_function(func("b"))?;
        module.add_function(func("a"))?;

        let names = module.functions().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "a"]);

        Ok(())
    }

    #[test]
    fn display_module() -> Result<()> {
        let mut module = Module::new("app");
        module.add_global("counter", Type::int());
        module.add_function(func("foo"))?;

        assert_eq!(
            module.to_string(),
            "sil_module app\nsil_global @counter : std.Int\n\nsil @foo : (std.Int) -> ()\n"
        );

        Ok(())
    }
}
