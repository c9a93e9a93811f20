use error_snippet_derive::Diagnostic;

#[derive(Diagnostic, Debug)]
#[diagnostic(message = "function {name} is already defined in module {module}", code = "SIL0001")]
pub struct DuplicateFunction {
    pub name: String,
    pub module: String,
}

#[derive(Diagnostic, Debug)]
#[diagnostic(message = "no function named {name} in module {module}", code = "SIL0002")]
pub struct MissingFunction {
    pub name: String,
    pub module: String,
}
