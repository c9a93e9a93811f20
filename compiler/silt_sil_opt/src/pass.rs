mod closure_specializer;

use silt_errors::{DiagCtx, Result};
use silt_session::OptimizationLevel;
use silt_sil::Module;

/// Defines a SIL optimization pass which can be executed over a module.
pub(crate) trait OptimizerPass {
    /// Creates a new instance of the pass with default settings.
    fn new() -> Self;

    /// Determines whether the pass is enabled for the given optimization level.
    fn enabled(level: OptimizationLevel) -> bool;

    /// Executes the pass on the given module.
    ///
    /// Returns whether the pass changed the module.
    fn execute(&mut self, module: &mut Module) -> Result<bool>;
}

/// Executes the given optimizer pass on the given module, if the pass is
/// enabled under the optimization level.
///
/// Errors raised by the pass are reported to `dcx`.
#[inline]
pub(crate) fn run_pass<P: OptimizerPass>(module: &mut Module, level: OptimizationLevel, dcx: &DiagCtx) -> bool {
    if !P::enabled(level) {
        return false;
    }

    let mut pass = P::new();

    match pass.execute(module) {
        Ok(changed) => changed,
        Err(err) => {
            dcx.emit(err);
            false
        }
    }
}

/// Attempts to run all optimization passes which have been enabled by `level`
/// on the given module.
#[inline]
pub(crate) fn run_all_passes(module: &mut Module, level: OptimizationLevel, dcx: &DiagCtx) -> bool {
    let mut changed = false;

    changed |= run_pass::<closure_specializer::ClosureSpecializer>(module, level, dcx);

    changed
}
