pub(crate) mod pass;

use silt_errors::DiagCtx;
use silt_session::{Options, SilPrinting};
use silt_sil::Module;

pub struct Optimizer<'a> {
    /// Defines the SIL module which is being optimized.
    module: Module,

    /// Defines the options which decide which passes are run.
    options: &'a Options,

    dcx: DiagCtx,
}

impl<'a> Optimizer<'a> {
    /// Creates a new optimizer over the given module.
    pub fn new(options: &'a Options, dcx: DiagCtx, module: Module) -> Self {
        Self { module, options, dcx }
    }

    /// Completes the optimizer and returns the optimized [`Module`].
    pub fn finish(self) -> Module {
        self.module
    }

    /// Optimizes the given module, configured by the optimization flags in
    /// `options`.
    pub fn optimize(options: &'a Options, dcx: DiagCtx, module: Module) -> Module {
        let mut optimizer = Self::new(options, dcx, module);
        optimizer.execute();
        optimizer.finish()
    }

    /// Invokes all enabled optimization passes on the contained [`Module`].
    ///
    /// Returns whether any of the passes changed the module.
    pub fn execute(&mut self) -> bool {
        let level = self.options.optimize;
        let changed = pass::run_all_passes(&mut self.module, level, &self.dcx);

        match self.options.print_sil {
            SilPrinting::None => {}
            SilPrinting::Pretty => println!("{}", self.module),
            SilPrinting::Debug => println!("{:#?}", self.module),
        }

        changed
    }
}
