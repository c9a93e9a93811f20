/// Options which control how a module is optimized and what is printed
/// along the way.
#[derive(Default, Debug, Clone)]
pub struct Options {
    /// Defines whether the optimized SIL should be printed to `stdio`.
    pub print_sil: SilPrinting,

    /// Defines the optimization level for the module.
    pub optimize: OptimizationLevel,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilPrinting {
    #[default]
    None,
    Pretty,
    Debug,
}

/// Defines how much the module should be optimized.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationLevel {
    #[default]
    O0,
    O1,
    O2,
    O3,
    Os,
    Oz,
}

impl OptimizationLevel {
    /// Gets how aggressively the level optimizes for execution speed, from
    /// `0` (not at all) to `3`.
    pub fn speed_level(self) -> u8 {
        match self {
            Self::O0 => 0,
            Self::O1 | Self::Oz => 1,
            Self::O2 | Self::Os => 2,
            Self::O3 => 3,
        }
    }

    /// Gets how aggressively the level optimizes for code size, from `0`
    /// (not at all) to `2`.
    pub fn size_level(self) -> u8 {
        match self {
            Self::O0 | Self::O1 | Self::O2 | Self::O3 => 0,
            Self::Os => 1,
            Self::Oz => 2,
        }
    }
}
