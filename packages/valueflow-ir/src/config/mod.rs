//! Analysis configuration
//!
//! Knobs recognized by the pointer analysis and the value-flow builder.
//! Defaults match the standard whole-program run; builders and solvers take
//! an `AnalysisOptions` by reference and never mutate it.

/// Configuration for a whole-program analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Caps distinct field-sensitive sub-objects per base object.
    /// Offsets beyond the limit collapse into the limit bucket.
    pub max_field_limit: u32,

    /// When true, a zero-offset gep yields the base object itself rather
    /// than a distinct first-field sub-object.
    pub first_field_eq_base: bool,

    /// When true, taking the address of an untracked value targets the
    /// dedicated black-hole object instead of the null pointer.
    pub handle_black_hole: bool,

    /// Iteration cap for the points-to fixpoint (0 = derived from the
    /// statement count).
    pub max_iterations: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_field_limit: 512,
            first_field_eq_base: true,
            handle_black_hole: true,
            max_iterations: 0,
        }
    }
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field-sensitivity limit
    pub fn with_max_field_limit(mut self, limit: u32) -> Self {
        self.max_field_limit = limit;
        self
    }

    /// Enable/disable first-field collapsing
    pub fn with_first_field_eq_base(mut self, enable: bool) -> Self {
        self.first_field_eq_base = enable;
        self
    }

    /// Enable/disable black-hole modeling for untracked values
    pub fn with_black_hole(mut self, enable: bool) -> Self {
        self.handle_black_hole = enable;
        self
    }

    /// Set the fixpoint iteration cap
    pub fn with_max_iterations(mut self, cap: usize) -> Self {
        self.max_iterations = cap;
        self
    }
}
