//! Class-hierarchy lookup surface
//!
//! The hierarchy itself (vtable layout parsing, subtype closure) is built by
//! the front-end; the analysis only consumes candidate target sets for
//! virtual call sites.

use rustc_hash::FxHashMap;

use super::{CallSiteId, FuncId};

/// Virtual-call candidate targets per call site
#[derive(Debug, Default, Clone)]
pub struct ClassHierarchy {
    targets: FxHashMap<CallSiteId, Vec<FuncId>>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the candidate targets of a virtual call site
    pub fn set_targets(&mut self, cs: CallSiteId, funcs: Vec<FuncId>) {
        self.targets.insert(cs, funcs);
    }

    /// Candidate targets of a virtual call site (empty when unknown)
    pub fn targets(&self, cs: CallSiteId) -> &[FuncId] {
        self.targets.get(&cs).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets() {
        let mut chg = ClassHierarchy::new();
        chg.set_targets(3, vec![10, 11]);

        assert_eq!(chg.targets(3), &[10, 11]);
        assert!(chg.targets(4).is_empty());
    }
}
