//! Value-flow graph edges
//!
//! Direct def-use edges between nodes. Intraprocedural edges carry no tag;
//! interprocedural call/return edges carry the call-site id so that several
//! call sites into one callee stay distinguishable (the context-sensitivity
//! hook). Memory def-use uses the indirect kind.

use serde::{Deserialize, Serialize};

use super::node::VfgNodeId;
use crate::shared::ir::CallSiteId;

/// Edge kind; part of the dedup key together with the ordered node pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VfgEdgeKind {
    /// Intraprocedural direct def-use
    Direct,

    /// Interprocedural edge into a callee, tagged by call site
    Call(CallSiteId),

    /// Interprocedural edge back to a call site, tagged by call site
    Ret(CallSiteId),

    /// Memory (address-taken) def-use
    Indirect,
}

/// One def-use edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VfgEdge {
    pub src: VfgNodeId,
    pub dst: VfgNodeId,
    pub kind: VfgEdgeKind,
}

impl VfgEdge {
    pub fn new(src: VfgNodeId, dst: VfgNodeId, kind: VfgEdgeKind) -> Self {
        Self { src, dst, kind }
    }

    #[inline]
    pub fn is_interprocedural(&self) -> bool {
        matches!(self.kind, VfgEdgeKind::Call(_) | VfgEdgeKind::Ret(_))
    }

    /// The call-site tag of an interprocedural edge
    pub fn callsite(&self) -> Option<CallSiteId> {
        match self.kind {
            VfgEdgeKind::Call(cs) | VfgEdgeKind::Ret(cs) => Some(cs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_tags() {
        let e = VfgEdge::new(1, 2, VfgEdgeKind::Call(9));
        assert!(e.is_interprocedural());
        assert_eq!(e.callsite(), Some(9));

        let d = VfgEdge::new(1, 2, VfgEdgeKind::Direct);
        assert!(!d.is_interprocedural());
        assert_eq!(d.callsite(), None);
    }
}
