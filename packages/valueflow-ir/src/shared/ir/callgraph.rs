//! Call graph
//!
//! Caller→callee edges keyed by call-site identity, supplied by the
//! front-end and extended by the solver when indirect calls resolve.
//! Thread fork/join edges live here too and are treated symmetrically to
//! call/return by the value-flow builder.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{CallSiteId, FuncId};

/// Kind of an interprocedural edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallEdgeKind {
    /// Ordinary direct call
    Call,

    /// Virtual call resolved through the class hierarchy
    Virtual,

    /// Thread spawn (parameter flow only)
    Fork,

    /// Thread join (return flow only)
    Join,
}

impl CallEdgeKind {
    /// Whether arguments flow into the callee along this edge
    #[inline]
    pub fn passes_params(&self) -> bool {
        matches!(self, CallEdgeKind::Call | CallEdgeKind::Virtual | CallEdgeKind::Fork)
    }

    /// Whether the callee's return flows back along this edge
    #[inline]
    pub fn passes_return(&self) -> bool {
        matches!(self, CallEdgeKind::Call | CallEdgeKind::Virtual | CallEdgeKind::Join)
    }
}

/// One caller→callee edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallEdge {
    pub cs: CallSiteId,
    pub caller: FuncId,
    pub callee: FuncId,
    pub kind: CallEdgeKind,
}

/// The whole-program call graph
#[derive(Debug, Default, Clone)]
pub struct CallGraph {
    edges: Vec<CallEdge>,
    by_cs: FxHashMap<CallSiteId, Vec<usize>>,
    by_callee: FxHashMap<FuncId, Vec<usize>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge; duplicates (same site, callee and kind) are ignored.
    /// Returns true iff the graph changed.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if let Some(idxs) = self.by_cs.get(&edge.cs) {
            if idxs.iter().any(|&i| self.edges[i] == edge) {
                return false;
            }
        }
        let idx = self.edges.len();
        self.edges.push(edge);
        self.by_cs.entry(edge.cs).or_default().push(idx);
        self.by_callee.entry(edge.callee).or_default().push(idx);
        true
    }

    /// All edges out of a call site
    pub fn edges_at(&self, cs: CallSiteId) -> impl Iterator<Item = &CallEdge> {
        self.by_cs
            .get(&cs)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    /// All edges targeting a callee
    pub fn edges_into(&self, callee: FuncId) -> impl Iterator<Item = &CallEdge> {
        self.by_callee
            .get(&callee)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    pub fn edges(&self) -> impl Iterator<Item = &CallEdge> {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut cg = CallGraph::new();
        let e = CallEdge {
            cs: 1,
            caller: 0,
            callee: 2,
            kind: CallEdgeKind::Call,
        };
        assert!(cg.add_edge(e));
        assert!(!cg.add_edge(e)); // dedup

        assert_eq!(cg.edges_at(1).count(), 1);
        assert_eq!(cg.edges_into(2).count(), 1);
        assert_eq!(cg.edges_at(9).count(), 0);
    }

    #[test]
    fn test_edge_kind_flow() {
        assert!(CallEdgeKind::Call.passes_params());
        assert!(CallEdgeKind::Call.passes_return());
        assert!(CallEdgeKind::Fork.passes_params());
        assert!(!CallEdgeKind::Fork.passes_return());
        assert!(!CallEdgeKind::Join.passes_params());
        assert!(CallEdgeKind::Join.passes_return());
    }
}
