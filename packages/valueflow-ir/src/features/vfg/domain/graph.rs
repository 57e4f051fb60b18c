//! Value-flow graph container
//!
//! Arena-owned nodes and edges; adjacency is kept as index lists and every
//! cross-reference is a node id. Edge insertion is idempotent: an edge with
//! the same kind (and call-site tag) between the same ordered node pair is
//! never duplicated, so re-running a wiring pass is a safe no-op.

use rustc_hash::{FxHashMap, FxHashSet};

use super::edge::{VfgEdge, VfgEdgeKind};
use super::node::{VfgNode, VfgNodeId, VfgNodeKind};
use crate::shared::ir::{IcfgId, StmtId};

/// The sparse value-flow graph
#[derive(Debug, Default)]
pub struct Vfg {
    nodes: Vec<VfgNode>,
    edges: Vec<VfgEdge>,
    edge_set: FxHashSet<VfgEdge>,
    succs: FxHashMap<VfgNodeId, Vec<usize>>,
    preds: FxHashMap<VfgNodeId, Vec<usize>>,
    stmt_nodes: FxHashMap<StmtId, VfgNodeId>,
}

impl Vfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id
    pub fn add_node(&mut self, loc: IcfgId, kind: VfgNodeKind) -> VfgNodeId {
        let id = self.nodes.len() as VfgNodeId;
        let node = VfgNode { id, loc, kind };
        if let Some(stmt) = node.stmt() {
            self.stmt_nodes.insert(stmt, id);
        }
        self.nodes.push(node);
        id
    }

    /// Add an edge. Returns false (and changes nothing) when an edge of the
    /// same kind already connects the ordered pair.
    pub fn add_edge(&mut self, src: VfgNodeId, dst: VfgNodeId, kind: VfgEdgeKind) -> bool {
        let edge = VfgEdge::new(src, dst, kind);
        if !self.edge_set.insert(edge) {
            return false;
        }
        let idx = self.edges.len();
        self.edges.push(edge);
        self.succs.entry(src).or_default().push(idx);
        self.preds.entry(dst).or_default().push(idx);
        true
    }

    #[inline]
    pub fn node(&self, id: VfgNodeId) -> Option<&VfgNode> {
        self.nodes.get(id as usize)
    }

    pub(crate) fn node_mut(&mut self, id: VfgNodeId) -> Option<&mut VfgNode> {
        self.nodes.get_mut(id as usize)
    }

    #[inline]
    pub fn nodes(&self) -> &[VfgNode] {
        &self.nodes
    }

    #[inline]
    pub fn edges(&self) -> &[VfgEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The node created for an IR statement
    pub fn node_of_stmt(&self, stmt: StmtId) -> Option<VfgNodeId> {
        self.stmt_nodes.get(&stmt).copied()
    }

    /// Outgoing edges of a node
    pub fn succs_of(&self, id: VfgNodeId) -> impl Iterator<Item = &VfgEdge> {
        self.succs
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    /// Incoming edges of a node
    pub fn preds_of(&self, id: VfgNodeId) -> impl Iterator<Item = &VfgEdge> {
        self.preds
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    /// Whether an edge of the given kind connects the ordered pair
    pub fn has_edge(&self, src: VfgNodeId, dst: VfgNodeId, kind: VfgEdgeKind) -> bool {
        self.edge_set.contains(&VfgEdge::new(src, dst, kind))
    }

    /// Nodes of one kind, by discriminant string (test/debug helper)
    pub fn nodes_of_kind(&self, kind: &str) -> impl Iterator<Item = &VfgNode> + '_ {
        let kind = kind.to_owned();
        self.nodes.iter().filter(move |n| n.kind_str() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_dedup() {
        let mut vfg = Vfg::new();
        let a = vfg.add_node(0, VfgNodeKind::NullPtr);
        let b = vfg.add_node(1, VfgNodeKind::Copy { stmt: 0 });

        assert!(vfg.add_edge(a, b, VfgEdgeKind::Direct));
        assert!(!vfg.add_edge(a, b, VfgEdgeKind::Direct));
        assert_eq!(vfg.edge_count(), 1);

        // A different call-site tag is a different edge
        assert!(vfg.add_edge(a, b, VfgEdgeKind::Call(1)));
        assert!(vfg.add_edge(a, b, VfgEdgeKind::Call(2)));
        assert!(!vfg.add_edge(a, b, VfgEdgeKind::Call(1)));
        assert_eq!(vfg.edge_count(), 3);
    }

    #[test]
    fn test_adjacency() {
        let mut vfg = Vfg::new();
        let a = vfg.add_node(0, VfgNodeKind::Addr { stmt: 0 });
        let b = vfg.add_node(1, VfgNodeKind::Copy { stmt: 1 });
        vfg.add_edge(a, b, VfgEdgeKind::Direct);

        assert_eq!(vfg.succs_of(a).count(), 1);
        assert_eq!(vfg.preds_of(b).count(), 1);
        assert_eq!(vfg.preds_of(a).count(), 0);
        assert_eq!(vfg.node_of_stmt(1), Some(b));
    }
}
