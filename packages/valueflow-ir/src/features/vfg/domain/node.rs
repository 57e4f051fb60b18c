//! Value-flow graph nodes
//!
//! A node is a definition site for a value: one per relevant IR statement,
//! plus parameter/return nodes at call boundaries, phi merges, the memory-SSA
//! chi/mu family for address-taken storage, and a single null-pointer node
//! that serves as the reachable definition of every pointer that is never
//! explicitly defined.
//!
//! Nodes are created once during construction and never mutated afterwards,
//! except that formal-parameter and merge nodes accumulate the call edges
//! feeding them as provenance.

use crate::features::points_to::PointsToSet;
use crate::shared::ir::{CallEdge, CallSiteId, FuncId, IcfgId, StmtId, VarId};

/// Value-flow node identifier
pub type VfgNodeId = u32;

/// Which interprocedural merge an [`VfgNodeKind::InterPhi`] models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhiRole {
    /// Several call edges feed one formal parameter at function entry
    FormalParamMerge { func: FuncId, index: usize },

    /// Several callees may return into one call site
    ActualRetMerge { cs: CallSiteId },
}

/// Node kinds
#[derive(Debug, Clone)]
pub enum VfgNodeKind {
    /// Address-of: a root definition, never receives a direct-value edge
    Addr { stmt: StmtId },

    /// Top-level copy
    Copy { stmt: StmtId },

    /// Field/element addressing
    Gep { stmt: StmtId },

    /// Memory read into a top-level variable
    Load { stmt: StmtId },

    /// Memory write: defines a new version of the destination's storage
    Store { stmt: StmtId },

    /// Intraprocedural merge of top-level definitions
    IntraPhi { stmt: StmtId, var: VarId },

    /// Interprocedural merge (formal-parameter or actual-return)
    InterPhi {
        var: VarId,
        role: PhiRole,
        edges: Vec<CallEdge>,
    },

    /// Argument use at a call site
    ActualParam {
        cs: CallSiteId,
        index: usize,
        var: VarId,
    },

    /// Parameter definition at function entry; accumulates the call edges
    /// that target it
    FormalParam {
        func: FuncId,
        index: usize,
        var: VarId,
        edges: Vec<CallEdge>,
    },

    /// Return-value definition at a call site
    ActualRet { cs: CallSiteId, var: VarId },

    /// Return-value use at function exit; accumulates its return edges
    FormalRet {
        func: FuncId,
        var: VarId,
        edges: Vec<CallEdge>,
    },

    /// The unique dummy definition source for undefined pointers
    NullPtr,

    /// Function-entry memory definition for a region
    EntryChi { func: FuncId, region: PointsToSet },

    /// Call-site memory definition (callee may modify the region)
    CallChi { cs: CallSiteId, region: PointsToSet },

    /// Call-site memory use (callee may read the region)
    CallMu { cs: CallSiteId, region: PointsToSet },

    /// Function-exit memory use for a region
    RetMu { func: FuncId, region: PointsToSet },

    /// Merge of memory versions
    MemPhi { func: FuncId, region: PointsToSet },
}

/// One value-flow node
#[derive(Debug, Clone)]
pub struct VfgNode {
    pub id: VfgNodeId,

    /// Program-location association
    pub loc: IcfgId,

    pub kind: VfgNodeKind,
}

impl VfgNode {
    /// The IR statement this node represents, for statement nodes
    pub fn stmt(&self) -> Option<StmtId> {
        match &self.kind {
            VfgNodeKind::Addr { stmt }
            | VfgNodeKind::Copy { stmt }
            | VfgNodeKind::Gep { stmt }
            | VfgNodeKind::Load { stmt }
            | VfgNodeKind::Store { stmt }
            | VfgNodeKind::IntraPhi { stmt, .. } => Some(*stmt),
            _ => None,
        }
    }

    /// Formal-parameter view covering both the plain node and the merge form
    pub fn formal_param(&self) -> Option<(FuncId, usize, VarId, &[CallEdge])> {
        match &self.kind {
            VfgNodeKind::FormalParam {
                func,
                index,
                var,
                edges,
            } => Some((*func, *index, *var, edges)),
            VfgNodeKind::InterPhi {
                var,
                role: PhiRole::FormalParamMerge { func, index },
                edges,
            } => Some((*func, *index, *var, edges)),
            _ => None,
        }
    }

    /// Actual-return view covering both the plain node and the merge form
    pub fn actual_ret(&self) -> Option<(CallSiteId, VarId)> {
        match &self.kind {
            VfgNodeKind::ActualRet { cs, var } => Some((*cs, *var)),
            VfgNodeKind::InterPhi {
                var,
                role: PhiRole::ActualRetMerge { cs },
                ..
            } => Some((*cs, *var)),
            _ => None,
        }
    }

    /// The memory region of a chi/mu/mem-phi node
    pub fn region(&self) -> Option<&PointsToSet> {
        match &self.kind {
            VfgNodeKind::EntryChi { region, .. }
            | VfgNodeKind::CallChi { region, .. }
            | VfgNodeKind::CallMu { region, .. }
            | VfgNodeKind::RetMu { region, .. }
            | VfgNodeKind::MemPhi { region, .. } => Some(region),
            _ => None,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match &self.kind {
            VfgNodeKind::Addr { .. } => "addr",
            VfgNodeKind::Copy { .. } => "copy",
            VfgNodeKind::Gep { .. } => "gep",
            VfgNodeKind::Load { .. } => "load",
            VfgNodeKind::Store { .. } => "store",
            VfgNodeKind::IntraPhi { .. } => "intra-phi",
            VfgNodeKind::InterPhi { .. } => "inter-phi",
            VfgNodeKind::ActualParam { .. } => "actual-param",
            VfgNodeKind::FormalParam { .. } => "formal-param",
            VfgNodeKind::ActualRet { .. } => "actual-ret",
            VfgNodeKind::FormalRet { .. } => "formal-ret",
            VfgNodeKind::NullPtr => "nullptr",
            VfgNodeKind::EntryChi { .. } => "entry-chi",
            VfgNodeKind::CallChi { .. } => "call-chi",
            VfgNodeKind::CallMu { .. } => "call-mu",
            VfgNodeKind::RetMu { .. } => "ret-mu",
            VfgNodeKind::MemPhi { .. } => "mem-phi",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::CallEdgeKind;

    #[test]
    fn test_formal_param_views() {
        let plain = VfgNode {
            id: 0,
            loc: 0,
            kind: VfgNodeKind::FormalParam {
                func: 1,
                index: 0,
                var: 7,
                edges: vec![],
            },
        };
        assert_eq!(plain.formal_param().map(|(f, i, v, _)| (f, i, v)), Some((1, 0, 7)));

        let merge = VfgNode {
            id: 1,
            loc: 0,
            kind: VfgNodeKind::InterPhi {
                var: 7,
                role: PhiRole::FormalParamMerge { func: 1, index: 0 },
                edges: vec![CallEdge {
                    cs: 3,
                    caller: 0,
                    callee: 1,
                    kind: CallEdgeKind::Call,
                }],
            },
        };
        let (f, i, v, edges) = merge.formal_param().unwrap();
        assert_eq!((f, i, v), (1, 0, 7));
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_stmt_only_on_statement_nodes() {
        let n = VfgNode {
            id: 0,
            loc: 0,
            kind: VfgNodeKind::NullPtr,
        };
        assert_eq!(n.stmt(), None);
        assert_eq!(n.kind_str(), "nullptr");
    }
}
