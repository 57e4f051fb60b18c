//! Two-pass value-flow graph construction
//!
//! Pass 1 creates one node per relevant statement plus the call-boundary
//! nodes, recording each top-level variable's most recent definition in
//! program order. Pass 2 wires every operand to its recorded definition and
//! adds the interprocedural edges, looked up by call-site identity.
//!
//! Construction assumes a points-to-closed, consistent graph: an operand
//! that carries points-to facts but has no recorded definition fails the
//! build. Pointers without facts fall back to the null-pointer node, the
//! uniform dummy definition.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::errors::{Result, ValueFlowError};
use crate::features::solver::PtaResult;
use crate::features::vfg::domain::{PhiRole, Vfg, VfgEdgeKind, VfgNodeId, VfgNodeKind};
use crate::shared::ir::{
    CallSite, CallSiteId, FuncId, IrGraph, IrStmtKind, VarId,
};

use super::mem_ssa;

/// Builds the sparse value-flow graph from the IR graph and points-to facts
pub struct VfgBuilder<'a> {
    graph: &'a IrGraph,
    pta: &'a PtaResult,
    vfg: Vfg,

    /// Most recent definition of each top-level variable, in program order
    def: FxHashMap<VarId, VfgNodeId>,

    null_node: VfgNodeId,
    actual_params: FxHashMap<(CallSiteId, usize), VfgNodeId>,
    actual_rets: FxHashMap<CallSiteId, VfgNodeId>,
}

impl<'a> VfgBuilder<'a> {
    pub fn new(graph: &'a IrGraph, pta: &'a PtaResult) -> Self {
        Self {
            graph,
            pta,
            vfg: Vfg::new(),
            def: FxHashMap::default(),
            null_node: 0,
            actual_params: FxHashMap::default(),
            actual_rets: FxHashMap::default(),
        }
    }

    /// Run both passes and the memory-SSA wiring
    pub fn build(mut self) -> Result<Vfg> {
        self.add_vfg_nodes();
        self.connect_direct_edges()?;
        mem_ssa::add_indirect_flow(&mut self.vfg, self.graph, self.pta)?;
        info!(
            nodes = self.vfg.node_count(),
            edges = self.vfg.edge_count(),
            "value-flow graph constructed"
        );
        Ok(self.vfg)
    }

    #[cfg(test)]
    pub(crate) fn vfg(&self) -> &Vfg {
        &self.vfg
    }

    /// A variable participates in pointer value flow when the analysis
    /// resolved any target for it; everything else is pruned at the call
    /// boundaries to keep the graph sparse.
    fn interesting(&self, v: VarId) -> bool {
        !self.pta.pts(v).is_empty()
    }

    // ── Pass 1: node creation ─────────────────────────────────────────────

    pub(crate) fn add_vfg_nodes(&mut self) {
        self.null_node = self.vfg.add_node(0, VfgNodeKind::NullPtr);

        // Call-boundary nodes at function entries/exits first: parameters
        // are defined before any body statement executes.
        for func in self.graph.funcs() {
            self.add_formal_nodes(func.id);
        }

        // Statement nodes in program order, threading the definition map.
        for stmt in self.graph.stmts() {
            match &stmt.kind {
                IrStmtKind::Addr { dst, .. } => {
                    let n = self.vfg.add_node(stmt.loc, VfgNodeKind::Addr { stmt: stmt.id });
                    self.def.insert(*dst, n);
                }
                IrStmtKind::Copy { dst, .. } => {
                    let n = self.vfg.add_node(stmt.loc, VfgNodeKind::Copy { stmt: stmt.id });
                    self.def.insert(*dst, n);
                }
                IrStmtKind::Gep { dst, .. } => {
                    let n = self.vfg.add_node(stmt.loc, VfgNodeKind::Gep { stmt: stmt.id });
                    self.def.insert(*dst, n);
                }
                IrStmtKind::Load { dst, .. } => {
                    let n = self.vfg.add_node(stmt.loc, VfgNodeKind::Load { stmt: stmt.id });
                    self.def.insert(*dst, n);
                }
                IrStmtKind::Store { .. } => {
                    // Defines a new memory version, not a top-level value
                    self.vfg.add_node(stmt.loc, VfgNodeKind::Store { stmt: stmt.id });
                }
                IrStmtKind::Phi { dst, .. } => {
                    let n = self.vfg.add_node(
                        stmt.loc,
                        VfgNodeKind::IntraPhi { stmt: stmt.id, var: *dst },
                    );
                    self.def.insert(*dst, n);
                }
                IrStmtKind::Call { cs }
                | IrStmtKind::ThreadFork { cs }
                | IrStmtKind::ThreadJoin { cs } => {
                    self.add_callsite_nodes(*cs);
                }
                // Cmp/BinOp/UnOp/Branch/Ret define no pointer value
                _ => {}
            }
        }
        debug!(nodes = self.vfg.node_count(), "node creation pass done");
    }

    fn add_formal_nodes(&mut self, func: FuncId) {
        let f = &self.graph.funcs()[func as usize];

        for (index, &param) in f.params.iter().enumerate() {
            if !self.interesting(param) {
                continue;
            }
            let edges: Vec<_> = self
                .graph
                .call_graph
                .edges_into(func)
                .filter(|e| e.kind.passes_params())
                .copied()
                .collect();
            // Multiple feeding call edges make this a formal-parameter merge
            let kind = if edges.len() > 1 {
                VfgNodeKind::InterPhi {
                    var: param,
                    role: PhiRole::FormalParamMerge { func, index },
                    edges,
                }
            } else {
                VfgNodeKind::FormalParam {
                    func,
                    index,
                    var: param,
                    edges,
                }
            };
            let n = self.vfg.add_node(f.entry, kind);
            self.def.insert(param, n);
        }

        if let Some(ret) = f.ret {
            let edges: Vec<_> = self
                .graph
                .call_graph
                .edges_into(func)
                .filter(|e| e.kind.passes_return())
                .copied()
                .collect();
            if self.interesting(ret) || edges.iter().any(|e| self.ret_interesting_at(e.cs)) {
                self.vfg.add_node(
                    f.entry,
                    VfgNodeKind::FormalRet {
                        func,
                        var: ret,
                        edges,
                    },
                );
            }
        }
    }

    fn ret_interesting_at(&self, cs: CallSiteId) -> bool {
        self.graph
            .callsite(cs)
            .and_then(|site| site.ret)
            .map(|r| self.interesting(r))
            .unwrap_or(false)
    }

    fn add_callsite_nodes(&mut self, cs: CallSiteId) {
        let site = match self.graph.callsite(cs) {
            Some(s) => s,
            None => return,
        };

        for (index, &arg) in site.args.iter().enumerate() {
            if self.interesting(arg) || self.param_interesting_at(site, index) {
                let n = self.vfg.add_node(
                    site.loc,
                    VfgNodeKind::ActualParam { cs, index, var: arg },
                );
                self.actual_params.insert((cs, index), n);
            }
        }

        if let Some(ret) = site.ret {
            let ret_edges: Vec<_> = self
                .graph
                .call_graph
                .edges_at(cs)
                .filter(|e| e.kind.passes_return())
                .copied()
                .collect();
            let callee_interesting = ret_edges.iter().any(|e| {
                self.graph
                    .func(e.callee)
                    .and_then(|f| f.ret)
                    .map(|r| self.interesting(r))
                    .unwrap_or(false)
            });
            if self.interesting(ret) || callee_interesting {
                // Several possible callees make this an actual-return merge
                let kind = if ret_edges.len() > 1 {
                    VfgNodeKind::InterPhi {
                        var: ret,
                        role: PhiRole::ActualRetMerge { cs },
                        edges: ret_edges,
                    }
                } else {
                    VfgNodeKind::ActualRet { cs, var: ret }
                };
                let n = self.vfg.add_node(site.loc, kind);
                self.actual_rets.insert(cs, n);
                self.def.insert(ret, n);
            }
        }
    }

    fn param_interesting_at(&self, site: &CallSite, index: usize) -> bool {
        self.graph
            .call_graph
            .edges_at(site.id)
            .filter(|e| e.kind.passes_params())
            .any(|e| {
                self.graph
                    .func(e.callee)
                    .and_then(|f| f.params.get(index))
                    .map(|&p| self.interesting(p))
                    .unwrap_or(false)
            })
    }

    // ── Pass 2: direct edge wiring ────────────────────────────────────────

    /// Definition of an operand. A pointer with no recorded definition and
    /// no resolved targets reads from the null-pointer node; one that has
    /// targets but no definition means the input graph is inconsistent.
    fn lookup_def(&self, v: VarId) -> Result<VfgNodeId> {
        if let Some(&n) = self.def.get(&v) {
            return Ok(n);
        }
        if self.pta.pts(v).is_empty() {
            return Ok(self.null_node);
        }
        Err(ValueFlowError::graph(format!(
            "operand v{v} has points-to facts but no recorded definition"
        )))
    }

    pub(crate) fn connect_direct_edges(&mut self) -> Result<()> {
        let mut edges: Vec<(VfgNodeId, VfgNodeId, VfgEdgeKind)> = Vec::new();

        for node in self.vfg.nodes() {
            match &node.kind {
                VfgNodeKind::Copy { stmt } => {
                    if let Some(IrStmtKind::Copy { src, .. }) = self.stmt_kind(*stmt) {
                        edges.push((self.lookup_def(*src)?, node.id, VfgEdgeKind::Direct));
                    }
                }
                VfgNodeKind::Gep { stmt } => {
                    if let Some(IrStmtKind::Gep { base, .. }) = self.stmt_kind(*stmt) {
                        edges.push((self.lookup_def(*base)?, node.id, VfgEdgeKind::Direct));
                    }
                }
                VfgNodeKind::Load { stmt } => {
                    if let Some(IrStmtKind::Load { ptr, .. }) = self.stmt_kind(*stmt) {
                        edges.push((self.lookup_def(*ptr)?, node.id, VfgEdgeKind::Direct));
                    }
                }
                VfgNodeKind::Store { stmt } => {
                    // Both operands: the stored value and the destination
                    // pointer, whose definition places this store in the
                    // memory-version chain
                    if let Some(IrStmtKind::Store { ptr, val }) = self.stmt_kind(*stmt) {
                        edges.push((self.lookup_def(*val)?, node.id, VfgEdgeKind::Direct));
                        edges.push((self.lookup_def(*ptr)?, node.id, VfgEdgeKind::Direct));
                    }
                }
                VfgNodeKind::IntraPhi { stmt, .. } => {
                    if let Some(IrStmtKind::Phi { incoming, .. }) = self.stmt_kind(*stmt) {
                        for (_, src) in incoming {
                            edges.push((self.lookup_def(*src)?, node.id, VfgEdgeKind::Direct));
                        }
                    }
                }
                VfgNodeKind::ActualParam { var, .. } => {
                    edges.push((self.lookup_def(*var)?, node.id, VfgEdgeKind::Direct));
                }
                VfgNodeKind::FormalRet { var, edges: ret_edges, .. } => {
                    // Own definition: the returned value's last def in the
                    // callee; then one tagged edge per recorded return edge
                    edges.push((self.lookup_def(*var)?, node.id, VfgEdgeKind::Direct));
                    for e in ret_edges {
                        if let Some(&actual) = self.actual_rets.get(&e.cs) {
                            edges.push((node.id, actual, VfgEdgeKind::Ret(e.cs)));
                        }
                    }
                }
                _ => {}
            }

            // Formal parameters (plain or merge): one tagged edge per
            // feeding call edge, matched by call-site identity
            if let Some((_, index, _, call_edges)) = node.formal_param() {
                for e in call_edges {
                    match self.actual_params.get(&(e.cs, index)) {
                        Some(&actual) => {
                            edges.push((actual, node.id, VfgEdgeKind::Call(e.cs)));
                        }
                        None => {
                            return Err(ValueFlowError::graph(format!(
                                "call site {} has no actual parameter {} for its callee",
                                e.cs, index
                            )));
                        }
                    }
                }
            }
        }

        let mut added = 0usize;
        for (src, dst, kind) in edges {
            if self.vfg.add_edge(src, dst, kind) {
                added += 1;
            }
        }
        debug!(edges = added, "direct edge wiring pass done");
        Ok(())
    }

    fn stmt_kind(&self, stmt: crate::shared::ir::StmtId) -> Option<&IrStmtKind> {
        self.graph.stmt(stmt).map(|s| &s.kind)
    }
}

/// Convenience entry point: build the VFG for a solved program
pub fn build_vfg(graph: &IrGraph, pta: &PtaResult) -> Result<Vfg> {
    VfgBuilder::new(graph, pta).build()
}
