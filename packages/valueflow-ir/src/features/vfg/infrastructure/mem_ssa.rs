//! Indirect (address-taken) value flow
//!
//! Memory-SSA-style wiring over the statement nodes: every store defines a
//! memory region (the points-to set of its destination pointer), every load
//! uses one. Region flow crosses call boundaries through chi/mu nodes:
//! call-mu carries the caller's memory into the callee's entry-chi, and the
//! callee's ret-mu carries modified regions back into the call-chi at the
//! site. A function whose body produces several memory versions merges them
//! through a mem-phi before its exit.
//!
//! Mod/ref sets are computed transitively over the call graph, so a call
//! site sees everything its callees (and theirs) touch.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::errors::Result;
use crate::features::points_to::PointsToSet;
use crate::features::solver::PtaResult;
use crate::features::vfg::domain::{Vfg, VfgEdgeKind, VfgNodeId, VfgNodeKind};
use crate::shared::ir::{CallSiteId, FuncId, IcfgId, IrGraph, IrStmtKind, StmtId};

#[derive(Default, Clone)]
struct ModRef {
    /// Objects the function (transitively) stores to
    defs: PointsToSet,
    /// Objects the function (transitively) loads from
    uses: PointsToSet,
}

pub(crate) fn add_indirect_flow(vfg: &mut Vfg, graph: &IrGraph, pta: &PtaResult) -> Result<()> {
    let modref = compute_modref(graph, pta);

    // Per-function statement partitions
    let mut stores: FxHashMap<FuncId, Vec<(StmtId, PointsToSet)>> = FxHashMap::default();
    let mut loads: FxHashMap<FuncId, Vec<(StmtId, PointsToSet)>> = FxHashMap::default();
    let mut exits: FxHashMap<FuncId, IcfgId> = FxHashMap::default();
    let mut sites: FxHashMap<FuncId, Vec<CallSiteId>> = FxHashMap::default();

    for stmt in graph.stmts() {
        match &stmt.kind {
            IrStmtKind::Store { ptr, .. } => {
                stores
                    .entry(stmt.func)
                    .or_default()
                    .push((stmt.id, pta.pts(*ptr).clone()));
            }
            IrStmtKind::Load { ptr, .. } => {
                loads
                    .entry(stmt.func)
                    .or_default()
                    .push((stmt.id, pta.pts(*ptr).clone()));
            }
            IrStmtKind::Ret { func, .. } => {
                exits.insert(*func, stmt.loc);
            }
            IrStmtKind::Call { cs } | IrStmtKind::ThreadFork { cs } => {
                sites.entry(stmt.func).or_default().push(*cs);
            }
            _ => {}
        }
    }

    // Node creation: entry-chi / ret-mu per function, call-mu / call-chi per
    // call site, each carrying the region it versions.
    let mut entry_chis: FxHashMap<FuncId, VfgNodeId> = FxHashMap::default();
    let mut ret_mus: FxHashMap<FuncId, VfgNodeId> = FxHashMap::default();
    let mut call_mus: FxHashMap<CallSiteId, VfgNodeId> = FxHashMap::default();
    let mut call_chis: FxHashMap<CallSiteId, VfgNodeId> = FxHashMap::default();

    for func in graph.funcs() {
        let mr = match modref.get(&func.id) {
            Some(mr) => mr,
            None => continue,
        };
        let mut accessed = mr.uses.clone();
        accessed.union_with(&mr.defs);
        if !accessed.is_empty() {
            let n = vfg.add_node(
                func.entry,
                VfgNodeKind::EntryChi {
                    func: func.id,
                    region: accessed,
                },
            );
            entry_chis.insert(func.id, n);
        }
        if !mr.defs.is_empty() {
            let exit = exits.get(&func.id).copied().unwrap_or(func.entry);
            let n = vfg.add_node(
                exit,
                VfgNodeKind::RetMu {
                    func: func.id,
                    region: mr.defs.clone(),
                },
            );
            ret_mus.insert(func.id, n);
        }
    }

    for site in graph.callsites() {
        let mut callee_defs = PointsToSet::new();
        let mut callee_uses = PointsToSet::new();
        for edge in graph.call_graph.edges_at(site.id) {
            if !edge.kind.passes_params() && !edge.kind.passes_return() {
                continue;
            }
            if let Some(mr) = modref.get(&edge.callee) {
                callee_defs.union_with(&mr.defs);
                callee_uses.union_with(&mr.uses);
            }
        }
        if !callee_uses.is_empty() {
            let n = vfg.add_node(
                site.loc,
                VfgNodeKind::CallMu {
                    cs: site.id,
                    region: callee_uses,
                },
            );
            call_mus.insert(site.id, n);
        }
        if !callee_defs.is_empty() {
            let n = vfg.add_node(
                site.loc,
                VfgNodeKind::CallChi {
                    cs: site.id,
                    region: callee_defs,
                },
            );
            call_chis.insert(site.id, n);
        }
    }

    // Mem-phi: a function producing several memory versions merges them once
    // before its exit memory use.
    let mut mem_phis: FxHashMap<FuncId, VfgNodeId> = FxHashMap::default();
    for (func, func_stores) in &stores {
        if func_stores.len() < 2 {
            continue;
        }
        if let Some(&ret_mu) = ret_mus.get(func) {
            let mut region = PointsToSet::new();
            for (_, r) in func_stores {
                region.union_with(r);
            }
            let exit = exits
                .get(func)
                .copied()
                .unwrap_or_else(|| graph.funcs()[*func as usize].entry);
            let phi = vfg.add_node(exit, VfgNodeKind::MemPhi { func: *func, region });
            mem_phis.insert(*func, phi);
            vfg.add_edge(phi, ret_mu, VfgEdgeKind::Indirect);
        }
    }

    // Edge wiring. All intraprocedural memory edges are untagged indirect
    // edges; crossing a call boundary tags with the call site.
    let mut wire = Vec::new();

    for func in graph.funcs() {
        let f = func.id;
        let f_stores = stores.get(&f).cloned().unwrap_or_default();
        let f_loads = loads.get(&f).cloned().unwrap_or_default();
        let entry_chi = entry_chis.get(&f).copied();
        let ret_mu = ret_mus.get(&f).copied();

        for (load_stmt, load_region) in &f_loads {
            let load_node = vfg.node_of_stmt(*load_stmt).expect("load node exists");
            // Store versions reaching this load
            for (store_stmt, store_region) in &f_stores {
                if store_region.intersects(load_region) {
                    let store_node = vfg.node_of_stmt(*store_stmt).expect("store node exists");
                    wire.push((store_node, load_node, VfgEdgeKind::Indirect));
                }
            }
            // Incoming memory state at function entry
            if let Some(chi) = entry_chi {
                if region_of(vfg, chi).intersects(load_region) {
                    wire.push((chi, load_node, VfgEdgeKind::Indirect));
                }
            }
            // Memory versions defined by calls in this function
            for cs in sites.get(&f).into_iter().flatten() {
                if let Some(&chi) = call_chis.get(cs) {
                    if region_of(vfg, chi).intersects(load_region) {
                        wire.push((chi, load_node, VfgEdgeKind::Indirect));
                    }
                }
            }
        }

        for (store_stmt, store_region) in &f_stores {
            let store_node = vfg.node_of_stmt(*store_stmt).expect("store node exists");
            // Stores feed call sites that read the region, and the exit use
            for cs in sites.get(&f).into_iter().flatten() {
                if let Some(&mu) = call_mus.get(cs) {
                    if region_of(vfg, mu).intersects(store_region) {
                        wire.push((store_node, mu, VfgEdgeKind::Indirect));
                    }
                }
            }
            match mem_phis.get(&f) {
                Some(&phi) => wire.push((store_node, phi, VfgEdgeKind::Indirect)),
                None => {
                    if let Some(mu) = ret_mu {
                        if region_of(vfg, mu).intersects(store_region) {
                            wire.push((store_node, mu, VfgEdgeKind::Indirect));
                        }
                    }
                }
            }
        }

        // Pass-through: entry memory reaches nested calls and the exit use;
        // call-defined versions reach the exit use.
        for cs in sites.get(&f).into_iter().flatten() {
            if let (Some(chi), Some(&mu)) = (entry_chi, call_mus.get(cs)) {
                if region_of(vfg, chi).intersects(region_of(vfg, mu)) {
                    wire.push((chi, mu, VfgEdgeKind::Indirect));
                }
            }
            if let (Some(&chi), Some(mu)) = (call_chis.get(cs), ret_mu) {
                if region_of(vfg, chi).intersects(region_of(vfg, mu)) {
                    wire.push((chi, mu, VfgEdgeKind::Indirect));
                }
            }
        }
        if let (Some(chi), Some(mu)) = (entry_chi, ret_mu) {
            if region_of(vfg, chi).intersects(region_of(vfg, mu)) {
                wire.push((chi, mu, VfgEdgeKind::Indirect));
            }
        }
    }

    // Call-boundary crossings, tagged by call-site identity
    for site in graph.callsites() {
        for edge in graph.call_graph.edges_at(site.id) {
            if let (Some(&mu), Some(&entry)) = (call_mus.get(&site.id), entry_chis.get(&edge.callee))
            {
                wire.push((mu, entry, VfgEdgeKind::Call(site.id)));
            }
            if let (Some(&ret), Some(&chi)) = (ret_mus.get(&edge.callee), call_chis.get(&site.id)) {
                wire.push((ret, chi, VfgEdgeKind::Ret(site.id)));
            }
        }
    }

    let mut added = 0usize;
    for (src, dst, kind) in wire {
        if vfg.add_edge(src, dst, kind) {
            added += 1;
        }
    }
    debug!(edges = added, "indirect value-flow wiring done");
    Ok(())
}

fn region_of(vfg: &Vfg, node: VfgNodeId) -> &PointsToSet {
    static EMPTY: PointsToSet = PointsToSet::new();
    vfg.node(node)
        .and_then(|n| n.region())
        .unwrap_or(&EMPTY)
}

/// Transitive mod/ref sets per function: direct loads/stores plus, through
/// the call graph, everything the callees touch
fn compute_modref(graph: &IrGraph, pta: &PtaResult) -> FxHashMap<FuncId, ModRef> {
    let mut modref: FxHashMap<FuncId, ModRef> = FxHashMap::default();

    for stmt in graph.stmts() {
        match &stmt.kind {
            IrStmtKind::Store { ptr, .. } => {
                modref
                    .entry(stmt.func)
                    .or_default()
                    .defs
                    .union_with(pta.pts(*ptr));
            }
            IrStmtKind::Load { ptr, .. } => {
                modref
                    .entry(stmt.func)
                    .or_default()
                    .uses
                    .union_with(pta.pts(*ptr));
            }
            _ => {}
        }
    }

    // Propagate callee sets into callers to a fixpoint
    let edges: Vec<(FuncId, FuncId)> = graph
        .call_graph
        .edges()
        .filter(|e| e.kind.passes_params() || e.kind.passes_return())
        .map(|e| (e.caller, e.callee))
        .collect();
    loop {
        let mut changed = false;
        for &(caller, callee) in &edges {
            let callee_mr = match modref.get(&callee) {
                Some(mr) => mr.clone(),
                None => continue,
            };
            let caller_mr = modref.entry(caller).or_default();
            changed |= caller_mr.defs.union_with(&callee_mr.defs);
            changed |= caller_mr.uses.union_with(&callee_mr.uses);
        }
        if !changed {
            break;
        }
    }
    modref
}
