//! Whole-program pointer analysis
//!
//! Inclusion-based fixpoint over the IR statement graph with differential
//! propagation: each worklist visit pushes only the facts discovered since
//! the variable was last processed. Load/store statements grow the copy-edge
//! graph as pointers resolve; a fresh edge flushes the source's full set
//! once, after which the differential discipline takes over.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::features::points_to::{DiffPtData, PointsToSet};
use crate::shared::ir::{
    CallEdge, CallEdgeKind, Callee, GepOffset, IrGraph, IrStmtKind, VarId, BLACK_HOLE_OBJ,
    NULL_OBJ,
};
use crate::shared::worklist::Worklist;

/// Statistics for one solver run
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    pub iterations: usize,
    pub propagations: usize,
    pub copy_edges: usize,
    pub field_objs: usize,
}

/// Result of the pointer analysis
#[derive(Debug)]
pub struct PtaResult {
    pt: DiffPtData<VarId>,
    pub stats: SolverStats,
}

impl PtaResult {
    /// Final points-to set of a variable
    #[inline]
    pub fn pts(&self, v: VarId) -> &PointsToSet {
        self.pt.pts(v)
    }

    /// The underlying storage (for clients that need dumps or reverse facts)
    #[inline]
    pub fn data(&self) -> &DiffPtData<VarId> {
        &self.pt
    }
}

/// Inclusion-based whole-program pointer solver
pub struct PointerSolver {
    pt: DiffPtData<VarId>,

    /// src → {dst}: dst ⊇ src
    copy_edges: FxHashMap<VarId, FxHashSet<VarId>>,

    /// base pointer → [(dst, offset)]: dst gets field objects of pts(base)
    gep_edges: FxHashMap<VarId, Vec<(VarId, GepOffset)>>,

    /// ptr → {dst}: dst ⊇ pts(o) for every o ∈ pts(ptr)
    load_edges: FxHashMap<VarId, FxHashSet<VarId>>,

    /// ptr → {src}: pts(o) ⊇ src for every o ∈ pts(ptr)
    store_edges: FxHashMap<VarId, FxHashSet<VarId>>,

    worklist: Worklist<VarId>,
    stats: SolverStats,
}

impl Default for PointerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerSolver {
    pub fn new() -> Self {
        Self {
            pt: DiffPtData::new(false),
            copy_edges: FxHashMap::default(),
            gep_edges: FxHashMap::default(),
            load_edges: FxHashMap::default(),
            store_edges: FxHashMap::default(),
            worklist: Worklist::new(),
            stats: SolverStats::default(),
        }
    }

    /// Run the fixpoint to completion and hand back the points-to facts
    pub fn solve(mut self, graph: &mut IrGraph) -> Result<PtaResult> {
        self.init(graph)?;

        let max_iters = if graph.options.max_iterations > 0 {
            graph.options.max_iterations
        } else {
            graph.stmts().len() * 10 + 10_000
        };

        while let Some(v) = self.worklist.pop() {
            self.stats.iterations += 1;
            if self.stats.iterations > max_iters {
                warn!(max_iters, "pointer solver hit the iteration cap");
                break;
            }
            self.process_var(v, graph)?;
        }

        info!(
            iterations = self.stats.iterations,
            propagations = self.stats.propagations,
            copy_edges = self.stats.copy_edges,
            "pointer analysis reached a fixpoint"
        );
        Ok(PtaResult {
            pt: self.pt,
            stats: self.stats,
        })
    }

    /// Seed address facts and the static edge graph from the statements
    fn init(&mut self, graph: &mut IrGraph) -> Result<()> {
        // Virtual call sites get their class-hierarchy candidates recorded
        // as call-graph edges before anything is wired.
        let mut virtual_edges = Vec::new();
        for cs in graph.callsites() {
            if cs.callee == Callee::Virtual {
                for &f in graph.chg.targets(cs.id) {
                    virtual_edges.push(CallEdge {
                        cs: cs.id,
                        caller: cs.caller,
                        callee: f,
                        kind: CallEdgeKind::Virtual,
                    });
                }
            }
        }
        for e in virtual_edges {
            graph.call_graph.add_edge(e);
        }

        let mut seeds: Vec<(VarId, VarId)> = Vec::new();
        let mut copies: Vec<(VarId, VarId)> = Vec::new();

        for stmt in graph.stmts() {
            match &stmt.kind {
                IrStmtKind::Addr { dst, obj } => {
                    let target = if graph.memory.contains(*obj) {
                        *obj
                    } else if graph.options.handle_black_hole {
                        // Address of an untracked value: black hole
                        BLACK_HOLE_OBJ
                    } else {
                        NULL_OBJ
                    };
                    seeds.push((*dst, target));
                }
                IrStmtKind::Copy { dst, src } => copies.push((*src, *dst)),
                IrStmtKind::Phi { dst, incoming } => {
                    for (_, src) in incoming {
                        copies.push((*src, *dst));
                    }
                }
                IrStmtKind::Gep { dst, base, offset } => {
                    self.gep_edges.entry(*base).or_default().push((*dst, *offset));
                }
                IrStmtKind::Load { dst, ptr } => {
                    self.load_edges.entry(*ptr).or_default().insert(*dst);
                }
                IrStmtKind::Store { ptr, val } => {
                    self.store_edges.entry(*ptr).or_default().insert(*val);
                }
                IrStmtKind::Ret { func, val } => {
                    if let (Some(v), Some(r)) = (val, graph.func(*func).and_then(|f| f.ret)) {
                        if *v != r {
                            copies.push((*v, r));
                        }
                    }
                }
                IrStmtKind::Call { cs } | IrStmtKind::ThreadFork { cs } | IrStmtKind::ThreadJoin { cs } => {
                    let site = graph.callsite(*cs).ok_or_else(|| {
                        crate::errors::ValueFlowError::graph(format!(
                            "call statement references unknown call site {cs}"
                        ))
                    })?;
                    for edge in graph.call_graph.edges_at(*cs) {
                        let callee = match graph.func(edge.callee) {
                            Some(f) => f,
                            None => continue,
                        };
                        if edge.kind.passes_params() {
                            for (arg, param) in site.args.iter().zip(callee.params.iter()) {
                                copies.push((*arg, *param));
                            }
                        }
                        if edge.kind.passes_return() {
                            if let (Some(cr), Some(fr)) = (site.ret, callee.ret) {
                                copies.push((fr, cr));
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        for (dst, obj) in seeds {
            if self.pt.add_pts(dst, obj) {
                self.worklist.push(dst);
            }
        }
        for (src, dst) in copies {
            self.add_copy_edge(src, dst);
        }
        Ok(())
    }

    /// Add a copy edge; a fresh edge flushes the source's current facts once
    fn add_copy_edge(&mut self, src: VarId, dst: VarId) -> bool {
        if src == dst {
            return false;
        }
        if !self.copy_edges.entry(src).or_default().insert(dst) {
            return false;
        }
        self.stats.copy_edges += 1;
        let facts = self.pt.pts(src).clone();
        if self.pt.union_pts_with(dst, &facts) {
            self.worklist.push(dst);
        }
        true
    }

    /// Push one variable's newly discovered facts through its edges
    fn process_var(&mut self, v: VarId, graph: &mut IrGraph) -> Result<()> {
        if !self.pt.compute_diff_pts(v) {
            return Ok(());
        }
        let diff = self.pt.diff_pts(v).clone();
        debug!(var = v, new = diff.len(), "propagating diff");

        // Field addressing: every new base object materializes its field
        if let Some(geps) = self.gep_edges.get(&v).cloned() {
            for (dst, offset) in geps {
                for obj in diff.iter() {
                    let fld = graph.gep_obj(obj, offset)?;
                    if fld != obj {
                        self.stats.field_objs += 1;
                    }
                    if self.pt.add_pts(dst, fld) {
                        self.worklist.push(dst);
                    }
                }
            }
        }

        // Loads through v: dst now also reads every new pointee
        if let Some(loads) = self.load_edges.get(&v).cloned() {
            for dst in loads {
                for obj in diff.iter() {
                    self.add_copy_edge(obj, dst);
                }
            }
        }

        // Stores through v: every new pointee now receives the stored value
        if let Some(stores) = self.store_edges.get(&v).cloned() {
            for src in stores {
                for obj in diff.iter() {
                    self.add_copy_edge(src, obj);
                }
            }
        }

        // Plain copies: only the diff flows
        if let Some(dsts) = self.copy_edges.get(&v).cloned() {
            for dst in dsts {
                if self.pt.union_pts_with(dst, &diff) {
                    self.stats.propagations += 1;
                    self.worklist.push(dst);
                }
            }
        }
        Ok(())
    }
}
