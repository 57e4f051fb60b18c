//! Null / invalid pointer dereference detection
//!
//! Walks every gep, load and store plus the externally-annotated
//! dereferencing arguments of known library calls. A dereference is flagged
//! when the pointer's abstract addresses include the null sentinel, the
//! invalid-memory sentinel, or an object already marked freed. Deallocation
//! calls mark their targets freed as the walk proceeds in program order, so
//! later dereferences of the same storage surface as use-after-free.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::features::abstract_state::AbstractState;
use crate::shared::ir::{
    CallSiteId, IrGraph, IrStmt, IrStmtKind, VarId, INVALID_OBJ, NULL_OBJ,
};

use super::ext_api;
use super::report::{Report, Violation, ViolationKind};

/// Detects dereferences of null, invalid or freed storage
#[derive(Debug, Default)]
pub struct NullDerefDetector {
    report: Report,
    pending: FxHashSet<CallSiteId>,
}

impl NullDerefDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the whole program in the given abstract state. The state is
    /// mutable so deallocation sites can mark their targets freed for the
    /// rest of the walk.
    pub fn run(&mut self, graph: &IrGraph, state: &mut AbstractState) {
        self.init_checkpoints(graph);
        for stmt in graph.stmts() {
            match &stmt.kind {
                IrStmtKind::Gep { base, .. } => self.check_deref(stmt, *base, state),
                IrStmtKind::Load { ptr, .. } => self.check_deref(stmt, *ptr, state),
                IrStmtKind::Store { ptr, .. } => self.check_deref(stmt, *ptr, state),
                IrStmtKind::Call { cs } => self.check_call(graph, state, stmt, *cs),
                _ => {}
            }
        }
    }

    /// Checkpoint call sites not yet exercised
    pub fn pending_checkpoints(&self) -> &FxHashSet<CallSiteId> {
        &self.pending
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    fn init_checkpoints(&mut self, graph: &IrGraph) {
        for site in graph.callsites() {
            if let crate::shared::ir::Callee::External(name) = &site.callee {
                if ext_api::load_checkpoint(name).is_some() {
                    self.pending.insert(site.id);
                }
            }
        }
    }

    /// First offending address wins; one report per statement
    fn check_deref(&mut self, stmt: &IrStmt, ptr: VarId, state: &AbstractState) {
        let Some((kind, message)) = self.bad_address(ptr, state) else {
            return;
        };
        self.report.add(Violation {
            kind,
            stmt: stmt.id,
            source: stmt.source.clone(),
            message,
        });
    }

    fn bad_address(&self, ptr: VarId, state: &AbstractState) -> Option<(ViolationKind, String)> {
        for obj in state.addrs_of(ptr).iter() {
            if obj == NULL_OBJ {
                return Some((ViolationKind::NullDeref, format!("v{ptr} may be null")));
            }
            if obj == INVALID_OBJ {
                return Some((
                    ViolationKind::NullDeref,
                    format!("v{ptr} may point to invalid memory"),
                ));
            }
            if state.is_freed(obj) {
                return Some((
                    ViolationKind::UseAfterFree,
                    format!("v{ptr} may point to freed object v{obj}"),
                ));
            }
        }
        None
    }

    fn is_safe_deref(&self, ptr: VarId, state: &AbstractState) -> bool {
        self.bad_address(ptr, state).is_none()
    }

    fn check_call(
        &mut self,
        graph: &IrGraph,
        state: &mut AbstractState,
        stmt: &IrStmt,
        cs: CallSiteId,
    ) {
        let site = match graph.callsite(cs) {
            Some(s) => s,
            None => return,
        };
        let name = match &site.callee {
            crate::shared::ir::Callee::External(n) => n.clone(),
            _ => return,
        };

        if let Some(expected_safe) = ext_api::load_checkpoint(&name) {
            if let Some(&ptr) = site.args.first() {
                let safe = self.is_safe_deref(ptr, state);
                self.pending.remove(&cs);
                debug!(cs, name = %name, safe, expected_safe, "load checkpoint evaluated");
                if safe != expected_safe {
                    self.report.add(Violation {
                        kind: ViolationKind::CheckpointFailed,
                        stmt: stmt.id,
                        source: stmt.source.clone(),
                        message: format!("{name} expected safe={expected_safe}, got safe={safe}"),
                    });
                }
            }
            return;
        }

        // Arguments the callee dereferences internally
        if let Some(arg_idxs) = ext_api::DEREF_ARG_RULES.get(name.as_str()) {
            for &idx in arg_idxs {
                if let Some(&arg) = site.args.get(idx) {
                    self.check_deref(stmt, arg, state);
                }
            }
        }

        // Deallocation releases every target for the rest of the walk
        if ext_api::is_free(&name) {
            if let Some(&arg) = site.args.first() {
                for obj in state.addrs_of(arg).iter().collect::<Vec<_>>() {
                    if !matches!(obj, NULL_OBJ | INVALID_OBJ) {
                        state.mark_freed(obj);
                    }
                }
            }
        }
    }
}
