//! The IR graph arena
//!
//! Owns every variable, statement, function and call site by value and hands
//! out integer ids. Statement order in the arena is program order; the
//! value-flow builder relies on that when it establishes definition maps.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AnalysisOptions;
use crate::errors::{Result, ValueFlowError};

use super::{
    BinaryOp, CallEdge, CallEdgeKind, CallGraph, Callee, ClassHierarchy, CmpPredicate, GepOffset,
    IrStmt, IrStmtKind, MemoryModel, ObjSize, UnaryOp, BLACK_HOLE_OBJ, INVALID_OBJ, NULL_OBJ,
    NULL_PTR,
};
use super::{CallSiteId, FuncId, IcfgId, StmtId, VarId};

/// Whether a variable is a top-level value or an address-taken object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Value,
    Object,
}

/// One IR variable
#[derive(Debug, Clone)]
pub struct IrVar {
    pub id: VarId,
    pub kind: VarKind,
    pub name: String,
}

/// One function in the program
#[derive(Debug, Clone)]
pub struct IrFunc {
    pub id: FuncId,
    pub name: String,
    pub params: Vec<VarId>,
    pub ret: Option<VarId>,
    pub entry: IcfgId,
}

/// One call site; the `Call`/`ThreadFork`/`ThreadJoin` statements reference
/// this record by id
#[derive(Debug, Clone)]
pub struct CallSite {
    pub id: CallSiteId,
    pub loc: IcfgId,
    pub caller: FuncId,
    pub callee: Callee,
    pub args: Vec<VarId>,
    pub ret: Option<VarId>,
}

/// The whole-program IR graph
#[derive(Debug)]
pub struct IrGraph {
    vars: Vec<IrVar>,
    stmts: Vec<IrStmt>,
    funcs: Vec<IrFunc>,
    callsites: Vec<CallSite>,

    pub memory: MemoryModel,
    pub call_graph: CallGraph,
    pub chg: ClassHierarchy,
    pub options: AnalysisOptions,
}

impl IrGraph {
    /// Create a graph seeded with the reserved sentinel variables
    pub fn new(options: AnalysisOptions) -> Self {
        let mut g = Self {
            vars: Vec::new(),
            stmts: Vec::new(),
            funcs: Vec::new(),
            callsites: Vec::new(),
            memory: MemoryModel::new(),
            call_graph: CallGraph::new(),
            chg: ClassHierarchy::new(),
            options,
        };
        // Reserved ids in fixed order: null pointer, null object, black
        // hole, invalid memory. `FIRST_USER_VAR` starts right after.
        let p = g.push_var(VarKind::Value, "nullptr");
        debug_assert_eq!(p, NULL_PTR);
        let o = g.push_var(VarKind::Object, "null");
        debug_assert_eq!(o, NULL_OBJ);
        g.memory.register(o, ObjSize::Unknown);
        let b = g.push_var(VarKind::Object, "blackhole");
        debug_assert_eq!(b, BLACK_HOLE_OBJ);
        g.memory.register(b, ObjSize::Unknown);
        let i = g.push_var(VarKind::Object, "invalid");
        debug_assert_eq!(i, INVALID_OBJ);
        g.memory.register(i, ObjSize::Unknown);
        g
    }

    fn push_var(&mut self, kind: VarKind, name: impl Into<String>) -> VarId {
        let id = self.vars.len() as VarId;
        self.vars.push(IrVar {
            id,
            kind,
            name: name.into(),
        });
        id
    }

    // ── Construction ───────────────────────────────────────────────────────

    /// Add a top-level value variable
    pub fn add_value_var(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(VarKind::Value, name)
    }

    /// Add an address-taken object and register its size
    pub fn add_object(&mut self, name: impl Into<String>, size: ObjSize) -> VarId {
        let id = self.push_var(VarKind::Object, name);
        self.memory.register(id, size);
        id
    }

    /// Add a function
    pub fn add_func(
        &mut self,
        name: impl Into<String>,
        params: Vec<VarId>,
        ret: Option<VarId>,
        entry: IcfgId,
    ) -> FuncId {
        let id = self.funcs.len() as FuncId;
        self.funcs.push(IrFunc {
            id,
            name: name.into(),
            params,
            ret,
            entry,
        });
        id
    }

    fn push_stmt(&mut self, func: FuncId, loc: IcfgId, kind: IrStmtKind) -> StmtId {
        let id = self.stmts.len() as StmtId;
        self.stmts.push(IrStmt {
            id,
            loc,
            func,
            source: String::new(),
            kind,
        });
        id
    }

    /// Attach a source-location string to a statement (diagnostics only)
    pub fn set_source(&mut self, stmt: StmtId, source: impl Into<String>) {
        if let Some(s) = self.stmts.get_mut(stmt as usize) {
            s.source = source.into();
        }
    }

    pub fn add_addr(&mut self, func: FuncId, loc: IcfgId, dst: VarId, obj: VarId) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Addr { dst, obj })
    }

    pub fn add_copy(&mut self, func: FuncId, loc: IcfgId, dst: VarId, src: VarId) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Copy { dst, src })
    }

    pub fn add_load(&mut self, func: FuncId, loc: IcfgId, dst: VarId, ptr: VarId) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Load { dst, ptr })
    }

    pub fn add_store(&mut self, func: FuncId, loc: IcfgId, ptr: VarId, val: VarId) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Store { ptr, val })
    }

    pub fn add_gep(
        &mut self,
        func: FuncId,
        loc: IcfgId,
        dst: VarId,
        base: VarId,
        offset: GepOffset,
    ) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Gep { dst, base, offset })
    }

    pub fn add_phi(
        &mut self,
        func: FuncId,
        loc: IcfgId,
        dst: VarId,
        incoming: Vec<(IcfgId, VarId)>,
    ) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Phi { dst, incoming })
    }

    pub fn add_cmp(
        &mut self,
        func: FuncId,
        loc: IcfgId,
        dst: VarId,
        pred: CmpPredicate,
        lhs: VarId,
        rhs: VarId,
    ) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Cmp { dst, pred, lhs, rhs })
    }

    pub fn add_binop(
        &mut self,
        func: FuncId,
        loc: IcfgId,
        dst: VarId,
        op: BinaryOp,
        lhs: VarId,
        rhs: VarId,
    ) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::BinOp { dst, op, lhs, rhs })
    }

    pub fn add_unop(
        &mut self,
        func: FuncId,
        loc: IcfgId,
        dst: VarId,
        op: UnaryOp,
        src: VarId,
    ) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::UnOp { dst, op, src })
    }

    pub fn add_branch(
        &mut self,
        func: FuncId,
        loc: IcfgId,
        cond: Option<VarId>,
        targets: Vec<IcfgId>,
    ) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Branch { cond, targets })
    }

    pub fn add_ret(&mut self, func: FuncId, loc: IcfgId, val: Option<VarId>) -> StmtId {
        self.push_stmt(func, loc, IrStmtKind::Ret { func, val })
    }

    fn push_callsite(
        &mut self,
        loc: IcfgId,
        caller: FuncId,
        callee: Callee,
        args: Vec<VarId>,
        ret: Option<VarId>,
    ) -> CallSiteId {
        let id = self.callsites.len() as CallSiteId;
        self.callsites.push(CallSite {
            id,
            loc,
            caller,
            callee,
            args,
            ret,
        });
        id
    }

    /// Add a call statement. Direct calls also record their call-graph edge;
    /// virtual calls get edges once the class hierarchy resolves them.
    pub fn add_call(
        &mut self,
        caller: FuncId,
        loc: IcfgId,
        callee: Callee,
        args: Vec<VarId>,
        ret: Option<VarId>,
    ) -> (StmtId, CallSiteId) {
        let cs = self.push_callsite(loc, caller, callee.clone(), args, ret);
        if let Callee::Func(f) = callee {
            self.call_graph.add_edge(CallEdge {
                cs,
                caller,
                callee: f,
                kind: CallEdgeKind::Call,
            });
        }
        let stmt = self.push_stmt(caller, loc, IrStmtKind::Call { cs });
        (stmt, cs)
    }

    /// Add a thread-spawn statement; `arg` flows to `entry`'s first parameter
    pub fn add_fork(
        &mut self,
        caller: FuncId,
        loc: IcfgId,
        entry: FuncId,
        arg: VarId,
    ) -> (StmtId, CallSiteId) {
        let cs = self.push_callsite(loc, caller, Callee::Func(entry), vec![arg], None);
        self.call_graph.add_edge(CallEdge {
            cs,
            caller,
            callee: entry,
            kind: CallEdgeKind::Fork,
        });
        let stmt = self.push_stmt(caller, loc, IrStmtKind::ThreadFork { cs });
        (stmt, cs)
    }

    /// Add a thread-join statement; `spawned`'s return flows into `ret`
    pub fn add_join(
        &mut self,
        caller: FuncId,
        loc: IcfgId,
        spawned: FuncId,
        ret: VarId,
    ) -> (StmtId, CallSiteId) {
        let cs = self.push_callsite(loc, caller, Callee::Func(spawned), Vec::new(), Some(ret));
        self.call_graph.add_edge(CallEdge {
            cs,
            caller,
            callee: spawned,
            kind: CallEdgeKind::Join,
        });
        let stmt = self.push_stmt(caller, loc, IrStmtKind::ThreadJoin { cs });
        (stmt, cs)
    }

    // ── Field sub-objects ──────────────────────────────────────────────────

    /// Resolve the object a gep lands on. Constant offsets produce
    /// allocator-assigned field sub-objects (clamped at the field limit);
    /// variant offsets and the sentinels collapse to the base.
    pub fn gep_obj(&mut self, base: VarId, offset: GepOffset) -> Result<VarId> {
        if !self.memory.contains(base) {
            return Err(ValueFlowError::graph(format!(
                "gep base v{base} is not a registered object"
            )));
        }
        if matches!(base, NULL_OBJ | BLACK_HOLE_OBJ | INVALID_OBJ) {
            return Ok(base);
        }
        let off = match offset {
            GepOffset::Variant(_) => return Ok(base),
            GepOffset::Const(off) => off,
        };
        let limit = self.options.max_field_limit as u64;
        let clamped = if off > limit {
            warn!(base, off, limit, "field offset clamped to limit bucket");
            limit
        } else {
            off
        };
        if clamped == 0 && self.options.first_field_eq_base {
            return Ok(base);
        }
        if let Some(f) = self.memory.field_at(base, clamped) {
            return Ok(f);
        }
        let name = format!("{}+{}", self.vars[base as usize].name, clamped);
        let field = self.push_var(VarKind::Object, name);
        self.memory.register_field(base, clamped, field);
        Ok(field)
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    #[inline]
    pub fn var(&self, id: VarId) -> Option<&IrVar> {
        self.vars.get(id as usize)
    }

    #[inline]
    pub fn is_object(&self, id: VarId) -> bool {
        matches!(self.var(id), Some(v) if v.kind == VarKind::Object)
    }

    #[inline]
    pub fn stmts(&self) -> &[IrStmt] {
        &self.stmts
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> Option<&IrStmt> {
        self.stmts.get(id as usize)
    }

    #[inline]
    pub fn funcs(&self) -> &[IrFunc] {
        &self.funcs
    }

    #[inline]
    pub fn func(&self, id: FuncId) -> Option<&IrFunc> {
        self.funcs.get(id as usize)
    }

    #[inline]
    pub fn callsite(&self, id: CallSiteId) -> Option<&CallSite> {
        self.callsites.get(id as usize)
    }

    #[inline]
    pub fn callsites(&self) -> &[CallSite] {
        &self.callsites
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> IrGraph {
        IrGraph::new(AnalysisOptions::default())
    }

    #[test]
    fn test_sentinels_seeded() {
        let g = graph();
        assert_eq!(g.var(NULL_PTR).unwrap().kind, VarKind::Value);
        assert!(g.is_object(NULL_OBJ));
        assert!(g.is_object(BLACK_HOLE_OBJ));
        assert!(g.is_object(INVALID_OBJ));
        assert_eq!(g.var_count(), super::super::FIRST_USER_VAR as usize);
    }

    #[test]
    fn test_gep_obj_creates_field() {
        let mut g = graph();
        let o = g.add_object("buf", ObjSize::Bytes(32));

        let f1 = g.gep_obj(o, GepOffset::Const(8)).unwrap();
        assert_ne!(f1, o);
        assert_eq!(g.memory.offset_from_root(f1), 8);

        // Same offset → same allocator-assigned object
        let f2 = g.gep_obj(o, GepOffset::Const(8)).unwrap();
        assert_eq!(f1, f2);
    }

    #[test]
    fn test_gep_obj_first_field_eq_base() {
        let mut g = graph();
        let o = g.add_object("buf", ObjSize::Bytes(32));
        assert_eq!(g.gep_obj(o, GepOffset::Const(0)).unwrap(), o);

        let mut g2 = IrGraph::new(AnalysisOptions::default().with_first_field_eq_base(false));
        let o2 = g2.add_object("buf", ObjSize::Bytes(32));
        assert_ne!(g2.gep_obj(o2, GepOffset::Const(0)).unwrap(), o2);
    }

    #[test]
    fn test_gep_obj_clamps_at_limit() {
        let mut g = IrGraph::new(AnalysisOptions::default().with_max_field_limit(4));
        let o = g.add_object("buf", ObjSize::Bytes(1024));

        let f_limit = g.gep_obj(o, GepOffset::Const(4)).unwrap();
        let f_beyond = g.gep_obj(o, GepOffset::Const(900)).unwrap();
        // Offsets beyond the limit alias into the limit bucket
        assert_eq!(f_limit, f_beyond);
    }

    #[test]
    fn test_gep_obj_variant_collapses() {
        let mut g = graph();
        let o = g.add_object("buf", ObjSize::Bytes(32));
        let i = g.add_value_var("i");
        assert_eq!(g.gep_obj(o, GepOffset::Variant(i)).unwrap(), o);
    }

    #[test]
    fn test_gep_on_non_object_fails() {
        let mut g = graph();
        let v = g.add_value_var("p");
        assert!(g.gep_obj(v, GepOffset::Const(4)).is_err());
    }

    #[test]
    fn test_call_records_edge() {
        let mut g = graph();
        let f = g.add_func("callee", vec![], None, 10);
        let caller = g.add_func("caller", vec![], None, 0);
        let (_, cs) = g.add_call(caller, 1, Callee::Func(f), vec![], None);

        assert_eq!(g.call_graph.edges_at(cs).count(), 1);
    }
}
