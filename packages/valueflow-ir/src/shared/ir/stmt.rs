//! IR statements
//!
//! Statements are a closed sum type: a kind enum with exactly the payload
//! each kind needs, dispatched by pattern matching. Call-like statements
//! carry only a call-site id; the argument/return detail lives in the
//! [`CallSite`](super::CallSite) record owned by the graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CallSiteId, FuncId, IcfgId, StmtId, VarId};

/// Offset operand of a gep statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GepOffset {
    /// Constant byte offset from the base
    Const(u64),

    /// Runtime offset held in a value variable; field-sensitivity collapses
    /// the target to the base object for these
    Variant(VarId),
}

/// Callee of a call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callee {
    /// Direct call to a known function
    Func(FuncId),

    /// Virtual call; candidate targets come from the class hierarchy
    Virtual,

    /// External function known only by name (libc, allocators, stubs)
    External(String),
}

/// Comparison predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpPredicate {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Binary arithmetic/bitwise operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    Or,
    Xor,
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A single IR statement
#[derive(Debug, Clone)]
pub struct IrStmt {
    /// Index into the graph's statement arena
    pub id: StmtId,

    /// Program location of this statement
    pub loc: IcfgId,

    /// Enclosing function
    pub func: FuncId,

    /// Source location string for diagnostics (not a compatibility contract)
    pub source: String,

    /// Statement payload
    pub kind: IrStmtKind,
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum IrStmtKind {
    /// dst = &obj
    Addr { dst: VarId, obj: VarId },

    /// dst = src
    Copy { dst: VarId, src: VarId },

    /// dst = *ptr
    Load { dst: VarId, ptr: VarId },

    /// *ptr = val
    Store { ptr: VarId, val: VarId },

    /// dst = &base[offset] (field/element address)
    Gep {
        dst: VarId,
        base: VarId,
        offset: GepOffset,
    },

    /// dst = phi(incoming...)
    Phi {
        dst: VarId,
        incoming: Vec<(IcfgId, VarId)>,
    },

    /// Call through the given call site
    Call { cs: CallSiteId },

    /// Return from `func` with an optional value
    Ret { func: FuncId, val: Option<VarId> },

    /// dst = lhs <pred> rhs
    Cmp {
        dst: VarId,
        pred: CmpPredicate,
        lhs: VarId,
        rhs: VarId,
    },

    /// dst = lhs <op> rhs
    BinOp {
        dst: VarId,
        op: BinaryOp,
        lhs: VarId,
        rhs: VarId,
    },

    /// dst = <op> src
    UnOp {
        dst: VarId,
        op: UnaryOp,
        src: VarId,
    },

    /// Conditional or unconditional jump
    Branch {
        cond: Option<VarId>,
        targets: Vec<IcfgId>,
    },

    /// Thread spawn through the given call site (argument flows to the
    /// spawned function's first parameter)
    ThreadFork { cs: CallSiteId },

    /// Thread join through the given call site (the spawned function's
    /// return flows back to the joining site)
    ThreadJoin { cs: CallSiteId },
}

impl IrStmtKind {
    /// The top-level variable this statement defines, if any.
    /// Call-like statements define through their call-site record instead.
    pub fn dst(&self) -> Option<VarId> {
        match self {
            IrStmtKind::Addr { dst, .. }
            | IrStmtKind::Copy { dst, .. }
            | IrStmtKind::Load { dst, .. }
            | IrStmtKind::Gep { dst, .. }
            | IrStmtKind::Phi { dst, .. }
            | IrStmtKind::Cmp { dst, .. }
            | IrStmtKind::BinOp { dst, .. }
            | IrStmtKind::UnOp { dst, .. } => Some(*dst),
            _ => None,
        }
    }

    /// Whether this statement participates in pointer value flow
    pub fn is_pointer_stmt(&self) -> bool {
        matches!(
            self,
            IrStmtKind::Addr { .. }
                | IrStmtKind::Copy { .. }
                | IrStmtKind::Load { .. }
                | IrStmtKind::Store { .. }
                | IrStmtKind::Gep { .. }
                | IrStmtKind::Phi { .. }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IrStmtKind::Addr { .. } => "addr",
            IrStmtKind::Copy { .. } => "copy",
            IrStmtKind::Load { .. } => "load",
            IrStmtKind::Store { .. } => "store",
            IrStmtKind::Gep { .. } => "gep",
            IrStmtKind::Phi { .. } => "phi",
            IrStmtKind::Call { .. } => "call",
            IrStmtKind::Ret { .. } => "ret",
            IrStmtKind::Cmp { .. } => "cmp",
            IrStmtKind::BinOp { .. } => "binop",
            IrStmtKind::UnOp { .. } => "unop",
            IrStmtKind::Branch { .. } => "branch",
            IrStmtKind::ThreadFork { .. } => "fork",
            IrStmtKind::ThreadJoin { .. } => "join",
        }
    }
}

impl fmt::Display for IrStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}@{} {}", self.id, self.loc, self.kind.as_str())?;
        if !self.source.is_empty() {
            write!(f, " ({})", self.source)?;
        }
        Ok(())
    }
}
