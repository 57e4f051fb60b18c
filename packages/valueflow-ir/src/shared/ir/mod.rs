//! Program IR graph consumed by the analysis
//!
//! The front-end supplies an SSA-like graph of variables and statements plus
//! a call graph and a class-hierarchy lookup. Everything is arena-owned:
//! variables, statements, functions and call sites live in `Vec`s inside
//! [`IrGraph`] and all cross-references are plain integer ids resolved
//! through the graph. No part of the model holds a pointer into another part.

mod callgraph;
mod chg;
mod graph;
mod memory;
mod stmt;

pub use callgraph::{CallEdge, CallEdgeKind, CallGraph};
pub use chg::ClassHierarchy;
pub use graph::{CallSite, IrFunc, IrGraph, IrVar, VarKind};
pub use memory::{MemObj, MemoryModel, ObjSize};
pub use stmt::{BinaryOp, Callee, CmpPredicate, GepOffset, IrStmt, IrStmtKind, UnaryOp};

/// Variable identifier (value or object node in the IR graph)
pub type VarId = u32;

/// Statement identifier (index into the graph's statement arena)
pub type StmtId = u32;

/// Program-location identifier (flow-sensitive position)
pub type IcfgId = u32;

/// Function identifier
pub type FuncId = u32;

/// Call-site identifier
pub type CallSiteId = u32;

/// The null pointer variable, a reachable dummy definition for every
/// top-level pointer that is never explicitly defined.
pub const NULL_PTR: VarId = 0;

/// The null object; the null pointer points to exactly this.
pub const NULL_OBJ: VarId = 1;

/// The black-hole object standing in for untracked/unknown memory.
pub const BLACK_HOLE_OBJ: VarId = 2;

/// The invalid-memory sentinel (out-of-lifetime storage).
pub const INVALID_OBJ: VarId = 3;

/// First id handed out for front-end variables; everything below is reserved.
pub const FIRST_USER_VAR: VarId = 4;
