/*
 * Valueflow IR - Sparse Value-Flow Analysis Engine
 *
 * Feature-First Architecture:
 * - shared/      : Program IR graph, worklist
 * - features/    : Vertical slices (interval → points_to → solver → vfg → detectors)
 * - config/      : Analysis options
 *
 * The engine takes an SSA-like statement graph from a front-end, solves
 * whole-program points-to facts over it, builds a sparse value-flow graph
 * with direct and memory (chi/mu) def-use edges, and runs interval-domain
 * clients (buffer-overflow, null-dereference) on top. Everything runs
 * single-threaded to a fixpoint; imprecision degrades to lattice tops, never
 * to faults.
 */

#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

/// Shared models and utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// Re-exports for the public API
pub use config::AnalysisOptions;
pub use errors::{Result, ValueFlowError};
pub use features::abstract_state::{AbstractState, AbstractValue, AddressSet};
pub use features::detectors::{BufOverflowDetector, NullDerefDetector, Report, Violation, ViolationKind};
pub use features::interval::{IntervalBound, IntervalValue};
pub use features::points_to::{DfPtData, Datum, DiffPtData, IncDfPtData, MutablePtData, PointsToSet};
pub use features::solver::{PointerSolver, PtaResult};
pub use features::vfg::{build_vfg, Vfg, VfgBuilder, VfgEdge, VfgEdgeKind, VfgNode, VfgNodeId, VfgNodeKind};
pub use shared::ir::IrGraph;
