//! Sparse value-flow graph
//!
//! Nodes are value definitions, edges are direct def-use relations — much
//! sparser than the control-flow graph because only def/use-relevant points
//! appear. Interprocedural edges keep their call-site identity so clients
//! can stay context-sensitive. Address-taken storage flows through the
//! memory-SSA chi/mu node family.

pub mod domain;
pub mod infrastructure;

pub use domain::{PhiRole, Vfg, VfgEdge, VfgEdgeKind, VfgNode, VfgNodeId, VfgNodeKind};
pub use infrastructure::{build_vfg, VfgBuilder};
