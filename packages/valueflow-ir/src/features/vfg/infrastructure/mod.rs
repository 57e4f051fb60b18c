//! Value-flow graph construction

pub(crate) mod builder;
mod mem_ssa;

pub use builder::{build_vfg, VfgBuilder};
