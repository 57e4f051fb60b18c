//! Points-to storage variants
//!
//! Three flow-sensitivity policies behind one operation contract:
//! - [`MutablePtData`]: one set per key for the whole program
//! - [`DiffPtData`]: adds propagated/diff sets for differential solving
//! - [`DfPtData`] / [`IncDfPtData`]: one set per (key, program location),
//!   the incremental variant tracking only changed facts

mod data_flow;
mod diff;
mod mutable;

pub use data_flow::{DfPtData, IncDfPtData};
pub use diff::DiffPtData;
pub use mutable::MutablePtData;
