//! Shared models and utilities

pub mod ir;
pub mod worklist;
