//! Points-to domain model

mod points_to_set;

pub use points_to_set::{Datum, PointsToSet};
