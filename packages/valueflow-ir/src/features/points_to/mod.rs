//! Points-to storage layer
//!
//! The performance-critical engine tracking, for every abstract location,
//! the set of objects it may point to. Flow-insensitive, differential and
//! flow-sensitive variants share the same mutation contract; every mutator
//! reports change so fixpoint loops re-trigger only on growth.

pub mod domain;
pub mod infrastructure;

pub use domain::{Datum, PointsToSet};
pub use infrastructure::{DfPtData, DiffPtData, IncDfPtData, MutablePtData};

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pts_size_never_decreases(ops in proptest::collection::vec((0u32..8, 0u32..32), 1..64)) {
            let mut pt: MutablePtData<u32> = MutablePtData::new(false);
            let mut sizes = rustc_hash::FxHashMap::default();
            for (k, d) in ops {
                pt.add_pts(k, d);
                let prev = sizes.insert(k, pt.pts(k).len()).unwrap_or(0);
                prop_assert!(pt.pts(k).len() >= prev);
            }
        }

        #[test]
        fn union_is_superset_and_source_unchanged(
            dst in proptest::collection::vec(0u32..64, 0..16),
            src in proptest::collection::vec(0u32..64, 0..16),
        ) {
            let mut pt: MutablePtData<u32> = MutablePtData::new(false);
            for &d in &dst { pt.add_pts(1, d); }
            for &d in &src { pt.add_pts(2, d); }

            let old_dst = pt.pts(1).clone();
            let old_src = pt.pts(2).clone();
            pt.union_pts(1, 2);

            prop_assert!(old_dst.is_subset_of(pt.pts(1)));
            prop_assert!(old_src.is_subset_of(pt.pts(1)));
            prop_assert_eq!(pt.pts(2), &old_src);
        }

        #[test]
        fn reverse_index_stays_consistent(
            ops in proptest::collection::vec((0u32..6, 0u32..24), 1..48),
        ) {
            let mut pt: MutablePtData<u32> = MutablePtData::new(true);
            for (i, (k, d)) in ops.iter().enumerate() {
                if i % 5 == 4 {
                    pt.clear_pts(*k, *d);
                } else {
                    pt.add_pts(*k, *d);
                }
            }
            // Forward and reverse views agree after every batch
            let keys: Vec<u32> = pt.keys().collect();
            for k in keys {
                for d in pt.pts(k).iter().collect::<Vec<_>>() {
                    prop_assert!(pt.rev_pts(d).contains(&k));
                }
            }
            for d in 0u32..24 {
                for &k in pt.rev_pts(d).iter() {
                    prop_assert!(pt.pts(k).contains(d));
                }
            }
        }
    }
}
