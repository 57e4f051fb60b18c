//! Differential points-to storage
//!
//! Each key owns, next to its full set, a "propagated" set of facts already
//! sent downstream. `compute_diff_pts` materializes the facts discovered
//! since the last propagation (`diff = all − propagated`) and advances the
//! propagated set, so a solver pushes each fact along each edge exactly once.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::mutable::MutablePtData;
use crate::features::points_to::domain::{Datum, PointsToSet};

static EMPTY: PointsToSet = PointsToSet::new();

/// Points-to storage with per-key differential propagation state
#[derive(Debug, Clone)]
pub struct DiffPtData<K> {
    data: MutablePtData<K>,
    propagated: FxHashMap<K, PointsToSet>,
    diff: FxHashMap<K, PointsToSet>,
}

impl<K: Copy + Eq + Hash + Ord + Debug> DiffPtData<K> {
    pub fn new(track_reverse: bool) -> Self {
        Self {
            data: MutablePtData::new(track_reverse),
            propagated: FxHashMap::default(),
            diff: FxHashMap::default(),
        }
    }

    // Common storage contract, delegated

    #[inline]
    pub fn pts(&self, k: K) -> &PointsToSet {
        self.data.pts(k)
    }

    pub fn add_pts(&mut self, k: K, d: Datum) -> bool {
        self.data.add_pts(k, d)
    }

    pub fn union_pts(&mut self, dst: K, src: K) -> bool {
        self.data.union_pts(dst, src)
    }

    pub fn union_pts_with(&mut self, dst: K, src: &PointsToSet) -> bool {
        self.data.union_pts_with(dst, src)
    }

    pub fn clear_pts(&mut self, k: K, d: Datum) -> bool {
        // A cleared fact must be re-propagated if it ever reappears
        if let Some(p) = self.propagated.get_mut(&k) {
            p.remove(d);
        }
        self.data.clear_pts(k, d)
    }

    pub fn clear_full_pts(&mut self, k: K) {
        self.propagated.remove(&k);
        self.diff.remove(&k);
        self.data.clear_full_pts(k)
    }

    pub fn dump(&self) -> String {
        self.data.dump()
    }

    // Differential layer

    /// Recompute the diff for `k` against its full set and advance the
    /// propagated set. Returns true iff there is anything new to push.
    /// Calling twice without intervening fact additions leaves an empty
    /// diff the second time.
    pub fn compute_diff_pts(&mut self, k: K) -> bool {
        let all = self.data.pts(k);
        let propagated = self.propagated.entry(k).or_default();
        let diff = all.difference(propagated);
        propagated.union_with(all);
        let has_new = !diff.is_empty();
        self.diff.insert(k, diff);
        has_new
    }

    /// Facts discovered since the previous propagation of `k`
    #[inline]
    pub fn diff_pts(&self, k: K) -> &PointsToSet {
        self.diff.get(&k).unwrap_or(&EMPTY)
    }

    /// Facts already pushed downstream for `k`
    #[inline]
    pub fn propagated_pts(&self, k: K) -> &PointsToSet {
        self.propagated.get(&k).unwrap_or(&EMPTY)
    }
}
