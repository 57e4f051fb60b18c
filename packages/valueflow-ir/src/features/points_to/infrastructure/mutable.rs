//! Flow-insensitive points-to storage
//!
//! One points-to set per key with an optional reverse index (datum → keys
//! whose set contains it). Reverse tracking is a construction-time decision:
//! asking for reverse facts on a store built without tracking is caller
//! misuse and fails fast.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::features::points_to::domain::{Datum, PointsToSet};

static EMPTY: PointsToSet = PointsToSet::new();

/// Mutable points-to storage keyed by abstract location
#[derive(Debug, Clone)]
pub struct MutablePtData<K> {
    pts: FxHashMap<K, PointsToSet>,
    rev: Option<FxHashMap<Datum, FxHashSet<K>>>,
    empty_keys: FxHashSet<K>,
}

impl<K: Copy + Eq + Hash + Ord + Debug> MutablePtData<K> {
    /// Create a store; `track_reverse` enables the datum→keys index
    pub fn new(track_reverse: bool) -> Self {
        Self {
            pts: FxHashMap::default(),
            rev: track_reverse.then(FxHashMap::default),
            empty_keys: FxHashSet::default(),
        }
    }

    /// Points-to set of a key; a missing key reads as the empty set
    #[inline]
    pub fn pts(&self, k: K) -> &PointsToSet {
        self.pts.get(&k).unwrap_or(&EMPTY)
    }

    /// Insert one fact. Returns true iff the set changed.
    pub fn add_pts(&mut self, k: K, d: Datum) -> bool {
        let changed = self.pts.entry(k).or_default().insert(d);
        if changed {
            if let Some(rev) = &mut self.rev {
                rev.entry(d).or_default().insert(k);
            }
        }
        changed
    }

    /// Union the source key's set into the destination key's set.
    /// Returns true iff the destination changed.
    pub fn union_pts(&mut self, dst: K, src: K) -> bool {
        if dst == src {
            return false;
        }
        let src_set = match self.pts.get(&src) {
            Some(s) if !s.is_empty() => s.clone(),
            _ => return false,
        };
        self.union_pts_with(dst, &src_set)
    }

    /// Union an explicit set into the destination key's set.
    /// Returns true iff the destination changed.
    pub fn union_pts_with(&mut self, dst: K, src: &PointsToSet) -> bool {
        if src.is_empty() {
            return false;
        }
        let dst_set = self.pts.entry(dst).or_default();
        if let Some(rev) = &mut self.rev {
            // Index every element actually transferred
            let added = src.difference(dst_set);
            let changed = dst_set.union_with(src);
            for d in added.iter() {
                rev.entry(d).or_default().insert(dst);
            }
            changed
        } else {
            dst_set.union_with(src)
        }
    }

    /// Remove a single fact (precise kill of one alias)
    pub fn clear_pts(&mut self, k: K, d: Datum) -> bool {
        let removed = match self.pts.get_mut(&k) {
            Some(s) => s.remove(d),
            None => false,
        };
        if removed {
            if let Some(rev) = &mut self.rev {
                if let Some(keys) = rev.get_mut(&d) {
                    keys.remove(&k);
                }
            }
        }
        removed
    }

    /// Remove every fact for a key (full kill)
    pub fn clear_full_pts(&mut self, k: K) {
        if let Some(s) = self.pts.get_mut(&k) {
            if let Some(rev) = &mut self.rev {
                for d in s.iter() {
                    if let Some(keys) = rev.get_mut(&d) {
                        keys.remove(&k);
                    }
                }
            }
            s.clear();
        }
    }

    /// Keys whose points-to set contains `d`.
    ///
    /// # Panics
    /// Panics when the store was constructed without reverse tracking —
    /// callers must decide at construction time whether they need this.
    pub fn rev_pts(&self, d: Datum) -> &FxHashSet<K> {
        let rev = self
            .rev
            .as_ref()
            .expect("reverse points-to queried on a store built without reverse tracking");
        rev.get(&d).unwrap_or(&self.empty_keys)
    }

    /// Whether reverse tracking was enabled at construction
    #[inline]
    pub fn tracks_reverse(&self) -> bool {
        self.rev.is_some()
    }

    /// All keys with a (possibly empty) recorded set
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.pts.keys().copied()
    }

    /// Deterministic textual dump ordered by key
    pub fn dump(&self) -> String {
        let mut keys: Vec<K> = self.pts.keys().copied().collect();
        keys.sort_unstable();
        let mut out = String::new();
        for k in keys {
            out.push_str(&format!("{:?} -> {}\n", k, self.pts[&k]));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_key_reads_empty() {
        let pt: MutablePtData<u32> = MutablePtData::new(false);
        assert!(pt.pts(42).is_empty());
    }

    #[test]
    fn test_add_and_union() {
        let mut pt: MutablePtData<u32> = MutablePtData::new(false);
        assert!(pt.add_pts(1, 100));
        assert!(!pt.add_pts(1, 100));
        assert!(pt.add_pts(2, 200));

        // pts(1) ⊇ old(1) ∪ pts(2); pts(2) unchanged
        assert!(pt.union_pts(1, 2));
        assert!(pt.pts(1).contains(100));
        assert!(pt.pts(1).contains(200));
        assert_eq!(pt.pts(2).len(), 1);

        assert!(!pt.union_pts(1, 2));
        assert!(!pt.union_pts(1, 1));
    }

    #[test]
    fn test_monotonic_growth() {
        let mut pt: MutablePtData<u32> = MutablePtData::new(false);
        let mut last = 0;
        for d in [5u32, 3, 9, 3, 7] {
            pt.add_pts(1, d);
            assert!(pt.pts(1).len() >= last);
            last = pt.pts(1).len();
        }
    }

    #[test]
    fn test_reverse_index_consistency() {
        let mut pt: MutablePtData<u32> = MutablePtData::new(true);
        pt.add_pts(1, 100);
        pt.add_pts(2, 100);
        let set: PointsToSet = [100, 300].into_iter().collect();
        pt.union_pts_with(3, &set);

        for k in [1u32, 2, 3] {
            for d in pt.pts(k).iter() {
                assert!(pt.rev_pts(d).contains(&k), "rev missing ({k}, {d})");
            }
        }
        assert_eq!(pt.rev_pts(100).len(), 3);
        assert_eq!(pt.rev_pts(300).len(), 1);

        // Kills keep the index in sync
        pt.clear_pts(1, 100);
        assert!(!pt.rev_pts(100).contains(&1));
        pt.clear_full_pts(3);
        assert!(!pt.rev_pts(300).contains(&3));
        assert!(pt.pts(3).is_empty());
    }

    #[test]
    #[should_panic(expected = "reverse points-to")]
    fn test_reverse_without_tracking_panics() {
        let pt: MutablePtData<u32> = MutablePtData::new(false);
        pt.rev_pts(1);
    }

    #[test]
    fn test_dump_ordered() {
        let mut pt: MutablePtData<u32> = MutablePtData::new(false);
        pt.add_pts(2, 20);
        pt.add_pts(1, 10);
        let dump = pt.dump();
        let first = dump.lines().next().unwrap();
        assert!(first.starts_with("1 "));
    }
}
