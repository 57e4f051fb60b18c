//! Flow-sensitive (data-flow indexed) points-to storage
//!
//! Keys gain a second dimension: the program location. Every location owns
//! an IN map and an OUT map from key to points-to set; IN is the join of the
//! predecessors' OUTs and OUT derives from IN through the statement's
//! transfer function, killing the strongly-updated key when the store is a
//! strong update.
//!
//! The incremental variant keeps, per location, the set of keys whose IN
//! (resp. OUT) set changed since last consumption, so a fixpoint pass
//! re-examines only changed facts instead of every key at every location.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use super::mutable::MutablePtData;
use crate::features::points_to::domain::{Datum, PointsToSet};
use crate::shared::ir::IcfgId;

static EMPTY: PointsToSet = PointsToSet::new();

type LocMap<K> = FxHashMap<IcfgId, FxHashMap<K, PointsToSet>>;

/// Per-location IN/OUT points-to maps plus a non-indexed store for
/// register-like (top-level) keys
#[derive(Debug, Clone)]
pub struct DfPtData<K> {
    ins: LocMap<K>,
    outs: LocMap<K>,
    tlv: MutablePtData<K>,
}

impl<K: Copy + Eq + Hash + Ord + Debug> DfPtData<K> {
    pub fn new(track_reverse: bool) -> Self {
        Self {
            ins: FxHashMap::default(),
            outs: FxHashMap::default(),
            tlv: MutablePtData::new(track_reverse),
        }
    }

    // ── Per-location accessors ─────────────────────────────────────────────

    /// IN set of (loc, k); missing entries read as empty
    pub fn df_in_pts(&self, loc: IcfgId, k: K) -> &PointsToSet {
        self.ins
            .get(&loc)
            .and_then(|m| m.get(&k))
            .unwrap_or(&EMPTY)
    }

    /// OUT set of (loc, k); missing entries read as empty
    pub fn df_out_pts(&self, loc: IcfgId, k: K) -> &PointsToSet {
        self.outs
            .get(&loc)
            .and_then(|m| m.get(&k))
            .unwrap_or(&EMPTY)
    }

    /// Insert one fact into the IN set of (loc, k)
    pub fn add_df_in_pts(&mut self, loc: IcfgId, k: K, d: Datum) -> bool {
        self.ins
            .entry(loc)
            .or_default()
            .entry(k)
            .or_default()
            .insert(d)
    }

    /// Insert one fact into the OUT set of (loc, k)
    pub fn add_df_out_pts(&mut self, loc: IcfgId, k: K, d: Datum) -> bool {
        self.outs
            .entry(loc)
            .or_default()
            .entry(k)
            .or_default()
            .insert(d)
    }

    /// Keys present in the IN map of a location
    pub fn df_in_keys(&self, loc: IcfgId) -> Vec<K> {
        self.ins
            .get(&loc)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    // ── Cross-edge propagation ─────────────────────────────────────────────
    // Each returns true iff the destination set changed (worklist signal).

    /// IN(src) → IN(dst)
    pub fn update_df_in_from_in(&mut self, src_loc: IcfgId, src_k: K, dst_loc: IcfgId, dst_k: K) -> bool {
        let facts = self.df_in_pts(src_loc, src_k).clone();
        self.union_into(Side::In, dst_loc, dst_k, &facts)
    }

    /// OUT(src) → IN(dst): the ordinary control-flow-edge propagation
    pub fn update_df_in_from_out(&mut self, src_loc: IcfgId, src_k: K, dst_loc: IcfgId, dst_k: K) -> bool {
        let facts = self.df_out_pts(src_loc, src_k).clone();
        self.union_into(Side::In, dst_loc, dst_k, &facts)
    }

    /// IN(src) → OUT(dst): the identity transfer for one key
    pub fn update_df_out_from_in(&mut self, src_loc: IcfgId, src_k: K, dst_loc: IcfgId, dst_k: K) -> bool {
        let facts = self.df_in_pts(src_loc, src_k).clone();
        self.union_into(Side::Out, dst_loc, dst_k, &facts)
    }

    /// Apply the per-location transfer function: copy IN→OUT for every key,
    /// except `singleton` when `strong_update` holds — the statement
    /// overwrites that object, so its old fact is killed rather than
    /// re-derived.
    pub fn update_all_df_out_from_in(&mut self, loc: IcfgId, singleton: K, strong_update: bool) -> bool {
        let mut changed = false;
        for k in self.df_in_keys(loc) {
            if strong_update && k == singleton {
                continue;
            }
            changed |= self.update_df_out_from_in(loc, k, loc, k);
        }
        changed
    }

    // ── Copies between a location's maps and the top-level store ──────────

    /// IN(loc, src) → pts(dst): a load hands a memory version's facts to a
    /// top-level variable
    pub fn update_tlv_pts(&mut self, loc: IcfgId, dst: K, src: K) -> bool {
        let facts = self.df_in_pts(loc, src).clone();
        self.tlv.union_pts_with(dst, &facts)
    }

    /// pts(src) → OUT(loc, dst): a store hands a top-level variable's facts
    /// to a memory version
    pub fn update_atv_pts(&mut self, loc: IcfgId, dst: K, src: K) -> bool {
        let facts = self.tlv.pts(src).clone();
        self.union_into(Side::Out, loc, dst, &facts)
    }

    fn union_into(&mut self, side: Side, loc: IcfgId, k: K, facts: &PointsToSet) -> bool {
        if facts.is_empty() {
            return false;
        }
        let map = match side {
            Side::In => &mut self.ins,
            Side::Out => &mut self.outs,
        };
        map.entry(loc)
            .or_default()
            .entry(k)
            .or_default()
            .union_with(facts)
    }

    // ── Top-level store (common contract) ──────────────────────────────────

    #[inline]
    pub fn pts(&self, k: K) -> &PointsToSet {
        self.tlv.pts(k)
    }

    pub fn add_pts(&mut self, k: K, d: Datum) -> bool {
        self.tlv.add_pts(k, d)
    }

    pub fn union_pts(&mut self, dst: K, src: K) -> bool {
        self.tlv.union_pts(dst, src)
    }

    pub fn union_pts_with(&mut self, dst: K, src: &PointsToSet) -> bool {
        self.tlv.union_pts_with(dst, src)
    }

    pub fn clear_pts(&mut self, k: K, d: Datum) -> bool {
        self.tlv.clear_pts(k, d)
    }

    pub fn clear_full_pts(&mut self, k: K) {
        self.tlv.clear_full_pts(k)
    }

    /// Deterministic dump: top-level store first, then locations in order
    pub fn dump(&self) -> String {
        let mut out = self.tlv.dump();
        let mut locs: Vec<IcfgId> = self.ins.keys().chain(self.outs.keys()).copied().collect();
        locs.sort_unstable();
        locs.dedup();
        for loc in locs {
            out.push_str(&format!("-- loc {loc}\n"));
            for (label, map) in [("in", self.ins.get(&loc)), ("out", self.outs.get(&loc))] {
                if let Some(m) = map {
                    let mut keys: Vec<K> = m.keys().copied().collect();
                    keys.sort_unstable();
                    for k in keys {
                        out.push_str(&format!("  {label} {:?} -> {}\n", k, m[&k]));
                    }
                }
            }
        }
        out
    }
}

#[derive(Clone, Copy)]
enum Side {
    In,
    Out,
}

/// Flow-sensitive storage that additionally tracks, per location, which keys
/// changed on the IN and OUT side since last consumption
#[derive(Debug, Clone)]
pub struct IncDfPtData<K> {
    df: DfPtData<K>,
    in_updated: FxHashMap<IcfgId, FxHashSet<K>>,
    out_updated: FxHashMap<IcfgId, FxHashSet<K>>,
}

impl<K: Copy + Eq + Hash + Ord + Debug> IncDfPtData<K> {
    pub fn new(track_reverse: bool) -> Self {
        Self {
            df: DfPtData::new(track_reverse),
            in_updated: FxHashMap::default(),
            out_updated: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn df_in_pts(&self, loc: IcfgId, k: K) -> &PointsToSet {
        self.df.df_in_pts(loc, k)
    }

    #[inline]
    pub fn df_out_pts(&self, loc: IcfgId, k: K) -> &PointsToSet {
        self.df.df_out_pts(loc, k)
    }

    #[inline]
    pub fn pts(&self, k: K) -> &PointsToSet {
        self.df.pts(k)
    }

    pub fn add_pts(&mut self, k: K, d: Datum) -> bool {
        self.df.add_pts(k, d)
    }

    pub fn add_df_in_pts(&mut self, loc: IcfgId, k: K, d: Datum) -> bool {
        let changed = self.df.add_df_in_pts(loc, k, d);
        if changed {
            self.in_updated.entry(loc).or_default().insert(k);
        }
        changed
    }

    pub fn add_df_out_pts(&mut self, loc: IcfgId, k: K, d: Datum) -> bool {
        let changed = self.df.add_df_out_pts(loc, k, d);
        if changed {
            self.out_updated.entry(loc).or_default().insert(k);
        }
        changed
    }

    pub fn update_df_in_from_in(&mut self, src_loc: IcfgId, src_k: K, dst_loc: IcfgId, dst_k: K) -> bool {
        let changed = self.df.update_df_in_from_in(src_loc, src_k, dst_loc, dst_k);
        if changed {
            self.in_updated.entry(dst_loc).or_default().insert(dst_k);
        }
        changed
    }

    pub fn update_df_in_from_out(&mut self, src_loc: IcfgId, src_k: K, dst_loc: IcfgId, dst_k: K) -> bool {
        let changed = self.df.update_df_in_from_out(src_loc, src_k, dst_loc, dst_k);
        if changed {
            self.in_updated.entry(dst_loc).or_default().insert(dst_k);
        }
        changed
    }

    pub fn update_df_out_from_in(&mut self, src_loc: IcfgId, src_k: K, dst_loc: IcfgId, dst_k: K) -> bool {
        let changed = self.df.update_df_out_from_in(src_loc, src_k, dst_loc, dst_k);
        if changed {
            self.out_updated.entry(dst_loc).or_default().insert(dst_k);
        }
        changed
    }

    /// Transfer over the changed IN keys only. Consumes the location's
    /// IN-side change set: a key leaves it exactly when its fact has been
    /// pushed onward here.
    pub fn update_all_df_out_from_in(&mut self, loc: IcfgId, singleton: K, strong_update: bool) -> bool {
        let changed_keys = match self.in_updated.remove(&loc) {
            Some(ks) => ks,
            None => return false,
        };
        let mut changed = false;
        for k in changed_keys {
            if strong_update && k == singleton {
                continue;
            }
            changed |= self.update_df_out_from_in(loc, k, loc, k);
        }
        changed
    }

    pub fn update_tlv_pts(&mut self, loc: IcfgId, dst: K, src: K) -> bool {
        self.df.update_tlv_pts(loc, dst, src)
    }

    pub fn update_atv_pts(&mut self, loc: IcfgId, dst: K, src: K) -> bool {
        let changed = self.df.update_atv_pts(loc, dst, src);
        if changed {
            self.out_updated.entry(loc).or_default().insert(dst);
        }
        changed
    }

    /// Keys whose IN set at `loc` changed and has not been consumed
    pub fn in_updated(&self, loc: IcfgId) -> impl Iterator<Item = K> + '_ {
        self.in_updated.get(&loc).into_iter().flatten().copied()
    }

    /// Drain the OUT-side change set of a location
    pub fn drain_out_updated(&mut self, loc: IcfgId) -> Vec<K> {
        self.out_updated
            .remove(&loc)
            .map(|s| s.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn dump(&self) -> String {
        self.df.dump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_out_accessors_auto_empty() {
        let df: DfPtData<u32> = DfPtData::new(false);
        assert!(df.df_in_pts(1, 2).is_empty());
        assert!(df.df_out_pts(1, 2).is_empty());
    }

    #[test]
    fn test_edge_propagation_signals_change() {
        let mut df: DfPtData<u32> = DfPtData::new(false);
        df.add_df_out_pts(1, 7, 100);

        // OUT(1) → IN(2) across a control-flow edge
        assert!(df.update_df_in_from_out(1, 7, 2, 7));
        assert!(df.df_in_pts(2, 7).contains(100));

        // Re-propagating the same facts is a no-op
        assert!(!df.update_df_in_from_out(1, 7, 2, 7));
    }

    #[test]
    fn test_strong_update_kills_singleton() {
        let mut df: DfPtData<u32> = DfPtData::new(false);
        df.add_df_in_pts(5, 10, 100); // singleton key
        df.add_df_in_pts(5, 11, 200); // unrelated key

        // Strong update: singleton's IN fact must NOT reach OUT
        df.update_all_df_out_from_in(5, 10, true);
        assert!(df.df_out_pts(5, 10).is_empty());
        assert!(df.df_out_pts(5, 11).contains(200));

        // Weak update: everything copies
        let mut df2: DfPtData<u32> = DfPtData::new(false);
        df2.add_df_in_pts(5, 10, 100);
        df2.add_df_in_pts(5, 11, 200);
        df2.update_all_df_out_from_in(5, 10, false);
        assert!(df2.df_out_pts(5, 10).contains(100));
        assert!(df2.df_out_pts(5, 11).contains(200));
    }

    #[test]
    fn test_tlv_atv_copies() {
        let mut df: DfPtData<u32> = DfPtData::new(false);

        // Load: memory version's IN facts reach the top-level var
        df.add_df_in_pts(3, 50, 500);
        assert!(df.update_tlv_pts(3, 8, 50));
        assert!(df.pts(8).contains(500));

        // Store: top-level var's facts reach the memory version's OUT
        df.add_pts(9, 900);
        assert!(df.update_atv_pts(4, 60, 9));
        assert!(df.df_out_pts(4, 60).contains(900));
    }

    #[test]
    fn test_incremental_tracks_changed_keys() {
        let mut inc: IncDfPtData<u32> = IncDfPtData::new(false);
        inc.add_df_in_pts(1, 10, 100);
        inc.add_df_in_pts(1, 11, 200);

        let mut updated: Vec<u32> = inc.in_updated(1).collect();
        updated.sort_unstable();
        assert_eq!(updated, vec![10, 11]);

        // Transfer consumes the change set
        inc.update_all_df_out_from_in(1, 0, false);
        assert_eq!(inc.in_updated(1).count(), 0);
        assert!(inc.df_out_pts(1, 10).contains(100));

        // OUT-side changes recorded and drainable
        let mut outs = inc.drain_out_updated(1);
        outs.sort_unstable();
        assert_eq!(outs, vec![10, 11]);
        assert!(inc.drain_out_updated(1).is_empty());
    }

    #[test]
    fn test_incremental_strong_update() {
        let mut inc: IncDfPtData<u32> = IncDfPtData::new(false);
        inc.add_df_in_pts(2, 10, 100);
        inc.add_df_in_pts(2, 11, 200);

        inc.update_all_df_out_from_in(2, 10, true);
        assert!(inc.df_out_pts(2, 10).is_empty());
        assert!(inc.df_out_pts(2, 11).contains(200));
    }
}
