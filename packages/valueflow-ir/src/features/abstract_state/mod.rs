//! Abstract execution state
//!
//! Per program point, every variable maps to either a numeric interval or a
//! set of abstract addresses. The address side reuses the points-to set
//! representation: addresses are object ids, including the null and
//! invalid-memory sentinels. Objects released by deallocation calls are
//! tracked in a freed set.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::interval::IntervalValue;
use crate::features::points_to::PointsToSet;
use crate::features::solver::PtaResult;
use crate::shared::ir::{IrGraph, VarId};

/// Set of abstract addresses (object ids)
pub type AddressSet = PointsToSet;

/// Value of one variable: numeric interval or address set
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractValue {
    Interval(IntervalValue),
    Addrs(AddressSet),
}

impl AbstractValue {
    pub fn interval(&self) -> Option<&IntervalValue> {
        match self {
            AbstractValue::Interval(iv) => Some(iv),
            _ => None,
        }
    }

    pub fn addrs(&self) -> Option<&AddressSet> {
        match self {
            AbstractValue::Addrs(a) => Some(a),
            _ => None,
        }
    }
}

/// Abstract state at one program point
#[derive(Debug, Clone, Default)]
pub struct AbstractState {
    values: FxHashMap<VarId, AbstractValue>,
    freed: FxHashSet<VarId>,
}

static NO_ADDRS: AddressSet = AddressSet::new();

impl AbstractState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the address side from solved points-to facts: every variable
    /// with resolved targets gets them as its address set.
    pub fn from_pta(graph: &IrGraph, pta: &PtaResult) -> Self {
        let mut state = Self::new();
        for id in 0..graph.var_count() as VarId {
            let pts = pta.pts(id);
            if !pts.is_empty() {
                state.set_addrs(id, pts.clone());
            }
        }
        state
    }

    pub fn get(&self, var: VarId) -> Option<&AbstractValue> {
        self.values.get(&var)
    }

    pub fn set_interval(&mut self, var: VarId, iv: IntervalValue) {
        self.values.insert(var, AbstractValue::Interval(iv));
    }

    pub fn set_addrs(&mut self, var: VarId, addrs: AddressSet) {
        self.values.insert(var, AbstractValue::Addrs(addrs));
    }

    pub fn add_addr(&mut self, var: VarId, obj: VarId) {
        match self.values.get_mut(&var) {
            Some(AbstractValue::Addrs(a)) => {
                a.insert(obj);
            }
            _ => {
                self.values
                    .insert(var, AbstractValue::Addrs(AddressSet::singleton(obj)));
            }
        }
    }

    /// Numeric view of a variable; unresolved or address-valued reads as top
    pub fn interval_of(&self, var: VarId) -> IntervalValue {
        match self.values.get(&var) {
            Some(AbstractValue::Interval(iv)) => *iv,
            _ => IntervalValue::top(),
        }
    }

    /// Address view of a variable; empty when it holds no addresses
    pub fn addrs_of(&self, var: VarId) -> &AddressSet {
        match self.values.get(&var) {
            Some(AbstractValue::Addrs(a)) => a,
            _ => &NO_ADDRS,
        }
    }

    pub fn mark_freed(&mut self, obj: VarId) {
        self.freed.insert(obj);
    }

    #[inline]
    pub fn is_freed(&self, obj: VarId) -> bool {
        self.freed.contains(&obj)
    }

    /// Join with another state (at control-flow merges): intervals join,
    /// address sets union, freed sets union. Returns true iff changed.
    pub fn join_with(&mut self, other: &AbstractState) -> bool {
        let mut changed = false;
        for (&var, val) in &other.values {
            match (self.values.get_mut(&var), val) {
                (None, v) => {
                    self.values.insert(var, v.clone());
                    changed = true;
                }
                (Some(AbstractValue::Interval(a)), AbstractValue::Interval(b)) => {
                    let before = *a;
                    a.join_with(b);
                    changed |= *a != before;
                }
                (Some(AbstractValue::Addrs(a)), AbstractValue::Addrs(b)) => {
                    changed |= a.union_with(b);
                }
                // Mixed kinds collapse to top on the numeric side
                (Some(slot), _) => {
                    if *slot != AbstractValue::Interval(IntervalValue::top()) {
                        *slot = AbstractValue::Interval(IntervalValue::top());
                        changed = true;
                    }
                }
            }
        }
        for &obj in &other.freed {
            changed |= self.freed.insert(obj);
        }
        changed
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::NULL_OBJ;

    #[test]
    fn test_interval_defaults_to_top() {
        let st = AbstractState::new();
        assert!(st.interval_of(5).is_top());
        assert!(st.addrs_of(5).is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let mut st = AbstractState::new();
        st.set_interval(1, IntervalValue::of(2, 8));
        st.add_addr(2, NULL_OBJ);
        st.add_addr(2, 10);

        assert_eq!(st.interval_of(1), IntervalValue::of(2, 8));
        assert!(st.addrs_of(2).contains(NULL_OBJ));
        assert_eq!(st.addrs_of(2).len(), 2);
    }

    #[test]
    fn test_freed_tracking() {
        let mut st = AbstractState::new();
        assert!(!st.is_freed(7));
        st.mark_freed(7);
        assert!(st.is_freed(7));
    }

    #[test]
    fn test_join() {
        let mut a = AbstractState::new();
        a.set_interval(1, IntervalValue::of(0, 5));
        a.add_addr(2, 10);

        let mut b = AbstractState::new();
        b.set_interval(1, IntervalValue::of(3, 9));
        b.add_addr(2, 20);
        b.mark_freed(10);

        assert!(a.join_with(&b));
        assert_eq!(a.interval_of(1), IntervalValue::of(0, 9));
        assert_eq!(a.addrs_of(2).len(), 2);
        assert!(a.is_freed(10));

        // Joining again changes nothing
        assert!(!a.join_with(&b));
    }
}
