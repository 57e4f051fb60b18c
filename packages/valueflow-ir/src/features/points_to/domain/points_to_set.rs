//! Points-to set
//!
//! Sparse set of object ids kept as a sorted vector: iteration is ordered
//! (deterministic dumps), membership is a binary search, and union is a
//! linear merge. Every mutator reports whether the set actually changed —
//! that bit is the worklist re-trigger signal throughout the solver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A points-to target (abstract object id)
pub type Datum = u32;

/// Sorted sparse set of points-to targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointsToSet {
    elems: Vec<Datum>,
}

impl PointsToSet {
    pub const fn new() -> Self {
        Self { elems: Vec::new() }
    }

    pub fn singleton(d: Datum) -> Self {
        Self { elems: vec![d] }
    }

    /// Insert an element. Returns true iff it was not present.
    pub fn insert(&mut self, d: Datum) -> bool {
        match self.elems.binary_search(&d) {
            Ok(_) => false,
            Err(pos) => {
                self.elems.insert(pos, d);
                true
            }
        }
    }

    /// Remove an element. Returns true iff it was present.
    pub fn remove(&mut self, d: Datum) -> bool {
        match self.elems.binary_search(&d) {
            Ok(pos) => {
                self.elems.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    #[inline]
    pub fn contains(&self, d: Datum) -> bool {
        self.elems.binary_search(&d).is_ok()
    }

    /// Union in-place: `self = self ∪ other`. Returns true iff `self` grew.
    pub fn union_with(&mut self, other: &PointsToSet) -> bool {
        if other.elems.is_empty() {
            return false;
        }
        if self.elems.is_empty() {
            self.elems = other.elems.clone();
            return true;
        }
        let old_len = self.elems.len();
        let mut merged = Vec::with_capacity(old_len + other.elems.len());
        let (a, b) = (&self.elems, &other.elems);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    merged.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        let changed = merged.len() > old_len;
        self.elems = merged;
        changed
    }

    /// Elements of `self` not in `other`
    pub fn difference(&self, other: &PointsToSet) -> PointsToSet {
        let mut out = Vec::new();
        let mut j = 0;
        for &e in &self.elems {
            while j < other.elems.len() && other.elems[j] < e {
                j += 1;
            }
            if j >= other.elems.len() || other.elems[j] != e {
                out.push(e);
            }
        }
        PointsToSet { elems: out }
    }

    /// Whether the sets share any element
    pub fn intersects(&self, other: &PointsToSet) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.elems.len() && j < other.elems.len() {
            match self.elems[i].cmp(&other.elems[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }

    pub fn is_subset_of(&self, other: &PointsToSet) -> bool {
        if self.elems.len() > other.elems.len() {
            return false;
        }
        self.elems.iter().all(|&e| other.contains(e))
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Datum> + '_ {
        self.elems.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn clear(&mut self) {
        self.elems.clear();
    }
}

impl FromIterator<Datum> for PointsToSet {
    fn from_iter<I: IntoIterator<Item = Datum>>(iter: I) -> Self {
        let mut elems: Vec<Datum> = iter.into_iter().collect();
        elems.sort_unstable();
        elems.dedup();
        Self { elems }
    }
}

impl fmt::Display for PointsToSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.elems.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sorted() {
        let mut s = PointsToSet::new();
        assert!(s.insert(5));
        assert!(s.insert(1));
        assert!(s.insert(9));
        assert!(!s.insert(5));

        assert_eq!(s.iter().collect::<Vec<_>>(), vec![1, 5, 9]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_union_reports_change() {
        let mut a: PointsToSet = [1, 3, 5].into_iter().collect();
        let b: PointsToSet = [2, 3].into_iter().collect();

        assert!(a.union_with(&b));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1, 2, 3, 5]);

        // Second union with the same source is a no-op
        assert!(!a.union_with(&b));
    }

    #[test]
    fn test_difference() {
        let a: PointsToSet = [1, 2, 3, 4].into_iter().collect();
        let b: PointsToSet = [2, 4, 6].into_iter().collect();
        assert_eq!(a.difference(&b).iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(b.difference(&b).is_empty());
    }

    #[test]
    fn test_intersects_subset() {
        let a: PointsToSet = [1, 3].into_iter().collect();
        let b: PointsToSet = [3, 5].into_iter().collect();
        let c: PointsToSet = [2, 4].into_iter().collect();

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.is_subset_of(&[1, 2, 3].into_iter().collect()));
        assert!(!a.is_subset_of(&c));
    }

    #[test]
    fn test_remove() {
        let mut s: PointsToSet = [1, 2, 3].into_iter().collect();
        assert!(s.remove(2));
        assert!(!s.remove(2));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_display() {
        let s: PointsToSet = [3, 1].into_iter().collect();
        assert_eq!(s.to_string(), "{1, 3}");
    }
}
