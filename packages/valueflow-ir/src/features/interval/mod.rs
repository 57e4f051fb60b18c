//! Interval abstract domain
//!
//! Extended-integer bounds and the closed-interval lattice used by the
//! abstract interpreter and the detectors. Widening/narrowing make fixpoint
//! iteration terminate over unbounded loops; comparisons return 3-valued
//! intervals.

mod bound;
#[allow(clippy::module_inception)]
mod interval;

pub use bound::IntervalBound;
pub use interval::IntervalValue;

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_interval() -> impl Strategy<Value = IntervalValue> {
        (-1000i64..1000, -1000i64..1000).prop_map(|(a, b)| {
            if a <= b {
                IntervalValue::of(a, b)
            } else {
                IntervalValue::of(b, a)
            }
        })
    }

    proptest! {
        #[test]
        fn join_is_upper_bound(a in arb_interval(), b in arb_interval()) {
            let mut j = a;
            j.join_with(&b);
            prop_assert!(j.contains_interval(&a));
            prop_assert!(j.contains_interval(&b));
        }

        #[test]
        fn meet_is_lower_bound(a in arb_interval(), b in arb_interval()) {
            let mut m = a;
            m.meet_with(&b);
            prop_assert!(a.contains_interval(&m));
            prop_assert!(b.contains_interval(&m));
        }

        #[test]
        fn bottom_join_is_identity(a in arb_interval()) {
            let mut j = IntervalValue::bottom();
            j.join_with(&a);
            prop_assert_eq!(j, a);
        }

        #[test]
        fn top_meet_is_identity(a in arb_interval()) {
            let mut m = IntervalValue::top();
            m.meet_with(&a);
            prop_assert_eq!(m, a);
        }

        #[test]
        fn bottom_absorbs_arithmetic(a in arb_interval()) {
            prop_assert!((IntervalValue::bottom() + a).is_bottom());
            prop_assert!((a - IntervalValue::bottom()).is_bottom());
            prop_assert!((IntervalValue::bottom() * a).is_bottom());
        }

        #[test]
        fn add_is_sound(a in -100i64..100, b in -100i64..100,
                        c in -100i64..100, d in -100i64..100) {
            let (a, b) = if a <= b { (a, b) } else { (b, a) };
            let (c, d) = if c <= d { (c, d) } else { (d, c) };
            let sum = IntervalValue::of(a, b) + IntervalValue::of(c, d);
            // Every concrete pair lands inside the abstract sum
            prop_assert!(sum.contains(a + c));
            prop_assert!(sum.contains(a + d));
            prop_assert!(sum.contains(b + c));
            prop_assert!(sum.contains(b + d));
        }

        #[test]
        fn widen_terminates_upward(a in arb_interval(), b in arb_interval()) {
            let mut w = a;
            w.widen_with(&b);
            // Widening never loses either operand
            prop_assert!(w.contains_interval(&a));
            prop_assert!(w.contains_interval(&b));
        }
    }
}
