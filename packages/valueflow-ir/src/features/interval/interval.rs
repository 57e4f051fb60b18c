//! Closed interval abstract domain
//!
//! `[lb, ub]` over the extended integers. `lb > ub` encodes bottom (the
//! canonical empty interval is `[1, 0]`); `[-inf, +inf]` is top. Arithmetic
//! follows standard interval rules with bottom propagating through every
//! operator. Comparisons are 3-valued: `[1,1]` means the relation holds for
//! all pairs, `[0,0]` for none, `[0,1]` is indeterminate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Rem, Sub};

use super::bound::IntervalBound;
use IntervalBound::{Finite, NegInf, PosInf};

/// Closed numeric interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntervalValue {
    lb: IntervalBound,
    ub: IntervalBound,
}

impl IntervalValue {
    pub fn new(lb: IntervalBound, ub: IntervalBound) -> Self {
        Self { lb, ub }
    }

    /// Interval from finite bounds
    pub fn of(lb: i64, ub: i64) -> Self {
        Self::new(Finite(lb), Finite(ub))
    }

    /// Exact single value `[n, n]`
    pub fn constant(n: i64) -> Self {
        Self::of(n, n)
    }

    /// `[-inf, +inf]`
    pub fn top() -> Self {
        Self::new(NegInf, PosInf)
    }

    /// The canonical empty interval `[1, 0]`
    pub fn bottom() -> Self {
        Self::of(1, 0)
    }

    #[inline]
    pub fn lb(&self) -> IntervalBound {
        self.lb
    }

    #[inline]
    pub fn ub(&self) -> IntervalBound {
        self.ub
    }

    #[inline]
    pub fn is_bottom(&self) -> bool {
        self.lb > self.ub
    }

    #[inline]
    pub fn is_top(&self) -> bool {
        self.lb == NegInf && self.ub == PosInf
    }

    /// The single value when the interval is exact
    pub fn as_exact(&self) -> Option<i64> {
        match (self.lb, self.ub) {
            (Finite(a), Finite(b)) if a == b => Some(a),
            _ => None,
        }
    }

    pub fn contains(&self, n: i64) -> bool {
        !self.is_bottom() && self.lb <= Finite(n) && Finite(n) <= self.ub
    }

    pub fn contains_zero(&self) -> bool {
        self.contains(0)
    }

    /// Whether `other` is entirely inside `self`
    pub fn contains_interval(&self, other: &IntervalValue) -> bool {
        if other.is_bottom() {
            return true;
        }
        if self.is_bottom() {
            return false;
        }
        self.lb <= other.lb && other.ub <= self.ub
    }

    // ── Lattice operators ──────────────────────────────────────────────────

    /// Least upper bound (convex hull)
    pub fn join_with(&mut self, other: &IntervalValue) {
        if other.is_bottom() {
            return;
        }
        if self.is_bottom() {
            *self = *other;
            return;
        }
        self.lb = self.lb.min(other.lb);
        self.ub = self.ub.max(other.ub);
    }

    /// Greatest lower bound
    pub fn meet_with(&mut self, other: &IntervalValue) {
        if self.is_bottom() {
            return;
        }
        if other.is_bottom() {
            *self = Self::bottom();
            return;
        }
        self.lb = self.lb.max(other.lb);
        self.ub = self.ub.min(other.ub);
        if self.is_bottom() {
            *self = Self::bottom();
        }
    }

    /// Widening: a bound that moved in the growing direction since the
    /// previous iterate jumps to infinity, guaranteeing termination.
    pub fn widen_with(&mut self, other: &IntervalValue) {
        if other.is_bottom() {
            return;
        }
        if self.is_bottom() {
            *self = *other;
            return;
        }
        if other.lb < self.lb {
            self.lb = NegInf;
        }
        if other.ub > self.ub {
            self.ub = PosInf;
        }
    }

    /// Narrowing: only bounds that are currently infinite are tightened,
    /// taking them from the other operand.
    pub fn narrow_with(&mut self, other: &IntervalValue) {
        if self.is_bottom() || other.is_bottom() {
            return;
        }
        if self.lb == NegInf {
            self.lb = other.lb;
        }
        if self.ub == PosInf {
            self.ub = other.ub;
        }
    }

    // ── 3-valued comparisons ───────────────────────────────────────────────

    fn tri(always: bool, never: bool) -> IntervalValue {
        if always {
            Self::constant(1)
        } else if never {
            Self::constant(0)
        } else {
            Self::of(0, 1)
        }
    }

    pub fn gt(&self, other: &IntervalValue) -> IntervalValue {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        Self::tri(self.lb > other.ub, self.ub <= other.lb)
    }

    pub fn ge(&self, other: &IntervalValue) -> IntervalValue {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        Self::tri(self.lb >= other.ub, self.ub < other.lb)
    }

    pub fn lt(&self, other: &IntervalValue) -> IntervalValue {
        other.gt(self)
    }

    pub fn le(&self, other: &IntervalValue) -> IntervalValue {
        other.ge(self)
    }

    pub fn equal(&self, other: &IntervalValue) -> IntervalValue {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let always = match (self.as_exact(), other.as_exact()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        let never = self.lb > other.ub || self.ub < other.lb;
        Self::tri(always, never)
    }

    pub fn not_equal(&self, other: &IntervalValue) -> IntervalValue {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        let eq = self.equal(other);
        match eq.as_exact() {
            Some(1) => Self::constant(0),
            Some(0) => Self::constant(1),
            _ => Self::of(0, 1),
        }
    }

    // ── Best-effort bitwise/shift over-approximations ──────────────────────

    /// Left shift modeled as multiplication by an interval of powers of two
    pub fn shl(&self, rhs: &IntervalValue) -> IntervalValue {
        if self.is_bottom() || rhs.is_bottom() {
            return Self::bottom();
        }
        match (rhs.lb.as_finite(), rhs.ub.as_finite()) {
            // Shifts of 63+ would overflow the power-of-two factor itself
            (Some(lo), Some(hi)) if (0..63).contains(&lo) && (0..63).contains(&hi) => {
                let factor = Self::new(Finite(1i64 << lo), Finite(1i64 << hi));
                *self * factor
            }
            _ => Self::top(),
        }
    }

    /// Arithmetic right shift; exact only when both operands are exact
    pub fn shr(&self, rhs: &IntervalValue) -> IntervalValue {
        if self.is_bottom() || rhs.is_bottom() {
            return Self::bottom();
        }
        match (self.as_exact(), rhs.as_exact()) {
            (Some(a), Some(s)) if (0..64).contains(&s) => Self::constant(a >> s),
            _ => Self::top(),
        }
    }

    /// Bitwise ops are exact on exact operands and top otherwise
    pub fn bit_and(&self, rhs: &IntervalValue) -> IntervalValue {
        self.exact_binop(rhs, |a, b| a & b)
    }

    pub fn bit_or(&self, rhs: &IntervalValue) -> IntervalValue {
        self.exact_binop(rhs, |a, b| a | b)
    }

    pub fn bit_xor(&self, rhs: &IntervalValue) -> IntervalValue {
        self.exact_binop(rhs, |a, b| a ^ b)
    }

    fn exact_binop(&self, rhs: &IntervalValue, f: impl Fn(i64, i64) -> i64) -> IntervalValue {
        if self.is_bottom() || rhs.is_bottom() {
            return Self::bottom();
        }
        match (self.as_exact(), rhs.as_exact()) {
            (Some(a), Some(b)) => Self::constant(f(a, b)),
            _ => Self::top(),
        }
    }
}

impl Default for IntervalValue {
    fn default() -> Self {
        Self::top()
    }
}

impl Add for IntervalValue {
    type Output = IntervalValue;

    fn add(self, rhs: IntervalValue) -> IntervalValue {
        if self.is_bottom() || rhs.is_bottom() {
            return Self::bottom();
        }
        Self::new(self.lb.add(rhs.lb), self.ub.add(rhs.ub))
    }
}

impl Sub for IntervalValue {
    type Output = IntervalValue;

    fn sub(self, rhs: IntervalValue) -> IntervalValue {
        if self.is_bottom() || rhs.is_bottom() {
            return Self::bottom();
        }
        Self::new(self.lb.sub(rhs.ub), self.ub.sub(rhs.lb))
    }
}

impl Mul for IntervalValue {
    type Output = IntervalValue;

    fn mul(self, rhs: IntervalValue) -> IntervalValue {
        if self.is_bottom() || rhs.is_bottom() {
            return Self::bottom();
        }
        let corners = [
            self.lb.mul(rhs.lb),
            self.lb.mul(rhs.ub),
            self.ub.mul(rhs.lb),
            self.ub.mul(rhs.ub),
        ];
        let lb = corners.iter().copied().fold(PosInf, IntervalBound::min);
        let ub = corners.iter().copied().fold(NegInf, IntervalBound::max);
        Self::new(lb, ub)
    }
}

impl Div for IntervalValue {
    type Output = IntervalValue;

    fn div(self, rhs: IntervalValue) -> IntervalValue {
        if self.is_bottom() || rhs.is_bottom() {
            return Self::bottom();
        }
        if rhs.contains_zero() {
            // Dividing the exact zero interval still yields zero
            return if self.as_exact() == Some(0) {
                Self::constant(0)
            } else {
                Self::top()
            };
        }
        let corners = [
            self.lb.div(rhs.lb),
            self.lb.div(rhs.ub),
            self.ub.div(rhs.lb),
            self.ub.div(rhs.ub),
        ];
        let lb = corners.iter().copied().fold(PosInf, IntervalBound::min);
        let ub = corners.iter().copied().fold(NegInf, IntervalBound::max);
        Self::new(lb, ub)
    }
}

impl Rem for IntervalValue {
    type Output = IntervalValue;

    fn rem(self, rhs: IntervalValue) -> IntervalValue {
        if self.is_bottom() || rhs.is_bottom() {
            return Self::bottom();
        }
        if rhs.contains_zero() {
            return if self.as_exact() == Some(0) {
                Self::constant(0)
            } else {
                Self::top()
            };
        }
        if let (Some(a), Some(b)) = (self.as_exact(), rhs.as_exact()) {
            return Self::constant(a.wrapping_rem(b));
        }
        // |result| < |divisor| and |result| <= |dividend|; the sign follows
        // the dividend's possible signs
        let div_abs = self.lb.abs().max(self.ub.abs());
        let rhs_abs = rhs.lb.abs().max(rhs.ub.abs());
        let bound = match (div_abs, rhs_abs) {
            (Finite(a), Finite(b)) => Finite(a.min(b.saturating_sub(1))),
            (Finite(a), _) => Finite(a),
            (_, Finite(b)) => Finite(b.saturating_sub(1)),
            _ => return Self::top(),
        };
        let lb = if self.lb < Finite(0) { bound.neg() } else { Finite(0) };
        let ub = if self.ub > Finite(0) { bound } else { Finite(0) };
        Self::new(lb, ub)
    }
}

impl fmt::Display for IntervalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            write!(f, "⊥")
        } else {
            write!(f, "[{}, {}]", self.lb, self.ub)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_encoding() {
        let b = IntervalValue::bottom();
        assert!(b.is_bottom());
        assert_eq!(b, IntervalValue::of(1, 0));
        assert!(!IntervalValue::of(0, 0).is_bottom());
    }

    #[test]
    fn test_arithmetic_on_bottom() {
        let b = IntervalValue::bottom();
        let x = IntervalValue::of(1, 5);
        assert!((b + x).is_bottom());
        assert!((x - b).is_bottom());
        assert!((b * x).is_bottom());
        assert!((x / b).is_bottom());
        assert!((x % b).is_bottom());
    }

    #[test]
    fn test_add_sub() {
        let a = IntervalValue::of(1, 3);
        let b = IntervalValue::of(10, 20);
        assert_eq!(a + b, IntervalValue::of(11, 23));
        assert_eq!(b - a, IntervalValue::of(7, 19));
    }

    #[test]
    fn test_mul_corners() {
        let a = IntervalValue::of(-2, 3);
        let b = IntervalValue::of(4, 5);
        // corners: -10, -8, 12, 15
        assert_eq!(a * b, IntervalValue::of(-10, 15));
    }

    #[test]
    fn test_div_by_zero_interval() {
        let a = IntervalValue::of(1, 5);
        let z = IntervalValue::of(-1, 1);
        assert!((a / z).is_top());

        // Exact zero dividend stays zero
        let zero = IntervalValue::constant(0);
        assert_eq!(zero / z, IntervalValue::constant(0));

        let d = IntervalValue::of(2, 4);
        assert_eq!(IntervalValue::of(8, 16) / d, IntervalValue::of(2, 8));
    }

    #[test]
    fn test_rem() {
        // Exact values are precise
        assert_eq!(
            IntervalValue::constant(7) % IntervalValue::constant(3),
            IntervalValue::constant(1)
        );
        assert_eq!(
            IntervalValue::constant(-7) % IntervalValue::constant(3),
            IntervalValue::constant(-1)
        );

        // Divisor containing zero degrades to top
        assert!((IntervalValue::of(1, 5) % IntervalValue::of(0, 3)).is_top());

        // General case: bounded by min(|dividend|, |divisor| - 1), sign from
        // the dividend
        let r = IntervalValue::of(0, 100) % IntervalValue::of(1, 10);
        assert_eq!(r, IntervalValue::of(0, 9));

        let r = IntervalValue::of(-4, 100) % IntervalValue::of(1, 10);
        assert_eq!(r, IntervalValue::of(-9, 9));
    }

    #[test]
    fn test_comparison_exactness() {
        // [5,5] > [3,3] == [1,1]
        assert_eq!(
            IntervalValue::constant(5).gt(&IntervalValue::constant(3)),
            IntervalValue::constant(1)
        );
        // [1,2] > [3,4] == [0,0]
        assert_eq!(
            IntervalValue::of(1, 2).gt(&IntervalValue::of(3, 4)),
            IntervalValue::constant(0)
        );
        // [1,5] > [3,4] == [0,1]
        assert_eq!(
            IntervalValue::of(1, 5).gt(&IntervalValue::of(3, 4)),
            IntervalValue::of(0, 1)
        );
    }

    #[test]
    fn test_eq_ne() {
        assert_eq!(
            IntervalValue::constant(4).equal(&IntervalValue::constant(4)),
            IntervalValue::constant(1)
        );
        assert_eq!(
            IntervalValue::of(1, 2).equal(&IntervalValue::of(5, 9)),
            IntervalValue::constant(0)
        );
        assert_eq!(
            IntervalValue::of(1, 4).equal(&IntervalValue::of(2, 3)),
            IntervalValue::of(0, 1)
        );
        assert_eq!(
            IntervalValue::constant(4).not_equal(&IntervalValue::constant(4)),
            IntervalValue::constant(0)
        );
    }

    #[test]
    fn test_join_meet() {
        let mut a = IntervalValue::of(1, 3);
        a.join_with(&IntervalValue::of(7, 9));
        assert_eq!(a, IntervalValue::of(1, 9));

        let mut b = IntervalValue::bottom();
        b.join_with(&IntervalValue::of(2, 4));
        assert_eq!(b, IntervalValue::of(2, 4));

        let mut c = IntervalValue::top();
        c.meet_with(&IntervalValue::of(2, 4));
        assert_eq!(c, IntervalValue::of(2, 4));

        let mut d = IntervalValue::of(1, 2);
        d.meet_with(&IntervalValue::of(5, 6));
        assert!(d.is_bottom());
    }

    #[test]
    fn test_widen_narrow() {
        let mut w = IntervalValue::of(0, 10);
        w.widen_with(&IntervalValue::of(0, 11));
        assert_eq!(w, IntervalValue::new(Finite(0), PosInf));

        w.widen_with(&IntervalValue::of(-1, 5));
        assert_eq!(w, IntervalValue::top());

        // Narrowing only pulls back infinite bounds
        let mut n = IntervalValue::new(Finite(0), PosInf);
        n.narrow_with(&IntervalValue::of(0, 100));
        assert_eq!(n, IntervalValue::of(0, 100));

        let mut keep = IntervalValue::of(3, 7);
        keep.narrow_with(&IntervalValue::of(0, 100));
        assert_eq!(keep, IntervalValue::of(3, 7));
    }

    #[test]
    fn test_shl_as_mul() {
        assert_eq!(
            IntervalValue::constant(3).shl(&IntervalValue::constant(2)),
            IntervalValue::constant(12)
        );
        assert_eq!(
            IntervalValue::of(1, 2).shl(&IntervalValue::of(1, 3)),
            IntervalValue::of(2, 16)
        );
        assert!(IntervalValue::of(1, 2)
            .shl(&IntervalValue::of(-1, 3))
            .is_top());
    }

    #[test]
    fn test_top_absorbs() {
        let t = IntervalValue::top();
        let x = IntervalValue::of(2, 4);
        assert!((t + x).is_top());
        assert!(t.contains_interval(&x));
    }
}
