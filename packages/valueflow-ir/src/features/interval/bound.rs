//! Extended integer bounds
//!
//! The numeral type backing the interval domain: an `i64` extended with both
//! infinities. Arithmetic saturates into the infinities on overflow, so a
//! bound computation never wraps.
//!
//! Variant order gives the derived `Ord` exactly the extended-integer order:
//! `NegInf < Finite(a) < Finite(b) < PosInf` for `a < b`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One end of an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntervalBound {
    NegInf,
    Finite(i64),
    PosInf,
}

use IntervalBound::{Finite, NegInf, PosInf};

impl IntervalBound {
    #[inline]
    pub fn is_finite(&self) -> bool {
        matches!(self, Finite(_))
    }

    #[inline]
    pub fn as_finite(&self) -> Option<i64> {
        match self {
            Finite(n) => Some(*n),
            _ => None,
        }
    }

    /// Absolute value; infinities stay infinite (positive)
    pub fn abs(self) -> IntervalBound {
        match self {
            NegInf | PosInf => PosInf,
            Finite(n) => Finite(n.saturating_abs()),
        }
    }

    pub fn neg(self) -> IntervalBound {
        match self {
            NegInf => PosInf,
            PosInf => NegInf,
            Finite(n) => {
                if n == i64::MIN {
                    PosInf
                } else {
                    Finite(-n)
                }
            }
        }
    }

    /// Saturating addition. `NegInf + PosInf` cannot arise from the bounds
    /// of a well-formed interval pair; it conservatively stays infinite on
    /// the side of the left operand.
    pub fn add(self, rhs: IntervalBound) -> IntervalBound {
        match (self, rhs) {
            (Finite(a), Finite(b)) => match a.checked_add(b) {
                Some(n) => Finite(n),
                None if a > 0 => PosInf,
                None => NegInf,
            },
            (NegInf, PosInf) | (PosInf, NegInf) => {
                debug_assert!(false, "adding opposite infinities");
                self
            }
            (NegInf, _) | (_, NegInf) => NegInf,
            (PosInf, _) | (_, PosInf) => PosInf,
        }
    }

    pub fn sub(self, rhs: IntervalBound) -> IntervalBound {
        self.add(rhs.neg())
    }

    /// Saturating multiplication with the `0 × ±∞ = 0` interval convention
    pub fn mul(self, rhs: IntervalBound) -> IntervalBound {
        match (self, rhs) {
            (Finite(a), Finite(b)) => match a.checked_mul(b) {
                Some(n) => Finite(n),
                None if (a > 0) == (b > 0) => PosInf,
                None => NegInf,
            },
            (Finite(0), _) | (_, Finite(0)) => Finite(0),
            (a, b) => {
                let a_pos = matches!(a, PosInf) || matches!(a, Finite(n) if n > 0);
                let b_pos = matches!(b, PosInf) || matches!(b, Finite(n) if n > 0);
                if a_pos == b_pos {
                    PosInf
                } else {
                    NegInf
                }
            }
        }
    }

    /// Division; the caller has already excluded divisors containing zero.
    /// A finite value divided by an infinity is zero.
    pub fn div(self, rhs: IntervalBound) -> IntervalBound {
        match (self, rhs) {
            (Finite(a), Finite(b)) => {
                debug_assert!(b != 0, "division by zero bound");
                if b == 0 {
                    return if a >= 0 { PosInf } else { NegInf };
                }
                Finite(a.wrapping_div(b))
            }
            (Finite(_), NegInf) | (Finite(_), PosInf) => Finite(0),
            (a, b) => {
                let a_pos = matches!(a, PosInf);
                let b_pos = matches!(b, PosInf) || matches!(b, Finite(n) if n > 0);
                if a_pos == b_pos {
                    PosInf
                } else {
                    NegInf
                }
            }
        }
    }

    pub fn min(self, rhs: IntervalBound) -> IntervalBound {
        if self <= rhs {
            self
        } else {
            rhs
        }
    }

    pub fn max(self, rhs: IntervalBound) -> IntervalBound {
        if self >= rhs {
            self
        } else {
            rhs
        }
    }
}

impl From<i64> for IntervalBound {
    fn from(n: i64) -> Self {
        Finite(n)
    }
}

impl fmt::Display for IntervalBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegInf => write!(f, "-inf"),
            PosInf => write!(f, "+inf"),
            Finite(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order() {
        assert!(NegInf < Finite(i64::MIN));
        assert!(Finite(i64::MAX) < PosInf);
        assert!(Finite(-3) < Finite(7));
        assert!(NegInf < PosInf);
    }

    #[test]
    fn test_add_saturates() {
        assert_eq!(Finite(i64::MAX).add(Finite(1)), PosInf);
        assert_eq!(Finite(i64::MIN).add(Finite(-1)), NegInf);
        assert_eq!(Finite(2).add(Finite(3)), Finite(5));
        assert_eq!(NegInf.add(Finite(100)), NegInf);
        assert_eq!(PosInf.add(Finite(-100)), PosInf);
    }

    #[test]
    fn test_mul_zero_convention() {
        // 0 × ±∞ = 0 keeps corner products of [0,0] × top exact
        assert_eq!(Finite(0).mul(PosInf), Finite(0));
        assert_eq!(NegInf.mul(Finite(0)), Finite(0));
        assert_eq!(Finite(-2).mul(PosInf), NegInf);
        assert_eq!(NegInf.mul(NegInf), PosInf);
    }

    #[test]
    fn test_div_by_infinity() {
        assert_eq!(Finite(42).div(PosInf), Finite(0));
        assert_eq!(Finite(42).div(NegInf), Finite(0));
        assert_eq!(PosInf.div(Finite(2)), PosInf);
        assert_eq!(PosInf.div(Finite(-2)), NegInf);
    }

    #[test]
    fn test_neg() {
        assert_eq!(NegInf.neg(), PosInf);
        assert_eq!(Finite(i64::MIN).neg(), PosInf);
        assert_eq!(Finite(5).neg(), Finite(-5));
    }

    #[test]
    fn test_abs() {
        assert_eq!(NegInf.abs(), PosInf);
        assert_eq!(Finite(-9).abs(), Finite(9));
    }
}
