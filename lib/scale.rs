//! Log-space magnitude factors.
//!
//! Long chains of tensor contractions multiply many norms together, which
//! overflows or underflows ordinary floating point long before the *relative*
//! structure of the data degrades. Every tensor therefore keeps its element
//! array near unit magnitude and carries the overall magnitude separately as
//! a [`LogScale`]: a signed scalar stored as `sign · exp(log)`. Multiplying
//! two scales adds their logs; rescaling a tensor by a real factor touches
//! only its scale.

use std::{
    fmt,
    ops::{ Mul, MulAssign },
};
use num_traits::Float;

/// A real scalar held in log space as `sign · exp(log)`.
///
/// `sign == 0` encodes exact zero; `log` is meaningless in that case and held
/// at zero.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LogScale<R> {
    log: R,
    sign: i8,
}

impl<R: Float> LogScale<R> {
    /// The multiplicative identity, `+exp(0)`.
    #[inline]
    pub fn one() -> Self { Self { log: R::zero(), sign: 1 } }

    /// Exact zero.
    #[inline]
    pub fn zero() -> Self { Self { log: R::zero(), sign: 0 } }

    /// Convert from an ordinary real number.
    pub fn from_real(x: R) -> Self {
        if x.is_zero() {
            Self::zero()
        } else {
            Self { log: x.abs().ln(), sign: if x > R::zero() { 1 } else { -1 } }
        }
    }

    /// `true` if this is exact zero.
    #[inline]
    pub fn is_zero(&self) -> bool { self.sign == 0 }

    /// Sign as `-1`, `0`, or `+1`.
    #[inline]
    pub fn sign(&self) -> i8 { self.sign }

    /// Natural log of the magnitude. Only meaningful when non-zero.
    #[inline]
    pub fn log(&self) -> R { self.log }

    /// Materialize to an ordinary real number.
    ///
    /// May overflow to infinity or underflow to zero; callers that care about
    /// extreme magnitudes should work with ratios instead.
    pub fn expand(&self) -> R {
        match self.sign {
            0 => R::zero(),
            s => R::from(s).unwrap() * self.log.exp(),
        }
    }

    /// The real factor `f` such that `self = f · other`, materialized.
    ///
    /// Meaningless when `other` is zero.
    pub fn ratio_to(&self, other: &Self) -> R {
        if self.sign == 0 {
            R::zero()
        } else {
            R::from(self.sign * other.sign).unwrap() * (self.log - other.log).exp()
        }
    }

    /// The scale of larger magnitude (zero loses to anything).
    pub fn max_mag(self, other: Self) -> Self {
        match (self.sign, other.sign) {
            (0, _) => other,
            (_, 0) => self,
            _ => if self.log >= other.log { self } else { other },
        }
    }
}

impl<R: Float> Mul for LogScale<R> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.sign == 0 || rhs.sign == 0 {
            Self::zero()
        } else {
            Self { log: self.log + rhs.log, sign: self.sign * rhs.sign }
        }
    }
}

impl<R: Float> MulAssign for LogScale<R> {
    fn mul_assign(&mut self, rhs: Self) { *self = *self * rhs; }
}

impl<R: Float + fmt::Display> fmt::Display for LogScale<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sign {
            0 => write!(f, "0"),
            -1 => write!(f, "-exp({})", self.log),
            _ => write!(f, "exp({})", self.log),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        for x in [1.0_f64, -2.5, 1e-12, 3.7e11] {
            let s = LogScale::from_real(x);
            assert!((s.expand() - x).abs() <= 1e-12 * x.abs());
        }
        assert_eq!(LogScale::from_real(0.0_f64).expand(), 0.0);
    }

    #[test]
    fn mul_adds_logs() {
        let a = LogScale::from_real(2.0_f64);
        let b = LogScale::from_real(-3.0_f64);
        let c = a * b;
        assert_eq!(c.sign(), -1);
        assert!((c.expand() + 6.0).abs() < 1e-12);
        assert!((a * LogScale::zero()).is_zero());
    }

    #[test]
    fn extreme_products_stay_finite_in_log_space() {
        let mut s = LogScale::one();
        for _ in 0..100 {
            s *= LogScale::from_real(1.0e200_f64);
        }
        assert!(!s.is_zero());
        assert!(s.log().is_finite());
        assert!(s.expand().is_infinite()); // materializing is the lossy step
    }

    #[test]
    fn ratios() {
        let a = LogScale::from_real(8.0_f64);
        let b = LogScale::from_real(2.0_f64);
        assert!((a.ratio_to(&b) - 4.0).abs() < 1e-12);
        assert!((b.ratio_to(&a) - 0.25).abs() < 1e-12);
        assert_eq!(a.max_mag(b), a);
    }
}
