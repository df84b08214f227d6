//! Raw token amount with checked arithmetic.

use core::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::Rounding;

/// A raw asset amount in the smallest unit.
///
/// `Amount` never interprets decimals; reserves, share quantities, and
/// transfer values are all plain `u128` magnitudes. Arithmetic methods are
/// checked: they return `None` on overflow, underflow, or division by zero
/// instead of panicking.
///
/// For the constant-product formulas, where a product of two amounts can
/// exceed `u128`, [`mul_div`](Self::mul_div) widens through `U256` and only
/// fails if the final quotient does not fit back into `u128`.
///
/// # Examples
///
/// ```
/// use basin_dex::domain::{Amount, Rounding};
///
/// let a = Amount::new(100);
/// let b = Amount::new(200);
/// assert_eq!(a.checked_add(&b), Some(Amount::new(300)));
/// assert_eq!(
///     a.mul_div(&b, &Amount::new(3), Rounding::Down),
///     Some(Amount::new(6_666)),
/// );
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
#[must_use]
pub struct Amount(u128);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u128::MAX);

    /// Creates a new `Amount` from a raw `u128` value.
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Returns the underlying `u128` value.
    #[must_use]
    pub const fn get(&self) -> u128 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(&self, other: &Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(&self, other: &Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_mul(&self, other: &Self) -> Option<Self> {
        match self.0.checked_mul(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked division with explicit rounding direction.
    ///
    /// Returns `None` if `divisor` is zero.
    #[must_use]
    pub const fn checked_div(&self, divisor: &Self, rounding: Rounding) -> Option<Self> {
        if divisor.0 == 0 {
            return None;
        }
        let q = self.0 / divisor.0;
        let r = self.0 % divisor.0;
        match rounding {
            Rounding::Down => Some(Self(q)),
            Rounding::Up => {
                if r != 0 {
                    // q + 1 cannot overflow: r != 0 implies q < u128::MAX.
                    Some(Self(q + 1))
                } else {
                    Some(Self(q))
                }
            }
        }
    }

    /// Computes `self * multiplier / divisor` with a 256-bit intermediate.
    ///
    /// The full product never overflows (128 x 128 bits fits in 256);
    /// returns `None` only if `divisor` is zero or the quotient exceeds
    /// `u128::MAX`.
    #[must_use]
    pub fn mul_div(&self, multiplier: &Self, divisor: &Self, rounding: Rounding) -> Option<Self> {
        if divisor.0 == 0 {
            return None;
        }
        let product = U256::from(self.0) * U256::from(multiplier.0);
        let d = U256::from(divisor.0);
        let mut q = product / d;
        if rounding == Rounding::Up && !(product % d).is_zero() {
            q += U256::one();
        }
        if q > U256::from(u128::MAX) {
            return None;
        }
        Some(Self(q.as_u128()))
    }

    /// Widens to a `U256` for invariant arithmetic.
    #[must_use]
    pub fn widen(&self) -> U256 {
        U256::from(self.0)
    }

    /// Returns the smaller of the two amounts.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
