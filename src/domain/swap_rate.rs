//! Swap fee rate expressed as retained parts per ten thousand.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DexError, Result};

/// Denominator of the dimi scale (10 000 = 100%).
pub const DIMI_DENOMINATOR: u32 = 10_000;

/// The fraction of a swap's input that the pool keeps pricing, expressed in
/// ten-thousandths retained ("dimi"): `9_970` means 99.70% of the input is
/// priced and 0.30% is the fee.
///
/// Valid rates are `1..=10_000`; `10_000` is a fee-free swap, and a zero
/// rate (a 100% fee) is rejected because it makes every swap impossible.
///
/// # Examples
///
/// ```
/// use basin_dex::domain::SwapRate;
///
/// let rate = SwapRate::DEFAULT;
/// assert_eq!(rate.retained_dimi(), 9_970);
/// assert_eq!(rate.fee_dimi(), 30);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct SwapRate(u32);

impl SwapRate {
    /// The default fixed rate applied when no valuator is installed:
    /// 9970/10000, a 0.30% fee.
    pub const DEFAULT: Self = Self(9_970);

    /// A fee-free rate (10000/10000).
    pub const FEE_FREE: Self = Self(DIMI_DENOMINATOR);

    /// Creates a new `SwapRate` from retained dimi.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidRate`] unless `retained_dimi` is in
    /// `1..=10_000`.
    pub const fn new(retained_dimi: u32) -> Result<Self> {
        if retained_dimi == 0 || retained_dimi > DIMI_DENOMINATOR {
            return Err(DexError::InvalidRate);
        }
        Ok(Self(retained_dimi))
    }

    /// Returns the retained portion in dimi.
    #[must_use]
    pub const fn retained_dimi(&self) -> u32 {
        self.0
    }

    /// Returns the fee portion in dimi (`10_000 - retained`).
    #[must_use]
    pub const fn fee_dimi(&self) -> u32 {
        DIMI_DENOMINATOR - self.0
    }

    /// Returns the fee as a floating-point percentage (9970 -> 0.30).
    #[must_use]
    pub fn fee_percent(&self) -> f64 {
        f64::from(self.fee_dimi()) / 100.0
    }

    /// Returns the retained dimi the pricing formulas actually apply.
    ///
    /// Quoted fees are charged at half weight on the input side: a quoted
    /// 30-dimi fee prices swaps with 15 dimi taken, so the default rate
    /// applies `9_985/10_000`. When the quoted fee is odd the charged half
    /// rounds up, keeping the bias in the pool's favor.
    #[must_use]
    pub const fn applied_retained_dimi(&self) -> u32 {
        (DIMI_DENOMINATOR + self.0) / 2
    }

    /// Returns the fee dimi the pricing formulas actually charge
    /// (`10_000 - applied_retained_dimi`).
    #[must_use]
    pub const fn applied_fee_dimi(&self) -> u32 {
        DIMI_DENOMINATOR - self.applied_retained_dimi()
    }
}

impl Default for SwapRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for SwapRate {
    type Error = DexError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SwapRate> for u32 {
    fn from(rate: SwapRate) -> Self {
        rate.0
    }
}

impl fmt::Display for SwapRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, DIMI_DENOMINATOR)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_rate() {
        assert_eq!(SwapRate::DEFAULT.retained_dimi(), 9_970);
        assert_eq!(SwapRate::DEFAULT.fee_dimi(), 30);
        assert_eq!(SwapRate::default(), SwapRate::DEFAULT);
    }

    #[test]
    fn new_accepts_valid_range() {
        let Ok(min) = SwapRate::new(1) else {
            panic!("expected Ok");
        };
        assert_eq!(min.fee_dimi(), 9_999);
        let Ok(max) = SwapRate::new(10_000) else {
            panic!("expected Ok");
        };
        assert_eq!(max.fee_dimi(), 0);
        assert_eq!(max, SwapRate::FEE_FREE);
    }

    #[test]
    fn new_rejects_zero_and_excess() {
        assert_eq!(SwapRate::new(0), Err(DexError::InvalidRate));
        assert_eq!(SwapRate::new(10_001), Err(DexError::InvalidRate));
    }

    #[test]
    fn fee_percent_default() {
        let pct = SwapRate::DEFAULT.fee_percent();
        assert!((pct - 0.30).abs() < f64::EPSILON);
    }

    #[test]
    fn applied_rate_is_half_weight() {
        assert_eq!(SwapRate::DEFAULT.applied_retained_dimi(), 9_985);
        assert_eq!(SwapRate::DEFAULT.applied_fee_dimi(), 15);
        assert_eq!(SwapRate::FEE_FREE.applied_retained_dimi(), 10_000);
        assert_eq!(SwapRate::FEE_FREE.applied_fee_dimi(), 0);
        // Odd quoted fee: the charged half rounds up.
        let Ok(odd) = SwapRate::new(9_969) else {
            panic!("expected Ok");
        };
        assert_eq!(odd.applied_retained_dimi(), 9_984);
        assert_eq!(odd.applied_fee_dimi(), 16);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", SwapRate::DEFAULT), "9970/10000");
    }

    #[test]
    fn serde_rejects_invalid() {
        let Ok(valid) = serde_json::from_str::<SwapRate>("9970") else {
            panic!("expected valid rate to deserialize");
        };
        assert_eq!(valid, SwapRate::DEFAULT);
        assert!(serde_json::from_str::<SwapRate>("0").is_err());
        assert!(serde_json::from_str::<SwapRate>("10001").is_err());
    }

    #[test]
    fn ordering() {
        let Ok(lo) = SwapRate::new(9_900) else {
            panic!("expected Ok");
        };
        assert!(lo < SwapRate::DEFAULT);
    }
}
