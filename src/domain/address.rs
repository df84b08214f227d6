//! Chain-agnostic account and asset identity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A generic, chain-agnostic identity for any ledger participant: fungible
/// tokens, caller accounts, pools, and the registry itself all live in the
/// same address space.
///
/// Wraps a fixed-size `[u8; 32]` byte array. All 32-byte sequences are
/// valid addresses, so construction is infallible. Addresses order
/// lexicographically, which is what canonical pair ordering relies on.
///
/// # Examples
///
/// ```
/// use basin_dex::domain::Address;
///
/// let addr = Address::from_bytes([1u8; 32]);
/// assert_eq!(addr.as_bytes(), [1u8; 32]);
/// assert!(!addr.is_zero());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Address([u8; 32]);

impl Address {
    /// Creates an `Address` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying 32-byte representation.
    #[must_use]
    pub const fn as_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Returns the all-zero address — the absent identity.
    ///
    /// Used as the sentinel for "no recipient configured" and as the
    /// unrecoverable sink for the minimum-liquidity share lock.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the absent identity.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        let mut i = 0;
        while i < 32 {
            if self.0[i] != 0 {
                return false;
            }
            i += 1;
        }
        true
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_round_trip() {
        let bytes = [42u8; 32];
        let addr = Address::from_bytes(bytes);
        assert_eq!(addr.as_bytes(), bytes);
    }

    #[test]
    fn zero_is_all_zeros() {
        let addr = Address::zero();
        assert_eq!(addr.as_bytes(), [0u8; 32]);
        assert!(addr.is_zero());
    }

    #[test]
    fn nonzero_detected() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        assert!(!Address::from_bytes(bytes).is_zero());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let lo = Address::from_bytes([0u8; 32]);
        let hi = Address::from_bytes([1u8; 32]);
        assert!(lo < hi);
    }

    #[test]
    fn display_is_hex() {
        let addr = Address::zero();
        let shown = format!("{addr}");
        assert!(shown.starts_with("0x"));
        assert_eq!(shown.len(), 2 + 64);
    }

    #[test]
    fn default_is_zero() {
        assert_eq!(Address::default(), Address::zero());
    }

    #[test]
    fn serde_round_trip() {
        let addr = Address::from_bytes([7u8; 32]);
        let Ok(json) = serde_json::to_string(&addr) else {
            panic!("expected serializable address");
        };
        let Ok(back) = serde_json::from_str::<Address>(&json) else {
            panic!("expected deserializable address");
        };
        assert_eq!(addr, back);
    }

    #[test]
    fn copy_semantics() {
        let a = Address::from_bytes([5u8; 32]);
        let b = a;
        assert_eq!(a, b);
    }
}
