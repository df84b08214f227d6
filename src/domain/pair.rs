//! Canonically ordered pair of distinct token identifiers.

use serde::{Deserialize, Serialize};

use super::Address;
use crate::error::{DexError, Result};

/// An unordered pair of distinct, non-zero token addresses stored in
/// canonical order: `token0() < token1()`.
///
/// The ordering is fixed at construction and never changes for the
/// lifetime of a pool, which is what makes `(A, B)` and `(B, A)` resolve
/// to the same pool.
///
/// # Examples
///
/// ```
/// use basin_dex::domain::{Address, TokenPair};
///
/// let a = Address::from_bytes([1u8; 32]);
/// let b = Address::from_bytes([2u8; 32]);
///
/// // Order is enforced automatically:
/// let pair = TokenPair::new(b, a).expect("distinct tokens");
/// assert_eq!(pair.token0(), a);
/// assert_eq!(pair.token1(), b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    token0: Address,
    token1: Address,
}

impl TokenPair {
    /// Creates a new canonically-ordered `TokenPair`.
    ///
    /// # Errors
    ///
    /// - [`DexError::IdenticalAssets`] if both addresses are equal.
    /// - [`DexError::ZeroAddress`] if either address is the absent identity.
    pub fn new(token_a: Address, token_b: Address) -> Result<Self> {
        if token_a == token_b {
            return Err(DexError::IdenticalAssets);
        }
        if token_a.is_zero() || token_b.is_zero() {
            return Err(DexError::ZeroAddress);
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Ok(Self { token0, token1 })
    }

    /// Returns the lower-addressed token.
    #[must_use]
    pub const fn token0(&self) -> Address {
        self.token0
    }

    /// Returns the higher-addressed token.
    #[must_use]
    pub const fn token1(&self) -> Address {
        self.token1
    }

    /// Returns the canonical `(token0, token1)` tuple, the index key.
    #[must_use]
    pub const fn key(&self) -> (Address, Address) {
        (self.token0, self.token1)
    }

    /// Returns `true` if the given token is part of this pair.
    #[must_use]
    pub fn contains(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// Returns the counterpart of `token` in this pair.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolNotFound`] if `token` is not in the pair.
    pub fn other(&self, token: Address) -> Result<Address> {
        if token == self.token0 {
            Ok(self.token1)
        } else if token == self.token1 {
            Ok(self.token0)
        } else {
            Err(DexError::PoolNotFound)
        }
    }

    /// Returns `true` if `token` is `token0`, the pricing orientation of
    /// a swap entering on this token.
    #[must_use]
    pub fn is_token0(&self, token: Address) -> bool {
        self.token0 == token
    }
}
