//! Unified error types for the Basin DEX core.
//!
//! All fallible operations across the crate return [`DexError`] as their
//! error type. Every failure is synchronous and aborts the whole operation
//! with no partial state change: stateful entry points snapshot the ledger
//! and the pool state they touch and restore both before returning an error.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, DexError>;

/// Every named failure condition of the exchange core.
///
/// The taxonomy groups into input validation (identical/zero assets, empty
/// paths), policy (unauthorized or disallowed), liquidity (zero computed
/// shares or payout, depleted reserves), invariant (the post-swap product
/// check), and bounds (slippage minimums, deadlines, excessive input).
/// Callers decide whether to retry with adjusted parameters; nothing is
/// retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DexError {
    /// Both assets of a would-be pair are the same identifier.
    #[error("identical assets")]
    IdenticalAssets,

    /// The zero address was supplied where a real identity is required.
    #[error("zero address")]
    ZeroAddress,

    /// A pool for this unordered token pair already exists.
    #[error("pair exists")]
    PairExists,

    /// No pool exists for the requested pair or address.
    #[error("pool not found")]
    PoolNotFound,

    /// Global pool creation is switched off and the caller is not the
    /// fee administrator.
    #[error("pool creation disallowed")]
    CreationDisallowed,

    /// One of the pair's tokens is on the disallow list.
    #[error("token disallowed")]
    TokenDisallowed,

    /// This specific unordered pair is on the disallow list.
    #[error("pair disallowed")]
    PairDisallowed,

    /// Caller is not the fee administrator.
    #[error("forbidden")]
    Forbidden,

    /// The candidate valuator does not advertise the swap-valuator
    /// capability marker.
    #[error("invalid swap valuator")]
    InvalidValuator,

    /// A swap rate outside `1..=10_000` retained-dimi.
    #[error("invalid swap rate")]
    InvalidRate,

    /// A deposit too small to mint any pool shares.
    #[error("insufficient liquidity minted")]
    InsufficientLiquidityMinted,

    /// A share redemption whose payout rounds to zero on either side.
    #[error("insufficient liquidity burned")]
    InsufficientLiquidityBurned,

    /// A swap requesting zero output, or an exact-in chain falling short
    /// of the caller's minimum.
    #[error("insufficient output amount")]
    InsufficientOutputAmount,

    /// A swap that received no input, or a zero `amount_in` quote.
    #[error("insufficient input amount")]
    InsufficientInputAmount,

    /// A zero amount where a non-zero quantity is required.
    #[error("insufficient amount")]
    InsufficientAmount,

    /// Computed token-A deposit or payout below the caller's minimum.
    #[error("insufficient A amount")]
    InsufficientAAmount,

    /// Computed token-B deposit or payout below the caller's minimum.
    #[error("insufficient B amount")]
    InsufficientBAmount,

    /// Reserves cannot satisfy the requested amount.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// Swap recipient equals one of the pool's own token identifiers.
    #[error("invalid recipient")]
    InvalidRecipient,

    /// The fee-adjusted constant-product check failed after a swap.
    #[error("K")]
    K,

    /// A swap path with fewer than two tokens.
    #[error("invalid path")]
    InvalidPath,

    /// An exact-out chain requiring more input than the caller's maximum.
    #[error("excessive input amount")]
    ExcessiveInputAmount,

    /// The operation completed after its deadline.
    #[error("expired")]
    Expired,

    /// A ledger transfer exceeding the sender's balance.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// A delegated transfer exceeding the spender's allowance.
    #[error("insufficient allowance")]
    InsufficientAllowance,

    /// A native-currency operation exceeding the account's native balance.
    #[error("insufficient native balance")]
    InsufficientNativeBalance,

    /// Arithmetic overflow or underflow, with a short context string.
    #[error("overflow: {0}")]
    Overflow(&'static str),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
}
