//! Collaborator interfaces consumed by the core.
//!
//! The exchange never owns token balances itself; it moves value on an
//! external fungible-token ledger reached through [`TokenLedger`]. The
//! trait is deliberately narrow — balance query, transfer, allowance —
//! plus a snapshot/restore pair that renders the host's all-or-nothing
//! transaction semantics: every stateful operation snapshots the ledger at
//! entry and restores it before surfacing an error.
//!
//! Ledgers are allowed to deduct their own fee on transfer. The core
//! therefore measures actual balance deltas instead of trusting nominal
//! amounts wherever the difference matters.

mod memory;

pub use memory::MemoryLedger;

use crate::domain::{Address, Amount};
use crate::error::Result;

/// A fungible-token ledger with standard value-transfer semantics.
///
/// One ledger instance serves every token identifier; all operations take
/// the token address first. A transfer may credit the recipient with less
/// than the requested amount if the token deducts a transfer fee — the
/// ledger only guarantees the sender is debited exactly.
pub trait TokenLedger {
    /// Opaque saved state for atomic rollback.
    type Snapshot;

    /// Captures the entire ledger state.
    fn snapshot(&self) -> Self::Snapshot;

    /// Restores a previously captured state, discarding everything since.
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Returns `account`'s balance of `token`.
    fn balance_of(&self, token: Address, account: Address) -> Amount;

    /// Moves `amount` of `token` from `from` to `to` on `from`'s own
    /// authority.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientBalance`](crate::error::DexError::InsufficientBalance)
    /// if `from` holds less than `amount`.
    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: Amount)
        -> Result<()>;

    /// Grants `spender` the right to move up to `amount` of `owner`'s
    /// `token`. [`Amount::MAX`] is treated as unlimited and never
    /// decremented.
    ///
    /// # Errors
    ///
    /// Implementations may reject zero identities.
    fn approve(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<()>;

    /// Returns the remaining allowance of `spender` over `owner`'s `token`.
    fn allowance(&self, token: Address, owner: Address, spender: Address) -> Amount;

    /// Moves `amount` of `token` from `from` to `to` on `spender`'s
    /// authority, consuming allowance unless `spender == from`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientAllowance`](crate::error::DexError::InsufficientAllowance)
    /// or [`DexError::InsufficientBalance`](crate::error::DexError::InsufficientBalance).
    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()>;
}

/// A ledger that additionally wraps the host's native currency into a
/// fungible token, one unit for one unit.
pub trait NativeLedger: TokenLedger {
    /// The token identifier of the wrapped native currency.
    fn wrapped_token(&self) -> Address;

    /// Returns `account`'s unwrapped native balance.
    fn native_balance_of(&self, account: Address) -> Amount;

    /// Moves native currency between accounts.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientNativeBalance`](crate::error::DexError::InsufficientNativeBalance)
    /// if `from` holds less than `amount`.
    fn native_transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<()>;

    /// Converts `amount` of `account`'s native currency into wrapped
    /// units, crediting the same account.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientNativeBalance`](crate::error::DexError::InsufficientNativeBalance).
    fn deposit(&mut self, account: Address, amount: Amount) -> Result<()>;

    /// Converts `amount` of `account`'s wrapped units back into native
    /// currency.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientBalance`](crate::error::DexError::InsufficientBalance).
    fn withdraw(&mut self, account: Address, amount: Amount) -> Result<()>;
}

/// Synchronous flash-swap callback.
///
/// When a swap carries callback data, the pool transfers the requested
/// outputs optimistically, invokes [`on_swap`](Self::on_swap) inside the
/// same atomic unit, and only then verifies the constant-product
/// invariant against the resulting balances. The callee is expected to
/// return enough input (of either token) to the pool's address for the
/// check to pass; otherwise the whole unit rolls back with
/// [`DexError::K`](crate::error::DexError::K).
pub trait SwapCallee<L: TokenLedger> {
    /// Invoked mid-swap, after outputs have been transferred to the
    /// recipient.
    ///
    /// # Errors
    ///
    /// Any error aborts and rolls back the enclosing swap.
    fn on_swap(
        &mut self,
        ledger: &mut L,
        pool: Address,
        amount0_out: Amount,
        amount1_out: Amount,
    ) -> Result<()>;
}
