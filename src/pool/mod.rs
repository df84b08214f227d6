//! Constant-product pool engine.
//!
//! A [`Pool`] holds cached reserves for one sorted [`TokenPair`], a
//! [`ShareLedger`] for its liquidity shares, and a [`PriceOracle`]. The
//! engine follows the optimistic-transfer-then-validate discipline: a swap
//! pays out first, optionally hands control to a flash-swap callee, and
//! only then checks the fee-adjusted constant-product invariant against
//! measured balances. Every state-changing operation is atomic — on any
//! error both the pool and the token ledger roll back to their state at
//! entry.
//!
//! Pools are created through the registry; nothing here validates pair
//! uniqueness or creation policy.

mod oracle;
mod shares;

#[cfg(test)]
mod proptest_properties;

pub use oracle::PriceOracle;
pub use shares::ShareLedger;

use primitive_types::U256;
use tracing::debug;

use crate::domain::{Address, Amount, BlockEnv, Rounding, SwapRate, TokenPair, DIMI_DENOMINATOR};
use crate::error::{DexError, Result};
use crate::ledger::{SwapCallee, TokenLedger};

/// Shares permanently locked to the zero address on the first mint.
///
/// Locking a floor of supply makes the all-shares-burned state
/// unreachable and raises the cost of share-price manipulation attacks
/// against tiny pools.
pub const MINIMUM_LIQUIDITY: Amount = Amount::new(1_000);

/// Integer square root by Newton's method, rounding down.
fn isqrt(value: U256) -> U256 {
    if value.is_zero() {
        return U256::zero();
    }
    let mut x = value;
    let mut y = (value + U256::one()) >> 1;
    while y < x {
        x = y;
        y = (x + value / x) >> 1;
    }
    x
}

/// One constant-product liquidity pool.
///
/// Reserves are a cache of the pool's measured ledger balances, refreshed
/// at the end of every state-changing operation. The gap between cached
/// reserves and live balances is what [`sync`](Pool::sync) and
/// [`skim`](Pool::skim) reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    address: Address,
    pair: TokenPair,
    reserve0: Amount,
    reserve1: Amount,
    shares: ShareLedger,
    oracle: PriceOracle,
    /// `reserve0 * reserve1` as of the most recent liquidity event, kept
    /// only while a protocol fee recipient is configured.
    k_last: U256,
}

impl Pool {
    pub(crate) fn new(address: Address, pair: TokenPair) -> Self {
        Self {
            address,
            pair,
            reserve0: Amount::ZERO,
            reserve1: Amount::ZERO,
            shares: ShareLedger::default(),
            oracle: PriceOracle::default(),
            k_last: U256::zero(),
        }
    }

    // -- accessors ----------------------------------------------------------

    /// The pool's own ledger address, holder of its reserves.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The sorted token pair this pool trades.
    #[must_use]
    pub const fn pair(&self) -> TokenPair {
        self.pair
    }

    /// Cached reserves in `(token0, token1)` order.
    #[must_use]
    pub const fn reserves(&self) -> (Amount, Amount) {
        (self.reserve0, self.reserve1)
    }

    /// The cumulative price oracle state.
    #[must_use]
    pub const fn oracle(&self) -> &PriceOracle {
        &self.oracle
    }

    /// `reserve0 * reserve1` at the last liquidity event, zero when no
    /// protocol fee recipient was configured at that time.
    #[must_use]
    pub const fn k_last(&self) -> U256 {
        self.k_last
    }

    /// Outstanding share supply.
    #[must_use]
    pub fn total_shares(&self) -> Amount {
        self.shares.total()
    }

    /// `account`'s share balance.
    #[must_use]
    pub fn share_balance_of(&self, account: Address) -> Amount {
        self.shares.balance_of(account)
    }

    /// Remaining share allowance of `spender` over `owner`.
    #[must_use]
    pub fn share_allowance(&self, owner: Address, spender: Address) -> Amount {
        self.shares.allowance(owner, spender)
    }

    // -- share transfer surface ---------------------------------------------

    /// Moves shares on the owner's authority.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientBalance`].
    pub fn transfer_shares(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        self.shares.transfer(from, to, amount)
    }

    /// Grants `spender` a share allowance. [`Amount::MAX`] is unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::ZeroAddress`] for a zero spender.
    pub fn approve_shares(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<()> {
        self.shares.approve(owner, spender, amount)
    }

    /// Moves shares on `spender`'s authority, consuming allowance.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientAllowance`] or
    /// [`DexError::InsufficientBalance`].
    pub fn transfer_shares_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.shares.transfer_from(spender, from, to, amount)
    }

    /// Applies a deadline-bound pre-authorized share allowance.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Expired`] past the deadline.
    pub fn permit_shares(
        &mut self,
        block: BlockEnv,
        owner: Address,
        spender: Address,
        amount: Amount,
        deadline: u64,
    ) -> Result<()> {
        self.shares.permit(block, owner, spender, amount, deadline)
    }

    // -- liquidity ----------------------------------------------------------

    /// Issues shares to `recipient` for whatever tokens arrived at the
    /// pool's address since the last reserve update.
    ///
    /// The first mint locks [`MINIMUM_LIQUIDITY`] shares to the zero
    /// address and issues `sqrt(amount0 * amount1)` minus that lock;
    /// later mints issue proportionally to the smaller deposit side, so
    /// unbalanced deposits donate their excess to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientLiquidityMinted`] when the deposit
    /// yields zero shares (or fails to cover the first-mint lock). On any
    /// error the pool and ledger are rolled back.
    pub fn mint<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        block: BlockEnv,
        fee_to: Option<Address>,
        recipient: Address,
    ) -> Result<Amount> {
        let saved = self.clone();
        let snapshot = ledger.snapshot();
        match self.mint_inner(ledger, block, fee_to, recipient) {
            Ok(issued) => Ok(issued),
            Err(err) => {
                *self = saved;
                ledger.restore(snapshot);
                Err(err)
            }
        }
    }

    fn mint_inner<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        block: BlockEnv,
        fee_to: Option<Address>,
        recipient: Address,
    ) -> Result<Amount> {
        let (token0, token1) = self.pair.key();
        let balance0 = ledger.balance_of(token0, self.address);
        let balance1 = ledger.balance_of(token1, self.address);
        let amount0 = balance0
            .checked_sub(&self.reserve0)
            .ok_or(DexError::Overflow("pool balance below reserve"))?;
        let amount1 = balance1
            .checked_sub(&self.reserve1)
            .ok_or(DexError::Overflow("pool balance below reserve"))?;

        let fee_on = self.mint_protocol_fee(fee_to)?;
        let total = self.shares.total();
        let issued = if total.is_zero() {
            let root = isqrt(amount0.widen() * amount1.widen());
            if root > U256::from(u128::MAX) {
                return Err(DexError::Overflow("initial share supply"));
            }
            let issued = Amount::new(root.as_u128())
                .checked_sub(&MINIMUM_LIQUIDITY)
                .ok_or(DexError::InsufficientLiquidityMinted)?;
            self.shares.mint(Address::zero(), MINIMUM_LIQUIDITY)?;
            issued
        } else {
            let share0 = amount0
                .mul_div(&total, &self.reserve0, Rounding::Down)
                .ok_or(DexError::Overflow("share issue"))?;
            let share1 = amount1
                .mul_div(&total, &self.reserve1, Rounding::Down)
                .ok_or(DexError::Overflow("share issue"))?;
            share0.min(share1)
        };
        if issued.is_zero() {
            return Err(DexError::InsufficientLiquidityMinted);
        }
        self.shares.mint(recipient, issued)?;

        self.update(block, balance0, balance1);
        if fee_on {
            self.k_last = self.reserve0.widen() * self.reserve1.widen();
        }
        debug!(pool = %self.address, %recipient, %issued, "mint");
        Ok(issued)
    }

    /// Burns the shares held at the pool's own address and pays out the
    /// pro-rata portion of both balances to `recipient`.
    ///
    /// Callers transfer shares to the pool first, mirroring the deposit
    /// flow of [`mint`](Pool::mint). Payouts come from measured balances,
    /// so any donated surplus is distributed too.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientLiquidityBurned`] when either
    /// payout rounds to zero. On any error the pool and ledger are rolled
    /// back.
    pub fn burn<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        block: BlockEnv,
        fee_to: Option<Address>,
        recipient: Address,
    ) -> Result<(Amount, Amount)> {
        let saved = self.clone();
        let snapshot = ledger.snapshot();
        match self.burn_inner(ledger, block, fee_to, recipient) {
            Ok(amounts) => Ok(amounts),
            Err(err) => {
                *self = saved;
                ledger.restore(snapshot);
                Err(err)
            }
        }
    }

    fn burn_inner<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        block: BlockEnv,
        fee_to: Option<Address>,
        recipient: Address,
    ) -> Result<(Amount, Amount)> {
        let (token0, token1) = self.pair.key();
        let balance0 = ledger.balance_of(token0, self.address);
        let balance1 = ledger.balance_of(token1, self.address);
        let shares_in = self.shares.balance_of(self.address);

        let fee_on = self.mint_protocol_fee(fee_to)?;
        // Supply after any protocol fee mint; payouts dilute accordingly.
        let total = self.shares.total();
        let amount0 = balance0
            .mul_div(&shares_in, &total, Rounding::Down)
            .ok_or(DexError::InsufficientLiquidityBurned)?;
        let amount1 = balance1
            .mul_div(&shares_in, &total, Rounding::Down)
            .ok_or(DexError::InsufficientLiquidityBurned)?;
        if amount0.is_zero() || amount1.is_zero() {
            return Err(DexError::InsufficientLiquidityBurned);
        }
        self.shares.burn(self.address, shares_in)?;
        ledger.transfer(token0, self.address, recipient, amount0)?;
        ledger.transfer(token1, self.address, recipient, amount1)?;

        let balance0 = ledger.balance_of(token0, self.address);
        let balance1 = ledger.balance_of(token1, self.address);
        self.update(block, balance0, balance1);
        if fee_on {
            self.k_last = self.reserve0.widen() * self.reserve1.widen();
        }
        debug!(pool = %self.address, %recipient, %amount0, %amount1, "burn");
        Ok((amount0, amount1))
    }

    /// Mints the protocol's cut of fee growth since the last liquidity
    /// event, when a recipient is configured.
    ///
    /// The cut is `total * (sqrt(k) - sqrt(k_last)) / (5 * sqrt(k) +
    /// sqrt(k_last))`, which hands the protocol one sixth of the fee
    /// growth. Returns whether fee collection is active.
    fn mint_protocol_fee(&mut self, fee_to: Option<Address>) -> Result<bool> {
        let Some(fee_to) = fee_to else {
            self.k_last = U256::zero();
            return Ok(false);
        };
        if !self.k_last.is_zero() {
            let root_k = isqrt(self.reserve0.widen() * self.reserve1.widen());
            let root_k_last = isqrt(self.k_last);
            if root_k > root_k_last {
                let numerator = self
                    .shares
                    .total()
                    .widen()
                    .checked_mul(root_k - root_k_last)
                    .ok_or(DexError::Overflow("protocol fee"))?;
                let denominator = root_k
                    .checked_mul(U256::from(5u8))
                    .and_then(|scaled| scaled.checked_add(root_k_last))
                    .ok_or(DexError::Overflow("protocol fee"))?;
                let cut = numerator / denominator;
                // cut < total supply, so it always fits back in u128.
                if !cut.is_zero() {
                    self.shares.mint(fee_to, Amount::new(cut.low_u128()))?;
                }
            }
        }
        Ok(true)
    }

    // -- swaps --------------------------------------------------------------

    /// Pays out up to both requested amounts, optionally invokes a
    /// flash-swap callee, then enforces the fee-adjusted invariant
    /// against measured balances.
    ///
    /// The input is whatever arrived at the pool's address — transferred
    /// in advance, or returned by the callee mid-operation. Each input
    /// side is charged the fee implied by `rate` before the comparison
    /// `adjusted0 * adjusted1 >= reserve0 * reserve1 * 10_000^2`.
    ///
    /// # Errors
    ///
    /// - [`DexError::InsufficientOutputAmount`] if both outputs are zero.
    /// - [`DexError::InsufficientLiquidity`] if an output meets or
    ///   exceeds its reserve.
    /// - [`DexError::InvalidRecipient`] if `recipient` is one of the
    ///   pair's token addresses.
    /// - [`DexError::InsufficientInputAmount`] if no input arrived.
    /// - [`DexError::K`] if the invariant check fails.
    ///
    /// On any error, including one surfaced by the callee, the pool and
    /// ledger are rolled back.
    #[allow(clippy::too_many_arguments)]
    pub fn swap<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        block: BlockEnv,
        rate: SwapRate,
        amount0_out: Amount,
        amount1_out: Amount,
        recipient: Address,
        callee: Option<&mut dyn SwapCallee<L>>,
    ) -> Result<()> {
        let saved = self.clone();
        let snapshot = ledger.snapshot();
        match self.swap_inner(ledger, block, rate, amount0_out, amount1_out, recipient, callee) {
            Ok(()) => Ok(()),
            Err(err) => {
                *self = saved;
                ledger.restore(snapshot);
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn swap_inner<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        block: BlockEnv,
        rate: SwapRate,
        amount0_out: Amount,
        amount1_out: Amount,
        recipient: Address,
        callee: Option<&mut dyn SwapCallee<L>>,
    ) -> Result<()> {
        if amount0_out.is_zero() && amount1_out.is_zero() {
            return Err(DexError::InsufficientOutputAmount);
        }
        if amount0_out >= self.reserve0 || amount1_out >= self.reserve1 {
            return Err(DexError::InsufficientLiquidity);
        }
        let (token0, token1) = self.pair.key();
        if recipient == token0 || recipient == token1 {
            return Err(DexError::InvalidRecipient);
        }

        // Optimistic payout, then the callee gets control with the funds
        // already in hand.
        if !amount0_out.is_zero() {
            ledger.transfer(token0, self.address, recipient, amount0_out)?;
        }
        if !amount1_out.is_zero() {
            ledger.transfer(token1, self.address, recipient, amount1_out)?;
        }
        if let Some(callee) = callee {
            callee.on_swap(ledger, self.address, amount0_out, amount1_out)?;
        }

        let balance0 = ledger.balance_of(token0, self.address);
        let balance1 = ledger.balance_of(token1, self.address);
        let amount0_in = measured_input(balance0, self.reserve0, amount0_out);
        let amount1_in = measured_input(balance1, self.reserve1, amount1_out);
        if amount0_in.is_zero() && amount1_in.is_zero() {
            return Err(DexError::InsufficientInputAmount);
        }

        let dimi = U256::from(DIMI_DENOMINATOR);
        let fee = U256::from(rate.applied_fee_dimi());
        let adjusted0 = balance0
            .widen()
            .checked_mul(dimi)
            .and_then(|scaled| scaled.checked_sub(amount0_in.widen() * fee))
            .ok_or(DexError::Overflow("adjusted balance"))?;
        let adjusted1 = balance1
            .widen()
            .checked_mul(dimi)
            .and_then(|scaled| scaled.checked_sub(amount1_in.widen() * fee))
            .ok_or(DexError::Overflow("adjusted balance"))?;
        let k_scaled = (self.reserve0.widen() * self.reserve1.widen())
            .checked_mul(dimi * dimi)
            .ok_or(DexError::Overflow("invariant"))?;
        let product = adjusted0
            .checked_mul(adjusted1)
            .ok_or(DexError::Overflow("invariant"))?;
        if product < k_scaled {
            return Err(DexError::K);
        }

        self.update(block, balance0, balance1);
        debug!(
            pool = %self.address,
            %recipient,
            %amount0_in,
            %amount1_in,
            %amount0_out,
            %amount1_out,
            "swap"
        );
        Ok(())
    }

    // -- reconciliation -----------------------------------------------------

    /// Adopts the live ledger balances as the new reserves.
    pub fn sync<L: TokenLedger>(&mut self, ledger: &L, block: BlockEnv) {
        let (token0, token1) = self.pair.key();
        let balance0 = ledger.balance_of(token0, self.address);
        let balance1 = ledger.balance_of(token1, self.address);
        self.update(block, balance0, balance1);
    }

    /// Transfers any balance in excess of the cached reserves to
    /// `recipient`, leaving reserves untouched.
    ///
    /// # Errors
    ///
    /// Surfaces ledger transfer errors; on error nothing is moved.
    pub fn skim<L: TokenLedger>(&mut self, ledger: &mut L, recipient: Address) -> Result<()> {
        let snapshot = ledger.snapshot();
        match self.skim_inner(ledger, recipient) {
            Ok(()) => Ok(()),
            Err(err) => {
                ledger.restore(snapshot);
                Err(err)
            }
        }
    }

    fn skim_inner<L: TokenLedger>(&mut self, ledger: &mut L, recipient: Address) -> Result<()> {
        let (token0, token1) = self.pair.key();
        let surplus0 = ledger
            .balance_of(token0, self.address)
            .checked_sub(&self.reserve0)
            .unwrap_or(Amount::ZERO);
        let surplus1 = ledger
            .balance_of(token1, self.address)
            .checked_sub(&self.reserve1)
            .unwrap_or(Amount::ZERO);
        if !surplus0.is_zero() {
            ledger.transfer(token0, self.address, recipient, surplus0)?;
        }
        if !surplus1.is_zero() {
            ledger.transfer(token1, self.address, recipient, surplus1)?;
        }
        Ok(())
    }

    /// Advances the oracle over the reserves that were in force, then
    /// caches the measured balances as the new reserves.
    fn update(&mut self, block: BlockEnv, balance0: Amount, balance1: Amount) {
        self.oracle.accumulate(block, self.reserve0, self.reserve1);
        self.reserve0 = balance0;
        self.reserve1 = balance1;
    }
}

/// Input measured from balances: anything above `reserve - amount_out`.
fn measured_input(balance: Amount, reserve: Amount, amount_out: Amount) -> Amount {
    // amount_out < reserve is checked before payout.
    let floor = reserve.checked_sub(&amount_out).unwrap_or(Amount::ZERO);
    balance.checked_sub(&floor).unwrap_or(Amount::ZERO)
}
