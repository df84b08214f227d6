//! Stateless routing and orchestration layer.
//!
//! The router owns no reserves and no shares; it holds only its own
//! ledger identity, used to move caller funds under allowance and to
//! stage native-currency wrapping. Every stateful operation takes a
//! `deadline`, resolves the caller's fee rate once through the registry,
//! and executes as one atomic unit: on any error the registry's pools and
//! the token ledger are restored to their state at entry.
//!
//! Multi-hop swaps walk a caller-supplied path, routing each hop's output
//! directly to the next hop's pool, with the final hop paying the
//! recipient. Fee-on-transfer-tolerant variants measure balances instead
//! of trusting the precomputed amount chain.

pub mod library;

use tracing::debug;

use crate::domain::{Address, Amount, BlockEnv, SwapRate};
use crate::error::{DexError, Result};
use crate::ledger::{NativeLedger, TokenLedger};
use crate::registry::Registry;

/// Parameters for [`Router::add_liquidity`].
#[derive(Debug, Clone)]
pub struct AddLiquidity {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: Amount,
    pub amount_b_desired: Amount,
    pub amount_a_min: Amount,
    pub amount_b_min: Amount,
    pub recipient: Address,
    pub deadline: u64,
}

/// Parameters for [`Router::add_liquidity_native`].
#[derive(Debug, Clone)]
pub struct AddLiquidityNative {
    pub token: Address,
    pub amount_token_desired: Amount,
    pub amount_native_desired: Amount,
    pub amount_token_min: Amount,
    pub amount_native_min: Amount,
    pub recipient: Address,
    pub deadline: u64,
}

/// Parameters for [`Router::remove_liquidity`].
#[derive(Debug, Clone)]
pub struct RemoveLiquidity {
    pub token_a: Address,
    pub token_b: Address,
    pub shares: Amount,
    pub amount_a_min: Amount,
    pub amount_b_min: Amount,
    pub recipient: Address,
    pub deadline: u64,
}

/// Parameters for the native-emitting removal variants.
#[derive(Debug, Clone)]
pub struct RemoveLiquidityNative {
    pub token: Address,
    pub shares: Amount,
    pub amount_token_min: Amount,
    pub amount_native_min: Amount,
    pub recipient: Address,
    pub deadline: u64,
}

/// Parameters for the exact-input swap variants.
#[derive(Debug, Clone)]
pub struct SwapExactIn {
    pub path: Vec<Address>,
    pub amount_in: Amount,
    pub amount_out_min: Amount,
    pub recipient: Address,
    pub deadline: u64,
}

/// Parameters for the exact-output swap variants.
#[derive(Debug, Clone)]
pub struct SwapExactOut {
    pub path: Vec<Address>,
    pub amount_out: Amount,
    pub amount_in_max: Amount,
    pub recipient: Address,
    pub deadline: u64,
}

/// Runs `op` against the registry's pools and the ledger as one atomic
/// unit, restoring both on error.
fn atomic<L: TokenLedger, T>(
    registry: &mut Registry,
    ledger: &mut L,
    op: impl FnOnce(&mut Registry, &mut L) -> Result<T>,
) -> Result<T> {
    let registry_snapshot = registry.snapshot();
    let ledger_snapshot = ledger.snapshot();
    match op(registry, ledger) {
        Ok(value) => Ok(value),
        Err(err) => {
            registry.restore(registry_snapshot);
            ledger.restore(ledger_snapshot);
            Err(err)
        }
    }
}

/// The routing layer's identity and operation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Router {
    address: Address,
}

impl Router {
    /// Creates a router operating as `address` on the ledger. Callers
    /// grant this address token and share allowances.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self { address }
    }

    /// The router's ledger identity.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    // -- liquidity ----------------------------------------------------------

    /// Supplies liquidity to the `(token_a, token_b)` pool, creating it
    /// first if absent.
    ///
    /// Deposits the desired amounts for a fresh pool; against live
    /// reserves it scales one side down to the pool ratio. Returns
    /// `(amount_a, amount_b, shares_issued)`.
    ///
    /// # Errors
    ///
    /// [`DexError::Expired`] past the deadline,
    /// [`DexError::InsufficientAAmount`] / [`DexError::InsufficientBAmount`]
    /// when the scaled deposit undercuts a minimum, plus creation, ledger,
    /// and mint errors. Everything is rolled back on error.
    pub fn add_liquidity<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: AddLiquidity,
    ) -> Result<(Amount, Amount, Amount)> {
        block.ensure_deadline(params.deadline)?;
        atomic(registry, ledger, |registry, ledger| {
            let (amount_a, amount_b, pool_address) = prepare_deposit(
                registry,
                caller,
                params.token_a,
                params.token_b,
                params.amount_a_desired,
                params.amount_b_desired,
                params.amount_a_min,
                params.amount_b_min,
            )?;
            ledger.transfer_from(params.token_a, self.address, caller, pool_address, amount_a)?;
            ledger.transfer_from(params.token_b, self.address, caller, pool_address, amount_b)?;
            let fee_to = registry.fee_recipient();
            let pool = registry.pool_by_pair_mut(params.token_a, params.token_b)?;
            let shares = pool.mint(ledger, block, fee_to, params.recipient)?;
            debug!(%caller, %amount_a, %amount_b, %shares, "liquidity added");
            Ok((amount_a, amount_b, shares))
        })
    }

    /// [`add_liquidity`](Router::add_liquidity) against the
    /// `(token, wrapped-native)` pool, wrapping the caller's native
    /// currency on the way in. Returns
    /// `(amount_token, amount_native, shares_issued)`.
    ///
    /// # Errors
    ///
    /// As [`add_liquidity`](Router::add_liquidity), with the token side
    /// mapped to the `A` errors and the native side to `B`.
    pub fn add_liquidity_native<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: AddLiquidityNative,
    ) -> Result<(Amount, Amount, Amount)> {
        block.ensure_deadline(params.deadline)?;
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            let (amount_token, amount_native, pool_address) = prepare_deposit(
                registry,
                caller,
                params.token,
                wrapped,
                params.amount_token_desired,
                params.amount_native_desired,
                params.amount_token_min,
                params.amount_native_min,
            )?;
            ledger.transfer_from(params.token, self.address, caller, pool_address, amount_token)?;
            ledger.native_transfer(caller, self.address, amount_native)?;
            ledger.deposit(self.address, amount_native)?;
            ledger.transfer(wrapped, self.address, pool_address, amount_native)?;
            let fee_to = registry.fee_recipient();
            let pool = registry.pool_by_pair_mut(params.token, wrapped)?;
            let shares = pool.mint(ledger, block, fee_to, params.recipient)?;
            Ok((amount_token, amount_native, shares))
        })
    }

    /// Redeems `shares` from the `(token_a, token_b)` pool and pays both
    /// assets to the recipient. Returns `(amount_a, amount_b)`.
    ///
    /// # Errors
    ///
    /// [`DexError::Expired`], [`DexError::InsufficientAAmount`] /
    /// [`DexError::InsufficientBAmount`] when a payout undercuts its
    /// minimum, plus lookup, allowance, and burn errors.
    pub fn remove_liquidity<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: RemoveLiquidity,
    ) -> Result<(Amount, Amount)> {
        block.ensure_deadline(params.deadline)?;
        atomic(registry, ledger, |registry, ledger| {
            self.remove_liquidity_inner(registry, ledger, block, caller, &params)
        })
    }

    /// [`remove_liquidity`](Router::remove_liquidity) preceded by a
    /// deadline-bound share permit, so no standing allowance is needed.
    ///
    /// # Errors
    ///
    /// As [`remove_liquidity`](Router::remove_liquidity).
    pub fn remove_liquidity_with_permit<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: RemoveLiquidity,
        permit_value: Amount,
    ) -> Result<(Amount, Amount)> {
        block.ensure_deadline(params.deadline)?;
        atomic(registry, ledger, |registry, ledger| {
            let pool = registry.pool_by_pair_mut(params.token_a, params.token_b)?;
            pool.permit_shares(block, caller, self.address, permit_value, params.deadline)?;
            self.remove_liquidity_inner(registry, ledger, block, caller, &params)
        })
    }

    /// Redeems shares from the `(token, wrapped-native)` pool, paying the
    /// token directly and unwrapping the native side. Returns
    /// `(amount_token, amount_native)`.
    ///
    /// # Errors
    ///
    /// As [`remove_liquidity`](Router::remove_liquidity), with the token
    /// side mapped to the `A` errors and the native side to `B`.
    pub fn remove_liquidity_native<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: RemoveLiquidityNative,
    ) -> Result<(Amount, Amount)> {
        block.ensure_deadline(params.deadline)?;
        atomic(registry, ledger, |registry, ledger| {
            self.remove_liquidity_native_inner(registry, ledger, block, caller, &params)
        })
    }

    /// [`remove_liquidity_native`](Router::remove_liquidity_native)
    /// preceded by a deadline-bound share permit.
    ///
    /// # Errors
    ///
    /// As [`remove_liquidity_native`](Router::remove_liquidity_native).
    pub fn remove_liquidity_native_with_permit<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: RemoveLiquidityNative,
        permit_value: Amount,
    ) -> Result<(Amount, Amount)> {
        block.ensure_deadline(params.deadline)?;
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            let pool = registry.pool_by_pair_mut(params.token, wrapped)?;
            pool.permit_shares(block, caller, self.address, permit_value, params.deadline)?;
            self.remove_liquidity_native_inner(registry, ledger, block, caller, &params)
        })
    }

    /// Native-emitting removal tolerant of fee-on-transfer tokens: the
    /// token payout is whatever actually arrived at the router, forwarded
    /// in full. Returns the native amount paid out.
    ///
    /// # Errors
    ///
    /// As [`remove_liquidity_native`](Router::remove_liquidity_native),
    /// with the token minimum checked against the measured balance.
    pub fn remove_liquidity_native_supporting_fee<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: RemoveLiquidityNative,
    ) -> Result<Amount> {
        block.ensure_deadline(params.deadline)?;
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            let before = ledger.balance_of(params.token, self.address);
            let (_, amount_native) = self.burn_to(
                registry,
                ledger,
                block,
                caller,
                params.token,
                wrapped,
                params.shares,
                self.address,
            )?;
            let received = ledger
                .balance_of(params.token, self.address)
                .checked_sub(&before)
                .ok_or(DexError::Overflow("received balance"))?;
            if received < params.amount_token_min {
                return Err(DexError::InsufficientAAmount);
            }
            if amount_native < params.amount_native_min {
                return Err(DexError::InsufficientBAmount);
            }
            ledger.transfer(params.token, self.address, params.recipient, received)?;
            ledger.withdraw(self.address, amount_native)?;
            ledger.native_transfer(self.address, params.recipient, amount_native)?;
            Ok(amount_native)
        })
    }

    // -- swaps --------------------------------------------------------------

    /// Sells an exact input along `path`, enforcing a minimum final
    /// output. Returns the full amount chain.
    ///
    /// # Errors
    ///
    /// [`DexError::Expired`], [`DexError::InvalidPath`],
    /// [`DexError::InsufficientOutputAmount`] when the chain undercuts
    /// the minimum, plus lookup, ledger, and swap errors.
    pub fn swap_exact_tokens_for_tokens<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactIn,
    ) -> Result<Vec<Amount>> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            let amounts = library::get_amounts_out(registry, rate, params.amount_in, &params.path)?;
            if amounts[amounts.len() - 1] < params.amount_out_min {
                return Err(DexError::InsufficientOutputAmount);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.transfer_from(params.path[0], self.address, caller, first_pool, amounts[0])?;
            self.execute_path(
                registry,
                ledger,
                block,
                rate,
                &params.path,
                &amounts,
                params.recipient,
            )?;
            Ok(amounts)
        })
    }

    /// Buys an exact output along `path`, enforcing a maximum input.
    /// Returns the full amount chain.
    ///
    /// # Errors
    ///
    /// As [`swap_exact_tokens_for_tokens`](Router::swap_exact_tokens_for_tokens),
    /// with [`DexError::ExcessiveInputAmount`] when the required input
    /// exceeds the maximum.
    pub fn swap_tokens_for_exact_tokens<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactOut,
    ) -> Result<Vec<Amount>> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            let amounts = library::get_amounts_in(registry, rate, params.amount_out, &params.path)?;
            if amounts[0] > params.amount_in_max {
                return Err(DexError::ExcessiveInputAmount);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.transfer_from(params.path[0], self.address, caller, first_pool, amounts[0])?;
            self.execute_path(
                registry,
                ledger,
                block,
                rate,
                &params.path,
                &amounts,
                params.recipient,
            )?;
            Ok(amounts)
        })
    }

    /// Sells an exact amount of native currency; `path` must start at the
    /// wrapped-native token.
    ///
    /// # Errors
    ///
    /// As [`swap_exact_tokens_for_tokens`](Router::swap_exact_tokens_for_tokens);
    /// [`DexError::InvalidPath`] if the path does not start at the
    /// wrapped token.
    pub fn swap_exact_native_for_tokens<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactIn,
    ) -> Result<Vec<Amount>> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            if params.path.first() != Some(&wrapped) {
                return Err(DexError::InvalidPath);
            }
            let amounts = library::get_amounts_out(registry, rate, params.amount_in, &params.path)?;
            if amounts[amounts.len() - 1] < params.amount_out_min {
                return Err(DexError::InsufficientOutputAmount);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.native_transfer(caller, self.address, amounts[0])?;
            ledger.deposit(self.address, amounts[0])?;
            ledger.transfer(wrapped, self.address, first_pool, amounts[0])?;
            self.execute_path(
                registry,
                ledger,
                block,
                rate,
                &params.path,
                &amounts,
                params.recipient,
            )?;
            Ok(amounts)
        })
    }

    /// Sells tokens for an exact amount of native currency; `path` must
    /// end at the wrapped-native token.
    ///
    /// # Errors
    ///
    /// As [`swap_tokens_for_exact_tokens`](Router::swap_tokens_for_exact_tokens);
    /// [`DexError::InvalidPath`] if the path does not end at the wrapped
    /// token.
    pub fn swap_tokens_for_exact_native<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactOut,
    ) -> Result<Vec<Amount>> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            if params.path.last() != Some(&wrapped) {
                return Err(DexError::InvalidPath);
            }
            let amounts = library::get_amounts_in(registry, rate, params.amount_out, &params.path)?;
            if amounts[0] > params.amount_in_max {
                return Err(DexError::ExcessiveInputAmount);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.transfer_from(params.path[0], self.address, caller, first_pool, amounts[0])?;
            self.execute_path(registry, ledger, block, rate, &params.path, &amounts, self.address)?;
            ledger.withdraw(self.address, params.amount_out)?;
            ledger.native_transfer(self.address, params.recipient, params.amount_out)?;
            Ok(amounts)
        })
    }

    /// Sells an exact token input for native currency; `path` must end at
    /// the wrapped-native token.
    ///
    /// # Errors
    ///
    /// As [`swap_exact_tokens_for_tokens`](Router::swap_exact_tokens_for_tokens);
    /// [`DexError::InvalidPath`] if the path does not end at the wrapped
    /// token.
    pub fn swap_exact_tokens_for_native<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactIn,
    ) -> Result<Vec<Amount>> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            if params.path.last() != Some(&wrapped) {
                return Err(DexError::InvalidPath);
            }
            let amounts = library::get_amounts_out(registry, rate, params.amount_in, &params.path)?;
            let amount_out = amounts[amounts.len() - 1];
            if amount_out < params.amount_out_min {
                return Err(DexError::InsufficientOutputAmount);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.transfer_from(params.path[0], self.address, caller, first_pool, amounts[0])?;
            self.execute_path(registry, ledger, block, rate, &params.path, &amounts, self.address)?;
            ledger.withdraw(self.address, amount_out)?;
            ledger.native_transfer(self.address, params.recipient, amount_out)?;
            Ok(amounts)
        })
    }

    /// Buys an exact token output with native currency; `path` must start
    /// at the wrapped-native token.
    ///
    /// # Errors
    ///
    /// As [`swap_tokens_for_exact_tokens`](Router::swap_tokens_for_exact_tokens);
    /// [`DexError::InvalidPath`] if the path does not start at the
    /// wrapped token.
    pub fn swap_native_for_exact_tokens<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactOut,
    ) -> Result<Vec<Amount>> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            if params.path.first() != Some(&wrapped) {
                return Err(DexError::InvalidPath);
            }
            let amounts = library::get_amounts_in(registry, rate, params.amount_out, &params.path)?;
            if amounts[0] > params.amount_in_max {
                return Err(DexError::ExcessiveInputAmount);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.native_transfer(caller, self.address, amounts[0])?;
            ledger.deposit(self.address, amounts[0])?;
            ledger.transfer(wrapped, self.address, first_pool, amounts[0])?;
            self.execute_path(
                registry,
                ledger,
                block,
                rate,
                &params.path,
                &amounts,
                params.recipient,
            )?;
            Ok(amounts)
        })
    }

    // -- fee-on-transfer-tolerant swaps -------------------------------------

    /// Exact-input swap that tolerates fee-deducting assets: each hop's
    /// input is measured from the pool's balance, and the minimum is
    /// checked against the recipient's measured balance gain. Returns the
    /// measured final output.
    ///
    /// # Errors
    ///
    /// As [`swap_exact_tokens_for_tokens`](Router::swap_exact_tokens_for_tokens).
    pub fn swap_exact_tokens_for_tokens_supporting_fee<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactIn,
    ) -> Result<Amount> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            if params.path.len() < 2 {
                return Err(DexError::InvalidPath);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.transfer_from(
                params.path[0],
                self.address,
                caller,
                first_pool,
                params.amount_in,
            )?;
            let last_token = params.path[params.path.len() - 1];
            let before = ledger.balance_of(last_token, params.recipient);
            self.execute_path_supporting_fee(
                registry,
                ledger,
                block,
                rate,
                &params.path,
                params.recipient,
            )?;
            let received = ledger
                .balance_of(last_token, params.recipient)
                .checked_sub(&before)
                .ok_or(DexError::Overflow("received balance"))?;
            if received < params.amount_out_min {
                return Err(DexError::InsufficientOutputAmount);
            }
            Ok(received)
        })
    }

    /// Native-accepting variant of
    /// [`swap_exact_tokens_for_tokens_supporting_fee`](Router::swap_exact_tokens_for_tokens_supporting_fee).
    ///
    /// # Errors
    ///
    /// As that variant; [`DexError::InvalidPath`] if the path does not
    /// start at the wrapped token.
    pub fn swap_exact_native_for_tokens_supporting_fee<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactIn,
    ) -> Result<Amount> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            if params.path.len() < 2 || params.path[0] != wrapped {
                return Err(DexError::InvalidPath);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.native_transfer(caller, self.address, params.amount_in)?;
            ledger.deposit(self.address, params.amount_in)?;
            ledger.transfer(wrapped, self.address, first_pool, params.amount_in)?;
            let last_token = params.path[params.path.len() - 1];
            let before = ledger.balance_of(last_token, params.recipient);
            self.execute_path_supporting_fee(
                registry,
                ledger,
                block,
                rate,
                &params.path,
                params.recipient,
            )?;
            let received = ledger
                .balance_of(last_token, params.recipient)
                .checked_sub(&before)
                .ok_or(DexError::Overflow("received balance"))?;
            if received < params.amount_out_min {
                return Err(DexError::InsufficientOutputAmount);
            }
            Ok(received)
        })
    }

    /// Native-emitting variant of
    /// [`swap_exact_tokens_for_tokens_supporting_fee`](Router::swap_exact_tokens_for_tokens_supporting_fee).
    ///
    /// # Errors
    ///
    /// As that variant; [`DexError::InvalidPath`] if the path does not
    /// end at the wrapped token.
    pub fn swap_exact_tokens_for_native_supporting_fee<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: SwapExactIn,
    ) -> Result<Amount> {
        block.ensure_deadline(params.deadline)?;
        let rate = registry.swap_rate_dimi(caller);
        atomic(registry, ledger, |registry, ledger| {
            let wrapped = ledger.wrapped_token();
            if params.path.len() < 2 || params.path[params.path.len() - 1] != wrapped {
                return Err(DexError::InvalidPath);
            }
            let first_pool = registry
                .pool_by_pair(params.path[0], params.path[1])?
                .address();
            ledger.transfer_from(
                params.path[0],
                self.address,
                caller,
                first_pool,
                params.amount_in,
            )?;
            let before = ledger.balance_of(wrapped, self.address);
            self.execute_path_supporting_fee(
                registry,
                ledger,
                block,
                rate,
                &params.path,
                self.address,
            )?;
            let received = ledger
                .balance_of(wrapped, self.address)
                .checked_sub(&before)
                .ok_or(DexError::Overflow("received balance"))?;
            if received < params.amount_out_min {
                return Err(DexError::InsufficientOutputAmount);
            }
            ledger.withdraw(self.address, received)?;
            ledger.native_transfer(self.address, params.recipient, received)?;
            Ok(received)
        })
    }

    // -- internals ----------------------------------------------------------

    fn remove_liquidity_inner<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: &RemoveLiquidity,
    ) -> Result<(Amount, Amount)> {
        let (amount_a, amount_b) = self.burn_to(
            registry,
            ledger,
            block,
            caller,
            params.token_a,
            params.token_b,
            params.shares,
            params.recipient,
        )?;
        if amount_a < params.amount_a_min {
            return Err(DexError::InsufficientAAmount);
        }
        if amount_b < params.amount_b_min {
            return Err(DexError::InsufficientBAmount);
        }
        debug!(%caller, %amount_a, %amount_b, "liquidity removed");
        Ok((amount_a, amount_b))
    }

    fn remove_liquidity_native_inner<L: NativeLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        params: &RemoveLiquidityNative,
    ) -> Result<(Amount, Amount)> {
        let wrapped = ledger.wrapped_token();
        let (amount_token, amount_native) = self.burn_to(
            registry,
            ledger,
            block,
            caller,
            params.token,
            wrapped,
            params.shares,
            self.address,
        )?;
        if amount_token < params.amount_token_min {
            return Err(DexError::InsufficientAAmount);
        }
        if amount_native < params.amount_native_min {
            return Err(DexError::InsufficientBAmount);
        }
        ledger.transfer(params.token, self.address, params.recipient, amount_token)?;
        ledger.withdraw(self.address, amount_native)?;
        ledger.native_transfer(self.address, params.recipient, amount_native)?;
        Ok((amount_token, amount_native))
    }

    /// Moves `shares` from the caller into the pool and burns them to
    /// `recipient`, returning payouts oriented as `(token_a, token_b)`.
    #[allow(clippy::too_many_arguments)]
    fn burn_to<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        caller: Address,
        token_a: Address,
        token_b: Address,
        shares: Amount,
        recipient: Address,
    ) -> Result<(Amount, Amount)> {
        let fee_to = registry.fee_recipient();
        let pool = registry.pool_by_pair_mut(token_a, token_b)?;
        let pool_address = pool.address();
        pool.transfer_shares_from(self.address, caller, pool_address, shares)?;
        let (amount0, amount1) = pool.burn(ledger, block, fee_to, recipient)?;
        if pool.pair().is_token0(token_a) {
            Ok((amount0, amount1))
        } else {
            Ok((amount1, amount0))
        }
    }

    /// Walks `path`, swapping each precomputed hop amount, routing
    /// intermediate outputs to the next pool and the last to `recipient`.
    #[allow(clippy::too_many_arguments)]
    fn execute_path<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        rate: SwapRate,
        path: &[Address],
        amounts: &[Amount],
        recipient: Address,
    ) -> Result<()> {
        for index in 0..path.len() - 1 {
            let input = path[index];
            let output = path[index + 1];
            let to = if index < path.len() - 2 {
                registry.pool_by_pair(output, path[index + 2])?.address()
            } else {
                recipient
            };
            let amount_out = amounts[index + 1];
            let pool = registry.pool_by_pair_mut(input, output)?;
            let (amount0_out, amount1_out) = if pool.pair().is_token0(output) {
                (amount_out, Amount::ZERO)
            } else {
                (Amount::ZERO, amount_out)
            };
            pool.swap(ledger, block, rate, amount0_out, amount1_out, to, None)?;
        }
        Ok(())
    }

    /// As [`execute_path`](Router::execute_path), but derives each hop's
    /// input from the pool's measured balance, so upstream transfer fees
    /// shrink later hops instead of breaking them.
    fn execute_path_supporting_fee<L: TokenLedger>(
        &self,
        registry: &mut Registry,
        ledger: &mut L,
        block: BlockEnv,
        rate: SwapRate,
        path: &[Address],
        recipient: Address,
    ) -> Result<()> {
        for index in 0..path.len() - 1 {
            let input = path[index];
            let output = path[index + 1];
            let to = if index < path.len() - 2 {
                registry.pool_by_pair(output, path[index + 2])?.address()
            } else {
                recipient
            };
            let pool = registry.pool_by_pair(input, output)?;
            let pool_address = pool.address();
            let (reserve_in, reserve_out) = library::oriented_reserves(pool, input);
            let amount_in = ledger
                .balance_of(input, pool_address)
                .checked_sub(&reserve_in)
                .ok_or(DexError::InsufficientInputAmount)?;
            let amount_out = library::get_amount_out(amount_in, reserve_in, reserve_out, rate)?;
            let pool = registry.pool_by_pair_mut(input, output)?;
            let (amount0_out, amount1_out) = if pool.pair().is_token0(output) {
                (amount_out, Amount::ZERO)
            } else {
                (Amount::ZERO, amount_out)
            };
            pool.swap(ledger, block, rate, amount0_out, amount1_out, to, None)?;
        }
        Ok(())
    }
}

/// Ensures the pool exists (creating it if policy allows) and scales the
/// desired deposit to the live reserve ratio.
#[allow(clippy::too_many_arguments)]
fn prepare_deposit(
    registry: &mut Registry,
    caller: Address,
    token_a: Address,
    token_b: Address,
    amount_a_desired: Amount,
    amount_b_desired: Amount,
    amount_a_min: Amount,
    amount_b_min: Amount,
) -> Result<(Amount, Amount, Address)> {
    if registry.pool_by_pair(token_a, token_b).is_err() {
        registry.create_pool(caller, token_a, token_b)?;
    }
    let pool = registry.pool_by_pair(token_a, token_b)?;
    let pool_address = pool.address();
    let (reserve_a, reserve_b) = library::oriented_reserves(pool, token_a);
    if reserve_a.is_zero() && reserve_b.is_zero() {
        return Ok((amount_a_desired, amount_b_desired, pool_address));
    }
    let amount_b_optimal = library::quote(amount_a_desired, reserve_a, reserve_b)?;
    if amount_b_optimal <= amount_b_desired {
        if amount_b_optimal < amount_b_min {
            return Err(DexError::InsufficientBAmount);
        }
        Ok((amount_a_desired, amount_b_optimal, pool_address))
    } else {
        let amount_a_optimal = library::quote(amount_b_desired, reserve_b, reserve_a)?;
        if amount_a_optimal > amount_a_desired || amount_a_optimal < amount_a_min {
            return Err(DexError::InsufficientAAmount);
        }
        Ok((amount_a_optimal, amount_b_desired, pool_address))
    }
}
