//! Stateless swap arithmetic.
//!
//! Pure functions over reserve values and a fee rate, reusable by any
//! caller against any pool state. Rounding always favors the pool: output
//! quotients truncate, required inputs round up.

use primitive_types::U256;

use crate::domain::{Address, Amount, Rounding, SwapRate, DIMI_DENOMINATOR};
use crate::error::{DexError, Result};
use crate::pool::Pool;
use crate::registry::Registry;

/// Linear-proportion conversion ignoring fees:
/// `amount_b = amount_a * reserve_b / reserve_a`.
///
/// # Errors
///
/// Returns [`DexError::InsufficientAmount`] for a zero input and
/// [`DexError::InsufficientLiquidity`] for a zero reserve.
pub fn quote(amount_a: Amount, reserve_a: Amount, reserve_b: Amount) -> Result<Amount> {
    if amount_a.is_zero() {
        return Err(DexError::InsufficientAmount);
    }
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return Err(DexError::InsufficientLiquidity);
    }
    amount_a
        .mul_div(&reserve_b, &reserve_a, Rounding::Down)
        .ok_or(DexError::Overflow("quote"))
}

/// Maximum output for a given input under the constant-product formula,
/// with the fee charged on the input side.
///
/// # Errors
///
/// Returns [`DexError::InsufficientInputAmount`] for a zero input,
/// [`DexError::InsufficientLiquidity`] for a zero reserve, and
/// [`DexError::Overflow`] if an intermediate exceeds 256 bits.
pub fn get_amount_out(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
    rate: SwapRate,
) -> Result<Amount> {
    if amount_in.is_zero() {
        return Err(DexError::InsufficientInputAmount);
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(DexError::InsufficientLiquidity);
    }
    let retained = U256::from(rate.applied_retained_dimi());
    let amount_in_with_fee = amount_in.widen() * retained;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out.widen())
        .ok_or(DexError::Overflow("amount out numerator"))?;
    let denominator = reserve_in.widen() * U256::from(DIMI_DENOMINATOR) + amount_in_with_fee;
    // The quotient is strictly below reserve_out, so it fits in u128.
    Ok(Amount::new((numerator / denominator).low_u128()))
}

/// Minimum input required for a given output; the inverse of
/// [`get_amount_out`], rounded up.
///
/// # Errors
///
/// Returns [`DexError::InsufficientOutputAmount`] for a zero output,
/// [`DexError::InsufficientLiquidity`] if a reserve is zero or the output
/// meets the output-side reserve, and [`DexError::Overflow`] if the
/// result exceeds `u128`.
pub fn get_amount_in(
    amount_out: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
    rate: SwapRate,
) -> Result<Amount> {
    if amount_out.is_zero() {
        return Err(DexError::InsufficientOutputAmount);
    }
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_out >= reserve_out {
        return Err(DexError::InsufficientLiquidity);
    }
    let numerator = (reserve_in.widen() * amount_out.widen())
        .checked_mul(U256::from(DIMI_DENOMINATOR))
        .ok_or(DexError::Overflow("amount in numerator"))?;
    let remaining = reserve_out
        .checked_sub(&amount_out)
        .ok_or(DexError::InsufficientLiquidity)?;
    let denominator = remaining.widen() * U256::from(rate.applied_retained_dimi());
    let quotient = numerator / denominator + U256::one();
    if quotient > U256::from(u128::MAX) {
        return Err(DexError::Overflow("amount in"));
    }
    Ok(Amount::new(quotient.as_u128()))
}

/// The reserves of `pool` oriented as `(reserve_in, reserve_out)` for a
/// swap selling `token_in`.
pub(crate) fn oriented_reserves(pool: &Pool, token_in: Address) -> (Amount, Amount) {
    let (reserve0, reserve1) = pool.reserves();
    if pool.pair().is_token0(token_in) {
        (reserve0, reserve1)
    } else {
        (reserve1, reserve0)
    }
}

/// Chains [`get_amount_out`] along `path`, returning one amount per path
/// element (`amounts[0] == amount_in`).
///
/// # Errors
///
/// Returns [`DexError::InvalidPath`] for fewer than two elements,
/// [`DexError::PoolNotFound`] for a missing hop, and the single-hop
/// errors.
pub fn get_amounts_out(
    registry: &Registry,
    rate: SwapRate,
    amount_in: Amount,
    path: &[Address],
) -> Result<Vec<Amount>> {
    if path.len() < 2 {
        return Err(DexError::InvalidPath);
    }
    let mut amounts = Vec::with_capacity(path.len());
    amounts.push(amount_in);
    for hop in path.windows(2) {
        let pool = registry.pool_by_pair(hop[0], hop[1])?;
        let (reserve_in, reserve_out) = oriented_reserves(pool, hop[0]);
        let last = amounts[amounts.len() - 1];
        amounts.push(get_amount_out(last, reserve_in, reserve_out, rate)?);
    }
    Ok(amounts)
}

/// Chains [`get_amount_in`] backwards along `path`, returning one amount
/// per path element (`amounts[last] == amount_out`).
///
/// # Errors
///
/// As [`get_amounts_out`], keyed to the output amount.
pub fn get_amounts_in(
    registry: &Registry,
    rate: SwapRate,
    amount_out: Amount,
    path: &[Address],
) -> Result<Vec<Amount>> {
    if path.len() < 2 {
        return Err(DexError::InvalidPath);
    }
    let mut amounts = vec![Amount::ZERO; path.len()];
    amounts[path.len() - 1] = amount_out;
    for index in (0..path.len() - 1).rev() {
        let pool = registry.pool_by_pair(path[index], path[index + 1])?;
        let (reserve_in, reserve_out) = oriented_reserves(pool, path[index]);
        amounts[index] = get_amount_in(amounts[index + 1], reserve_in, reserve_out, rate)?;
    }
    Ok(amounts)
}
