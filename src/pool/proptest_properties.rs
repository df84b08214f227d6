//! Property-based tests using `proptest` for pool invariant validation.
//!
//! Covers the economic properties that must hold for all reserve shapes:
//!
//! 1. **Invariant preservation** — the reserve product never decreases
//!    across a swap; the charged fee makes it grow.
//! 2. **Swap reversibility** — buying back the output of an exact-in
//!    swap never requires less input than was originally sold.
//! 3. **Liquidity conservation** — a proportional deposit followed by a
//!    full redemption returns approximately the deposited amounts.
//! 4. **Fee dominance** — the fee-charged output never exceeds the
//!    fee-free output for the same trade.

#![allow(clippy::panic)]

use proptest::prelude::*;

use super::Pool;
use crate::domain::{Address, Amount, BlockEnv, SwapRate, TokenPair};
use crate::ledger::MemoryLedger;
use crate::router::library;

const PROVIDER: u8 = 0x10;
const TRADER: u8 = 0x20;

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 32])
}

fn block() -> BlockEnv {
    BlockEnv::new(1, 1_000)
}

/// A pool seeded with `(reserve0, reserve1)` plus the provider's shares.
fn seeded(reserve0: u128, reserve1: u128) -> (Pool, MemoryLedger, Amount) {
    let Ok(pair) = TokenPair::new(addr(1), addr(2)) else {
        panic!("valid pair");
    };
    let mut pool = Pool::new(addr(0xA0), pair);
    let mut ledger = MemoryLedger::new(addr(0xEE));
    let Ok(()) = ledger.mint(addr(1), pool.address(), Amount::new(reserve0)) else {
        panic!("mint token0");
    };
    let Ok(()) = ledger.mint(addr(2), pool.address(), Amount::new(reserve1)) else {
        panic!("mint token1");
    };
    let Ok(shares) = pool.mint(&mut ledger, block(), None, addr(PROVIDER)) else {
        panic!("seed mint");
    };
    (pool, ledger, shares)
}

/// Reserve values large enough to clear the locked minimum but far from
/// `u128` saturation.
fn reserve_strategy() -> impl Strategy<Value = u128> {
    100_000u128..=1_000_000_000_000u128
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_swap_never_decreases_reserve_product(
        reserve0 in reserve_strategy(),
        reserve1 in reserve_strategy(),
    ) {
        let swap_in = (reserve0 / 1_000).max(1);
        let (mut pool, mut ledger, _) = seeded(reserve0, reserve1);

        let (r0, r1) = pool.reserves();
        let k_before = r0.widen() * r1.widen();

        let Ok(out) = library::get_amount_out(
            Amount::new(swap_in),
            r0,
            r1,
            SwapRate::DEFAULT,
        ) else {
            return Ok(());
        };
        if out.is_zero() {
            return Ok(());
        }
        let Ok(()) = ledger.mint(addr(1), pool.address(), Amount::new(swap_in)) else {
            return Ok(());
        };
        let Ok(()) = pool.swap(
            &mut ledger,
            block(),
            SwapRate::DEFAULT,
            Amount::ZERO,
            out,
            addr(TRADER),
            None,
        ) else {
            panic!("quoted swap must pass the invariant check");
        };

        let (r0, r1) = pool.reserves();
        let k_after = r0.widen() * r1.widen();
        prop_assert!(
            k_after >= k_before,
            "reserve product shrank: before={k_before} after={k_after}"
        );
    }

    #[test]
    fn prop_round_trip_requires_no_less_input(
        reserve_in in reserve_strategy(),
        reserve_out in reserve_strategy(),
    ) {
        let swap_in = (reserve_in / 1_000).max(1);
        let Ok(out) = library::get_amount_out(
            Amount::new(swap_in),
            Amount::new(reserve_in),
            Amount::new(reserve_out),
            SwapRate::DEFAULT,
        ) else {
            return Ok(());
        };
        if out.is_zero() {
            return Ok(());
        }
        let Ok(back) = library::get_amount_in(
            out,
            Amount::new(reserve_in),
            Amount::new(reserve_out),
            SwapRate::DEFAULT,
        ) else {
            return Ok(());
        };
        prop_assert!(
            back <= Amount::new(swap_in),
            "buying {out} back cost {back}, less than the {swap_in} sold"
        );
    }

    #[test]
    fn prop_deposit_then_redeem_conserves_value(
        reserve0 in reserve_strategy(),
        reserve1 in reserve_strategy(),
    ) {
        let (mut pool, mut ledger, _) = seeded(reserve0, reserve1);
        let add0 = reserve0 / 10;
        let add1 = reserve1 / 10;

        let Ok(()) = ledger.mint(addr(1), pool.address(), Amount::new(add0)) else {
            return Ok(());
        };
        let Ok(()) = ledger.mint(addr(2), pool.address(), Amount::new(add1)) else {
            return Ok(());
        };
        let Ok(minted) = pool.mint(&mut ledger, block(), None, addr(TRADER)) else {
            return Ok(());
        };
        prop_assert!(!minted.is_zero(), "proportional deposit must mint shares");

        let Ok(()) = pool.transfer_shares(addr(TRADER), pool.address(), minted) else {
            return Ok(());
        };
        let Ok((out0, out1)) = pool.burn(&mut ledger, block(), None, addr(TRADER)) else {
            return Ok(());
        };

        // Rounding always favors the pool, never the redeemer.
        prop_assert!(out0.get() <= add0);
        prop_assert!(out1.get() <= add1);
        let tolerance0 = add0 / 100 + 2;
        let tolerance1 = add1 / 100 + 2;
        prop_assert!(
            add0 - out0.get() <= tolerance0,
            "token0 redemption lost too much: in={add0} out={out0}"
        );
        prop_assert!(
            add1 - out1.get() <= tolerance1,
            "token1 redemption lost too much: in={add1} out={out1}"
        );
    }

    #[test]
    fn prop_charged_output_never_exceeds_fee_free(
        reserve_in in reserve_strategy(),
        reserve_out in reserve_strategy(),
    ) {
        let swap_in = (reserve_in / 1_000).max(1);
        let Ok(charged) = library::get_amount_out(
            Amount::new(swap_in),
            Amount::new(reserve_in),
            Amount::new(reserve_out),
            SwapRate::DEFAULT,
        ) else {
            return Ok(());
        };
        let Ok(free) = library::get_amount_out(
            Amount::new(swap_in),
            Amount::new(reserve_in),
            Amount::new(reserve_out),
            SwapRate::FEE_FREE,
        ) else {
            return Ok(());
        };
        prop_assert!(
            charged <= free,
            "charged output {charged} exceeds fee-free output {free}"
        );
    }
}
