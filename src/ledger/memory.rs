//! In-memory reference ledger.

use std::collections::BTreeMap;

use tracing::trace;

use super::{NativeLedger, TokenLedger};
use crate::domain::{Address, Amount, Rounding};
use crate::error::{DexError, Result};

/// A complete in-memory fungible-token ledger.
///
/// Backs the test suites and self-contained embeddings. Supports every
/// behavior the core has to tolerate from a real ledger:
///
/// - per-token transfer fees (dimi deducted from the credited side and
///   burned), for exercising the fee-on-transfer paths;
/// - native currency accounting with a wrapped token
///   (deposit/withdraw at par);
/// - allowances with [`Amount::MAX`] treated as unlimited.
///
/// Snapshot/restore clones the whole state; the maps involved are small
/// in any realistic embedding of this ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryLedger {
    /// (token, account) -> balance.
    balances: BTreeMap<(Address, Address), Amount>,
    /// (token, owner, spender) -> remaining allowance.
    allowances: BTreeMap<(Address, Address, Address), Amount>,
    /// token -> fee deducted on every credit, in dimi.
    transfer_fee_dimi: BTreeMap<Address, u32>,
    /// account -> native balance.
    native: BTreeMap<Address, Amount>,
    /// Identifier of the wrapped native token.
    wrapped: Address,
}

impl MemoryLedger {
    /// Creates an empty ledger whose wrapped-native token is `wrapped`.
    #[must_use]
    pub fn new(wrapped: Address) -> Self {
        Self {
            wrapped,
            ..Self::default()
        }
    }

    /// Credits `account` with `amount` of `token` out of thin air.
    ///
    /// Test/bootstrap helper; bypasses transfer fees.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Overflow`] if the balance would overflow.
    pub fn mint(&mut self, token: Address, account: Address, amount: Amount) -> Result<()> {
        let entry = self.balances.entry((token, account)).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(&amount)
            .ok_or(DexError::Overflow("mint balance overflow"))?;
        Ok(())
    }

    /// Credits `account` with native currency.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Overflow`] if the balance would overflow.
    pub fn mint_native(&mut self, account: Address, amount: Amount) -> Result<()> {
        let entry = self.native.entry(account).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(&amount)
            .ok_or(DexError::Overflow("native mint overflow"))?;
        Ok(())
    }

    /// Configures `token` to deduct `fee_dimi` parts per ten thousand on
    /// every credit. The deducted portion is burned.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidRate`] if `fee_dimi >= 10_000`.
    pub fn set_transfer_fee(&mut self, token: Address, fee_dimi: u32) -> Result<()> {
        if fee_dimi >= 10_000 {
            return Err(DexError::InvalidRate);
        }
        if fee_dimi == 0 {
            self.transfer_fee_dimi.remove(&token);
        } else {
            self.transfer_fee_dimi.insert(token, fee_dimi);
        }
        Ok(())
    }

    fn debit(&mut self, token: Address, account: Address, amount: Amount) -> Result<()> {
        let entry = self.balances.entry((token, account)).or_insert(Amount::ZERO);
        *entry = entry
            .checked_sub(&amount)
            .ok_or(DexError::InsufficientBalance)?;
        Ok(())
    }

    fn credit(&mut self, token: Address, account: Address, amount: Amount) -> Result<()> {
        let fee = match self.transfer_fee_dimi.get(&token) {
            Some(&dimi) => amount
                .mul_div(
                    &Amount::new(u128::from(dimi)),
                    &Amount::new(10_000),
                    Rounding::Down,
                )
                .ok_or(DexError::Overflow("transfer fee"))?,
            None => Amount::ZERO,
        };
        let credited = amount
            .checked_sub(&fee)
            .ok_or(DexError::Overflow("transfer fee exceeds amount"))?;
        let entry = self.balances.entry((token, account)).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(&credited)
            .ok_or(DexError::Overflow("credit balance overflow"))?;
        Ok(())
    }
}

impl TokenLedger for MemoryLedger {
    type Snapshot = MemoryLedger;

    fn snapshot(&self) -> Self::Snapshot {
        self.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }

    fn balance_of(&self, token: Address, account: Address) -> Amount {
        self.balances
            .get(&(token, account))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.debit(token, from, amount)?;
        self.credit(token, to, amount)?;
        trace!(%token, %from, %to, %amount, "transfer");
        Ok(())
    }

    fn approve(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<()> {
        if spender.is_zero() {
            return Err(DexError::ZeroAddress);
        }
        self.allowances.insert((token, owner, spender), amount);
        Ok(())
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if spender != from {
            let current = self.allowance(token, from, spender);
            if current != Amount::MAX {
                let remaining = current
                    .checked_sub(&amount)
                    .ok_or(DexError::InsufficientAllowance)?;
                self.allowances.insert((token, from, spender), remaining);
            }
        }
        self.transfer(token, from, to, amount)
    }
}

impl NativeLedger for MemoryLedger {
    fn wrapped_token(&self) -> Address {
        self.wrapped
    }

    fn native_balance_of(&self, account: Address) -> Amount {
        self.native.get(&account).copied().unwrap_or(Amount::ZERO)
    }

    fn native_transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let from_entry = self.native.entry(from).or_insert(Amount::ZERO);
        *from_entry = from_entry
            .checked_sub(&amount)
            .ok_or(DexError::InsufficientNativeBalance)?;
        let to_entry = self.native.entry(to).or_insert(Amount::ZERO);
        *to_entry = to_entry
            .checked_add(&amount)
            .ok_or(DexError::Overflow("native balance overflow"))?;
        Ok(())
    }

    fn deposit(&mut self, account: Address, amount: Amount) -> Result<()> {
        let entry = self.native.entry(account).or_insert(Amount::ZERO);
        *entry = entry
            .checked_sub(&amount)
            .ok_or(DexError::InsufficientNativeBalance)?;
        // Wrapped credits never charge a transfer fee.
        let wrapped = self.wrapped;
        let balance = self.balances.entry((wrapped, account)).or_insert(Amount::ZERO);
        *balance = balance
            .checked_add(&amount)
            .ok_or(DexError::Overflow("wrapped balance overflow"))?;
        Ok(())
    }

    fn withdraw(&mut self, account: Address, amount: Amount) -> Result<()> {
        let wrapped = self.wrapped;
        self.debit(wrapped, account, amount)?;
        let entry = self.native.entry(account).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(&amount)
            .ok_or(DexError::Overflow("native balance overflow"))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn wrapped() -> Address {
        addr(0xEE)
    }

    fn ledger_with(token: Address, account: Address, amount: u128) -> MemoryLedger {
        let mut ledger = MemoryLedger::new(wrapped());
        let Ok(()) = ledger.mint(token, account, Amount::new(amount)) else {
            panic!("expected Ok");
        };
        ledger
    }

    // -- transfers ----------------------------------------------------------

    #[test]
    fn transfer_moves_balance() {
        let (token, alice, bob) = (addr(1), addr(10), addr(11));
        let mut ledger = ledger_with(token, alice, 1_000);
        let Ok(()) = ledger.transfer(token, alice, bob, Amount::new(400)) else {
            panic!("expected Ok");
        };
        assert_eq!(ledger.balance_of(token, alice), Amount::new(600));
        assert_eq!(ledger.balance_of(token, bob), Amount::new(400));
    }

    #[test]
    fn transfer_insufficient_balance() {
        let (token, alice, bob) = (addr(1), addr(10), addr(11));
        let mut ledger = ledger_with(token, alice, 100);
        assert_eq!(
            ledger.transfer(token, alice, bob, Amount::new(101)),
            Err(DexError::InsufficientBalance)
        );
    }

    #[test]
    fn transfer_fee_deducted_from_credit() {
        let (token, alice, bob) = (addr(1), addr(10), addr(11));
        let mut ledger = ledger_with(token, alice, 10_000);
        let Ok(()) = ledger.set_transfer_fee(token, 100) else {
            panic!("expected Ok");
        };
        // 1% fee: sender debited 1_000, receiver credited 990.
        let Ok(()) = ledger.transfer(token, alice, bob, Amount::new(1_000)) else {
            panic!("expected Ok");
        };
        assert_eq!(ledger.balance_of(token, alice), Amount::new(9_000));
        assert_eq!(ledger.balance_of(token, bob), Amount::new(990));
    }

    #[test]
    fn transfer_fee_rejects_full_confiscation() {
        let mut ledger = MemoryLedger::new(wrapped());
        assert_eq!(
            ledger.set_transfer_fee(addr(1), 10_000),
            Err(DexError::InvalidRate)
        );
    }

    // -- allowances ---------------------------------------------------------

    #[test]
    fn transfer_from_consumes_allowance() {
        let (token, alice, router, pool) = (addr(1), addr(10), addr(20), addr(30));
        let mut ledger = ledger_with(token, alice, 1_000);
        let Ok(()) = ledger.approve(token, alice, router, Amount::new(500)) else {
            panic!("expected Ok");
        };
        let Ok(()) = ledger.transfer_from(token, router, alice, pool, Amount::new(300)) else {
            panic!("expected Ok");
        };
        assert_eq!(ledger.allowance(token, alice, router), Amount::new(200));
        assert_eq!(ledger.balance_of(token, pool), Amount::new(300));
    }

    #[test]
    fn transfer_from_over_allowance() {
        let (token, alice, router, pool) = (addr(1), addr(10), addr(20), addr(30));
        let mut ledger = ledger_with(token, alice, 1_000);
        let Ok(()) = ledger.approve(token, alice, router, Amount::new(100)) else {
            panic!("expected Ok");
        };
        assert_eq!(
            ledger.transfer_from(token, router, alice, pool, Amount::new(101)),
            Err(DexError::InsufficientAllowance)
        );
    }

    #[test]
    fn max_allowance_is_unlimited() {
        let (token, alice, router, pool) = (addr(1), addr(10), addr(20), addr(30));
        let mut ledger = ledger_with(token, alice, 1_000);
        let Ok(()) = ledger.approve(token, alice, router, Amount::MAX) else {
            panic!("expected Ok");
        };
        let Ok(()) = ledger.transfer_from(token, router, alice, pool, Amount::new(600)) else {
            panic!("expected Ok");
        };
        assert_eq!(ledger.allowance(token, alice, router), Amount::MAX);
    }

    #[test]
    fn owner_spends_without_allowance() {
        let (token, alice, pool) = (addr(1), addr(10), addr(30));
        let mut ledger = ledger_with(token, alice, 1_000);
        let Ok(()) = ledger.transfer_from(token, alice, alice, pool, Amount::new(600)) else {
            panic!("expected Ok");
        };
        assert_eq!(ledger.balance_of(token, pool), Amount::new(600));
    }

    #[test]
    fn approve_zero_spender_rejected() {
        let mut ledger = MemoryLedger::new(wrapped());
        assert_eq!(
            ledger.approve(addr(1), addr(10), Address::zero(), Amount::new(1)),
            Err(DexError::ZeroAddress)
        );
    }

    // -- native wrapping ----------------------------------------------------

    #[test]
    fn deposit_and_withdraw_round_trip() {
        let alice = addr(10);
        let mut ledger = MemoryLedger::new(wrapped());
        let Ok(()) = ledger.mint_native(alice, Amount::new(1_000)) else {
            panic!("expected Ok");
        };
        let Ok(()) = ledger.deposit(alice, Amount::new(700)) else {
            panic!("expected Ok");
        };
        assert_eq!(ledger.native_balance_of(alice), Amount::new(300));
        assert_eq!(ledger.balance_of(wrapped(), alice), Amount::new(700));

        let Ok(()) = ledger.withdraw(alice, Amount::new(700)) else {
            panic!("expected Ok");
        };
        assert_eq!(ledger.native_balance_of(alice), Amount::new(1_000));
        assert_eq!(ledger.balance_of(wrapped(), alice), Amount::ZERO);
    }

    #[test]
    fn deposit_insufficient_native() {
        let alice = addr(10);
        let mut ledger = MemoryLedger::new(wrapped());
        assert_eq!(
            ledger.deposit(alice, Amount::new(1)),
            Err(DexError::InsufficientNativeBalance)
        );
    }

    #[test]
    fn native_transfer_moves_value() {
        let (alice, bob) = (addr(10), addr(11));
        let mut ledger = MemoryLedger::new(wrapped());
        let Ok(()) = ledger.mint_native(alice, Amount::new(500)) else {
            panic!("expected Ok");
        };
        let Ok(()) = ledger.native_transfer(alice, bob, Amount::new(200)) else {
            panic!("expected Ok");
        };
        assert_eq!(ledger.native_balance_of(alice), Amount::new(300));
        assert_eq!(ledger.native_balance_of(bob), Amount::new(200));
    }

    // -- snapshot / restore -------------------------------------------------

    #[test]
    fn snapshot_restore_discards_changes() {
        let (token, alice, bob) = (addr(1), addr(10), addr(11));
        let mut ledger = ledger_with(token, alice, 1_000);
        let snapshot = ledger.snapshot();
        let Ok(()) = ledger.transfer(token, alice, bob, Amount::new(999)) else {
            panic!("expected Ok");
        };
        ledger.restore(snapshot);
        assert_eq!(ledger.balance_of(token, alice), Amount::new(1_000));
        assert_eq!(ledger.balance_of(token, bob), Amount::ZERO);
    }
}
