//! Pool-share accounting.
//!
//! Pool shares are themselves a fungible, transferable asset, but they
//! live on the pool rather than on the external token ledger: each pool
//! embeds one `ShareLedger` holding supply, balances, and allowances.

use std::collections::BTreeMap;

use crate::domain::{Address, Amount, BlockEnv};
use crate::error::{DexError, Result};

/// Balances, allowances, and total supply of one pool's shares.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShareLedger {
    total: Amount,
    balances: BTreeMap<Address, Amount>,
    /// (owner, spender) -> remaining allowance.
    allowances: BTreeMap<(Address, Address), Amount>,
}

impl ShareLedger {
    /// Returns the outstanding share supply.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.total
    }

    /// Returns `account`'s share balance.
    #[must_use]
    pub fn balance_of(&self, account: Address) -> Amount {
        self.balances.get(&account).copied().unwrap_or(Amount::ZERO)
    }

    /// Returns the remaining allowance of `spender` over `owner`'s shares.
    #[must_use]
    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Issues `amount` new shares to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Overflow`] if supply or balance would overflow.
    pub fn mint(&mut self, to: Address, amount: Amount) -> Result<()> {
        self.total = self
            .total
            .checked_add(&amount)
            .ok_or(DexError::Overflow("share supply overflow"))?;
        let entry = self.balances.entry(to).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(&amount)
            .ok_or(DexError::Overflow("share balance overflow"))?;
        Ok(())
    }

    /// Destroys `amount` shares held by `from`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientBalance`] if `from` holds less.
    pub fn burn(&mut self, from: Address, amount: Amount) -> Result<()> {
        let entry = self.balances.entry(from).or_insert(Amount::ZERO);
        *entry = entry
            .checked_sub(&amount)
            .ok_or(DexError::InsufficientBalance)?;
        self.total = self
            .total
            .checked_sub(&amount)
            .ok_or(DexError::Overflow("share supply underflow"))?;
        Ok(())
    }

    /// Moves shares on the owner's authority.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientBalance`].
    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let entry = self.balances.entry(from).or_insert(Amount::ZERO);
        *entry = entry
            .checked_sub(&amount)
            .ok_or(DexError::InsufficientBalance)?;
        let entry = self.balances.entry(to).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(&amount)
            .ok_or(DexError::Overflow("share balance overflow"))?;
        Ok(())
    }

    /// Grants `spender` the right to move up to `amount` of `owner`'s
    /// shares. [`Amount::MAX`] is unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::ZeroAddress`] for a zero spender.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<()> {
        if spender.is_zero() {
            return Err(DexError::ZeroAddress);
        }
        self.allowances.insert((owner, spender), amount);
        Ok(())
    }

    /// Moves shares on `spender`'s authority, consuming allowance unless
    /// `spender == from`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientAllowance`] or
    /// [`DexError::InsufficientBalance`].
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if spender != from {
            let current = self.allowance(from, spender);
            if current != Amount::MAX {
                let remaining = current
                    .checked_sub(&amount)
                    .ok_or(DexError::InsufficientAllowance)?;
                self.allowances.insert((from, spender), remaining);
            }
        }
        self.transfer(from, to, amount)
    }

    /// Applies a pre-authorized allowance grant with a deadline, backing
    /// the router's permit flow.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Expired`] past the deadline, otherwise the
    /// errors of [`approve`](Self::approve).
    pub fn permit(
        &mut self,
        block: BlockEnv,
        owner: Address,
        spender: Address,
        amount: Amount,
        deadline: u64,
    ) -> Result<()> {
        block.ensure_deadline(deadline)?;
        self.approve(owner, spender, amount)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    #[test]
    fn mint_and_burn_track_supply() {
        let mut shares = ShareLedger::default();
        let Ok(()) = shares.mint(addr(1), Amount::new(1_000)) else {
            panic!("expected Ok");
        };
        assert_eq!(shares.total(), Amount::new(1_000));
        assert_eq!(shares.balance_of(addr(1)), Amount::new(1_000));

        let Ok(()) = shares.burn(addr(1), Amount::new(400)) else {
            panic!("expected Ok");
        };
        assert_eq!(shares.total(), Amount::new(600));
        assert_eq!(shares.balance_of(addr(1)), Amount::new(600));
    }

    #[test]
    fn burn_more_than_held_rejected() {
        let mut shares = ShareLedger::default();
        let Ok(()) = shares.mint(addr(1), Amount::new(10)) else {
            panic!("expected Ok");
        };
        assert_eq!(
            shares.burn(addr(1), Amount::new(11)),
            Err(DexError::InsufficientBalance)
        );
    }

    #[test]
    fn transfer_between_accounts() {
        let mut shares = ShareLedger::default();
        let Ok(()) = shares.mint(addr(1), Amount::new(100)) else {
            panic!("expected Ok");
        };
        let Ok(()) = shares.transfer(addr(1), addr(2), Amount::new(30)) else {
            panic!("expected Ok");
        };
        assert_eq!(shares.balance_of(addr(1)), Amount::new(70));
        assert_eq!(shares.balance_of(addr(2)), Amount::new(30));
        assert_eq!(shares.total(), Amount::new(100));
    }

    #[test]
    fn transfer_from_requires_allowance() {
        let mut shares = ShareLedger::default();
        let Ok(()) = shares.mint(addr(1), Amount::new(100)) else {
            panic!("expected Ok");
        };
        assert_eq!(
            shares.transfer_from(addr(9), addr(1), addr(2), Amount::new(10)),
            Err(DexError::InsufficientAllowance)
        );
        let Ok(()) = shares.approve(addr(1), addr(9), Amount::new(50)) else {
            panic!("expected Ok");
        };
        let Ok(()) = shares.transfer_from(addr(9), addr(1), addr(2), Amount::new(10)) else {
            panic!("expected Ok");
        };
        assert_eq!(shares.allowance(addr(1), addr(9)), Amount::new(40));
    }

    #[test]
    fn permit_respects_deadline() {
        let mut shares = ShareLedger::default();
        let block = BlockEnv::new(1, 100);
        assert_eq!(
            shares.permit(block, addr(1), addr(9), Amount::new(5), 99),
            Err(DexError::Expired)
        );
        let Ok(()) = shares.permit(block, addr(1), addr(9), Amount::new(5), 100) else {
            panic!("expected Ok");
        };
        assert_eq!(shares.allowance(addr(1), addr(9)), Amount::new(5));
    }
}
