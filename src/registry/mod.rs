//! Pool registry: canonical pair index, deterministic addressing, and
//! creation policy.
//!
//! The registry owns every pool. It maps each unordered token pair to at
//! most one pool, keeps an append-only list of created pools, and derives
//! pool addresses as a pure function of the registry identity, the sorted
//! pair, and a fixed pool template hash — so any party can compute a
//! not-yet-created pool's address in advance.
//!
//! Policy fields (creation switch, token and pair disallow sets, fee
//! recipients, the valuator binding) are guarded by a single fee
//! administrator.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::{Address, SwapRate, TokenPair};
use crate::error::{DexError, Result};
use crate::pool::Pool;
use crate::valuator::SwapValuator;

/// Domain tag prefixed to every pool address derivation.
const ADDRESS_DOMAIN: &[u8] = b"basin-dex/pool-address/v1";

/// Identifier of the pool implementation the registry instantiates.
/// Changing the pool template changes every derived address.
const POOL_TEMPLATE: &[u8] = b"basin-dex/pool/v1";

/// Derives the canonical pool address for `pair` under `registry`.
fn derive_pool_address(registry: Address, pair: TokenPair, template_hash: &[u8; 32]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(ADDRESS_DOMAIN);
    hasher.update(registry.as_bytes());
    hasher.update(pair.token0().as_bytes());
    hasher.update(pair.token1().as_bytes());
    hasher.update(template_hash);
    Address::from_bytes(hasher.finalize().into())
}

/// Administrator-controlled creation policy.
///
/// A pair is creatable when global creation is allowed (the administrator
/// bypasses the global switch, and only that switch), neither token is
/// disallowed, and the specific pair is not disallowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationPolicy {
    pub creation_disallowed: bool,
    pub disallowed_tokens: BTreeSet<Address>,
    /// Sorted `(token0, token1)` keys.
    pub disallowed_pairs: BTreeSet<(Address, Address)>,
}

impl CreationPolicy {
    fn allows(&self, pair: TokenPair) -> bool {
        !self.creation_disallowed
            && !self.disallowed_tokens.contains(&pair.token0())
            && !self.disallowed_tokens.contains(&pair.token1())
            && !self.disallowed_pairs.contains(&pair.key())
    }
}

/// Saved pool state for router-level rollback. Policy fields never change
/// inside a router operation, so only the pool side is captured.
pub(crate) struct RegistrySnapshot {
    pools: BTreeMap<Address, Pool>,
    pair_index: BTreeMap<(Address, Address), Address>,
    all_pools: Vec<Address>,
}

/// The pool factory and index.
#[derive(Debug)]
pub struct Registry {
    address: Address,
    template_hash: [u8; 32],
    pools: BTreeMap<Address, Pool>,
    pair_index: BTreeMap<(Address, Address), Address>,
    all_pools: Vec<Address>,
    policy: CreationPolicy,
    fee_administrator: Address,
    /// Protocol fee recipient; zero disables fee collection.
    fee_recipient: Address,
    /// Secondary recipient consumed by external emission tooling.
    minting_fee_recipient: Address,
    /// Opaque to the core; consumed by external migration tooling.
    migration_authority: Address,
    valuator: Option<Box<dyn SwapValuator>>,
}

impl Registry {
    /// Creates a registry identified by `address` and administered by
    /// `fee_administrator`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::ZeroAddress`] for a zero administrator.
    pub fn new(address: Address, fee_administrator: Address) -> Result<Self> {
        if fee_administrator.is_zero() {
            return Err(DexError::ZeroAddress);
        }
        let template_hash = Sha256::digest(POOL_TEMPLATE).into();
        Ok(Self {
            address,
            template_hash,
            pools: BTreeMap::new(),
            pair_index: BTreeMap::new(),
            all_pools: Vec::new(),
            policy: CreationPolicy::default(),
            fee_administrator,
            fee_recipient: Address::zero(),
            minting_fee_recipient: Address::zero(),
            migration_authority: Address::zero(),
            valuator: None,
        })
    }

    // -- accessors ----------------------------------------------------------

    /// The registry's own identity, an input to address derivation.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The current fee administrator.
    #[must_use]
    pub const fn fee_administrator(&self) -> Address {
        self.fee_administrator
    }

    /// The protocol fee recipient, or `None` while collection is off.
    #[must_use]
    pub fn fee_recipient(&self) -> Option<Address> {
        if self.fee_recipient.is_zero() {
            None
        } else {
            Some(self.fee_recipient)
        }
    }

    /// The secondary minting-fee recipient.
    #[must_use]
    pub const fn minting_fee_recipient(&self) -> Address {
        self.minting_fee_recipient
    }

    /// The migration authority.
    #[must_use]
    pub const fn migration_authority(&self) -> Address {
        self.migration_authority
    }

    /// The current creation policy.
    #[must_use]
    pub const fn policy(&self) -> &CreationPolicy {
        &self.policy
    }

    /// Number of pools ever created.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.all_pools.len()
    }

    /// The pool at creation-order `index`.
    #[must_use]
    pub fn pool_at(&self, index: usize) -> Option<&Pool> {
        self.all_pools
            .get(index)
            .and_then(|address| self.pools.get(address))
    }

    /// The pool at `address`, if any.
    #[must_use]
    pub fn pool(&self, address: Address) -> Option<&Pool> {
        self.pools.get(&address)
    }

    /// Mutable access to the pool at `address`.
    pub fn pool_mut(&mut self, address: Address) -> Option<&mut Pool> {
        self.pools.get_mut(&address)
    }

    /// The pool trading `(token_a, token_b)` in either order.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolNotFound`] (or the pair validation errors).
    pub fn pool_by_pair(&self, token_a: Address, token_b: Address) -> Result<&Pool> {
        let pair = TokenPair::new(token_a, token_b)?;
        let address = self
            .pair_index
            .get(&pair.key())
            .ok_or(DexError::PoolNotFound)?;
        self.pools.get(address).ok_or(DexError::PoolNotFound)
    }

    /// Mutable access to the pool trading `(token_a, token_b)`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolNotFound`] (or the pair validation errors).
    pub fn pool_by_pair_mut(&mut self, token_a: Address, token_b: Address) -> Result<&mut Pool> {
        let pair = TokenPair::new(token_a, token_b)?;
        let address = *self
            .pair_index
            .get(&pair.key())
            .ok_or(DexError::PoolNotFound)?;
        self.pools.get_mut(&address).ok_or(DexError::PoolNotFound)
    }

    // -- addressing & policy queries ----------------------------------------

    /// Computes the address `create_pool` would assign to this pair,
    /// whether or not the pool exists yet.
    ///
    /// # Errors
    ///
    /// Returns the pair validation errors.
    pub fn pool_address_for(&self, token_a: Address, token_b: Address) -> Result<Address> {
        let pair = TokenPair::new(token_a, token_b)?;
        Ok(derive_pool_address(self.address, pair, &self.template_hash))
    }

    /// Whether policy currently permits creating a pool for this pair,
    /// for a non-administrator caller.
    #[must_use]
    pub fn allowed(&self, token_a: Address, token_b: Address) -> bool {
        match TokenPair::new(token_a, token_b) {
            Ok(pair) => self.policy.allows(pair),
            Err(_) => false,
        }
    }

    /// The swap rate for `caller`: the bound valuator's answer, or the
    /// fixed default when none is bound.
    #[must_use]
    pub fn swap_rate_dimi(&self, caller: Address) -> SwapRate {
        match &self.valuator {
            Some(valuator) => valuator.swap_rate_dimi(caller),
            None => SwapRate::DEFAULT,
        }
    }

    // -- creation -----------------------------------------------------------

    /// Creates the canonical pool for `(token_a, token_b)`.
    ///
    /// # Errors
    ///
    /// - [`DexError::IdenticalAssets`] / [`DexError::ZeroAddress`] from
    ///   pair validation.
    /// - [`DexError::PairExists`] if either ordering was created before.
    /// - [`DexError::CreationDisallowed`] if the global switch is set and
    ///   `caller` is not the administrator.
    /// - [`DexError::TokenDisallowed`] / [`DexError::PairDisallowed`] per
    ///   policy, administrator included.
    pub fn create_pool(
        &mut self,
        caller: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address> {
        let pair = TokenPair::new(token_a, token_b)?;
        if self.pair_index.contains_key(&pair.key()) {
            return Err(DexError::PairExists);
        }
        if self.policy.creation_disallowed && caller != self.fee_administrator {
            return Err(DexError::CreationDisallowed);
        }
        if self.policy.disallowed_tokens.contains(&pair.token0())
            || self.policy.disallowed_tokens.contains(&pair.token1())
        {
            return Err(DexError::TokenDisallowed);
        }
        if self.policy.disallowed_pairs.contains(&pair.key()) {
            return Err(DexError::PairDisallowed);
        }

        let address = derive_pool_address(self.address, pair, &self.template_hash);
        self.pools.insert(address, Pool::new(address, pair));
        self.pair_index.insert(pair.key(), address);
        self.all_pools.push(address);
        info!(
            pool = %address,
            token0 = %pair.token0(),
            token1 = %pair.token1(),
            index = self.all_pools.len() - 1,
            "pool created"
        );
        Ok(address)
    }

    // -- administration -----------------------------------------------------

    fn ensure_administrator(&self, caller: Address) -> Result<()> {
        if caller != self.fee_administrator {
            return Err(DexError::Forbidden);
        }
        Ok(())
    }

    /// Sets the protocol fee recipient; zero disables collection.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Forbidden`] for non-administrators.
    pub fn set_fee_recipient(&mut self, caller: Address, recipient: Address) -> Result<()> {
        self.ensure_administrator(caller)?;
        self.fee_recipient = recipient;
        Ok(())
    }

    /// Rotates the fee administrator.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Forbidden`] for non-administrators, and
    /// [`DexError::ZeroAddress`] for a zero successor (an irrecoverable
    /// lockout).
    pub fn set_fee_administrator(&mut self, caller: Address, successor: Address) -> Result<()> {
        self.ensure_administrator(caller)?;
        if successor.is_zero() {
            return Err(DexError::ZeroAddress);
        }
        self.fee_administrator = successor;
        Ok(())
    }

    /// Sets the secondary minting-fee recipient.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Forbidden`] for non-administrators.
    pub fn set_minting_fee_recipient(&mut self, caller: Address, recipient: Address) -> Result<()> {
        self.ensure_administrator(caller)?;
        self.minting_fee_recipient = recipient;
        Ok(())
    }

    /// Sets the migration authority.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Forbidden`] for non-administrators.
    pub fn set_migration_authority(&mut self, caller: Address, authority: Address) -> Result<()> {
        self.ensure_administrator(caller)?;
        self.migration_authority = authority;
        Ok(())
    }

    /// Binds (or unbinds, with `None`) the swap valuator.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Forbidden`] for non-administrators, and
    /// [`DexError::InvalidValuator`] when the candidate does not assert
    /// the capability marker.
    pub fn set_swap_valuator(
        &mut self,
        caller: Address,
        valuator: Option<Box<dyn SwapValuator>>,
    ) -> Result<()> {
        self.ensure_administrator(caller)?;
        if let Some(candidate) = &valuator {
            if !candidate.is_swap_valuator() {
                return Err(DexError::InvalidValuator);
            }
        }
        self.valuator = valuator;
        Ok(())
    }

    /// Flips the global creation switch.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Forbidden`] for non-administrators.
    pub fn set_creation_disallowed(&mut self, caller: Address, disallowed: bool) -> Result<()> {
        self.ensure_administrator(caller)?;
        self.policy.creation_disallowed = disallowed;
        Ok(())
    }

    /// Adds or removes `token` from the disallow set.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Forbidden`] for non-administrators.
    pub fn set_token_disallowed(
        &mut self,
        caller: Address,
        token: Address,
        disallowed: bool,
    ) -> Result<()> {
        self.ensure_administrator(caller)?;
        if disallowed {
            self.policy.disallowed_tokens.insert(token);
        } else {
            self.policy.disallowed_tokens.remove(&token);
        }
        Ok(())
    }

    /// Adds or removes the unordered pair from the disallow set.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Forbidden`] for non-administrators, and the
    /// pair validation errors.
    pub fn set_pair_disallowed(
        &mut self,
        caller: Address,
        token_a: Address,
        token_b: Address,
        disallowed: bool,
    ) -> Result<()> {
        self.ensure_administrator(caller)?;
        let pair = TokenPair::new(token_a, token_b)?;
        if disallowed {
            self.policy.disallowed_pairs.insert(pair.key());
        } else {
            self.policy.disallowed_pairs.remove(&pair.key());
        }
        Ok(())
    }

    // -- rollback support ---------------------------------------------------

    pub(crate) fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            pools: self.pools.clone(),
            pair_index: self.pair_index.clone(),
            all_pools: self.all_pools.clone(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: RegistrySnapshot) {
        self.pools = snapshot.pools;
        self.pair_index = snapshot.pair_index;
        self.all_pools = snapshot.all_pools;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::valuator::FixedValuator;

    const ADMIN: u8 = 0xAD;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn registry() -> Registry {
        let Ok(registry) = Registry::new(addr(0xFA), addr(ADMIN)) else {
            panic!("expected valid registry");
        };
        registry
    }

    // -- creation & addressing ----------------------------------------------

    #[test]
    fn create_is_order_insensitive() {
        let mut registry = registry();
        let Ok(pool) = registry.create_pool(addr(1), addr(10), addr(11)) else {
            panic!("expected Ok");
        };
        assert_eq!(
            registry.create_pool(addr(1), addr(11), addr(10)),
            Err(DexError::PairExists)
        );
        assert_eq!(
            registry.create_pool(addr(1), addr(10), addr(11)),
            Err(DexError::PairExists)
        );
        let Ok(by_ab) = registry.pool_by_pair(addr(10), addr(11)) else {
            panic!("expected Ok");
        };
        assert_eq!(by_ab.address(), pool);
        let Ok(by_ba) = registry.pool_by_pair(addr(11), addr(10)) else {
            panic!("expected Ok");
        };
        assert_eq!(by_ba.address(), pool);
        assert_eq!(registry.pool_count(), 1);
    }

    #[test]
    fn address_is_precomputable() {
        let mut registry = registry();
        let Ok(predicted) = registry.pool_address_for(addr(11), addr(10)) else {
            panic!("expected Ok");
        };
        let Ok(created) = registry.create_pool(addr(1), addr(10), addr(11)) else {
            panic!("expected Ok");
        };
        assert_eq!(predicted, created);
    }

    #[test]
    fn addresses_differ_per_pair_and_registry() {
        let mut registry = registry();
        let Ok(first) = registry.create_pool(addr(1), addr(10), addr(11)) else {
            panic!("expected Ok");
        };
        let Ok(second) = registry.create_pool(addr(1), addr(10), addr(12)) else {
            panic!("expected Ok");
        };
        assert_ne!(first, second);

        let Ok(other) = Registry::new(addr(0xFB), addr(ADMIN)) else {
            panic!("expected Ok");
        };
        let Ok(elsewhere) = other.pool_address_for(addr(10), addr(11)) else {
            panic!("expected Ok");
        };
        assert_ne!(first, elsewhere);
    }

    #[test]
    fn create_rejects_invalid_pairs() {
        let mut registry = registry();
        assert_eq!(
            registry.create_pool(addr(1), addr(10), addr(10)),
            Err(DexError::IdenticalAssets)
        );
        assert_eq!(
            registry.create_pool(addr(1), addr(10), Address::zero()),
            Err(DexError::ZeroAddress)
        );
    }

    #[test]
    fn pool_list_is_index_addressable() {
        let mut registry = registry();
        let Ok(first) = registry.create_pool(addr(1), addr(10), addr(11)) else {
            panic!("expected Ok");
        };
        let Ok(second) = registry.create_pool(addr(1), addr(12), addr(13)) else {
            panic!("expected Ok");
        };
        let Some(at0) = registry.pool_at(0) else {
            panic!("expected pool at 0");
        };
        assert_eq!(at0.address(), first);
        let Some(at1) = registry.pool_at(1) else {
            panic!("expected pool at 1");
        };
        assert_eq!(at1.address(), second);
        assert!(registry.pool_at(2).is_none());
    }

    // -- creation policy ----------------------------------------------------

    #[test]
    fn global_switch_blocks_everyone_but_the_administrator() {
        let mut registry = registry();
        let Ok(()) = registry.set_creation_disallowed(addr(ADMIN), true) else {
            panic!("expected Ok");
        };
        assert_eq!(
            registry.create_pool(addr(1), addr(10), addr(11)),
            Err(DexError::CreationDisallowed)
        );
        assert!(!registry.allowed(addr(10), addr(11)));
        let Ok(_) = registry.create_pool(addr(ADMIN), addr(10), addr(11)) else {
            panic!("expected administrator bypass");
        };
    }

    #[test]
    fn token_disallow_blocks_exactly_that_token() {
        let mut registry = registry();
        let Ok(()) = registry.set_token_disallowed(addr(ADMIN), addr(10), true) else {
            panic!("expected Ok");
        };
        assert_eq!(
            registry.create_pool(addr(1), addr(10), addr(11)),
            Err(DexError::TokenDisallowed)
        );
        // The administrator does not bypass token policy.
        assert_eq!(
            registry.create_pool(addr(ADMIN), addr(10), addr(11)),
            Err(DexError::TokenDisallowed)
        );
        let Ok(_) = registry.create_pool(addr(1), addr(11), addr(12)) else {
            panic!("expected unrelated pair to pass");
        };

        let Ok(()) = registry.set_token_disallowed(addr(ADMIN), addr(10), false) else {
            panic!("expected Ok");
        };
        let Ok(_) = registry.create_pool(addr(1), addr(10), addr(11)) else {
            panic!("expected reversal to take effect");
        };
    }

    #[test]
    fn pair_disallow_blocks_exactly_that_pair() {
        let mut registry = registry();
        let Ok(()) = registry.set_pair_disallowed(addr(ADMIN), addr(11), addr(10), true) else {
            panic!("expected Ok");
        };
        // Both orderings are the same policy entry.
        assert_eq!(
            registry.create_pool(addr(1), addr(10), addr(11)),
            Err(DexError::PairDisallowed)
        );
        assert!(!registry.allowed(addr(10), addr(11)));
        let Ok(_) = registry.create_pool(addr(1), addr(10), addr(12)) else {
            panic!("expected unrelated pair to pass");
        };

        let Ok(()) = registry.set_pair_disallowed(addr(ADMIN), addr(10), addr(11), false) else {
            panic!("expected Ok");
        };
        let Ok(_) = registry.create_pool(addr(1), addr(10), addr(11)) else {
            panic!("expected reversal to take effect");
        };
    }

    #[test]
    fn existing_pair_reported_before_policy() {
        let mut registry = registry();
        let Ok(_) = registry.create_pool(addr(1), addr(10), addr(11)) else {
            panic!("expected Ok");
        };
        let Ok(()) = registry.set_creation_disallowed(addr(ADMIN), true) else {
            panic!("expected Ok");
        };
        assert_eq!(
            registry.create_pool(addr(1), addr(10), addr(11)),
            Err(DexError::PairExists)
        );
    }

    // -- administration -----------------------------------------------------

    #[test]
    fn setters_require_the_administrator() {
        let mut registry = registry();
        let outsider = addr(1);
        assert_eq!(
            registry.set_fee_recipient(outsider, addr(2)),
            Err(DexError::Forbidden)
        );
        assert_eq!(
            registry.set_fee_administrator(outsider, addr(2)),
            Err(DexError::Forbidden)
        );
        assert_eq!(
            registry.set_minting_fee_recipient(outsider, addr(2)),
            Err(DexError::Forbidden)
        );
        assert_eq!(
            registry.set_migration_authority(outsider, addr(2)),
            Err(DexError::Forbidden)
        );
        assert_eq!(
            registry.set_swap_valuator(outsider, None),
            Err(DexError::Forbidden)
        );
        assert_eq!(
            registry.set_creation_disallowed(outsider, true),
            Err(DexError::Forbidden)
        );
        assert_eq!(
            registry.set_token_disallowed(outsider, addr(3), true),
            Err(DexError::Forbidden)
        );
        assert_eq!(
            registry.set_pair_disallowed(outsider, addr(3), addr(4), true),
            Err(DexError::Forbidden)
        );
    }

    #[test]
    fn administrator_rotation() {
        let mut registry = registry();
        assert_eq!(
            registry.set_fee_administrator(addr(ADMIN), Address::zero()),
            Err(DexError::ZeroAddress)
        );
        let Ok(()) = registry.set_fee_administrator(addr(ADMIN), addr(2)) else {
            panic!("expected Ok");
        };
        assert_eq!(registry.fee_administrator(), addr(2));
        // The old administrator has no authority left.
        assert_eq!(
            registry.set_fee_recipient(addr(ADMIN), addr(3)),
            Err(DexError::Forbidden)
        );
        let Ok(()) = registry.set_fee_recipient(addr(2), addr(3)) else {
            panic!("expected Ok");
        };
    }

    #[test]
    fn fee_recipient_zero_means_off() {
        let mut registry = registry();
        assert_eq!(registry.fee_recipient(), None);
        let Ok(()) = registry.set_fee_recipient(addr(ADMIN), addr(7)) else {
            panic!("expected Ok");
        };
        assert_eq!(registry.fee_recipient(), Some(addr(7)));
        let Ok(()) = registry.set_fee_recipient(addr(ADMIN), Address::zero()) else {
            panic!("expected Ok");
        };
        assert_eq!(registry.fee_recipient(), None);
    }

    // -- valuator binding ---------------------------------------------------

    #[derive(Debug)]
    struct Impostor;

    impl SwapValuator for Impostor {
        fn swap_rate_dimi(&self, _caller: Address) -> SwapRate {
            SwapRate::DEFAULT
        }

        fn is_swap_valuator(&self) -> bool {
            false
        }
    }

    #[test]
    fn valuator_binding_and_default() {
        let mut registry = registry();
        assert_eq!(registry.swap_rate_dimi(addr(1)), SwapRate::DEFAULT);

        let Ok(rate) = SwapRate::new(9_990) else {
            panic!("expected Ok");
        };
        let Ok(()) = registry
            .set_swap_valuator(addr(ADMIN), Some(Box::new(FixedValuator::new(rate))))
        else {
            panic!("expected Ok");
        };
        assert_eq!(registry.swap_rate_dimi(addr(1)), rate);

        let Ok(()) = registry.set_swap_valuator(addr(ADMIN), None) else {
            panic!("expected Ok");
        };
        assert_eq!(registry.swap_rate_dimi(addr(1)), SwapRate::DEFAULT);
    }

    #[test]
    fn impostor_valuator_rejected() {
        let mut registry = registry();
        assert_eq!(
            registry.set_swap_valuator(addr(ADMIN), Some(Box::new(Impostor))),
            Err(DexError::InvalidValuator)
        );
        assert_eq!(registry.swap_rate_dimi(addr(1)), SwapRate::DEFAULT);
    }
}
