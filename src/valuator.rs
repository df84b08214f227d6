//! Pluggable per-caller swap fee policy.
//!
//! The registry optionally binds a [`SwapValuator`]; when none is bound,
//! every caller gets [`SwapRate::DEFAULT`]. A valuator lets an operator
//! grant preferential rates per caller (market makers, partner routers)
//! without touching pool code: the rate is resolved once per operation and
//! passed into the invariant check.

use core::fmt;

use crate::domain::{Address, SwapRate};

/// A pluggable policy returning the effective swap rate for a caller.
///
/// Implementations must be pure queries: the registry consults the
/// valuator on every swap and expects a stable answer within one atomic
/// unit.
pub trait SwapValuator: fmt::Debug {
    /// Returns the retained-dimi rate to apply for `caller`.
    fn swap_rate_dimi(&self, caller: Address) -> SwapRate;

    /// Capability marker checked when a valuator is bound to the
    /// registry, guarding against binding an arbitrary object that
    /// happens to satisfy the trait shape.
    fn is_swap_valuator(&self) -> bool;
}

/// The trivial valuator: one fixed rate for every caller.
///
/// This is also the behavior of a registry with no valuator bound, with
/// the rate pinned to [`SwapRate::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedValuator(SwapRate);

impl FixedValuator {
    /// Creates a valuator answering `rate` for every caller.
    #[must_use]
    pub const fn new(rate: SwapRate) -> Self {
        Self(rate)
    }

    /// Returns the fixed rate.
    #[must_use]
    pub const fn rate(&self) -> SwapRate {
        self.0
    }
}

impl Default for FixedValuator {
    fn default() -> Self {
        Self(SwapRate::DEFAULT)
    }
}

impl SwapValuator for FixedValuator {
    fn swap_rate_dimi(&self, _caller: Address) -> SwapRate {
        self.0
    }

    fn is_swap_valuator(&self) -> bool {
        true
    }
}
