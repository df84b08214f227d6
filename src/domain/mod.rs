//! Fundamental domain value types used throughout the exchange core.
//!
//! This module contains the core value types that model the exchange:
//! addresses, raw amounts, swap rates, token pairs, and the host block
//! context. All types use newtypes with validated constructors to enforce
//! invariants.

mod address;
mod amount;
mod block;
mod pair;
mod rounding;
mod swap_rate;

pub use address::Address;
pub use amount::Amount;
pub use block::BlockEnv;
pub use pair::TokenPair;
pub use rounding::Rounding;
pub use swap_rate::{SwapRate, DIMI_DENOMINATOR};
