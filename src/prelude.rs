//! Convenience re-exports for common types and traits.
//!
//! The prelude provides a single import to bring all commonly used items
//! into scope:
//!
//! ```rust
//! use basin_dex::prelude::*;
//! ```

// Domain value types
pub use crate::domain::{Address, Amount, BlockEnv, Rounding, SwapRate, TokenPair};

// Ledger seams and the in-memory reference implementation
pub use crate::ledger::{MemoryLedger, NativeLedger, SwapCallee, TokenLedger};

// Registry and pool engine
pub use crate::pool::{Pool, MINIMUM_LIQUIDITY};
pub use crate::registry::{CreationPolicy, Registry};

// Routing layer
pub use crate::router::{
    AddLiquidity, AddLiquidityNative, RemoveLiquidity, RemoveLiquidityNative, Router, SwapExactIn,
    SwapExactOut,
};

// Fee policy
pub use crate::valuator::{FixedValuator, SwapValuator};

// Error types
pub use crate::error::{DexError, Result};
