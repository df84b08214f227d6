//! Host block context threaded into state-changing operations.

use serde::{Deserialize, Serialize};

use crate::error::{DexError, Result};

/// The host's block context as of the current atomic unit.
///
/// Every state-changing operation receives a `BlockEnv`: the timestamp
/// drives deadline enforcement and the price accumulators, the height is
/// recorded for oracle consumers. The core never reads a wall clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct BlockEnv {
    /// Block height.
    pub height: u64,
    /// Block timestamp in seconds.
    pub timestamp: u64,
}

impl BlockEnv {
    /// Creates a new block context.
    #[must_use]
    pub const fn new(height: u64, timestamp: u64) -> Self {
        Self { height, timestamp }
    }

    /// Fails with [`DexError::Expired`] if this block is past `deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Expired`] when `timestamp > deadline`.
    pub const fn ensure_deadline(&self, deadline: u64) -> Result<()> {
        if self.timestamp > deadline {
            return Err(DexError::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_fields() {
        let block = BlockEnv::new(7, 1_000);
        assert_eq!(block.height, 7);
        assert_eq!(block.timestamp, 1_000);
    }

    #[test]
    fn deadline_in_future_ok() {
        let block = BlockEnv::new(1, 100);
        assert_eq!(block.ensure_deadline(100), Ok(()));
        assert_eq!(block.ensure_deadline(101), Ok(()));
    }

    #[test]
    fn deadline_in_past_expired() {
        let block = BlockEnv::new(1, 100);
        assert_eq!(block.ensure_deadline(99), Err(DexError::Expired));
    }
}
