//! Application Configuration
//!
//! Configuration for the unlock ledger application layer.

use std::time::Duration;

/// Unlock ledger configuration
#[derive(Debug, Clone)]
pub struct UnlockConfig {
    /// Number of groups in a plaintext code
    pub code_group_count: usize,
    /// Characters per group
    pub code_group_len: usize,
    /// Validity window of a freshly minted code
    pub code_ttl: Duration,
    /// Retry budget for digest collisions during minting
    pub max_mint_attempts: u32,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            code_group_count: 2,
            code_group_len: 4,
            code_ttl: Duration::from_secs(7 * 24 * 3600),
            max_mint_attempts: 10,
        }
    }
}

impl UnlockConfig {
    pub fn code_ttl_ms(&self) -> i64 {
        self.code_ttl.as_millis() as i64
    }
}
