// Copyright (c) 2025 SERAC LABS <info@serac.network>

use serde::{Deserialize, Serialize};

/// staker ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakersConfig {
    /// Number of staking periods of notice a primary-network validator must
    /// give before a stop can take effect.
    ///
    /// The exact notice period is not a settled protocol invariant yet, so
    /// it is carried in the configuration rather than hard-coded.
    pub stop_notice_periods: u64,
}

impl Default for StakersConfig {
    fn default() -> Self {
        Self {
            stop_notice_periods: 1,
        }
    }
}
