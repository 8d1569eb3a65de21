use anchor_lang::prelude::*;

use crate::tracker::TrackerConfig;

/// Main gateway account storing configuration and state
#[account]
pub struct Gateway {
    /// Admin authority that can modify gateway settings
    pub authority: Pubkey,

    /// Signer allowed to consume sequences (governance / token bridge handler)
    pub consumer: Pubkey,

    /// Chain identifier for this gateway instance
    pub chain_id: u64,

    /// System enable flag for emergency stops
    pub system_enabled: bool,

    /// Window advances allowed per consume
    pub max_advance_steps: u16,

    /// PDA bump seed
    pub bump: u8,
}

impl Gateway {
    pub const SIZE: usize = 32  // authority
        + 32                    // consumer
        + 8                     // chain_id
        + 1                     // system_enabled
        + 2                     // max_advance_steps
        + 1;                    // bump

    pub fn tracker_config(&self) -> Result<TrackerConfig> {
        TrackerConfig::new(self.max_advance_steps)
    }
}
