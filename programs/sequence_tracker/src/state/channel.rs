use anchor_lang::prelude::*;

use crate::tracker::SequenceTracker;

/// Replay-protection state for one remote emitter.
/// Created once per channel and never closed.
#[account]
pub struct ChannelSequence {
    /// Which handler consumes this channel
    pub kind: ChannelKind,

    /// Remote chain the sequences originate from
    pub remote_chain_id: u64,

    /// Bitmap window plus head of the overflow chain
    pub tracker: SequenceTracker,

    /// PDA bump seed
    pub bump: u8,
}

impl ChannelSequence {
    pub const SIZE: usize = 1   // kind
        + 8                     // remote_chain_id
        + SequenceTracker::SIZE // tracker
        + 1;                    // bump
}

/// Message handlers that own a sequence channel
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChannelKind {
    /// Governance messages from the governance emitter
    Governance,
    /// Token bridge messages from one remote chain
    TokenBridge,
}

impl ChannelKind {
    /// Get discriminant value for PDA seeds
    pub fn discriminant(&self) -> u8 {
        match self {
            ChannelKind::Governance => 0,
            ChannelKind::TokenBridge => 1,
        }
    }
}
