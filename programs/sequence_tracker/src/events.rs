use anchor_lang::prelude::*;

use crate::state::ChannelKind;

/// Event emitted when a sequence is consumed
#[event]
pub struct SequenceConsumed {
    pub kind: ChannelKind,
    pub remote_chain_id: u64,
    pub sequence: u64,
    /// True when the sequence was taken from the overflow chain
    pub late: bool,
    pub window_start: u64,
}

/// Event emitted for every window advance that left sequences unconsumed.
/// Those sequences can now only be consumed through the overflow chain.
#[event]
pub struct SequencesFlushed {
    pub kind: ChannelKind,
    pub remote_chain_id: u64,
    pub segment_begin: u64,
    /// Bit `i` set = `segment_begin + i` was flushed; ascending bit order
    /// gives the ordered list of flushed sequences
    pub pending: [u8; 32],
    pub count: u16,
}

/// Event emitted when an exhausted overflow segment is closed
#[event]
pub struct SegmentReclaimed {
    pub kind: ChannelKind,
    pub remote_chain_id: u64,
    pub segment_begin: u64,
}

/// Event emitted when a channel tracker is created
#[event]
pub struct ChannelInitialized {
    pub kind: ChannelKind,
    pub remote_chain_id: u64,
    pub channel: Pubkey,
}

/// Event emitted when system status changes
#[event]
pub struct SystemStatusChanged {
    pub enabled: bool,
}

/// Event emitted when the advance budget changes
#[event]
pub struct TrackerConfigUpdated {
    pub max_advance_steps: u16,
}

/// Event emitted when the consuming handler changes
#[event]
pub struct ConsumerUpdated {
    pub consumer: Pubkey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_ADVANCE_STEPS_LIMIT;
    use anchor_lang::Event;

    /// Program log budget per transaction
    const LOG_LIMIT: usize = 10_000;

    #[test]
    fn test_flush_events_fit_log_budget() {
        let flushed = SequencesFlushed {
            kind: ChannelKind::TokenBridge,
            remote_chain_id: 2,
            segment_begin: u64::MAX - 255,
            pending: [0xff; 32],
            count: 256,
        };
        let data = flushed.data();
        assert_eq!(data.len(), 8 + 1 + 8 + 8 + 32 + 2);

        // Logged as base64 behind a "Program data: " prefix.
        let logged = 14 + data.len().div_ceil(3) * 4;
        assert!(logged * usize::from(MAX_ADVANCE_STEPS_LIMIT) < LOG_LIMIT / 2);
    }
}
