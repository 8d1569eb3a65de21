//! Replay protection for incoming cross-chain sequences.
//!
//! Recent sequences live in a two-segment [`BitmapWindow`]. When the window
//! slides past sequences that were never consumed, they are kept in
//! [`OverflowSegment`]s so a late message can still be executed exactly once.

pub mod bitmap;
pub mod overflow;

pub use bitmap::*;
pub use overflow::*;

use anchor_lang::prelude::*;

use crate::constants::{DEFAULT_MAX_ADVANCE_STEPS, MAX_ADVANCE_STEPS_LIMIT};
use crate::errors::{GatewayError, SequenceError};

/// Per-call cost limits for [`SequenceTracker::consume`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Window advances a single consume may perform
    pub max_advance_steps: u16,
}

impl TrackerConfig {
    pub fn new(max_advance_steps: u16) -> Result<Self> {
        require!(
            max_advance_steps > 0 && max_advance_steps <= MAX_ADVANCE_STEPS_LIMIT,
            GatewayError::InvalidMaxAdvanceSteps
        );
        Ok(Self { max_advance_steps })
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_advance_steps: DEFAULT_MAX_ADVANCE_STEPS,
        }
    }
}

/// Where a consumed sequence was found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumePath {
    Window,
    Overflow,
}

/// Outcome of a successful consume
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Consumption {
    pub path: ConsumePath,
    /// Non-empty flushes caused by window advances, oldest first.
    /// Each one was pushed to the store as a new segment.
    pub flushed: Vec<FlushedSet>,
}

/// Replay-protection state of one channel. Fixed size; the overflow
/// segments are stored separately and reached through an [`OverflowStore`].
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceTracker {
    pub window: BitmapWindow,

    /// `begin` of the newest overflow segment
    pub overflow_head: Option<u64>,
}

impl SequenceTracker {
    pub const SIZE: usize = BitmapWindow::SIZE  // window
        + 1 + 8;                                // overflow_head (Option<u64>)

    pub fn window_start(&self) -> u64 {
        self.window.start
    }

    /// Marks `sequence` as executed.
    ///
    /// Fails without touching any state when the sequence was already
    /// consumed or lies more than `max_advance_steps` segments ahead.
    pub fn consume<S: OverflowStore>(
        &mut self,
        sequence: u64,
        config: &TrackerConfig,
        overflow: &mut S,
    ) -> std::result::Result<Consumption, SequenceError> {
        if sequence < self.window.start {
            return match overflow.try_consume(sequence) {
                OverflowOutcome::Consumed => Ok(Consumption {
                    path: ConsumePath::Overflow,
                    flushed: Vec::new(),
                }),
                OverflowOutcome::AlreadyConsumed | OverflowOutcome::NotFound => {
                    Err(SequenceError::Replay)
                }
            };
        }

        let steps = self.window.steps_to_reach(sequence);
        if steps > u64::from(config.max_advance_steps) {
            return Err(SequenceError::SequenceTooFarAhead);
        }

        let mut flushed = Vec::new();
        for _ in 0..steps {
            let outgoing = self.window.advance();
            if !outgoing.is_empty() {
                overflow.push_segment(OverflowSegment::from_flush(&outgoing, self.overflow_head));
                self.overflow_head = Some(outgoing.begin);
                flushed.push(outgoing);
            }
        }

        // Slots uncovered by an advance start clear, so a replay here implies steps == 0.
        match self.window.mark(sequence) {
            WindowOutcome::Consumed => Ok(Consumption {
                path: ConsumePath::Window,
                flushed,
            }),
            WindowOutcome::AlreadyConsumed => Err(SequenceError::Replay),
        }
    }

    /// Detaches an exhausted segment from the chain.
    ///
    /// `child` is the segment whose parent is `segment`; it must be absent
    /// exactly when `segment` is the head.
    pub fn unlink_segment(
        &mut self,
        segment: &OverflowSegment,
        child: Option<&mut OverflowSegment>,
    ) -> Result<()> {
        require!(segment.is_exhausted(), GatewayError::SegmentNotExhausted);

        match child {
            None => {
                require!(
                    self.overflow_head == Some(segment.begin),
                    GatewayError::InvalidSegmentLink
                );
                self.overflow_head = segment.parent;
            }
            Some(child) => {
                require!(
                    child.parent == Some(segment.begin),
                    GatewayError::InvalidSegmentLink
                );
                child.parent = segment.parent;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_advance_steps: u16) -> TrackerConfig {
        TrackerConfig { max_advance_steps }
    }

    /// Window plus in-memory segments
    #[derive(Default)]
    struct Channel {
        tracker: SequenceTracker,
        segments: MemorySegments,
    }

    impl Channel {
        fn consume(
            &mut self,
            sequence: u64,
            config: &TrackerConfig,
        ) -> std::result::Result<Consumption, SequenceError> {
            self.tracker.consume(sequence, config, &mut self.segments)
        }

        fn is_consumed(&self, sequence: u64) -> bool {
            if sequence < self.tracker.window_start() {
                self.segments
                    .0
                    .get(&segment_begin(sequence))
                    .map_or(true, |segment| !segment.is_pending(sequence))
            } else {
                self.tracker.window.is_marked(sequence)
            }
        }

        /// Segment begins reached from the head through parent links
        fn chain(&self) -> Vec<u64> {
            let mut begins = Vec::new();
            let mut cursor = self.tracker.overflow_head;
            while let Some(begin) = cursor {
                begins.push(begin);
                cursor = self.segments.0[&begin].parent;
            }
            begins
        }
    }

    #[test]
    fn test_fresh_tracker_replay_rejected() {
        let mut channel = Channel::default();
        let consumption = channel.consume(0, &TrackerConfig::default()).unwrap();
        assert_eq!(consumption.path, ConsumePath::Window);
        assert!(consumption.flushed.is_empty());

        assert!(matches!(
            channel.consume(0, &TrackerConfig::default()),
            Err(SequenceError::Replay)
        ));
    }

    #[test]
    fn test_sequence_in_high_segment_does_not_advance() {
        let mut channel = Channel::default();
        channel.consume(300, &TrackerConfig::default()).unwrap();

        assert_eq!(channel.tracker.window_start(), 0);
        assert!(bit_is_set(&channel.tracker.window.high, 44));
        assert_eq!(channel.tracker.overflow_head, None);
        assert!(channel.segments.0.is_empty());
    }

    /// Fresh channel, one advance: the whole untouched first segment is flushed.
    fn channel_after_first_advance() -> Channel {
        let mut channel = Channel::default();
        let consumption = channel.consume(556, &TrackerConfig::default()).unwrap();

        assert_eq!(consumption.flushed.len(), 1);
        assert_eq!(consumption.flushed[0].begin, 0);
        assert_eq!(consumption.flushed[0].sequences(), (0..256).collect::<Vec<u64>>());
        channel
    }

    #[test]
    fn test_advance_pushes_flushed_segment() {
        let channel = channel_after_first_advance();

        assert_eq!(channel.tracker.window_start(), 256);
        assert!(bit_is_set(&channel.tracker.window.high, 44));
        assert_eq!(channel.tracker.window.low, [0u8; BITMAP_BYTES]);
        assert_eq!(channel.tracker.overflow_head, Some(0));

        let head = &channel.segments.0[&0];
        assert_eq!(head.begin, 0);
        assert_eq!(head.pending, [0xff; BITMAP_BYTES]);
        assert_eq!(head.parent, None);
    }

    #[test]
    fn test_flushed_sequence_consumed_once_through_overflow() {
        let mut channel = channel_after_first_advance();

        let consumption = channel.consume(10, &TrackerConfig::default()).unwrap();
        assert_eq!(consumption.path, ConsumePath::Overflow);
        assert!(!channel.segments.0[&0].is_pending(10));

        assert!(matches!(
            channel.consume(10, &TrackerConfig::default()),
            Err(SequenceError::Replay)
        ));
    }

    #[test]
    fn test_too_far_ahead_leaves_state_untouched() {
        let mut channel = channel_after_first_advance();
        let tracker = channel.tracker;
        let segments = channel.segments.0.clone();

        // From window start 256, 1300 needs three advances.
        assert!(matches!(
            channel.consume(1300, &TrackerConfig::default()),
            Err(SequenceError::SequenceTooFarAhead)
        ));
        assert_eq!(channel.tracker, tracker);
        assert_eq!(channel.segments.0, segments);

        // 999 needs one advance, which a zero budget would not allow either.
        assert_eq!(channel.tracker.window.steps_to_reach(999), 1);
        assert!(matches!(
            channel.consume(999, &config(0)),
            Err(SequenceError::SequenceTooFarAhead)
        ));
        assert_eq!(channel.tracker, tracker);
        assert_eq!(channel.segments.0, segments);
    }

    #[test]
    fn test_multi_step_advance_within_budget() {
        let mut channel = Channel::default();
        channel.consume(5, &config(4)).unwrap();

        // 1300 only fits the window once it starts at 1024: four advances.
        let consumption = channel.consume(1300, &config(4)).unwrap();
        assert_eq!(channel.tracker.window_start(), 1024);
        assert_eq!(consumption.flushed.len(), 4);

        let begins: Vec<u64> = consumption.flushed.iter().map(|f| f.begin).collect();
        assert_eq!(begins, vec![0, 256, 512, 768]);
        assert!(!consumption.flushed[0].contains(5));
        assert_eq!(consumption.flushed[0].len(), 255);

        assert_eq!(channel.chain(), vec![768, 512, 256, 0]);

        assert!(channel.consume(600, &config(4)).is_ok());
        assert!(matches!(
            channel.consume(5, &config(4)),
            Err(SequenceError::Replay)
        ));
    }

    #[test]
    fn test_fully_consumed_segment_creates_no_overflow() {
        let mut channel = Channel::default();
        for sequence in 0..256 {
            channel.consume(sequence, &TrackerConfig::default()).unwrap();
        }

        let consumption = channel.consume(512, &TrackerConfig::default()).unwrap();
        assert!(consumption.flushed.is_empty());
        assert_eq!(channel.tracker.overflow_head, None);
        assert!(channel.segments.0.is_empty());
        assert_eq!(channel.tracker.window_start(), 256);

        // Consumed while in the window, so the overflow path reports a replay.
        assert!(matches!(
            channel.consume(100, &TrackerConfig::default()),
            Err(SequenceError::Replay)
        ));
    }

    #[test]
    fn test_head_skips_fully_consumed_segments() {
        let mut channel = Channel::default();
        channel.consume(3, &config(2)).unwrap();
        for sequence in 256..512 {
            channel.consume(sequence, &config(2)).unwrap();
        }

        // [0, 256) flushes, [256, 512) is full and leaves no segment.
        channel.consume(1000, &config(2)).unwrap();
        channel.consume(1100, &config(2)).unwrap();

        assert_eq!(channel.chain(), vec![512, 0]);
        assert!(!channel.segments.0.contains_key(&256));
    }

    #[test]
    fn test_no_double_consumption_across_advances() {
        let mut channel = Channel::default();
        let config = config(2);
        let sequences = [7u64, 900, 3, 512, 1200, 7, 900, 40, 3, 1500, 1201, 40];

        let mut accepted = std::collections::HashSet::new();
        for sequence in sequences {
            match channel.consume(sequence, &config) {
                Ok(_) => assert!(accepted.insert(sequence), "{} consumed twice", sequence),
                Err(SequenceError::Replay) => assert!(accepted.contains(&sequence)),
                Err(SequenceError::SequenceTooFarAhead) => {}
            }
        }

        for sequence in accepted {
            assert!(channel.is_consumed(sequence));
            assert!(matches!(
                channel.consume(sequence, &config),
                Err(SequenceError::Replay)
            ));
        }
    }

    #[test]
    fn test_order_independence_within_window() {
        let sequences = [0u64, 511, 256, 17, 300, 255];

        let mut forward = Channel::default();
        for sequence in sequences {
            forward.consume(sequence, &TrackerConfig::default()).unwrap();
        }
        let mut backward = Channel::default();
        for sequence in sequences.iter().rev() {
            backward.consume(*sequence, &TrackerConfig::default()).unwrap();
        }

        assert_eq!(forward.tracker, backward.tracker);
    }

    #[test]
    fn test_unlink_head_and_middle_segments() {
        let mut channel = Channel::default();
        channel.consume(1300, &config(4)).unwrap();
        assert_eq!(channel.chain(), vec![768, 512, 256, 0]);

        // Not exhausted yet.
        let head = channel.segments.0[&768].clone();
        assert!(channel.tracker.unlink_segment(&head, None).is_err());

        for sequence in 768..1024 {
            channel.consume(sequence, &config(4)).unwrap();
        }
        let head = channel.segments.0.remove(&768).unwrap();
        channel.tracker.unlink_segment(&head, None).unwrap();
        assert_eq!(channel.tracker.overflow_head, Some(512));

        for sequence in 256..512 {
            channel.consume(sequence, &config(4)).unwrap();
        }
        let middle = channel.segments.0.remove(&256).unwrap();

        // The head is not the child of a middle segment.
        assert!(channel.tracker.unlink_segment(&middle, None).is_err());

        let mut child = channel.segments.0[&512].clone();
        channel
            .tracker
            .unlink_segment(&middle, Some(&mut child))
            .unwrap();
        channel.segments.0.insert(512, child);
        assert_eq!(channel.chain(), vec![512, 0]);

        // Reclaimed ranges stay consumed.
        assert!(matches!(
            channel.consume(300, &config(4)),
            Err(SequenceError::Replay)
        ));
        assert!(channel.consume(10, &config(4)).is_ok());
    }

    #[test]
    fn test_tracker_config_bounds() {
        assert!(TrackerConfig::new(0).is_err());
        assert!(TrackerConfig::new(MAX_ADVANCE_STEPS_LIMIT + 1).is_err());
        assert_eq!(
            TrackerConfig::new(3).unwrap(),
            TrackerConfig { max_advance_steps: 3 }
        );
        assert_eq!(TrackerConfig::default().max_advance_steps, 1);
    }

    #[test]
    fn test_state_survives_serialization() {
        let mut channel = Channel::default();
        channel.consume(4, &TrackerConfig::default()).unwrap();

        let mut bytes = Vec::new();
        channel.tracker.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), BitmapWindow::SIZE + 1);

        channel.consume(700, &TrackerConfig::default()).unwrap();

        let mut bytes = Vec::new();
        channel.tracker.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), SequenceTracker::SIZE);

        channel.tracker = SequenceTracker::try_from_slice(&bytes).unwrap();
        assert_eq!(channel.tracker.overflow_head, Some(0));
        assert!(matches!(
            channel.consume(4, &TrackerConfig::default()),
            Err(SequenceError::Replay)
        ));
        assert!(channel.consume(5, &TrackerConfig::default()).is_ok());
    }
}
