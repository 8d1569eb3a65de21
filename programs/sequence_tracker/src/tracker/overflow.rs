use anchor_lang::prelude::*;

use super::bitmap::{bit_is_set, clear_bit, Bitmap, FlushedSet, BITMAP_BYTES};
use crate::constants::WINDOW_SIZE;

/// Result of looking a sequence up in the overflow chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowOutcome {
    Consumed,
    AlreadyConsumed,
    NotFound,
}

/// Start of the only segment that can cover `sequence`
pub fn segment_begin(sequence: u64) -> u64 {
    sequence - sequence % WINDOW_SIZE
}

/// Sequences of `[begin, begin + 256)` that fell behind the window unconsumed.
/// Each segment is its own account, seeded by channel and `begin`.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct OverflowSegment {
    /// First sequence covered, multiple of `WINDOW_SIZE`
    pub begin: u64,

    /// Set bit = still outstanding
    pub pending: Bitmap,

    /// `begin` of the next older segment
    pub parent: Option<u64>,

    /// PDA bump seed
    pub bump: u8,
}

impl OverflowSegment {
    pub const SIZE: usize = 8   // begin
        + BITMAP_BYTES          // pending
        + 1 + 8                 // parent (Option<u64>)
        + 1;                    // bump

    /// New head segment for a flushed window segment
    pub fn from_flush(flushed: &FlushedSet, parent: Option<u64>) -> Self {
        Self {
            begin: flushed.begin,
            pending: flushed.pending,
            parent,
            bump: 0,
        }
    }

    pub fn covers(&self, sequence: u64) -> bool {
        sequence >= self.begin && sequence - self.begin < WINDOW_SIZE
    }

    pub fn is_pending(&self, sequence: u64) -> bool {
        self.covers(sequence) && bit_is_set(&self.pending, sequence - self.begin)
    }

    /// All outstanding sequences were consumed; the account can be reclaimed.
    pub fn is_exhausted(&self) -> bool {
        self.pending.iter().all(|byte| *byte == 0)
    }

    pub fn try_consume(&mut self, sequence: u64) -> OverflowOutcome {
        if !self.covers(sequence) {
            return OverflowOutcome::NotFound;
        }
        if !self.is_pending(sequence) {
            return OverflowOutcome::AlreadyConsumed;
        }
        clear_bit(&mut self.pending, sequence - self.begin);
        OverflowOutcome::Consumed
    }
}

/// Access to the overflow chain of one channel.
///
/// Segments never overlap, so the segment covering a sequence is found
/// directly by its `begin` instead of walking parent links.
pub trait OverflowStore {
    fn segment_mut(&mut self, begin: u64) -> Option<&mut OverflowSegment>;

    /// Stores a new head segment
    fn push_segment(&mut self, segment: OverflowSegment);

    /// `NotFound` means no segment covers `sequence`: it was consumed while
    /// still inside the window.
    fn try_consume(&mut self, sequence: u64) -> OverflowOutcome {
        match self.segment_mut(segment_begin(sequence)) {
            Some(segment) => segment.try_consume(sequence),
            None => OverflowOutcome::NotFound,
        }
    }
}

/// Segments held in memory, keyed by `begin`
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemorySegments(pub std::collections::BTreeMap<u64, OverflowSegment>);

#[cfg(test)]
impl OverflowStore for MemorySegments {
    fn segment_mut(&mut self, begin: u64) -> Option<&mut OverflowSegment> {
        self.0.get_mut(&begin)
    }

    fn push_segment(&mut self, segment: OverflowSegment) {
        self.0.insert(segment.begin, segment);
    }
}
