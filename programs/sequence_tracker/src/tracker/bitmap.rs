use anchor_lang::prelude::*;

use crate::constants::WINDOW_SIZE;

/// Number of sequences covered by the live window (low + high segment)
pub const WINDOW_SPAN: u64 = 2 * WINDOW_SIZE;

/// Size of one 256-bit segment in bytes
pub const BITMAP_BYTES: usize = (WINDOW_SIZE / 8) as usize;

/// One 256-bit segment, bit `i` lives in byte `i / 8` at position `i % 8`
pub type Bitmap = [u8; BITMAP_BYTES];

#[inline]
pub(crate) fn bit_is_set(bitmap: &Bitmap, offset: u64) -> bool {
    let offset = offset as usize;
    bitmap[offset / 8] & (1 << (offset % 8)) != 0
}

#[inline]
pub(crate) fn set_bit(bitmap: &mut Bitmap, offset: u64) {
    let offset = offset as usize;
    bitmap[offset / 8] |= 1 << (offset % 8);
}

#[inline]
pub(crate) fn clear_bit(bitmap: &mut Bitmap, offset: u64) {
    let offset = offset as usize;
    bitmap[offset / 8] &= !(1 << (offset % 8));
}

/// Result of marking a sequence inside the live window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowOutcome {
    Consumed,
    AlreadyConsumed,
}

/// Sequences of an outgoing low segment that were never consumed.
///
/// `pending` uses "outstanding" polarity: a set bit means `begin + i` still
/// has to be consumed. It is the bitwise complement of the outgoing segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushedSet {
    pub begin: u64,
    pub pending: Bitmap,
}

impl FlushedSet {
    pub fn is_empty(&self) -> bool {
        self.pending.iter().all(|byte| *byte == 0)
    }

    pub fn len(&self) -> usize {
        self.pending.iter().map(|byte| byte.count_ones() as usize).sum()
    }

    #[cfg(test)]
    pub fn contains(&self, sequence: u64) -> bool {
        sequence >= self.begin
            && sequence - self.begin < WINDOW_SIZE
            && bit_is_set(&self.pending, sequence - self.begin)
    }

    /// Flushed sequence numbers in ascending order
    #[cfg(test)]
    pub fn sequences(&self) -> Vec<u64> {
        (0..WINDOW_SIZE)
            .filter(|offset| bit_is_set(&self.pending, *offset))
            .map(|offset| self.begin + offset)
            .collect()
    }
}

/// Two-segment sliding bitmap over `[start, start + 512)`.
///
/// A set bit means the sequence has been consumed.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitmapWindow {
    /// Lower bound of the window, always a multiple of `WINDOW_SIZE`
    pub start: u64,

    /// Covers `[start, start + 256)`
    pub low: Bitmap,

    /// Covers `[start + 256, start + 512)`
    pub high: Bitmap,
}

impl BitmapWindow {
    pub const SIZE: usize = 8   // start
        + BITMAP_BYTES          // low
        + BITMAP_BYTES;         // high

    pub fn contains(&self, sequence: u64) -> bool {
        sequence >= self.start && sequence - self.start < WINDOW_SPAN
    }

    #[cfg(test)]
    pub fn is_marked(&self, sequence: u64) -> bool {
        if !self.contains(sequence) {
            return false;
        }
        let offset = sequence - self.start;
        if offset < WINDOW_SIZE {
            bit_is_set(&self.low, offset)
        } else {
            bit_is_set(&self.high, offset - WINDOW_SIZE)
        }
    }

    /// Marks `sequence` as consumed. The caller guarantees `contains(sequence)`.
    pub fn mark(&mut self, sequence: u64) -> WindowOutcome {
        debug_assert!(self.contains(sequence));

        let offset = sequence - self.start;
        let (segment, bit) = if offset < WINDOW_SIZE {
            (&mut self.low, offset)
        } else {
            (&mut self.high, offset - WINDOW_SIZE)
        };

        if bit_is_set(segment, bit) {
            return WindowOutcome::AlreadyConsumed;
        }
        set_bit(segment, bit);
        WindowOutcome::Consumed
    }

    /// Slides the window up by one segment.
    ///
    /// Returns the unconsumed sequences of the outgoing low segment. They are
    /// forgotten by the window, so the caller must persist them elsewhere.
    pub fn advance(&mut self) -> FlushedSet {
        let mut pending = [0u8; BITMAP_BYTES];
        for (out, byte) in pending.iter_mut().zip(self.low.iter()) {
            *out = !*byte;
        }
        let flushed = FlushedSet {
            begin: self.start,
            pending,
        };

        self.low = self.high;
        self.high = [0u8; BITMAP_BYTES];
        self.start += WINDOW_SIZE;

        flushed
    }

    /// Number of `advance` calls needed before `sequence` fits the window.
    /// Zero when `sequence` is already inside or below the window.
    pub fn steps_to_reach(&self, sequence: u64) -> u64 {
        if sequence < self.start {
            return 0;
        }
        let distance = sequence - self.start;
        if distance < WINDOW_SPAN {
            0
        } else {
            (distance - WINDOW_SPAN) / WINDOW_SIZE + 1
        }
    }
}
