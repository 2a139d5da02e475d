//! Per-core record ring
//!
//! Each core owns one [`CoreRing`]: a fixed-capacity circular array of
//! [`KlogEntry`] behind its own spin lock. The write cursor only ever grows;
//! the slot for cursor position `p` is `p & (N - 1)`, and the valid entries
//! are exactly those at positions `[max(0, head - N), head)`.
//!
//! ## Drop accounting
//!
//! The ring remembers how far readers have received entries (`watermark`).
//! An append that overwrites a position no reader received counts as a drop.
//! Overwriting entries that were already read is not a loss. A copy made
//! with [`RingBuffer::peek_range`] moves nothing until the reader confirms
//! delivery with [`RingBuffer::mark_read_through`].

use alloc::{boxed::Box, vec};
use core::ops::Range;

use spin::{Mutex, MutexGuard};

use crate::{
    error::{KlogError, KlogResult},
    record::KlogEntry,
};

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// Ring state. Only reachable through a [`CoreRing`] lock.
pub struct RingBuffer {
    entries: Box<[KlogEntry]>,
    /// Next write position. Never wraps.
    head: u64,
    /// Overwritten entries that no snapshot ever saw.
    dropped: u64,
    /// Positions below this have been copied out by some snapshot.
    watermark: u64,
}

impl RingBuffer {
    /// Fails unless `capacity` is a non-zero power of two.
    pub fn new(capacity: usize) -> KlogResult<Self> {
        if !capacity.is_power_of_two() {
            return Err(KlogError::InvalidArgument {
                name: "ring_capacity",
                value: "must be a non-zero power of two",
            });
        }
        Ok(Self {
            entries: vec![KlogEntry::empty(); capacity].into_boxed_slice(),
            head: 0,
            dropped: 0,
            watermark: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn head(&self) -> u64 {
        self.head
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        let range = self.valid_range();
        (range.end - range.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.head == 0
    }

    /// Cursor positions currently holding valid entries.
    pub fn valid_range(&self) -> Range<u64> {
        let start = self.head.saturating_sub(self.capacity() as u64);
        start..self.head
    }

    #[inline]
    fn slot(&self, pos: u64) -> usize {
        (pos & (self.capacity() as u64 - 1)) as usize
    }

    /// Write `entry` at the cursor and advance it. Always succeeds.
    #[inline]
    pub fn append(&mut self, entry: KlogEntry) {
        let capacity = self.capacity() as u64;
        if self.head >= capacity && self.head - capacity >= self.watermark {
            self.dropped += 1;
        }
        let slot = self.slot(self.head);
        self.entries[slot] = entry;
        self.head += 1;
    }

    /// Copy valid entries, oldest first, into `out` until it is full.
    ///
    /// Returns the number copied. Nothing in the ring changes.
    pub fn peek_range(&self, out: &mut [KlogEntry]) -> usize {
        let mut copied = 0;
        for (dst, pos) in out.iter_mut().zip(self.valid_range()) {
            *dst = self.entries[self.slot(pos)];
            copied += 1;
        }
        copied
    }

    /// [`peek_range`](Self::peek_range), with everything copied counted as
    /// read.
    ///
    /// Contents and cursor are left untouched; only the read watermark moves.
    pub fn snapshot_range(&mut self, out: &mut [KlogEntry]) -> usize {
        let copied = self.peek_range(out);
        self.watermark = self
            .watermark
            .max(self.valid_range().start + copied as u64);
        copied
    }

    /// Count every valid entry up to and including the one numbered `seq`
    /// as read. No-op if that entry is no longer in the ring.
    pub fn mark_read_through(&mut self, seq: u32) {
        let found = self
            .valid_range()
            .rev()
            .find(|&pos| self.entries[self.slot(pos)].seq == seq);
        if let Some(pos) = found {
            self.watermark = self.watermark.max(pos + 1);
        }
    }

    /// Forget every entry and reset drop accounting.
    pub fn clear(&mut self) {
        self.head = 0;
        self.dropped = 0;
        self.watermark = 0;
    }
}

// ---------------------------------------------------------------------------
// CoreRing
// ---------------------------------------------------------------------------

/// A [`RingBuffer`] with its dedicated lock.
pub struct CoreRing {
    ring: Mutex<RingBuffer>,
}

impl CoreRing {
    pub fn new(capacity: usize) -> KlogResult<Self> {
        Ok(Self {
            ring: Mutex::new(RingBuffer::new(capacity)?),
        })
    }

    /// Acquire this core's ring lock.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, RingBuffer> {
        self.ring.lock()
    }

    /// Append under the lock.
    pub fn append(&self, entry: KlogEntry) {
        self.lock().append(entry);
    }

    /// Copy under the lock. The whole copy runs against one cursor value.
    pub fn snapshot_range(&self, out: &mut [KlogEntry]) -> usize {
        self.lock().snapshot_range(out)
    }

    /// Copy under the lock without counting anything as read.
    pub fn peek_range(&self, out: &mut [KlogEntry]) -> usize {
        self.lock().peek_range(out)
    }
}
