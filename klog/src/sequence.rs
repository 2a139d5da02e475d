//! Global sequence allocator
//!
//! One counter behind one lock. Every record takes exactly one number, so
//! the numbers define a strict total order over all records from all cores.
//! The counter is 32 bits wide to match the record layout and wraps after
//! 2^32 allocations.

use spin::Mutex;

pub struct SequenceAllocator {
    next: Mutex<u32>,
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceAllocator {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Allocator whose first issued number is `first`.
    pub const fn starting_at(first: u32) -> Self {
        Self {
            next: Mutex::new(first),
        }
    }

    /// Issue the next sequence number.
    ///
    /// Callers may hold a ring lock while calling this; the allocator lock is
    /// always the inner one and is never held while acquiring anything else.
    #[inline]
    pub fn allocate(&self) -> u32 {
        let mut next = self.next.lock();
        let seq = *next;
        *next = next.wrapping_add(1);
        seq
    }

    /// The number the next `allocate` will return.
    pub fn peek(&self) -> u32 {
        *self.next.lock()
    }
}
