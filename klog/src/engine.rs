//! Log engine and snapshot collector
//!
//! The engine owns an arena of [`CoreRing`]s, one per core, sized once from
//! [`KlogConfig`] and never resized, plus the global [`SequenceAllocator`].
//!
//! ## Lock order
//!
//! The only nesting is ring lock -> sequence lock, taken by the write path.
//! The collector holds at most one ring lock at a time and never touches the
//! sequence lock, so no two ring locks are ever held together.
//!
//! ## Snapshot policy
//!
//! The collector visits cores in ascending id order and spends its entry
//! budget in that order. When the valid entries of all cores exceed the
//! budget, lower-numbered cores are drained first and a later core can be
//! left out entirely, even if its records are newer. Because each core is
//! locked and released in turn, a snapshot is not an atomic cut across
//! cores.
//!
//! A snapshot counts as read by default. Boundaries that may fail to hand
//! every copied record to their caller use [`KlogEngine::peek_into`] and
//! then [`KlogEngine::acknowledge`] exactly what was delivered.

use alloc::{boxed::Box, vec, vec::Vec};
use core::marker::PhantomData;

use crate::{
    config::{KlogConfig, MESSAGE_LEN},
    context::ExecutionContext,
    error::KlogResult,
    format::{self, Arg},
    record::{KlogEntry, Severity},
    ring::CoreRing,
    sequence::SequenceAllocator,
    timestamp,
};

pub struct KlogEngine {
    cores: Box<[CoreRing]>,
    sequence: SequenceAllocator,
    ring_capacity: usize,
}

impl KlogEngine {
    /// Allocate one ring per configured core.
    pub fn new(config: KlogConfig) -> KlogResult<Self> {
        config.validate()?;

        let cores = (0..config.cores)
            .map(|_| CoreRing::new(config.ring_capacity))
            .collect::<KlogResult<Box<[CoreRing]>>>()?;

        log::info!(
            "klog: {} cores x {} entries per ring",
            config.cores,
            config.ring_capacity
        );

        Ok(Self {
            cores,
            sequence: SequenceAllocator::new(),
            ring_capacity: config.ring_capacity,
        })
    }

    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    pub fn ring_capacity(&self) -> usize {
        self.ring_capacity
    }

    /// Sequence number the next record will receive.
    pub fn next_sequence(&self) -> u32 {
        self.sequence.peek()
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Identify the caller's core and return a handle bound to its ring.
    ///
    /// Returns `None` if the context has no core or one outside the arena.
    pub fn pin<C: ExecutionContext + ?Sized>(&self, ctx: &C) -> Option<CorePin<'_>> {
        let Some(core) = ctx.current_core() else {
            log::trace!("klog: caller is not bound to a core, record dropped");
            return None;
        };
        let Some(ring) = self.cores.get(core) else {
            log::trace!("klog: core {} outside arena, record dropped", core);
            return None;
        };
        Some(CorePin {
            engine: self,
            ring,
            core: core as u32,
            subject: ctx.current_subject(),
            _not_send: PhantomData,
        })
    }

    /// Render and store one record on the caller's core.
    ///
    /// Never fails. Records from a caller without a valid core are discarded.
    pub fn record<C: ExecutionContext + ?Sized>(
        &self,
        ctx: &C,
        severity: Severity,
        template: &str,
        args: &[Arg<'_>],
    ) {
        let msg = format::render(template, args);
        if let Some(pin) = self.pin(ctx) {
            pin.write(severity, msg);
        }
    }

    /// [`record`](Self::record) at [`Severity::Info`].
    pub fn log<C: ExecutionContext + ?Sized>(&self, ctx: &C, template: &str, args: &[Arg<'_>]) {
        self.record(ctx, Severity::Info, template, args);
    }

    // -----------------------------------------------------------------------
    // Collector
    // -----------------------------------------------------------------------

    /// Snapshot up to `max_entries` records, sorted by sequence number.
    pub fn collect(&self, max_entries: usize) -> Vec<KlogEntry> {
        let limit = max_entries.min(self.cores.len() * self.ring_capacity);
        let mut out = vec![KlogEntry::empty(); limit];
        let n = self.collect_into(&mut out);
        out.truncate(n);
        out
    }

    /// Snapshot into caller storage; the budget is `out.len()`.
    ///
    /// Returns the number of records written to the front of `out`, sorted
    /// ascending by sequence number.
    pub fn collect_into(&self, out: &mut [KlogEntry]) -> usize {
        self.gather(out, CoreRing::snapshot_range)
    }

    /// [`collect_into`](Self::collect_into) without counting anything as
    /// read. Follow with [`acknowledge`](Self::acknowledge).
    pub fn peek_into(&self, out: &mut [KlogEntry]) -> usize {
        self.gather(out, CoreRing::peek_range)
    }

    /// Count `delivered`, a sorted prefix of a peeked snapshot, as read.
    pub fn acknowledge(&self, delivered: &[KlogEntry]) {
        for (core, ring) in self.cores.iter().enumerate() {
            let newest = delivered.iter().rev().find(|e| e.cpu as usize == core);
            if let Some(entry) = newest {
                ring.lock().mark_read_through(entry.seq);
            }
        }
    }

    fn gather(
        &self,
        out: &mut [KlogEntry],
        copy: impl Fn(&CoreRing, &mut [KlogEntry]) -> usize,
    ) -> usize {
        let mut count = 0;
        for ring in self.cores.iter() {
            if count == out.len() {
                break;
            }
            count += copy(ring, &mut out[count..]);
        }
        out[..count].sort_unstable_by_key(|e| e.seq);
        count
    }

    /// Reset every ring. The sequence counter keeps counting.
    pub fn clear(&self) {
        for ring in self.cores.iter() {
            ring.lock().clear();
        }
    }

    /// Total records overwritten before any snapshot saw them.
    pub fn dropped(&self) -> u64 {
        self.cores.iter().map(|ring| ring.lock().dropped()).sum()
    }
}

// ---------------------------------------------------------------------------
// CorePin
// ---------------------------------------------------------------------------

/// Handle to the ring of the core a caller was identified on.
///
/// The handle is `!Send`: identification and every write made through it
/// stay on the thread that obtained it, so a record can never land in a
/// ring other than the one its core id names.
pub struct CorePin<'e> {
    engine: &'e KlogEngine,
    ring: &'e CoreRing,
    core: u32,
    subject: u32,
    _not_send: PhantomData<*const ()>,
}

impl CorePin<'_> {
    pub fn core_id(&self) -> u32 {
        self.core
    }

    pub fn subject(&self) -> u32 {
        self.subject
    }

    /// Render and store one record on the pinned core.
    pub fn record(&self, severity: Severity, template: &str, args: &[Arg<'_>]) {
        self.write(severity, format::render(template, args));
    }

    fn write(&self, severity: Severity, msg: [u8; MESSAGE_LEN]) {
        let mut ring = self.ring.lock();
        let seq = self.engine.sequence.allocate();
        let entry = KlogEntry::new(
            seq,
            timestamp::now(),
            self.core,
            self.subject,
            severity,
            msg,
        );
        ring.append(entry);
    }
}
