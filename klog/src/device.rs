//! Read-only streaming log device (`/dev/klog`)
//!
//! Every read takes a fresh snapshot of at most [`DEVICE_READ_ENTRIES`]
//! records, no more than fit whole in the caller's buffer, so everything a
//! read snapshots is delivered. A record is never split across reads.
//! Writes always fail.

use crate::{
    config::DEVICE_READ_ENTRIES,
    engine::KlogEngine,
    error::{into_syscall_return, KlogError, KlogResult},
    record::{KlogEntry, RECORD_SIZE},
};

/// Character device operations.
pub trait CharDevice {
    fn read(&self, offset: usize, buffer: &mut [u8]) -> KlogResult<usize>;

    fn write(&self, offset: usize, data: &[u8]) -> KlogResult<usize>;
}

/// The log device, backed by an engine.
pub struct KlogDevice<'e> {
    engine: &'e KlogEngine,
}

impl<'e> KlogDevice<'e> {
    pub const NAME: &'static str = "klog";

    pub const fn new(engine: &'e KlogEngine) -> Self {
        Self { engine }
    }
}

impl CharDevice for KlogDevice<'_> {
    /// `offset` is ignored: each read is a new snapshot, not a cursor into
    /// an earlier one.
    fn read(&self, _offset: usize, buffer: &mut [u8]) -> KlogResult<usize> {
        let mut entries = [KlogEntry::empty(); DEVICE_READ_ENTRIES];
        let limit = DEVICE_READ_ENTRIES.min(buffer.len() / RECORD_SIZE);
        let count = self.engine.collect_into(&mut entries[..limit]);

        let mut copied = 0;
        for (entry, dst) in entries[..count]
            .iter()
            .zip(buffer.chunks_exact_mut(RECORD_SIZE))
        {
            dst.copy_from_slice(&entry.to_bytes());
            copied += RECORD_SIZE;
        }
        Ok(copied)
    }

    fn write(&self, _offset: usize, _data: &[u8]) -> KlogResult<usize> {
        log::debug!("klog: rejected write to read-only device");
        Err(KlogError::OperationNotSupported {
            operation: "write to klog device",
        })
    }
}

/// Device read entry: bytes written, or `-1`.
pub fn dev_read<D: CharDevice + ?Sized>(dev: &D, offset: usize, buffer: &mut [u8]) -> isize {
    into_syscall_return(dev.read(offset, buffer))
}

/// Device write entry: bytes consumed, or `-1`.
pub fn dev_write<D: CharDevice + ?Sized>(dev: &D, offset: usize, data: &[u8]) -> isize {
    into_syscall_return(dev.write(offset, data))
}
