//! Snapshot query boundary
//!
//! `getklog(buf, max_entries)`: copy a fresh snapshot into a caller-owned
//! region as packed records. The region is described by a [`UserMemory`]
//! implementation and an address inside it.
//!
//! Staging goes through one page-sized allocation, which caps the records
//! a single call can return at [`STAGING_ENTRIES`] regardless of the
//! `max_entries` the caller asked for. The cap is applied silently.
//!
//! At the syscall boundary every failure is reported as `-1`. Records
//! already copied out before a failure stay where they were written, and
//! only those count as read.

use alloc::vec::Vec;

use crate::{
    config::{MAX_QUERY_ENTRIES, STAGING_BYTES},
    engine::KlogEngine,
    error::{into_syscall_return, KlogError, KlogResult},
    record::{KlogEntry, RECORD_SIZE},
};

/// Records that fit in one staging allocation.
pub const STAGING_ENTRIES: usize = STAGING_BYTES / RECORD_SIZE;

/// A destination region the caller may legitimately receive data into.
pub trait UserMemory {
    /// Bytes addressable in the region, starting at address 0.
    fn size(&self) -> usize;

    /// Copy `src` to `addr`. Fails without writing if the range does not
    /// lie entirely inside the region.
    fn copy_out(&mut self, addr: usize, src: &[u8]) -> KlogResult<()>;
}

impl UserMemory for [u8] {
    fn size(&self) -> usize {
        self.len()
    }

    fn copy_out(&mut self, addr: usize, src: &[u8]) -> KlogResult<()> {
        let end = addr
            .checked_add(src.len())
            .ok_or(KlogError::InvalidAddress { addr })?;
        let dst = self
            .get_mut(addr..end)
            .ok_or(KlogError::InvalidAddress { addr })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl UserMemory for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }

    fn copy_out(&mut self, addr: usize, src: &[u8]) -> KlogResult<()> {
        self.as_mut_slice().copy_out(addr, src)
    }
}

/// Validate a request and copy a snapshot into `mem` at `buf_addr`.
///
/// Returns the number of records written.
pub fn getklog<M: UserMemory + ?Sized>(
    engine: &KlogEngine,
    mem: &mut M,
    buf_addr: usize,
    max_entries: i32,
) -> KlogResult<usize> {
    if max_entries <= 0 || max_entries as usize > MAX_QUERY_ENTRIES {
        return Err(KlogError::InvalidArgument {
            name: "max_entries",
            value: "must be in 1..=1024",
        });
    }
    let max_entries = max_entries as usize;

    let size = mem.size();
    if buf_addr >= size {
        return Err(KlogError::InvalidAddress { addr: buf_addr });
    }
    let required = max_entries * RECORD_SIZE;
    match buf_addr.checked_add(required) {
        Some(end) if end <= size => {}
        _ => {
            return Err(KlogError::BufferTooSmall {
                required,
                provided: size - buf_addr,
            })
        }
    }

    let limit = max_entries.min(STAGING_ENTRIES);
    let mut staging = Vec::new();
    staging
        .try_reserve_exact(limit)
        .map_err(|_| KlogError::OutOfMemory {
            requested: limit * RECORD_SIZE,
        })?;
    staging.resize(limit, KlogEntry::empty());

    let count = engine.peek_into(&mut staging);

    for (i, entry) in staging[..count].iter().enumerate() {
        if let Err(err) = mem.copy_out(buf_addr + i * RECORD_SIZE, &entry.to_bytes()) {
            engine.acknowledge(&staging[..i]);
            return Err(err);
        }
    }
    engine.acknowledge(&staging[..count]);

    Ok(count)
}

/// Syscall entry: record count on success, `-1` on any failure.
pub fn sys_getklog<M: UserMemory + ?Sized>(
    engine: &KlogEngine,
    mem: &mut M,
    buf_addr: usize,
    max_entries: i32,
) -> isize {
    let result = getklog(engine, mem, buf_addr, max_entries);
    if let Err(err) = result {
        log::debug!("getklog: {}", err);
    }
    into_syscall_return(result)
}
