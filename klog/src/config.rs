//! Event log configuration
//!
//! The ring arena is sized once at startup and never resized, so everything
//! here is either a compile-time constant or validated before the engine is
//! built.

use crate::error::{KlogError, KlogResult};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Entries per core ring. Must be a power of two.
pub const DEFAULT_RING_CAPACITY: usize = 256;

/// Default number of cores when the host topology is not consulted.
pub const MAX_CORES: usize = 8;

/// Bytes in a record's message buffer, terminator included.
pub const MESSAGE_LEN: usize = 64;

/// Largest `max_entries` the query boundary accepts.
pub const MAX_QUERY_ENTRIES: usize = 1024;

/// Size of the query staging allocation (one page).
pub const STAGING_BYTES: usize = 4096;

/// Records snapshotted per read of the streaming device.
pub const DEVICE_READ_ENTRIES: usize = 64;

// ---------------------------------------------------------------------------
// KlogConfig
// ---------------------------------------------------------------------------

/// Startup sizing for a [`crate::KlogEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KlogConfig {
    /// Number of cores, i.e. rings in the arena.
    pub cores: usize,
    /// Entries per ring.
    pub ring_capacity: usize,
}

impl Default for KlogConfig {
    fn default() -> Self {
        Self {
            cores: MAX_CORES,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

impl KlogConfig {
    /// Config for `cores` rings of the default capacity.
    pub const fn new(cores: usize) -> Self {
        Self {
            cores,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }

    /// Override the per-core ring capacity.
    pub const fn with_ring_capacity(mut self, ring_capacity: usize) -> Self {
        self.ring_capacity = ring_capacity;
        self
    }

    /// Size the arena from the host's available parallelism.
    #[cfg(feature = "std")]
    pub fn from_host() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(cores)
    }

    /// Check the config before any ring is allocated.
    pub fn validate(&self) -> KlogResult<()> {
        if self.cores == 0 {
            return Err(KlogError::InvalidArgument {
                name: "cores",
                value: "must be at least 1",
            });
        }
        if !self.ring_capacity.is_power_of_two() {
            return Err(KlogError::InvalidArgument {
                name: "ring_capacity",
                value: "must be a non-zero power of two",
            });
        }
        Ok(())
    }
}
