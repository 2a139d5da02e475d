//! VeridianOS per-core event log
//!
//! Each core owns a private fixed-capacity ring of structured log records.
//! A single global sequence allocator hands out a strict total order over
//! every record, and the snapshot collector merges the per-core rings into
//! one sequence-ordered array on demand.
//!
//! # Usage
//!
//! ```
//! use veridian_klog::{Arg, FixedCore, KlogConfig, KlogEngine, Severity};
//!
//! let engine = KlogEngine::new(KlogConfig::new(2)).unwrap();
//! let cpu0 = FixedCore::new(0);
//! engine.record(&cpu0, Severity::Info, "fork pid %d", &[Arg::Int(7)]);
//!
//! let snapshot = engine.collect(16);
//! assert_eq!(snapshot.len(), 1);
//! assert_eq!(snapshot[0].message(), "fork pid 7");
//! ```
//!
//! Recording never fails. Messages longer than the fixed message buffer are
//! truncated, and once a core has produced more records than its ring holds
//! the oldest ones are overwritten. Both losses are silent to the writer.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod config;
pub mod context;
pub mod device;
pub mod engine;
pub mod error;
pub mod format;
pub mod global;
pub mod query;
pub mod record;
pub mod ring;
pub mod sequence;
pub mod timestamp;
pub mod view;
#[cfg(feature = "std")]
pub mod worker;

pub use config::KlogConfig;
pub use context::{ExecutionContext, FixedCore};
pub use device::{CharDevice, KlogDevice};
pub use engine::{CorePin, KlogEngine};
pub use error::{KlogError, KlogResult};
pub use format::Arg;
pub use record::{KlogEntry, Severity, RECORD_SIZE};
pub use view::{EntryView, SeverityMask};
