//! Log record layout
//!
//! A [`KlogEntry`] is a fixed-layout `#[repr(C)]` struct of six native-order
//! `u32` fields followed by a NUL-terminated 64-byte message. Every boundary
//! that serializes records (the query call, the streaming device) copies this
//! layout byte for byte.

use core::{fmt, mem};

use crate::config::MESSAGE_LEN;

/// Bytes per serialized record.
pub const RECORD_SIZE: usize = mem::size_of::<KlogEntry>();

const _: () = assert!(RECORD_SIZE == 6 * mem::size_of::<u32>() + MESSAGE_LEN);

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a record. The numeric encoding is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Severity {
    /// Decode a raw severity. Values outside the known range are opaque to
    /// readers, so this returns `None` rather than an error.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Debug),
            1 => Some(Self::Info),
            2 => Some(Self::Warn),
            3 => Some(Self::Error),
            _ => None,
        }
    }

    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

// ---------------------------------------------------------------------------
// KlogEntry
// ---------------------------------------------------------------------------

/// A single structured log record.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KlogEntry {
    /// Global sequence number; defines the merge order across cores.
    pub seq: u32,
    /// High half of the originating core's cycle counter.
    pub timestamp_hi: u32,
    /// Low half of the originating core's cycle counter.
    pub timestamp_lo: u32,
    /// Core that produced the record.
    pub cpu: u32,
    /// Subject (e.g. process id) the record was produced for; 0 for none.
    pub pid: u32,
    /// Raw severity, see [`Severity`].
    pub level: u32,
    msg: [u8; MESSAGE_LEN],
}

impl KlogEntry {
    /// Zeroed entry used to fill fresh rings and staging buffers.
    pub const fn empty() -> Self {
        Self {
            seq: 0,
            timestamp_hi: 0,
            timestamp_lo: 0,
            cpu: 0,
            pid: 0,
            level: 0,
            msg: [0u8; MESSAGE_LEN],
        }
    }

    /// Build an entry around an already-rendered message buffer.
    ///
    /// The last byte of `msg` is forced to NUL so the message is always
    /// terminated.
    pub fn new(
        seq: u32,
        timestamp: (u32, u32),
        cpu: u32,
        pid: u32,
        severity: Severity,
        mut msg: [u8; MESSAGE_LEN],
    ) -> Self {
        msg[MESSAGE_LEN - 1] = 0;
        Self {
            seq,
            timestamp_hi: timestamp.0,
            timestamp_lo: timestamp.1,
            cpu,
            pid,
            level: severity.as_raw(),
            msg,
        }
    }

    /// Decoded severity, `None` for unknown values.
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_raw(self.level)
    }

    /// Full 64-bit cycle count. Only comparable with records of the same core.
    pub fn timestamp(&self) -> u64 {
        ((self.timestamp_hi as u64) << 32) | self.timestamp_lo as u64
    }

    /// Message bytes up to (not including) the terminator.
    pub fn message_bytes(&self) -> &[u8] {
        let len = self
            .msg
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MESSAGE_LEN);
        &self.msg[..len]
    }

    /// Message text. A multi-byte character cut by truncation is dropped.
    pub fn message(&self) -> &str {
        let bytes = self.message_bytes();
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }

    /// Serialize into the fixed wire layout.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        let fields = [
            self.seq,
            self.timestamp_hi,
            self.timestamp_lo,
            self.cpu,
            self.pid,
            self.level,
        ];
        for (chunk, field) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_ne_bytes());
        }
        out[RECORD_SIZE - MESSAGE_LEN..].copy_from_slice(&self.msg);
        out
    }

    /// Deserialize one record. Returns `None` if `bytes` is shorter than
    /// [`RECORD_SIZE`]; trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..RECORD_SIZE)?;
        let mut fields = [0u32; 6];
        for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(4)) {
            *field = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let mut msg = [0u8; MESSAGE_LEN];
        msg.copy_from_slice(&bytes[RECORD_SIZE - MESSAGE_LEN..]);
        Some(Self {
            seq: fields[0],
            timestamp_hi: fields[1],
            timestamp_lo: fields[2],
            cpu: fields[3],
            pid: fields[4],
            level: fields[5],
            msg,
        })
    }

    /// Decode every whole record in `bytes`, ignoring a partial tail.
    pub fn decode_all(bytes: &[u8]) -> impl Iterator<Item = KlogEntry> + '_ {
        bytes.chunks_exact(RECORD_SIZE).filter_map(Self::from_bytes)
    }
}

impl Default for KlogEntry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for KlogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KlogEntry")
            .field("seq", &self.seq)
            .field("timestamp", &self.timestamp())
            .field("cpu", &self.cpu)
            .field("pid", &self.pid)
            .field("level", &self.level)
            .field("msg", &self.message())
            .finish()
    }
}
