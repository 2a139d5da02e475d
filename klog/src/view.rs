//! Human-readable record formatting
//!
//! What a log viewer prints for each record of a snapshot, plus a
//! reader-side severity filter. Filtering happens after retrieval; the
//! engine itself always stores every severity.

use core::fmt;

use bitflags::bitflags;

use crate::record::{KlogEntry, Severity};

/// Display name for a raw severity value. Unknown values print as `?`.
pub fn severity_name(raw: u32) -> &'static str {
    Severity::from_raw(raw).map_or("?", Severity::as_str)
}

/// `[seq] LEVEL CPUn PIDn: message`
pub struct EntryView<'a>(pub &'a KlogEntry);

impl fmt::Display for EntryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.0;
        write!(
            f,
            "[{}] {} CPU{} PID{}: {}",
            e.seq,
            severity_name(e.level),
            e.cpu,
            e.pid,
            e.message()
        )
    }
}

bitflags! {
    /// Severities a viewer chooses to display.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SeverityMask: u32 {
        const DEBUG = 1 << 0;
        const INFO = 1 << 1;
        const WARN = 1 << 2;
        const ERROR = 1 << 3;
        /// Severities outside the known encoding.
        const UNKNOWN = 1 << 4;
    }
}

impl SeverityMask {
    pub const fn of(severity: Severity) -> Self {
        match severity {
            Severity::Debug => Self::DEBUG,
            Severity::Info => Self::INFO,
            Severity::Warn => Self::WARN,
            Severity::Error => Self::ERROR,
        }
    }

    /// `min` and every more severe level. Unknown severities excluded.
    pub fn at_least(min: Severity) -> Self {
        [Severity::Debug, Severity::Info, Severity::Warn, Severity::Error]
            .into_iter()
            .filter(|&s| s >= min)
            .fold(Self::empty(), |mask, s| mask | Self::of(s))
    }

    pub fn admits(&self, entry: &KlogEntry) -> bool {
        let bit = entry.severity().map_or(Self::UNKNOWN, Self::of);
        self.contains(bit)
    }

    /// Parse a comma-separated list (`debug,warn`), a threshold (`warn+`),
    /// or `all`. Case-insensitive.
    pub fn parse(filter: &str) -> Option<Self> {
        let filter = filter.trim();
        if filter.eq_ignore_ascii_case("all") {
            return Some(Self::all());
        }
        if let Some(level) = filter.strip_suffix('+') {
            return parse_severity(level).map(Self::at_least);
        }
        filter.split(',').try_fold(Self::empty(), |mask, part| {
            let part = part.trim();
            if part.eq_ignore_ascii_case("unknown") {
                Some(mask | Self::UNKNOWN)
            } else {
                parse_severity(part).map(|s| mask | Self::of(s))
            }
        })
    }
}

fn parse_severity(name: &str) -> Option<Severity> {
    [Severity::Debug, Severity::Info, Severity::Warn, Severity::Error]
        .into_iter()
        .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;
    use crate::config::MESSAGE_LEN;

    fn entry(level: u32) -> KlogEntry {
        let mut msg = [0u8; MESSAGE_LEN];
        msg[..5].copy_from_slice(b"fork!");
        let mut e = KlogEntry::new(12, (0, 0), 1, 4, Severity::Debug, msg);
        e.level = level;
        e
    }

    #[test]
    fn test_entry_line() {
        assert_eq!(EntryView(&entry(1)).to_string(), "[12] INFO CPU1 PID4: fork!");
        assert_eq!(EntryView(&entry(3)).to_string(), "[12] ERROR CPU1 PID4: fork!");
        assert_eq!(EntryView(&entry(17)).to_string(), "[12] ? CPU1 PID4: fork!");
    }

    #[test]
    fn test_at_least() {
        let mask = SeverityMask::at_least(Severity::Warn);
        assert_eq!(mask, SeverityMask::WARN | SeverityMask::ERROR);
        assert!(mask.admits(&entry(2)));
        assert!(!mask.admits(&entry(1)));
        assert!(!mask.admits(&entry(9)));
    }

    #[test]
    fn test_unknown_needs_explicit_bit() {
        assert!(SeverityMask::all().admits(&entry(9)));
        assert!(SeverityMask::UNKNOWN.admits(&entry(9)));
        assert!(!SeverityMask::UNKNOWN.admits(&entry(0)));
    }

    #[test]
    fn test_parse() {
        assert_eq!(SeverityMask::parse("all"), Some(SeverityMask::all()));
        assert_eq!(
            SeverityMask::parse("Debug, error"),
            Some(SeverityMask::DEBUG | SeverityMask::ERROR)
        );
        assert_eq!(
            SeverityMask::parse("info+"),
            Some(SeverityMask::INFO | SeverityMask::WARN | SeverityMask::ERROR)
        );
        assert_eq!(
            SeverityMask::parse("warn,unknown"),
            Some(SeverityMask::WARN | SeverityMask::UNKNOWN)
        );
        assert_eq!(SeverityMask::parse("loud"), None);
        assert_eq!(SeverityMask::parse("loud+"), None);
    }
}
