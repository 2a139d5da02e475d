//! Message rendering
//!
//! A closed substitution grammar, deliberately much smaller than
//! `core::fmt`:
//!
//! | directive | renders                                   |
//! |-----------|-------------------------------------------|
//! | `%d`      | signed decimal                            |
//! | `%x`      | lowercase hexadecimal with a `0x` prefix  |
//! | `%s`      | text                                      |
//! | `%%`      | a literal `%`                             |
//!
//! Any other directive is copied through verbatim, as is a directive with no
//! argument left to consume. A lone `%` at the end of the template ends
//! rendering. Output is cut at [`MESSAGE_LEN`]` - 1` bytes without telling
//! the caller.

use crate::config::MESSAGE_LEN;

/// A typed substitution argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    Int(i32),
    Hex(u32),
    Str(&'a str),
}

impl From<i32> for Arg<'_> {
    fn from(v: i32) -> Self {
        Arg::Int(v)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(s)
    }
}

/// Fixed-capacity message buffer. One byte is always reserved for the
/// terminator.
struct MessageWriter {
    buf: [u8; MESSAGE_LEN],
    len: usize,
}

impl MessageWriter {
    const CAPACITY: usize = MESSAGE_LEN - 1;

    const fn new() -> Self {
        Self {
            buf: [0u8; MESSAGE_LEN],
            len: 0,
        }
    }

    fn remaining(&self) -> usize {
        Self::CAPACITY - self.len
    }

    fn is_full(&self) -> bool {
        self.len >= Self::CAPACITY
    }

    fn push(&mut self, b: u8) {
        if !self.is_full() {
            self.buf[self.len] = b;
            self.len += 1;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(self.remaining());
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
    }

    fn push_int(&mut self, val: i32) {
        if val < 0 {
            self.push(b'-');
        }
        self.push_digits(val.unsigned_abs(), 10);
    }

    fn push_hex(&mut self, val: u32) {
        // Prefix and at least one digit, or nothing at all.
        if self.remaining() < 2 {
            return;
        }
        self.push_bytes(b"0x");
        self.push_digits(val, 16);
    }

    /// Most significant digit first; low digits are lost on truncation.
    fn push_digits(&mut self, mut val: u32, radix: u32) {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        let mut tmp = [0u8; 10];
        let mut n = 0;
        loop {
            tmp[n] = DIGITS[(val % radix) as usize];
            n += 1;
            val /= radix;
            if val == 0 {
                break;
            }
        }
        while n > 0 {
            n -= 1;
            self.push(tmp[n]);
        }
    }

    fn push_arg(&mut self, arg: Arg<'_>) {
        match arg {
            Arg::Int(v) => self.push_int(v),
            Arg::Hex(v) => self.push_hex(v),
            Arg::Str(s) => self.push_bytes(s.as_bytes()),
        }
    }

    fn finish(self) -> [u8; MESSAGE_LEN] {
        self.buf
    }
}

/// Render `template` against `args` into a NUL-terminated message buffer.
///
/// Integer and hexadecimal arguments are interchangeable between `%d` and
/// `%x`. An argument whose kind does not fit the directive at all (text for
/// a numeric directive, a number for `%s`) is rendered in its own kind.
pub fn render(template: &str, args: &[Arg<'_>]) -> [u8; MESSAGE_LEN] {
    let mut out = MessageWriter::new();
    let mut args = args.iter().copied();
    let mut bytes = template.bytes();

    while let Some(b) = bytes.next() {
        if out.is_full() {
            break;
        }
        if b != b'%' {
            out.push(b);
            continue;
        }
        let Some(directive) = bytes.next() else {
            break;
        };
        match directive {
            b'%' => out.push(b'%'),
            b'd' | b'x' | b's' => match args.next() {
                Some(arg) => match (directive, arg) {
                    (b'd', Arg::Hex(v)) => out.push_int(v as i32),
                    (b'x', Arg::Int(v)) => out.push_hex(v as u32),
                    (_, arg) => out.push_arg(arg),
                },
                None => out.push_bytes(&[b'%', directive]),
            },
            other => out.push_bytes(&[b'%', other]),
        }
    }

    out.finish()
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    fn rendered(template: &str, args: &[Arg<'_>]) -> String {
        let buf = render(template, args);
        let len = buf.iter().position(|&b| b == 0).unwrap();
        String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(rendered("scheduler initialized", &[]), "scheduler initialized");
        assert_eq!(rendered("", &[]), "");
    }

    #[test]
    fn test_substitutions() {
        assert_eq!(rendered("pid %d", &[Arg::Int(42)]), "pid 42");
        assert_eq!(rendered("neg %d", &[Arg::Int(-17)]), "neg -17");
        assert_eq!(rendered("min %d", &[Arg::Int(i32::MIN)]), "min -2147483648");
        assert_eq!(rendered("zero %d", &[Arg::Int(0)]), "zero 0");
        assert_eq!(rendered("va %x", &[Arg::Hex(0xdead_beef)]), "va 0xdeadbeef");
        assert_eq!(rendered("va %x", &[Arg::Hex(0)]), "va 0x0");
        assert_eq!(rendered("name %s!", &[Arg::Str("init")]), "name init!");
        assert_eq!(rendered("100%%", &[]), "100%");
    }

    #[test]
    fn test_mixed_arguments_in_order() {
        let args = [Arg::Str("sh"), Arg::Int(3), Arg::Hex(0x1000)];
        assert_eq!(
            rendered("exec %s pid %d at %x", &args),
            "exec sh pid 3 at 0x1000"
        );
    }

    #[test]
    fn test_numeric_kinds_are_interchangeable() {
        assert_eq!(rendered("%x", &[Arg::Int(255)]), "0xff");
        assert_eq!(rendered("%d", &[Arg::Hex(0xffff_ffff)]), "-1");
        assert_eq!(rendered("%d", &[Arg::Str("text")]), "text");
        assert_eq!(rendered("%s", &[Arg::Int(5)]), "5");
    }

    #[test]
    fn test_unknown_directive_copied_verbatim() {
        assert_eq!(rendered("rate %q here", &[]), "rate %q here");
        assert_eq!(rendered("%u", &[Arg::Int(1)]), "%u");
    }

    #[test]
    fn test_missing_argument_copied_verbatim() {
        assert_eq!(rendered("a %d b %s", &[Arg::Int(1)]), "a 1 b %s");
    }

    #[test]
    fn test_trailing_percent_ends_rendering() {
        assert_eq!(rendered("50%", &[]), "50");
    }

    #[test]
    fn test_truncates_to_63_bytes() {
        let long: String = (0..80).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let out = rendered(&long, &[]);
        assert_eq!(out.len(), MESSAGE_LEN - 1);
        assert_eq!(out, &long[..63]);
        assert_eq!(render(&long, &[])[63], 0);
    }

    #[test]
    fn test_truncation_inside_argument() {
        let prefix: String = core::iter::repeat('p').take(60).collect();
        let template = alloc::format!("{}%d", prefix);
        assert_eq!(
            rendered(&template, &[Arg::Int(123_456)]),
            alloc::format!("{}123", prefix)
        );

        // Hex needs room for the prefix plus one digit.
        let prefix: String = core::iter::repeat('p').take(62).collect();
        let template = alloc::format!("{}%x", prefix);
        assert_eq!(rendered(&template, &[Arg::Hex(0xab)]), prefix);
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Arg::from(3), Arg::Int(3));
        assert_eq!(Arg::from("x"), Arg::Str("x"));
    }
}
