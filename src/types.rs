//! Common types used across this crate, with meaning not defined within a
//! specific module.

use std::fmt;

use itertools::Itertools;

use crate::constants::{MAX_CODE_POINT, MAX_KEY_LEN};

/// An inclusive range of code points, `start..=end`, as written in UCD files
/// (`0041..005A`, or `0041` for a single code point).
///
/// Parsing never fails, so an `Interval` may hold garbage; use
/// [`Interval::is_valid`] before trusting it.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    pub fn new(start: u32, end: u32) -> Interval {
        Interval { start, end }
    }

    pub fn single(code: u32) -> Interval {
        Interval {
            start: code,
            end: code,
        }
    }

    /// Whether `start <= end` and both lie within the code space.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end && self.end <= MAX_CODE_POINT
    }

    pub fn contains(&self, code: u32) -> bool {
        self.start <= code && code <= self.end
    }

    /// Number of code points covered, zero for an inverted interval.
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{:04X}", self.start)
        } else {
            write!(f, "{:04X}..{:04X}", self.start, self.end)
        }
    }
}

/// A table key: an ordered sequence of one to [`MAX_KEY_LEN`] code points.
///
/// Most properties are keyed by a single code point; collation contractions
/// such as `0061 0062` use longer keys.  Two keys are equal only if they have
/// the same length and the same code points in the same order.
#[derive(Copy, Clone, Hash, PartialEq, Eq)]
pub struct CodePointKey {
    codes: [u32; MAX_KEY_LEN],
    len: u8,
}

impl CodePointKey {
    pub fn single(code: u32) -> CodePointKey {
        let mut codes = [0; MAX_KEY_LEN];
        codes[0] = code;
        CodePointKey { codes, len: 1 }
    }

    /// Build a key from a sequence, or `None` if it is empty or longer than
    /// [`MAX_KEY_LEN`].
    pub fn from_slice(sequence: &[u32]) -> Option<CodePointKey> {
        if sequence.is_empty() || sequence.len() > MAX_KEY_LEN {
            return None;
        }
        let mut codes = [0; MAX_KEY_LEN];
        codes[..sequence.len()].copy_from_slice(sequence);
        Some(CodePointKey {
            codes,
            len: sequence.len() as u8,
        })
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.codes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_single(&self) -> bool {
        self.len == 1
    }

    /// The first code point of the key; the whole key for single-code-point
    /// tables.
    pub fn first(&self) -> u32 {
        self.codes[0]
    }

    /// Little-endian bytes of the code points, the input to the table hash.
    pub(crate) fn hash_bytes(&self) -> ([u8; MAX_KEY_LEN * 4], usize) {
        let mut bytes = [0u8; MAX_KEY_LEN * 4];
        for (chunk, code) in bytes.chunks_exact_mut(4).zip(self.as_slice()) {
            chunk.copy_from_slice(&code.to_le_bytes());
        }
        (bytes, self.len() * 4)
    }
}

impl From<u32> for CodePointKey {
    fn from(code: u32) -> CodePointKey {
        CodePointKey::single(code)
    }
}

impl fmt::Debug for CodePointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodePointKey({})", self)
    }
}

impl fmt::Display for CodePointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes = self
            .as_slice()
            .iter()
            .map(|code| format!("{:04X}", code))
            .join(" ");
        f.write_str(&codes)
    }
}

#[test]
fn key_equality_includes_length() {
    let a = CodePointKey::single(0x61);
    let ab = CodePointKey::from_slice(&[0x61, 0x62]).expect("two code points");
    let a0 = CodePointKey::from_slice(&[0x61, 0x00]).expect("two code points");

    assert_ne!(a, ab);
    assert_ne!(a, a0, "trailing U+0000 is part of the key");
    assert_eq!(ab.as_slice(), &[0x61, 0x62]);
    assert_eq!(ab.to_string(), "0061 0062");
}

#[test]
fn key_length_bounds() {
    assert!(CodePointKey::from_slice(&[]).is_none());
    assert!(CodePointKey::from_slice(&[1; MAX_KEY_LEN]).is_some());
    assert!(CodePointKey::from_slice(&[1; MAX_KEY_LEN + 1]).is_none());
}

#[test]
fn interval_validity() {
    assert!(Interval::new(0x41, 0x5A).is_valid());
    assert!(Interval::single(MAX_CODE_POINT).is_valid());
    assert!(!Interval::new(0x5A, 0x41).is_valid());
    assert!(!Interval::new(0, MAX_CODE_POINT + 1).is_valid());
    assert_eq!(Interval::new(0x41, 0x43).len(), 3);
    assert_eq!(Interval::new(0x43, 0x41).len(), 0);
    assert_eq!(Interval::new(0x41, 0x5A).to_string(), "0041..005A");
}
