//! Errors raised while building property tables.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::constants::MAX_KEY_LEN;
use crate::types::CodePointKey;

/// An insert probed every slot of a fixed-capacity table without finding
/// either the key or an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("table of {capacity} slots is full; cannot insert {key}")]
pub struct OverflowError {
    pub capacity: usize,
    pub key: CodePointKey,
}

/// A failure that stops the loading of one property.  Loaders for other
/// properties are unaffected.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("read error at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {source}")]
    Overflow {
        line: usize,
        #[source]
        source: OverflowError,
    },
}

/// Why a record was skipped.  Skipped records are logged and counted, never
/// fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer `;`-separated fields than the layout requires.
    TooFewFields { expected: usize, found: usize },
    /// The code point field is inverted or outside the code space.
    InvalidRange,
    /// The decoder did not recognise the value field.
    UnknownValue,
    /// The record was rejected by the loader's filter (e.g. case folding
    /// status `F`).
    Filtered,
    /// A key field with no code points.
    EmptyKey,
    /// A key field with more code points than fit in a key.
    KeyTooLong { found: usize },
    /// A collation record with no well-formed weight group.
    NoWeights,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewFields { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            SkipReason::InvalidRange => f.write_str("invalid code point range"),
            SkipReason::UnknownValue => f.write_str("unrecognised property value"),
            SkipReason::Filtered => f.write_str("filtered out"),
            SkipReason::EmptyKey => f.write_str("missing code point key"),
            SkipReason::KeyTooLong { found } => {
                write!(f, "key of {found} code points exceeds {MAX_KEY_LEN}")
            }
            SkipReason::NoWeights => f.write_str("no valid collation weights"),
        }
    }
}
