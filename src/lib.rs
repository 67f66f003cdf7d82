//! A crate that reads Unicode Character Database files into hashed lookup
//! tables keyed by code point or code point sequence.
//!
//! Each UCD file is loaded through a [`loader::PropertySpec`] describing its
//! field layout and how values are decoded and merged; the collation table
//! (`allkeys.txt`) has its own loader.  Loaded tables can be emitted as Rust
//! source with [`codegen`].

pub mod codegen;
pub mod collation;
pub mod constants;
pub mod error;
pub mod expand;
pub mod lexical;
pub mod loader;
pub mod properties;
pub mod record;
pub mod table;
pub mod types;

pub use error::{LoadError, OverflowError, SkipReason};
pub use loader::{load, load_collation, load_file, load_supplement, LoadedProperty, PropertySpec};
pub use table::{InsertPolicy, PropertyTable};
pub use types::{CodePointKey, Interval};
