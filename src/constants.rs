/// The maximum Unicode scalar value.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

/// The maximum number of code points in a single table key.  Collation
/// contractions in `allkeys.txt` never exceed this.
pub const MAX_KEY_LEN: usize = 8;

/// The maximum number of weight triples attached to one collation element.
pub const MAX_WEIGHTS: usize = 8;

/// A growable table doubles once more than `LOAD_NUMERATOR / LOAD_DENOMINATOR`
/// of its slots would be occupied.
pub const LOAD_NUMERATOR: usize = 7;
pub const LOAD_DENOMINATOR: usize = 8;

/// Character that separates fields in a UCD record.
pub const FIELD_SEPARATOR: char = ';';

/// Character that introduces a comment, either a whole line or trailing.
pub const COMMENT_MARKER: char = '#';

/// Character that introduces `@missing` and `@version` directives.
pub const DIRECTIVE_MARKER: char = '@';

/// Separator between the two ends of a code point range, as in `0041..005A`.
pub const RANGE_MARKER: &str = "..";

/// Default number of slots for the collation table: `allkeys.txt` holds a
/// little over 30,000 entries as of Unicode 15.
pub const COLLATION_CAPACITY: usize = 1 << 16;
