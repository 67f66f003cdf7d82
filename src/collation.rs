//! Parsing the Default Unicode Collation Element Table (`allkeys.txt`).
//!
//! Each record maps one or more code points to a sequence of collation
//! elements:
//!
//! ```text
//! 0061 0062 ; [.06D9.0020.0002][.06EE.0020.0002] # LATIN SMALL LETTER A, ...
//! ```
//!
//! A group opened with `[*` rather than `[.` marks a *variable* weight, one
//! that may be ignored at some strengths.

use std::fmt;

use crate::constants::{MAX_CODE_POINT, MAX_KEY_LEN, MAX_WEIGHTS};
use crate::error::SkipReason;
use crate::lexical::parse_code_points;
use crate::record::Record;
use crate::types::CodePointKey;

/// Length of a well-formed group, brackets included: `[.PPPP.SSSS.TTTT]`.
const GROUP_LEN: usize = 17;

/// One three-level collation weight.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct Weight {
    pub primary: u16,
    pub secondary: u16,
    pub tertiary: u16,
    /// Introduced by `[*` rather than `[.`.
    pub variable: bool,
}

impl Weight {
    pub fn new(primary: u16, secondary: u16, tertiary: u16) -> Weight {
        Weight {
            primary,
            secondary,
            tertiary,
            variable: false,
        }
    }

    pub fn variable(primary: u16, secondary: u16, tertiary: u16) -> Weight {
        Weight {
            primary,
            secondary,
            tertiary,
            variable: true,
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}{:04X}.{:04X}.{:04X}]",
            if self.variable { '*' } else { '.' },
            self.primary,
            self.secondary,
            self.tertiary
        )
    }
}

impl quote::ToTokens for Weight {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let Weight {
            primary,
            secondary,
            tertiary,
            variable,
        } = *self;
        tokens.extend(quote::quote! {
            (#primary, #secondary, #tertiary, #variable)
        });
    }
}

/// A parsed `allkeys.txt` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollationElement {
    pub key: CodePointKey,
    /// Between one and [`MAX_WEIGHTS`] weights.
    pub weights: Vec<Weight>,
    /// The trailing `# ...` comment, usually the character names.
    pub comment: Option<String>,
}

/// Parse exactly four hex digits.
fn parse_weight_field(field: &str) -> Option<u16> {
    if field.len() != 4 || !field.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(field, 16).ok()
}

/// Parse one bracketed group, `[.PPPP.SSSS.TTTT]` or `[*PPPP.SSSS.TTTT]`.
fn parse_group(group: &str) -> Option<Weight> {
    if group.len() < GROUP_LEN {
        return None;
    }
    let inner = group.strip_prefix('[')?.strip_suffix(']')?;
    let variable = match inner.as_bytes().first()? {
        b'.' => false,
        b'*' => true,
        _ => return None,
    };

    // Four-level tables append a quaternary weight, which is not kept.
    let mut fields = inner[1..].split('.');
    let primary = parse_weight_field(fields.next()?)?;
    let secondary = parse_weight_field(fields.next()?)?;
    let tertiary = parse_weight_field(fields.next()?)?;

    Some(Weight {
        primary,
        secondary,
        tertiary,
        variable,
    })
}

/// Parse a weight sequence such as `[.06D9.0020.0002][*0209.0020.0002]`.
///
/// Malformed groups are skipped.  Parsing stops at the first `[` without a
/// closing `]`, or once [`MAX_WEIGHTS`] weights have been collected.
pub fn parse_weights(text: &str) -> Vec<Weight> {
    let mut weights = Vec::new();
    let mut rest = text;
    while weights.len() < MAX_WEIGHTS {
        let Some(open) = rest.find('[') else {
            break;
        };
        let Some(close) = rest[open..].find(']') else {
            break;
        };
        let close = open + close;
        if let Some(weight) = parse_group(&rest[open..=close]) {
            weights.push(weight);
        }
        rest = &rest[close + 1..];
    }
    weights
}

impl CollationElement {
    /// Build an element from a tokenized `allkeys.txt` record.
    ///
    /// A record is rejected if its key is empty, longer than [`MAX_KEY_LEN`]
    /// code points or outside the code space, or if it has no valid weights.
    pub fn from_record(record: &Record<'_>) -> Result<CollationElement, SkipReason> {
        record.require(2)?;

        let codes = parse_code_points(record.fields[0]).collect::<Vec<u32>>();
        if codes.len() > MAX_KEY_LEN {
            return Err(SkipReason::KeyTooLong { found: codes.len() });
        }
        if codes.iter().any(|&code| code > MAX_CODE_POINT) {
            return Err(SkipReason::InvalidRange);
        }
        let key = CodePointKey::from_slice(&codes).ok_or(SkipReason::EmptyKey)?;

        let weights = parse_weights(record.fields[1]);
        if weights.is_empty() {
            return Err(SkipReason::NoWeights);
        }

        Ok(CollationElement {
            key,
            weights,
            comment: record.annotation.map(str::to_string),
        })
    }

    /// Parse one line of `allkeys.txt`.  Returns `None` for lines holding no
    /// record (comments, blank lines and `@version`).
    pub fn parse_line(line: &str) -> Option<Result<CollationElement, SkipReason>> {
        Record::parse(line).map(|record| CollationElement::from_record(&record))
    }
}

#[test]
fn two_code_point_contraction() {
    let element = CollationElement::parse_line(
        "0061 0062 ; [.06D9.0020.0002][.06EE.0020.0002] # LATIN SMALL LETTER A, LATIN SMALL LETTER B",
    )
    .expect("a record")
    .expect("valid");

    assert_eq!(element.key.as_slice(), &[0x61, 0x62]);
    assert_eq!(
        element.weights,
        vec![
            Weight::new(0x06D9, 0x0020, 0x0002),
            Weight::new(0x06EE, 0x0020, 0x0002),
        ]
    );
    assert!(element.weights.iter().all(|weight| !weight.variable));
    assert_eq!(
        element.comment.as_deref(),
        Some("LATIN SMALL LETTER A, LATIN SMALL LETTER B")
    );
}

#[test]
fn variable_weights() {
    let weights = parse_weights("[*0209.0020.0002][.0000.0111.0002]");
    assert_eq!(
        weights,
        vec![
            Weight::variable(0x0209, 0x0020, 0x0002),
            Weight::new(0x0000, 0x0111, 0x0002),
        ]
    );
    assert_eq!(weights[0].to_string(), "[*0209.0020.0002]");
}

#[test]
fn malformed_groups_are_skipped() {
    let weights = parse_weights("[.06D9.0020][.06EE.0020.0002][?06EE.0020.0002][.ZZZZ.0020.0002]");
    assert_eq!(weights, vec![Weight::new(0x06EE, 0x0020, 0x0002)]);
}

#[test]
fn unterminated_group_stops_parsing() {
    let weights = parse_weights("[.06D9.0020.0002][.06EE.0020");
    assert_eq!(weights, vec![Weight::new(0x06D9, 0x0020, 0x0002)]);
}

#[test]
fn at_most_eight_weights() {
    let text = "[.0001.0020.0002]".repeat(10);
    assert_eq!(parse_weights(&text).len(), MAX_WEIGHTS);
}

#[test]
fn records_without_weights_are_discarded() {
    assert_eq!(
        CollationElement::parse_line("0061 ; [.06D9.0020] # too short"),
        Some(Err(SkipReason::NoWeights))
    );
    assert_eq!(
        CollationElement::parse_line("0061 ; # no weights at all"),
        Some(Err(SkipReason::NoWeights))
    );
    assert_eq!(
        CollationElement::parse_line(" ; [.06D9.0020.0002]"),
        Some(Err(SkipReason::EmptyKey))
    );
    assert_eq!(CollationElement::parse_line("@version 15.1.0"), None);
}

#[test]
fn long_keys_are_rejected() {
    let nine = "0001 0002 0003 0004 0005 0006 0007 0008 0009 ; [.0001.0020.0002]";
    assert_eq!(
        CollationElement::parse_line(nine),
        Some(Err(SkipReason::KeyTooLong { found: 9 }))
    );

    let eight = CollationElement::parse_line("0001 0002 0003 0004 0005 0006 0007 0008 ; [.0001.0020.0002]")
        .expect("a record")
        .expect("valid");
    assert_eq!(eight.key.len(), MAX_KEY_LEN);
}

#[test]
fn keys_outside_the_code_space_are_rejected() {
    assert_eq!(
        CollationElement::parse_line("110000 ; [.0001.0020.0002]"),
        Some(Err(SkipReason::InvalidRange))
    );
    assert_eq!(
        CollationElement::parse_line("0061 110000 ; [.0001.0020.0002]"),
        Some(Err(SkipReason::InvalidRange))
    );
    assert!(matches!(
        CollationElement::parse_line("10FFFF ; [.0001.0020.0002]"),
        Some(Ok(_))
    ));
}

#[test]
fn quaternary_weights_are_ignored() {
    let element = CollationElement::parse_line("0030 ; [.1FA1.0020.0002.0030] # DIGIT ZERO")
        .expect("a record")
        .expect("valid");
    assert_eq!(element.weights, vec![Weight::new(0x1FA1, 0x0020, 0x0002)]);

    assert_eq!(
        parse_weights("[*0209.0020.0002.0020][.0000.0000.0000.0000]"),
        vec![
            Weight::variable(0x0209, 0x0020, 0x0002),
            Weight::new(0x0000, 0x0000, 0x0000),
        ]
    );
}
