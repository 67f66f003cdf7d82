//! Lexical primitives shared by every UCD record format: hexadecimal code
//! points and `start..end` ranges.
//!
//! These never fail.  Malformed text yields *some* value (non-hex characters
//! contribute zero bits), so callers that care must validate the result, for
//! example with [`Interval::is_valid`].

use crate::constants::RANGE_MARKER;
use crate::types::Interval;

/// Interpret `text` as an unsigned hexadecimal number.
///
/// Each character is one nibble; characters outside `[0-9A-Fa-f]` count as
/// zero.  Digits beyond the eighth shift earlier ones out.
pub fn parse_hex(text: &str) -> u32 {
    text.bytes().fold(0u32, |acc, byte| {
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'A'..=b'F' => byte - b'A' + 10,
            b'a'..=b'f' => byte - b'a' + 10,
            _ => 0,
        };
        acc.wrapping_shl(4) | nibble as u32
    })
}

/// Return the leading run of non-whitespace characters of `text`.
fn first_token(text: &str) -> &str {
    let end = text
        .find(|c: char| c.is_whitespace())
        .unwrap_or(text.len());
    &text[..end]
}

/// Parse a code point field: either `start..end` or a single code point.
///
/// Leading whitespace is skipped and anything after the (last) hex token is
/// ignored.
pub fn parse_range(text: &str) -> Interval {
    let text = text.trim_start();
    match text.find(RANGE_MARKER) {
        Some(marker) => {
            let start = parse_hex(text[..marker].trim_end());
            let rest = text[marker + RANGE_MARKER.len()..].trim_start();
            Interval::new(start, parse_hex(first_token(rest)))
        }
        None => Interval::single(parse_hex(first_token(text))),
    }
}

/// Parse a whitespace-separated list of hex code points, such as the key of a
/// collation record or a decomposition mapping.
pub fn parse_code_points(text: &str) -> impl Iterator<Item = u32> + '_ {
    text.split_whitespace().map(parse_hex)
}

#[test]
fn hex_digits() {
    assert_eq!(parse_hex("0041"), 0x41);
    assert_eq!(parse_hex("10FFFF"), 0x10FFFF);
    assert_eq!(parse_hex("abcd"), 0xABCD);
    assert_eq!(parse_hex(""), 0);
}

#[test]
fn hex_garbage_contributes_zero_nibbles() {
    assert_eq!(parse_hex("0G41"), 0x0041);
    assert_eq!(parse_hex("4Z"), 0x40);
    assert_eq!(parse_hex("??"), 0);
}

#[test]
fn ranges() {
    assert_eq!(parse_range("0041..005A"), Interval::new(0x41, 0x5A));
    assert_eq!(parse_range("0041"), Interval::new(0x41, 0x41));
    assert_eq!(parse_range("  1F1E6..1F1FF   "), Interval::new(0x1F1E6, 0x1F1FF));
    assert_eq!(parse_range("0041.. 005A junk"), Interval::new(0x41, 0x5A));
    assert_eq!(parse_range("0020 trailing"), Interval::single(0x20));
}

#[test]
fn garbled_range_still_yields_interval() {
    let interval = parse_range("..");
    assert_eq!(interval, Interval::new(0, 0));

    let interval = parse_range("xyz");
    assert_eq!(interval, Interval::single(0));
}

#[test]
fn code_point_lists() {
    let codes = parse_code_points(" 0061  0062 ").collect::<Vec<u32>>();
    assert_eq!(codes, vec![0x61, 0x62]);
}
