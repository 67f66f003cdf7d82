//! Turning code point ranges into per-code-point table entries.

use crate::error::OverflowError;
use crate::table::{InsertPolicy, Inserted, PropertyTable};
use crate::types::{CodePointKey, Interval};

/// Insert `decode(code)` for every code point in `interval`, resolving
/// existing entries with `policy`.
///
/// Returns the number of code points whose entry was created or changed; a
/// code point left alone under [`InsertPolicy::KeepFirst`] is not counted.
/// On overflow the inserts already made remain in the table and the error is
/// returned; an inverted interval inserts nothing.
pub fn expand<V, F>(
    interval: Interval,
    mut decode: F,
    policy: InsertPolicy<V>,
    table: &mut PropertyTable<V>,
) -> Result<usize, OverflowError>
where
    F: FnMut(u32) -> V,
{
    let mut inserted = 0;
    for code in interval.iter() {
        match table.insert(CodePointKey::single(code), decode(code), policy)? {
            Inserted::Kept => {}
            Inserted::Fresh | Inserted::Replaced | Inserted::Merged => inserted += 1,
        }
    }
    Ok(inserted)
}

#[test]
fn expands_each_code_point() {
    let mut table = PropertyTable::with_capacity(16);
    let inserted = expand(
        Interval::new(0x41, 0x43),
        |code| code - 0x40,
        InsertPolicy::Overwrite,
        &mut table,
    )
    .expect("room");

    assert_eq!(inserted, 3);
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(0x41), Some(&1));
    assert_eq!(table.get(0x42), Some(&2));
    assert_eq!(table.get(0x43), Some(&3));
    assert_eq!(table.get(0x44), None);
}

#[test]
fn overlapping_ranges_follow_policy() {
    let mut flags = PropertyTable::with_capacity(16);
    expand(Interval::new(0x20, 0x22), |_| 0b01u8, InsertPolicy::merge_bits(), &mut flags)
        .expect("room");
    expand(Interval::new(0x21, 0x23), |_| 0b10u8, InsertPolicy::merge_bits(), &mut flags)
        .expect("room");
    assert_eq!(flags.get(0x20), Some(&0b01));
    assert_eq!(flags.get(0x21), Some(&0b11));
    assert_eq!(flags.get(0x23), Some(&0b10));

    let mut first = PropertyTable::with_capacity(16);
    expand(Interval::new(0x20, 0x22), |_| 'a', InsertPolicy::KeepFirst, &mut first).expect("room");
    let inserted = expand(Interval::new(0x21, 0x23), |_| 'b', InsertPolicy::KeepFirst, &mut first)
        .expect("room");
    assert_eq!(inserted, 1, "only U+0023 was new");
    assert_eq!(first.get(0x21), Some(&'a'));
    assert_eq!(first.get(0x23), Some(&'b'));
}

#[test]
fn inverted_interval_inserts_nothing() {
    let mut table = PropertyTable::<u32>::with_capacity(4);
    let inserted = expand(Interval::new(5, 1), |code| code, InsertPolicy::Overwrite, &mut table)
        .expect("nothing to insert");
    assert_eq!(inserted, 0);
    assert!(table.is_empty());
}

#[test]
fn overflow_stops_expansion() {
    let mut table = PropertyTable::with_capacity(4);
    let error = expand(Interval::new(0, 9), |code| code, InsertPolicy::Overwrite, &mut table)
        .expect_err("only four slots");
    assert_eq!(error.capacity, 4);
    assert_eq!(table.len(), 4);
}
