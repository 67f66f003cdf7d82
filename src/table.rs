//! An open-addressing hash table keyed by short code point sequences.
//!
//! Every property loaded by this crate ends up in a [`PropertyTable`].  Slots
//! are probed linearly from `xxh3(key) % capacity`, wrapping at the end.  Each
//! slot is explicitly tagged as empty or occupied, so U+0000 and a value of
//! zero are ordinary entries rather than "absent".
//!
//! A table is either *fixed*, in which case filling it is an
//! [`OverflowError`], or *growable*, in which case it doubles (and rehashes
//! every entry) before occupancy would exceed
//! `LOAD_NUMERATOR / LOAD_DENOMINATOR` of its slots.

use std::fmt;
use std::ops::BitOrAssign;

use xxhash_rust::xxh3::xxh3_64;

use crate::constants::{LOAD_DENOMINATOR, LOAD_NUMERATOR};
use crate::error::OverflowError;
use crate::types::CodePointKey;

/// What to do when an inserted key is already present.
pub enum InsertPolicy<V> {
    /// Replace the stored value: later data wins.
    Overwrite,
    /// Leave the stored value alone: earlier data wins.
    KeepFirst,
    /// Combine the incoming value into the stored one.
    Merge(fn(&mut V, V)),
}

impl<V: BitOrAssign> InsertPolicy<V> {
    /// Bitwise-OR the incoming value into the stored one, for properties that
    /// are a set of flags per code point.
    pub fn merge_bits() -> InsertPolicy<V> {
        InsertPolicy::Merge(|stored: &mut V, incoming: V| *stored |= incoming)
    }
}

impl<V> Clone for InsertPolicy<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for InsertPolicy<V> {}

impl<V> fmt::Debug for InsertPolicy<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InsertPolicy::Overwrite => "Overwrite",
            InsertPolicy::KeepFirst => "KeepFirst",
            InsertPolicy::Merge(_) => "Merge",
        })
    }
}

/// The effect of a successful insert.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Inserted {
    /// The key was not present; a new entry was created.
    Fresh,
    /// The key was present and its value replaced.
    Replaced,
    /// The key was present and the incoming value merged into it.
    Merged,
    /// The key was present and the incoming value discarded.
    Kept,
}

/// How a table reacts to running out of slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Growth {
    Fixed,
    Double,
}

#[derive(Clone, Debug)]
enum Slot<V> {
    Empty,
    Occupied { key: CodePointKey, value: V },
}

/// A table from [`CodePointKey`] to `V`.
#[derive(Clone)]
pub struct PropertyTable<V> {
    slots: Vec<Slot<V>>,
    len: usize,
    growth: Growth,
}

fn hash(key: &CodePointKey) -> u64 {
    let (bytes, len) = key.hash_bytes();
    xxh3_64(&bytes[..len])
}

fn empty_slots<V>(capacity: usize) -> Vec<Slot<V>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || Slot::Empty);
    slots
}

impl<V> PropertyTable<V> {
    /// A table of exactly `capacity` slots that never grows.  A capacity of
    /// zero is treated as one.
    pub fn with_capacity(capacity: usize) -> PropertyTable<V> {
        PropertyTable {
            slots: empty_slots(capacity.max(1)),
            len: 0,
            growth: Growth::Fixed,
        }
    }

    /// A growable table with room for `expected` entries before its first
    /// resize.
    pub fn sized_for(expected: usize) -> PropertyTable<V> {
        let capacity = (expected * LOAD_DENOMINATOR / LOAD_NUMERATOR + 1).next_power_of_two();
        PropertyTable {
            slots: empty_slots(capacity),
            len: 0,
            growth: Growth::Double,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    /// The slot at which probing for `key` starts.
    pub fn home_slot(&self, key: &CodePointKey) -> usize {
        (hash(key) % self.slots.len() as u64) as usize
    }

    /// Look up `key`, returning `None` if it was never inserted.
    pub fn lookup(&self, key: &CodePointKey) -> Option<&V> {
        let start = self.home_slot(key);
        let mut index = start;
        loop {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied { key: stored, value } if stored == key => return Some(value),
                Slot::Occupied { .. } => {}
            }
            index = (index + 1) % self.slots.len();
            if index == start {
                return None;
            }
        }
    }

    /// Look up a single code point.
    pub fn get(&self, code: u32) -> Option<&V> {
        self.lookup(&CodePointKey::single(code))
    }

    pub fn contains(&self, key: &CodePointKey) -> bool {
        self.lookup(key).is_some()
    }

    /// Insert `value` under `key`, resolving an existing entry with `policy`.
    ///
    /// Either the table is updated or an error is returned; there is no
    /// partial insert.
    pub fn insert(
        &mut self,
        key: CodePointKey,
        value: V,
        policy: InsertPolicy<V>,
    ) -> Result<Inserted, OverflowError> {
        if self.growth == Growth::Double
            && (self.len + 1) * LOAD_DENOMINATOR > self.slots.len() * LOAD_NUMERATOR
        {
            self.grow();
        }

        let capacity = self.slots.len();
        let start = self.home_slot(&key);
        let mut index = start;
        loop {
            if let Slot::Empty = self.slots[index] {
                self.slots[index] = Slot::Occupied { key, value };
                self.len += 1;
                return Ok(Inserted::Fresh);
            }
            if let Slot::Occupied {
                key: stored_key,
                value: stored,
            } = &mut self.slots[index]
            {
                if *stored_key == key {
                    return Ok(match policy {
                        InsertPolicy::Overwrite => {
                            *stored = value;
                            Inserted::Replaced
                        }
                        InsertPolicy::KeepFirst => Inserted::Kept,
                        InsertPolicy::Merge(merge) => {
                            merge(stored, value);
                            Inserted::Merged
                        }
                    });
                }
            }
            index = (index + 1) % capacity;
            if index == start {
                return Err(OverflowError { capacity, key });
            }
        }
    }

    /// Double the slot array and reinsert every entry.
    fn grow(&mut self) {
        let capacity = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, empty_slots(capacity));
        for slot in old {
            if let Slot::Occupied { key, value } = slot {
                let mut index = self.home_slot(&key);
                while let Slot::Occupied { .. } = self.slots[index] {
                    index = (index + 1) % capacity;
                }
                self.slots[index] = Slot::Occupied { key, value };
            }
        }
    }

    /// Iterate over all entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&CodePointKey, &V)> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { key, value } => Some((key, value)),
            Slot::Empty => None,
        })
    }
}

impl<V: fmt::Debug> fmt::Debug for PropertyTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
fn key(code: u32) -> CodePointKey {
    CodePointKey::single(code)
}

#[test]
fn lookup_after_insert() {
    let mut table = PropertyTable::with_capacity(64);
    for code in [0x0u32, 0x41, 0x10FFFF, 0x1F600] {
        let outcome = table
            .insert(key(code), code + 1, InsertPolicy::Overwrite)
            .expect("room");
        assert_eq!(outcome, Inserted::Fresh);
        assert_eq!(table.lookup(&key(code)), Some(&(code + 1)));
    }
    assert_eq!(table.len(), 4);
}

#[test]
fn never_inserted_is_not_found() {
    let mut table = PropertyTable::with_capacity(16);
    table
        .insert(key(0x41), 1u8, InsertPolicy::Overwrite)
        .expect("room");
    assert_eq!(table.lookup(&key(0x42)), None);
    assert_eq!(table.lookup(&CodePointKey::from_slice(&[0x41, 0x41]).expect("key")), None);
}

#[test]
fn zero_key_and_zero_value_are_entries() {
    let mut table = PropertyTable::with_capacity(8);
    assert_eq!(table.get(0), None);
    table
        .insert(key(0), 0u32, InsertPolicy::Overwrite)
        .expect("room");
    assert_eq!(table.get(0), Some(&0));
    assert_eq!(table.len(), 1);
}

#[test]
fn overwrite_replaces() {
    let mut table = PropertyTable::with_capacity(8);
    table.insert(key(0x41), 1u8, InsertPolicy::Overwrite).expect("room");
    let outcome = table.insert(key(0x41), 2u8, InsertPolicy::Overwrite).expect("room");
    assert_eq!(outcome, Inserted::Replaced);
    assert_eq!(table.get(0x41), Some(&2));
    assert_eq!(table.len(), 1);
}

#[test]
fn merge_bits_ors_every_value() {
    let mut table = PropertyTable::with_capacity(8);
    for bits in [0b0001u32, 0b0100, 0b0001, 0b1000] {
        table
            .insert(key(0x20), bits, InsertPolicy::merge_bits())
            .expect("room");
    }
    assert_eq!(table.get(0x20), Some(&0b1101));
    assert_eq!(table.len(), 1);
}

#[test]
fn keep_first_ignores_later_values() {
    let mut table = PropertyTable::with_capacity(8);
    table.insert(key(0x41), "first", InsertPolicy::KeepFirst).expect("room");
    let outcome = table.insert(key(0x41), "second", InsertPolicy::KeepFirst).expect("room");
    assert_eq!(outcome, Inserted::Kept);
    assert_eq!(table.get(0x41), Some(&"first"));
}

#[test]
fn overflow_on_capacity_plus_one() {
    const CAPACITY: usize = 16;
    let mut table = PropertyTable::with_capacity(CAPACITY);
    for code in 0..CAPACITY as u32 {
        table.insert(key(code), code, InsertPolicy::Overwrite).expect("room");
    }

    let error = table
        .insert(key(0x1000), 0xDEAD, InsertPolicy::Overwrite)
        .expect_err("table is full");
    assert_eq!(
        error,
        OverflowError {
            capacity: CAPACITY,
            key: key(0x1000)
        }
    );

    // Nothing was corrupted, and existing keys can still be updated.
    for code in 0..CAPACITY as u32 {
        assert_eq!(table.get(code), Some(&code));
    }
    assert_eq!(table.get(0x1000), None);
    table.insert(key(3), 33, InsertPolicy::Overwrite).expect("existing key");
    assert_eq!(table.get(3), Some(&33));
}

#[test]
fn probe_start_is_independent_of_other_keys() {
    let mut a = PropertyTable::<u8>::with_capacity(97);
    let b = PropertyTable::<u8>::with_capacity(97);
    for code in 0..50 {
        a.insert(key(code), 0, InsertPolicy::Overwrite).expect("room");
    }
    for code in 0..200 {
        assert_eq!(a.home_slot(&key(code)), b.home_slot(&key(code)));
    }
}

#[test]
fn growable_table_rehashes() {
    let mut table = PropertyTable::sized_for(4);
    let initial = table.capacity();
    for code in 0..1000u32 {
        table.insert(key(code), code * 2, InsertPolicy::Overwrite).expect("grows");
    }
    assert!(table.capacity() > initial);
    assert!(table.len() * LOAD_DENOMINATOR <= table.capacity() * LOAD_NUMERATOR);
    for code in 0..1000u32 {
        assert_eq!(table.get(code), Some(&(code * 2)));
    }
}

#[test]
fn multi_code_point_keys() {
    let ab = CodePointKey::from_slice(&[0x61, 0x62]).expect("key");
    let ba = CodePointKey::from_slice(&[0x62, 0x61]).expect("key");
    let mut table = PropertyTable::with_capacity(8);
    table.insert(ab, 1u8, InsertPolicy::KeepFirst).expect("room");
    table.insert(key(0x61), 2u8, InsertPolicy::KeepFirst).expect("room");
    assert_eq!(table.lookup(&ab), Some(&1));
    assert_eq!(table.lookup(&ba), None);
    assert_eq!(table.get(0x61), Some(&2));
}
