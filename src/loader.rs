//! Building one [`PropertyTable`] from one UCD stream.
//!
//! A property is described by a [`PropertySpec`]: which fields hold the code
//! points and the value, how to decode the value, and what to do when two
//! records assign the same code point.  [`load`] reads the stream to the end
//! and returns the finished, read-only table along with a [`LoadReport`].
//!
//! Malformed records are skipped (and logged with their line number); only an
//! unreadable source or a full fixed-capacity table stops a load.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::collation::CollationElement;
use crate::constants::COLLATION_CAPACITY;
use crate::error::{LoadError, OverflowError, SkipReason};
use crate::expand::expand;
use crate::lexical::parse_range;
use crate::record::{Lines, Record};
use crate::table::{InsertPolicy, Inserted, PropertyTable};
use crate::types::CodePointKey;

/// Which `;`-separated fields of a record a loader reads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    /// Records with fewer fields are skipped.
    pub min_fields: usize,
    /// Field holding a code point or `start..end` range.
    pub key_field: usize,
    /// Field holding the raw property value.
    pub value_field: usize,
}

impl FieldLayout {
    /// The common `<range> ; <value>` layout.
    pub const RANGE_VALUE: FieldLayout = FieldLayout {
        min_fields: 2,
        key_field: 0,
        value_field: 1,
    };
}

/// How the table for a property is allocated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TableSizing {
    /// Exactly this many slots; running out is an error.
    Fixed(usize),
    /// Start with room for this many entries and grow as needed.
    Estimate(usize),
}

impl TableSizing {
    pub fn allocate<V>(self) -> PropertyTable<V> {
        match self {
            TableSizing::Fixed(capacity) => PropertyTable::with_capacity(capacity),
            TableSizing::Estimate(expected) => PropertyTable::sized_for(expected),
        }
    }
}

/// Accept only records whose `field` is one of `accepted`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecordFilter {
    pub field: usize,
    pub accepted: &'static [&'static str],
}

/// Maps a record to the stored value; `None` skips the record.
enum Decoder<V> {
    /// Reads only the layout's value field.
    Field(Box<dyn Fn(&str) -> Option<V> + Send + Sync>),
    /// Reads any fields of the record.
    Record(Box<dyn Fn(&Record<'_>) -> Option<V> + Send + Sync>),
}

/// Everything needed to load one property.
pub struct PropertySpec<V> {
    pub name: &'static str,
    pub layout: FieldLayout,
    decode: Decoder<V>,
    pub policy: InsertPolicy<V>,
    pub sizing: TableSizing,
    pub filter: Option<RecordFilter>,
}

impl<V> PropertySpec<V> {
    /// A spec with the `Overwrite` policy and a growable table.  `decode`
    /// receives the layout's value field.
    pub fn new<F>(name: &'static str, layout: FieldLayout, decode: F) -> PropertySpec<V>
    where
        F: Fn(&str) -> Option<V> + Send + Sync + 'static,
    {
        PropertySpec::with_decoder(name, layout, Decoder::Field(Box::new(decode)))
    }

    /// Like [`PropertySpec::new`], for values spread over several fields.
    /// `decode` receives the whole record; `layout.value_field` is unused.
    pub fn from_record<F>(name: &'static str, layout: FieldLayout, decode: F) -> PropertySpec<V>
    where
        F: Fn(&Record<'_>) -> Option<V> + Send + Sync + 'static,
    {
        PropertySpec::with_decoder(name, layout, Decoder::Record(Box::new(decode)))
    }

    fn with_decoder(name: &'static str, layout: FieldLayout, decode: Decoder<V>) -> PropertySpec<V> {
        PropertySpec {
            name,
            layout,
            decode,
            policy: InsertPolicy::Overwrite,
            sizing: TableSizing::Estimate(1024),
            filter: None,
        }
    }

    fn decode_value(&self, record: &Record<'_>) -> Option<V> {
        match &self.decode {
            Decoder::Field(decode) => record
                .field(self.layout.value_field)
                .and_then(|raw| decode(raw)),
            Decoder::Record(decode) => decode(record),
        }
    }

    pub fn policy(mut self, policy: InsertPolicy<V>) -> Self {
        self.policy = policy;
        self
    }

    pub fn sizing(mut self, sizing: TableSizing) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn filter(mut self, field: usize, accepted: &'static [&'static str]) -> Self {
        self.filter = Some(RecordFilter { field, accepted });
        self
    }

    /// Decode one record and insert it, expanding ranges.
    fn ingest(
        &self,
        record: &Record<'_>,
        table: &mut PropertyTable<V>,
    ) -> Result<Outcome, OverflowError>
    where
        V: Clone,
    {
        if let Err(reason) = record.require(self.layout.min_fields) {
            return Ok(Outcome::Skipped(reason));
        }
        if let Some(RecordFilter { field, accepted }) = self.filter {
            if !record.field(field).is_some_and(|value| accepted.contains(&value)) {
                return Ok(Outcome::Skipped(SkipReason::Filtered));
            }
        }

        let interval = match record.field(self.layout.key_field).map(parse_range) {
            Some(interval) if interval.is_valid() => interval,
            _ => return Ok(Outcome::Skipped(SkipReason::InvalidRange)),
        };
        let value = match self.decode_value(record) {
            Some(value) => value,
            None => return Ok(Outcome::Skipped(SkipReason::UnknownValue)),
        };

        let inserted = expand(interval, |_| value.clone(), self.policy, table)?;
        Ok(Outcome::Inserted(inserted))
    }
}

/// What happened to one record.
enum Outcome {
    Inserted(usize),
    Skipped(SkipReason),
}

/// Summary of one load, for logging and for tests to assert on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub property: String,
    pub source: String,
    /// Lines that held a record.
    pub records: usize,
    /// Code points whose entry was created or changed, counting every code
    /// point of a range.  Duplicates ignored under `KeepFirst` are not
    /// counted, in property and collation loads alike.
    pub inserted: usize,
    /// Records skipped as malformed, unrecognised or filtered.
    pub skipped: usize,
    /// Distinct keys in the finished table.
    pub entries: usize,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parsed {} {} entries from {}",
            self.inserted, self.property, self.source
        )
    }
}

/// A fully loaded property.  The table can no longer be modified.
pub struct LoadedProperty<V> {
    table: PropertyTable<V>,
    report: LoadReport,
}

impl<V> LoadedProperty<V> {
    pub fn lookup(&self, key: &CodePointKey) -> Option<&V> {
        self.table.lookup(key)
    }

    pub fn get(&self, code: u32) -> Option<&V> {
        self.table.get(code)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &PropertyTable<V> {
        &self.table
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}

/// Read `reader` to the end, handing each record to `ingest`.
fn run<V, R, F>(
    property: &str,
    source: &str,
    reader: R,
    mut table: PropertyTable<V>,
    mut ingest: F,
) -> Result<LoadedProperty<V>, LoadError>
where
    R: BufRead,
    F: FnMut(&Record<'_>, &mut PropertyTable<V>) -> Result<Outcome, OverflowError>,
{
    let _span = tracing::debug_span!("load", property, source).entered();
    let mut report = LoadReport {
        property: property.to_string(),
        source: source.to_string(),
        records: 0,
        inserted: 0,
        skipped: 0,
        entries: 0,
    };

    for line in Lines::new(reader) {
        let line = line?;
        let Some(record) = Record::parse(&line.text) else {
            continue;
        };
        report.records += 1;

        match ingest(&record, &mut table) {
            Ok(Outcome::Inserted(count)) => report.inserted += count,
            Ok(Outcome::Skipped(reason)) => {
                report.skipped += 1;
                debug!(line = line.number, text = %line.text, "skipped record: {reason}");
            }
            Err(source) => {
                warn!(line = line.number, "{source}");
                return Err(LoadError::Overflow {
                    line: line.number,
                    source,
                });
            }
        }
    }

    report.entries = table.len();
    info!("{report}");
    Ok(LoadedProperty { table, report })
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Load the property described by `spec` from `reader`.  `source` names the
/// input in the report and in log messages.
pub fn load<V, R>(
    spec: &PropertySpec<V>,
    reader: R,
    source: &str,
) -> Result<LoadedProperty<V>, LoadError>
where
    V: Clone,
    R: BufRead,
{
    run(spec.name, source, reader, spec.sizing.allocate(), |record, table| {
        spec.ingest(record, table)
    })
}

/// Add the records of another file to an already loaded property.
///
/// Some properties are assembled from more than one file, such as grapheme
/// breaks with Extended_Pictographic from `emoji-data.txt`.  `base` is
/// consumed, its table is filled further under `spec`, and the counts of
/// both loads are summed in the returned report.
pub fn load_supplement<V, R>(
    base: LoadedProperty<V>,
    spec: &PropertySpec<V>,
    reader: R,
    source: &str,
) -> Result<LoadedProperty<V>, LoadError>
where
    V: Clone,
    R: BufRead,
{
    let LoadedProperty { table, report: base_report } = base;
    let supplement = run(spec.name, source, reader, table, |record, table| {
        spec.ingest(record, table)
    })?;
    let report = LoadReport {
        property: base_report.property,
        source: format!("{}, {}", base_report.source, supplement.report.source),
        records: base_report.records + supplement.report.records,
        inserted: base_report.inserted + supplement.report.inserted,
        skipped: base_report.skipped + supplement.report.skipped,
        entries: supplement.report.entries,
    };
    Ok(LoadedProperty {
        table: supplement.table,
        report,
    })
}

/// Load the property described by `spec` from the file at `path`.  No table
/// is allocated if the file cannot be opened.
pub fn load_file<V: Clone>(
    spec: &PropertySpec<V>,
    path: impl AsRef<Path>,
) -> Result<LoadedProperty<V>, LoadError> {
    let path = path.as_ref();
    let reader = open(path)?;
    load(spec, reader, &path.display().to_string())
}

/// Load a collation element table in `allkeys.txt` format.  Later records for
/// an already-present key are ignored.
pub fn load_collation<R: BufRead>(
    reader: R,
    source: &str,
    sizing: TableSizing,
) -> Result<LoadedProperty<CollationElement>, LoadError> {
    run("collation", source, reader, sizing.allocate(), |record, table| {
        let element = match CollationElement::from_record(record) {
            Ok(element) => element,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };
        let key = element.key;
        Ok(match table.insert(key, element, InsertPolicy::KeepFirst)? {
            Inserted::Kept => {
                debug!(%key, "duplicate collation key; keeping first entry");
                Outcome::Inserted(0)
            }
            _ => Outcome::Inserted(1),
        })
    })
}

/// Load `allkeys.txt` from `path` into a fixed table of
/// [`COLLATION_CAPACITY`] slots.
pub fn load_collation_file(
    path: impl AsRef<Path>,
) -> Result<LoadedProperty<CollationElement>, LoadError> {
    let path = path.as_ref();
    let reader = open(path)?;
    load_collation(
        reader,
        &path.display().to_string(),
        TableSizing::Fixed(COLLATION_CAPACITY),
    )
}

#[cfg(test)]
use crate::collation::Weight;

#[cfg(test)]
static ALLKEYS_TXT: &str = include_str!("data/allkeys.txt");

#[cfg(test)]
fn letters() -> PropertySpec<u8> {
    PropertySpec::new("letter", FieldLayout::RANGE_VALUE, |value| match value {
        "Upper" => Some(1),
        "Lower" => Some(2),
        _ => None,
    })
}

#[test]
fn loads_ranges_and_reports() {
    let input = "\
# Letters.txt
@missing: 0000..10FFFF; Other

0041..005A    ; Upper # Lu  [26] LATIN CAPITAL LETTER A..LATIN CAPITAL LETTER Z
0061..007A    ; Lower
00AA          ; Mystery
00B5
";
    let loaded = load(&letters(), input.as_bytes(), "Letters.txt").expect("loads");
    let report = loaded.report();

    assert_eq!(report.records, 4);
    assert_eq!(report.inserted, 52);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.entries, 52);
    assert_eq!(loaded.len(), 52);
    assert_eq!(report.to_string(), "parsed 52 letter entries from Letters.txt");

    assert_eq!(loaded.get('Q' as u32), Some(&1));
    assert_eq!(loaded.get('q' as u32), Some(&2));
    assert_eq!(loaded.get(0xAA), None);
    assert_eq!(loaded.get(0xB5), None);
}

#[test]
fn record_decoders_read_several_fields() {
    let spec = PropertySpec::from_record(
        "pairs",
        FieldLayout {
            min_fields: 3,
            key_field: 0,
            value_field: 1,
        },
        |record| {
            let pair = crate::lexical::parse_hex(record.field(1)?);
            let open = match record.field(2)? {
                "o" => true,
                "c" => false,
                _ => return None,
            };
            Some((pair, open))
        },
    );
    let input = "0028; 0029; o # LEFT PARENTHESIS\n0029; 0028; c\n005B; 005D; x\n";
    let loaded = load(&spec, input.as_bytes(), "inline").expect("loads");
    assert_eq!(loaded.get(0x28), Some(&(0x29, true)));
    assert_eq!(loaded.get(0x29), Some(&(0x28, false)));
    assert_eq!(loaded.get(0x5B), None);
    assert_eq!(loaded.report().skipped, 1);
}

#[test]
fn supplements_fill_the_same_table() {
    let base = load(&letters(), "0041..0043 ; Upper\n".as_bytes(), "Upper.txt").expect("loads");
    let extra = letters().policy(InsertPolicy::KeepFirst);
    let input = "0043..0045 ; Lower\n00AA ; Mystery\n";
    let loaded = load_supplement(base, &extra, input.as_bytes(), "Lower.txt").expect("loads");

    assert_eq!(loaded.get(0x43), Some(&1), "the first file wins");
    assert_eq!(loaded.get(0x45), Some(&2));
    let report = loaded.report();
    assert_eq!(report.property, "letter");
    assert_eq!(report.source, "Upper.txt, Lower.txt");
    assert_eq!(report.records, 3);
    assert_eq!(report.inserted, 5);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.entries, 5);
}

#[test]
fn invalid_ranges_are_skipped() {
    let input = "005A..0041 ; Upper\n110000 ; Upper\n0041 ; Upper\n";
    let loaded = load(&letters(), input.as_bytes(), "inline").expect("loads");
    assert_eq!(loaded.report().skipped, 2);
    assert_eq!(loaded.len(), 1);
}

#[test]
fn filter_selects_records() {
    let spec = PropertySpec::new(
        "folding",
        FieldLayout {
            min_fields: 3,
            key_field: 0,
            value_field: 2,
        },
        |value| Some(crate::lexical::parse_hex(value)),
    )
    .filter(1, &["C", "S"]);

    let input = "0041; C; 0061; # A\n00DF; F; 0073 0073; # SHARP S\n1E9E; S; 00DF; # CAPITAL SHARP S\n";
    let loaded = load(&spec, input.as_bytes(), "CaseFolding.txt").expect("loads");
    assert_eq!(loaded.get(0x41), Some(&0x61));
    assert_eq!(loaded.get(0xDF), None);
    assert_eq!(loaded.get(0x1E9E), Some(&0xDF));
    assert_eq!(loaded.report().skipped, 1);
}

#[test]
fn overflow_is_reported() {
    let spec = letters().sizing(TableSizing::Fixed(10));
    let input = "0041..005A ; Upper\n";
    match load(&spec, input.as_bytes(), "inline") {
        Err(LoadError::Overflow { line, source }) => {
            assert_eq!(line, 1);
            assert_eq!(source.capacity, 10);
        }
        other => panic!("expected overflow, got {:?}", other.map(|loaded| loaded.len())),
    }
}

#[test]
fn missing_file_is_source_unavailable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("NoSuchFile.txt");
    match load_file(&letters(), &path) {
        Err(LoadError::SourceUnavailable { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected missing source, got {:?}", other.map(|loaded| loaded.len())),
    }
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("Letters.txt");
    std::fs::write(&path, "0041..0043 ; Upper\n").expect("write fixture");
    let loaded = load_file(&letters(), &path).expect("loads");
    assert_eq!(loaded.len(), 3);
    assert!(loaded.report().source.ends_with("Letters.txt"));
}

#[test]
fn kept_duplicates_are_not_counted() {
    let spec = letters().policy(InsertPolicy::KeepFirst);
    let input = "0041 ; Upper\n0041 ; Lower\n0041..0043 ; Lower\n";
    let loaded = load(&spec, input.as_bytes(), "inline").expect("loads");
    let report = loaded.report();
    assert_eq!(report.records, 3);
    assert_eq!(report.inserted, 3);
    assert_eq!(report.entries, 3);
    assert_eq!(report.to_string(), "parsed 3 letter entries from inline");
    assert_eq!(loaded.get(0x41), Some(&1));

    // Overwrites and merges change the table and are counted.
    let input = "0041 ; Upper\n0041 ; Lower\n";
    let loaded = load(&letters(), input.as_bytes(), "inline").expect("loads");
    assert_eq!(loaded.report().inserted, 2);
    assert_eq!(loaded.report().entries, 1);
}

#[test]
fn stray_bytes_do_not_stop_a_load() {
    let input: &[u8] = b"0041 ; Upper\n0042 ; Upper # caf\xe9\n0061 ; Lower\n";
    let loaded = load(&letters(), input, "inline").expect("loads");
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.get(0x42), Some(&1));
    assert_eq!(loaded.report().skipped, 0);
}

#[test]
fn collation_keys_outside_the_code_space_are_skipped() {
    let input = "110000 ; [.0001.0020.0002]\n0061 ; [.2075.0020.0002]\n";
    let loaded = load_collation(input.as_bytes(), "inline", TableSizing::Fixed(8)).expect("loads");
    assert_eq!(loaded.report().skipped, 1);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get(0x110000), None);
}

#[test]
fn collation_table() {
    let _ = tracing_subscriber::fmt::try_init();
    let loaded = load_collation(ALLKEYS_TXT.as_bytes(), "allkeys.txt", TableSizing::Fixed(64))
        .expect("loads");
    let report = loaded.report();

    // Two malformed records, and one duplicate of U+0061 that is ignored.
    assert_eq!(report.skipped, 2);
    assert_eq!(report.inserted, 9);
    assert_eq!(loaded.len(), 9);

    let ab = CodePointKey::from_slice(&[0x61, 0x62]).expect("key");
    let element = loaded.lookup(&ab).expect("contraction present");
    assert_eq!(
        element.weights,
        vec![
            Weight::new(0x06D9, 0x0020, 0x0002),
            Weight::new(0x06EE, 0x0020, 0x0002),
        ]
    );

    let a = loaded.get(0x61).expect("U+0061");
    assert_eq!(a.weights, vec![Weight::new(0x2075, 0x0020, 0x0002)]);
    assert_eq!(a.comment.as_deref(), Some("LATIN SMALL LETTER A"));

    let space = loaded.get(0x20).expect("U+0020");
    assert!(space.weights[0].variable);

    assert_eq!(loaded.get(0x0000).map(|element| element.weights.len()), Some(1));
    assert_eq!(loaded.get(0x7A), None, "the malformed U+007A record is discarded");
}

#[test]
fn collation_skip_does_not_count() {
    let input = "0061 ; [.2075.0020.0002]\n0062 ; [.2076.0020]\n";
    let loaded =
        load_collation(input.as_bytes(), "inline", TableSizing::Fixed(8)).expect("loads");
    assert_eq!(loaded.report().inserted, 1);
    assert_eq!(loaded.len(), 1);
}
