//! Splitting UCD lines into fields.
//!
//! Nearly every UCD file shares the format
//!
//! ```text
//! <field>; <field>; ... # <comment>
//! ```
//!
//! with whole-line `#` comments, blank lines and `@missing`-style directives
//! interspersed.

use std::io::BufRead;

use crate::constants::{COMMENT_MARKER, DIRECTIVE_MARKER, FIELD_SEPARATOR};
use crate::error::{LoadError, SkipReason};

/// One tokenized line: its trimmed fields and trailing comment, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<'a> {
    pub fields: Vec<&'a str>,
    pub annotation: Option<&'a str>,
}

impl<'a> Record<'a> {
    /// Tokenize `line`, or return `None` if it holds no record (blank line,
    /// comment or directive).
    pub fn parse(line: &'a str) -> Option<Record<'a>> {
        let trimmed = line.trim_start();
        if trimmed.is_empty()
            || trimmed.starts_with(COMMENT_MARKER)
            || trimmed.starts_with(DIRECTIVE_MARKER)
        {
            return None;
        }

        let (body, annotation) = match line.split_once(COMMENT_MARKER) {
            Some((body, comment)) => {
                let comment = comment.trim();
                (body, if comment.is_empty() { None } else { Some(comment) })
            }
            None => (line, None),
        };

        let fields = body.split(FIELD_SEPARATOR).map(str::trim).collect();
        Some(Record { fields, annotation })
    }

    /// Return field `index`, or `None` if the line was too short.
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied()
    }

    /// Check that at least `expected` fields are present.
    pub fn require(&self, expected: usize) -> Result<(), SkipReason> {
        if self.fields.len() < expected {
            Err(SkipReason::TooFewFields {
                expected,
                found: self.fields.len(),
            })
        } else {
            Ok(())
        }
    }
}

/// A line of input with its 1-based line number.
pub struct NumberedLine {
    pub number: usize,
    pub text: String,
}

/// Iterator over the lines of a UCD stream, numbering them for diagnostics.
pub struct Lines<R> {
    reader: R,
    number: usize,
}

impl<R: BufRead> Lines<R> {
    pub fn new(reader: R) -> Lines<R> {
        Lines { reader, number: 0 }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Result<NumberedLine, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut bytes = Vec::new();
        self.number += 1;
        match self.reader.read_until(b'\n', &mut bytes) {
            Ok(0) => None,
            Ok(_) => {
                // Bytes that are not UTF-8 (stray Latin-1 in a comment, say)
                // become U+FFFD rather than ending the stream.
                let text = String::from_utf8_lossy(&bytes);
                let text = text.trim_end_matches(['\n', '\r']).to_string();
                Some(Ok(NumberedLine {
                    number: self.number,
                    text,
                }))
            }
            Err(source) => Some(Err(LoadError::Read {
                line: self.number,
                source,
            })),
        }
    }
}

#[test]
fn skips_blank_comment_and_directive_lines() {
    assert_eq!(Record::parse(""), None);
    assert_eq!(Record::parse("   "), None);
    assert_eq!(Record::parse("# GraphemeBreakProperty-15.1.0.txt"), None);
    assert_eq!(Record::parse("# @missing: 0000..10FFFF; Other"), None);
    assert_eq!(Record::parse("@missing: 0000..10FFFF; Other"), None);
    assert_eq!(Record::parse("@version 15.1.0"), None);
}

#[test]
fn splits_fields_and_annotation() {
    let record = Record::parse("0600..0605    ; Prepend # Cf   [6] ARABIC NUMBER SIGN")
        .expect("record");
    assert_eq!(record.fields, vec!["0600..0605", "Prepend"]);
    assert_eq!(record.annotation, Some("Cf   [6] ARABIC NUMBER SIGN"));

    let record = Record::parse("0041; C; 0061; # LATIN CAPITAL LETTER A").expect("record");
    assert_eq!(record.fields, vec!["0041", "C", "0061", ""]);
    assert_eq!(record.field(2), Some("0061"));
    assert_eq!(record.field(4), None);
}

#[test]
fn empty_comment_is_no_annotation() {
    let record = Record::parse("0020 ; SPACE #   ").expect("record");
    assert_eq!(record.fields, vec!["0020", "SPACE"]);
    assert_eq!(record.annotation, None);
}

#[test]
fn too_few_fields_is_a_skip() {
    let record = Record::parse("0041").expect("record");
    assert_eq!(
        record.require(2),
        Err(SkipReason::TooFewFields {
            expected: 2,
            found: 1
        })
    );
    assert_eq!(record.require(1), Ok(()));
}

#[test]
fn numbers_lines() {
    let input = "# header\r\n0041 ; L\n\n0042 ; L";
    let lines = Lines::new(input.as_bytes())
        .map(|line| line.expect("in-memory read"))
        .map(|line| (line.number, line.text))
        .collect::<Vec<_>>();
    assert_eq!(
        lines,
        vec![
            (1, "# header".to_string()),
            (2, "0041 ; L".to_string()),
            (3, String::new()),
            (4, "0042 ; L".to_string()),
        ]
    );
}

#[test]
fn invalid_utf8_does_not_end_the_stream() {
    let input: &[u8] = b"0041 ; Upper\n0042 ; Upper # caf\xe9\n0043 ; Upper\n";
    let lines = Lines::new(input)
        .map(|line| line.expect("lossy read"))
        .collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1].text, "0042 ; Upper # caf\u{FFFD}");
    assert_eq!(lines[2].number, 3);

    let record = Record::parse(&lines[1].text).expect("record");
    assert_eq!(record.fields, vec!["0042", "Upper"]);
}
