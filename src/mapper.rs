//! Entity mapper: decodes an extracted `<EntityResults>` fragment into
//! typed records using each kind's declared shape.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::error::{DecodeError, FieldParseError, LookupFailure};
use crate::extract::RESULT_ELEMENT;
use crate::records::Record;

/// Local name of a per-record node.
pub const RECORD_ELEMENT: &[u8] = b"Entity";

/// Records of one kind returned by a single fetch, in server order.
///
/// Fields that failed to parse are left at their default value and
/// reported in `warnings`. Auxiliary lookups that failed while the main
/// fetch succeeded are reported in `lookup_failures`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSet<R> {
    /// Decoded records.
    pub records: Vec<R>,
    /// Per-field parse failures.
    pub warnings: Vec<FieldParseError>,
    /// Failed auxiliary fetches whose derived fields were left empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lookup_failures: Vec<LookupFailure>,
}

impl<R> RecordSet<R> {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if every field parsed cleanly and every lookup succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.lookup_failures.is_empty()
    }

    /// Drops the warnings and returns the records.
    #[must_use]
    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

impl<R> Default for RecordSet<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
            lookup_failures: Vec::new(),
        }
    }
}

impl<R> IntoIterator for RecordSet<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Field element currently being read.
struct OpenField {
    element: String,
    text: String,
}

/// Decodes a result fragment into records of kind `R`.
///
/// Direct children of the root named `Entity` become records; other
/// children, unknown field elements and nested sub-elements are skipped.
/// An empty field element leaves the field at its default.
///
/// # Errors
///
/// Returns `DecodeError` if the fragment is not well-formed XML, its root is
/// not `EntityResults`, or it ends before the root is closed.
pub fn decode<R: Record>(fragment: &[u8]) -> Result<RecordSet<R>, DecodeError> {
    let mut reader = Reader::from_reader(fragment);
    let mut set = RecordSet::default();

    let (root, self_closing) = read_root(&mut reader)?;
    check_root(&root)?;
    if self_closing {
        return Ok(set);
    }

    let mut depth = 1usize;
    let mut current: Option<R> = None;
    let mut field: Option<OpenField> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                depth += 1;
                if depth == 2 && e.local_name().as_ref() == RECORD_ELEMENT {
                    current = Some(R::default());
                } else if depth == 3 && current.is_some() {
                    field = Some(OpenField {
                        element: local_name(&e)?,
                        text: String::new(),
                    });
                }
            }
            Event::Empty(e) => {
                if depth == 1 && e.local_name().as_ref() == RECORD_ELEMENT {
                    set.records.push(R::default());
                }
            }
            Event::Text(t) if depth == 3 => {
                if let Some(open) = field.as_mut() {
                    open.text.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(c) if depth == 3 => {
                if let Some(open) = field.as_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if depth == 3 {
                    if let (Some(record), Some(open)) = (current.as_mut(), field.take()) {
                        apply_field(record, open, set.records.len(), &mut set.warnings);
                    }
                } else if depth == 2 {
                    if let Some(record) = current.take() {
                        set.records.push(record);
                    }
                }
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => return Err(DecodeError::UnexpectedEof),
            _ => {}
        }
    }

    tracing::debug!(
        kind = %R::KIND,
        records = set.records.len(),
        warnings = set.warnings.len(),
        "decoded result fragment"
    );
    Ok(set)
}

/// Skips the prolog and returns the root element and whether it is
/// self-closing.
fn read_root<'a>(reader: &mut Reader<&'a [u8]>) -> Result<(BytesStart<'a>, bool), DecodeError> {
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => return Ok((e, false)),
            Event::Empty(e) => return Ok((e, true)),
            Event::Eof => return Err(DecodeError::UnexpectedEof),
            _ => {}
        }
    }
}

fn check_root(root: &BytesStart<'_>) -> Result<(), DecodeError> {
    if root.local_name().as_ref() == RESULT_ELEMENT {
        Ok(())
    } else {
        Err(DecodeError::UnexpectedRoot {
            found: local_name(root)?,
        })
    }
}

fn apply_field<R: Record>(
    record: &mut R,
    open: OpenField,
    record_index: usize,
    warnings: &mut Vec<FieldParseError>,
) {
    if open.text.trim().is_empty() {
        return;
    }
    let Some(spec) = R::field_spec(&open.element) else {
        return;
    };
    if let Err(reason) = (spec.set)(record, &open.text) {
        let warning = FieldParseError {
            kind: R::KIND,
            record_index,
            element: open.element,
            value: open.text,
            reason,
        };
        tracing::warn!(
            kind = %warning.kind,
            record_index,
            element = %warning.element,
            value = %warning.value,
            reason = %warning.reason,
            "field left at default"
        );
        warnings.push(warning);
    }
}

fn local_name(e: &BytesStart<'_>) -> Result<String, DecodeError> {
    std::str::from_utf8(e.local_name().as_ref())
        .map(str::to_string)
        .map_err(xml_error)
}

fn xml_error(e: impl std::fmt::Display) -> DecodeError {
    DecodeError::Xml {
        message: e.to_string(),
    }
}
