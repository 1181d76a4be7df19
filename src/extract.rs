//! Result extraction from the SOAP response.
//!
//! The service nests `<EntityResults>` under transport-specific wrappers
//! (`Envelope/Body/queryResponse/queryResult`). The extractor finds the
//! first such element in document order, drops its ancestry and
//! re-serializes it as a standalone fragment so the mapper never sees the
//! envelope.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::{AtwsError, AtwsResult};

/// Local name of the result-bearing element.
pub const RESULT_ELEMENT: &[u8] = b"EntityResults";

/// Elements whose text explains why a response has no results.
const FAULT_ELEMENTS: [&[u8]; 2] = [b"faultstring", b"Message"];

/// Isolates the first `<EntityResults>` subtree of a response.
///
/// The returned bytes contain no XML declaration; the located element is
/// the root. Extracting from already extracted output yields the same bytes.
///
/// # Errors
///
/// Returns `MalformedResponse` when the response is not well-formed XML
/// or contains no `EntityResults` element. A SOAP fault or service error
/// message, if present, is included in the reason.
pub fn extract(response: &[u8]) -> AtwsResult<Vec<u8>> {
    let mut reader = Reader::from_reader(response);
    let mut fault: Option<String> = None;
    let mut capture_fault = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AtwsError::malformed(format!("response is not valid XML: {e}")))?;
        match event {
            Event::Start(e) if e.local_name().as_ref() == RESULT_ELEMENT => {
                return copy_subtree(&mut reader, Event::Start(e));
            }
            Event::Empty(e) if e.local_name().as_ref() == RESULT_ELEMENT => {
                return write_events([Event::Empty(e)]);
            }
            Event::Start(e) => {
                capture_fault = fault.is_none() && FAULT_ELEMENTS.contains(&e.local_name().as_ref());
            }
            Event::Text(t) if capture_fault => {
                let text = t.unescape().map_err(|e| AtwsError::malformed(e.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    fault = Some(text.to_string());
                }
                capture_fault = false;
            }
            Event::End(_) => capture_fault = false,
            Event::Eof => break,
            _ => {}
        }
    }

    Err(AtwsError::malformed(match fault {
        Some(message) => format!("no <EntityResults> element (service reported: {message})"),
        None => "no <EntityResults> element".to_string(),
    }))
}

fn copy_subtree(reader: &mut Reader<&[u8]>, start: Event<'_>) -> AtwsResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    write(&mut writer, start)?;
    let mut depth = 1usize;

    while depth > 0 {
        let event = reader
            .read_event()
            .map_err(|e| AtwsError::malformed(format!("response is not valid XML: {e}")))?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(AtwsError::malformed(
                    "response ended inside <EntityResults>",
                ));
            }
            _ => {}
        }
        write(&mut writer, event)?;
    }

    Ok(writer.into_inner())
}

fn write_events<'a>(events: impl IntoIterator<Item = Event<'a>>) -> AtwsResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    for event in events {
        write(&mut writer, event)?;
    }
    Ok(writer.into_inner())
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> AtwsResult<()> {
    writer
        .write_event(event)
        .map_err(|e| AtwsError::internal(format!("re-serialize result fragment: {e}")))
}
