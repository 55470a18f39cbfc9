//! XML text extraction.
//!
//! Streams the document with `quick-xml` and keeps only text, CDATA and references,
//! so arbitrarily large feeds are processed in constant memory.

use crate::error::{FetchtextError, Result};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};

/// Concatenate the text nodes of an XML document, separated by single spaces.
///
/// Entity and character references are resolved in place and joined to the
/// surrounding text. Parsing is lenient about mismatched end tags.
pub fn xml_to_text(xml_bytes: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().check_end_names = false;

    let mut pieces: Vec<String> = Vec::new();
    let mut run = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => run.push_str(&String::from_utf8_lossy(e.as_ref())),
            Ok(Event::CData(e)) => run.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => push_reference(&mut run, &e),
            Ok(Event::Start(_) | Event::End(_) | Event::Empty(_)) => flush(&mut run, &mut pieces),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FetchtextError::extraction(format!(
                    "XML parsing error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }
    flush(&mut run, &mut pieces);

    Ok(pieces.join(" "))
}

fn flush(run: &mut String, pieces: &mut Vec<String>) {
    let trimmed = run.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
    run.clear();
}

/// Unknown entities are kept verbatim.
fn push_reference(run: &mut String, reference: &BytesRef<'_>) {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        run.push(ch);
        return;
    }
    let name = String::from_utf8_lossy(reference.as_ref());
    match resolve_predefined_entity(&name) {
        Some(resolved) => run.push_str(resolved),
        None => {
            run.push('&');
            run.push_str(&name);
            run.push(';');
        }
    }
}
