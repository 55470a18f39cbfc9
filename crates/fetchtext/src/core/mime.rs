//! MIME type sniffing for fetched document bytes.
//!
//! Remote servers frequently mislabel content, and embedded sources carry no
//! type at all, so the type is always detected from the bytes themselves:
//! byte-order marks first, then magic numbers (`infer`), then markup and text
//! heuristics.

use encoding_rs::Encoding;

pub const HTML_MIME_TYPE: &str = "text/html";
pub const XML_MIME_TYPE: &str = "application/xml";
pub const XML_TEXT_MIME_TYPE: &str = "text/xml";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const JSON_MIME_TYPE: &str = "application/json";
pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";

const SNIFF_LEN: usize = 8 * 1024;

/// Detect the MIME type of a document from its leading bytes.
///
/// # Example
///
/// ```rust
/// use fetchtext::core::mime::{HTML_MIME_TYPE, PLAIN_TEXT_MIME_TYPE, detect_mime_type_from_bytes};
///
/// assert_eq!(detect_mime_type_from_bytes(b"<html><body>Hi</body></html>"), HTML_MIME_TYPE);
/// assert_eq!(detect_mime_type_from_bytes(b"just words"), PLAIN_TEXT_MIME_TYPE);
/// ```
pub fn detect_mime_type_from_bytes(content: &[u8]) -> &'static str {
    if content.is_empty() {
        return PLAIN_TEXT_MIME_TYPE;
    }

    let head = &content[..content.len().min(SNIFF_LEN)];

    // UTF-16 text is full of NUL bytes, so a BOM has to win over the binary check.
    if let Some((encoding, bom_len)) = Encoding::for_bom(head) {
        let (decoded, _) = encoding.decode_without_bom_handling(&head[bom_len..]);
        return classify_text(&decoded);
    }

    if let Some(kind) = infer::get(content) {
        return match kind.mime_type() {
            HTML_MIME_TYPE => HTML_MIME_TYPE,
            XML_MIME_TYPE | XML_TEXT_MIME_TYPE => XML_MIME_TYPE,
            other => other,
        };
    }

    if !looks_like_text(head) {
        return OCTET_STREAM_MIME_TYPE;
    }

    classify_text(&String::from_utf8_lossy(head))
}

/// Whether a MIME type is handled as plain text.
pub fn is_text_mime_type(mime_type: &str) -> bool {
    mime_type.starts_with("text/") || mime_type == JSON_MIME_TYPE
}

fn classify_text(text: &str) -> &'static str {
    let prefix = text.trim_start().chars().take(512).collect::<String>().to_ascii_lowercase();

    if prefix.starts_with("<!doctype html") || prefix.starts_with("<html") || prefix.contains("<body") {
        HTML_MIME_TYPE
    } else if prefix.starts_with("<?xml") || (prefix.starts_with('<') && !prefix.starts_with("<!--")) {
        XML_MIME_TYPE
    } else if prefix.starts_with('{') || prefix.starts_with('[') {
        JSON_MIME_TYPE
    } else {
        PLAIN_TEXT_MIME_TYPE
    }
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    let control = head
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0c))
        .count();
    control * 10 < head.len().max(1)
}
