//! Text decoding with encoding detection.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Decode document bytes to a `String`.
///
/// Valid UTF-8 (with or without BOM) is used as-is. Anything else goes through
/// `chardetng` detection and is decoded with the guessed encoding, replacing
/// undecodable sequences.
pub fn decode_text(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let without_bom = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(without_bom) {
        return text.to_string();
    }

    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return decoded.into_owned();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "Decoded text contained invalid sequences");
    }
    decoded.into_owned()
}
