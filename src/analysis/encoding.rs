//! Encoding recovery for text pulled out of PDFs.
//!
//! PDF text arrives as bytes in whatever encoding the producer felt like.
//! [`normalize_bytes`] walks a fixed fallback chain and always returns valid
//! text: UTF-8, then Windows-1252, then ISO-8859-1, then ASCII with every
//! undecodable byte dropped. Nothing is ever replaced by a visible
//! substitution character, since those end up inside link matches.

use encoding_rs::WINDOWS_1252;

/// One step of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Windows1252,
    Iso8859_1,
    /// Terminal step: non-ASCII bytes removed
    AsciiLossy,
}

/// Bytes that have no mapping in the Windows-1252 code page
const WINDOWS_1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Decode `bytes` with the first encoding in the chain that accepts them.
pub fn normalize_bytes(bytes: &[u8]) -> String {
    decode_with_fallback(bytes).0
}

/// Like [`normalize_bytes`] but also reports which step succeeded
pub fn decode_with_fallback(bytes: &[u8]) -> (String, SourceEncoding) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (scrub(text), SourceEncoding::Utf8);
    }
    if let Some(text) = decode_windows_1252(bytes) {
        return (scrub(&text), SourceEncoding::Windows1252);
    }
    if let Some(text) = decode_iso_8859_1(bytes) {
        return (scrub(&text), SourceEncoding::Iso8859_1);
    }
    (ascii_lossy(bytes), SourceEncoding::AsciiLossy)
}

/// Normalize text that is already a Rust string.
///
/// The text is valid UTF-8 by construction, so only the characters that
/// PDF libraries emit for glyphs they could not map are removed.
pub fn normalize_text(text: &str) -> String {
    scrub(text)
}

fn decode_windows_1252(bytes: &[u8]) -> Option<String> {
    if bytes.iter().any(|b| WINDOWS_1252_UNDEFINED.contains(b)) {
        return None;
    }
    WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

// Every byte is a valid ISO-8859-1 code point. Kept as its own step so the
// chain stays explicit if the Windows-1252 step is ever made stricter.
fn decode_iso_8859_1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| char::from(b)).collect())
}

fn ascii_lossy(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii() && **b != 0)
        .map(|&b| char::from(b))
        .collect()
}

fn scrub(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{FFFD}' | '\u{FFFE}' | '\u{FEFF}' | '\0'))
        .collect()
}
