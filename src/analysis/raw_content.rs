//! Text recovery straight from a page's content stream.
//!
//! This does not interpret the content stream. It splits on the closing
//! `]TJ` of show-text arrays, decodes `<...>` hex strings to bytes, blanks
//! out PDF structural punctuation and hands the bytes to the encoding
//! fallback chain. Operators and numbers survive as words; the quality
//! scorer decides whether the result beats the library's text layer.

use super::encoding::normalize_bytes;
use regex::bytes::{Captures, Regex};
use std::sync::LazyLock;

const SHOW_TEXT_ARRAY_CLOSE: &[u8] = b"]TJ";

/// Characters that delimit PDF syntax rather than carry text
const STRUCTURAL: &[u8] = b"/\\()[]{}";

#[allow(clippy::expect_used)]
static HEX_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([0-9A-Fa-f\s]+)>").expect("valid regex"));

/// Recover text from raw content bytes. Absent content yields empty text.
pub fn extract_raw(content: Option<&[u8]>) -> String {
    let Some(content) = content else {
        return String::new();
    };

    let mut text = Vec::with_capacity(content.len());
    for chunk in split_on(content, SHOW_TEXT_ARRAY_CLOSE) {
        let decoded = decode_hex_strings(chunk);
        text.extend(decoded.iter().map(|b| {
            if STRUCTURAL.contains(b) {
                b' '
            } else {
                *b
            }
        }));
    }

    normalize_bytes(&text)
}

fn split_on<'a>(haystack: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + delimiter.len() <= haystack.len() {
        if &haystack[i..i + delimiter.len()] == delimiter {
            chunks.push(&haystack[start..i]);
            i += delimiter.len();
            start = i;
        } else {
            i += 1;
        }
    }
    chunks.push(&haystack[start..]);
    chunks
}

/// Replace every `<hex>` run with the bytes it encodes
fn decode_hex_strings(chunk: &[u8]) -> Vec<u8> {
    HEX_STRING
        .replace_all(chunk, |caps: &Captures| hex_to_bytes(&caps[1]))
        .into_owned()
}

/// Two hex digits per byte; an odd trailing digit is padded with `0`
fn hex_to_bytes(hex: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = hex
        .iter()
        .filter_map(|&c| char::from(c).to_digit(16))
        .map(|d| d as u8)
        .collect();

    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => hi << 4 | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}
