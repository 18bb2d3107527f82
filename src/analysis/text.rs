//! Per-page text acquisition and cleanup

use super::encoding::normalize_text;
use super::failure::{FailureKind, StepFailure};
use super::model::{ExtractedText, TextStrategy};
use super::quality::score;
use super::raw_content::extract_raw;
use crate::pdf::PdfAccess;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[allow(clippy::expect_used)]
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])([A-Z])").expect("valid regex"));

#[allow(clippy::expect_used)]
static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"));

#[allow(clippy::expect_used)]
static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));

/// Result of extracting one page
#[derive(Debug, Clone)]
pub struct TextOutcome {
    pub text: ExtractedText,
    /// Score of the text-layer candidate (0 when it failed)
    pub structured_score: i64,
    /// Score of the raw content candidate (0 when it failed)
    pub raw_score: i64,
    pub failures: Vec<StepFailure>,
}

/// Extract, choose and clean the text of `page`.
///
/// Both strategies always run. When one fails or comes back empty the other
/// is used as is; when both have text the higher score wins and ties go to
/// the text layer.
pub fn extract_page_text(access: &dyn PdfAccess, page: u32) -> TextOutcome {
    let mut failures = Vec::new();

    let structured = match access.structured_text(page) {
        Ok(text) => Some(text),
        Err(e) => {
            failures.push(StepFailure::new(FailureKind::StructuredText, Some(page), e));
            None
        }
    };

    let raw = match access.raw_content(page) {
        Ok(bytes) => Some(extract_raw(bytes.as_deref())),
        Err(e) => {
            failures.push(StepFailure::new(FailureKind::RawContent, Some(page), e));
            None
        }
    };

    let structured_score = score(structured.as_deref());
    let raw_score = score(raw.as_deref());

    // An empty reading never replaces a non-empty one, whatever the scores
    let structured = structured.filter(|s| !s.trim().is_empty());
    let raw = raw.filter(|r| !r.trim().is_empty());

    let (chosen, strategy) = match (structured, raw) {
        (Some(_), Some(r)) if raw_score > structured_score => (r, TextStrategy::RawContent),
        (Some(s), _) => (s, TextStrategy::Structured),
        (None, Some(r)) => (r, TextStrategy::RawContent),
        (None, None) => (String::new(), TextStrategy::None),
    };

    let content = clean_text(&normalize_text(&chosen));
    let strategy = if content.is_empty() {
        TextStrategy::None
    } else {
        strategy
    };

    let error = if failures.is_empty() {
        None
    } else {
        Some(
            failures
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    };

    TextOutcome {
        text: ExtractedText {
            page,
            content,
            strategy,
            error,
        },
        structured_score,
        raw_score,
        failures,
    }
}

/// Repair spacing damage typical of PDF text runs.
///
/// Collapses whitespace, separates merged sentences, camel-case and acronym
/// boundaries, then separates digit-dot-digit as `12. 5`. The last step also
/// splits real decimals; that is the established output format.
/// Running it on its own output changes nothing.
pub fn clean_text(text: &str) -> String {
    let text = WHITESPACE_RUN.replace_all(text, " ");
    let text = SENTENCE_BOUNDARY.replace_all(&text, "$1 $2");
    let text = CAMEL_BOUNDARY.replace_all(&text, "$1 $2");
    let text = ACRONYM_BOUNDARY.replace_all(&text, "$1 $2");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    separate_decimal_points(text.trim())
}

// Done by hand: `1.2.3` has overlapping digit-dot-digit matches that a
// single regex pass would only half fix.
fn separate_decimal_points(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if c == '.'
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())
        {
            out.push(' ');
        }
    }
    out
}
