//! Plausibility score used to pick between two extractions of the same page.
//!
//! Only the ordering of two scores for the same page means anything.

use regex::Regex;
use std::sync::LazyLock;

const SPACE_WEIGHT: i64 = 2;
const NEWLINE_WEIGHT: i64 = 1;
const GARBAGE_RUN_PENALTY: i64 = 5;
const MISSING_SENTENCE_SPACE_PENALTY: i64 = 3;

#[allow(clippy::expect_used)]
static GARBAGE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]{3,}").expect("valid regex"));

#[allow(clippy::expect_used)]
static MISSING_SENTENCE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[a-zA-Z]").expect("valid regex"));

/// Score `text`; `None` and empty text score 0.
pub fn score(text: Option<&str>) -> i64 {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return 0;
    };

    let spaces = text.chars().filter(|&c| c == ' ').count() as i64;
    let newlines = text.chars().filter(|&c| c == '\n').count() as i64;
    let garbage_runs = GARBAGE_RUN.find_iter(text).count() as i64;
    let merged_sentences = MISSING_SENTENCE_SPACE.find_iter(text).count() as i64;

    spaces * SPACE_WEIGHT + newlines * NEWLINE_WEIGHT
        - garbage_runs * GARBAGE_RUN_PENALTY
        - merged_sentences * MISSING_SENTENCE_SPACE_PENALTY
}
