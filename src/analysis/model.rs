//! Result types produced by one analysis pass

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of link found on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    Linkedin,
    Github,
    Stackoverflow,
    Email,
    Url,
    /// Clickable link annotation, independent of page text
    Annotation,
}

impl LinkCategory {
    /// Text categories in claim precedence: earlier categories win overlapping spans.
    pub const TEXT_PRECEDENCE: [LinkCategory; 5] = [
        LinkCategory::Linkedin,
        LinkCategory::Github,
        LinkCategory::Stackoverflow,
        LinkCategory::Email,
        LinkCategory::Url,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkCategory::Linkedin => "linkedin",
            LinkCategory::Github => "github",
            LinkCategory::Stackoverflow => "stackoverflow",
            LinkCategory::Email => "email",
            LinkCategory::Url => "url",
            LinkCategory::Annotation => "annotation",
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounding rectangle in PDF user space (left, top, right, bottom)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Build from a PDF `[llx lly urx ury]` rectangle array
    pub fn from_pdf_array(values: [f32; 4]) -> Self {
        let [llx, lly, urx, ury] = values;
        Self {
            left: llx.min(urx),
            top: lly.max(ury),
            right: llx.max(urx),
            bottom: lly.min(ury),
        }
    }
}

/// A discovered link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    /// Page number (1-indexed)
    pub page: u32,
    #[serde(rename = "type")]
    pub category: LinkCategory,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
}

impl Link {
    pub fn new(page: u32, category: LinkCategory, uri: impl Into<String>) -> Self {
        Self {
            page,
            category,
            uri: uri.into(),
            rect: None,
        }
    }

    pub fn with_rect(mut self, rect: Option<Rect>) -> Self {
        self.rect = rect;
        self
    }
}

/// Which acquisition strategy produced a page's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStrategy {
    /// Text reported by the PDF library's text layer
    Structured,
    /// Text recovered from the raw content stream
    RawContent,
    /// Neither strategy produced anything usable
    None,
}

impl TextStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStrategy::Structured => "structured",
            TextStrategy::RawContent => "raw_content",
            TextStrategy::None => "none",
        }
    }
}

/// Cleaned text of one page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    /// Page number (1-indexed)
    pub page: u32,
    pub content: String,
    pub strategy: TextStrategy,
    /// Set when extraction failed for this page
    pub error: Option<String>,
}

impl ExtractedText {
    /// Placeholder for a page whose extraction failed outright
    pub fn failed(page: u32, error: impl Into<String>) -> Self {
        Self {
            page,
            content: String::new(),
            strategy: TextStrategy::None,
            error: Some(error.into()),
        }
    }

    /// Character count (not bytes) of the content
    pub fn characters(&self) -> usize {
        self.content.chars().count()
    }
}

impl Serialize for ExtractedText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.error.is_some() { 5 } else { 4 };
        let mut state = serializer.serialize_struct("ExtractedText", fields)?;
        state.serialize_field("page", &self.page)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("characters", &self.characters())?;
        state.serialize_field("strategy", &self.strategy)?;
        if let Some(error) = &self.error {
            state.serialize_field("error", error)?;
        }
        state.end()
    }
}

/// Log event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

/// One analysis log line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    /// Wall-clock time, `HH:MM:SS`
    pub timestamp: String,
    #[serde(rename = "level")]
    pub severity: Severity,
    pub message: String,
}

/// Everything one `analyze` call produces
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub links: Vec<Link>,
    pub texts: Vec<ExtractedText>,
    pub logs: Vec<LogEvent>,
}

impl AnalysisResult {
    pub fn total_links(&self) -> usize {
        self.links.len()
    }

    pub fn total_pages(&self) -> usize {
        self.texts.len()
    }

    /// Number of links per category name
    pub fn link_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for link in &self.links {
            *counts.entry(link.category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn links_on_page(&self, page: u32) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.page == page)
    }

    /// Log events at or above the given severity
    pub fn logs_at_least(&self, severity: Severity) -> impl Iterator<Item = &LogEvent> {
        self.logs.iter().filter(move |e| e.severity >= severity)
    }
}
