//! Classified page-local failures.
//!
//! Steps never abort the document. Each one reports what went wrong as a
//! [`StepFailure`]; the pipeline reads the [`FailureKind`] to decide how loudly
//! to log it and carries on with whatever the step could still produce.

use super::model::Severity;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The PDF library could not produce a text layer for the page
    StructuredText,
    /// The page's content stream could not be read
    RawContent,
    /// Link annotations could not be listed at all
    Annotations,
    /// A single link annotation could not be decoded
    AnnotationDecode,
    /// Processing the page panicked inside a collaborator
    PagePanic,
}

impl FailureKind {
    pub fn severity(&self) -> Severity {
        match self {
            FailureKind::StructuredText | FailureKind::Annotations | FailureKind::PagePanic => {
                Severity::Error
            }
            FailureKind::RawContent | FailureKind::AnnotationDecode => Severity::Warn,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FailureKind::StructuredText => "text extraction failed",
            FailureKind::RawContent => "raw content extraction failed",
            FailureKind::Annotations => "annotation listing failed",
            FailureKind::AnnotationDecode => "annotation could not be decoded",
            FailureKind::PagePanic => "page processing panicked",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub kind: FailureKind,
    /// Page the failure belongs to, when it belongs to one
    pub page: Option<u32>,
    pub message: String,
}

impl StepFailure {
    pub fn new(kind: FailureKind, page: Option<u32>, message: impl fmt::Display) -> Self {
        Self {
            kind,
            page,
            message: message.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(
                f,
                "Page {}: {}: {}",
                page,
                self.kind.describe(),
                self.message
            ),
            None => write!(f, "{}: {}", self.kind.describe(), self.message),
        }
    }
}

/// Turn a caught panic payload into something printable
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
