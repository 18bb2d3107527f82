//! Link and text recovery for PDFs with unreliable text layout
//!
//! Each page is read two ways (the PDF library's text layer and the raw
//! content stream), the more plausible reading is kept and repaired, and
//! links are mined from it. Clickable link annotations are added afterwards.

mod annotations;
mod encoding;
mod failure;
mod links;
mod log;
mod model;
mod pipeline;
mod quality;
mod raw_content;
mod text;

pub use annotations::{extract_annotation_links, AnnotationOutcome, UNATTRIBUTED_PAGE};
pub use encoding::{decode_with_fallback, normalize_bytes, normalize_text, SourceEncoding};
pub use failure::{FailureKind, StepFailure};
pub use links::{claimed_by, clean_url, ensure_https, mine_links};
pub use log::{truncate_message, EventLog, LogSink, NullSink};
pub use model::{
    AnalysisResult, ExtractedText, Link, LinkCategory, LogEvent, Rect, Severity, TextStrategy,
};
pub use pipeline::{AnalysisConfig, AnalysisPipeline};
pub use quality::score;
pub use raw_content::extract_raw;
pub use text::{clean_text, extract_page_text, TextOutcome};
