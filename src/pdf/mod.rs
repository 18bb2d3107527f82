//! PDF processing layer
//!
//! This module opens PDFs with PDFium, lopdf and qpdf and serves them to the
//! analysis through the [`PdfAccess`] trait.

mod access;
mod content;
mod document;
mod qpdf;
mod reader;

pub use access::{AnnotationLayout, LinkAnnotation, PdfAccess};
pub use document::PdfDocument;
pub use qpdf::QpdfWrapper;
