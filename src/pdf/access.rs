//! What the analysis core needs from a PDF library

use crate::analysis::Rect;
use crate::error::Result;

/// A link annotation as reported by the PDF backend
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnotation {
    /// Target of a URI action; `None` for internal navigation or no action
    pub uri: Option<String>,
    pub rect: Option<Rect>,
}

/// Link annotations, attributed to pages when the backend can tell
#[derive(Debug)]
pub enum AnnotationLayout {
    /// `(page number, annotations on that page)`
    PerPage(Vec<(u32, Vec<Result<LinkAnnotation>>)>),
    /// Annotations whose page is unknown
    DocumentWide(Vec<Result<LinkAnnotation>>),
}

/// Page-level access to an opened PDF.
///
/// Pages are 1-indexed. Implementations report failures through the returned
/// `Result`s; the analysis pipeline never lets one of them abort the document.
pub trait PdfAccess: Sync {
    fn page_count(&self) -> u32;

    /// Text from the library's text layer; empty when the page has none
    fn structured_text(&self, page: u32) -> Result<String>;

    /// Decoded content stream bytes; `None` when the page has no content
    fn raw_content(&self, page: u32) -> Result<Option<Vec<u8>>>;

    fn link_annotations(&self) -> Result<AnnotationLayout>;

    /// Warnings gathered while opening the document
    fn notices(&self) -> Vec<String> {
        Vec::new()
    }
}
