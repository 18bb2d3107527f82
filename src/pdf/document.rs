//! Opened PDF backed by PDFium and lopdf

use super::access::{AnnotationLayout, PdfAccess};
use super::content::ContentSource;
use super::qpdf::QpdfWrapper;
use super::reader::PdfiumSnapshot;
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::path::Path;

/// A PDF opened for analysis.
///
/// PDFium supplies the text layer and link annotations; lopdf supplies the
/// raw content streams. Either backend may be missing, in which case the
/// other one covers for it and a notice explains what was lost.
pub struct PdfDocument {
    page_count: u32,
    pdfium: Option<PdfiumSnapshot>,
    content: Option<ContentSource>,
    notices: Vec<String>,
}

impl PdfDocument {
    /// Open a PDF from a file path
    pub fn open<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::PdfNotFound {
                path: path.display().to_string(),
            });
        }

        let data = std::fs::read(path)?;
        Self::open_bytes(&data, password)
    }

    /// Open a PDF from bytes
    pub fn open_bytes(data: &[u8], password: Option<&str>) -> Result<Self> {
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::InvalidPdf {
                reason: "Not a valid PDF file".to_string(),
            });
        }

        let mut notices = Vec::new();

        let (pdfium, pdfium_error) = match PdfiumSnapshot::load(data, password) {
            Ok(snapshot) => (Some(snapshot), None),
            Err(e @ (Error::PasswordRequired | Error::IncorrectPassword)) => return Err(e),
            Err(e) => {
                notices.push(format!("PDFium unavailable, using fallback text extraction: {}", e));
                (None, Some(e))
            }
        };

        let (content, content_error) = match Self::load_content(data, password) {
            Ok(content) => (Some(content), None),
            Err(e @ Error::IncorrectPassword) if pdfium.is_none() => return Err(e),
            Err(e) => {
                notices.push(format!("Raw content streams unavailable: {}", e));
                (None, Some(e))
            }
        };

        let page_count = match (&pdfium, &content) {
            (Some(snapshot), _) => snapshot.page_count(),
            (None, Some(content)) => content.page_count(),
            (None, None) => {
                let reasons: Vec<String> = [pdfium_error, content_error]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .collect();
                return Err(Error::InvalidPdf {
                    reason: reasons.join("; "),
                });
            }
        };

        if let (Some(snapshot), Some(content)) = (&pdfium, &content) {
            if snapshot.page_count() != content.page_count() {
                notices.push(format!(
                    "Page count mismatch: PDFium reports {}, content parser reports {}",
                    snapshot.page_count(),
                    content.page_count()
                ));
            }
        }

        Ok(Self {
            page_count,
            pdfium,
            content,
            notices,
        })
    }

    fn load_content(data: &[u8], password: Option<&str>) -> Result<ContentSource> {
        let bytes = match password {
            Some(pwd) => Cow::Owned(QpdfWrapper::decrypt(data, pwd)?),
            None => Cow::Borrowed(data),
        };
        ContentSource::load(&bytes)
    }

    fn check_page(&self, page: u32) -> Result<()> {
        if page < 1 || page > self.page_count {
            return Err(Error::PageOutOfBounds {
                page,
                total: self.page_count,
            });
        }
        Ok(())
    }
}

impl PdfAccess for PdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn structured_text(&self, page: u32) -> Result<String> {
        self.check_page(page)?;
        match (&self.pdfium, &self.content) {
            (Some(snapshot), _) => snapshot.page_text(page),
            (None, Some(content)) => content.plain_text(page),
            (None, None) => Err(Error::Pdfium {
                reason: "no text backend available".to_string(),
            }),
        }
    }

    fn raw_content(&self, page: u32) -> Result<Option<Vec<u8>>> {
        self.check_page(page)?;
        match &self.content {
            Some(content) => content.raw_content(page),
            None => Err(Error::ContentStream {
                reason: "content streams could not be parsed".to_string(),
            }),
        }
    }

    fn link_annotations(&self) -> Result<AnnotationLayout> {
        match (&self.pdfium, &self.content) {
            (Some(snapshot), _) => Ok(AnnotationLayout::PerPage(snapshot.links_by_page())),
            (None, Some(content)) if content.page_tree_broken() => {
                Ok(AnnotationLayout::DocumentWide(content.document_links()))
            }
            (None, Some(content)) => Ok(AnnotationLayout::PerPage(content.links_by_page())),
            (None, None) => Err(Error::AnnotationDecode {
                reason: "no annotation backend available".to_string(),
            }),
        }
    }

    fn notices(&self) -> Vec<String> {
        self.notices.clone()
    }
}
