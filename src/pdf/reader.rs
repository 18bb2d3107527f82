//! PDFium side of a document: text layer and link annotations

use super::access::LinkAnnotation;
use crate::analysis::Rect;
use crate::error::{Error, Result};
use pdfium_render::prelude::*;

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    // Try to bind to system library or use static linking
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Page failures are kept as messages so the snapshot can outlive PDFium
type PageResult<T> = std::result::Result<T, String>;

/// Everything the analysis needs from PDFium, read once up front.
///
/// PDFium handles are neither `Send` nor `Sync`, so nothing of the library
/// survives `load`; pages can then be served from any thread.
#[derive(Debug)]
pub(crate) struct PdfiumSnapshot {
    page_texts: Vec<PageResult<String>>,
    page_links: Vec<Vec<PageResult<LinkAnnotation>>>,
}

impl PdfiumSnapshot {
    pub(crate) fn load(data: &[u8], password: Option<&str>) -> Result<Self> {
        let pdfium = create_pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_slice(data, password)
            .map_err(|e| map_pdfium_error(e, password.is_some()))?;

        let pages = document.pages();
        let page_len = pages.len() as usize;
        let mut page_texts = Vec::with_capacity(page_len);
        let mut page_links = Vec::with_capacity(page_len);

        for index in 0..pages.len() {
            match pages.get(index) {
                Ok(page) => {
                    page_texts.push(
                        page.text()
                            .map(|text| text.all())
                            .map_err(|e| e.to_string()),
                    );
                    page_links.push(Self::collect_links(&page));
                }
                Err(e) => {
                    let reason = format!("Failed to get page {}: {}", index + 1, e);
                    page_texts.push(Err(reason.clone()));
                    page_links.push(vec![Err(reason)]);
                }
            }
        }

        Ok(Self {
            page_texts,
            page_links,
        })
    }

    /// URI targets come from the page's links; bounds come from its link
    /// annotations, matched in order since PDFium reports both separately.
    fn collect_links(page: &PdfPage) -> Vec<PageResult<LinkAnnotation>> {
        let mut links: Vec<PageResult<LinkAnnotation>> = Vec::new();

        for link in page.links().iter() {
            let uri = match link.action() {
                Some(action) if action.action_type() == PdfActionType::Uri => {
                    match action.as_uri_action().map(|uri_action| uri_action.uri()) {
                        Some(Ok(uri)) => Some(uri),
                        Some(Err(e)) => {
                            links.push(Err(format!("unreadable URI action: {}", e)));
                            continue;
                        }
                        None => None,
                    }
                }
                _ => None,
            };
            links.push(Ok(LinkAnnotation { uri, rect: None }));
        }

        let bounds = page
            .annotations()
            .iter()
            .filter(|annotation| annotation.annotation_type() == PdfPageAnnotationType::Link)
            .map(|annotation| {
                annotation.bounds().ok().map(|rect| Rect {
                    left: rect.left().value,
                    top: rect.top().value,
                    right: rect.right().value,
                    bottom: rect.bottom().value,
                })
            });

        for (link, rect) in links.iter_mut().zip(bounds) {
            if let Ok(link) = link {
                link.rect = rect;
            }
        }

        links
    }

    pub(crate) fn page_count(&self) -> u32 {
        self.page_texts.len() as u32
    }

    pub(crate) fn page_text(&self, page: u32) -> Result<String> {
        let index = self.index(page)?;
        self.page_texts[index]
            .clone()
            .map_err(|reason| Error::Pdfium { reason })
    }

    /// Link annotations per page, 1-indexed
    pub(crate) fn links_by_page(&self) -> Vec<(u32, Vec<Result<LinkAnnotation>>)> {
        self.page_links
            .iter()
            .enumerate()
            .map(|(index, links)| {
                let links = links
                    .iter()
                    .map(|link| {
                        link.clone()
                            .map_err(|reason| Error::AnnotationDecode { reason })
                    })
                    .collect();
                (index as u32 + 1, links)
            })
            .collect()
    }

    fn index(&self, page: u32) -> Result<usize> {
        if page < 1 || page > self.page_count() {
            return Err(Error::PageOutOfBounds {
                page,
                total: self.page_count(),
            });
        }
        Ok((page - 1) as usize)
    }
}

/// Map PDFium errors to our error type
fn map_pdfium_error(err: PdfiumError, password_given: bool) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            if password_given {
                Error::IncorrectPassword
            } else {
                Error::PasswordRequired
            }
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}
