//! Links taken from clickable link annotations

use super::failure::{FailureKind, StepFailure};
use super::model::{Link, LinkCategory};
use crate::error::Result;
use crate::pdf::{AnnotationLayout, LinkAnnotation};

/// Page used when the backend could not tell which page an annotation is on
pub const UNATTRIBUTED_PAGE: u32 = 1;

#[derive(Debug, Default)]
pub struct AnnotationOutcome {
    pub links: Vec<Link>,
    pub failures: Vec<StepFailure>,
    /// Annotations that decoded but had no URI action
    pub skipped: usize,
}

/// Turn link annotations into `annotation` links.
///
/// Annotations without a URI action are skipped. A decode failure is recorded
/// and the remaining annotations are still processed.
pub fn extract_annotation_links(layout: AnnotationLayout) -> AnnotationOutcome {
    let mut outcome = AnnotationOutcome::default();
    match layout {
        AnnotationLayout::PerPage(pages) => {
            for (page, annotations) in pages {
                collect(&mut outcome, page, annotations);
            }
        }
        AnnotationLayout::DocumentWide(annotations) => {
            collect(&mut outcome, UNATTRIBUTED_PAGE, annotations);
        }
    }
    outcome
}

fn collect(outcome: &mut AnnotationOutcome, page: u32, annotations: Vec<Result<LinkAnnotation>>) {
    for annotation in annotations {
        match annotation {
            Ok(LinkAnnotation {
                uri: Some(uri),
                rect,
            }) if !uri.trim().is_empty() => {
                outcome
                    .links
                    .push(Link::new(page, LinkCategory::Annotation, uri.trim()).with_rect(rect));
            }
            Ok(_) => outcome.skipped += 1,
            Err(e) => outcome.failures.push(StepFailure::new(
                FailureKind::AnnotationDecode,
                Some(page),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Rect;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    fn uri(target: &str) -> Result<LinkAnnotation> {
        Ok(LinkAnnotation {
            uri: Some(target.to_string()),
            rect: Some(Rect::from_pdf_array([10.0, 20.0, 110.0, 40.0])),
        })
    }

    fn internal() -> Result<LinkAnnotation> {
        Ok(LinkAnnotation {
            uri: None,
            rect: None,
        })
    }

    fn broken() -> Result<LinkAnnotation> {
        Err(Error::AnnotationDecode {
            reason: "dangling /A reference".to_string(),
        })
    }

    #[test]
    fn test_per_page_attribution() {
        let layout = AnnotationLayout::PerPage(vec![
            (1, vec![uri("https://a.example")]),
            (3, vec![internal(), uri("https://b.example")]),
        ]);
        let outcome = extract_annotation_links(layout);

        let pages: Vec<_> = outcome.links.iter().map(|l| (l.page, l.uri.as_str())).collect();
        assert_eq!(pages, vec![(1, "https://a.example"), (3, "https://b.example")]);
        assert!(outcome
            .links
            .iter()
            .all(|l| l.category == LinkCategory::Annotation && l.rect.is_some()));
        assert_eq!(outcome.skipped, 1);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_document_wide_goes_to_first_page() {
        let layout = AnnotationLayout::DocumentWide(vec![uri("https://a.example"), uri("mailto:x@y.io")]);
        let outcome = extract_annotation_links(layout);
        assert_eq!(outcome.links.len(), 2);
        assert!(outcome.links.iter().all(|l| l.page == UNATTRIBUTED_PAGE));
    }

    #[test]
    fn test_decode_failure_does_not_stop_the_rest() {
        let layout = AnnotationLayout::PerPage(vec![(
            2,
            vec![broken(), uri("https://after.example"), broken()],
        )]);
        let outcome = extract_annotation_links(layout);
        assert_eq!(outcome.links.len(), 1);
        assert_eq!(outcome.links[0].uri, "https://after.example");
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].kind, FailureKind::AnnotationDecode);
        assert_eq!(outcome.failures[0].page, Some(2));
    }

    #[test]
    fn test_blank_uri_counts_as_skipped() {
        let layout = AnnotationLayout::DocumentWide(vec![uri("   ")]);
        let outcome = extract_annotation_links(layout);
        assert!(outcome.links.is_empty());
        assert_eq!(outcome.skipped, 1);
    }
}
