//! Whole-document analysis.
//!
//! Pages are processed one at a time (or across scoped worker threads), each
//! behind its own failure boundary. Annotation links are collected once for
//! the whole document after the pages are done.

use super::annotations::extract_annotation_links;
use super::failure::{panic_message, FailureKind, StepFailure};
use super::links::mine_links;
use super::log::{EventLog, LogSink};
use super::model::{AnalysisResult, ExtractedText, Link};
use super::text::extract_page_text;
use crate::pdf::PdfAccess;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

/// Tuning for one [`AnalysisPipeline`]
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Process pages on worker threads (default: false)
    pub parallel: bool,
    /// Upper bound on worker threads when `parallel` is set
    pub max_workers: usize,
    /// Longest log message kept, in characters (default: 500)
    pub log_message_limit: usize,
    /// Characters of page text shown in the "Sample text" log line (default: 100)
    pub sample_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            log_message_limit: 500,
            sample_chars: 100,
        }
    }
}

/// Everything one page contributes before it is merged into the result
struct PageOutcome {
    text: ExtractedText,
    links: Vec<Link>,
    log: EventLog,
}

#[derive(Clone, Default)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    sink: Option<Arc<dyn LogSink>>,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config, sink: None }
    }

    /// Forward every event of every analysis to `sink` as well
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze an opened document.
    ///
    /// Never fails: every page yields exactly one [`ExtractedText`], in page
    /// order, whatever happens while processing it.
    pub fn analyze(&self, document: &dyn PdfAccess) -> AnalysisResult {
        let mut log = EventLog::new(self.config.log_message_limit);
        let page_count = document.page_count();
        log.info(format!("Starting analysis of {} page(s)", page_count));

        for notice in document.notices() {
            log.warn(notice);
        }

        let pages = if self.config.parallel && page_count > 1 && self.config.max_workers > 1 {
            self.process_parallel(document, page_count)
        } else {
            (1..=page_count)
                .map(|page| self.process_page(document, page))
                .collect()
        };

        let mut result = AnalysisResult::default();
        for page in pages {
            log.append(page.log);
            result.texts.push(page.text);
            result.links.extend(page.links);
        }

        self.collect_annotations(document, &mut result, &mut log);

        log.info(format!(
            "Analysis complete. Total links found: {}",
            result.total_links()
        ));
        if result.links.is_empty() {
            log.warn("No links found: the PDF may not contain any clickable links or URLs");
            log.warn("No links found: the URLs may be formatted in an unexpected way");
            log.warn("No links found: the URLs may be split across lines");
        }

        result.logs = log.into_events();
        if let Some(sink) = &self.sink {
            for event in &result.logs {
                sink.append(&event.timestamp, event.severity, &event.message);
            }
        }
        result
    }

    fn process_page(&self, document: &dyn PdfAccess, page: u32) -> PageOutcome {
        let mut log = EventLog::new(self.config.log_message_limit);
        log.info(format!("Processing page {}", page));

        let outcome =
            match panic::catch_unwind(AssertUnwindSafe(|| extract_page_text(document, page))) {
                Ok(outcome) => outcome,
                Err(payload) => return self.panicked_page(page, payload.as_ref(), log),
            };

        for failure in &outcome.failures {
            log.push(failure.severity(), failure.to_string());
        }
        log.info(format!(
            "Page {}: text layer score {}, raw content score {}, using {}",
            page,
            outcome.structured_score,
            outcome.raw_score,
            outcome.text.strategy.as_str()
        ));

        let text = outcome.text;
        log.info(format!(
            "Extracted {} characters from page {}",
            text.characters(),
            page
        ));
        if text.content.is_empty() {
            log.warn(format!("No text extracted from page {}", page));
            return PageOutcome {
                text,
                links: Vec::new(),
                log,
            };
        }

        let sample: String = text.content.chars().take(self.config.sample_chars).collect();
        log.info(format!("Sample text: {}", sample));

        let links = mine_links(&text.content, page);
        if !links.is_empty() {
            log.info(format!("Found {} potential links on page {}", links.len(), page));
        }
        for link in &links {
            log.info(format!("Added {} link: {}", link.category, link.uri));
        }

        PageOutcome { text, links, log }
    }

    fn panicked_page(&self, page: u32, payload: &(dyn Any + Send), mut log: EventLog) -> PageOutcome {
        let failure = StepFailure::new(FailureKind::PagePanic, Some(page), panic_message(payload));
        log.push(failure.severity(), failure.to_string());
        PageOutcome {
            text: ExtractedText::failed(page, failure.message),
            links: Vec::new(),
            log,
        }
    }

    /// Pages are dealt round-robin to scoped workers, then put back in page order
    fn process_parallel(&self, document: &dyn PdfAccess, page_count: u32) -> Vec<PageOutcome> {
        let workers = self.config.max_workers.clamp(1, page_count as usize);
        let pages_of = move |worker: usize| (1..=page_count).skip(worker).step_by(workers);

        let mut outcomes: Vec<PageOutcome> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move || {
                        pages_of(worker)
                            .map(|page| self.process_page(document, page))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .flat_map(|(worker, handle)| match handle.join() {
                    Ok(outcomes) => outcomes,
                    Err(payload) => pages_of(worker)
                        .map(|page| {
                            let log = EventLog::new(self.config.log_message_limit);
                            self.panicked_page(page, payload.as_ref(), log)
                        })
                        .collect(),
                })
                .collect()
        });

        outcomes.sort_by_key(|outcome| outcome.text.page);
        outcomes
    }

    fn collect_annotations(
        &self,
        document: &dyn PdfAccess,
        result: &mut AnalysisResult,
        log: &mut EventLog,
    ) {
        let layout = match panic::catch_unwind(AssertUnwindSafe(|| document.link_annotations())) {
            Ok(Ok(layout)) => layout,
            Ok(Err(e)) => {
                let failure = StepFailure::new(FailureKind::Annotations, None, e);
                log.push(failure.severity(), failure.to_string());
                return;
            }
            Err(payload) => {
                let failure = StepFailure::new(
                    FailureKind::Annotations,
                    None,
                    panic_message(payload.as_ref()),
                );
                log.push(failure.severity(), failure.to_string());
                return;
            }
        };

        let outcome = extract_annotation_links(layout);
        for failure in &outcome.failures {
            log.push(failure.severity(), failure.to_string());
        }
        for link in &outcome.links {
            log.info(format!("Added annotation link: {}", link.uri));
        }
        result.links.extend(outcome.links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{LinkCategory, Rect, Severity, TextStrategy};
    use crate::error::{Error, Result};
    use crate::pdf::{AnnotationLayout, LinkAnnotation};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    /// In-memory document; `None` text pages fail, `panic_on` pages panic
    struct FakeDocument {
        pages: Vec<Option<&'static str>>,
        panic_on: Option<u32>,
        annotations: Vec<(u32, &'static str)>,
        annotations_fail: bool,
    }

    impl FakeDocument {
        fn new(pages: Vec<Option<&'static str>>) -> Self {
            Self {
                pages,
                panic_on: None,
                annotations: Vec::new(),
                annotations_fail: false,
            }
        }
    }

    impl PdfAccess for FakeDocument {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn structured_text(&self, page: u32) -> Result<String> {
            if self.panic_on == Some(page) {
                panic!("backend exploded on page {}", page);
            }
            match self.pages[page as usize - 1] {
                Some(text) => Ok(text.to_string()),
                None => Err(Error::Pdfium {
                    reason: "text page unavailable".to_string(),
                }),
            }
        }

        fn raw_content(&self, _page: u32) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn link_annotations(&self) -> Result<AnnotationLayout> {
            if self.annotations_fail {
                return Err(Error::Pdfium {
                    reason: "no annotations".to_string(),
                });
            }
            let mut pages: Vec<(u32, Vec<Result<LinkAnnotation>>)> = Vec::new();
            for (page, uri) in &self.annotations {
                let annotation = Ok(LinkAnnotation {
                    uri: Some(uri.to_string()),
                    rect: Some(Rect::from_pdf_array([0.0, 0.0, 50.0, 10.0])),
                });
                match pages.iter_mut().find(|(p, _)| p == page) {
                    Some((_, list)) => list.push(annotation),
                    None => pages.push((*page, vec![annotation])),
                }
            }
            Ok(AnnotationLayout::PerPage(pages))
        }

        fn notices(&self) -> Vec<String> {
            vec!["fallback text backend in use".to_string()]
        }
    }

    fn messages(result: &AnalysisResult) -> Vec<&str> {
        result.logs.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_failing_middle_page_keeps_its_slot() {
        let document = FakeDocument::new(vec![
            Some("Contact me at jane@example.com"),
            None,
            Some("github.com/janedoe"),
        ]);
        let result = AnalysisPipeline::default().analyze(&document);

        let pages: Vec<_> = result.texts.iter().map(|t| t.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(result.texts[1].content, "");
        assert!(result.texts[1].error.is_some());
        assert_eq!(result.texts[1].strategy, TextStrategy::None);

        let links: Vec<_> = result
            .links
            .iter()
            .map(|l| (l.page, l.category, l.uri.as_str()))
            .collect();
        assert_eq!(
            links,
            vec![
                (1, LinkCategory::Email, "mailto:jane@example.com"),
                (3, LinkCategory::Github, "https://github.com/janedoe"),
            ]
        );
        assert!(result
            .logs_at_least(Severity::Error)
            .any(|e| e.message.starts_with("Page 2: text extraction failed")));
    }

    #[test]
    fn test_panicking_page_is_contained() {
        let mut document = FakeDocument::new(vec![Some("one"), Some("two"), Some("x@y.io")]);
        document.panic_on = Some(2);
        let result = AnalysisPipeline::default().analyze(&document);

        assert_eq!(result.total_pages(), 3);
        let failed = &result.texts[1];
        assert_eq!(failed.page, 2);
        assert!(failed
            .error
            .as_deref()
            .is_some_and(|e| e.contains("backend exploded on page 2")));
        assert_eq!(result.total_links(), 1);
        assert!(messages(&result)
            .iter()
            .any(|m| m.starts_with("Page 2: page processing panicked")));
    }

    #[test]
    fn test_annotations_follow_text_links() {
        let mut document = FakeDocument::new(vec![Some("www.site.io"), Some("")]);
        document.annotations = vec![(2, "https://clicked.example"), (1, "https://first.example")];
        let result = AnalysisPipeline::default().analyze(&document);

        let categories: Vec<_> = result.links.iter().map(|l| l.category).collect();
        assert_eq!(
            categories,
            vec![
                LinkCategory::Url,
                LinkCategory::Annotation,
                LinkCategory::Annotation
            ]
        );
        assert_eq!(result.links[1].page, 2);
        assert!(messages(&result).contains(&"Added annotation link: https://clicked.example"));
        assert!(messages(&result).contains(&"No text extracted from page 2"));
    }

    #[test]
    fn test_annotation_failure_is_logged_not_fatal() {
        let mut document = FakeDocument::new(vec![Some("github.com/a")]);
        document.annotations_fail = true;
        let result = AnalysisPipeline::default().analyze(&document);
        assert_eq!(result.total_links(), 1);
        assert!(result
            .logs_at_least(Severity::Error)
            .any(|e| e.message.starts_with("annotation listing failed")));
    }

    #[test]
    fn test_zero_links_emits_three_hints() {
        let document = FakeDocument::new(vec![Some("plain words only")]);
        let result = AnalysisPipeline::default().analyze(&document);
        let hints = result
            .logs
            .iter()
            .filter(|e| e.severity == Severity::Warn && e.message.starts_with("No links found"))
            .count();
        assert_eq!(hints, 3);
        assert!(messages(&result).contains(&"Analysis complete. Total links found: 0"));
    }

    #[test]
    fn test_log_line_order_for_a_page() {
        let document = FakeDocument::new(vec![Some("see github.com/janedoe")]);
        let result = AnalysisPipeline::default().analyze(&document);
        let logs = messages(&result);

        let position = |prefix: &str| logs.iter().position(|m| m.starts_with(prefix));
        assert_eq!(position("Starting analysis"), Some(0));
        assert_eq!(position("fallback text backend"), Some(1));
        assert!(position("Processing page 1") < position("Extracted 22 characters from page 1"));
        assert!(position("Sample text: see github.com/janedoe") < position("Added github link"));
        assert!(position("Added github link") < position("Analysis complete"));
    }

    #[test]
    fn test_sample_text_is_bounded() {
        let document = FakeDocument::new(vec![Some("abcdefghij")]);
        let config = AnalysisConfig {
            sample_chars: 4,
            ..AnalysisConfig::default()
        };
        let result = AnalysisPipeline::new(config).analyze(&document);
        assert!(messages(&result).contains(&"Sample text: abcd"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let texts = vec![
            Some("a@b.io"),
            None,
            Some("github.com/x"),
            Some("linkedin.com/in/y"),
            Some("www.z.dev"),
        ];
        let sequential = AnalysisPipeline::default().analyze(&FakeDocument::new(texts.clone()));
        let parallel = AnalysisPipeline::new(AnalysisConfig {
            parallel: true,
            max_workers: 3,
            ..AnalysisConfig::default()
        })
        .analyze(&FakeDocument::new(texts));

        assert_eq!(parallel.texts, sequential.texts);
        assert_eq!(parallel.links, sequential.links);
        let strip = |r: &AnalysisResult| -> Vec<(Severity, String)> {
            r.logs.iter().map(|e| (e.severity, e.message.clone())).collect()
        };
        assert_eq!(strip(&parallel), strip(&sequential));
    }

    struct Collect(Mutex<Vec<String>>);

    impl LogSink for Collect {
        fn append(&self, _timestamp: &str, severity: Severity, message: &str) {
            self.0.lock().push(format!("{}:{}", severity.as_str(), message));
        }
    }

    #[test]
    fn test_sink_receives_every_event() {
        let sink = Arc::new(Collect(Mutex::new(Vec::new())));
        let pipeline = AnalysisPipeline::default().with_sink(sink.clone());
        let result = pipeline.analyze(&FakeDocument::new(vec![Some("x@y.io")]));

        let forwarded = sink.0.lock();
        assert_eq!(forwarded.len(), result.logs.len());
        assert!(forwarded
            .iter()
            .any(|m| m == "info:Added email link: mailto:x@y.io"));
    }

    #[test]
    fn test_long_log_messages_are_truncated() {
        let long = "word ".repeat(200);
        let document = FakeDocument::new(vec![Some(Box::leak(long.into_boxed_str()))]);
        let config = AnalysisConfig {
            log_message_limit: 40,
            sample_chars: 1000,
            ..AnalysisConfig::default()
        };
        let result = AnalysisPipeline::new(config).analyze(&document);
        assert!(result.logs.iter().all(|e| e.message.chars().count() <= 40));
        assert!(result
            .logs
            .iter()
            .any(|e| e.message.starts_with("Sample text:") && e.message.ends_with("...")));
    }
}
