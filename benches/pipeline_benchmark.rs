//! Performance benchmarks for PDF Link Miner
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdf_link_miner::analysis::{clean_text, extract_raw, mine_links};
use pdf_link_miner::pdf::{AnnotationLayout, PdfAccess};
use pdf_link_miner::{AnalysisConfig, AnalysisPipeline, Result};

const RESUME_PAGE: &str = "Jane DoeSenior Engineer.Contact jane.doe@example.com \
    linkedin.com/in/janedoe github.com/janedoe stackoverflow.com/users/42/jane \
    Portfolio www.janedoe.dev Built APIServer handling 12.5k requests per second.";

/// In-memory document repeating one page of résumé text
struct SyntheticPdf {
    pages: u32,
    raw: Vec<u8>,
}

impl SyntheticPdf {
    fn new(pages: u32) -> Self {
        let raw = format!("BT /F1 11 Tf 72 720 Td [({})] TJ ET", RESUME_PAGE).into_bytes();
        Self { pages, raw }
    }
}

impl PdfAccess for SyntheticPdf {
    fn page_count(&self) -> u32 {
        self.pages
    }

    fn structured_text(&self, _page: u32) -> Result<String> {
        Ok(RESUME_PAGE.to_string())
    }

    fn raw_content(&self, _page: u32) -> Result<Option<Vec<u8>>> {
        Ok(Some(self.raw.clone()))
    }

    fn link_annotations(&self) -> Result<AnnotationLayout> {
        Ok(AnnotationLayout::PerPage(Vec::new()))
    }
}

fn bench_text_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_steps");
    group.throughput(Throughput::Bytes(RESUME_PAGE.len() as u64));

    group.bench_function("clean_text", |b| {
        b.iter(|| clean_text(black_box(RESUME_PAGE)));
    });

    let cleaned = clean_text(RESUME_PAGE);
    group.bench_function("mine_links", |b| {
        b.iter(|| mine_links(black_box(&cleaned), 1));
    });

    let raw = SyntheticPdf::new(1).raw;
    group.bench_function("extract_raw", |b| {
        b.iter(|| extract_raw(black_box(Some(raw.as_slice()))));
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for pages in [1u32, 10, 50] {
        let doc = SyntheticPdf::new(pages);

        group.bench_with_input(BenchmarkId::new("sequential", pages), &doc, |b, doc| {
            let pipeline = AnalysisPipeline::default();
            b.iter(|| pipeline.analyze(black_box(doc)));
        });

        group.bench_with_input(BenchmarkId::new("parallel", pages), &doc, |b, doc| {
            let pipeline = AnalysisPipeline::new(AnalysisConfig {
                parallel: true,
                ..AnalysisConfig::default()
            });
            b.iter(|| pipeline.analyze(black_box(doc)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_text_steps, bench_pipeline);
criterion_main!(benches);
