//! PDF Link Miner
//!
//! Finds links in PDF files (typically CVs and résumés) and recovers their
//! text when the PDF's own text layout is broken. The analysis lives in
//! [`analysis`] and works against any [`pdf::PdfAccess`] implementation;
//! [`server`] exposes it as MCP tools:
//! - `analyze_links`: Mine links and recovered text from PDFs
//! - `list_pdfs`: List PDF files in a directory

pub mod analysis;
pub mod error;
pub mod pdf;
pub mod server;
pub mod source;

pub use analysis::{
    AnalysisConfig, AnalysisPipeline, AnalysisResult, ExtractedText, Link, LinkCategory, LogEvent,
    LogSink, Severity, TextStrategy,
};
pub use error::{Error, Result};
pub use pdf::{PdfAccess, PdfDocument};
pub use server::{
    run_server, run_server_with_config, run_server_with_dirs, AnalyzeLinksParams,
    AnalyzeLinksResult, ListPdfsParams, ListPdfsResult, PdfFileInfo, PdfServer, PdfSource,
    ServerConfig,
};
