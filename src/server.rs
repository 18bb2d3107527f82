//! MCP Server implementation using rmcp

use crate::analysis::{AnalysisConfig, AnalysisPipeline, AnalysisResult, ExtractedText, Link, LogEvent};
use crate::pdf::PdfDocument;
use crate::source::{
    resolve_base64, resolve_cache, resolve_path, resolve_url, CacheManager, ResolvedPdf,
};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, service::RequestContext, tool, tool_handler, tool_router, RoleServer,
    ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// PDF source specification
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PdfSource {
    /// File path (absolute or relative)
    Path {
        /// Path to the PDF file
        path: String,
    },
    /// Base64 encoded PDF data
    Base64 {
        /// Base64 encoded PDF content
        base64: String,
    },
    /// URL to download PDF from (Google Drive share links are accepted)
    Url {
        /// URL of the PDF file
        url: String,
    },
    /// Reference to cached PDF
    CacheRef {
        /// Cache key from previous operation
        cache_key: String,
    },
}

const SOURCE_KEYS: [&str; 4] = ["path", "base64", "url", "cache_key"];

impl<'de> Deserialize<'de> for PdfSource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let value = serde_json::Value::deserialize(deserializer)?;
        let Some(obj) = value.as_object() else {
            let kind = match &value {
                serde_json::Value::Array(_) => "an array",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::Bool(_) => "a boolean",
                serde_json::Value::Null => "null",
                serde_json::Value::Object(_) => "an object",
            };
            return Err(D::Error::custom(format!(
                "Invalid source: expected an object with one of \"path\", \"base64\", \"url\", or \"cache_key\", but got {}",
                kind
            )));
        };

        for key in SOURCE_KEYS {
            let Some(v) = obj.get(key) else {
                continue;
            };
            let s = v
                .as_str()
                .ok_or_else(|| D::Error::custom(format!("\"{}\" must be a string", key)))?
                .to_string();
            return Ok(match key {
                "path" => PdfSource::Path { path: s },
                "base64" => PdfSource::Base64 { base64: s },
                "url" => PdfSource::Url { url: s },
                _ => PdfSource::CacheRef { cache_key: s },
            });
        }

        let keys: Vec<&String> = obj.keys().collect();
        Err(D::Error::custom(format!(
            "Invalid source: expected an object with one of \"path\", \"base64\", \"url\", or \"cache_key\", but got keys: {:?}",
            keys
        )))
    }
}

/// Security, resource and analysis configuration for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directories to expose as PDF resources
    pub resource_dirs: Vec<String>,
    /// Allow URLs that resolve to private/reserved IPs (default: false)
    pub allow_private_urls: bool,
    /// Maximum download size in bytes for URL sources (default: 100MB)
    pub max_download_bytes: u64,
    /// Maximum total bytes in cache (default: 512MB)
    pub cache_max_bytes: usize,
    /// Maximum number of cache entries (default: 100)
    pub cache_max_entries: usize,
    /// Age after which cached PDFs are dropped (default: 1h)
    pub cache_ttl: Duration,
    /// How often expired cache entries are swept (default: 1h)
    pub cache_sweep_interval: Duration,
    pub analysis: AnalysisConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            resource_dirs: Vec::new(),
            allow_private_urls: false,
            max_download_bytes: 100 * 1024 * 1024, // 100MB
            cache_max_bytes: 512 * 1024 * 1024,    // 512MB
            cache_max_entries: 100,
            cache_ttl: Duration::from_secs(60 * 60),
            cache_sweep_interval: Duration::from_secs(60 * 60),
            analysis: AnalysisConfig::default(),
        }
    }
}

const ENV_PREFIX: &str = "PDF_LINK_MINER_";

impl ServerConfig {
    /// Defaults overlaid with `PDF_LINK_MINER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| {
            let key = format!("{}{}", ENV_PREFIX, name);
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, dirs)) = var("RESOURCE_DIRS") {
            config.resource_dirs = std::env::split_paths(&dirs)
                .map(|p| p.to_string_lossy().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(value) = var("ALLOW_PRIVATE_URLS").and_then(parse_env_bool) {
            config.allow_private_urls = value;
        }
        if let Some(value) = var("MAX_DOWNLOAD_BYTES").and_then(parse_env) {
            config.max_download_bytes = value;
        }
        if let Some(secs) = var("CACHE_TTL_SECS").and_then(parse_env::<u64>) {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(value) = var("PARALLEL").and_then(parse_env_bool) {
            config.analysis.parallel = value;
        }
        if let Some(value) = var("MAX_WORKERS").and_then(parse_env::<usize>) {
            config.analysis.max_workers = value.max(1);
        }

        config
    }
}

fn parse_env<T: std::str::FromStr>((key, value): (String, String)) -> Option<T> {
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key = %key, value = %value, "Ignoring unparseable setting");
            None
        }
    }
}

fn parse_env_bool((key, value): (String, String)) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key = %key, value = %value, "Ignoring unparseable setting");
            None
        }
    }
}

/// PDF link analysis MCP server
#[derive(Clone)]
pub struct PdfServer {
    cache: Arc<RwLock<CacheManager>>,
    tool_router: ToolRouter<Self>,
    /// Server configuration
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types for list_pdfs
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListPdfsParams {
    /// Directory to search for PDF files
    pub directory: String,
    /// Search subdirectories recursively (default: false)
    #[serde(default)]
    pub recursive: bool,
    /// Filename pattern to filter (e.g., "resume*.pdf"). Supports glob patterns.
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PdfFileInfo {
    /// Full path to the PDF file
    pub path: String,
    /// Filename only
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified time (ISO 8601 format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListPdfsResult {
    /// Directory that was searched
    pub directory: String,
    /// List of PDF files found
    pub files: Vec<PdfFileInfo>,
    /// Total number of files found
    pub total_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for analyze_links
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeLinksParams {
    /// PDF sources to process
    pub sources: Vec<PdfSource>,
    /// Password for encrypted PDFs
    #[serde(default)]
    pub password: Option<String>,
    /// Include the recovered text of every page (default: true)
    #[serde(default = "default_true")]
    pub include_text: bool,
    /// Process pages on worker threads (default: server setting)
    #[serde(default)]
    pub parallel: Option<bool>,
    /// Enable caching
    #[serde(default)]
    pub cache: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RectInfo {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LinkInfo {
    /// Page number (1-indexed)
    pub page: u32,
    /// One of linkedin, github, stackoverflow, email, url, annotation
    #[serde(rename = "type")]
    pub link_type: String,
    /// Normalized target (`https://...` or `mailto:...`)
    pub uri: String,
    /// Clickable area, annotation links only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<RectInfo>,
}

impl From<&Link> for LinkInfo {
    fn from(link: &Link) -> Self {
        Self {
            page: link.page,
            link_type: link.category.as_str().to_string(),
            uri: link.uri.clone(),
            rect: link.rect.map(|r| RectInfo {
                left: r.left,
                top: r.top,
                right: r.right,
                bottom: r.bottom,
            }),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PageTextInfo {
    pub page: u32,
    pub content: String,
    /// Character count of `content`
    pub characters: usize,
    /// Which reading won: structured, raw_content or none
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ExtractedText> for PageTextInfo {
    fn from(text: &ExtractedText) -> Self {
        Self {
            page: text.page,
            content: text.content.clone(),
            characters: text.characters(),
            strategy: text.strategy.as_str().to_string(),
            error: text.error.clone(),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LogEntryInfo {
    /// `HH:MM:SS`
    pub timestamp: String,
    /// info, warn or error
    pub level: String,
    pub message: String,
}

impl From<&LogEvent> for LogEntryInfo {
    fn from(event: &LogEvent) -> Self {
        Self {
            timestamp: event.timestamp.clone(),
            level: event.severity.as_str().to_string(),
            message: event.message.clone(),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AnalysisMetadata {
    pub source: String,
    /// RFC 3339 time the analysis finished
    pub analyzed_at: String,
    pub total_links: u32,
    pub total_pages: u32,
    /// Number of links per type
    pub link_counts: BTreeMap<String, u32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AnalyzeLinksResult {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
    pub links: Vec<LinkInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<PageTextInfo>>,
    pub analysis_logs: Vec<LogEntryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalyzeLinksResult {
    fn from_analysis(
        source: String,
        cache_key: Option<String>,
        analysis: &AnalysisResult,
        include_text: bool,
    ) -> Self {
        let metadata = AnalysisMetadata {
            source: source.clone(),
            analyzed_at: chrono::Utc::now().to_rfc3339(),
            total_links: analysis.total_links() as u32,
            total_pages: analysis.total_pages() as u32,
            link_counts: analysis
                .link_counts()
                .into_iter()
                .map(|(category, count)| (category.to_string(), count as u32))
                .collect(),
        };

        Self {
            source,
            cache_key,
            metadata: Some(metadata),
            links: analysis.links.iter().map(LinkInfo::from).collect(),
            text: include_text.then(|| analysis.texts.iter().map(PageTextInfo::from).collect()),
            analysis_logs: analysis.logs.iter().map(LogEntryInfo::from).collect(),
            error: None,
        }
    }

    fn failed(source: String, error: String) -> Self {
        Self {
            source,
            cache_key: None,
            metadata: None,
            links: vec![],
            text: None,
            analysis_logs: vec![],
            error: Some(error),
        }
    }
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl PdfServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfServer with specified resource directories
    pub fn with_resource_dirs(dirs: Vec<String>) -> Self {
        Self::with_config(ServerConfig {
            resource_dirs: dirs,
            ..ServerConfig::default()
        })
    }

    /// Create a new PdfServer with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let cache = CacheManager::new(config.cache_max_entries, config.cache_max_bytes);
        Self {
            cache: Arc::new(RwLock::new(cache)),
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Find links and recover text in PDF files
    #[tool(
        description = "Find the links in PDF files (typically CVs and résumés) and recover their text, even when the PDF's text layout is broken.

Each page is read from the PDF text layer and from its raw content stream; the more readable version is kept and repaired. Links are mined from that text in five types (linkedin, github, stackoverflow, email, url) and clickable link annotations are added as type annotation.

Returns per source: links (page, type, uri, rect), per-page text with character counts, link counts per type, and the analysis log.

Source format: each element must be one of {\"path\": \"/absolute/path.pdf\"}, {\"url\": \"https://...\"}, {\"base64\": \"...\"}, or {\"cache_key\": \"...\"}"
    )]
    async fn analyze_links(&self, Parameters(params): Parameters<AnalyzeLinksParams>) -> String {
        let mut results = Vec::new();

        for source in &params.sources {
            let result = self
                .process_analyze_links(source, &params)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "analyze_links failed");
                    AnalyzeLinksResult::failed(Self::source_name(source), e.client_message())
                });
            results.push(result);
        }

        let response = serde_json::json!({ "results": results });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }

    /// List PDF files in a directory
    #[tool(
        description = "List PDF files in a directory.

Returns for each file:
- Full path (can be used directly with analyze_links)
- Filename
- File size in bytes
- Last modified time

Supports recursive search and glob pattern filtering."
    )]
    async fn list_pdfs(&self, Parameters(params): Parameters<ListPdfsParams>) -> String {
        let result = self.process_list_pdfs(&params).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "list_pdfs failed");
            ListPdfsResult {
                directory: params.directory.clone(),
                files: vec![],
                total_count: 0,
                error: Some(e.client_message()),
            }
        });

        let response = serde_json::json!({ "results": [result] });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }
}

impl PdfServer {
    fn source_name(source: &PdfSource) -> String {
        match source {
            PdfSource::Path { path } => path.clone(),
            PdfSource::Base64 { .. } => "<base64>".to_string(),
            PdfSource::Url { url } => url.clone(),
            PdfSource::CacheRef { cache_key } => format!("<cache:{}>", cache_key),
        }
    }

    async fn resolve_source(&self, source: &PdfSource) -> crate::error::Result<ResolvedPdf> {
        match source {
            PdfSource::Path { path } => {
                let allowed = self.validate_path_access(path)?;
                resolve_path(allowed)
            }
            PdfSource::Base64 { base64 } => resolve_base64(base64),
            PdfSource::Url { url } => {
                resolve_url(
                    url,
                    self.config.allow_private_urls,
                    self.config.max_download_bytes,
                )
                .await
            }
            PdfSource::CacheRef { cache_key } => resolve_cache(cache_key, &self.cache).await,
        }
    }

    /// Validate that a path is within allowed resource directories.
    /// If no resource_dirs are configured, all paths are allowed.
    fn validate_path_access(&self, path: &str) -> crate::error::Result<std::path::PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(std::path::PathBuf::from(path));
        }

        let canonical = std::fs::canonicalize(path).map_err(|_| {
            crate::error::Error::PathAccessDenied {
                path: path.to_string(),
            }
        })?;

        if self.is_within_resource_dirs(&canonical) {
            Ok(canonical)
        } else {
            Err(crate::error::Error::PathAccessDenied {
                path: path.to_string(),
            })
        }
    }

    fn is_within_resource_dirs(&self, canonical: &Path) -> bool {
        self.config.resource_dirs.iter().any(|dir| {
            std::fs::canonicalize(dir)
                .map(|cd| canonical.starts_with(&cd))
                .unwrap_or(false)
        })
    }

    fn pipeline_for(&self, parallel: Option<bool>) -> AnalysisPipeline {
        let mut config = self.config.analysis.clone();
        if let Some(parallel) = parallel {
            config.parallel = parallel;
        }
        AnalysisPipeline::new(config)
    }

    async fn process_analyze_links(
        &self,
        source: &PdfSource,
        params: &AnalyzeLinksParams,
    ) -> crate::error::Result<AnalyzeLinksResult> {
        let resolved = self.resolve_source(source).await?;
        let source_name = resolved.source_name.clone();

        // Cache if requested
        let cache_key = if params.cache {
            let cache_guard = self.cache.write().await;
            let key = cache_guard.generate_unique_key();
            cache_guard.put(key.clone(), resolved.data.clone());
            Some(key)
        } else {
            None
        };

        // Move CPU-heavy PDF work to blocking thread pool
        let data = resolved.data;
        let password = params.password.clone();
        let pipeline = self.pipeline_for(params.parallel);

        let analysis = tokio::task::spawn_blocking(move || {
            let document = PdfDocument::open_bytes(&data, password.as_deref())?;
            Ok::<_, crate::error::Error>(pipeline.analyze(&document))
        })
        .await
        .map_err(|e| crate::error::Error::Pdfium {
            reason: format!("Task join error: {}", e),
        })??;

        tracing::info!(
            source = %source_name,
            links = analysis.total_links(),
            pages = analysis.total_pages(),
            "Analyzed PDF"
        );

        Ok(AnalyzeLinksResult::from_analysis(
            source_name,
            cache_key,
            &analysis,
            params.include_text,
        ))
    }

    fn process_list_pdfs(&self, params: &ListPdfsParams) -> crate::error::Result<ListPdfsResult> {
        // Sandbox check: if resource_dirs are configured, directory must be within them
        if !self.config.resource_dirs.is_empty() {
            let canonical = std::fs::canonicalize(&params.directory).map_err(|_| {
                crate::error::Error::PathAccessDenied {
                    path: params.directory.clone(),
                }
            })?;
            if !self.is_within_resource_dirs(&canonical) {
                return Err(crate::error::Error::PathAccessDenied {
                    path: params.directory.clone(),
                });
            }
        }

        let dir_path = Path::new(&params.directory);

        if !dir_path.exists() {
            return Err(crate::error::Error::PdfNotFound {
                path: params.directory.clone(),
            });
        }

        if !dir_path.is_dir() {
            return Err(crate::error::Error::InvalidPdf {
                reason: format!("{} is not a directory", params.directory),
            });
        }

        let pattern = params
            .pattern
            .as_ref()
            .and_then(|p| glob::Pattern::new(p).ok());

        let mut files = Vec::new();
        Self::collect_pdfs(dir_path, params.recursive, pattern.as_ref(), &mut files)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let total_count = files.len() as u32;

        Ok(ListPdfsResult {
            directory: params.directory.clone(),
            files,
            total_count,
            error: None,
        })
    }

    fn collect_pdfs(
        dir: &Path,
        recursive: bool,
        pattern: Option<&glob::Pattern>,
        files: &mut Vec<PdfFileInfo>,
    ) -> crate::error::Result<()> {
        let entries = std::fs::read_dir(dir).map_err(crate::error::Error::Io)?;

        for entry in entries.flatten() {
            let path = entry.path();

            if path.is_dir() {
                if recursive {
                    // Unreadable subdirectories are skipped
                    let _ = Self::collect_pdfs(&path, recursive, pattern, files);
                }
                continue;
            }

            let is_pdf = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !is_pdf {
                continue;
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if pattern.is_some_and(|pat| !pat.matches(&name)) {
                continue;
            }

            let metadata = std::fs::metadata(&path).ok();
            let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
            let modified = metadata
                .as_ref()
                .and_then(|m| m.modified().ok())
                .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339());

            files.push(PdfFileInfo {
                path: path.to_string_lossy().to_string(),
                name,
                size,
                modified,
            });
        }

        Ok(())
    }

    /// Periodically drop cached PDFs older than the configured TTL
    fn spawn_cache_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let ttl = self.config.cache_ttl;
        let period = self.config.cache_sweep_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let dropped = cache.read().await.evict_expired(ttl);
                if dropped > 0 {
                    tracing::info!(dropped, "Evicted expired cached PDFs");
                }
            }
        })
    }
}

/// Plain-text rendering of an analysis for resource reads
fn render_report(source: &str, analysis: &AnalysisResult) -> String {
    let mut report = format!(
        "Source: {}\nPages: {}\nLinks found: {}\n",
        source,
        analysis.total_pages(),
        analysis.total_links()
    );
    for link in &analysis.links {
        report.push_str(&format!("  [page {}] {} {}\n", link.page, link.category, link.uri));
    }
    for text in &analysis.texts {
        report.push_str(&format!("\n--- Page {} ---\n{}\n", text.page, text.content));
        if let Some(error) = &text.error {
            report.push_str(&format!("(extraction error: {})\n", error));
        }
    }
    report
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF Link Miner finds links (LinkedIn, GitHub, Stack Overflow, email, web, \
                 clickable annotations) and recovers text in PDFs with broken text layout. \
                 PDF files in configured directories are also exposed as resources."
                    .into(),
            ),
        }
    }

    /// List available PDF resources from configured directories
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let mut resources = Vec::new();

        for dir in self.config.resource_dirs.iter() {
            let params = ListPdfsParams {
                directory: dir.clone(),
                recursive: true,
                pattern: None,
            };

            if let Ok(list_result) = self.process_list_pdfs(&params) {
                for file in list_result.files {
                    let uri = format!("file://{}", file.path);
                    let mut resource = RawResource::new(uri.clone(), file.name.clone());
                    resource.mime_type = Some("application/pdf".to_string());
                    resource.description = Some(format!(
                        "PDF file ({} bytes){}",
                        file.size,
                        file.modified
                            .as_ref()
                            .map(|m| format!(", modified: {}", m))
                            .unwrap_or_default()
                    ));
                    resource.size = Some(file.size as u32);

                    resources.push(Annotated {
                        raw: resource,
                        annotations: None,
                    });
                }
            }
        }

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: Default::default(),
        })
    }

    /// Read a PDF resource and return its link report and recovered text
    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let uri = &request.uri;

        let Some(path) = uri.strip_prefix("file://") else {
            return Err(ErrorData::invalid_params(
                "Only file:// URIs are supported",
                None,
            ));
        };

        // Canonicalize to prevent traversal out of the resource directories
        let is_allowed = self.config.resource_dirs.is_empty()
            || std::fs::canonicalize(path)
                .map(|canonical| self.is_within_resource_dirs(&canonical))
                .unwrap_or(false);

        if !is_allowed {
            return Err(ErrorData::invalid_params(
                "Resource not found in configured directories",
                None,
            ));
        }

        let source = PdfSource::Path {
            path: path.to_string(),
        };
        let resolved = match self.resolve_source(&source).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(error = %e, "read_resource failed");
                return Err(ErrorData::internal_error(e.client_message(), None));
            }
        };

        let pipeline = self.pipeline_for(None);
        let data = resolved.data;
        let analysis = tokio::task::spawn_blocking(move || {
            PdfDocument::open_bytes(&data, None).map(|document| pipeline.analyze(&document))
        })
        .await
        .map_err(|e| ErrorData::internal_error(format!("Task join error: {}", e), None))?
        .map_err(|e| {
            tracing::warn!(error = %e, "read_resource failed");
            ErrorData::internal_error(e.client_message(), None)
        })?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: uri.clone(),
                mime_type: Some("text/plain".to_string()),
                text: render_report(&resolved.source_name, &analysis),
                meta: Default::default(),
            }],
        })
    }
}

/// Run the MCP server with default configuration
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with specified resource directories
pub async fn run_server_with_dirs(resource_dirs: Vec<String>) -> Result<()> {
    run_server_with_config(ServerConfig {
        resource_dirs,
        ..ServerConfig::default()
    })
    .await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = PdfServer::with_config(config);
    let sweeper = server.spawn_cache_sweeper();

    tracing::info!("PDF Link Miner ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    sweeper.abort();
    Ok(())
}
