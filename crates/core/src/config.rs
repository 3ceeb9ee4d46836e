//! Environment-backed configuration.
//!
//! Built once at process start and passed into every pipeline stage; there
//! are no module-level clients or other implicit singletons. `from_env()`
//! never fails; `validate()` performs the fail-fast checks (hash algorithm
//! name, chunk overlap bound, embedding model) before any source is touched.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::fingerprint::HashAlgorithm;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub database: DatabaseConfig,
    pub chunking: ChunkingConfig,
    pub fingerprint: FingerprintConfig,
    pub csv: CsvConfig,
    pub crawl: CrawlConfig,
    pub pdf: PdfConfig,
    pub retry: RetryConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            embedding: EmbeddingConfig::from_env(),
            search: SearchConfig::from_env(),
            database: DatabaseConfig::from_env(),
            chunking: ChunkingConfig::from_env(),
            fingerprint: FingerprintConfig::from_env(),
            csv: CsvConfig::from_env(),
            crawl: CrawlConfig::from_env(),
            pdf: PdfConfig::from_env(),
            retry: RetryConfig::from_env(),
        }
    }

    /// Fail-fast validation of everything that would otherwise surface
    /// mid-run: hash algorithm name, chunk overlap bound, embedding model.
    pub fn validate(&self) -> Result<(), IngestError> {
        self.fingerprint.algorithm()?;
        self.chunking.validate()?;
        self.embedding.dimensions()?;
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  embedding:   endpoint={}, model={}",
            self.embedding.endpoint,
            self.embedding.model
        );
        tracing::info!(
            "  search:      endpoint={}, index={}",
            self.search.endpoint,
            self.search.index_name
        );
        tracing::info!(
            "  chunking:    size={}, overlap={}",
            self.chunking.chunk_size,
            self.chunking.chunk_overlap
        );
        tracing::info!("  fingerprint: algorithm={}", self.fingerprint.algorithm);
        tracing::info!(
            "  database:    {}",
            if self.database.is_configured() { "configured" } else { "(none)" }
        );
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible embeddings endpoint.
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    fn from_env() -> Self {
        Self {
            endpoint: env_or("EMBEDDINGS_ENDPOINT", "https://api.openai.com"),
            api_key: env_opt("EMBEDDINGS_API_KEY"),
            model: env_or("EMBEDDINGS_MODEL", "text-embedding-ada-002"),
            timeout_secs: env_u64("EMBEDDINGS_TIMEOUT_SECS", 120),
        }
    }

    /// Vector dimension implied by the configured model. Unknown model names
    /// are a configuration error, caught at startup.
    pub fn dimensions(&self) -> Result<usize, IngestError> {
        match self.model.as_str() {
            "text-embedding-ada-002" => Ok(1536),
            "text-embedding-3-large" => Ok(3072),
            other => Err(IngestError::Config(format!(
                "unknown embedding model: {other}"
            ))),
        }
    }
}

// ── Search index ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub index_name: String,
}

impl SearchConfig {
    fn from_env() -> Self {
        Self {
            endpoint: env_or("SEARCH_ENDPOINT", "http://localhost:9200"),
            api_key: env_opt("SEARCH_API_KEY"),
            index_name: env_or("SEARCH_INDEX_NAME", "documents"),
        }
    }
}

// ── Wiki database ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// MySQL connection URL for the wiki database.
    #[serde(skip_serializing)]
    pub url: Option<String>,
    /// Base URL used to derive public wiki page links.
    pub wiki_base_url: String,
}

impl DatabaseConfig {
    fn from_env() -> Self {
        Self {
            url: env_opt("WIKI_DATABASE_URL"),
            wiki_base_url: env_or("WIKI_BASE_URL", "https://wiki.example.com/-/wiki"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters repeated verbatim between adjacent chunks.
    pub chunk_overlap: usize,
    /// Deepest heading level that starts a new fragment (h1..h{n}).
    pub max_header_level: u8,
}

impl ChunkingConfig {
    fn from_env() -> Self {
        Self {
            chunk_size: env_usize("CHUNK_SIZE", 500),
            chunk_overlap: env_usize("CHUNK_OVERLAP", 30),
            max_header_level: env_usize("CHUNK_MAX_HEADER_LEVEL", 4) as u8,
        }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::Config("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

// ── Fingerprinting ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    pub algorithm: String,
}

impl FingerprintConfig {
    fn from_env() -> Self {
        Self {
            algorithm: env_or("FINGERPRINT_ALGORITHM", "sha256"),
        }
    }

    pub fn algorithm(&self) -> Result<HashAlgorithm, IngestError> {
        HashAlgorithm::from_str(&self.algorithm)
    }
}

// ── CSV source ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvConfig {
    /// Column whose text is embedded.
    pub content_column: String,
}

impl CsvConfig {
    fn from_env() -> Self {
        Self {
            content_column: env_or("CSV_CONTENT_COLUMN", "description"),
        }
    }
}

// ── Web crawl ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Session cookie sent with every request, as `NAME=VALUE`.
    #[serde(skip_serializing)]
    pub session_cookie: Option<String>,
    /// Upper bound on pages fetched in one run.
    pub max_pages: usize,
}

impl CrawlConfig {
    fn from_env() -> Self {
        Self {
            session_cookie: env_opt("CRAWL_SESSION_COOKIE"),
            max_pages: env_usize("CRAWL_MAX_PAGES", 10_000),
        }
    }
}

// ── PDF source ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Reproduce the historical behavior where every page of a file shares
    /// the whole-file digest as its id (pages overwrite each other in the
    /// index). Off by default; ids include the page number.
    pub legacy_page_ids: bool,
}

impl PdfConfig {
    fn from_env() -> Self {
        Self {
            legacy_page_ids: env_bool("PDF_LEGACY_PAGE_IDS", false),
        }
    }
}

// ── Retry policy ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per network call (1 = no retry).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay_ms: u64,
}

impl RetryConfig {
    fn from_env() -> Self {
        Self {
            max_attempts: env_usize("RETRY_MAX_ATTEMPTS", 3) as u32,
            base_delay_ms: env_u64("RETRY_BASE_DELAY_MS", 500),
        }
    }
}
