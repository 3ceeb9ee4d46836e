//! Pipeline drivers: one per ingestion path, sharing a single context.
//!
//! The context owns the embedder, the embedding cache and the index sink
//! for the lifetime of a run. Drivers are sequential: extract, embed each
//! text (cache first), assemble records, then hand batches to the sink
//! under the uniform upload policy.

use indexfeed_core::fingerprint::fingerprint_fields;
use indexfeed_core::record::SourceDocument;
use indexfeed_core::{Batch, Config, IngestError};

use crate::assemble::{assemble, RecordParts};
use crate::chunker::chunk_document;
use crate::embedding::{Embedder, EmbeddingCache, OpenAiEmbedder};
use crate::extract::{csv, db, pdf, web};
use crate::retry;
use crate::sink::{upload_batches, IndexSink, SearchRestSink, UploadStats};

const EMBED_CACHE_CAPACITY: usize = 4096;

pub struct PipelineContext {
    config: Config,
    embedder: Box<dyn Embedder>,
    sink: Box<dyn IndexSink>,
    cache: EmbeddingCache,
}

impl PipelineContext {
    pub fn new(config: Config, embedder: Box<dyn Embedder>, sink: Box<dyn IndexSink>) -> Self {
        Self {
            config,
            embedder,
            sink,
            cache: EmbeddingCache::new(EMBED_CACHE_CAPACITY),
        }
    }

    /// Build the production context: OpenAI-compatible embedder, REST sink.
    pub fn from_config(config: Config) -> Result<Self, IngestError> {
        config.validate()?;
        let embedder = OpenAiEmbedder::from_config(&config.embedding)?;
        let sink = SearchRestSink::from_config(&config.search)?;
        Ok(Self::new(config, Box::new(embedder), Box::new(sink)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Embed one text, consulting the cache first. Transient failures are
    /// retried with backoff; a final failure aborts the current driver.
    async fn embed_one(&mut self, text: &str) -> Result<Vec<f32>, IngestError> {
        if let Some(vector) = self.cache.get(text) {
            return Ok(vector);
        }
        let embedder = self.embedder.as_ref();
        let inputs = [text];
        let vectors = retry::with_backoff(&self.config.retry, "embedding", || {
            embedder.embed_batch(&inputs)
        })
        .await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::Embedding("service returned no vectors".into()))?;
        self.cache.put(text, vector.clone());
        Ok(vector)
    }

    async fn embed_records(&mut self, parts: Vec<RecordParts>) -> Result<Batch, IngestError> {
        let dimensions = self.embedder.dimensions();
        let mut batch = Vec::with_capacity(parts.len());
        for part in parts {
            let vector = self.embed_one(&part.content).await?;
            batch.push(assemble(part, vector, dimensions)?);
        }
        Ok(batch)
    }

    // ── Drivers ──────────────────────────────────────────────────────────

    /// Ingest a product catalog: one record per CSV row, one batch per run.
    pub async fn ingest_csv(&mut self, path: &std::path::Path) -> Result<UploadStats, IngestError> {
        let parts = csv::extract(path, &self.config.csv)?;
        let batch = self.embed_records(parts).await?;
        Ok(upload_batches(self.sink.as_ref(), &self.config.retry, vec![batch]).await)
    }

    /// Ingest a directory of PDFs: one record per page, one batch per run.
    pub async fn ingest_pdf_dir(
        &mut self,
        dir: &std::path::Path,
    ) -> Result<UploadStats, IngestError> {
        let algorithm = self.config.fingerprint.algorithm()?;
        let parts = pdf::extract_dir(dir, algorithm, &self.config.pdf)?;
        let batch = self.embed_records(parts).await?;
        Ok(upload_batches(self.sink.as_ref(), &self.config.retry, vec![batch]).await)
    }

    /// Crawl a site: one record per fetched page, one batch per run.
    pub async fn ingest_web(&mut self, start_url: &str) -> Result<UploadStats, IngestError> {
        let algorithm = self.config.fingerprint.algorithm()?;
        let crawler = web::Crawler::from_config(&self.config.crawl, algorithm)?;
        let parts = crawler.crawl(start_url).await?;
        let batch = self.embed_records(parts).await?;
        Ok(upload_batches(self.sink.as_ref(), &self.config.retry, vec![batch]).await)
    }

    /// Ingest the wiki database: each page chunked into one batch of its
    /// own, so a page that fails (unknown markup format, embedding error)
    /// is logged and skipped without losing the rest.
    pub async fn ingest_db(&mut self) -> Result<UploadStats, IngestError> {
        let url = self
            .config
            .database
            .url
            .clone()
            .ok_or_else(|| IngestError::Config("WIKI_DATABASE_URL is not set".into()))?;
        let pool = db::connect(&url).await?;
        let rows = db::fetch_latest_pages(&pool).await?;

        // Each page is embedded and uploaded before the next is touched, so
        // the full result set is never held as embedded records.
        let total = rows.len();
        let mut stats = UploadStats::default();
        for (index, row) in rows.into_iter().enumerate() {
            tracing::info!(page = index + 1, total, title = %row.title, "processing wiki page");
            match self.wiki_row_batch(&row).await {
                Ok(batch) => {
                    let uploaded =
                        upload_batches(self.sink.as_ref(), &self.config.retry, vec![batch]).await;
                    stats.absorb(uploaded);
                }
                Err(err) => {
                    tracing::warn!(title = %row.title, error = %err, "skipping wiki page");
                }
            }
        }
        Ok(stats)
    }

    /// Chunk and embed one wiki page. The chunk id fingerprints the page
    /// title, the chunk position and the chunk text, so unchanged chunks
    /// keep their ids across runs.
    async fn wiki_row_batch(&mut self, row: &db::WikiRow) -> Result<Batch, IngestError> {
        let algorithm = self.config.fingerprint.algorithm()?;
        let chunking = self.config.chunking.clone();
        let url = db::page_url(&self.config.database.wiki_base_url, &row.description, &row.title);

        let document = SourceDocument {
            locator: url.clone(),
            title: row.title.clone(),
            raw_text: row.content.clone(),
            format: row.format.parse()?,
        };
        let chunks = chunk_document(&document, &chunking)?;

        let dimensions = self.embedder.dimensions();
        let mut batch = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let position = chunk.sequence_index.to_string();
            let id = fingerprint_fields(algorithm, &[&row.title, &position, &chunk.text]);
            let vector = self.embed_one(&chunk.text).await?;
            let parts = RecordParts {
                id,
                content: chunk.text,
                filepath: url.clone(),
                title: row.title.clone(),
                url: url.clone(),
            };
            batch.push(assemble(parts, vector, dimensions)?);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use indexfeed_core::config::{
        ChunkingConfig, CrawlConfig, CsvConfig, DatabaseConfig, EmbeddingConfig,
        FingerprintConfig, PdfConfig, RetryConfig, SearchConfig,
    };

    use crate::embedding::EmbeddingError;
    use crate::sink::test_support::MemorySink;

    use super::*;

    /// Deterministic embedder: a small vector derived from text length,
    /// with a call counter for cache assertions.
    struct FakeEmbedder {
        dimensions: usize,
        calls: Arc<AtomicUsize>,
    }

    impl FakeEmbedder {
        fn new(dimensions: usize) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    dimensions,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32; self.dimensions])
                .collect())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    fn test_config() -> Config {
        Config {
            embedding: EmbeddingConfig {
                endpoint: "http://localhost".into(),
                api_key: None,
                model: "text-embedding-ada-002".into(),
                timeout_secs: 5,
            },
            search: SearchConfig {
                endpoint: "http://localhost".into(),
                api_key: None,
                index_name: "documents".into(),
            },
            database: DatabaseConfig {
                url: None,
                wiki_base_url: "https://wiki.example.com/-/wiki".into(),
            },
            chunking: ChunkingConfig {
                chunk_size: 500,
                chunk_overlap: 30,
                max_header_level: 4,
            },
            fingerprint: FingerprintConfig {
                algorithm: "sha256".into(),
            },
            csv: CsvConfig {
                content_column: "description".into(),
            },
            crawl: CrawlConfig {
                session_cookie: None,
                max_pages: 100,
            },
            pdf: PdfConfig {
                legacy_page_ids: false,
            },
            retry: RetryConfig {
                max_attempts: 1,
                base_delay_ms: 1,
            },
        }
    }

    fn context(sink: MemorySink) -> (PipelineContext, Arc<AtomicUsize>) {
        let (embedder, calls) = FakeEmbedder::new(8);
        (
            PipelineContext::new(test_config(), Box::new(embedder), Box::new(sink)),
            calls,
        )
    }

    #[tokio::test]
    async fn csv_run_uploads_one_batch_of_all_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name,description").unwrap();
        writeln!(file, "1,Alpha Widget,First widget").unwrap();
        writeln!(file, "2,Beta Widget,Second widget").unwrap();

        let (mut ctx, _) = context(MemorySink::new());
        let stats = ctx.ingest_csv(file.path()).await.unwrap();

        assert_eq!(stats.uploaded_batches, 1);
        assert_eq!(stats.uploaded_records, 2);
    }

    #[tokio::test]
    async fn repeated_text_is_embedded_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name,description").unwrap();
        writeln!(file, "1,A,same copy").unwrap();
        writeln!(file, "2,B,same copy").unwrap();
        writeln!(file, "3,C,different copy").unwrap();

        let (mut ctx, calls) = context(MemorySink::new());
        ctx.ingest_csv(file.path()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_source_skips_the_sink() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name,description").unwrap();

        let (mut ctx, _) = context(MemorySink::new());
        let stats = ctx.ingest_csv(file.path()).await.unwrap();

        assert_eq!(stats.skipped_batches, 1);
        assert_eq!(stats.uploaded_batches, 0);
    }

    #[tokio::test]
    async fn wiki_row_becomes_a_batch_of_chunks() {
        let (mut ctx, _) = context(MemorySink::new());
        let row = db::WikiRow {
            description: "Product Docs".into(),
            title: "Getting Started".into(),
            content: "= Setup =\nInstall the package.\n\n= Usage =\nRun the binary.".into(),
            format: "creole".into(),
        };
        let batch = ctx.wiki_row_batch(&row).await.unwrap();

        assert!(!batch.is_empty());
        let ids: std::collections::HashSet<_> = batch.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), batch.len());
        for record in &batch {
            assert_eq!(record.title, "Getting Started");
            assert_eq!(
                record.url,
                "https://wiki.example.com/-/wiki/Product+Docs/Getting+Started"
            );
            assert_eq!(record.filepath, record.url);
        }
    }

    #[tokio::test]
    async fn unknown_wiki_format_is_an_error() {
        let (mut ctx, _) = context(MemorySink::new());
        let row = db::WikiRow {
            description: "Docs".into(),
            title: "Page".into(),
            content: "text".into(),
            format: "asciidoc".into(),
        };
        assert!(ctx.wiki_row_batch(&row).await.is_err());
    }

    #[tokio::test]
    async fn chunk_ids_are_stable_across_runs() {
        let row = db::WikiRow {
            description: "Docs".into(),
            title: "Stable Page".into(),
            content: "Plain paragraph of content.".into(),
            format: "plain".into(),
        };

        let (mut ctx_a, _) = context(MemorySink::new());
        let (mut ctx_b, _) = context(MemorySink::new());
        let batch_a = ctx_a.wiki_row_batch(&row).await.unwrap();
        let batch_b = ctx_b.wiki_row_batch(&row).await.unwrap();

        let ids_a: Vec<_> = batch_a.iter().map(|r| &r.id).collect();
        let ids_b: Vec<_> = batch_b.iter().map(|r| &r.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
