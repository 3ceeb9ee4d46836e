//! Ingestion pipeline feeding a hosted vector-search index.
//!
//! ```text
//! CSV row / PDF page / crawled page ──► one pending record each
//! wiki DB row ──► chunker (format-dependent) ──► one pending record per chunk
//!
//! pending record ──► fingerprint id ──► embedding (cached, retried)
//!                ──► assemble ──► EmbeddedRecord ──► batches ──► IndexSink
//! ```
//!
//! Each driver in [`pipeline`] handles one source kind and feeds the same
//! tail. External collaborators (embedding API, index service) live behind
//! the [`embedding::Embedder`] and [`sink::IndexSink`] traits.

pub mod assemble;
pub mod chunker;
pub mod embedding;
pub mod extract;
pub mod pipeline;
pub mod retry;
pub mod sink;

pub use pipeline::PipelineContext;
