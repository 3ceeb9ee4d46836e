//! Source extractors: one module per ingestion path.
//!
//! Each extractor turns an external source (CSV catalog, PDF directory,
//! crawled site, wiki database) into the scalar record fields the pipeline
//! embeds and uploads. Extractors never talk to the embedding service or
//! the index; that separation keeps them testable against plain fixtures.

pub mod csv;
pub mod db;
pub mod pdf;
pub mod web;
