//! Format-aware chunking engine.
//!
//! Markup sources are first rendered/fragmented at header boundaries, then
//! every fragment is cut into size-bounded windows with a fixed character
//! overlap. Dispatch is over the closed [`SourceFormat`] enum, so a new
//! format cannot be added without a splitting strategy.

mod creole;
mod html;
mod splitter;


pub use html::Fragment;
pub use splitter::split_windows;

use indexfeed_core::config::ChunkingConfig;
use indexfeed_core::{Chunk, IngestError, SourceDocument, SourceFormat};

/// Split a source document into chunks using the strategy for its format.
///
/// Chunk `sequence_index` values are assigned in document order and are
/// stable across re-runs of the same input; they feed fingerprints.
pub fn chunk_document(
    doc: &SourceDocument,
    config: &ChunkingConfig,
) -> Result<Vec<Chunk>, IngestError> {
    config.validate()?;

    let fragments = match doc.format {
        SourceFormat::Plain => vec![Fragment {
            header_path: Vec::new(),
            text: doc.raw_text.clone(),
        }],
        SourceFormat::Html => html::split_at_headers(&doc.raw_text, config.max_header_level),
        SourceFormat::Creole => {
            let rendered = creole::to_html(&doc.raw_text);
            html::split_at_headers(&rendered, config.max_header_level)
        }
    };

    let mut chunks = Vec::new();
    for fragment in &fragments {
        for window in split_windows(&fragment.text, config.chunk_size, config.chunk_overlap) {
            chunks.push(Chunk {
                parent_locator: doc.locator.clone(),
                sequence_index: chunks.len(),
                text: window,
                header_path: fragment.header_path.clone(),
            });
        }
    }

    tracing::debug!(
        locator = %doc.locator,
        format = %doc.format,
        fragments = fragments.len(),
        chunks = chunks.len(),
        "chunked document"
    );
    Ok(chunks)
}
