use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Markup format of a source document. Closed set: chunking strategies
/// dispatch over this enum, and an unknown format string from a source
/// fails fast instead of falling back to a generic split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Plain,
    Creole,
    Html,
}

impl FromStr for SourceFormat {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(SourceFormat::Plain),
            "creole" => Ok(SourceFormat::Creole),
            "html" => Ok(SourceFormat::Html),
            other => Err(IngestError::Config(format!(
                "unsupported source format: {other}"
            ))),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Plain => write!(f, "plain"),
            SourceFormat::Creole => write!(f, "creole"),
            SourceFormat::Html => write!(f, "html"),
        }
    }
}

/// Normalized output of a content extractor: one logical document with its
/// origin locator (path, URL or database key). Immutable; consumed once by
/// the chunker or assembled directly into a record.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub locator: String,
    pub title: String,
    pub raw_text: String,
    pub format: SourceFormat,
}

/// A bounded-size fragment of a source document.
///
/// `sequence_index` is stable across re-runs of the same source; it feeds
/// fingerprint derivation, so reordering would change record ids.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub parent_locator: String,
    pub sequence_index: usize,
    pub text: String,
    /// Ordered (level, heading) pairs scoping this chunk, outermost first.
    pub header_path: Vec<(u8, String)>,
}

/// Terminal record handed to the index sink. Field names match the persisted
/// index schema; only the vector field is camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedRecord {
    pub id: String,
    pub content: String,
    pub filepath: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "contentVector")]
    pub content_vector: Vec<f32>,
}

/// An ordered group of records submitted to the sink in one upload call.
/// Batches are independent of each other (keyed by their own record ids),
/// which is what makes per-batch failure isolation safe.
pub type Batch = Vec<EmbeddedRecord>;
