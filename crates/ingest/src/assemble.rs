//! Record assembly: the last pure step before upload.

use indexfeed_core::{EmbeddedRecord, IngestError};

/// Scalar fields of a record, gathered by the driver before embedding.
#[derive(Debug, Clone)]
pub struct RecordParts {
    pub id: String,
    pub content: String,
    pub filepath: String,
    pub title: String,
    pub url: String,
}

/// Combine record fields with an embedding vector, enforcing that the
/// vector length matches the dimension implied by the configured model.
/// A mismatch means the service answered with a different model than was
/// configured; it is a fatal configuration error, never a stored record.
pub fn assemble(
    parts: RecordParts,
    vector: Vec<f32>,
    expected_dimensions: usize,
) -> Result<EmbeddedRecord, IngestError> {
    if vector.len() != expected_dimensions {
        return Err(IngestError::Config(format!(
            "vector dimension mismatch for record {}: expected {expected_dimensions}, got {}",
            parts.id,
            vector.len()
        )));
    }
    Ok(EmbeddedRecord {
        id: parts.id,
        content: parts.content,
        filepath: parts.filepath,
        title: parts.title,
        url: parts.url,
        content_vector: vector,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> RecordParts {
        RecordParts {
            id: "fp123".into(),
            content: "chunk text".into(),
            filepath: "docs/page".into(),
            title: "Page".into(),
            url: "https://example.com/page".into(),
        }
    }

    #[test]
    fn round_trip_preserves_content_and_id() {
        let record = assemble(parts(), vec![0.0; 1536], 1536).unwrap();
        assert_eq!(record.id, "fp123");
        assert_eq!(record.content, "chunk text");
        assert_eq!(record.content_vector.len(), 1536);
    }

    #[test]
    fn large_model_dimension_accepted() {
        let record = assemble(parts(), vec![0.0; 3072], 3072).unwrap();
        assert_eq!(record.content_vector.len(), 3072);
    }

    #[test]
    fn mismatched_vector_is_a_config_error() {
        let err = assemble(parts(), vec![0.0; 768], 1536).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
        assert!(err.to_string().contains("fp123"));
    }
}
