use thiserror::Error;

/// Error taxonomy for the ingestion pipeline.
///
/// `Config` is fatal at startup (or for the single record it concerns);
/// `Network`, `Parse` and `Upload` are recovered locally by skipping the
/// affected item or batch with a logged warning.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error for {locator}: {reason}")]
    Network { locator: String, reason: String },

    #[error("parse error for {locator}: {reason}")]
    Parse { locator: String, reason: String },

    #[error("upload of {count} records failed: {reason}")]
    Upload { count: usize, reason: String },

    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(String),
}

impl IngestError {
    pub fn network(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(locator: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }
}
