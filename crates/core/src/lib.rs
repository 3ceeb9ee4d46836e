pub mod config;
pub mod error;
pub mod fingerprint;
pub mod record;

pub use config::Config;
pub use error::IngestError;
pub use fingerprint::HashAlgorithm;
pub use record::*;
