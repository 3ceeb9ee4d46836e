//! Embedding capability: the call contract and its implementations.

pub mod cache;
pub mod openai;
pub mod traits;

pub use cache::EmbeddingCache;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};
