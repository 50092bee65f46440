// Services used by the document pipeline

pub mod embedding;
#[cfg(feature = "local-embeddings")]
pub mod local_embedding;

pub use embedding::{EmbeddingService, OpenAICompatibleEmbeddingService};
#[cfg(feature = "local-embeddings")]
pub use local_embedding::LocalEmbeddingService;
