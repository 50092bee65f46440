// Document processing: text extraction, cleaning and chunking

pub mod chunk;
pub mod text;

pub use chunk::{chunker, ChunkingOptions};
pub use text::extractors::{file_extension, load_document, SUPPORTED_EXTENSIONS};
pub use text::normalization::clean_text;
