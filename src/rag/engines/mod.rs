// Vector store implementations

pub mod qdrant;
pub mod simple_vector;
pub mod traits;

pub use qdrant::QdrantStore;
pub use simple_vector::SimpleVectorStore;
pub use traits::VectorStore;
