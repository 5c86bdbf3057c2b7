//! Memory implementations for agentry: conversation buffers and an
//! in-memory vector store with keyword and embedding retrieval.

pub mod buffer;
pub mod in_memory;
pub mod loader;
pub mod vector;

pub use buffer::BufferMemory;
pub use in_memory::InMemoryVectorStore;
pub use loader::load_documents;
pub use vector::{cosine_similarity, reciprocal_rank_fusion};
