//! SQLite-backed document persistence with in-memory vector retrieval.

pub mod document;
pub mod error;
pub mod in_memory_store;
pub mod sqlite;
pub mod types;
pub mod vector_store;

pub use error::MemoryError;
pub use in_memory_store::InMemoryVectorStore;
pub use sqlite::SqliteStore;
pub use types::{DocumentId, DocumentSummary};
