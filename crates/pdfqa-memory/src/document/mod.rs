pub mod error;
pub mod loader;
pub mod pipeline;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use loader::PdfLoader;
pub use pipeline::RetrievalPipeline;
pub use splitter::{SplitterConfig, TextSplitter};
pub use types::Chunk;
