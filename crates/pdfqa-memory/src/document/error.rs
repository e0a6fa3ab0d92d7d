#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("no text could be extracted")]
    EmptyText,

    #[error("embedding failed: {0}")]
    Embedding(#[from] pdfqa_llm::LlmError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] crate::vector_store::VectorStoreError),
}
