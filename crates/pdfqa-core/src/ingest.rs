use std::path::{Path, PathBuf};

use pdfqa_memory::document::{DocumentError, PdfLoader};
use pdfqa_memory::{DocumentId, MemoryError, SqliteStore};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("File must be a PDF")]
    InvalidType,

    #[error("Failed to extract text from PDF")]
    Extraction(#[source] DocumentError),

    #[error("Failed to store PDF")]
    Io(#[from] std::io::Error),

    #[error("Failed to store PDF")]
    Storage(#[from] MemoryError),
}

/// Accepts uploaded PDF bytes, keeps the raw file, and stores its extracted text.
#[derive(Debug, Clone)]
pub struct PdfIngestor {
    store: SqliteStore,
    upload_dir: PathBuf,
    loader: PdfLoader,
}

impl PdfIngestor {
    #[must_use]
    pub fn new(store: SqliteStore, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            upload_dir: upload_dir.into(),
            loader: PdfLoader,
        }
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validate, persist, and extract one uploaded file.
    ///
    /// Only the declared content type is checked. The raw file is written
    /// before extraction and left in place if extraction fails.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidType`] for non-PDF uploads (nothing is
    /// written), [`IngestError::Extraction`] when no text can be read, and
    /// `Io`/`Storage` when the file or row cannot be saved.
    pub async fn ingest(
        &self,
        filename: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<DocumentId, IngestError> {
        if content_type != Some(PDF_CONTENT_TYPE) {
            tracing::info!(?content_type, "rejected upload with non-PDF content type");
            return Err(IngestError::InvalidType);
        }

        let id = DocumentId::generate();
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_dir.join(format!("{id}.pdf"));
        tokio::fs::write(&path, bytes).await?;

        let text = self.loader.load(&path).await.map_err(|e| {
            tracing::warn!(%id, path = %path.display(), "text extraction failed: {e}");
            IngestError::Extraction(e)
        })?;

        let filename = filename.unwrap_or_default();
        self.store.create_document(&id, filename, &text).await?;
        tracing::info!(%id, filename, bytes = bytes.len(), "stored uploaded PDF");
        Ok(id)
    }
}
