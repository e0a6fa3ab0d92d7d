use std::path::Path;

use super::super::DocumentError;

/// Extracts the text layer of a PDF page by page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    /// Extract the text of every page, concatenated in page order with no separator.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Pdf`] if the file cannot be parsed and
    /// [`DocumentError::EmptyText`] if no non-whitespace text was found.
    pub async fn load(&self, path: &Path) -> Result<String, DocumentError> {
        let path_buf = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_by_pages(&path_buf)
                .map_err(|e| DocumentError::Pdf(e.to_string()))
        })
        .await
        .map_err(|e| DocumentError::Pdf(format!("extraction task failed: {e}")))??;

        tracing::debug!(path = %path.display(), pages = pages.len(), "extracted PDF text");

        let text = pages.concat();
        if text.trim().is_empty() {
            return Err(DocumentError::EmptyText);
        }
        Ok(text)
    }
}
