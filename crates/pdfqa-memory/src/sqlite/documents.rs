use super::SqliteStore;
use crate::error::MemoryError;
use crate::types::{DocumentId, DocumentSummary};

impl SqliteStore {
    /// Insert a new document stamped with the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when `id` already exists.
    pub async fn create_document(
        &self,
        id: &DocumentId,
        filename: &str,
        text_content: &str,
    ) -> Result<(), MemoryError> {
        sqlx::query(
            "INSERT INTO documents (id, filename, upload_date, text_content) \
             VALUES (?, ?, datetime('now'), ?)",
        )
        .bind(id)
        .bind(filename)
        .bind(text_content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load the extracted text of a document, or `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn document_text(&self, id: &DocumentId) -> Result<Option<String>, MemoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT text_content FROM documents WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(text,)| text))
    }

    /// List every stored document in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>, MemoryError> {
        let rows = sqlx::query_as::<_, DocumentSummary>(
            "SELECT id, filename, upload_date FROM documents ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
