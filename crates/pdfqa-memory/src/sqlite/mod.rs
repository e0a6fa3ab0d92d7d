mod documents;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::MemoryError;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the `SQLite` database and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let in_memory = path == ":memory:";
        let url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let opts = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        // Each connection to `sqlite::memory:` is a separate database.
        let max_connections = if in_memory { 1 } else { 5 };

        let mut pool_opts = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            // Dropping the only connection discards the database.
            pool_opts = pool_opts.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_opts.connect_with(opts).await?;

        sqlx::migrate!("../../migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn wal_journal_mode_enabled_on_file_db() {
        let file = NamedTempFile::new().expect("tempfile");
        let path = file.path().to_str().expect("valid path");

        let store = SqliteStore::new(path).await.expect("SqliteStore::new");

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(store.pool())
            .await
            .expect("PRAGMA query");

        assert_eq!(mode, "wal", "expected WAL journal mode, got: {mode}");
    }

    #[tokio::test]
    async fn migrations_create_documents_table() {
        let store = SqliteStore::new(":memory:").await.unwrap();
        let columns: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_table_info('documents') ORDER BY cid")
                .fetch_all(store.pool())
                .await
                .unwrap();
        let names: Vec<_> = columns.into_iter().map(|(n,)| n).collect();
        assert_eq!(names, vec!["id", "filename", "upload_date", "text_content"]);
    }

    #[tokio::test]
    async fn reopening_file_db_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.db");
        let path = path.to_str().unwrap();

        let store = SqliteStore::new(path).await.unwrap();
        store
            .create_document(&crate::DocumentId("persisted".into()), "a.pdf", "text")
            .await
            .unwrap();
        store.pool().close().await;

        let reopened = SqliteStore::new(path).await.unwrap();
        let text = reopened
            .document_text(&crate::DocumentId("persisted".into()))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("text"));
    }
}
