use serde::Serialize;

/// Opaque document handle: a random UUID v4 rendered as a hyphenated string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::Type, Serialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing row: everything about a document except its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub filename: String,
    pub upload_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn document_id_display() {
        let id = DocumentId("abc".into());
        assert_eq!(format!("{id}"), "abc");
    }

    #[test]
    fn summary_serializes_id_as_plain_string() {
        let summary = DocumentSummary {
            id: DocumentId("abc".into()),
            filename: "a.pdf".into(),
            upload_date: "2024-01-01 00:00:00".into(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "abc", "filename": "a.pdf", "upload_date": "2024-01-01 00:00:00"})
        );
    }
}
