use std::collections::HashMap;

use pdfqa_llm::{LlmError, LlmProvider};
use serde_json::json;

use super::{Chunk, DocumentError, TextSplitter};
use crate::in_memory_store::InMemoryVectorStore;
use crate::vector_store::{VectorPoint, VectorStore};

const COLLECTION: &str = "document";

/// Per-question retrieval: split the document, embed every chunk, and return
/// the chunks nearest to the question. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct RetrievalPipeline {
    splitter: TextSplitter,
    top_k: usize,
}

impl RetrievalPipeline {
    #[must_use]
    pub fn new(splitter: TextSplitter, top_k: usize) -> Self {
        Self {
            splitter,
            top_k: top_k.max(1),
        }
    }

    /// Return at most `top_k` chunks of `text`, most similar to `question` first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or the provider returns a
    /// mismatched number of vectors.
    pub async fn retrieve<P: LlmProvider>(
        &self,
        provider: &P,
        text: &str,
        question: &str,
    ) -> Result<Vec<Chunk>, DocumentError> {
        let chunks = self.splitter.split(text);
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = provider.embed_batch(&contents).await?;
        if vectors.len() != chunks.len() {
            return Err(DocumentError::Embedding(LlmError::Other(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            ))));
        }

        let dimension = vectors.first().map_or(0, Vec::len) as u64;
        let store = InMemoryVectorStore::new();
        store.ensure_collection(COLLECTION, dimension).await?;

        let points = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| VectorPoint {
                id: format!("{:08}", chunk.chunk_index),
                vector,
                payload: HashMap::from([("chunk_index".to_owned(), json!(chunk.chunk_index))]),
            })
            .collect();
        store.upsert(COLLECTION, points).await?;

        let query = provider.embed(question).await?;
        let hits = store.search(COLLECTION, query, self.top_k as u64).await?;

        tracing::debug!(
            chunks = chunks.len(),
            hits = hits.len(),
            "retrieved context chunks"
        );

        Ok(hits
            .iter()
            .filter_map(|hit| {
                let index = usize::try_from(hit.payload.get("chunk_index")?.as_u64()?).ok()?;
                chunks.get(index).cloned()
            })
            .collect())
    }
}
