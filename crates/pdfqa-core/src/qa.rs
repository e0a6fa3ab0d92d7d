use std::time::Duration;

use pdfqa_llm::{AnyProvider, LlmError, LlmProvider, Message};
use pdfqa_memory::document::{Chunk, DocumentError, RetrievalPipeline};
use pdfqa_memory::{DocumentId, MemoryError, SqliteStore};

/// Returned when the model produces no answer text.
pub const FALLBACK_ANSWER: &str = "I don't know. Thanks for asking!";

const PROMPT_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer. \
Keep the answer as concise as possible.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Found(String),
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("document has no extractable text")]
    EmptyDocument,

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] DocumentError),

    #[error("model request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("{0} request timed out")]
    UpstreamTimeout(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] MemoryError),
}

/// Answers questions about one stored document at a time.
#[derive(Debug, Clone)]
pub struct QaService {
    store: SqliteStore,
    provider: AnyProvider,
    pipeline: RetrievalPipeline,
    llm_timeout: Duration,
    embedding_timeout: Duration,
}

impl QaService {
    #[must_use]
    pub fn new(store: SqliteStore, provider: AnyProvider, pipeline: RetrievalPipeline) -> Self {
        Self {
            store,
            provider,
            pipeline,
            llm_timeout: Duration::from_secs(120),
            embedding_timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, llm: Duration, embedding: Duration) -> Self {
        self.llm_timeout = llm;
        self.embedding_timeout = embedding;
        self
    }

    /// Answer `question` from the text of document `pdf_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document has no text, retrieval or the model
    /// call fails, or either upstream call exceeds its timeout.
    pub async fn answer(&self, pdf_id: &DocumentId, question: &str) -> Result<Answer, QaError> {
        let Some(text) = self.store.document_text(pdf_id).await? else {
            return Ok(Answer::NotFound);
        };
        if text.trim().is_empty() {
            return Err(QaError::EmptyDocument);
        }

        let context = tokio::time::timeout(
            self.embedding_timeout,
            self.pipeline.retrieve(&self.provider, &text, question),
        )
        .await
        .map_err(|_| QaError::UpstreamTimeout("embedding"))??;
        if context.is_empty() {
            return Err(QaError::EmptyDocument);
        }

        let prompt = build_prompt(&context, question);
        let reply = tokio::time::timeout(
            self.llm_timeout,
            self.provider.chat(&[Message::user(prompt)]),
        )
        .await
        .map_err(|_| QaError::UpstreamTimeout("language model"))?;

        let answer = match reply {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) | Err(LlmError::EmptyResponse { .. }) => {
                tracing::debug!(%pdf_id, "model returned no answer text");
                FALLBACK_ANSWER.to_owned()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(%pdf_id, chunks = context.len(), "answered question");
        Ok(Answer::Found(answer))
    }
}

pub(crate) fn build_prompt(context: &[Chunk], question: &str) -> String {
    let context = context
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{PROMPT_PREAMBLE}\n{context}\nQuestion: {question}\nHelpful Answer:")
}
