use std::str::FromStr;

use super::{Config, ProviderKind};
use crate::secret::Secret;

/// Parsed value of `key`, or `None` when unset or unparseable.
pub(super) fn parsed_env<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    let parsed = v.trim().parse::<T>().ok();
    if parsed.is_none() {
        tracing::warn!("ignoring invalid {key} value: {v}");
    }
    parsed
}

/// First non-empty value among `keys`.
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.trim().is_empty())
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_llm();
        self.apply_env_overrides_storage();
        self.apply_env_overrides_gateway();
        self.resolve_env_secrets();
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("PDFQA_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value::<ProviderKind>(serde_json::Value::String(
                v.to_lowercase(),
            )) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid PDFQA_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("PDFQA_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("PDFQA_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("PDFQA_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Some(t) = parsed_env::<f32>("PDFQA_LLM_TEMPERATURE") {
            self.llm.temperature = t;
        }
        if let Some(n) = parsed_env::<u32>("PDFQA_LLM_MAX_TOKENS") {
            self.llm.max_tokens = Some(n);
        }
        if let Some(secs) = parsed_env::<u64>("PDFQA_TIMEOUT_LLM") {
            self.timeouts.llm_seconds = secs;
        }
        if let Some(secs) = parsed_env::<u64>("PDFQA_TIMEOUT_EMBEDDING") {
            self.timeouts.embedding_seconds = secs;
        }
    }

    fn apply_env_overrides_storage(&mut self) {
        if let Ok(v) = std::env::var("PDFQA_SQLITE_PATH") {
            self.storage.sqlite_path = v;
        }
        if let Ok(v) = std::env::var("PDFQA_UPLOAD_DIR") {
            self.storage.upload_dir = v;
        }
        if let Some(n) = parsed_env::<usize>("PDFQA_CHUNK_SIZE") {
            self.retrieval.chunk_size = n;
        }
        if let Some(n) = parsed_env::<usize>("PDFQA_CHUNK_OVERLAP") {
            self.retrieval.chunk_overlap = n;
        }
        if let Some(n) = parsed_env::<usize>("PDFQA_TOP_K") {
            self.retrieval.top_k = n;
        }
    }

    fn apply_env_overrides_gateway(&mut self) {
        if let Ok(v) = std::env::var("PDFQA_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Some(port) = parsed_env::<u16>("PDFQA_GATEWAY_PORT") {
            self.gateway.port = port;
        }
        if let Some(limit) = parsed_env::<u32>("PDFQA_GATEWAY_RATE_LIMIT") {
            self.gateway.rate_limit = limit;
        }
        if let Some(secs) = parsed_env::<u64>("PDFQA_GATEWAY_RATE_WINDOW") {
            self.gateway.rate_window_secs = secs;
        }
        if let Some(size) = parsed_env::<usize>("PDFQA_GATEWAY_MAX_BODY_SIZE") {
            self.gateway.max_body_size = size;
        }
    }

    fn resolve_env_secrets(&mut self) {
        if let Some(key) = first_env(&["PDFQA_GEMINI_API_KEY", "GEMINI_API_KEY"]) {
            self.secrets.gemini_api_key = Some(Secret::new(key));
        }
        if let Some(key) = first_env(&["PDFQA_OPENAI_API_KEY", "OPENAI_API_KEY"]) {
            self.secrets.openai_api_key = Some(Secret::new(key));
        }
    }
}
