use anyhow::Context;
use pdfqa_llm::AnyProvider;
use pdfqa_llm::gemini::{self, GeminiProvider};
use pdfqa_llm::openai::{self, OpenAiProvider};

use crate::config::{Config, ProviderKind};

const OPENAI_DEFAULT_MAX_TOKENS: u32 = 1024;

/// Build the hosted model client selected by `config.llm.provider`.
///
/// # Errors
///
/// Returns an error if the API key for the selected provider is missing.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    match llm.provider {
        ProviderKind::Gemini => {
            let api_key = config
                .secrets
                .gemini_api_key
                .as_ref()
                .context("GEMINI_API_KEY is not set")?
                .expose()
                .to_owned();
            let base_url = llm
                .base_url
                .clone()
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_owned());
            Ok(AnyProvider::Gemini(
                GeminiProvider::new(
                    api_key,
                    base_url,
                    llm.model.clone(),
                    llm.embedding_model.clone(),
                    llm.temperature,
                )
                .with_max_tokens(llm.max_tokens),
            ))
        }
        ProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .context("OPENAI_API_KEY is not set")?
                .expose()
                .to_owned();
            let base_url = llm
                .base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_owned());
            Ok(AnyProvider::OpenAi(OpenAiProvider::new(
                api_key,
                base_url,
                llm.model.clone(),
                llm.max_tokens.unwrap_or(OPENAI_DEFAULT_MAX_TOKENS),
                llm.temperature,
                Some(llm.embedding_model.clone()),
            )))
        }
    }
}
