use crate::gemini::GeminiProvider;
#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;

use crate::provider::{LlmProvider, Message};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given closure for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Gemini($p) => $expr,
            AnyProvider::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Gemini(GeminiProvider),
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl LlmProvider for AnyProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, crate::LlmError> {
        delegate_provider!(self, |p| p.chat(messages).await)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, crate::LlmError> {
        delegate_provider!(self, |p| p.embed_batch(texts).await)
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_gemini_name() {
        let provider = AnyProvider::Gemini(GeminiProvider::new(
            "key".into(),
            crate::gemini::DEFAULT_BASE_URL.into(),
            "gemini-1.5-pro".into(),
            "models/embedding-001".into(),
            0.2,
        ));
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn any_openai_debug() {
        let provider = AnyProvider::OpenAi(OpenAiProvider::new(
            "key".into(),
            crate::openai::DEFAULT_BASE_URL.into(),
            "gpt-4o-mini".into(),
            1024,
            0.2,
            None,
        ));
        let debug = format!("{provider:?}");
        assert!(debug.contains("OpenAi"));
        assert_eq!(provider.name(), "openai");
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn chat_dispatches_to_mock() {
        let provider = AnyProvider::Mock(MockProvider::with_responses(vec!["from mock".into()]));
        let answer = provider.chat(&[Message::user("q")]).await.unwrap();
        assert_eq!(answer, "from mock");
    }
}
