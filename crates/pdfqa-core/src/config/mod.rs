mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use crate::secret::Secret;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings the services cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        let r = &self.retrieval;
        if r.chunk_size == 0 {
            bail!("retrieval.chunk_size must be greater than 0");
        }
        if r.chunk_overlap >= r.chunk_size {
            bail!(
                "retrieval.chunk_overlap ({}) must be smaller than retrieval.chunk_size ({})",
                r.chunk_overlap,
                r.chunk_size
            );
        }
        if r.top_k == 0 {
            bail!("retrieval.top_k must be greater than 0");
        }
        if self.timeouts.llm_seconds == 0 || self.timeouts.embedding_seconds == 0 {
            bail!("timeouts must be greater than 0");
        }
        self.api_key()?;
        Ok(())
    }

    /// API key for the selected provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not set in the environment.
    pub fn api_key(&self) -> anyhow::Result<&Secret> {
        match self.llm.provider {
            ProviderKind::Gemini => self
                .secrets
                .gemini_api_key
                .as_ref()
                .context("GEMINI_API_KEY is not set"),
            ProviderKind::OpenAi => self
                .secrets
                .openai_api_key
                .as_ref()
                .context("OPENAI_API_KEY is not set"),
        }
    }
}

/// Priority: `--config` argument, then `PDFQA_CONFIG`, then `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("PDFQA_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
