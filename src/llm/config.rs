//! Provider configuration and service construction

use super::ollama::{OllamaService, DEFAULT_OLLAMA_HOST};
use super::openai::{OpenAIService, DEFAULT_OPENAI_BASE_URL};
use super::{LlmService, LoggingService};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// HTTP request timeout applied by every provider
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Ollama,
    OpenAI,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Ollama => "Ollama",
            Provider::OpenAI => "OpenAI",
        }
    }

    /// Model used when `REASONING_MODEL` is unset
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Ollama => "llama3.1:8b",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown provider '{0}' (expected 'ollama' or 'openai')")]
    UnknownProvider(String),
    #[error("OPENAI_API_KEY must be set when REASONING_PROVIDER=openai")]
    MissingApiKey,
    #[error("failed to construct {provider} client: {message}")]
    Client {
        provider: &'static str,
        message: String,
    },
}

/// Configuration for the model collaborator
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub provider: Provider,
    /// Model name; falls back to the provider default
    pub model: Option<String>,
    pub ollama_host: Option<String>,
    pub openai_api_key: Option<String>,
    /// Base URL for any OpenAI-compatible backend
    pub openai_base_url: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let provider = match lookup("REASONING_PROVIDER") {
            Some(value) if !value.trim().is_empty() => Provider::parse(&value)?,
            _ => Provider::default(),
        };

        Ok(Self {
            provider,
            model: lookup("REASONING_MODEL").filter(|m| !m.is_empty()),
            ollama_host: lookup("OLLAMA_HOST").filter(|h| !h.is_empty()),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()),
            openai_base_url: lookup("OPENAI_BASE_URL").filter(|u| !u.is_empty()),
        })
    }

    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Construct the configured service, wrapped with logging
    pub fn build_service(&self) -> Result<Arc<dyn LlmService>, ConfigError> {
        let provider = self.provider.display_name();
        let client_error = |e: super::LlmError| ConfigError::Client {
            provider,
            message: e.message,
        };

        let service: Arc<dyn LlmService> = match self.provider {
            Provider::Ollama => {
                let host = self.ollama_host.as_deref().unwrap_or(DEFAULT_OLLAMA_HOST);
                Arc::new(
                    OllamaService::new(host, self.model_name(), REQUEST_TIMEOUT)
                        .map_err(client_error)?,
                )
            }
            Provider::OpenAI => {
                let api_key = self
                    .openai_api_key
                    .clone()
                    .ok_or(ConfigError::MissingApiKey)?;
                let base_url = self
                    .openai_base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_OPENAI_BASE_URL);
                Arc::new(
                    OpenAIService::new(api_key, base_url, self.model_name(), REQUEST_TIMEOUT)
                        .map_err(client_error)?,
                )
            }
        };

        Ok(Arc::new(LoggingService::new(service)))
    }
}
