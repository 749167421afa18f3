//! Env-driven provider selection.

use std::str::FromStr;
use std::sync::Arc;

use crate::{AiProvider, AnthropicProvider, OpenAiCompatProvider, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn required_api_key_env(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            _ => Err(ProviderError::Message(format!(
                "unsupported provider '{value}', expected one of: openai, anthropic"
            ))),
        }
    }
}

pub fn create_provider(kind: ProviderKind, api_key: impl Into<String>) -> Arc<dyn AiProvider> {
    let key = api_key.into();

    match kind {
        ProviderKind::OpenAi => Arc::new(OpenAiCompatProvider::new(key)),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(key)),
    }
}

/// Build the provider named by `SITEBRIDGE_PROVIDER` (default `openai`) from
/// its API-key environment variable.
pub fn create_provider_from_env() -> Result<Arc<dyn AiProvider>, ProviderError> {
    let provider_name =
        std::env::var("SITEBRIDGE_PROVIDER").unwrap_or_else(|_| "openai".to_string());
    let kind = ProviderKind::from_str(&provider_name)?;

    let api_key_env = kind.required_api_key_env();
    let api_key = std::env::var(api_key_env).map_err(|_| {
        ProviderError::Message(format!(
            "missing required environment variable '{api_key_env}' for provider '{}'",
            kind.as_str()
        ))
    })?;

    if api_key.trim().is_empty() {
        return Err(ProviderError::Message(format!(
            "environment variable '{api_key_env}' is empty for provider '{}'",
            kind.as_str()
        )));
    }

    Ok(create_provider(kind, api_key))
}
