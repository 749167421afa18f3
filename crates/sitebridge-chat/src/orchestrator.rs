//! Conversation assembly and model invocation.

use std::sync::Arc;

use thiserror::Error;

use sitebridge_ai::retry::{retry, RetryPolicy};
use sitebridge_ai::{AiProvider, ChatTurn, CompletionRequest, ProviderError};

/// Caller-supplied history is capped at this many most-recent turns.
pub const HISTORY_LIMIT: usize = 6;
/// Fixed ceiling on the model's response length.
pub const RESPONSE_MAX_TOKENS: u32 = 1024;
/// Returned when the model answers with an empty payload.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str =
    "I could not produce an answer for that. Please try rephrasing your question.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Builds grounded conversations and completes them against a provider.
pub struct ChatOrchestrator {
    provider: Arc<dyn AiProvider>,
    retry: RetryPolicy,
    model: Option<String>,
}

impl ChatOrchestrator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Complete one user message against the target site's grounding text.
    ///
    /// Fails only after the retry policy is exhausted; the last observed
    /// provider error is surfaced.
    pub async fn complete(
        &self,
        target_url: &str,
        grounding_text: &str,
        user_message: &str,
        history: &[ChatTurn],
    ) -> Result<String, ChatError> {
        let messages = build_conversation(target_url, grounding_text, user_message, history);
        tracing::debug!(
            provider = self.provider.name(),
            turns = messages.len(),
            "completing grounded chat"
        );
        let request = CompletionRequest {
            messages,
            model: self.model.clone(),
            max_tokens: Some(RESPONSE_MAX_TOKENS),
            temperature: None,
        };

        let response = retry(self.retry, || self.provider.complete(request.clone())).await?;
        if response.content.trim().is_empty() {
            return Ok(EMPTY_RESPONSE_PLACEHOLDER.to_string());
        }
        Ok(response.content)
    }
}

fn build_conversation(
    target_url: &str,
    grounding_text: &str,
    user_message: &str,
    history: &[ChatTurn],
) -> Vec<ChatTurn> {
    let start = history.len().saturating_sub(HISTORY_LIMIT);
    let mut messages = Vec::with_capacity(history.len() - start + 2);
    messages.push(ChatTurn::system(system_prompt(target_url, grounding_text)));
    messages.extend_from_slice(&history[start..]);
    messages.push(ChatTurn::user(user_message));
    messages
}

fn system_prompt(target_url: &str, grounding_text: &str) -> String {
    format!(
        "You are a helpful assistant answering questions about the website {target_url}. \
         Ground every answer in the page content below. If the content does not answer \
         the question, say so instead of guessing.\n\nPage content:\n{grounding_text}"
    )
}
