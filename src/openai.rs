//! Text-generation collaborator: the OpenAI completions client.
//!
//! The pipeline only sees the [`TextGenerator`] trait; the HTTP client
//! behind it is swappable, which keeps the pipeline testable without a
//! network. One deliberate oddity is preserved from the system this
//! replaces: a non-success HTTP status does not fail the fragment - it
//! comes back as a descriptive string that flows through rewriting and
//! persistence like any other content, so the fragment keeps its position
//! in the output sequence. Transport-level failures are real errors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::estimate::estimate_tokens;

/// Token window of the completion model; prompt plus generated output must
/// fit inside it.
pub const MAX_MODEL_TOKENS: usize = 4096;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const TEMPERATURE: f32 = 0.6;

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Read the credential from `OPENAI_API_KEY`.
    ///
    /// Called once at startup; a missing credential is fatal before any
    /// fragment work begins, not a per-call error.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::new(key, model)),
            _ => Err(Error::MissingApiKey),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let max_tokens = completion_budget(prompt)?;

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: max_tokens as u32,
            temperature: TEMPERATURE,
        };

        debug!(model = %self.model, max_tokens, "sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown Error");
            warn!(%status, "completion request failed; emitting error text as content");
            return Ok(format!("Error: {} - {}", status.as_u16(), reason));
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(Error::EmptyCompletion)?;

        Ok(clean_generated(&content))
    }
}

/// Generation allowance left after the prompt.
///
/// The caller must never dispatch a prompt with no completion room; the
/// chunk budget is validated against this at startup, so hitting the error
/// here means misconfiguration, not bad content.
pub fn completion_budget(prompt: &str) -> Result<usize> {
    let prompt_tokens = estimate_tokens(prompt);
    if prompt_tokens >= MAX_MODEL_TOKENS {
        return Err(Error::BudgetTooLarge {
            prompt: prompt_tokens,
            limit: MAX_MODEL_TOKENS,
        });
    }
    Ok(MAX_MODEL_TOKENS - prompt_tokens)
}

/// Completions like to wrap markup output in `<code>` tags; strip them.
fn clean_generated(output: &str) -> String {
    output
        .replace("<code>", "")
        .replace("</code>", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_budget_shrinks_with_prompt() {
        let small = completion_budget("hi").expect("budget should fit");
        let large = completion_budget(&"x".repeat(4000)).expect("budget should fit");
        assert!(small > large);
        assert_eq!(small, MAX_MODEL_TOKENS - 1);
    }

    #[test]
    fn test_completion_budget_refuses_oversized_prompt() {
        let prompt = "x".repeat(MAX_MODEL_TOKENS * 4);
        assert!(matches!(
            completion_budget(&prompt),
            Err(Error::BudgetTooLarge { .. })
        ));
    }

    #[test]
    fn test_clean_generated_strips_code_wrapper() {
        assert_eq!(
            clean_generated("<code><mj-text>hi</mj-text></code>\n"),
            "<mj-text>hi</mj-text>"
        );
        assert_eq!(clean_generated("  plain  "), "plain");
    }
}
