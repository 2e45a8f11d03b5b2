//! HTTP adapter for the judgment service.
//!
//! Supports OpenAI and Anthropic chat completions, selected via environment
//! variables. Calls run at temperature zero so canned-input test runs and
//! repeated invocations stay comparable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::JudgmentError;
use crate::judgment::JudgmentService;

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

/// Judgment service backed by a hosted LLM API.
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

const MAX_RETRIES: u32 = 3;
const MAX_TOKENS: u32 = 1024;

impl LlmAdapter {
    /// Create a new adapter with explicit configuration.
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        let default_model = match provider {
            LlmProvider::OpenAI => "gpt-4o-mini".to_string(),
            LlmProvider::Anthropic => "claude-sonnet-4.5".to_string(),
        };

        Self {
            provider,
            api_key,
            model: model.unwrap_or(default_model),
            client: reqwest::Client::new(),
        }
    }

    /// Create an adapter from environment variables.
    ///
    /// Checks `OPENAI_API_KEY` first, then `ANTHROPIC_API_KEY`. The model can
    /// be overridden with `TRIAGE_LLM_MODEL`.
    pub fn from_env() -> Result<Self, JudgmentError> {
        let custom_model = std::env::var("TRIAGE_LLM_MODEL").ok();

        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.is_empty() {
                return Ok(Self::new(LlmProvider::OpenAI, api_key, custom_model));
            }
        }

        if let Ok(api_key) = std::env::var("ANTHROPIC_API_KEY") {
            if !api_key.is_empty() {
                return Ok(Self::new(LlmProvider::Anthropic, api_key, custom_model));
            }
        }

        Err(JudgmentError::NotConfigured)
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a request, retrying transient failures (network errors, 5xx,
    /// rate limits) with exponential backoff.
    async fn post_with_retry(
        &self,
        build: &(dyn Fn() -> reqwest::RequestBuilder + Sync),
    ) -> Result<reqwest::Response, JudgmentError> {
        let mut last_error = String::new();

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_secs(1 << attempt);
                debug!("Retrying LLM request in {:?} (attempt {})", delay, attempt + 1);
                tokio::time::sleep(delay).await;
            }

            let response = match build().send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("LLM network error: {}", e);
                    last_error = format!("network error: {}", e);
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() || status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM transient error {} on attempt {}", status, attempt + 1);
                last_error = format!("{}: {}", status, body);
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(JudgmentError::Http(format!("{}: {}", status, body)));
            }

            return Ok(response);
        }

        Err(JudgmentError::RetriesExhausted(last_error))
    }

    async fn judge_openai(&self, system: &str, user: &str) -> Result<String, JudgmentError> {
        let request = OpenAiRequest {
            model: self.model.clone(),
            temperature: 0.0,
            max_completion_tokens: Some(MAX_TOKENS),
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: system.to_string(),
                },
                OpenAiMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
        };

        let response = self
            .post_with_retry(&|| {
                self.client
                    .post("https://api.openai.com/v1/chat/completions")
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .json(&request)
            })
            .await?;

        let result: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| JudgmentError::Http(format!("failed to parse response: {}", e)))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(JudgmentError::EmptyResponse)
    }

    async fn judge_anthropic(&self, system: &str, user: &str) -> Result<String, JudgmentError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system: system.to_string(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: user.to_string(),
            }],
        };

        let response = self
            .post_with_retry(&|| {
                self.client
                    .post("https://api.anthropic.com/v1/messages")
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&request)
            })
            .await?;

        let result: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| JudgmentError::Http(format!("failed to parse response: {}", e)))?;

        result
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .filter(|c| !c.trim().is_empty())
            .ok_or(JudgmentError::EmptyResponse)
    }
}

#[async_trait]
impl JudgmentService for LlmAdapter {
    async fn judge(&self, system: &str, user: &str) -> Result<String, JudgmentError> {
        match self.provider {
            LlmProvider::OpenAI => self.judge_openai(system, user).await,
            LlmProvider::Anthropic => self.judge_anthropic(system, user).await,
        }
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    messages: Vec<OpenAiMessage>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_detection() {
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("ANTHROPIC_API_KEY");
        std::env::remove_var("TRIAGE_LLM_MODEL");

        assert!(LlmAdapter::from_env().is_err());

        std::env::set_var("OPENAI_API_KEY", "test-key");
        let adapter = LlmAdapter::from_env().unwrap();
        assert_eq!(adapter.provider(), LlmProvider::OpenAI);
        std::env::remove_var("OPENAI_API_KEY");

        std::env::set_var("ANTHROPIC_API_KEY", "test-key");
        let adapter = LlmAdapter::from_env().unwrap();
        assert_eq!(adapter.provider(), LlmProvider::Anthropic);
        std::env::remove_var("ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_default_models() {
        let openai = LlmAdapter::new(LlmProvider::OpenAI, "key".to_string(), None);
        assert_eq!(openai.model(), "gpt-4o-mini");

        let anthropic = LlmAdapter::new(LlmProvider::Anthropic, "key".to_string(), None);
        assert_eq!(anthropic.model(), "claude-sonnet-4.5");
    }

    #[test]
    fn test_custom_model() {
        let adapter = LlmAdapter::new(
            LlmProvider::OpenAI,
            "key".to_string(),
            Some("gpt-4o".to_string()),
        );
        assert_eq!(adapter.model(), "gpt-4o");
    }
}
