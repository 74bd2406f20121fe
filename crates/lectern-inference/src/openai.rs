//! OpenAI-compatible generation backend.
//!
//! Talks to any chat-completions endpoint (Ollama's compat API, vLLM,
//! OpenAI itself). Usage metadata is taken verbatim from the response when
//! present. Content-safety refusals — either a `content_filter` finish
//! reason or a safety-coded API error — surface as
//! [`Error::ContentRejected`], distinguishable from generic failures.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use lectern_core::{
    defaults, Completion, Error, GenerationClient, GenerationRequest, Result, TokenUsage,
};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = defaults::GEN_BASE_URL;

/// Default generation model.
pub const DEFAULT_MODEL: &str = defaults::GEN_MODEL;

/// OpenAI-compatible chat-completions client.
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatClient {
    /// Create a new client with custom configuration.
    pub fn with_config(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai_compat",
            model = %model,
            base_url = %base_url,
            timeout_secs,
            "Initializing generation backend"
        );

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LECTERN_GEN_URL` | Ollama compat endpoint | Base URL |
    /// | `LECTERN_GEN_MODEL` | `llama3.1:8b` | Model slug |
    /// | `LECTERN_GEN_API_KEY` | unset | Bearer token, if required |
    /// | `LECTERN_GEN_TIMEOUT_SECS` | `300` | Request timeout |
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("LECTERN_GEN_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model =
            std::env::var("LECTERN_GEN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = std::env::var("LECTERN_GEN_API_KEY").ok().filter(|k| !k.is_empty());
        let timeout_secs = std::env::var("LECTERN_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::GEN_TIMEOUT_SECS);

        Self::with_config(base_url, model, api_key, timeout_secs)
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: i64,
    completion_tokens: i64,
    #[allow(dead_code)]
    total_tokens: i64,
}

#[derive(Deserialize)]
struct ChatErrorBody {
    error: Option<ChatErrorDetail>,
}

#[derive(Deserialize)]
struct ChatErrorDetail {
    message: Option<String>,
    code: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Whether an API error code/type identifies a content-safety refusal.
fn is_safety_code(value: &str) -> bool {
    matches!(
        value,
        "content_filter" | "content_policy_violation" | "moderation_blocked"
    )
}

#[async_trait]
impl GenerationClient for OpenAiCompatClient {
    #[instrument(
        skip(self, req),
        fields(subsystem = "inference", component = "openai_compat", op = "generate")
    )]
    async fn generate(&self, req: GenerationRequest) -> Result<Completion> {
        let start = Instant::now();

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = req.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &req.prompt,
        });

        let body = ChatRequestBody {
            model: &self.model,
            messages,
            max_tokens: req.max_output_tokens,
            temperature: req.temperature,
            top_p: req.top_p,
        };

        debug!(
            model = %self.model,
            prompt_len = req.prompt.len(),
            "Sending chat completion request"
        );

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<ChatErrorBody>(&text) {
                if let Some(detail) = parsed.error {
                    let message = detail
                        .message
                        .unwrap_or_else(|| "generation request rejected".to_string());
                    let safety = detail.code.as_deref().is_some_and(is_safety_code)
                        || detail.kind.as_deref().is_some_and(is_safety_code);
                    if safety {
                        return Err(Error::ContentRejected(message));
                    }
                    return Err(Error::Generation(format!("{}: {}", status, message)));
                }
            }
            return Err(Error::Generation(format!("{}: {}", status, text)));
        }

        let parsed: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("invalid response body: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Generation("response contained no choices".into()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(Error::ContentRejected(
                "generation stopped by the provider's content filter".into(),
            ));
        }

        let text = choice
            .message
            .content
            .ok_or_else(|| Error::Generation("response contained no message content".into()))?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        info!(
            model = %self.model,
            response_len = text.len(),
            tokens_sent = usage.map(|u| u.prompt_tokens).unwrap_or(-1),
            tokens_received = usage.map(|u| u.output_tokens).unwrap_or(-1),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation completed"
        );

        Ok(Completion { text, usage })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safety_code() {
        assert!(is_safety_code("content_filter"));
        assert!(is_safety_code("content_policy_violation"));
        assert!(is_safety_code("moderation_blocked"));
        assert!(!is_safety_code("rate_limit_exceeded"));
        assert!(!is_safety_code(""));
    }

    #[test]
    fn test_with_config_trims_trailing_slash() {
        let client = OpenAiCompatClient::with_config(
            "http://localhost:11434/v1/".into(),
            "test-model".into(),
            None,
            30,
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert_eq!(client.model_name(), "test-model");
    }

    #[test]
    fn test_chat_request_body_skips_unset_options() {
        let body = ChatRequestBody {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("top_p").is_none());
        assert_eq!(json["temperature"], 0.2f32);
    }

    #[test]
    fn test_chat_response_body_parses_usage() {
        let raw = r#"{
            "choices": [{"message": {"content": "hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let parsed: ChatResponseBody = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        let usage = parsed.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 3);
    }

    #[test]
    fn test_chat_response_body_without_usage() {
        let raw = r#"{"choices": [{"message": {"content": "hello"}, "finish_reason": "stop"}]}"#;
        let parsed: ChatResponseBody = serde_json::from_str(raw).unwrap();
        assert!(parsed.usage.is_none());
    }
}
