//! Mock generation backend for deterministic testing.
//!
//! Returns scripted responses with optional usage metadata, can simulate
//! generic and content-safety failures, and records every request for
//! assertion.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lectern_inference::mock::MockGenerationClient;
//!
//! let client = MockGenerationClient::new()
//!     .with_response("# Heading\n\nBody")
//!     .with_usage(TokenUsage::new(120, 30));
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lectern_core::{
    Completion, Error, GenerationClient, GenerationRequest, Result, TokenUsage,
};

/// Scripted failure mode for the mock backend.
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Generic generation failure.
    Generic(String),
    /// Content-safety refusal, surfaced as `Error::ContentRejected`.
    Safety(String),
}

#[derive(Debug, Clone)]
struct MockConfig {
    default_response: String,
    mappings: Vec<(String, String)>,
    usage: Option<TokenUsage>,
    failure: Option<MockFailure>,
    model: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            default_response: "Mock response".to_string(),
            mappings: Vec::new(),
            usage: None,
            failure: None,
            model: "mock-model".to_string(),
        }
    }
}

/// Mock generation backend.
#[derive(Clone, Default)]
pub struct MockGenerationClient {
    config: Arc<MockConfig>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerationClient {
    /// Create a new mock with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response returned for unmapped prompts.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Return `response` for any prompt containing `needle`. Mappings are
    /// checked in insertion order before the default response.
    pub fn with_response_for(
        mut self,
        needle: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .mappings
            .push((needle.into(), response.into()));
        self
    }

    /// Report this usage on every completion. Without it the mock behaves
    /// like a backend that returns no usage metadata.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        Arc::make_mut(&mut self.config).usage = Some(usage);
        self
    }

    /// Fail every generate call with the given failure mode.
    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        Arc::make_mut(&mut self.config).failure = Some(failure);
        self
    }

    /// All requests received so far.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of generate calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, req: GenerationRequest) -> Result<Completion> {
        self.calls.lock().unwrap().push(req.clone());

        if let Some(failure) = &self.config.failure {
            return match failure {
                MockFailure::Generic(message) => Err(Error::Generation(message.clone())),
                MockFailure::Safety(message) => Err(Error::ContentRejected(message.clone())),
            };
        }

        let text = self
            .config
            .mappings
            .iter()
            .find(|(needle, _)| req.prompt.contains(needle))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.config.default_response.clone());

        Ok(Completion {
            text,
            usage: self.config.usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_default_response() {
        let client = MockGenerationClient::new();
        let completion = client.generate(request("anything")).await.unwrap();
        assert_eq!(completion.text, "Mock response");
        assert!(completion.usage.is_none());
    }

    #[tokio::test]
    async fn test_response_mapping_precedes_default() {
        let client = MockGenerationClient::new()
            .with_response("fallback")
            .with_response_for("transcript", "# Notes");
        let completion = client
            .generate(request("format this transcript please"))
            .await
            .unwrap();
        assert_eq!(completion.text, "# Notes");

        let completion = client.generate(request("other")).await.unwrap();
        assert_eq!(completion.text, "fallback");
    }

    #[tokio::test]
    async fn test_usage_reported_when_configured() {
        let client = MockGenerationClient::new().with_usage(TokenUsage::new(10, 2));
        let completion = client.generate(request("x")).await.unwrap();
        assert_eq!(completion.usage, Some(TokenUsage::new(10, 2)));
    }

    #[tokio::test]
    async fn test_safety_failure_is_content_rejected() {
        let client = MockGenerationClient::new()
            .with_failure(MockFailure::Safety("refused".into()));
        let err = client.generate(request("x")).await.unwrap_err();
        assert!(matches!(err, Error::ContentRejected(_)));
    }

    #[tokio::test]
    async fn test_generic_failure() {
        let client =
            MockGenerationClient::new().with_failure(MockFailure::Generic("boom".into()));
        let err = client.generate(request("x")).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_call_log_records_requests() {
        let client = MockGenerationClient::new();
        client.generate(request("first")).await.unwrap();
        client.generate(request("second")).await.unwrap();
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.calls()[1].prompt, "second");
    }
}
