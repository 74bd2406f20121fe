//! Integration tests for the OpenAI-compatible backend against a local
//! mock HTTP server.

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lectern_core::{Error, GenerationClient, GenerationRequest, TokenUsage};
use lectern_inference::OpenAiCompatClient;

fn client_for(server: &MockServer) -> OpenAiCompatClient {
    OpenAiCompatClient::with_config(server.uri(), "test-model".into(), None, 10).unwrap()
}

fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt.to_string(),
        max_output_tokens: Some(256),
        temperature: Some(0.7),
        top_p: Some(0.9),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_generate_returns_text_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({"model": "test-model"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "# Heading\n\nBody"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
        })))
        .mount(&server)
        .await;

    let completion = client_for(&server)
        .generate(request("format this"))
        .await
        .unwrap();

    assert_eq!(completion.text, "# Heading\n\nBody");
    assert_eq!(completion.usage, Some(TokenUsage::new(42, 7)));
}

#[tokio::test]
async fn test_generate_without_usage_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "text"},
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let completion = client_for(&server).generate(request("x")).await.unwrap();
    assert!(completion.usage.is_none());
}

#[tokio::test]
async fn test_content_filter_finish_reason_is_content_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": null},
                "finish_reason": "content_filter"
            }]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request("x")).await.unwrap_err();
    assert!(matches!(err, Error::ContentRejected(_)));
}

#[tokio::test]
async fn test_safety_coded_api_error_is_content_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "message": "Your request was rejected by the content filter.",
                "type": "invalid_request_error",
                "code": "content_filter"
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request("x")).await.unwrap_err();
    match err {
        Error::ContentRejected(message) => {
            assert!(message.contains("content filter"));
        }
        other => panic!("expected ContentRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generic_api_error_is_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": {"message": "internal", "type": "server_error", "code": null}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request("x")).await.unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
}

#[tokio::test]
async fn test_system_message_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                {"role": "system", "content": "You format notes."},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "ok"},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = client_for(&server)
        .generate(GenerationRequest {
            system: Some("You format notes.".into()),
            prompt: "hello".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(completion.text, "ok");
}
