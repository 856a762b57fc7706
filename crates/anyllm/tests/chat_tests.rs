use std::time::{Duration, Instant};

use anyllm::{ChatRequest, GatewayClient, GatewayConfig, GatewayError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, max_retries: u32) -> GatewayClient {
    let config = GatewayConfig::builder()
        .base_url(server.uri())
        .api_key("test-key")
        .workspace_slug("docs")
        .max_retries(max_retries)
        .retry_initial_delay(Duration::from_millis(100))
        .timeout(Duration::from_secs(1))
        .build();
    GatewayClient::new(config).expect("valid config")
}

fn success_body() -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": "gpt-4",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello there"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
    })
}

fn simple_request() -> ChatRequest {
    ChatRequest::builder().user_message("hi").build()
}

#[tokio::test]
async fn chat_decodes_successful_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let response = client.chat(&simple_request()).await.expect("chat succeeds");

    assert_eq!(response.content(), Some("Hello there"));
    assert_eq!(response.usage.unwrap().total_tokens, 12);
}

#[tokio::test]
async fn chat_sends_merged_defaults_in_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(body_partial_json(serde_json::json!({
            "workspace": "docs",
            "model": "gpt-4",
            "stream": false,
            "temperature": 0.0,
            "max_tokens": 1500,
            "top_p": 1.0,
            "metadata": {},
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    client.chat(&simple_request()).await.expect("chat succeeds");
}

#[tokio::test]
async fn chat_exhausts_retries_on_persistent_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let err = client.chat(&simple_request()).await.expect_err("must fail");

    match &err {
        GatewayError::RetriesExhausted { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert!(err.to_string().contains("3"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn chat_fails_fast_on_client_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"error": {"message": "unknown workspace"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 5);
    let err = client.chat(&simple_request()).await.expect_err("must fail");

    assert!(!err.is_retryable());
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("unknown workspace"));
}

#[tokio::test]
async fn chat_honors_retry_after_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "1")
                .set_body_string("rate limited"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let started = Instant::now();
    let response = client.chat(&simple_request()).await.expect("chat succeeds");

    // Retry-After: 1 must win over the ~100ms computed backoff
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(response.content(), Some("Hello there"));
}

#[tokio::test]
async fn chat_recovers_after_transient_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let response = client.chat(&simple_request()).await.expect("chat succeeds");
    assert_eq!(response.content(), Some("Hello there"));
}

#[tokio::test]
async fn chat_times_out_and_exhausts_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, 1);
    let err = client.chat(&simple_request()).await.expect_err("must time out");

    match &err {
        GatewayError::RetriesExhausted { attempts, last_error } => {
            assert_eq!(*attempts, 1);
            assert!(last_error.contains("timed out"));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}
