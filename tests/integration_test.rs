//! Integration tests for the HTTP completion path
//!
//! These tests run against a local mock server and need no API key

use chatrelay::{
    AttemptFailure, CompletionClient, CompletionError, ConversationKey, ConversationStore, Relay,
    Role, Settings, Turn,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.llm.base_url = format!("{}/api/v1/", server.uri());
    settings.llm.model = "test/model".to_string();
    settings.llm.system_prompt = "You are a test bot.".to_string();
    settings.retry.base_delay_secs = 0.01;
    settings.retry.max_retries = 3;
    settings
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

#[tokio::test]
async fn test_request_wire_format_and_trimmed_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(header("X-Title", "Discord AI Bot"))
        .and(body_partial_json(json!({
            "model": "test/model",
            "stream": false,
            "max_tokens": 2000,
            "messages": [
                {"role": "system", "content": "You are a test bot."},
                {"role": "user", "content": "hi"}
            ]
        })))
        .respond_with(completion(" hello "))
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::new("test-key".to_string(), settings_for(&server));
    let reply = client.complete(&[Turn::user("hi")]).await.unwrap();

    assert_eq!(reply, "hello");
}

#[tokio::test]
async fn test_relay_scenario_appends_assistant_turn() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(completion(" hello "))
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let store = Arc::new(ConversationStore::new(settings.history.max_turns));
    let client = Arc::new(CompletionClient::new("k".to_string(), settings));
    let relay = Relay::new(Arc::clone(&store), client);
    let key = ConversationKey::Channel(1234);

    store.append(key, Role::User, "hi");
    let reply = relay.client().complete(&store.context(key)).await.unwrap();
    store.append(key, Role::Assistant, reply.as_str());

    assert_eq!(reply, "hello");
    assert_eq!(store.context(key).last(), Some(&Turn::assistant("hello")));
}

#[tokio::test]
async fn test_always_rate_limited_returns_degraded_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let client = CompletionClient::new("k".to_string(), settings_for(&server));
    let err = client.ask("anyone there?").await.unwrap_err();

    assert_eq!(
        err,
        CompletionError::RetriesExhausted {
            attempts: 4,
            last: AttemptFailure::RateLimited
        }
    );
    assert_eq!(
        err.user_message(),
        "Sorry, I'm currently rate limited. Please try again later."
    );
}

#[tokio::test]
async fn test_server_errors_recover_within_retry_bound() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(completion("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::new("k".to_string(), settings_for(&server));
    assert_eq!(client.ask("ping").await.unwrap(), "recovered");
}

#[tokio::test]
async fn test_success_without_choices_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::new("k".to_string(), settings_for(&server));
    let err = client.ask("ping").await.unwrap_err();

    assert!(err.is_no_response());
}

#[tokio::test]
async fn test_slow_responses_time_out_per_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(completion("too late").set_delay(std::time::Duration::from_millis(500)))
        .expect(2)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.llm.request_timeout_secs = 0.1;
    settings.retry.max_retries = 1;

    let client = CompletionClient::new("k".to_string(), settings);
    let err = client.ask("ping").await.unwrap_err();

    assert_eq!(
        err,
        CompletionError::RetriesExhausted {
            attempts: 2,
            last: AttemptFailure::Timeout
        }
    );
    assert_eq!(
        err.user_message(),
        "Sorry, the request timed out. Please try again."
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_transport_failure() {
    let mut settings = Settings::default();
    settings.llm.base_url = "http://127.0.0.1:1".to_string();
    settings.retry.base_delay_secs = 0.01;
    settings.retry.max_retries = 1;

    let client = CompletionClient::new("k".to_string(), settings);
    let err = client.ask("ping").await.unwrap_err();

    match err {
        CompletionError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(matches!(last, AttemptFailure::Transport(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
