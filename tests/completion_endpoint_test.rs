use std::sync::Arc;
use std::time::Duration;

use ielts_coach::{
    instruction_for, CoachConfig, CompletionBackend, CompletionClient, CompletionError, CompletionRequest,
    ConversationAdapter, FailureKind, Mode, Turn,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn adapter_for(server: &MockServer, timeout: Duration) -> ConversationAdapter {
    let config = CoachConfig::new("test-key", format!("{}{}", server.uri(), COMPLETIONS_PATH)).with_timeout(timeout);
    let client = CompletionClient::new(config).unwrap();
    ConversationAdapter::new(Arc::new(client))
}

#[test_log::test(tokio::test)]
async fn test_successful_reply_is_appended() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Band 7 requires...")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, Duration::from_secs(5));
    let reply = adapter.respond("What is Task 2?", &[], Mode::WritingTask, 0.7).await;

    assert_eq!(reply.history.len(), 2);
    assert_eq!(reply.history[0], Turn::user("What is Task 2?"));
    assert_eq!(reply.history[1], Turn::assistant("Band 7 requires..."));
    assert_eq!(reply.input, "");
    assert!(reply.failure.is_none());
}

#[tokio::test]
async fn test_request_carries_model_messages_temperature_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "temperature": 0.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Try skimming first.")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, Duration::from_secs(5));
    let history = vec![Turn::user("Hi"), Turn::assistant("Hello! How can I help?")];
    let reply = adapter
        .respond("How do I read faster?", &history, Mode::ReadingListening, 0.5)
        .await;
    assert!(reply.failure.is_none(), "unexpected failure: {:?}", reply.history.last());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": instruction_for(Mode::ReadingListening)},
            {"role": "user", "content": "Hi"},
            {"role": "assistant", "content": "Hello! How can I help?"},
            {"role": "user", "content": "How do I read faster?"}
        ])
    );
}

#[test_log::test(tokio::test)]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, Duration::from_millis(200));
    let reply = adapter.respond("Hello?", &[], Mode::GeneralHelp, 0.7).await;

    assert_eq!(reply.history.len(), 2);
    assert_eq!(reply.history[0], Turn::user("Hello?"));
    assert_eq!(reply.history[1].text, "Request timed out. Please try again.");
    assert_eq!(reply.failure, Some(FailureKind::Timeout));
}

#[tokio::test]
async fn test_server_error_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("server overloaded"))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, Duration::from_secs(5));
    let reply = adapter.respond("Hello", &[], Mode::GeneralHelp, 0.7).await;

    let text = &reply.history[1].text;
    assert!(text.contains("500"), "{}", text);
    assert!(text.contains("server overloaded"), "{}", text);
    assert_eq!(reply.failure, Some(FailureKind::Remote));
}

#[tokio::test]
async fn test_non_200_success_status_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(completion_body("Created, somehow")))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, Duration::from_secs(5));
    let reply = adapter.respond("Hello", &[], Mode::GeneralHelp, 0.7).await;

    let text = &reply.history[1].text;
    assert!(text.starts_with("Error 201: "), "{}", text);
    assert!(text.contains("Created, somehow"), "{}", text);
    assert_eq!(reply.failure, Some(FailureKind::Remote));
}

#[tokio::test]
async fn test_unauthorized_response_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API Key"))
        .mount(&server)
        .await;

    let config = CoachConfig::new("", format!("{}{}", server.uri(), COMPLETIONS_PATH));
    let client = CompletionClient::new(config).unwrap();
    let request = CompletionRequest {
        instruction: instruction_for(Mode::GeneralHelp).to_string(),
        turns: vec![Turn::user("Hi")],
        temperature: 0.7,
    };

    let err = client.complete(&request).await.unwrap_err();
    assert_eq!(
        err,
        CompletionError::Remote {
            status: 401,
            body: "Invalid API Key".to_string()
        }
    );
}

#[tokio::test]
async fn test_malformed_body_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, Duration::from_secs(5));
    let reply = adapter.respond("Hello", &[], Mode::GeneralHelp, 0.7).await;

    assert!(reply.history[1].text.starts_with("An error occurred: "));
    assert_eq!(reply.failure, Some(FailureKind::Transport));
}

#[tokio::test]
async fn test_empty_choices_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, Duration::from_secs(5));
    let reply = adapter.respond("Hello", &[], Mode::GeneralHelp, 0.7).await;

    assert_eq!(reply.failure, Some(FailureKind::Transport));
    assert!(reply.history[1].text.contains("no message content"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_transport_failure() {
    // Bind then release a port so nothing is listening on it.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = CoachConfig::new("test-key", format!("http://{}{}", addr, COMPLETIONS_PATH)).with_timeout(Duration::from_secs(5));
    let adapter = ConversationAdapter::new(Arc::new(CompletionClient::new(config).unwrap()));

    let reply = adapter.respond("Anyone there?", &[], Mode::GeneralHelp, 0.7).await;

    assert_eq!(reply.history.len(), 2);
    assert_eq!(reply.failure, Some(FailureKind::Transport));
    let text = &reply.history[1].text;
    assert!(text.starts_with("An error occurred: "), "{}", text);
    // The underlying connect failure is named, not just "error sending request".
    assert!(text.to_lowercase().contains("connect"), "{}", text);
}

#[tokio::test]
async fn test_conversation_stays_usable_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Back online.")))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server, Duration::from_secs(5));
    let first = adapter.respond("Hi", &[], Mode::GeneralHelp, 0.7).await;
    assert_eq!(first.failure, Some(FailureKind::Remote));

    let second = adapter.respond("Again", &first.history, Mode::GeneralHelp, 0.7).await;
    assert!(second.failure.is_none());
    assert_eq!(second.history.len(), 4);
    assert_eq!(second.history[3], Turn::assistant("Back online."));
}
