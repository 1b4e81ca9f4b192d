//! Tests for the remote assistant client and the side-panel state, against a
//! one-shot local HTTP stub.

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use suma::services::assistant::{AssistantBackend, AssistantPanel, RemoteAssistant, DEFAULT_MODEL};
use suma::types::assistant::{AssistantStatus, ChatRole, ChatTurn};
use suma::types::errors::AssistantError;

struct CapturedRequest {
    head: String,
    body: Value,
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Serves exactly one request, answering with `status` and `reply`. The
/// request is handed back through the receiver.
async fn stub(status: &'static str, reply: Value) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        let captured = loop {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let head = text[..split].to_string();
                let body = &text[split + 4..];
                if body.len() >= content_length(&head) {
                    break CapturedRequest {
                        body: serde_json::from_str(body).unwrap_or(Value::Null),
                        head,
                    };
                }
            }
            if n == 0 {
                break CapturedRequest { head: text, body: Value::Null };
            }
        };

        let payload = reply.to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        let _ = tx.send(captured);
    });

    (format!("http://{}/v1/chat/completions", addr), rx)
}

fn completion(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

// ─── RemoteAssistant ───

#[tokio::test]
async fn test_run_posts_history_and_returns_reply() {
    let (endpoint, request) = stub("200 OK", completion("It is sunny.")).await;
    let assistant = RemoteAssistant::new(endpoint, DEFAULT_MODEL, Some("secret".into()));

    let history = vec![ChatTurn::user("hello"), ChatTurn::assistant("hi there")];
    let reply = assistant.run("weather?", &history).await.unwrap();
    assert_eq!(reply.text, "It is sunny.");
    assert_eq!(reply.audio, None);

    let request = request.await.unwrap();
    assert!(request.head.starts_with("POST /v1/chat/completions"));
    assert!(request
        .head
        .lines()
        .any(|l| l.eq_ignore_ascii_case("authorization: Bearer secret")));
    let messages = request.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1]["content"], "hello");
    assert_eq!(messages[3]["content"], "weather?");
    assert_eq!(request.body["model"], DEFAULT_MODEL);
}

#[tokio::test]
async fn test_missing_key_fails_without_request() {
    let assistant = RemoteAssistant::new("http://127.0.0.1:9/unused", DEFAULT_MODEL, None);
    let err = assistant.run("hi", &[]).await.unwrap_err();
    assert!(matches!(err, AssistantError::MissingApiKey));
}

#[tokio::test]
async fn test_empty_input_returns_empty_reply() {
    let assistant = RemoteAssistant::new("http://127.0.0.1:9/unused", DEFAULT_MODEL, None);
    let reply = assistant.run("   ", &[]).await.unwrap();
    assert!(reply.text.is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let (endpoint, _request) =
        stub("429 Too Many Requests", json!({ "error": "rate limited" })).await;
    let assistant = RemoteAssistant::new(endpoint, DEFAULT_MODEL, Some("secret".into()));
    match assistant.run("hi", &[]).await {
        Err(AssistantError::HttpStatus(code, body)) => {
            assert_eq!(code, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_payload_is_invalid_response() {
    let (endpoint, _request) = stub("200 OK", json!({ "unexpected": true })).await;
    let assistant = RemoteAssistant::new(endpoint, DEFAULT_MODEL, Some("secret".into()));
    let err = assistant.run("hi", &[]).await.unwrap_err();
    assert!(matches!(err, AssistantError::InvalidResponse(_)));
}

// ─── AssistantPanel ───

#[tokio::test]
async fn test_panel_records_history_on_success() {
    let (endpoint, _request) = stub("200 OK", completion("Paris.")).await;
    let assistant = RemoteAssistant::new(endpoint, DEFAULT_MODEL, Some("secret".into()));
    let mut panel = AssistantPanel::new();

    let reply = panel.submit(&assistant, " capital of France? ").await.unwrap();
    assert_eq!(reply.text, "Paris.");
    assert_eq!(panel.status(), &AssistantStatus::Idle);
    assert_eq!(panel.history().len(), 2);
    assert_eq!(panel.history()[0].role, ChatRole::User);
    assert_eq!(panel.history()[0].content, "capital of France?");
    assert_eq!(panel.last_reply().map(|r| r.text.as_str()), Some("Paris."));
}

#[tokio::test]
async fn test_panel_error_can_be_dismissed() {
    let assistant = RemoteAssistant::new("http://127.0.0.1:9/unused", DEFAULT_MODEL, None);
    let mut panel = AssistantPanel::new();

    assert!(panel.submit(&assistant, "hi").await.is_none());
    assert!(matches!(panel.status(), AssistantStatus::Error(_)));
    assert!(panel.history().is_empty());

    panel.dismiss_error();
    assert_eq!(panel.status(), &AssistantStatus::Idle);
}

#[tokio::test]
async fn test_panel_ignores_blank_input() {
    let assistant = RemoteAssistant::new("http://127.0.0.1:9/unused", DEFAULT_MODEL, None);
    let mut panel = AssistantPanel::new();
    assert!(panel.submit(&assistant, "  ").await.is_none());
    assert_eq!(panel.status(), &AssistantStatus::Idle);
}
