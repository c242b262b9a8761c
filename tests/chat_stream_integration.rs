/// End-to-end tests for the streaming chat client against a mock HTTP server.
///
/// These exercise the full request/response path: request body shape, frame
/// decoding over a real connection, terminal states, and the surfacing rules
/// for server and transport failures.
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ibot::chat::stream::{SessionState, StreamingChatClient, ERROR_PREFIX, STOPPED_MARKER};
use ibot::chat::{MessageStore, Role};

mod common;

fn client_for(server: &MockServer) -> StreamingChatClient {
    StreamingChatClient::new(&common::api_config(&server.uri()), &common::chat_config())
        .expect("failed to build streaming client")
}

/// A complete answer: tokens, sources, and timing all land on the message.
#[tokio::test]
async fn test_streamed_answer_over_http() {
    let server = MockServer::start().await;

    let body = format!(
        "{}{}{}{}",
        common::sse_token("碳排放"),
        common::sse_token("是指温室气体的排放。"),
        common::sse_sources(json!([{ "id": 11, "name": "碳核算指南.pdf" }])),
        common::sse_done(2.5),
    );
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .and(body_partial_json(json!({
            "knowledge_base_id": 3,
            "query": "什么是碳排放?",
            "k": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut store = MessageStore::new();
    let mut fragments: Vec<String> = Vec::new();

    let state = client
        .send(
            &mut store,
            "什么是碳排放?",
            3,
            5,
            CancellationToken::new(),
            |f| fragments.push(f.to_string()),
        )
        .await
        .expect("send failed");

    assert_eq!(state, SessionState::Completed);
    assert_eq!(store.len(), 2);
    assert_eq!(store.messages()[0].role, Role::User);
    assert_eq!(store.messages()[0].content, "什么是碳排放?");

    let answer = store.last_assistant().expect("missing assistant message");
    assert_eq!(answer.content, "碳排放是指温室气体的排放。");
    assert_eq!(answer.thinking_time, Some(2.5));
    let sources = answer.sources.as_ref().expect("missing sources");
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, 11);
    assert_eq!(sources[0].name, "碳核算指南.pdf");

    assert_eq!(fragments.join(""), "碳排放是指温室气体的排放。");
}

/// Consecutive sessions append to the same history without clobbering it.
#[tokio::test]
async fn test_consecutive_sessions_share_history() {
    let server = MockServer::start().await;

    let body = format!("{}{}", common::sse_token("answer"), common::sse_done(0.1));
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut store = MessageStore::new();
    let cancel = CancellationToken::new();

    let first = client
        .send(&mut store, "first question", 1, 5, cancel.clone(), |_| {})
        .await
        .expect("first send failed");
    let second = client
        .send(&mut store, "second question", 1, 5, cancel, |_| {})
        .await
        .expect("second send failed");

    assert_eq!(first, SessionState::Completed);
    assert_eq!(second, SessionState::Completed);
    assert_eq!(store.len(), 4);
    assert_eq!(store.messages()[0].content, "first question");
    assert_eq!(store.messages()[1].content, "answer");
    assert_eq!(store.messages()[2].content, "second question");
    assert_eq!(store.messages()[3].content, "answer");
}

/// A non-2xx response becomes an errored message, not an `Err` return.
#[tokio::test]
async fn test_http_error_status_surfaces_in_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut store = MessageStore::new();

    let state = client
        .send(&mut store, "question", 1, 5, CancellationToken::new(), |_| {})
        .await
        .expect("send failed");

    assert_eq!(state, SessionState::Errored);
    assert_eq!(store.len(), 2);
    let content = &store.last_assistant().expect("missing message").content;
    assert!(content.starts_with(ERROR_PREFIX), "got: {content}");
    assert!(content.contains("500"), "got: {content}");
    assert!(content.contains("internal failure"), "got: {content}");
}

/// A server-signaled error event replaces any partial answer text.
#[tokio::test]
async fn test_server_error_event_replaces_partial_answer() {
    let server = MockServer::start().await;

    let body = format!(
        "{}{}",
        common::sse_token("partial "),
        common::sse_error("model overloaded")
    );
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut store = MessageStore::new();

    let state = client
        .send(&mut store, "question", 1, 5, CancellationToken::new(), |_| {})
        .await
        .expect("send failed");

    assert_eq!(state, SessionState::Errored);
    assert_eq!(
        store.last_assistant().expect("missing message").content,
        format!("{ERROR_PREFIX}model overloaded")
    );
}

/// Cancelling while the response is still pending yields the stopped marker.
#[tokio::test]
async fn test_cancellation_while_waiting_for_response() {
    let server = MockServer::start().await;

    let body = format!("{}{}", common::sse_token("late"), common::sse_done(0.1));
    Mock::given(method("POST"))
        .and(path("/rag/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/event-stream")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut store = MessageStore::new();
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let state = client
        .send(&mut store, "question", 1, 5, cancel, |_| {})
        .await
        .expect("send failed");

    assert_eq!(state, SessionState::Cancelled);
    assert_eq!(
        store.last_assistant().expect("missing message").content,
        STOPPED_MARKER
    );
}

/// Precondition failures are rejected locally; no request goes out.
#[tokio::test]
async fn test_empty_query_never_reaches_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut store = MessageStore::new();

    let result = client
        .send(&mut store, "   ", 1, 5, CancellationToken::new(), |_| {})
        .await;

    assert!(result.is_err());
    assert!(store.is_empty());
}
