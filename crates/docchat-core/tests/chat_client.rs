use std::sync::Arc;

use docchat_core::{
    AnswerMode, ChatClient, MemorySessionPersistence, RecordingRenderer, RenderCommand,
    RetrievalParams, SessionTracker, TurnErrorKind, TurnState,
};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_WORLD: &str = concat!(
    "{\"type\":\"meta_info\",\"session_id\":\"abc123\",\"mode\":\"RAG\"}\n",
    "{\"type\":\"answer\",\"payload\":\"Hello\"}\n",
    "{\"type\":\"answer\",\"payload\":\" world\"}\n",
);

fn ndjson(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/x-ndjson")
        .set_body_string(body)
}

fn client_for(
    server: &MockServer,
    session: Arc<SessionTracker>,
) -> (ChatClient, Arc<RecordingRenderer>) {
    let renderer = Arc::new(RecordingRenderer::new());
    let client = ChatClient::new(&server.uri(), session, renderer.clone()).unwrap();
    (client, renderer)
}

#[tokio::test]
async fn test_streamed_answer_is_rendered_and_session_adopted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ndjson(HELLO_WORLD))
        .expect(1)
        .mount(&server)
        .await;

    let persistence = Arc::new(MemorySessionPersistence::new());
    let session = Arc::new(SessionTracker::load(persistence.clone()));
    let (client, renderer) = client_for(&server, session.clone());

    let outcome = client.submit("  What is in the report?  ").await.unwrap();
    let view = renderer.view(outcome.turn);

    assert_eq!(outcome.state, TurnState::Completed);
    assert_eq!(view.question.as_deref(), Some("What is in the report?"));
    assert_eq!(view.answer, "Hello world");
    assert_eq!(view.badge, Some(AnswerMode::DocumentContext));
    assert!(!view.pending);
    assert_eq!(session.session_id().as_deref(), Some("abc123"));
    assert_eq!(persistence.stored().as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_request_carries_question_session_and_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({
            "question": "Summarize chapter 2",
            "session_id": "s-1",
            "topk": 10,
            "rerank_topn": 5
        })))
        .respond_with(ndjson("{\"type\":\"answer\",\"payload\":\"ok\"}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(SessionTracker::in_memory());
    session.set_session_id("s-1");
    let (client, _renderer) = client_for(&server, session);

    let outcome = client.submit("Summarize chapter 2").await.unwrap();
    assert_eq!(outcome.answer, "ok");
}

#[tokio::test]
async fn test_first_turn_sends_null_session_and_second_reuses_issued_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ndjson(HELLO_WORLD))
        .expect(2)
        .mount(&server)
        .await;

    let (client, _renderer) = client_for(&server, Arc::new(SessionTracker::in_memory()));
    client.submit("first").await.unwrap();
    client.submit("second").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let first: Value = requests[0].body_json().unwrap();
    let second: Value = requests[1].body_json().unwrap();
    assert_eq!(first["session_id"], Value::Null);
    assert_eq!(second["session_id"], "abc123");
}

#[tokio::test]
async fn test_custom_retrieval_params_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({"topk": 30, "rerank_topn": 7})))
        .respond_with(ndjson("{\"type\":\"answer\",\"payload\":\"ok\"}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _renderer) = client_for(&server, Arc::new(SessionTracker::in_memory()));
    let client = client.with_retrieval_params(RetrievalParams {
        topk: 30,
        rerank_topn: 7,
    });

    assert_eq!(client.submit("q").await.unwrap().state, TurnState::Completed);
}

#[tokio::test]
async fn test_http_error_status_fails_turn_without_reading_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("{\"type\":\"answer\",\"payload\":\"should not render\"}\n"),
        )
        .mount(&server)
        .await;

    let (client, renderer) = client_for(&server, Arc::new(SessionTracker::in_memory()));
    let outcome = client.submit("q").await.unwrap();
    let view = renderer.view(outcome.turn);

    assert_eq!(outcome.state, TurnState::Errored);
    assert!(matches!(
        view.error,
        Some((TurnErrorKind::Server { status: 500 }, _))
    ));
    assert!(view.answer.is_empty());
    assert!(!view.empty);
}

#[tokio::test]
async fn test_unreachable_server_renders_connection_error() {
    let renderer = Arc::new(RecordingRenderer::new());
    let client = ChatClient::new(
        "http://127.0.0.1:9",
        Arc::new(SessionTracker::in_memory()),
        renderer.clone(),
    )
    .unwrap();

    let outcome = client.submit("anyone there?").await.unwrap();

    assert_eq!(outcome.state, TurnState::Errored);
    assert!(matches!(
        renderer.view(outcome.turn).error,
        Some((TurnErrorKind::Connection, _))
    ));
}

#[tokio::test]
async fn test_unterminated_tail_is_discarded_silently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ndjson(
            "{\"type\":\"answer\",\"payload\":\"kept\"}\n{\"type\":\"ans",
        ))
        .mount(&server)
        .await;

    let (client, renderer) = client_for(&server, Arc::new(SessionTracker::in_memory()));
    let outcome = client.submit("q").await.unwrap();

    assert_eq!(outcome.state, TurnState::Completed);
    assert_eq!(outcome.answer, "kept");
    assert_eq!(outcome.malformed_lines, 0);
    assert!(renderer.view(outcome.turn).error.is_none());
}

#[tokio::test]
async fn test_empty_body_renders_no_content_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ndjson(""))
        .mount(&server)
        .await;

    let (client, renderer) = client_for(&server, Arc::new(SessionTracker::in_memory()));
    let outcome = client.submit("q").await.unwrap();
    let view = renderer.view(outcome.turn);

    assert_eq!(outcome.state, TurnState::Completed);
    assert!(view.empty);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn test_two_context_events_produce_two_citations() {
    let server = MockServer::start().await;
    let body = concat!(
        "{\"type\":\"answer\",\"payload\":\"See sources.\"}\n",
        "{\"type\":\"context\",\"payload\":[{\"metadata\":{\"source\":\"a.pdf\"}}]}\n",
        "{\"type\":\"context\",\"payload\":[{\"metadata\":{\"filename\":\"a.pdf\"}},{\"metadata\":{\"title\":\"b.pdf\"}}]}\n",
    );
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ndjson(body))
        .mount(&server)
        .await;

    let (client, renderer) = client_for(&server, Arc::new(SessionTracker::in_memory()));
    let outcome = client.submit("q").await.unwrap();

    assert_eq!(renderer.view(outcome.turn).citations, vec!["a.pdf", "b.pdf"]);
}

#[tokio::test]
async fn test_turns_render_to_their_own_targets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({"question": "one"})))
        .respond_with(ndjson("{\"type\":\"answer\",\"payload\":\"first\"}\n"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({"question": "two"})))
        .respond_with(ndjson("{\"type\":\"answer\",\"payload\":\"second\"}\n"))
        .mount(&server)
        .await;

    let (client, renderer) = client_for(&server, Arc::new(SessionTracker::in_memory()));
    let (one, two) = tokio::join!(client.submit("one"), client.submit("two"));
    let (one, two) = (one.unwrap(), two.unwrap());

    assert_ne!(one.turn, two.turn);
    assert_eq!(renderer.view(one.turn).answer, "first");
    assert_eq!(renderer.view(two.turn).answer, "second");

    let first_command = renderer.commands_for(one.turn).remove(0);
    assert!(matches!(first_command, RenderCommand::UserQuestion { .. }));
}

/// Serve one chunked `/ask` response that stops after `line` without the
/// terminating chunk, then drop the connection.
async fn spawn_truncating_server(line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        // Consume the whole request so closing the socket is a clean FIN.
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\ntransfer-encoding: chunked\r\n\r\n{:x}\r\n{}\r\n",
            line.len(),
            line
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_stream_cut_mid_body_keeps_partial_answer() {
    let base_url = spawn_truncating_server("{\"type\":\"answer\",\"payload\":\"partial\"}\n").await;

    let renderer = Arc::new(RecordingRenderer::new());
    let client = ChatClient::new(
        &base_url,
        Arc::new(SessionTracker::in_memory()),
        renderer.clone(),
    )
    .unwrap();

    let outcome = client.submit("q").await.unwrap();
    let view = renderer.view(outcome.turn);

    assert_eq!(outcome.state, TurnState::Errored);
    assert_eq!(outcome.answer, "partial");
    assert_eq!(view.answer, "partial");
    assert!(matches!(view.error, Some((TurnErrorKind::Connection, _))));
}
