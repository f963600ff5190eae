//! Fake model server
//!
//! Speaks just enough of the OpenAI chat-completions and Ollama chat APIs
//! to drive the providers. Replies are served in order; once the script
//! runs out every request gets a 503.

use super::constants::SERVER_READY_TIMEOUT_MS;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub enum FakeReply {
    /// 200 with this assistant content.
    Content(String),
    /// Bare error status.
    Status(u16),
}

impl FakeReply {
    pub fn content(text: &str) -> Self {
        FakeReply::Content(text.to_string())
    }
}

#[derive(Default)]
struct FakeState {
    replies: Mutex<VecDeque<FakeReply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Value>>,
}

impl FakeState {
    fn next(&self, body: Value) -> Option<FakeReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(body);
        self.replies.lock().unwrap().pop_front()
    }
}

fn error_response(status: u16) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": {"message": "fake failure"}}))).into_response()
}

async fn openai_chat(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    match state.next(body) {
        Some(FakeReply::Content(content)) => Json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 800, "completion_tokens": 60, "total_tokens": 860}
        }))
        .into_response(),
        Some(FakeReply::Status(status)) => error_response(status),
        None => error_response(503),
    }
}

async fn ollama_chat(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Response {
    match state.next(body) {
        Some(FakeReply::Content(content)) => Json(json!({
            "model": "fake",
            "message": {"role": "assistant", "content": content},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 300,
            "eval_count": 40
        }))
        .into_response(),
        Some(FakeReply::Status(status)) => error_response(status),
        None => error_response(503),
    }
}

async fn openai_models() -> Json<Value> {
    Json(json!({"object": "list", "data": [{"id": "fake-model", "object": "model"}]}))
}

async fn ollama_tags() -> Json<Value> {
    Json(json!({"models": [{"name": "fake:latest"}]}))
}

/// Fake model server on a random local port, shut down when dropped.
pub struct FakeLlmServer {
    /// OpenAI-style base URL, e.g. "http://127.0.0.1:12345/v1"
    pub openai_url: String,
    /// Ollama-style base URL, e.g. "http://127.0.0.1:12345"
    pub ollama_url: String,
    state: Arc<FakeState>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeLlmServer {
    pub async fn spawn(replies: Vec<FakeReply>) -> Self {
        let state = Arc::new(FakeState {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(openai_chat))
            .route("/v1/models", get(openai_models))
            .route("/api/chat", post(ollama_chat))
            .route("/api/tags", get(ollama_tags))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake model server failed");
        });

        let server = Self {
            openai_url: format!("http://127.0.0.1:{}/v1", port),
            ollama_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);
        loop {
            let url = format!("{}/api/tags", self.ollama_url);
            if let Ok(response) = client.get(&url).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            if start.elapsed() > timeout {
                panic!("Fake model server did not become ready");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Completion requests received so far.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Bodies of the completion requests received so far.
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeLlmServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
