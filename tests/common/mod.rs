#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use bothost_agent::error::AgentError;
use bothost_agent::services::gemini::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, Model, Part,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base url nothing is listening on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub const LONG_LOG_ID: &str = "dep-long";
pub const NO_LOG_ID: &str = "dep-nologs";
pub const ARRAY_LOG_ID: &str = "dep-array";

/// Calls seen by the fake backend, in arrival order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Fake bot-hosting backend. `/stop` always answers 500.
pub async fn spawn_backend() -> (String, CallLog) {
    let calls: CallLog = Arc::default();

    async fn bots(
        State(calls): State<CallLog>,
        Query(q): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let user_id = q.get("userId").cloned().unwrap_or_default();
        calls.lock().await.push(format!("bots:{}", user_id));
        Json(json!({
            "bots": [{ "deploymentId": "dep-1", "user": user_id, "status": "CRASHED" }]
        }))
    }

    async fn logs(State(calls): State<CallLog>, Path(id): Path<String>) -> Json<Value> {
        calls.lock().await.push(format!("logs:{}", id));
        match id.as_str() {
            ARRAY_LOG_ID => Json(json!(["line one", "line two"])),
            LONG_LOG_ID => Json(json!({ "logs": format!("{}END", "x".repeat(1500)) })),
            NO_LOG_ID => Json(json!({})),
            _ => Json(json!({ "logs": "Error: connect ETIMEDOUT 10.0.0.1:443" })),
        }
    }

    async fn stop(
        State(calls): State<CallLog>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        calls
            .lock()
            .await
            .push(format!("stop:{}", body["deploymentId"].as_str().unwrap_or("")));
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Bot not found running" })),
        )
    }

    async fn start(State(calls): State<CallLog>, Json(body): Json<Value>) -> Json<Value> {
        calls
            .lock()
            .await
            .push(format!("start:{}", body["deploymentId"].as_str().unwrap_or("")));
        Json(json!({ "success": true, "message": "Bot started" }))
    }

    let app = Router::new()
        .route("/bots", get(bots))
        .route("/logs/{id}", get(logs))
        .route("/stop", post(stop))
        .route("/start", post(start))
        .with_state(calls.clone());

    (spawn(app).await, calls)
}

/// Read one HTTP/1.1 request and return its request line and body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<(String, Vec<u8>)> {
    use tokio::io::AsyncReadExt;

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request_line = head.lines().next().unwrap_or_default().to_string();
    Some((request_line, buf[header_end..header_end + content_length].to_vec()))
}

/// Raw backend whose `/stop` closes the connection without answering.
/// `/start` answers 200. Both are recorded as `stop:<id>` / `start:<id>`.
pub async fn spawn_backend_dropping_stop() -> (String, CallLog) {
    use tokio::io::AsyncWriteExt;

    let calls: CallLog = Arc::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let log = calls.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let log = log.clone();
            tokio::spawn(async move {
                let Some((request_line, body)) = read_request(&mut socket).await else {
                    return;
                };
                let body: Value = serde_json::from_slice(&body).unwrap_or_default();
                let id = body["deploymentId"].as_str().unwrap_or("").to_string();
                if request_line.starts_with("POST /stop") {
                    log.lock().await.push(format!("stop:{}", id));
                    drop(socket);
                    return;
                }
                log.lock().await.push(format!("start:{}", id));
                let reply = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}";
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), calls)
}

#[derive(Clone)]
pub enum Step {
    Reply(Content),
    Fail(u16),
}

pub fn text_step(text: &str) -> Step {
    Step::Reply(Content {
        role: Some("model".into()),
        parts: vec![Part::text(text)],
    })
}

pub fn call_step(name: &str, args: Value) -> Step {
    Step::Reply(Content {
        role: Some("model".into()),
        parts: vec![Part::function_call(name, args)],
    })
}

/// Model that plays back a fixed script. The last step repeats forever.
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    pub requests: Mutex<Vec<GenerateContentRequest>>,
}

impl ScriptedModel {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        assert!(!steps.is_empty());
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::default(),
        })
    }
}

#[async_trait]
impl Model for ScriptedModel {
    async fn generate(
        &self,
        _model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AgentError> {
        self.requests.lock().await.push(request.clone());
        let step = {
            let mut steps = self.steps.lock().await;
            if steps.len() > 1 {
                steps.pop_front().unwrap()
            } else {
                steps.front().cloned().unwrap()
            }
        };
        match step {
            Step::Reply(content) => Ok(GenerateContentResponse {
                candidates: vec![Candidate {
                    content: Some(content),
                    finish_reason: Some("STOP".into()),
                }],
            }),
            Step::Fail(status) => Err(AgentError::Model {
                status,
                body: "scripted failure".into(),
            }),
        }
    }
}
