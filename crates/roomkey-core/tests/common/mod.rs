#![allow(dead_code)]

//! In-process stand-in for the booking backend.
//!
//! Every request is recorded with its headers and body; responses are
//! scripted per path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Path prefix the mock serves under, like the real API's `/api/v1`
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct Scripted {
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
}

#[derive(Default)]
struct Shared {
    recorded: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<HashMap<String, Scripted>>,
}

pub struct MockBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock backend");
        let addr = listener.local_addr().expect("failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend crashed");
        });

        Self { addr, shared }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    /// Answer requests to `path` (relative to the API prefix) with `status` and `body`.
    pub fn respond(&self, path: &str, status: u16, body: Value) {
        self.script(path, status, body, None);
    }

    /// Like `respond`, but wait `delay` before answering.
    pub fn respond_after(&self, path: &str, delay: Duration, status: u16, body: Value) {
        self.script(path, status, body, Some(delay));
    }

    fn script(&self, path: &str, status: u16, body: Value, delay: Option<Duration>) {
        let status = StatusCode::from_u16(status).expect("invalid status");
        self.shared
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Scripted { status, body, delay });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.recorded.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        let full = format!("{}{}", API_PREFIX, path);
        self.requests().into_iter().filter(|r| r.path == full).collect()
    }

    pub fn request_count(&self) -> usize {
        self.shared.recorded.lock().unwrap().len()
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    shared.recorded.lock().unwrap().push(RecordedRequest {
        method,
        path: path.clone(),
        authorization: header_string(&headers, header::AUTHORIZATION),
        accept: header_string(&headers, header::ACCEPT),
        content_type: header_string(&headers, header::CONTENT_TYPE),
        body: serde_json::from_slice(&body).ok(),
    });

    let relative = path.strip_prefix(API_PREFIX).unwrap_or(&path).to_string();
    let scripted = shared.responses.lock().unwrap().get(&relative).cloned();

    match scripted {
        Some(scripted) => {
            if let Some(delay) = scripted.delay {
                tokio::time::sleep(delay).await;
            }
            (scripted.status, Json(scripted.body)).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response(),
    }
}

/// A profile body as the backend sends it
pub fn profile_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "full_name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "phone": "+62811000111",
        "profile_image_url": "https://cdn.example.com/avatars/1.png"
    })
}
