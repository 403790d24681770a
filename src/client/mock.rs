//! In-process stand-in for the booking backend, used by tests
//!
//! Every request is recorded, so tests can assert on headers and bodies or on
//! the absence of any request at all.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::BoxClient;
use crate::config::ApiConfig;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(String, String), CannedResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Answer `method path` with a raw body
    pub fn on(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        self.insert(method, path, status, body.into(), None);
    }

    pub fn on_json(&self, method: &str, path: &str, status: u16, body: serde_json::Value) {
        self.insert(method, path, status, body.to_string(), None);
    }

    /// Like `on_json`, but the response is held back for `delay`
    pub fn on_json_delayed(
        &self,
        method: &str,
        path: &str,
        status: u16,
        body: serde_json::Value,
        delay: Duration,
    ) {
        self.insert(method, path, status, body.to_string(), Some(delay));
    }

    fn insert(&self, method: &str, path: &str, status: u16, body: String, delay: Option<Duration>) {
        self.state.routes.lock().unwrap().insert(
            (method.to_uppercase(), path.to_string()),
            CannedResponse {
                status,
                body,
                delay,
            },
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::with_base_url(self.base_url.clone())
    }

    pub fn client(&self, session: Session) -> BoxClient {
        BoxClient::new(&self.api_config(), session).unwrap()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_str("authorization"),
        api_key: header_str("x-api-key"),
        content_type: header_str("content-type"),
        body,
    });

    let canned = state
        .routes
        .lock()
        .unwrap()
        .get(&(method.to_string(), uri.path().to_string()))
        .cloned();

    let Some(canned) = canned else {
        return (StatusCode::NOT_FOUND, r#"{"detail":"Not Found"}"#).into_response();
    };

    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }

    Response::builder()
        .status(StatusCode::from_u16(canned.status).unwrap())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(canned.body))
        .unwrap()
}
