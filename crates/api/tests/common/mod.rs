//! Shared harness for HTTP-level integration tests.
//!
//! Builds the real application router (same middleware stack as the
//! binary) on top of the in-memory registry and a scripted compute
//! backend, and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use arcus_api::config::ServerConfig;
use arcus_api::router::build_app_router;
use arcus_api::state::AppState;
use arcus_backend::{BackendAdapter, BackendError, BackendPoll, DeleteOutcome};
use arcus_core::estimate::UsageMetrics;
use arcus_core::process::ProcessGraph;
use arcus_core::types::BackendHandle;
use arcus_lifecycle::JobLifecycleController;
use arcus_registry::memory::InMemoryRegistry;
use arcus_registry::JobRegistry;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Scripted backend
// ---------------------------------------------------------------------------

/// Compute backend whose submit/poll answers pop from per-call queues,
/// falling back to a sane default when a queue runs dry.
#[derive(Default)]
pub struct ScriptedBackend {
    submit_queue: Mutex<VecDeque<Result<BackendHandle, BackendError>>>,
    poll_queue: Mutex<VecDeque<Result<BackendPoll, BackendError>>>,
}

impl ScriptedBackend {
    pub fn push_submit(&self, result: Result<BackendHandle, BackendError>) {
        self.submit_queue.lock().unwrap().push_back(result);
    }

    pub fn push_poll(&self, result: Result<BackendPoll, BackendError>) {
        self.poll_queue.lock().unwrap().push_back(result);
    }

    pub fn push_state(&self, state: &str, usage: Option<UsageMetrics>) {
        self.push_poll(Ok(BackendPoll {
            state: state.to_string(),
            progress: None,
            usage,
        }));
    }
}

#[async_trait]
impl BackendAdapter for ScriptedBackend {
    async fn submit(&self, _process: &ProcessGraph) -> Result<BackendHandle, BackendError> {
        self.submit_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BackendHandle::from("bh-default")))
    }

    async fn poll_status(&self, _handle: &BackendHandle) -> Result<BackendPoll, BackendError> {
        self.poll_queue.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(BackendPoll {
                state: "RUNNING".to_string(),
                progress: None,
                usage: None,
            })
        })
    }

    async fn cancel(&self, _handle: &BackendHandle) -> Result<(), BackendError> {
        Ok(())
    }

    async fn delete(&self, _handle: &BackendHandle) -> Result<DeleteOutcome, BackendError> {
        Ok(DeleteOutcome::Deleted)
    }
}

// ---------------------------------------------------------------------------
// App fixture
// ---------------------------------------------------------------------------

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".into()],
        request_timeout_secs: 5,
        backend_api_url: "http://scripted.invalid".into(),
        supported_api_versions: vec!["1.0.0".into(), "1.1.0".into(), "1.2.0".into()],
        cost_unit: "credits".into(),
        delete_retry_max_attempts: 2,
        delete_retry_initial_ms: 1,
        delete_retry_max_ms: 5,
    }
}

/// Build the full application router wired to an in-memory registry and
/// a scripted backend. Returns the backend handle for per-test scripting.
pub fn test_app() -> (Router, Arc<ScriptedBackend>) {
    let registry: Arc<dyn JobRegistry> = Arc::new(InMemoryRegistry::new());
    let backend = Arc::new(ScriptedBackend::default());
    let config = test_config();

    let controller = Arc::new(JobLifecycleController::new(
        registry,
        Arc::clone(&backend) as Arc<dyn BackendAdapter>,
        config.lifecycle_config(),
    ));
    let state = AppState {
        controller,
        config: Arc::new(config.clone()),
    };

    (build_app_router(state, &config), backend)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Fire one request at the app. `bearer` becomes an
/// `Authorization: Bearer <subject>` header; `body` is sent as JSON.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(subject) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {subject}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, bearer: Option<&str>) -> Response {
    send(app, Method::GET, uri, bearer, None).await
}

pub async fn post(
    app: &Router,
    uri: &str,
    bearer: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    send(app, Method::POST, uri, bearer, body).await
}

pub async fn delete(app: &Router, uri: &str, bearer: Option<&str>) -> Response {
    send(app, Method::DELETE, uri, bearer, None).await
}

/// Consume a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A minimal valid submission payload.
pub fn submit_body(title: &str) -> serde_json::Value {
    serde_json::json!({
        "process": {
            "add": { "process_id": "add", "arguments": { "x": 3, "y": 5 }, "result": true }
        },
        "api_version": "1.2.0",
        "title": title,
    })
}

/// Submit a job and return its id. Asserts the 201.
pub async fn submit(app: &Router, bearer: Option<&str>, title: &str) -> String {
    let response = post(app, "/api/v1/jobs", bearer, Some(submit_body(title))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Usage metrics fixture used by finished-job tests.
pub fn usage_fixture() -> UsageMetrics {
    UsageMetrics {
        cpu_seconds: 1800.0,
        memory_mb_seconds: 600_000.0,
        duration_seconds: 900.0,
        input_megabytes: 2048.0,
    }
}
