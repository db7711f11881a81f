//! Shared fixtures: a scratch recordings directory, a scripted provider,
//! and an axum app that routes chat completions through the recorder.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tapedeck_config::{RecordingConfig, RecordingMode};
use tapedeck_exceptions::{Fault, ValidationError};
use tapedeck_providers::ProviderRegistry;
use tapedeck_recorder::{ApiRecorder, ApiRequest};
use tempfile::TempDir;

pub const PROVIDER_URL: &str = "http://localhost:11434/v1/chat/completions";

static REGISTRY: LazyLock<ProviderRegistry> =
    LazyLock::new(|| ProviderRegistry::builtin().expect("builtin providers register"));

/// Recordings directory that outlives the recorders pointed at it
pub struct Tape {
    dir: TempDir,
}

impl Tape {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create scratch directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn recorder(&self, mode: RecordingMode) -> ApiRecorder {
        let config = RecordingConfig {
            mode,
            storage_dir: self.path().to_owned(),
            ..RecordingConfig::default()
        };
        ApiRecorder::new(&config).with_registry(&REGISTRY)
    }
}

type Respond = Box<dyn Fn() -> Result<Value, Fault> + Send + Sync>;

/// Provider double that counts calls and answers from a script
pub struct MockProvider {
    calls: AtomicUsize,
    respond: Respond,
}

impl MockProvider {
    pub fn answering(body: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            respond: Box::new(move || Ok(body.clone())),
        })
    }

    pub fn failing(fault: impl Fn() -> Fault + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            respond: Box::new(move || Err(fault())),
        })
    }

    pub async fn call(&self) -> Result<Value, Fault> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        (self.respond)()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Chat completion request with a single user message
pub fn chat(content: &str) -> ApiRequest {
    ApiRequest::post(
        PROVIDER_URL,
        serde_json::json!({
            "model": "llama3.2:3b",
            "messages": [{"role": "user", "content": content}]
        }),
    )
}

#[derive(Clone)]
struct AppState {
    recorder: Arc<ApiRecorder>,
    provider: Arc<MockProvider>,
}

/// Router exposing `POST /v1/chat/completions` backed by the recorder
pub fn app(recorder: ApiRecorder, provider: Arc<MockProvider>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(AppState {
            recorder: Arc::new(recorder),
            provider,
        })
}

/// Malformed bodies surface as validation faults, like schema failures
async fn chat_completions(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, Fault> {
    let body: Value = serde_json::from_slice(&body).map_err(ValidationError::from)?;
    let request = ApiRequest::post(PROVIDER_URL, body);
    let provider = Arc::clone(&state.provider);

    let response = state
        .recorder
        .call(&request, || async move { provider.call().await })
        .await?;

    Ok(Json(response))
}
