use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    serve, Json, Router,
};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::adapter::ConversationAdapter;
use crate::constants::{self, clamp_temperature};
use crate::conversation::{normalize_history, HistoryEntry, Turn};
use crate::error::FailureKind;
use crate::persona::Mode;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<Environment<'static>>,
    adapter: ConversationAdapter,
}

impl AppState {
    pub fn new(adapter: ConversationAdapter) -> Result<Self> {
        let templates = create_minijinja_env().context("Failed to initialize template engine")?;
        Ok(Self {
            templates: Arc::new(templates),
            adapter,
        })
    }
}

fn create_minijinja_env() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX_TEMPLATE)?;
    Ok(env)
}

/// Body of `POST /api/chat`. The page sends the whole conversation each time.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    constants::DEFAULT_TEMPERATURE
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Cleared input box value.
    pub message: String,
    pub history: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .get_template("index.html")
        .and_then(|tmpl| {
            let modes: Vec<&str> = Mode::ALL.iter().map(|m| m.label()).collect();
            tmpl.render(minijinja::context! {
                title => "IELTS & PTE Coach",
                modes => modes,
                default_mode => Mode::default().label(),
                min_temperature => constants::MIN_TEMPERATURE,
                max_temperature => constants::MAX_TEMPERATURE,
                default_temperature => constants::DEFAULT_TEMPERATURE,
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

async fn chat_handler(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
    let history = normalize_history(request.history);
    let temperature = clamp_temperature(request.temperature);

    let reply = state
        .adapter
        .respond(&request.message, &history, request.mode, temperature)
        .await;

    Json(ChatResponse {
        message: reply.input,
        history: reply.history,
        error: reply.failure,
    })
}

async fn modes_handler() -> Json<Vec<&'static str>> {
    Json(Mode::ALL.iter().map(|m| m.label()).collect())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/modes", get(modes_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;
    info!("Web server listening on http://{}", addr);

    serve(listener, app).await.context("Web server failed")?;

    Ok(())
}
