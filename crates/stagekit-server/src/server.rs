//! Reference source of truth: serves and accepts whole assembly documents

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use stagekit_core::{
    canonicalize, parse_document, to_document_string_pretty, validate_document, Component,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const FETCH_PATH: &str = "/get/kinematics/assembly";
pub const SUBMIT_PATH: &str = "/post/kinematics/assembly";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Load the initial document from here and persist accepted submissions to it.
    pub assembly_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8000,
            assembly_path: None,
        }
    }
}

pub struct AppState {
    assembly: RwLock<Component>,
    revision: AtomicU64,
    persist_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(assembly: Component, persist_path: Option<PathBuf>) -> Self {
        Self {
            assembly: RwLock::new(assembly),
            revision: AtomicU64::new(0),
            persist_path,
        }
    }

    pub async fn assembly(&self) -> Component {
        self.assembly.read().await.clone()
    }

    /// Number of accepted submissions since start.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

/// Read the initial document. A missing file yields the default root.
pub fn load_assembly(path: &Path) -> anyhow::Result<Component> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let root = parse_document(&content)?;
            info!("Loaded assembly from {}", path.display());
            Ok(root)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No assembly at {}, starting from empty root", path.display());
            Ok(Component::root())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(FETCH_PATH, get(fetch_handler))
        .route(SUBMIT_PATH, post(submit_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let initial = match &config.assembly_path {
        Some(path) => load_assembly(path)?,
        None => Component::root(),
    };
    let state = Arc::new(AppState::new(initial, config.assembly_path.clone()));
    let app = router(state);

    let bind_addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;

    info!("Stagekit server v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Fetch:  GET  http://{}{}", bind_addr, FETCH_PATH);
    info!("  Submit: POST http://{}{}", bind_addr, SUBMIT_PATH);
    if let Some(path) = &config.assembly_path {
        info!("  Assembly file: {}", path.display());
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "revision": state.revision(),
    }))
}

async fn fetch_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.assembly().await)
}

fn reject(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    warn!("Rejecting submission: {}", message);
    (status, Json(json!({ "error": message }))).into_response()
}

/// Accept a full replacement document. The stored form has every rotation
/// scaled to unit length; that canonical form is what the caller gets back.
async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut document: Component = match serde_json::from_value(body) {
        Ok(doc) => doc,
        Err(e) => return reject(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    };
    canonicalize(&mut document);
    if let Err(e) = validate_document(&document) {
        return reject(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }

    let mut stored = state.assembly.write().await;
    if let Some(path) = &state.persist_path {
        let persisted = match to_document_string_pretty(&document) {
            Ok(text) => tokio::fs::write(path, text).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = persisted {
            return reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to persist {}: {}", path.display(), e),
            );
        }
    }
    *stored = document.clone();
    let revision = state.revision.fetch_add(1, Ordering::SeqCst) + 1;
    info!(
        "Accepted assembly revision {} ({} components)",
        revision,
        stagekit_core::count(&document)
    );

    Json(document).into_response()
}
