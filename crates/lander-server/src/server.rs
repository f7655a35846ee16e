//! Editor and preview server.

use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use tower_http::services::ServeDir;

use lander_config::{ConfigSnapshot, ItemList, Section};
use lander_preview::{preview_client_script, DeviceMode, PreviewChannel, PreviewHub};
use lander_publish::html::insert_after_body_open;
use lander_publish::{DirSource, PublishConfig, PublishError, Publisher};
use lander_store::DurableSlots;

use crate::session::{EditorSession, SessionError, SessionState};
use crate::watcher::ConfigWatcher;

/// Configuration for the editor server.
#[derive(Debug, Clone)]
pub struct EditorServerConfig {
    /// Transformed bundle served to the preview
    pub bundle_dir: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,

    /// Origins rendering contexts accept updates from. Empty means the
    /// server's own origin only.
    pub allowed_origins: Vec<String>,

    /// Directory holding the cross-session slot. `None` keeps it in memory.
    pub state_dir: Option<PathBuf>,

    /// Configuration file imported on start
    pub config_file: Option<PathBuf>,

    /// Re-import `config_file` whenever it changes
    pub watch: bool,

    pub publish: PublishConfig,
}

impl Default for EditorServerConfig {
    fn default() -> Self {
        Self {
            bundle_dir: PathBuf::from("dist-offline/site"),
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
            allowed_origins: vec![],
            state_dir: Some(PathBuf::from(".lander")),
            config_file: None,
            watch: false,
            publish: PublishConfig::default(),
        }
    }
}

impl EditorServerConfig {
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}/__preview", self.host, self.port)
    }

    fn accepted_origins(&self) -> Vec<String> {
        if self.allowed_origins.is_empty() {
            vec![self.origin()]
        } else {
            self.allowed_origins.clone()
        }
    }

    fn slots(&self) -> DurableSlots {
        match &self.state_dir {
            Some(dir) => DurableSlots::on_disk(dir),
            None => DurableSlots::in_memory(),
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Failed to import {0}: {1}")]
    ImportError(String, String),
}

/// Shared server state.
struct ServerState {
    session: EditorSession<PreviewHub>,
    hub: PreviewHub,
    publisher: Arc<Publisher>,
    bundle_dir: PathBuf,
    site_entry: String,
    client_script: String,
}

type SharedState = Arc<RwLock<ServerState>>;

/// Editor server: session API, preview page, preview WebSocket and publish.
pub struct EditorServer {
    config: EditorServerConfig,
}

impl EditorServer {
    pub fn new(config: EditorServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EditorServerConfig {
        &self.config
    }

    /// Build the application router without binding.
    pub fn router(&self) -> Result<Router, ServerError> {
        Ok(routes(self.state()?, &self.config.bundle_dir))
    }

    /// Start the editor server.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let state = self.state()?;

        if self.config.watch {
            match &self.config.config_file {
                Some(file) => spawn_watcher(file, Arc::clone(&state))?,
                None => tracing::warn!("--watch needs a configuration file; not watching"),
            }
        }

        let app = routes(state, &self.config.bundle_dir);

        tracing::info!("Starting editor at http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        if self.config.open {
            let url = format!("http://{}/preview", addr);
            let _ = open::that(&url);
        }

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }

    fn state(&self) -> Result<SharedState, ServerError> {
        let hub = PreviewHub::new(self.config.origin());
        let channel = PreviewChannel::new(hub.clone());
        let mut session = EditorSession::open(channel, self.config.slots());

        if let Some(file) = &self.config.config_file {
            let import_err =
                |message: String| ServerError::ImportError(file.display().to_string(), message);
            let source = std::fs::read_to_string(file).map_err(|e| import_err(e.to_string()))?;
            session
                .import_json(&source)
                .map_err(|e| import_err(e.to_string()))?;
            tracing::info!("Imported {}", file.display());
        }

        Ok(Arc::new(RwLock::new(ServerState {
            session,
            hub,
            publisher: Arc::new(Publisher::new(self.config.publish.clone())),
            bundle_dir: self.config.bundle_dir.clone(),
            site_entry: self.config.publish.site_entry.clone(),
            client_script: preview_client_script(
                &self.config.ws_url(),
                &self.config.accepted_origins(),
            ),
        })))
    }
}

fn routes(state: SharedState, bundle_dir: &FsPath) -> Router {
    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/config/{section}", put(update_section))
        .route("/api/items/{list}", post(add_item))
        .route("/api/items/{list}/{id}", delete(remove_item))
        .route("/api/undo", post(undo))
        .route("/api/redo", post(redo))
        .route("/api/import", post(import))
        .route("/api/export", get(export))
        .route("/api/save", post(save))
        .route("/api/device/{mode}", post(set_device))
        .route("/api/publish", post(publish))
        .route("/api/state", get(get_state))
        .route("/preview", get(preview_page))
        .route("/__preview", get(ws_handler))
        .route("/__preview.js", get(preview_script))
        .fallback_service(ServeDir::new(bundle_dir))
        .with_state(state)
}

/// Re-import the configuration file whenever it changes.
fn spawn_watcher(file: &FsPath, state: SharedState) -> Result<(), ServerError> {
    let (watcher, mut rx) =
        ConfigWatcher::new(file).map_err(|e| ServerError::WatchError(e.to_string()))?;
    tracing::info!("Watching {}", watcher.path().display());

    tokio::spawn(async move {
        while let Some(path) = rx.recv().await {
            let source = match tokio::fs::read_to_string(&path).await {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };

            let mut state = state.write().await;
            match state.session.import_json(&source) {
                Ok(_) => tracing::info!("Re-imported {}", path.display()),
                Err(e) => tracing::warn!("Ignoring change to {}: {}", path.display(), e),
            }
        }
        // Keep watcher alive
        drop(watcher);
    });

    Ok(())
}

/// JSON error body with a status code.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let status = match &e {
            SessionError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::UnknownItem { .. } => StatusCode::NOT_FOUND,
            SessionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    applied: bool,
    state: SessionState,
    config: ConfigSnapshot,
}

async fn get_config(State(state): State<SharedState>) -> Json<ConfigSnapshot> {
    let state = state.read().await;
    Json(state.session.current().as_ref().clone())
}

async fn update_section(
    State(state): State<SharedState>,
    Path(section): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> Result<Json<ConfigSnapshot>, ApiError> {
    let section: Section = section
        .parse()
        .map_err(|e| ApiError::new(StatusCode::NOT_FOUND, e))?;

    let mut state = state.write().await;
    let snapshot = state.session.update_section(section, value)?;
    Ok(Json(snapshot.as_ref().clone()))
}

async fn add_item(
    State(state): State<SharedState>,
    Path(list): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let list: ItemList = list
        .parse()
        .map_err(|e| ApiError::new(StatusCode::NOT_FOUND, e))?;

    let mut state = state.write().await;
    let (snapshot, id) = state.session.add_item(list)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "config": snapshot.as_ref() })),
    ))
}

async fn remove_item(
    State(state): State<SharedState>,
    Path((list, id)): Path<(String, u32)>,
) -> Result<Json<ConfigSnapshot>, ApiError> {
    let list: ItemList = list
        .parse()
        .map_err(|e| ApiError::new(StatusCode::NOT_FOUND, e))?;

    let mut state = state.write().await;
    let snapshot = state.session.remove_item(list, id)?;
    Ok(Json(snapshot.as_ref().clone()))
}

async fn undo(State(state): State<SharedState>) -> Json<HistoryResponse> {
    let mut state = state.write().await;
    let applied = state.session.undo().is_some();
    Json(history_response(&state.session, applied))
}

async fn redo(State(state): State<SharedState>) -> Json<HistoryResponse> {
    let mut state = state.write().await;
    let applied = state.session.redo().is_some();
    Json(history_response(&state.session, applied))
}

fn history_response(session: &EditorSession<PreviewHub>, applied: bool) -> HistoryResponse {
    HistoryResponse {
        applied,
        state: session.state(),
        config: session.current().as_ref().clone(),
    }
}

async fn import(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<ConfigSnapshot>, ApiError> {
    let mut state = state.write().await;
    match state.session.import_json(&body) {
        Ok(snapshot) => Ok(Json(snapshot.as_ref().clone())),
        Err(e) => {
            tracing::warn!("Import rejected: {}", e);
            Err(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Could not import configuration: {}", e),
            ))
        }
    }
}

async fn export(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let state = state.read().await;
    let json = state
        .session
        .export_json()
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"landing-config.json\"",
            ),
        ],
        json,
    ))
}

async fn save(State(state): State<SharedState>) -> Result<Json<SessionState>, ApiError> {
    let mut state = state.write().await;
    state.session.save()?;
    Ok(Json(state.session.state()))
}

async fn set_device(
    State(state): State<SharedState>,
    Path(mode): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let device: DeviceMode = mode
        .parse()
        .map_err(|e: String| ApiError::new(StatusCode::NOT_FOUND, e))?;

    let mut state = state.write().await;
    let decision = state.session.set_device(device);
    Ok(Json(json!({
        "decision": decision,
        "url": state.session.preview_url("/preview"),
        "dimensions": device.dimensions(),
    })))
}

async fn publish(State(state): State<SharedState>) -> Result<Response, ApiError> {
    // The lock is released before fetching so the editor stays usable.
    let (publisher, live, source) = {
        let state = state.read().await;
        (
            Arc::clone(&state.publisher),
            state.session.current(),
            DirSource::new(&state.bundle_dir),
        )
    };

    let bundle = publisher.publish(&source, &live).await.map_err(|e| {
        tracing::error!("Publish failed: {}", e);
        let status = match e {
            PublishError::InProgress => StatusCode::CONFLICT,
            _ => StatusCode::BAD_GATEWAY,
        };
        ApiError::new(status, e)
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", bundle.file_name),
            ),
        ],
        bundle.bytes,
    )
        .into_response())
}

async fn get_state(State(state): State<SharedState>) -> Json<SessionState> {
    Json(state.read().await.session.state())
}

/// The bundle's entry document with the preview client attached.
async fn preview_page(State(state): State<SharedState>) -> Response {
    let entry = {
        let state = state.read().await;
        state.bundle_dir.join(&state.site_entry)
    };

    match tokio::fs::read_to_string(&entry).await {
        Ok(html) => Html(insert_after_body_open(
            &html,
            r#"<script src="/__preview.js"></script>"#,
        ))
        .into_response(),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", entry.display(), e);
            (
                StatusCode::NOT_FOUND,
                Html(format!(
                    "<h1>No bundle</h1><p>{} is missing. Run <code>lander transform</code> first.</p>",
                    entry.display()
                )),
            )
                .into_response()
        }
    }
}

/// Handler for the preview WebSocket endpoint.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward preview updates to one rendering context.
///
/// A new connection is the context's load signal: subscribing first and
/// then resending the current snapshot means it cannot miss it.
async fn handle_ws(mut socket: WebSocket, state: SharedState) {
    let mut rx = {
        let mut state = state.write().await;
        let rx = state.hub.subscribe();
        state.session.preview_ready();
        rx
    };

    loop {
        match rx.recv().await {
            Ok(delivery) => {
                if socket.send(Message::Text(delivery.data.into())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("Preview connection skipped {} updates", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Handler for the preview client script.
async fn preview_script(State(state): State<SharedState>) -> impl IntoResponse {
    let script = state.read().await.client_script.clone();
    ([(header::CONTENT_TYPE, "application/javascript")], script)
}
