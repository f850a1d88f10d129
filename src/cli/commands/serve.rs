//! HTTP API server for integration with other systems.
//!
//! Each session is created by `POST /sessions` and addressed by its UUID.
//! Sessions never share history, documents or indexes. Sessions left idle
//! longer than the configured time-to-live are dropped by a background sweep.

use super::load_prompts;
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::documents::PdfExtractor;
use crate::error::{Result, TutorError};
use crate::rag::{ConversationEntry, Mode};
use crate::session::{DocumentSummary, ModeChange, QueryResponse, TutorSession};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

type SessionFactory = Box<dyn Fn() -> Result<TutorSession> + Send + Sync>;

struct SessionSlot {
    session: Arc<Mutex<TutorSession>>,
    last_used: std::sync::Mutex<Instant>,
}

impl SessionSlot {
    fn new(session: TutorSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_used: std::sync::Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        if let Ok(mut last_used) = self.last_used.lock() {
            *last_used = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_used
            .lock()
            .map(|last_used| last_used.elapsed())
            .unwrap_or_default()
    }
}

/// Shared application state.
struct AppState {
    new_session: SessionFactory,
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
}

impl AppState {
    fn new(new_session: SessionFactory) -> Self {
        Self {
            new_session,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn session(&self, id: Uuid) -> std::result::Result<Arc<Mutex<TutorSession>>, ApiError> {
        let sessions = self.sessions.read().await;
        let slot = sessions.get(&id).ok_or_else(|| ApiError::not_found(id))?;
        slot.touch();
        Ok(slot.session.clone())
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were dropped.
    async fn expire_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| slot.idle_for() <= ttl);
        before - sessions.len()
    }
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: &str,
    port: u16,
    session_ttl_secs: u64,
    settings: Settings,
) -> anyhow::Result<()> {
    let prompts: Prompts = load_prompts(&settings)?;
    let state = Arc::new(AppState::new(Box::new(move || {
        TutorSession::from_settings(&settings, &prompts)
    })));

    if session_ttl_secs > 0 {
        let ttl = Duration::from_secs(session_ttl_secs);
        let sweeper = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(ttl.min(Duration::from_secs(60)));
            loop {
                interval.tick().await;
                let expired = sweeper.expire_idle(ttl).await;
                if expired > 0 {
                    info!("Expired {} idle sessions", expired);
                }
            }
        });
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Tutorly API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Session", "GET    /sessions/{id}, DELETE /sessions/{id}");
    Output::kv("Load document", "POST   /sessions/{id}/document");
    Output::kv("Upload PDF", "POST   /sessions/{id}/document/pdf?doc_id=...");
    Output::kv("Unload document", "DELETE /sessions/{id}/document");
    Output::kv("Switch mode", "PUT    /sessions/{id}/mode");
    Output::kv("Ask", "POST   /sessions/{id}/query");
    Output::kv("History", "GET    /sessions/{id}/history, DELETE /sessions/{id}/history");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route(
            "/sessions/{id}/document",
            post(load_document).delete(unload_document),
        )
        .route("/sessions/{id}/document/pdf", post(upload_pdf))
        .route("/sessions/{id}/mode", put(set_mode))
        .route("/sessions/{id}/query", post(query))
        .route("/sessions/{id}/history", get(get_history).delete(clear_history))
        .with_state(state)
}

// === Errors ===

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(id: Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("Session not found: {}", id),
        }
    }
}

fn status_for(err: &TutorError) -> StatusCode {
    match err {
        TutorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TutorError::ModeUnavailable(_) | TutorError::EmbeddingMismatch(_) => StatusCode::CONFLICT,
        TutorError::DocumentRead(_) => StatusCode::UNPROCESSABLE_ENTITY,
        e if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TutorError> for ApiError {
    fn from(err: TutorError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            warn!("Request failed: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// === Request/Response Types ===

#[derive(Debug, Serialize)]
struct SessionInfo {
    session_id: Uuid,
    mode: Mode,
    document_loaded: bool,
    document: Option<DocumentSummary>,
    history_len: usize,
}

impl SessionInfo {
    fn of(id: Uuid, session: &TutorSession) -> Self {
        Self {
            session_id: id,
            mode: session.active_mode(),
            document_loaded: session.document_loaded(),
            document: session.document().map(|d| d.summary()),
            history_len: session.history().len(),
        }
    }
}

#[derive(Deserialize)]
struct LoadRequest {
    /// PDF on the server's filesystem.
    #[serde(default)]
    path: Option<String>,
    /// Plain text to index instead of a file.
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    doc_id: Option<String>,
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default)]
    overlap: Option<usize>,
}

/// Query parameters of a raw PDF upload.
#[derive(Deserialize)]
struct UploadParams {
    #[serde(default)]
    doc_id: Option<String>,
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default)]
    overlap: Option<usize>,
}

#[derive(Deserialize)]
struct ModeRequest {
    mode: Mode,
}

#[derive(Debug, Serialize)]
struct ModeResponse {
    mode: Mode,
    change: ModeChange,
}

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Serialize)]
struct HistoryResponse {
    mode: Mode,
    entries: Vec<ConversationEntry>,
}

#[derive(Serialize)]
struct ClearedResponse {
    cleared: usize,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<(StatusCode, Json<SessionInfo>), ApiError> {
    let session = (state.new_session)()?;
    let id = Uuid::new_v4();
    let info = SessionInfo::of(id, &session);

    state
        .sessions
        .write()
        .await
        .insert(id, SessionSlot::new(session));
    info!("Created session {}", id);

    Ok((StatusCode::CREATED, Json(info)))
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<SessionInfo> {
    let session = state.session(id).await?;
    let session = session.lock().await;
    Ok(Json(SessionInfo::of(id, &session)))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> std::result::Result<StatusCode, ApiError> {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!("Deleted session {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::not_found(id)),
    }
}

async fn load_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LoadRequest>,
) -> ApiResult<DocumentSummary> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;

    let defaults = session.chunking();
    let chunk_size = req.chunk_size.unwrap_or(defaults.chunk_size);
    let overlap = req.overlap.unwrap_or(defaults.overlap);

    let summary = match (req.path, req.text) {
        (Some(path), None) => {
            session
                .load_document(&Settings::expand_path(&path), chunk_size, overlap)
                .await?
        }
        (None, Some(text)) => {
            let doc_id = req.doc_id.unwrap_or_else(|| "text".to_string());
            session.load_text(&doc_id, &text, chunk_size, overlap).await?
        }
        _ => {
            return Err(TutorError::InvalidInput(
                "provide exactly one of 'path' or 'text'".to_string(),
            )
            .into())
        }
    };

    Ok(Json(summary))
}

async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> ApiResult<DocumentSummary> {
    let session = state.session(id).await?;
    if body.is_empty() {
        return Err(TutorError::InvalidInput("request body is empty".to_string()).into());
    }

    let doc_id = params.doc_id.unwrap_or_else(|| "upload".to_string());
    let extracted = PdfExtractor::new().extract_bytes(&doc_id, body.to_vec()).await?;

    let mut session = session.lock().await;
    let defaults = session.chunking();
    let summary = session
        .load_extracted(
            extracted,
            params.chunk_size.unwrap_or(defaults.chunk_size),
            params.overlap.unwrap_or(defaults.overlap),
        )
        .await?;
    info!("Session {} loaded upload {}", id, summary.doc_id);

    Ok(Json(summary))
}

async fn unload_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionInfo> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    session.unload_document();
    Ok(Json(SessionInfo::of(id, &session)))
}

async fn set_mode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ModeRequest>,
) -> ApiResult<ModeResponse> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    let change = session.set_mode(req.mode)?;
    Ok(Json(ModeResponse {
        mode: session.active_mode(),
        change,
    }))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<QueryResponse> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    Ok(Json(session.query(&req.question).await?))
}

async fn get_history(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<HistoryResponse> {
    let session = state.session(id).await?;
    let session = session.lock().await;
    Ok(Json(HistoryResponse {
        mode: session.active_mode(),
        entries: session.history().to_vec(),
    }))
}

async fn clear_history(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<ClearedResponse> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    Ok(Json(ClearedResponse {
        cleared: session.clear_history(),
    }))
}
