//! HTTP JSON API over a shared [`Session`].
//!
//! One session per server process, guarded by a `tokio::sync::Mutex` so
//! ingestion and questions never interleave.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version and model names) |
//! | `POST`   | `/documents` | Ingest base64-encoded files, returns the batch report |
//! | `GET`    | `/documents` | Stats and document metadata |
//! | `DELETE` | `/documents` | Clear documents, index, conversation and summary |
//! | `POST`   | `/documents/{id}/summary` | Regenerate one document summary |
//! | `POST`   | `/ask` | Answer a question |
//! | `GET`    | `/conversation` | Conversation log |
//! | `DELETE` | `/conversation` | Clear the conversation log |
//! | `GET`    | `/summary` | Executive summary and per-document summaries |
//! | `GET`    | `/export/{format}` | `markdown`, `json` or `summary` report |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "no_documents", "message": "no documents have been indexed yet" } }
//! ```
//!
//! `bad_request` and ingestion validation codes map to 400, `not_found` to
//! 404, `no_documents` to 409, everything else to 500.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use doc_insights_core::error::DocqError;
use doc_insights_core::models::{AnswerResult, ConversationTurn, Document, SourceFile};
use doc_insights_core::session::{BatchReport, Session, SessionStats};

use crate::export::{render, ExportFormat};
use crate::extract::FileExtractor;

pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Clone)]
struct AppState {
    session: SharedSession,
    extractor: FileExtractor,
}

/// Build the router. Exposed for tests that serve it on an ephemeral port.
pub fn router(session: SharedSession) -> Router {
    let state = AppState {
        session,
        extractor: FileExtractor,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/documents",
            post(handle_upload).get(handle_list).delete(handle_clear_all),
        )
        .route("/documents/{id}/summary", post(handle_regenerate_summary))
        .route("/ask", post(handle_ask))
        .route(
            "/conversation",
            get(handle_conversation).delete(handle_clear_conversation),
        )
        .route("/summary", get(handle_summary))
        .route("/export/{format}", get(handle_export))
        .layer(cors)
        .with_state(state)
}

/// Bind `bind_addr` and serve until the process is terminated.
pub async fn run_server(bind_addr: &str, session: SharedSession) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("doc-insights server listening on http://{}", listener.local_addr()?);
    serve(listener, session).await
}

pub async fn serve(listener: TcpListener, session: SharedSession) -> anyhow::Result<()> {
    axum::serve(listener, router(session)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<DocqError> for AppError {
    fn from(err: DocqError) -> Self {
        let status = match &err {
            DocqError::NoDocuments => StatusCode::CONFLICT,
            DocqError::Configuration(_)
            | DocqError::EmptyContent(_)
            | DocqError::UnsupportedFileType(_) => StatusCode::BAD_REQUEST,
            DocqError::DimensionMismatch { .. } | DocqError::ExternalService { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    embedding_model: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let session = state.session.lock().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        embedding_model: session.index().embedder().model_name().to_string(),
    })
}

// ============ /documents ============

#[derive(Deserialize)]
struct UploadRequest {
    files: Vec<UploadFile>,
}

#[derive(Deserialize)]
struct UploadFile {
    filename: String,
    content_base64: String,
}

async fn handle_upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<BatchReport>, AppError> {
    if req.files.is_empty() {
        return Err(bad_request("files must not be empty"));
    }

    let mut files = Vec::with_capacity(req.files.len());
    for file in req.files {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(file.content_base64.trim())
            .map_err(|e| bad_request(format!("{}: invalid base64: {}", file.filename, e)))?;
        files.push(SourceFile {
            filename: file.filename,
            bytes,
        });
    }

    let mut session = state.session.lock().await;
    let report = session.ingest_batch(&state.extractor, files).await;
    Ok(Json(report))
}

#[derive(Serialize)]
struct DocumentsResponse {
    stats: SessionStats,
    documents: Vec<Document>,
}

async fn handle_list(State(state): State<AppState>) -> Json<DocumentsResponse> {
    let session = state.session.lock().await;
    Json(DocumentsResponse {
        stats: session.stats(),
        documents: session.documents().to_vec(),
    })
}

async fn handle_clear_all(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.session.lock().await.clear_all();
    Json(serde_json::json!({ "status": "cleared" }))
}

async fn handle_regenerate_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut session = state.session.lock().await;
    let summary = session
        .regenerate_summary(&id)
        .await
        .ok_or_else(|| not_found(format!("document not found: {}", id)))?;
    Ok(Json(serde_json::json!({ "id": id, "summary": summary })))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AnswerResult>, AppError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let mut session = state.session.lock().await;
    Ok(Json(session.ask(question).await?))
}

// ============ /conversation ============

async fn handle_conversation(State(state): State<AppState>) -> Json<Vec<ConversationTurn>> {
    Json(state.session.lock().await.conversation().to_vec())
}

async fn handle_clear_conversation(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.session.lock().await.clear_conversation();
    Json(serde_json::json!({ "status": "cleared" }))
}

// ============ GET /summary ============

#[derive(Serialize)]
struct DocumentSummary {
    id: String,
    filename: String,
    summary: String,
}

#[derive(Serialize)]
struct SummaryResponse {
    executive_summary: String,
    documents: Vec<DocumentSummary>,
}

async fn handle_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    let session = state.session.lock().await;
    Json(SummaryResponse {
        executive_summary: session.executive_summary().to_string(),
        documents: session
            .documents()
            .iter()
            .map(|d| DocumentSummary {
                id: d.id.clone(),
                filename: d.filename.clone(),
                summary: d.summary.clone(),
            })
            .collect(),
    })
}

// ============ GET /export/{format} ============

async fn handle_export(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<Response, AppError> {
    let format: ExportFormat = format.parse().map_err(|e: anyhow::Error| bad_request(e.to_string()))?;
    let report = state.session.lock().await.report();
    let now = chrono::Utc::now();
    let body = render(&report, format, now).map_err(|e| internal(format!("{:#}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name(now)),
            ),
        ],
        body,
    )
        .into_response())
}
