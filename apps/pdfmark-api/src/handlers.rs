//! HTTP handlers for the pdfmark API

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pdfmark_core::{
    apply_watermark, create_document, get_page_count, highlight_matches, merge_documents,
    place_signature, AnnotationSession, PdfMarkError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

fn session_response(id: &str, session: &AnnotationSession) -> SessionResponse {
    SessionResponse {
        id: id.to_string(),
        summary: session.summary(),
    }
}

fn decode_base64(field: &str, data: &str) -> Result<Vec<u8>, ApiError> {
    BASE64
        .decode(data)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid {} base64: {}", field, e)))
}

/// Run a stateless document operation on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, PdfMarkError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn process_result(
    input_size_bytes: usize,
    output: Vec<u8>,
    started: Instant,
    matches: Option<Vec<pdfmark_core::PdfRect>>,
) -> Result<Json<ProcessResult>, ApiError> {
    let page_count = get_page_count(&output)?;
    Ok(Json(ProcessResult {
        success: true,
        metrics: ProcessMetrics {
            input_size_bytes,
            output_size_bytes: output.len(),
            page_count,
            processing_time_ms: started.elapsed().as_millis() as u64,
        },
        data: BASE64.encode(output),
        matches,
    }))
}

// ============================================================
// Session lifecycle
// ============================================================

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.create_session()?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let key = id.clone();
    let response = state
        .with_session(&id, move |session| Ok(session_response(&key, session)))
        .await?;
    Ok(Json(response))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.remove_session(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Load a document; the request body is the raw PDF
pub async fn load_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SessionResponse>, ApiError> {
    let key = id.clone();
    let response = state
        .with_session(&id, move |session| {
            session.load(body.to_vec())?;
            Ok(session_response(&key, session))
        })
        .await?;
    Ok(Json(response))
}

// ============================================================
// Annotation editing
// ============================================================

/// Apply one mutating operation and answer with the session summary
async fn mutate<F>(state: &AppState, id: String, f: F) -> Result<Json<SessionResponse>, ApiError>
where
    F: FnOnce(&mut AnnotationSession) -> Result<(), PdfMarkError> + Send + 'static,
{
    let key = id.clone();
    let response = state
        .with_session(&id, move |session| {
            f(session)?;
            Ok(session_response(&key, session))
        })
        .await?;
    Ok(Json(response))
}

pub async fn add_ink(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<InkRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    mutate(&state, id, move |session| {
        session.add_ink_stroke(req.page, req.points, req.color, req.width)
    })
    .await
}

pub async fn add_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    mutate(&state, id, move |session| {
        session.add_text_note(req.text, req.x, req.y, req.page)
    })
    .await
}

pub async fn select_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PageRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    mutate(&state, id, move |session| session.select_page(req.page)).await
}

pub async fn select_tool(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ToolRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    mutate(&state, id, move |session| {
        session.select_tool(req.tool);
        Ok(())
    })
    .await
}

/// Replay a batch of commands; stops at the first failure
pub async fn run_commands(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CommandsRequest>,
) -> Result<Json<CommandsResponse>, ApiError> {
    let key = id.clone();
    let response = state
        .with_session(&id, move |session| {
            let outcome = session.execute_all(req.commands);
            Ok(CommandsResponse {
                outcome,
                session: session_response(&key, session),
            })
        })
        .await?;
    Ok(Json(response))
}

/// Download the document with every pending annotation applied
pub async fn flush(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf = state
        .with_session(&id, |session| Ok(session.flush()?))
        .await?;
    tracing::info!("Flushed session {} ({} bytes)", id, pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"annotated.pdf\"",
            ),
        ],
        pdf,
    ))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Path((id, page)): Path<(String, usize)>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = state
        .with_session(&id, move |session| {
            let matches = session.search_text(page, &query.q)?;
            Ok(SearchResponse {
                page,
                query: query.q,
                matches,
            })
        })
        .await?;
    Ok(Json(response))
}

pub async fn page_text(
    State(state): State<Arc<AppState>>,
    Path((id, page)): Path<(String, usize)>,
) -> Result<Json<TextResponse>, ApiError> {
    let response = state
        .with_session(&id, move |session| {
            let text = session.extract_text(page)?;
            Ok(TextResponse { page, text })
        })
        .await?;
    Ok(Json(response))
}

/// Render a page of the loaded document as PNG
pub async fn render(
    State(state): State<Arc<AppState>>,
    Path((id, page)): Path<(String, usize)>,
    Query(query): Query<RenderQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rasterizer = state.rasterizer()?;
    let png = state
        .with_session(&id, move |session| {
            let image = session.render_page(rasterizer.as_ref(), page, query.scale)?;
            Ok(image.to_png()?)
        })
        .await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

// ============================================================
// Stateless document operations
// ============================================================

/// Build a new text document
pub async fn create(Json(req): Json<CreateRequest>) -> Result<Json<ProcessResult>, ApiError> {
    let started = Instant::now();
    if req.pages.is_empty() {
        return Err(ApiError::InvalidRequest(
            "A document needs at least one page".into(),
        ));
    }

    let pages = req.pages.len();
    let pdf = blocking(move || create_document(&req.pages)).await?;
    tracing::info!("Created document with {} pages", pages);
    process_result(0, pdf, started, None)
}

pub async fn merge(Json(req): Json<MergeRequest>) -> Result<Json<ProcessResult>, ApiError> {
    let started = Instant::now();
    let documents = req
        .documents
        .iter()
        .enumerate()
        .map(|(i, doc)| decode_base64(&format!("document {}", i), doc))
        .collect::<Result<Vec<_>, _>>()?;
    let input_size: usize = documents.iter().map(Vec::len).sum();

    let merged = blocking(move || merge_documents(documents)).await?;
    tracing::info!("Merged {} documents", req.documents.len());
    process_result(input_size, merged, started, None)
}

pub async fn watermark(
    Json(req): Json<WatermarkRequest>,
) -> Result<Json<ProcessResult>, ApiError> {
    let started = Instant::now();
    let pdf = decode_base64("pdf", &req.pdf_base64)?;
    let input_size = pdf.len();

    let output = blocking(move || apply_watermark(&pdf, &req.style)).await?;
    process_result(input_size, output, started, None)
}

pub async fn highlight(
    Json(req): Json<HighlightRequest>,
) -> Result<Json<ProcessResult>, ApiError> {
    let started = Instant::now();
    let pdf = decode_base64("pdf", &req.pdf_base64)?;
    let input_size = pdf.len();

    let outcome = blocking(move || {
        highlight_matches(&pdf, req.page, &req.query, req.color, req.opacity)
    })
    .await?;
    process_result(input_size, outcome.pdf, started, Some(outcome.matches))
}

pub async fn signature(
    Json(req): Json<SignatureRequest>,
) -> Result<Json<ProcessResult>, ApiError> {
    let started = Instant::now();
    let pdf = decode_base64("pdf", &req.pdf_base64)?;
    let png = decode_base64("png", &req.png_base64)?;
    let input_size = pdf.len();

    let output = blocking(move || place_signature(&pdf, req.page, &png, &req.rect)).await?;
    process_result(input_size, output, started, None)
}
