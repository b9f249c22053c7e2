//! HTTP shell: one upload in, one scanned PDF out.
//!
//! ```text
//! POST /upload   multipart: file=<pdf>, edgemode=laplacian|sobel (optional)
//! GET  /health   liveness probe
//! ```
//!
//! The handler validates the form, saves the upload into a per-request
//! [`UploadWorkspace`], runs [`process_file`] into the same workspace and
//! streams the result back as `scanned_document.pdf`. The workspace is
//! dropped when the handler returns, which removes every temporary file
//! whether the scan succeeded or not.
//!
//! Status mapping lives on [`ScanError`]'s `IntoResponse` impl: client errors
//! answer 400 with their message verbatim, everything else answers 500 with
//! `Processing error: <message>`.

use crate::config::{ScanConfig, ServerConfig};
use crate::error::ScanError;
use crate::pipeline::filter::FilterMethod;
use crate::pipeline::input::{self, UploadWorkspace};
use crate::process::process_file;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Suggested download name for every scanned document.
pub const DOWNLOAD_FILE_NAME: &str = "scanned_document.pdf";

#[derive(Clone)]
struct AppState {
    scan: Arc<ScanConfig>,
}

/// Fields of the upload form that matter; everything else is ignored.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    edgemode: Option<String>,
}

struct UploadedFile {
    file_name: Option<String>,
    bytes: Bytes,
}

/// Build the application router.
///
/// Exposed separately from [`serve`] so tests can drive it in-process.
pub fn router(config: &ServerConfig) -> Router {
    let state = AppState {
        scan: Arc::new(config.scan.clone()),
    };

    Router::new()
        .route("/upload", post(upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state)
}

/// Bind `config.bind` and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> Result<(), ScanError> {
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to bind {}: {}", config.bind, e)))?;
    info!(
        "Listening on http://{} (default method: {})",
        config.bind, config.scan.method
    );

    axum::serve(listener, router(&config))
        .await
        .map_err(|e| ScanError::Internal(format!("Server error: {}", e)))
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip_all)]
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ScanError> {
    let form = read_form(&mut multipart).await?;

    let file = form.file.ok_or(ScanError::NoFilePart)?;
    let file_name = input::validate_upload_filename(file.file_name.as_deref())?;

    let method = form
        .edgemode
        .as_deref()
        .map(FilterMethod::parse_or_default)
        .unwrap_or(state.scan.method);
    info!(
        "Upload '{}' ({} bytes), method={}",
        file_name,
        file.bytes.len(),
        method
    );

    let workspace = UploadWorkspace::new()?;
    let saved = workspace.save_upload(&file_name, &file.bytes).await?;
    let output_path = workspace.output_path();

    let config = state.scan.with_method(method);
    let stats = process_file(&saved, &output_path, &config).await?;

    let pdf = tokio::fs::read(&output_path)
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to read output: {}", e)))?;
    info!(
        "Returning {} pages ({} bytes) in {}ms",
        stats.total_pages, stats.output_bytes, stats.total_duration_ms
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
            ),
        ],
        pdf,
    )
        .into_response())
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, ScanError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ScanError::MalformedUpload(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ScanError::MalformedUpload(e.to_string()))?;
                form.file = Some(UploadedFile { file_name, bytes });
            }
            Some("edgemode") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ScanError::MalformedUpload(e.to_string()))?;
                form.edgemode = Some(text);
            }
            _ => {}
        }
    }

    Ok(form)
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!("Rejected upload: {}", self);
            (StatusCode::BAD_REQUEST, self.to_string()).into_response()
        } else {
            error!("Scan failed: {}", self);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Processing error: {}", self),
            )
                .into_response()
        }
    }
}
