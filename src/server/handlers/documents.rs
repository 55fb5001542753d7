//! Document rendering over multipart uploads.
//!
//! Parts:
//! - `pdf`: the source PDF (required)
//! - `template`: template JSON (required)
//! - `record`: record JSON object (optional, empty when absent)

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use log::{debug, warn};
use std::sync::Arc;

use crate::error::ValidocError;
use crate::record::DataRecord;
use crate::render::RenderReport;
use crate::template::Template;

use super::super::state::AppState;

type HandlerError = (StatusCode, String);

/// Handle POST /api/documents/render - returns the filled PDF.
pub async fn render(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, HandlerError> {
    let mut pdf: Option<Vec<u8>> = None;
    let mut template: Option<Template> = None;
    let mut record = DataRecord::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read '{}': {}", name, e)))?;
        match name.as_str() {
            "pdf" => pdf = Some(bytes.to_vec()),
            "template" => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Invalid template JSON: {}", e))
                })?;
                template = Some(parsed);
            }
            "record" => {
                let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("Invalid record JSON: {}", e))
                })?;
                record = DataRecord::from_json_value(value).map_err(bad_request)?;
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let pdf = pdf.ok_or((StatusCode::BAD_REQUEST, "Missing 'pdf' part".to_string()))?;
    let template =
        template.ok_or((StatusCode::BAD_REQUEST, "Missing 'template' part".to_string()))?;

    let renderer = state.renderer.clone();
    let rendered = tokio::task::spawn_blocking(move || renderer.render(&pdf, &template, &record))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Task error: {}", e),
            )
        })?
        .map_err(|e| {
            warn!("Render failed: {}", e);
            error_response(e)
        })?;

    let mut headers = report_headers(&rendered.report);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    Ok((StatusCode::OK, headers, rendered.bytes).into_response())
}

fn report_headers(report: &RenderReport) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let counts = [
        ("x-validoc-drawn", report.drawn.len()),
        ("x-validoc-skipped", report.skipped.len()),
        ("x-validoc-placeholders", report.placeholders.len()),
    ];
    for (name, count) in counts {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(count));
    }
    headers
}

fn bad_request(e: ValidocError) -> HandlerError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// Input problems are the client's; asset and runtime failures are ours.
fn error_response(e: ValidocError) -> HandlerError {
    let status = match &e {
        ValidocError::Pdf(_)
        | ValidocError::InvalidPage(..)
        | ValidocError::Template(_)
        | ValidocError::InvalidContainerWidth(_)
        | ValidocError::InvalidPageSize(..)
        | ValidocError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ValidocError::Font(_)
        | ValidocError::Fetch(_)
        | ValidocError::Task(_)
        | ValidocError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
