//! Template validation without rendering.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::render::FieldNote;
use crate::template::{Template, validate_template};

use super::super::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    /// False when the template as a whole cannot be rendered.
    pub renderable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Ids of fields that would be drawn.
    pub valid: Vec<String>,
    /// Fields that would be skipped, and why.
    pub issues: Vec<FieldNote>,
}

/// Handle POST /api/templates/validate
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(template): Json<Template>,
) -> Json<ValidationResponse> {
    let error = match template.container_width {
        None => Some("containerWidth is missing".to_string()),
        Some(w) if !w.is_finite() || w <= 0.0 => {
            Some(format!("containerWidth {} must be a positive number", w))
        }
        Some(_) => None,
    };

    let (valid, rejected) = validate_template(&template, state.renderer.settings());

    Json(ValidationResponse {
        renderable: error.is_none(),
        error,
        valid: valid.into_iter().map(|f| f.id).collect(),
        issues: rejected
            .into_iter()
            .map(|(id, issue)| FieldNote {
                id,
                reason: issue.to_string(),
            })
            .collect(),
    })
}
