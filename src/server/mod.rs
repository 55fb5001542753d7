//! # HTTP Server for Document Generation
//!
//! Exposes template validation and document rendering over HTTP, for
//! front-ends that keep the editor in the browser.
//!
//! ## Usage
//!
//! ```bash
//! validoc serve --listen 0.0.0.0:8080 --font fonts/NotoSans-Regular.ttf
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/api/health` | | JSON status |
//! | POST | `/api/templates/validate` | template JSON | per-field issues |
//! | POST | `/api/documents/render` | multipart `pdf`, `template`, `record` | `application/pdf` |
//!
//! Render responses carry `x-validoc-drawn`, `x-validoc-skipped` and
//! `x-validoc-placeholders` counts.

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use log::info;
use std::sync::Arc;

use crate::error::ValidocError;

/// Largest accepted upload for a render request.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/templates/validate", post(handlers::templates::validate))
        .route(
            "/api/documents/render",
            post(handlers::documents::render).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use validoc::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), validoc::ValidocError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     font_path: "fonts/NotoSans-Regular.ttf".into(),
///     standard_font: false,
///     settings_path: None,
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), ValidocError> {
    let listen_addr = config.listen_addr.clone();
    let app_state = Arc::new(AppState::from_config(config)?);
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| {
            std::io::Error::new(e.kind(), format!("failed to bind to {}: {}", listen_addr, e))
        })?;

    info!("validoc HTTP server listening on http://{}/", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
