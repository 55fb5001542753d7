//! # Error Types
//!
//! Two tiers of failure exist while generating a document:
//!
//! - [`ValidocError`]: fatal. The whole render is aborted and the caller gets
//!   a human-readable message (missing PDF, missing font, corrupt container,
//!   bad `containerWidth`).
//! - [`FieldIssue`]: recoverable, scoped to one field. The field is skipped or
//!   replaced by a placeholder, the issue is logged and recorded in the
//!   render report, and the rest of the document is still produced.

use thiserror::Error;

/// Main error type for validoc operations
#[derive(Debug, Error)]
pub enum ValidocError {
    /// The source PDF could not be parsed or is structurally broken
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The requested page does not exist in the source PDF
    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(u32, usize),

    /// The font asset is missing or unusable
    #[error("Font error: {0}")]
    Font(String),

    /// The template cannot be rendered at all
    #[error("Template error: {0}")]
    Template(String),

    /// `containerWidth` is zero, negative or not a number
    #[error("Invalid container width {0}: must be a positive, finite number of pixels")]
    InvalidContainerWidth(f64),

    /// Page dimensions read from the PDF are unusable
    #[error("Invalid page size {0}x{1}")]
    InvalidPageSize(f64, f64),

    /// Fetching an asset (PDF template, font) failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A blocking render task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),

    /// JSON (de)serialization of templates and records
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for ValidocError {
    fn from(e: lopdf::Error) -> Self {
        ValidocError::Pdf(e.to_string())
    }
}

/// A per-field problem that never aborts the document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldIssue {
    #[error("invalid geometry: {0}")]
    Geometry(String),

    #[error("font size {0} is outside [6, 72]")]
    FontSize(f64),

    #[error("unknown alignment '{0}' (expected left, center or right)")]
    Alignment(String),

    #[error("unknown QR error correction level '{0}' (expected L, M, Q or H)")]
    ErrorCorrection(String),

    #[error("QR encoding failed: {0}")]
    QrEncode(String),
}

pub type Result<T> = std::result::Result<T, ValidocError>;
