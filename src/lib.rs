//! # ValiDoc - PDF Template Field Layout and Document Generation
//!
//! ValiDoc stamps record data onto existing PDF forms. Fields are authored in
//! a browser preview (pixels, top-left origin) and drawn onto the PDF page
//! (points, bottom-left origin) as text or QR codes.
//!
//! - **Editor model**: draw, move, resize and style fields over a preview
//! - **Templates**: serde model of the editor's JSON plus per-field validation
//! - **Rendering**: text with alignment and wrapping, QR rasters, embedded fonts
//! - **Generation**: async pipeline fetching PDFs and fonts from disk or HTTP
//!
//! ## Quick Start
//!
//! ```no_run
//! use validoc::{
//!     pdf::{FontSet, PdfFont},
//!     record::DataRecord,
//!     render::DocumentRenderer,
//!     template::Template,
//! };
//!
//! let template = Template::from_json(&std::fs::read_to_string("traza.json")?)?;
//! let record = DataRecord::from_json_str(r#"{"numero_traza": "T-1042", "cliente": {"nombre": "ACME"}}"#)?;
//! let pdf = std::fs::read("traza.pdf")?;
//!
//! let fonts = FontSet::new(PdfFont::from_file("fonts/NotoSans-Regular.ttf")?);
//! let rendered = DocumentRenderer::new(fonts).render(&pdf, &template, &record)?;
//!
//! std::fs::write("traza-T-1042.pdf", &rendered.bytes)?;
//! # Ok::<(), validoc::ValidocError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`geometry`] | Pixel to point transform |
//! | [`template`] | Fields, templates, colors, validation |
//! | [`record`] | Data records and value formatting |
//! | [`editor`] | Headless field editor |
//! | [`pdf`] | PDF loading, fonts, content streams |
//! | [`render`] | Drawing fields onto a page |
//! | [`generate`] | Async fetch + render pipeline |
//! | [`server`] | HTTP surface |
//! | [`config`] | Render settings and limits |
//! | [`error`] | Error types |

pub mod config;
pub mod editor;
pub mod error;
pub mod generate;
pub mod geometry;
pub mod pdf;
pub mod record;
pub mod render;
pub mod server;
pub mod template;

pub use error::ValidocError;
