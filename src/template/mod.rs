//! # Template Model
//!
//! A template is a list of positioned fields over one page of a PDF, plus
//! the pixel width of the preview they were drawn on.
//!
//! ```
//! use validoc::geometry::PixelRect;
//! use validoc::template::{Field, Template};
//!
//! let template = Template::new(800.0)
//!     .with_field(Field::data("numero_traza", PixelRect::new(10.0, 20.0, 100.0, 30.0)))
//!     .with_field(Field::qr("folio", PixelRect::new(600.0, 20.0, 120.0, 120.0)));
//!
//! assert_eq!(template.fields.len(), 2);
//! ```
//!
//! | Type | Role |
//! |------|------|
//! | [`Field`], [`Template`] | Persisted JSON shape |
//! | [`ValidatedField`], [`FieldContent`] | Typed, render-ready field |
//! | [`FieldCollection`], [`FieldSnapshot`] | Versioned editing state |

mod collection;
pub mod color;
mod types;
mod validate;

pub use collection::{FieldCollection, FieldSnapshot};
pub use color::{ParsedColor, Rgb, parse_color};
pub use types::*;
pub use validate::{
    FieldContent, QrSpec, TextSpec, ValidatedField, validate_field, validate_template,
};

impl Template {
    /// Template carrying the fields of `snapshot`.
    pub fn from_snapshot(container_width: f64, page: u32, snapshot: &FieldSnapshot) -> Self {
        Self {
            container_width: Some(container_width),
            page,
            fields: snapshot.fields().to_vec(),
            ..Default::default()
        }
    }
}
