//! Persisted field and template shapes.
//!
//! These mirror the JSON the web editor stores (camelCase keys, style
//! attributes as loose strings). Nothing here is trusted by the renderer:
//! every field goes through [`super::validate`] first, which turns the loose
//! attributes into typed values.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{FieldIssue, Result, ValidocError};
use crate::geometry::{PageBox, PixelRect, ScaleTransform};

/// Attribute name that binds a data field to the record's QR payload.
pub const QR_CODE_BINDING: &str = "qr_code";

/// What a field draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Text bound to a record attribute
    #[default]
    Data,
    /// QR code
    Qr,
}

/// Horizontal text alignment inside the field box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Shift applied to a line of `text_width` inside a box of `box_width`.
    pub fn offset(self, box_width: f64, text_width: f64) -> f64 {
        match self {
            Align::Left => 0.0,
            Align::Center => (box_width - text_width) / 2.0,
            Align::Right => box_width - text_width,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

impl FromStr for Align {
    type Err = FieldIssue;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Align::Left),
            "center" => Ok(Align::Center),
            "right" => Ok(Align::Right),
            _ => Err(FieldIssue::Alignment(s.to_string())),
        }
    }
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QrErrorLevel {
    /// ~7% recovery
    L,
    /// ~15% recovery
    #[default]
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

impl QrErrorLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            QrErrorLevel::L => "L",
            QrErrorLevel::M => "M",
            QrErrorLevel::Q => "Q",
            QrErrorLevel::H => "H",
        }
    }
}

impl FromStr for QrErrorLevel {
    type Err = FieldIssue;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(QrErrorLevel::L),
            "M" => Ok(QrErrorLevel::M),
            "Q" => Ok(QrErrorLevel::Q),
            "H" => Ok(QrErrorLevel::H),
            _ => Err(FieldIssue::ErrorCorrection(s.to_string())),
        }
    }
}

/// A positioned element on a template page, in design pixels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    /// Bound attribute name; also the placeholder shown when unresolved.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,

    // Text attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// "left", "center" or "right"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Literal text; wins over the bound attribute when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub is_multi_line: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_lines: Option<Vec<String>>,

    // QR attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_background_color: Option<String>,
    /// "L", "M", "Q" or "H"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_error_correction_level: Option<String>,
}

impl Field {
    /// New data field with a fresh id and empty style.
    pub fn new(rect: PixelRect) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            ..Default::default()
        }
    }

    /// Data field bound to `name`.
    pub fn data(name: impl Into<String>, rect: PixelRect) -> Self {
        Self {
            name: name.into(),
            ..Self::new(rect)
        }
    }

    /// QR field whose payload falls back to `name`.
    pub fn qr(name: impl Into<String>, rect: PixelRect) -> Self {
        Self {
            kind: FieldKind::Qr,
            name: name.into(),
            ..Self::new(rect)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_align(mut self, align: &str) -> Self {
        self.align = Some(align.to_string());
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_qr_data(mut self, data: impl Into<String>) -> Self {
        self.qr_data = Some(data.into());
        self
    }

    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: PixelRect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }
}

fn default_page() -> u32 {
    1
}

/// Fields placed over one page of a source PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pixel width of the preview the fields were authored against.
    #[serde(default)]
    pub container_width: Option<f64>,
    /// 1-based page the fields belong to.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            container_width: None,
            page: default_page(),
            fields: Vec::new(),
        }
    }
}

impl Template {
    pub fn new(container_width: f64) -> Self {
        Self {
            container_width: Some(container_width),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Transform for the target page. `containerWidth` is required.
    pub fn transform(&self, page: PageBox) -> Result<ScaleTransform> {
        let width = self.container_width.ok_or_else(|| {
            ValidocError::Template(
                "containerWidth is required to compute the pixel to point scale".to_string(),
            )
        })?;
        ScaleTransform::new(width, page)
    }
}
