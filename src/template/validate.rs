//! Field validation: loose persisted attributes → typed, renderable field.
//!
//! The field kind is resolved here, once, into [`FieldContent`]; the render
//! loop dispatches on that enum and never compares kind strings.

use log::warn;

use super::color::{ParsedColor, Rgb, parse_color};
use super::types::{Align, Field, FieldKind, QR_CODE_BINDING, QrErrorLevel, Template};
use crate::config::{MAX_FONT_SIZE, MIN_FONT_SIZE, RenderSettings};
use crate::error::FieldIssue;
use crate::geometry::PixelRect;

/// Resolved text styling.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    /// Non-empty literal text, if set.
    pub literal: Option<String>,
    pub font_family: Option<String>,
    pub font_size: f64,
    pub align: Align,
    pub color: Rgb,
    pub background: Option<Rgb>,
    pub multi_line: bool,
    /// Explicit lines from `textLines` (only with `isMultiLine`).
    pub lines: Option<Vec<String>>,
}

/// Resolved QR options.
#[derive(Debug, Clone, PartialEq)]
pub struct QrSpec {
    /// `qrData` as authored (literal or `{{attribute}}` reference).
    pub data: Option<String>,
    /// Attribute read when `data` is absent.
    pub binding: String,
    pub pixel_size: u32,
    pub foreground: Rgb,
    pub background: Rgb,
    pub level: QrErrorLevel,
}

/// What a validated field draws.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldContent {
    Text(TextSpec),
    Qr(QrSpec),
}

/// A field that passed validation and can be handed to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedField {
    pub id: String,
    pub name: String,
    pub rect: PixelRect,
    pub content: FieldContent,
}

/// Check a single field against the render invariants.
pub fn validate_field(
    field: &Field,
    settings: &RenderSettings,
) -> Result<ValidatedField, FieldIssue> {
    let rect = field.rect();
    check_geometry(&rect)?;
    // Text attributes are checked for every kind, QR fields included.
    let font_size = check_font_size(field, settings)?;
    let align = check_alignment(field)?;

    let content = match field.kind {
        FieldKind::Qr => FieldContent::Qr(qr_spec(field, field.name.clone(), settings)?),
        FieldKind::Data if field.name == QR_CODE_BINDING => {
            FieldContent::Qr(qr_spec(field, QR_CODE_BINDING.to_string(), settings)?)
        }
        FieldKind::Data => FieldContent::Text(text_spec(field, font_size, align)),
    };

    Ok(ValidatedField {
        id: field.id.clone(),
        name: field.name.clone(),
        rect,
        content,
    })
}

/// Validate every field of a template, keeping template order.
///
/// Invalid fields are logged and returned separately; they never make the
/// other fields fail.
pub fn validate_template(
    template: &Template,
    settings: &RenderSettings,
) -> (Vec<ValidatedField>, Vec<(String, FieldIssue)>) {
    let mut valid = Vec::with_capacity(template.fields.len());
    let mut rejected = Vec::new();

    for field in &template.fields {
        match validate_field(field, settings) {
            Ok(v) => valid.push(v),
            Err(issue) => {
                warn!("Skipping field '{}' ({}): {}", field.id, field.name, issue);
                rejected.push((field.id.clone(), issue));
            }
        }
    }

    (valid, rejected)
}

fn check_geometry(rect: &PixelRect) -> Result<(), FieldIssue> {
    let values = [rect.x, rect.y, rect.width, rect.height];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FieldIssue::Geometry("non-finite coordinate".to_string()));
    }
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return Err(FieldIssue::Geometry(format!(
            "size {}x{} must be positive",
            rect.width, rect.height
        )));
    }
    if rect.x < 0.0 || rect.y < 0.0 {
        return Err(FieldIssue::Geometry(format!(
            "origin ({}, {}) must not be negative",
            rect.x, rect.y
        )));
    }
    Ok(())
}

fn check_font_size(field: &Field, settings: &RenderSettings) -> Result<f64, FieldIssue> {
    match field.font_size {
        Some(size) if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) => {
            Err(FieldIssue::FontSize(size))
        }
        Some(size) => Ok(size),
        None => Ok(settings.default_font_size),
    }
}

fn check_alignment(field: &Field) -> Result<Align, FieldIssue> {
    match non_empty(field.align.as_deref()) {
        Some(a) => a.parse(),
        None => Ok(Align::Left),
    }
}

fn text_spec(field: &Field, font_size: f64, align: Align) -> TextSpec {
    let color = solid_or(field.color.as_deref(), Rgb::BLACK, &field.id, "color");
    let background = optional_color(field.background_color.as_deref(), &field.id);

    let lines = if field.is_multi_line {
        field.text_lines.clone().filter(|l| !l.is_empty())
    } else {
        None
    };

    TextSpec {
        literal: non_empty(field.text.as_deref()).map(str::to_string),
        font_family: non_empty(field.font_family.as_deref()).map(str::to_string),
        font_size,
        align,
        color,
        background,
        multi_line: field.is_multi_line,
        lines,
    }
}

fn qr_spec(
    field: &Field,
    binding: String,
    settings: &RenderSettings,
) -> Result<QrSpec, FieldIssue> {
    let level = match non_empty(field.qr_error_correction_level.as_deref()) {
        Some(l) => l.parse()?,
        None => QrErrorLevel::M,
    };

    let pixel_size = field
        .qr_size
        .filter(|s| *s > 0)
        .unwrap_or(settings.qr_default_size)
        .min(settings.qr_max_size);

    Ok(QrSpec {
        data: non_empty(field.qr_data.as_deref()).map(str::to_string),
        binding,
        pixel_size,
        foreground: solid_or(field.qr_color.as_deref(), Rgb::BLACK, &field.id, "qrColor"),
        background: solid_or(
            field.qr_background_color.as_deref(),
            Rgb::WHITE,
            &field.id,
            "qrBackgroundColor",
        ),
        level,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn solid_or(value: Option<&str>, fallback: Rgb, id: &str, attr: &str) -> Rgb {
    match non_empty(value).map(parse_color) {
        None | Some(ParsedColor::Transparent) => fallback,
        Some(ParsedColor::Solid(c)) => c,
        Some(ParsedColor::Invalid) => {
            warn!(
                "Field '{}': unparseable {} {:?}, using default",
                id,
                attr,
                value.unwrap_or_default()
            );
            fallback
        }
    }
}

fn optional_color(value: Option<&str>, id: &str) -> Option<Rgb> {
    match non_empty(value).map(parse_color) {
        Some(ParsedColor::Solid(c)) => Some(c),
        Some(ParsedColor::Invalid) => {
            warn!(
                "Field '{}': unparseable backgroundColor {:?}, drawing no background",
                id,
                value.unwrap_or_default()
            );
            None
        }
        _ => None,
    }
}
