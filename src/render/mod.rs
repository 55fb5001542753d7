//! # Document Rendering
//!
//! Stamps a template's fields onto one page of a source PDF.
//!
//! ```text
//!   PDF bytes ──► SourcePdf ──► page box ──► ScaleTransform
//!                                                │
//!   Template ──► validate ──► fields ────────────┤
//!                               │                ▼
//!                               └─► QR rasters (rayon) ──► PageCanvas
//!                                                             │
//!   fonts + images embedded ◄── overlay on page ◄─────────────┘
//! ```
//!
//! Fields are drawn in template order, each in its own `q … Q` block. A
//! field that fails validation is skipped; a QR that cannot be encoded is
//! replaced by a text placeholder. Neither aborts the document. Only
//! container-level problems (unreadable PDF, missing page, bad
//! `containerWidth`) are fatal.
//!
//! ## Example
//!
//! ```no_run
//! use validoc::pdf::FontSet;
//! use validoc::record::DataRecord;
//! use validoc::render::DocumentRenderer;
//! use validoc::template::Template;
//!
//! let pdf = std::fs::read("traza.pdf")?;
//! let template = Template::from_json(&std::fs::read_to_string("traza.json")?)?;
//! let record = DataRecord::from_json_str(r#"{"numero_traza": 1042}"#)?;
//!
//! let renderer = DocumentRenderer::new(FontSet::standard());
//! let rendered = renderer.render(&pdf, &template, &record)?;
//! std::fs::write("out.pdf", &rendered.bytes)?;
//! # Ok::<(), validoc::ValidocError>(())
//! ```

pub mod qr;
pub mod text;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::RenderSettings;
use crate::error::{FieldIssue, Result};
use crate::geometry::PdfRect;
use crate::pdf::{FontRegistry, FontSet, OverlayResources, PageCanvas, SourcePdf};
use crate::record::DataRecord;
use crate::template::{
    Align, FieldContent, Rgb, Template, TextSpec, ValidatedField, validate_template,
};

use self::qr::{QrRenderError, rasterize, resolve_payload};
use self::text::{draw_text, layout_text, resolve_text, split_lines};

/// Why a field was skipped or drawn as a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldNote {
    pub id: String,
    pub reason: String,
}

impl FieldNote {
    fn new(id: &str, reason: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// What happened to each field during a render.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub page: u32,
    pub scale_factor: f64,
    /// Ids of drawn fields, in draw order (placeholders included).
    pub drawn: Vec<String>,
    /// Drawn, but with fallback content.
    pub placeholders: Vec<FieldNote>,
    /// Rejected by validation and not drawn.
    pub skipped: Vec<FieldNote>,
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

/// Renders templates onto PDFs with a fixed font set and settings.
#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    fonts: FontSet,
    settings: RenderSettings,
}

impl DocumentRenderer {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts,
            settings: RenderSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Render `template` with values from `record` over `pdf_bytes`.
    pub fn render(
        &self,
        pdf_bytes: &[u8],
        template: &Template,
        record: &DataRecord,
    ) -> Result<RenderedDocument> {
        let mut pdf = SourcePdf::load(pdf_bytes)?.with_compression(self.settings.compress_streams);
        let page_id = pdf.page_id(template.page)?;
        let page_box = pdf.page_box(page_id)?;
        let transform = template.transform(page_box)?;

        let mut report = RenderReport {
            page: template.page,
            scale_factor: transform.scale_factor(),
            ..Default::default()
        };

        let (fields, rejected) = validate_template(template, &self.settings);
        report.skipped = rejected
            .into_iter()
            .map(|(id, issue)| FieldNote::new(&id, issue))
            .collect();

        let rasters = self.rasterize_all(&fields, record);

        let mut canvas = PageCanvas::new();
        let mut fonts = FontRegistry::new();
        let mut images = Vec::new();

        for (field, raster) in fields.iter().zip(rasters) {
            let rect = transform.to_pdf(&field.rect);
            canvas.save();
            match (&field.content, raster) {
                (FieldContent::Text(spec), _) => {
                    let value = resolve_text(spec, &field.name, record);
                    if value.is_placeholder() {
                        report.placeholders.push(FieldNote::new(
                            &field.id,
                            format!("unresolved binding '{}'", field.name),
                        ));
                    }
                    self.draw_text_field(&mut canvas, &mut fonts, &rect, spec, value.as_str());
                }
                (FieldContent::Qr(_), Some((_, Ok(image)))) => {
                    let object = pdf.add_image(&image)?;
                    let name = format!("VdQ{}", images.len() + 1);
                    canvas.image(&name, &rect.centered_square());
                    images.push((name, object));
                }
                (FieldContent::Qr(_), Some((payload, Err(e)))) => {
                    warn!("QR field '{}' ({}): {}, drawing text placeholder", field.id, field.name, e);
                    report
                        .placeholders
                        .push(FieldNote::new(&field.id, FieldIssue::QrEncode(e.to_string())));
                    let spec = self.placeholder_spec();
                    self.draw_text_field(
                        &mut canvas,
                        &mut fonts,
                        &rect,
                        &spec,
                        &format!("QR: {}", payload),
                    );
                }
                (FieldContent::Qr(_), None) => {}
            }
            canvas.restore();
            report.drawn.push(field.id.clone());
        }

        let compress = pdf.compresses();
        let embedded_fonts = fonts.embed(pdf.document_mut(), &self.fonts, compress)?;
        pdf.overlay(
            page_id,
            canvas.encode()?,
            OverlayResources {
                fonts: embedded_fonts,
                images,
            },
        )?;
        let bytes = pdf.save()?;

        info!(
            "Rendered page {} at scale {:.4}: {} drawn, {} placeholders, {} skipped ({} bytes)",
            report.page,
            report.scale_factor,
            report.drawn.len(),
            report.placeholders.len(),
            report.skipped.len(),
            bytes.len()
        );

        Ok(RenderedDocument { bytes, report })
    }

    /// Resolve and encode every QR field in parallel. The result is
    /// index-aligned with `fields`; non-QR fields get `None`.
    fn rasterize_all(
        &self,
        fields: &[ValidatedField],
        record: &DataRecord,
    ) -> Vec<Option<(String, std::result::Result<image::RgbImage, QrRenderError>)>> {
        let quiet_zone = self.settings.qr_quiet_zone;
        fields
            .par_iter()
            .map(|field| match &field.content {
                FieldContent::Qr(spec) => {
                    let payload = resolve_payload(spec, &field.name, record);
                    let raster = rasterize(&payload, spec, quiet_zone);
                    Some((payload, raster))
                }
                FieldContent::Text(_) => None,
            })
            .collect()
    }

    fn draw_text_field(
        &self,
        canvas: &mut PageCanvas,
        fonts: &mut FontRegistry,
        rect: &PdfRect,
        spec: &TextSpec,
        value: &str,
    ) {
        let font_id = self.fonts.resolve(spec.font_family.as_deref());
        let font = self.fonts.font(font_id);
        let lines = split_lines(spec, value, font, rect.width);
        let layout = layout_text(&lines, rect, spec, font, self.settings.line_gap);
        draw_text(canvas, fonts, font_id, font, rect, spec, &layout);
    }

    fn placeholder_spec(&self) -> TextSpec {
        TextSpec {
            literal: None,
            font_family: None,
            font_size: self.settings.default_font_size,
            align: Align::Left,
            color: Rgb::BLACK,
            background: None,
            multi_line: true,
            lines: None,
        }
    }
}
