//! QR field rendering: payload resolution and rasterization.
//!
//! A QR field becomes an RGB raster (quiet zone included) that is embedded
//! as an image XObject and drawn as a square centered in the field box.
//! Rasterization is a pure function of the payload and the field's QR
//! options, so identical inputs always produce identical pixels.

use image::{ImageBuffer, Rgb as Pixel, RgbImage};
use log::debug;
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

use crate::record::DataRecord;
use crate::template::{QrErrorLevel, QrSpec, Rgb};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QrRenderError {
    #[error("empty QR payload")]
    EmptyPayload,

    #[error("{0}")]
    Encode(String),
}

/// Decide what a QR field encodes.
///
/// In order: literal `qrData`; `qrData` naming a record attribute (either
/// `{{attr}}` or a bare name present in the record); the attribute bound
/// by the field; the field's own name.
pub fn resolve_payload(spec: &QrSpec, name: &str, record: &DataRecord) -> String {
    if let Some(data) = spec.data.as_deref() {
        if let Some(attr) = reference(data) {
            if let Some(v) = record.resolve(attr) {
                return v;
            }
            debug!("QR reference '{}' unresolved, falling back", attr);
        } else if let Some(v) = record.resolve(data) {
            return v;
        } else {
            return data.to_string();
        }
    }

    if let Some(v) = record.resolve(&spec.binding) {
        return v;
    }

    debug!("QR field '{}' has no data, encoding its name", name);
    name.to_string()
}

/// `{{ attr }}` → `attr`.
fn reference(data: &str) -> Option<&str> {
    let inner = data.trim().strip_prefix("{{")?.strip_suffix("}}")?.trim();
    if inner.is_empty() { None } else { Some(inner) }
}

fn ec_level(level: QrErrorLevel) -> EcLevel {
    match level {
        QrErrorLevel::L => EcLevel::L,
        QrErrorLevel::M => EcLevel::M,
        QrErrorLevel::Q => EcLevel::Q,
        QrErrorLevel::H => EcLevel::H,
    }
}

fn pixel(c: Rgb) -> Pixel<u8> {
    Pixel([c.r, c.g, c.b])
}

/// Encode `payload` and paint it into an RGB raster.
///
/// Each module is `max(1, pixel_size / modules)` pixels wide, where
/// `modules` counts the quiet zone on both sides; the raster is therefore
/// at most `pixel_size` wide unless the symbol needs more than one pixel
/// per module.
pub fn rasterize(payload: &str, spec: &QrSpec, quiet_zone: u32) -> Result<RgbImage, QrRenderError> {
    if payload.is_empty() {
        return Err(QrRenderError::EmptyPayload);
    }

    let code = QrCode::with_error_correction_level(payload, ec_level(spec.level))
        .map_err(|e| QrRenderError::Encode(e.to_string()))?;

    let modules = code.width() as u32;
    let total = modules + 2 * quiet_zone;
    let scale = (spec.pixel_size / total).max(1);
    let side = total * scale;

    let dark = pixel(spec.foreground);
    let mut image: RgbImage = ImageBuffer::from_pixel(side, side, pixel(spec.background));

    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let qx = i as u32 % modules;
        let qy = i as u32 / modules;
        let x0 = (quiet_zone + qx) * scale;
        let y0 = (quiet_zone + qy) * scale;
        for y in y0..y0 + scale {
            for x in x0..x0 + scale {
                image.put_pixel(x, y, dark);
            }
        }
    }

    Ok(image)
}
