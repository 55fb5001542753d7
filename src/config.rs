//! # Render Configuration
//!
//! Defaults used when a field leaves a style attribute unset, plus the
//! limits enforced by validation.
//!
//! ## Usage
//!
//! ```
//! use validoc::config::RenderSettings;
//!
//! let settings = RenderSettings::default();
//! assert_eq!(settings.default_font_size, 12.0);
//! assert_eq!(settings.line_gap, 2.0);
//! ```
//!
//! Settings can also be read from a JSON file; missing keys keep their
//! defaults:
//!
//! ```json
//! { "defaultFontSize": 10, "qrQuietZone": 2 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Smallest accepted `fontSize`, in points.
pub const MIN_FONT_SIZE: f64 = 6.0;

/// Largest accepted `fontSize`, in points.
pub const MAX_FONT_SIZE: f64 = 72.0;

/// Where the CLI and server look for the embedding font by default.
pub const DEFAULT_FONT_PATH: &str = "fonts/NotoSans-Regular.ttf";

/// Default listen address for `validoc serve`.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Tunables for document rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderSettings {
    /// Font size (pt) for text fields without `fontSize`.
    pub default_font_size: f64,
    /// Extra spacing (pt) between lines: line pitch is `fontSize + line_gap`.
    pub line_gap: f64,
    /// Light modules around a QR symbol.
    pub qr_quiet_zone: u32,
    /// Raster width (px) for QR fields without `qrSize`.
    pub qr_default_size: u32,
    /// Upper bound for `qrSize`, keeps embedded rasters reasonable.
    pub qr_max_size: u32,
    /// Flate-compress generated content and image streams.
    pub compress_streams: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            default_font_size: 12.0,
            line_gap: 2.0,
            qr_quiet_zone: 4,
            qr_default_size: 256,
            qr_max_size: 2048,
            compress_streams: true,
        }
    }
}

impl RenderSettings {
    /// Load settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s: RenderSettings = serde_json::from_str(r#"{"defaultFontSize": 9}"#).unwrap();
        assert_eq!(s.default_font_size, 9.0);
        assert_eq!(s.qr_quiet_zone, 4);
        assert!(s.compress_streams);
    }

    #[test]
    fn test_font_bounds() {
        assert!(MIN_FONT_SIZE < RenderSettings::default().default_font_size);
        assert!(MAX_FONT_SIZE > RenderSettings::default().default_font_size);
    }
}
