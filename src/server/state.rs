//! Server state and configuration.

use log::{info, warn};
use std::path::PathBuf;

use crate::config::RenderSettings;
use crate::error::Result;
use crate::pdf::{FontSet, PdfFont};
use crate::render::DocumentRenderer;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// TrueType font embedded in rendered documents
    pub font_path: PathBuf,
    /// Skip `font_path` and use the non-embedded standard Helvetica
    pub standard_font: bool,
    /// Optional JSON file with [`RenderSettings`]
    pub settings_path: Option<PathBuf>,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub renderer: DocumentRenderer,
}

impl AppState {
    pub fn new(config: ServerConfig, renderer: DocumentRenderer) -> Self {
        Self { config, renderer }
    }

    /// Load the font and settings named by `config`. A missing font is fatal.
    pub fn from_config(config: ServerConfig) -> Result<Self> {
        let fonts = if config.standard_font {
            warn!("Using standard Helvetica: only Latin-1 text renders correctly");
            FontSet::standard()
        } else {
            info!("Embedding font {}", config.font_path.display());
            FontSet::new(PdfFont::from_file(&config.font_path)?)
        };
        let settings = match &config.settings_path {
            Some(path) => RenderSettings::from_file(path)?,
            None => RenderSettings::default(),
        };
        let renderer = DocumentRenderer::new(fonts).with_settings(settings);
        Ok(Self::new(config, renderer))
    }
}
