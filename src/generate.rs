//! # Document Generation Pipeline
//!
//! Async wrapper around [`DocumentRenderer`] for callers that hold the
//! template in an editor and the assets somewhere else (disk, HTTP).
//!
//! The template is snapshotted before the first `.await`, so edits made while
//! the PDF is being fetched never leak into the document. Rendering is CPU
//! bound and runs on the blocking pool.
//!
//! ```no_run
//! use validoc::generate::{AssetSource, DefaultFetcher, GenerationJob, generate};
//! use validoc::pdf::FontSet;
//! use validoc::record::DataRecord;
//! use validoc::render::DocumentRenderer;
//! use validoc::template::Template;
//!
//! # async fn example(template: Template) -> Result<(), validoc::ValidocError> {
//! let renderer = DocumentRenderer::new(FontSet::standard());
//! let job = GenerationJob {
//!     pdf: AssetSource::Url("https://files.example.com/traza.pdf".into()),
//!     template,
//!     record: DataRecord::new(),
//! };
//! let doc = generate(&DefaultFetcher::new()?, renderer, job).await?;
//! tokio::fs::write("traza-1042.pdf", &doc.bytes).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use log::{debug, info};
use std::path::PathBuf;

use crate::error::{Result, ValidocError};
use crate::pdf::{FontSet, PdfFont};
use crate::record::DataRecord;
use crate::render::{DocumentRenderer, RenderedDocument};
use crate::template::{FieldSnapshot, Template};

/// Where an asset (template PDF or font) lives.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSource {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

impl AssetSource {
    /// `http(s)://…` becomes a URL, anything else a path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            AssetSource::Url(s.to_string())
        } else {
            AssetSource::Path(PathBuf::from(s))
        }
    }

    fn describe(&self) -> String {
        match self {
            AssetSource::Path(p) => p.display().to_string(),
            AssetSource::Url(u) => u.clone(),
            AssetSource::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

/// Loads asset bytes.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>>;
}

/// Reads paths with tokio and URLs with reqwest.
pub struct DefaultFetcher {
    http: reqwest::Client,
}

impl DefaultFetcher {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("validoc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ValidocError::Fetch(format!("HTTP client error: {}", e)))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl AssetFetcher for DefaultFetcher {
    async fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>> {
        match source {
            AssetSource::Bytes(b) => Ok(b.clone()),
            AssetSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                ValidocError::Fetch(format!("cannot read {}: {}", path.display(), e))
            }),
            AssetSource::Url(url) => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| ValidocError::Fetch(format!("GET {}: {}", url, e)))?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ValidocError::Fetch(format!("GET {}: {}", url, e)))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

/// Everything one document needs.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub pdf: AssetSource,
    pub template: Template,
    pub record: DataRecord,
}

impl GenerationJob {
    /// Job for the fields of an editor snapshot.
    pub fn from_snapshot(
        pdf: AssetSource,
        container_width: f64,
        page: u32,
        snapshot: &FieldSnapshot,
        record: DataRecord,
    ) -> Self {
        Self {
            pdf,
            template: Template::from_snapshot(container_width, page, snapshot),
            record,
        }
    }
}

/// Build a font set: `default` plus named families.
pub async fn load_fonts(
    fetcher: &dyn AssetFetcher,
    default: &AssetSource,
    families: &[(String, AssetSource)],
) -> Result<FontSet> {
    let mut set = FontSet::new(load_font(fetcher, "default", default).await?);
    for (family, source) in families {
        set = set.with_family(family, load_font(fetcher, family, source).await?);
    }
    Ok(set)
}

async fn load_font(fetcher: &dyn AssetFetcher, label: &str, source: &AssetSource) -> Result<PdfFont> {
    let bytes = fetcher
        .fetch(source)
        .await
        .map_err(|e| ValidocError::Font(format!("{} font: {}", label, e)))?;
    let name = match source {
        AssetSource::Path(p) => p
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(label)
            .to_string(),
        _ => label.to_string(),
    };
    PdfFont::from_bytes(&name, bytes)
}

/// Fetch the PDF and render the job on the blocking pool.
pub async fn generate(
    fetcher: &dyn AssetFetcher,
    renderer: DocumentRenderer,
    job: GenerationJob,
) -> Result<RenderedDocument> {
    let GenerationJob {
        pdf,
        template,
        record,
    } = job;

    debug!("Fetching template PDF {}", pdf.describe());
    let pdf_bytes = fetcher.fetch(&pdf).await?;

    let rendered = tokio::task::spawn_blocking(move || {
        renderer.render(&pdf_bytes, &template, &record)
    })
    .await
    .map_err(|e| ValidocError::Task(e.to_string()))??;

    info!(
        "Generated document from {} ({} bytes)",
        pdf.describe(),
        rendered.bytes.len()
    );
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelRect;
    use crate::pdf::testing::blank_pdf;
    use crate::template::{Field, FieldCollection};

    /// Serves the same bytes for every path or URL.
    struct StaticFetcher(Vec<u8>);

    #[async_trait]
    impl AssetFetcher for StaticFetcher {
        async fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>> {
            match source {
                AssetSource::Bytes(b) => Ok(b.clone()),
                _ => Ok(self.0.clone()),
            }
        }
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(
            AssetSource::parse("https://x.mx/a.pdf"),
            AssetSource::Url("https://x.mx/a.pdf".into())
        );
        assert_eq!(
            AssetSource::parse("plantillas/a.pdf"),
            AssetSource::Path(PathBuf::from("plantillas/a.pdf"))
        );
    }

    #[tokio::test]
    async fn test_generate_uses_snapshot_taken_before_edits() {
        let mut fields = FieldCollection::new();
        fields.insert(Field::data("folio", PixelRect::new(10.0, 10.0, 100.0, 20.0)).with_id("a"));

        let job = GenerationJob::from_snapshot(
            AssetSource::Path("unused.pdf".into()),
            612.0,
            1,
            &fields.snapshot(),
            DataRecord::new().with("folio", "F-1"),
        );
        fields.insert(Field::data("otro", PixelRect::new(10.0, 40.0, 100.0, 20.0)).with_id("b"));

        let fetcher = StaticFetcher(blank_pdf(1, 612, 792));
        let doc = generate(&fetcher, DocumentRenderer::new(FontSet::standard()), job)
            .await
            .unwrap();
        assert_eq!(doc.report.drawn, vec!["a".to_string()]);
        assert!(doc.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let fetcher = DefaultFetcher::new().unwrap();
        let err = fetcher
            .fetch(&AssetSource::Path("/nonexistent/plantilla.pdf".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidocError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_bad_font_bytes_are_fatal() {
        let fetcher = StaticFetcher(b"not a font".to_vec());
        let err = load_fonts(&fetcher, &AssetSource::Path("x.ttf".into()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ValidocError::Font(_)));
    }
}
