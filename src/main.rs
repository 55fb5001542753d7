//! # ValiDoc CLI
//!
//! Command-line interface for filling PDF templates.
//!
//! ## Usage
//!
//! ```bash
//! # Render a document from a template, a record and a PDF (path or URL)
//! validoc render --template traza.json --record traza-1042.json \
//!     --pdf https://files.example.com/traza.pdf --output traza-1042.pdf
//!
//! # Extra font families referenced by `fontFamily`
//! validoc render --template t.json --pdf t.pdf --output out.pdf \
//!     --family "noto serif=fonts/NotoSerif-Regular.ttf"
//!
//! # Check a template without rendering
//! validoc validate --template traza.json
//!
//! # Serve the HTTP API (embeds the default font unless --standard-font)
//! validoc serve --listen 0.0.0.0:8080 --font fonts/NotoSans-Regular.ttf
//! ```
//!
//! Logging goes through `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

use validoc::{
    ValidocError,
    config::{DEFAULT_FONT_PATH, DEFAULT_LISTEN_ADDR, RenderSettings},
    generate::{AssetSource, DefaultFetcher, GenerationJob, generate, load_fonts},
    pdf::FontSet,
    record::DataRecord,
    render::DocumentRenderer,
    server::{ServerConfig, serve},
    template::{Template, validate_template},
};

/// ValiDoc - fill PDF templates with record data
#[derive(Parser, Debug)]
#[command(name = "validoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one document
    Render {
        /// Template JSON file
        #[arg(long, short)]
        template: PathBuf,

        /// Source PDF, as a path or http(s) URL
        #[arg(long)]
        pdf: String,

        /// Record JSON file (an object); omit for an empty record
        #[arg(long, short)]
        record: Option<PathBuf>,

        /// Where to write the filled PDF
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,

        /// Default TrueType font, as a path or URL
        #[arg(long, default_value = DEFAULT_FONT_PATH)]
        font: String,

        /// Extra font family, as NAME=PATH_OR_URL (repeatable)
        #[arg(long = "family", value_parser = parse_family)]
        families: Vec<(String, String)>,

        /// Use the built-in Helvetica instead of embedding a font
        #[arg(long, conflicts_with_all = ["font", "families"])]
        standard_font: bool,

        /// Render settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Report fields that would be skipped
    Validate {
        /// Template JSON file
        #[arg(long, short)]
        template: PathBuf,

        /// Render settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
        listen: String,

        /// TrueType font to embed; a missing file stops startup
        #[arg(long, default_value = DEFAULT_FONT_PATH)]
        font: PathBuf,

        /// Use the built-in Helvetica instead of embedding a font
        #[arg(long, conflicts_with = "font")]
        standard_font: bool,

        /// Render settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

fn parse_family(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, source)) if !name.trim().is_empty() && !source.trim().is_empty() => {
            Ok((name.trim().to_string(), source.trim().to_string()))
        }
        _ => Err(format!("expected NAME=PATH_OR_URL, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ValidocError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            pdf,
            record,
            output,
            font,
            families,
            standard_font,
            settings,
        } => {
            let settings = load_settings(settings.as_ref())?;
            let template = Template::from_json(&tokio::fs::read_to_string(&template).await?)?;
            let record = match record {
                Some(path) => DataRecord::from_json_str(&tokio::fs::read_to_string(&path).await?)?,
                None => DataRecord::new(),
            };

            let fetcher = DefaultFetcher::new()?;
            let fonts = if standard_font {
                warn!("Using standard Helvetica: only Latin-1 text renders correctly");
                FontSet::standard()
            } else {
                let families: Vec<(String, AssetSource)> = families
                    .iter()
                    .map(|(name, source)| (name.clone(), AssetSource::parse(source)))
                    .collect();
                load_fonts(&fetcher, &AssetSource::parse(&font), &families).await?
            };

            let renderer = DocumentRenderer::new(fonts).with_settings(settings);
            let job = GenerationJob {
                pdf: AssetSource::parse(&pdf),
                template,
                record,
            };
            let rendered = generate(&fetcher, renderer, job).await?;
            tokio::fs::write(&output, &rendered.bytes).await?;

            let report = &rendered.report;
            println!(
                "Wrote {} ({} fields drawn, {} placeholders, {} skipped)",
                output.display(),
                report.drawn.len(),
                report.placeholders.len(),
                report.skipped.len()
            );
            for note in report.placeholders.iter().chain(&report.skipped) {
                println!("  {}: {}", note.id, note.reason);
            }
        }

        Commands::Validate { template, settings } => {
            let settings = load_settings(settings.as_ref())?;
            let template = Template::from_json(&tokio::fs::read_to_string(&template).await?)?;
            if template.container_width.is_none() {
                println!("containerWidth is missing: the template cannot be rendered");
            }

            let (valid, rejected) = validate_template(&template, &settings);
            println!("{} valid, {} with issues", valid.len(), rejected.len());
            for (id, issue) in &rejected {
                println!("  {}: {}", id, issue);
            }
        }

        Commands::Serve {
            listen,
            font,
            standard_font,
            settings,
        } => {
            info!("Starting server on {}", listen);
            serve(ServerConfig {
                listen_addr: listen,
                font_path: font,
                standard_font,
                settings_path: settings,
            })
            .await?;
        }
    }

    Ok(())
}

fn load_settings(path: Option<&PathBuf>) -> Result<RenderSettings, ValidocError> {
    match path {
        Some(path) => RenderSettings::from_file(path),
        None => Ok(RenderSettings::default()),
    }
}
