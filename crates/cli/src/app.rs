use crate::paths;
use clap::{ArgAction, Parser};
use mapper_core::config;
use mapper_core::kml;
use mapper_core::scanner;
use mapper_core::{Capabilities, ScanCounters};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "photo-mapper")]
#[command(
    about = "Scan a folder for geotagged images and generate a KML with placemarks named after the image files",
    long_about = None
)]
pub struct Cli {
    /// Folder to scan (images are found recursively)
    pub folder: PathBuf,

    /// Output .kml path. Defaults to <folder-name>_images.kml inside the folder
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to config TOML
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output JSON summary
    #[arg(long)]
    pub json: bool,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0:#}")]
    Config(anyhow::Error),
    #[error("This build cannot decode image metadata. Rebuild with the `exif` feature enabled.")]
    MissingDecoder,
    #[error("Not a folder: {}", .0.display())]
    InvalidFolder(PathBuf),
    #[error("scan failed: {0:#}")]
    Scan(anyhow::Error),
    #[error("No geotagged images found. No KML written.")]
    NoGeotaggedImages(ScanCounters),
    #[error("Failed to write KML: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Scan(_) => 1,
            AppError::MissingDecoder => 2,
            AppError::InvalidFolder(_) => 3,
            AppError::NoGeotaggedImages(_) => 4,
            AppError::WriteOutput { .. } => 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub counters: ScanCounters,
}

/// Scans the folder and writes the KML. Per-file warnings go to `warnings`
/// as `[WARN] <path>: <error>` lines.
pub async fn run(
    cli: &Cli,
    caps: &Capabilities,
    warnings: &mut dyn Write,
) -> Result<RunSummary, AppError> {
    let resolver = caps.resolver().ok_or(AppError::MissingDecoder)?;
    let cfg = config::load(cli.config.as_deref()).map_err(AppError::Config)?;

    let folder =
        paths::resolve_folder(&cli.folder).ok_or_else(|| AppError::InvalidFolder(cli.folder.clone()))?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| paths::default_output(&folder));

    let report = scanner::scan_with(&folder, &cfg.scan, Arc::new(resolver), |w| {
        // Console reporting is best effort.
        let _ = writeln!(warnings, "[WARN] {}: {}", w.path.display(), w.message);
    })
    .await
    .map_err(AppError::Scan)?;

    if report.placemarks.is_empty() {
        return Err(AppError::NoGeotaggedImages(report.counters));
    }

    let title = cfg
        .kml
        .title
        .clone()
        .unwrap_or_else(|| kml::document_title(&paths::folder_name(&folder)));
    let document = kml::build(&report.placemarks, &title);
    std::fs::write(&output, document).map_err(|source| AppError::WriteOutput {
        path: output.clone(),
        source,
    })?;
    info!("Wrote {} placemarks to {}", report.placemarks.len(), output.display());

    Ok(RunSummary {
        output,
        counters: report.counters,
    })
}
