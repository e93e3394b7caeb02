use clap::Parser;
use std::path::PathBuf;

use canopydiff::types::{Comparison, OutputFormat};

#[derive(Parser)]
#[command(name = "canopydiff", version, about = "CANOPYDIFF CLI")]
pub struct CliArgs {
    /// Change parameters (JSON): region, epochs, bands, threshold, style, export
    #[arg(short, long)]
    pub config: PathBuf,

    /// Tile archive manifest (JSON)
    #[arg(short, long)]
    pub archive: PathBuf,

    /// Override the archive collection named in the config
    #[arg(long)]
    pub collection: Option<String>,

    /// Region of interest to clip to (JSON rings); defaults to the config bounding box
    #[arg(long)]
    pub roi: Option<PathBuf>,

    /// Output filename; required unless --dry-run
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (tiff or jpeg)
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::TIFF)]
    pub format: OutputFormat,

    /// Index threshold for the vegetation mask
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Threshold comparison (greater-or-equal, greater, less-or-equal, less)
    #[arg(long, value_enum)]
    pub comparison: Option<Comparison>,

    /// Export scale in meters per pixel
    #[arg(long)]
    pub scale: Option<f64>,

    /// Export pixel ceiling; accepts integers or scientific notation (1e11)
    #[arg(long)]
    pub max_pixels: Option<String>,

    /// Export description
    #[arg(long)]
    pub description: Option<String>,

    /// Run the workflow and the export pre-flight, print the request as JSON,
    /// write nothing
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Enable logging (RUST_LOG overrides the default debug level)
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
