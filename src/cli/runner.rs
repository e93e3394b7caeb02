use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use canopydiff::api::{build_export, detect_canopy_change, display_layers};
use canopydiff::io::{ManifestArchive, export_to_path};
use canopydiff::types::OutputFormat;
use canopydiff::{ChangeParams, ChangeSummary, DisplayLayer, ExportRequest, RegionOfInterest};

use super::args::CliArgs;
use super::errors::AppError;

/// Parse `100000000` or `1e11` into a pixel count.
fn parse_max_pixels(value: &str) -> Result<u64, AppError> {
    let invalid = || AppError::InvalidMaxPixels {
        value: value.to_string(),
    };
    if let Ok(n) = value.parse::<u64>() {
        return if n > 0 { Ok(n) } else { Err(invalid()) };
    }
    let f = value.parse::<f64>().map_err(|_| invalid())?;
    if f.is_finite() && f >= 1.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Ok(f as u64)
    } else {
        Err(invalid())
    }
}

fn load_params(args: &CliArgs) -> Result<ChangeParams, AppError> {
    let text = fs::read_to_string(&args.config)?;
    let mut params: ChangeParams = serde_json::from_str(&text)?;

    if let Some(collection) = &args.collection {
        params.archive = collection.clone();
    }
    if let Some(threshold) = args.threshold {
        params.threshold.value = threshold;
    }
    if let Some(comparison) = args.comparison {
        params.threshold.comparison = comparison;
    }
    if let Some(scale) = args.scale {
        params.export.scale = scale;
    }
    if let Some(max_pixels) = &args.max_pixels {
        params.export.max_pixels = parse_max_pixels(max_pixels)?;
    }
    if let Some(description) = &args.description {
        params.export.description = description.clone();
    }
    Ok(params)
}

fn load_roi(path: &Path) -> Result<RegionOfInterest, AppError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[derive(Serialize)]
struct DryRunReport<'a> {
    summary: ChangeSummary,
    export: &'a ExportRequest,
    layers: &'a [DisplayLayer],
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let params = load_params(&args)?;
    let roi = args.roi.as_deref().map(load_roi).transpose()?;
    let output = match (&args.output, args.dry_run) {
        (Some(output), _) => Some(output.clone()),
        (None, true) => None,
        (None, false) => {
            return Err(AppError::MissingArgument {
                arg: "--output".to_string(),
            }
            .into());
        }
    };

    let archive = ManifestArchive::open(&args.archive).map_err(AppError::from)?;
    let result = detect_canopy_change(&archive, &params, roi.as_ref()).map_err(AppError::from)?;
    let request = build_export(&result, &params).map_err(AppError::from)?;

    match output {
        None => {
            let layers = display_layers(&result, &params).map_err(AppError::from)?;
            let report = DryRunReport {
                summary: result.summary,
                export: &request,
                layers: &layers,
            };
            let json = serde_json::to_string_pretty(&report).map_err(AppError::from)?;
            println!("{json}");
        }
        Some(output) => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(AppError::from)?;
            }
            let written = export_to_path(&request, &output, args.format).map_err(AppError::from)?;
            info!(
                "Wrote {:?} ({}), world file {:?}, sidecar {:?}",
                written.image,
                match args.format {
                    OutputFormat::TIFF => "GeoTIFF",
                    OutputFormat::JPEG => "JPEG preview",
                },
                written.world_file,
                written.sidecar
            );
            println!("{}", result.summary);
        }
    }
    Ok(())
}
