use super::{selected_shots, FilterArgs};
use anyhow::{bail, Context, Result};
use djiutil::services::{ConversionOutcome, Converter};
use std::path::Path;
use tracing::info;

/// Convert one subtitle file, or every selected shot's subtitle in a directory.
/// Returns false when any file failed to convert.
pub fn convert(source: &Path, output: Option<&Path>, filters: &FilterArgs) -> Result<bool> {
    let converter = Converter::new();

    if !source.is_dir() {
        if !filters.is_empty() {
            bail!("--date and --index only apply when converting a directory");
        }
        let track = converter
            .convert_file(source, output)
            .with_context(|| format!("Failed to convert {}", source.display()))?;
        info!("wrote {} ({} points)", track.output.display(), track.points);
        return Ok(true);
    }

    if output.is_some() {
        bail!("an output path cannot be given when converting a directory");
    }

    let shots = selected_shots(source, filters)?;
    let report = converter.convert_shots(&shots);
    if report.is_empty() {
        println!("No subtitle files among the selected shots in {}", source.display());
        return Ok(true);
    }

    for outcome in &report.outcomes {
        match outcome {
            ConversionOutcome::Converted(track) => {
                println!("{} -> {} ({} points)", track.source.display(), track.output.display(), track.points)
            }
            ConversionOutcome::Failed { source, error } => {
                println!("{}: FAILED: {}", source.display(), error)
            }
        }
    }
    println!("{} converted, {} failed", report.succeeded(), report.failed());

    Ok(report.failed() == 0)
}
