use crate::cli::OutputFormat;
use crate::models::Report;
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Render the report and write it out in one go
pub fn generate_report(
    report: &Report,
    format: OutputFormat,
    output_path: Option<&Path>,
) -> Result<()> {
    let output = match format {
        OutputFormat::Text => format_text(report),
        OutputFormat::Json => format_json(report)?,
    };

    if let Some(path) = output_path {
        fs::write(path, output)
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
        info!("Report written to {}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(output.as_bytes())
            .and_then(|_| stdout.flush())
            .context("Failed to write report to stdout")?;
    }

    Ok(())
}

/// One `file:line (author) text ` line per finding
fn format_text(report: &Report) -> String {
    let mut output = String::new();
    for finding in &report.findings {
        output.push_str(&finding.to_string());
        output.push('\n');
    }
    output
}

/// Format report as JSON
fn format_json(report: &Report) -> Result<String> {
    let mut json =
        serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;
    json.push('\n');
    Ok(json)
}
