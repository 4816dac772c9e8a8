//! Run outputs for the workflow.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use svgo_action_core::RunOutcome;
use tracing::info;

/// `NAME=value` lines in the `GITHUB_OUTPUT` file format.
pub fn format_outputs(outcome: &RunOutcome) -> String {
    outcome
        .outputs()
        .into_iter()
        .map(|(name, value)| format!("{name}={value}\n"))
        .collect()
}

/// Log the outputs and append them to `output_file` when one is given.
pub fn write_outputs(output_file: Option<&Path>, outcome: &RunOutcome) -> Result<()> {
    for (name, value) in outcome.outputs() {
        info!(output = name, %value, "set output {name}={value}");
    }

    let Some(path) = output_file else {
        return Ok(());
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open output file {}", path.display()))?;
    file.write_all(format_outputs(outcome).as_bytes())
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
