//! Summary and notification text.
//!
//! Pure projections of a run into template variables, the commit message
//! and the pull request comment.

use serde_json::{json, Value};
use tracing::info;

use crate::domain::{OptimizationResult, RunOutcome, TemplateError};
use crate::templating;

pub const DEFAULT_COMMIT_TITLE: &str = "Optimize {{optimizedCount}} SVG(s) with SVGO";
pub const DEFAULT_COMMIT_BODY: &str = "Optimized SVG(s):\n{{filesList}}";
pub const DEFAULT_COMMENT: &str = "SVG(s) automatically optimized using [SVGO] :sparkles:\n\n\
{{filesTable}}\n\n\
{{warnings}}\n\n\
[SVGO]: https://github.com/svg/svgo";

/// Variables available to every template.
///
/// `committed` are the files the commit actually carries. `optimizedCount`
/// counts them and `skippedCount` is every other candidate, so a file whose
/// blob was dropped shows up as skipped here while the run outputs still
/// count it as optimized.
pub fn template_vars(
    outcome: &RunOutcome,
    committed: &[OptimizationResult],
    warnings: &[String],
) -> Value {
    json!({
        "svgCount": outcome.svg_count,
        "optimizedCount": committed.len(),
        "skippedCount": outcome.svg_count.saturating_sub(committed.len()),
        "filesList": files_list(committed),
        "filesTable": files_table(committed),
        "warnings": warnings_list(warnings),
    })
}

/// Markdown bullet list of optimized paths.
pub fn files_list(optimized: &[OptimizationResult]) -> String {
    optimized
        .iter()
        .map(|r| format!("- {}", r.path))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown table of optimized files with their size change.
pub fn files_table(optimized: &[OptimizationResult]) -> String {
    if optimized.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "| Filename | Before | After | Improvement |".to_string(),
        "| --- | --- | --- | --- |".to_string(),
    ];
    for result in optimized {
        lines.push(format!(
            "| {} | {} | {} | {:.2}% |",
            result.path,
            format_size(result.original.len()),
            format_size(result.optimized.len()),
            result.saving_percent()
        ));
    }
    lines.join("\n")
}

fn warnings_list(warnings: &[String]) -> String {
    if warnings.is_empty() {
        return String::new();
    }
    let mut out = String::from("Warnings:");
    for warning in warnings {
        out.push_str("\n- ");
        out.push_str(warning);
    }
    out
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    }
}

/// Commit message: rendered title, a blank line, rendered body.
pub fn commit_message(title: &str, body: &str, vars: &Value) -> Result<String, TemplateError> {
    let title = templating::format(title, vars)?;
    let body = templating::format(body, vars)?;
    let body = body.trim_end();
    if body.is_empty() {
        return Ok(title.trim_end().to_string());
    }
    Ok(format!("{}\n\n{body}", title.trim_end()))
}

/// Pull request comment text.
pub fn comment_body(template: &str, vars: &Value) -> Result<String, TemplateError> {
    Ok(templating::format(template, vars)?.trim().to_string())
}

pub fn log_candidates(svg_count: usize, changed_count: usize) {
    info!("Found {svg_count}/{changed_count} new or changed SVGs");
}

pub fn log_outcome(outcome: &RunOutcome) {
    info!(
        "optimized {}/{} SVG(s)",
        outcome.optimized_count, outcome.svg_count
    );
    info!(
        "{}/{} SVG(s) skipped",
        outcome.skipped_count, outcome.svg_count
    );
}
