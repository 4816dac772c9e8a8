//! Structured observability hooks for the run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via [`RunSpan`], tagged with a fresh run id
//! - Emission functions for run start/finish, stage transitions and commits
//!
//! Events are emitted at `info!` level and filtered through `RUST_LOG`.

use tracing::info;
use uuid::Uuid;

/// Run-scoped span. Futures instrumented with [`RunSpan::span`] tag every
/// event with `run_id` and `event_name`.
#[derive(Debug, Clone)]
pub struct RunSpan {
    run_id: String,
    span: tracing::Span,
}

impl RunSpan {
    /// Create a span for a run triggered by `event_name`.
    pub fn new(event_name: &str) -> Self {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("svgo_action.run", run_id = %run_id, event_name = %event_name);
        Self { run_id, span }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn span(&self) -> tracing::Span {
        self.span.clone()
    }
}

/// Emit event: run started.
pub fn emit_run_started(run_id: &str, event_name: &str) {
    info!(event = "run.started", run_id = %run_id, event_name = %event_name);
}

/// Emit event: the run entered a pipeline stage.
pub fn emit_stage(run_id: &str, stage: &str, files: usize) {
    info!(event = "run.stage", run_id = %run_id, stage = %stage, files = files);
}

/// Emit event: the optimized files were committed.
pub fn emit_commit_created(run_id: &str, sha: &str, files: usize) {
    info!(event = "commit.created", run_id = %run_id, sha = %sha, files = files);
}

/// Emit event: run finished with its terminal state.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, terminal: &str, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        terminal = %terminal,
        success = success,
    );
}

/// Emit event: notification could not be posted (warning level).
pub fn emit_notify_error(run_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "notify.error", run_id = %run_id, error = %error);
}
