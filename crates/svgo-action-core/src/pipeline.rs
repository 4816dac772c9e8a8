//! Run orchestration.
//!
//! `classify -> gate -> optimize -> commit -> notify`, single pass. Each
//! informational stop (no candidates, disabled, nothing to optimize, dry
//! run, nothing to commit) ends the run successfully with a [`RunReport`].

use std::sync::Arc;
use std::time::Instant;

use svgo_hosting::HostingApi;
use tracing::{debug, info, warn, Instrument};

use crate::classify::classify;
use crate::commit::{commit, create_blobs};
use crate::config::ActionConfig;
use crate::domain::{
    ActionError, FileOutcome, ManualControlState, OptimizationResult, Result, RunOutcome,
    RunReport, Terminal,
};
use crate::event::EventContext;
use crate::manual_control;
use crate::obs::{self, RunSpan};
use crate::optimize::OptimizationStage;
use crate::optimizer::Optimizer;
use crate::summary;

pub struct Pipeline {
    api: Arc<dyn HostingApi>,
    optimizer: Arc<dyn Optimizer>,
}

impl Pipeline {
    pub fn new(api: Arc<dyn HostingApi>, optimizer: Arc<dyn Optimizer>) -> Self {
        Self { api, optimizer }
    }

    /// Run the whole pipeline for one event.
    pub async fn run(&self, event: &EventContext, config: &ActionConfig) -> Result<RunReport> {
        let run = RunSpan::new(event.name());
        let started = Instant::now();
        obs::emit_run_started(run.run_id(), event.name());

        let result = self
            .run_stages(&run, event, config)
            .instrument(run.span())
            .await;

        let (terminal, success) = match &result {
            Ok(report) => (format!("{:?}", report.terminal), true),
            Err(_) => ("Failed".to_string(), false),
        };
        obs::emit_run_finished(
            run.run_id(),
            started.elapsed().as_millis() as u64,
            &terminal,
            success,
        );
        result
    }

    async fn run_stages(
        &self,
        run: &RunSpan,
        event: &EventContext,
        config: &ActionConfig,
    ) -> Result<RunReport> {
        let changes = self
            .api
            .list_changes(&event.change_source())
            .await
            .map_err(ActionError::ListChanges)?;
        let candidates = classify(&changes, config.ignore.as_ref());
        summary::log_candidates(candidates.len(), changes.len());
        obs::emit_stage(run.run_id(), "classify", candidates.len());

        if candidates.is_empty() {
            return Ok(RunReport::new(
                Terminal::NoCandidates,
                changes.len(),
                RunOutcome::untouched(0),
            ));
        }

        if self.manual_control(event, config).await? == ManualControlState::Disabled {
            info!("SVGO Action disabled by manual control marker");
            let mut report = RunReport::new(
                Terminal::Disabled,
                changes.len(),
                RunOutcome::untouched(candidates.len()),
            );
            report.skipped = candidates.into_iter().map(|c| c.path).collect();
            return Ok(report);
        }

        obs::emit_stage(run.run_id(), "optimize", candidates.len());
        let stage = OptimizationStage::new(
            Arc::clone(&self.api),
            Arc::clone(&self.optimizer),
            config.max_concurrency,
        );
        let outcomes = stage.run(&candidates, event.head_sha()).await?;

        let mut optimized = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Processed(result) if result.was_optimized => optimized.push(result),
                FileOutcome::Processed(result) => skipped.push(result.path),
                FileOutcome::Rejected { path, .. } => skipped.push(path),
            }
        }

        let outcome = RunOutcome::new(optimized.len(), skipped.len());
        summary::log_outcome(&outcome);

        let mut report = RunReport::new(Terminal::NothingToOptimize, changes.len(), outcome);
        report.skipped = skipped;
        if optimized.is_empty() {
            return Ok(report);
        }
        report.optimized = optimized;

        if config.dry_run {
            debug!("dry run, {} file(s) left uncommitted", report.optimized.len());
            report.terminal = Terminal::DryRun;
            return Ok(report);
        }

        obs::emit_stage(run.run_id(), "commit", report.optimized.len());
        let batch = create_blobs(self.api.as_ref(), &report.optimized).await;
        report.warnings.extend(batch.warnings.iter().cloned());

        let committed: Vec<OptimizationResult> = report
            .optimized
            .iter()
            .filter(|r| batch.contains(&r.path))
            .cloned()
            .collect();
        let vars = summary::template_vars(&report.outcome, &committed, &report.warnings);
        let message = summary::commit_message(&config.commit_title, &config.commit_body, &vars)?;
        let comment = render_comment(event, config, &vars)?;

        let Some(plan) = batch.into_plan(message, &event.target_branch()) else {
            info!("nothing to commit, no blob could be created");
            report.terminal = Terminal::NothingToCommit;
            return Ok(report);
        };

        let files = plan.files().len();
        let created = commit(self.api.as_ref(), plan).await?;
        obs::emit_commit_created(run.run_id(), &created.sha, files);
        report.commit = Some(created);
        report.terminal = Terminal::Committed;

        if let Some((pr_number, body)) = comment {
            self.notify(run, pr_number, &body, &mut report).await;
        }
        Ok(report)
    }

    async fn manual_control(
        &self,
        event: &EventContext,
        config: &ActionConfig,
    ) -> Result<ManualControlState> {
        let (comments, message) = match event {
            EventContext::PullRequest {
                number, head_sha, ..
            } => {
                let comments = self
                    .api
                    .list_comments(*number)
                    .await
                    .map_err(ActionError::ManualControl)?;
                let message = self
                    .api
                    .get_commit_message(head_sha)
                    .await
                    .map_err(ActionError::ManualControl)?;
                (comments, message)
            }
            EventContext::Push {
                after,
                head_commit_message,
                ..
            } => {
                let message = match head_commit_message {
                    Some(message) => message.clone(),
                    None => self
                        .api
                        .get_commit_message(after)
                        .await
                        .map_err(ActionError::ManualControl)?,
                };
                (Vec::new(), message)
            }
        };
        Ok(manual_control::resolve(
            &comments,
            Some(message.as_str()),
            &config.markers,
        ))
    }

    /// Post the summary comment. Failing to post only adds a warning.
    async fn notify(&self, run: &RunSpan, pr_number: u64, body: &str, report: &mut RunReport) {
        if let Err(err) = self.api.create_comment(pr_number, body).await {
            obs::emit_notify_error(run.run_id(), &err);
            warn!("comment could not be posted on #{pr_number}: {err}");
            report
                .warnings
                .push(format!("Comment could not be posted: {err}"));
        }
    }
}

/// The pull request and body of the summary comment, when one is due.
/// Rendered before the commit protocol starts.
fn render_comment(
    event: &EventContext,
    config: &ActionConfig,
    vars: &serde_json::Value,
) -> Result<Option<(u64, String)>> {
    let (Some(template), Some(pr_number)) = (&config.comment, event.pull_request_number()) else {
        return Ok(None);
    };
    Ok(Some((pr_number, summary::comment_body(template, vars)?)))
}
