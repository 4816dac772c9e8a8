//! Run-scoped values produced and consumed by the pipeline stages.

use serde::{Deserialize, Serialize};
use svgo_hosting::{CommitRef, Encoding};

pub const OUTPUT_DID_OPTIMIZE: &str = "DID_OPTIMIZE";
pub const OUTPUT_OPTIMIZED_COUNT: &str = "OPTIMIZED_COUNT";
pub const OUTPUT_SKIPPED_COUNT: &str = "SKIPPED_COUNT";
pub const OUTPUT_SVG_COUNT: &str = "SVG_COUNT";

/// Whether manual control markers allow the run to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualControlState {
    Enabled,
    Disabled,
}

/// Result of optimizing one candidate file.
///
/// `original` and `optimized` are decoded SVG text; `encoded` is `optimized`
/// re-encoded with the file's original `encoding`, ready for blob creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub path: String,
    pub original: String,
    pub optimized: String,
    pub encoded: String,
    pub encoding: Encoding,
    pub was_optimized: bool,
}

impl OptimizationResult {
    /// Relative size reduction in percent (positive means smaller).
    pub fn saving_percent(&self) -> f64 {
        if self.original.is_empty() {
            return 0.0;
        }
        let before = self.original.len() as f64;
        let after = self.optimized.len() as f64;
        (before - after) / before * 100.0
    }
}

/// What the optimization stage did with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Optimizer accepted the file; may or may not have changed it.
    Processed(OptimizationResult),
    /// Optimizer rejected the content as not valid SVG.
    Rejected { path: String, reason: String },
}

impl FileOutcome {
    pub fn path(&self) -> &str {
        match self {
            FileOutcome::Processed(result) => &result.path,
            FileOutcome::Rejected { path, .. } => path,
        }
    }
}

/// A file entry of a [`CommitPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedFile {
    pub path: String,
    pub blob_sha: String,
}

/// Everything the atomic commit needs. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPlan {
    files: Vec<PlannedFile>,
    message: String,
    base_ref: String,
}

impl CommitPlan {
    /// Returns `None` when there is nothing to commit.
    pub fn new(files: Vec<PlannedFile>, message: String, base_ref: String) -> Option<Self> {
        if files.is_empty() {
            return None;
        }
        Some(Self {
            files,
            message,
            base_ref,
        })
    }

    pub fn files(&self) -> &[PlannedFile] {
        &self.files
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Target branch, `heads/<name>`.
    pub fn base_ref(&self) -> &str {
        &self.base_ref
    }
}

/// Machine-readable outcome of a run.
///
/// # Invariants
///
/// `optimized_count + skipped_count == svg_count`, and `did_optimize` is
/// `optimized_count > 0`. Use [`RunOutcome::new`] to keep both true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    pub svg_count: usize,
    pub optimized_count: usize,
    pub skipped_count: usize,
    pub did_optimize: bool,
}

impl RunOutcome {
    pub fn new(optimized_count: usize, skipped_count: usize) -> Self {
        Self {
            svg_count: optimized_count + skipped_count,
            optimized_count,
            skipped_count,
            did_optimize: optimized_count > 0,
        }
    }

    /// Outcome of a run that found candidates but did not optimize them.
    pub fn untouched(svg_count: usize) -> Self {
        Self::new(0, svg_count)
    }

    /// Output name/value pairs in a fixed order.
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        vec![
            (OUTPUT_DID_OPTIMIZE, self.did_optimize.to_string()),
            (OUTPUT_OPTIMIZED_COUNT, self.optimized_count.to_string()),
            (OUTPUT_SKIPPED_COUNT, self.skipped_count.to_string()),
            (OUTPUT_SVG_COUNT, self.svg_count.to_string()),
        ]
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    NoCandidates,
    Disabled,
    NothingToOptimize,
    DryRun,
    NothingToCommit,
    Committed,
}

/// Full report of a successful run, used for outputs and notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub terminal: Terminal,
    /// Number of changed files of any kind in the event.
    pub changed_count: usize,
    /// Files whose content changed, in diff order.
    pub optimized: Vec<OptimizationResult>,
    /// Paths that were already optimal or rejected, in diff order.
    pub skipped: Vec<String>,
    pub warnings: Vec<String>,
    pub commit: Option<CommitRef>,
}

impl RunReport {
    pub fn new(terminal: Terminal, changed_count: usize, outcome: RunOutcome) -> Self {
        Self {
            outcome,
            terminal,
            changed_count,
            optimized: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            commit: None,
        }
    }
}
