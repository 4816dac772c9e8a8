//! Optimization stage.
//!
//! Fetch, decode, optimize and re-encode run concurrently per candidate
//! under a bounded worker pool. Results are slotted back by index so the
//! output always follows diff order.

use std::sync::Arc;

use svgo_hosting::{FileChange, HostingApi};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::domain::{ActionError, FileOutcome, OptimizationResult, OptimizeError, Result};
use crate::encoder;
use crate::optimizer::Optimizer;

/// Process one candidate file read at `git_ref`.
///
/// Fetch and decode failures are fatal. A content rejection by the
/// optimizer is returned as [`FileOutcome::Rejected`].
pub async fn process_file(
    api: &dyn HostingApi,
    optimizer: &dyn Optimizer,
    change: &FileChange,
    git_ref: &str,
) -> Result<FileOutcome> {
    let path = change.path.clone();
    let data = api
        .get_file(&path, git_ref)
        .await
        .map_err(|source| ActionError::Fetch {
            path: path.clone(),
            source,
        })?;

    let original = encoder::decode(&data.content, data.encoding).map_err(|source| {
        ActionError::Decode {
            path: path.clone(),
            source,
        }
    })?;

    let optimized = match optimizer.optimize(&original).await {
        Ok(optimized) => optimized,
        Err(OptimizeError::InvalidSvg(reason)) => {
            info!(path = %path, %reason, "cannot optimize {path}, it is not valid SVG");
            return Ok(FileOutcome::Rejected { path, reason });
        }
        Err(err @ OptimizeError::Engine(_)) => return Err(ActionError::Optimizer(err)),
    };

    let was_optimized = optimized != original;
    if !was_optimized {
        debug!(path = %path, "skipping {path}, already optimized");
    }
    let encoded = encoder::encode(&optimized, data.encoding);

    Ok(FileOutcome::Processed(OptimizationResult {
        path,
        original,
        optimized,
        encoded,
        encoding: data.encoding,
        was_optimized,
    }))
}

/// Bounded concurrent optimization of all candidates of a run.
pub struct OptimizationStage {
    api: Arc<dyn HostingApi>,
    optimizer: Arc<dyn Optimizer>,
    max_concurrency: usize,
}

impl OptimizationStage {
    pub fn new(
        api: Arc<dyn HostingApi>,
        optimizer: Arc<dyn Optimizer>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            api,
            optimizer,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Process every candidate, returning outcomes in candidate order.
    ///
    /// The first fatal error aborts the remaining workers.
    pub async fn run(&self, candidates: &[FileChange], git_ref: &str) -> Result<Vec<FileOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set = JoinSet::new();

        for (idx, change) in candidates.iter().cloned().enumerate() {
            let api = Arc::clone(&self.api);
            let optimizer = Arc::clone(&self.optimizer);
            let semaphore = Arc::clone(&semaphore);
            let git_ref = git_ref.to_string();
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = process_file(api.as_ref(), optimizer.as_ref(), &change, &git_ref).await;
                (idx, outcome)
            });
        }

        let mut ordered: Vec<Option<FileOutcome>> = vec![None; candidates.len()];
        while let Some(joined) = join_set.join_next().await {
            let (idx, outcome) =
                joined.map_err(|e| ActionError::Task(format!("optimization task join error: {e}")))?;
            match outcome {
                Ok(outcome) => ordered[idx] = Some(outcome),
                Err(err) => {
                    join_set.abort_all();
                    return Err(err);
                }
            }
        }

        candidates
            .iter()
            .zip(ordered)
            .map(|(change, slot)| {
                slot.ok_or_else(|| {
                    ActionError::Task(format!("missing optimization result for '{}'", change.path))
                })
            })
            .collect()
    }
}
