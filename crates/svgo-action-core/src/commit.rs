//! Atomic commit builder.
//!
//! Blobs are created up front, one per optimized file. The commit itself
//! then layers every blob onto the tip's tree in a single tree, commit and
//! ref update. A blob failure drops that one file; any later failure aborts
//! the run before the branch moves.

use svgo_hosting::{CommitRef, HostingApi, TreeEntry};
use tracing::{debug, warn};

use crate::domain::{CommitError, CommitPlan, OptimizationResult, PlannedFile};

/// Blob creation result for a run.
#[derive(Debug, Default)]
pub struct BlobBatch {
    /// Files whose blob was created, in diff order.
    pub files: Vec<PlannedFile>,
    pub warnings: Vec<String>,
}

impl BlobBatch {
    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    /// Turn the batch into a commit plan. `None` when every blob failed.
    pub fn into_plan(self, message: String, base_ref: &str) -> Option<CommitPlan> {
        CommitPlan::new(self.files, message, base_ref.to_string())
    }
}

/// Create one blob per optimized result, sequentially in diff order.
///
/// A failed blob drops that file with a warning.
pub async fn create_blobs(api: &dyn HostingApi, results: &[OptimizationResult]) -> BlobBatch {
    let mut batch = BlobBatch::default();

    for result in results.iter().filter(|r| r.was_optimized) {
        match api.create_blob(&result.encoded, result.encoding).await {
            Ok(blob) => {
                debug!(path = %result.path, blob = %blob.sha, "blob created");
                batch.files.push(PlannedFile {
                    path: result.path.clone(),
                    blob_sha: blob.sha,
                });
            }
            Err(err) => {
                warn!(path = %result.path, error = %err, "Blob could not be created for {}", result.path);
                batch.warnings.push(format!("Blob could not be created for {}: {err}", result.path));
            }
        }
    }

    batch
}

/// Commit every file of `plan` as one commit on top of the branch tip.
///
/// Steps run strictly in order and each one consumes the previous result:
/// resolve ref, resolve commit, create tree, create commit, update ref.
pub async fn commit(api: &dyn HostingApi, plan: CommitPlan) -> Result<CommitRef, CommitError> {
    let branch = plan.base_ref().to_string();

    let tip = api
        .get_ref(&branch)
        .await
        .map_err(|source| CommitError::RefNotFound {
            branch: branch.clone(),
            source,
        })?;

    let parent = api
        .get_commit(&tip.sha)
        .await
        .map_err(|source| CommitError::CommitNotFound {
            sha: tip.sha.clone(),
            source,
        })?;

    let entries: Vec<TreeEntry> = plan
        .files()
        .iter()
        .map(|file| TreeEntry::file(file.path.clone(), file.blob_sha.clone()))
        .collect();

    let tree_sha = api
        .create_tree(&parent.tree_sha, &entries)
        .await
        .map_err(CommitError::TreeCreation)?;

    let created = api
        .create_commit(plan.message(), &tree_sha, &[parent.sha.clone()])
        .await
        .map_err(CommitError::CommitCreation)?;

    api.update_ref(&branch, &created.sha)
        .await
        .map_err(|source| CommitError::RefUpdate {
            branch: branch.clone(),
            source,
        })?;

    debug!(branch = %branch, commit = %created.sha, files = entries.len(), "branch updated");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svgo_hosting::{fakes::MemoryHosting, Encoding, Operation};

    const BRANCH: &str = "heads/feature";

    fn result(path: &str, optimized: &str, was_optimized: bool) -> OptimizationResult {
        OptimizationResult {
            path: path.to_string(),
            original: format!("{optimized}   "),
            optimized: optimized.to_string(),
            encoded: optimized.to_string(),
            encoding: Encoding::Utf8,
            was_optimized,
        }
    }

    async fn plan(api: &MemoryHosting, paths: &[&str]) -> CommitPlan {
        let mut files = Vec::new();
        for path in paths {
            let blob = api
                .create_blob(&format!("<svg id=\"{path}\"/>"), Encoding::Utf8)
                .await
                .unwrap();
            files.push(PlannedFile {
                path: path.to_string(),
                blob_sha: blob.sha,
            });
        }
        CommitPlan::new(files, "Optimize".to_string(), BRANCH.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_blobs_follow_diff_order_and_skip_unchanged() {
        let api = MemoryHosting::new();
        let results = vec![
            result("b.svg", "<svg id=\"b\"/>", true),
            result("same.svg", "<svg/>", false),
            result("a.svg", "<svg id=\"a\"/>", true),
        ];

        let batch = create_blobs(&api, &results).await;
        assert!(batch.warnings.is_empty());
        assert!(!batch.contains("same.svg"));
        let plan = batch.into_plan("msg".into(), BRANCH).unwrap();
        let paths: Vec<&str> = plan.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["b.svg", "a.svg"]);
        assert_eq!(api.calls(Operation::CreateBlob), 2);
    }

    #[tokio::test]
    async fn test_oversized_blob_is_dropped_with_warning() {
        let api = MemoryHosting::new();
        api.set_max_blob_size(20);
        let results = vec![
            result("small.svg", "<svg/>", true),
            result("huge.svg", &format!("<svg>{}</svg>", "x".repeat(64)), true),
        ];

        let batch = create_blobs(&api, &results).await;
        assert!(batch.contains("small.svg"));
        assert!(!batch.contains("huge.svg"));
        assert_eq!(batch.warnings.len(), 1);
        assert!(batch.warnings[0].starts_with("Blob could not be created for huge.svg"));
        assert_eq!(batch.into_plan("msg".into(), BRANCH).unwrap().files().len(), 1);
    }

    #[tokio::test]
    async fn test_no_blobs_means_no_plan() {
        let api = MemoryHosting::new();
        api.fail(Operation::CreateBlob);
        let results = vec![result("a.svg", "<svg/>", true)];

        let batch = create_blobs(&api, &results).await;
        assert_eq!(batch.warnings.len(), 1);
        assert!(batch.into_plan("msg".into(), BRANCH).is_none());
    }

    #[tokio::test]
    async fn test_commit_layers_all_files_in_one_commit() {
        let api = MemoryHosting::new();
        let tip = api.seed_branch(BRANCH, "Add icons");

        let created = commit(&api, plan(&api, &["a.svg", "icons/b.svg"]).await)
            .await
            .unwrap();

        assert_eq!(api.branch_tip(BRANCH), Some(created.sha.clone()));
        let stored = api.commit(&created.sha).unwrap();
        assert_eq!(stored.parents, vec![tip]);
        assert_eq!(stored.message, "Optimize");
        let files = api.commit_files(&created.sha).unwrap();
        assert_eq!(
            files.keys().cloned().collect::<Vec<_>>(),
            vec!["a.svg", "icons/b.svg"]
        );
        assert_eq!(api.calls(Operation::CreateTree), 1);
        assert_eq!(api.calls(Operation::CreateCommit), 1);
        assert_eq!(api.calls(Operation::UpdateRef), 1);
    }

    #[tokio::test]
    async fn test_tree_failure_stops_before_commit_and_ref() {
        let api = MemoryHosting::new();
        let tip = api.seed_branch(BRANCH, "Add icons");
        api.fail(Operation::CreateTree);

        let err = commit(&api, plan(&api, &["a.svg"]).await).await.unwrap_err();
        assert!(matches!(err, CommitError::TreeCreation(_)));
        assert_eq!(api.calls(Operation::CreateCommit), 0);
        assert_eq!(api.calls(Operation::UpdateRef), 0);
        assert_eq!(api.branch_tip(BRANCH), Some(tip));
    }

    #[tokio::test]
    async fn test_unreadable_parent_is_commit_not_found() {
        let api = MemoryHosting::new();
        let tip = api.seed_branch(BRANCH, "Add icons");
        api.fail(Operation::GetCommit);

        let err = commit(&api, plan(&api, &["a.svg"]).await).await.unwrap_err();
        assert!(matches!(err, CommitError::CommitNotFound { ref sha, .. } if *sha == tip));
        assert_eq!(api.calls(Operation::CreateTree), 0);
        assert_eq!(api.calls(Operation::UpdateRef), 0);
        assert_eq!(api.branch_tip(BRANCH), Some(tip));
    }

    #[tokio::test]
    async fn test_missing_branch_is_ref_not_found() {
        let api = MemoryHosting::new();
        let err = commit(&api, plan(&api, &["a.svg"]).await).await.unwrap_err();
        assert!(matches!(err, CommitError::RefNotFound { ref branch, .. } if branch == BRANCH));
        assert_eq!(api.calls(Operation::GetCommit), 0);
    }

    #[tokio::test]
    async fn test_commit_creation_failure_leaves_branch_alone() {
        let api = MemoryHosting::new();
        let tip = api.seed_branch(BRANCH, "Add icons");
        api.fail(Operation::CreateCommit);

        let err = commit(&api, plan(&api, &["a.svg"]).await).await.unwrap_err();
        assert!(matches!(err, CommitError::CommitCreation(_)));
        assert_eq!(api.calls(Operation::UpdateRef), 0);
        assert_eq!(api.branch_tip(BRANCH), Some(tip));
    }

    #[tokio::test]
    async fn test_ref_update_failure_is_reported() {
        let api = MemoryHosting::new();
        api.seed_branch(BRANCH, "Add icons");
        api.fail(Operation::UpdateRef);

        let err = commit(&api, plan(&api, &["a.svg"]).await).await.unwrap_err();
        assert!(matches!(err, CommitError::RefUpdate { .. }));
    }
}
