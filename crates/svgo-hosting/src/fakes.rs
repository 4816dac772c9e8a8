//! In-memory fake of the hosting API (testing only)
//!
//! `MemoryHosting` models just enough of a content-addressed repository
//! (refs, commits, trees, blobs) plus pull request data to exercise the
//! whole pipeline without a network. Every call is recorded so tests can
//! assert on call counts, and any [`Operation`] can be made to fail.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::api::{HostingApi, HostingResult, Operation};
use crate::error::HostingError;
use crate::types::{
    BlobRef, ChangeSource, CommitRef, Encoding, FileChange, FileData, GitCommit, GitRef, TreeEntry,
};

/// Default blob size limit, matching GitHub's 100 MiB.
pub const DEFAULT_MAX_BLOB_SIZE: usize = 100 * 1024 * 1024;

fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// A commit stored by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCommit {
    pub tree_sha: String,
    pub parents: Vec<String>,
    pub message: String,
}

/// A blob stored by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content: String,
    pub encoding: Encoding,
}

#[derive(Debug)]
struct RepoState {
    refs: HashMap<String, String>,
    commits: HashMap<String, StoredCommit>,
    trees: HashMap<String, BTreeMap<String, String>>,
    blobs: HashMap<String, StoredBlob>,
    files: HashMap<(String, String), FileData>,
    changes: Vec<(ChangeSource, Vec<FileChange>)>,
    comments: HashMap<u64, Vec<String>>,
    commit_messages: HashMap<String, String>,
    posted_comments: Vec<(u64, String)>,
    calls: Vec<Operation>,
    failing: HashSet<Operation>,
    max_blob_size: usize,
}

impl Default for RepoState {
    fn default() -> Self {
        Self {
            refs: HashMap::new(),
            commits: HashMap::new(),
            trees: HashMap::new(),
            blobs: HashMap::new(),
            files: HashMap::new(),
            changes: Vec::new(),
            comments: HashMap::new(),
            commit_messages: HashMap::new(),
            posted_comments: Vec::new(),
            calls: Vec::new(),
            failing: HashSet::new(),
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
        }
    }
}

impl RepoState {
    /// Record the call and fail it if injection is armed for `op`.
    fn enter(&mut self, op: Operation) -> HostingResult<()> {
        self.calls.push(op);
        if self.failing.contains(&op) {
            return Err(HostingError::Injected {
                operation: op.name().to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory hosting backend.
#[derive(Debug, Default)]
pub struct MemoryHosting {
    state: Mutex<RepoState>,
}

impl MemoryHosting {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RepoState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // -- setup ---------------------------------------------------------------

    /// Create `branch` (`heads/<name>`) pointing at a root commit with an
    /// empty tree. Returns the commit sha.
    pub fn seed_branch(&self, branch: &str, message: &str) -> String {
        let mut state = self.state();
        let tree_sha = digest(&["tree"]);
        state.trees.entry(tree_sha.clone()).or_default();
        let commit_sha = digest(&["commit", &tree_sha, message]);
        state.commits.insert(
            commit_sha.clone(),
            StoredCommit {
                tree_sha,
                parents: Vec::new(),
                message: message.to_string(),
            },
        );
        state.refs.insert(branch.to_string(), commit_sha.clone());
        state
            .commit_messages
            .insert(commit_sha.clone(), message.to_string());
        commit_sha
    }

    /// Make `path` readable at `git_ref` through the contents API.
    pub fn put_file(&self, git_ref: &str, path: &str, content: &str, encoding: Encoding) {
        let data = FileData {
            path: path.to_string(),
            content: content.to_string(),
            encoding,
            sha: digest(&["blob", content]),
        };
        self.state()
            .files
            .insert((git_ref.to_string(), path.to_string()), data);
    }

    pub fn set_changes(&self, source: ChangeSource, changes: Vec<FileChange>) {
        let mut state = self.state();
        state.changes.retain(|(s, _)| *s != source);
        state.changes.push((source, changes));
    }

    /// Set the comments of a pull request, newest first.
    pub fn set_comments(&self, pr_number: u64, comments: Vec<String>) {
        self.state().comments.insert(pr_number, comments);
    }

    pub fn set_commit_message(&self, sha: &str, message: &str) {
        self.state()
            .commit_messages
            .insert(sha.to_string(), message.to_string());
    }

    /// Make every subsequent call to `op` fail.
    pub fn fail(&self, op: Operation) {
        self.state().failing.insert(op);
    }

    pub fn set_max_blob_size(&self, limit: usize) {
        self.state().max_blob_size = limit;
    }

    // -- inspection ------------------------------------------------------------

    /// Number of times `op` was invoked, including failed invocations.
    pub fn calls(&self, op: Operation) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    pub fn call_log(&self) -> Vec<Operation> {
        self.state().calls.clone()
    }

    /// Number of calls that create or move git objects.
    pub fn write_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Operation::CreateBlob
                        | Operation::CreateTree
                        | Operation::CreateCommit
                        | Operation::UpdateRef
                )
            })
            .count()
    }

    pub fn posted_comments(&self) -> Vec<(u64, String)> {
        self.state().posted_comments.clone()
    }

    pub fn branch_tip(&self, branch: &str) -> Option<String> {
        self.state().refs.get(branch).cloned()
    }

    pub fn commit(&self, sha: &str) -> Option<StoredCommit> {
        self.state().commits.get(sha).cloned()
    }

    /// Path to blob id mapping of the tree of commit `sha`.
    pub fn commit_files(&self, sha: &str) -> Option<BTreeMap<String, String>> {
        let state = self.state();
        let commit = state.commits.get(sha)?;
        state.trees.get(&commit.tree_sha).cloned()
    }

    pub fn blob(&self, sha: &str) -> Option<StoredBlob> {
        self.state().blobs.get(sha).cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.state().blobs.len()
    }
}

#[async_trait]
impl HostingApi for MemoryHosting {
    async fn get_ref(&self, branch: &str) -> HostingResult<GitRef> {
        let mut state = self.state();
        state.enter(Operation::GetRef)?;
        state
            .refs
            .get(branch)
            .map(|sha| GitRef {
                name: branch.to_string(),
                sha: sha.clone(),
            })
            .ok_or_else(|| HostingError::not_found(format!("ref {branch}")))
    }

    async fn get_commit(&self, sha: &str) -> HostingResult<GitCommit> {
        let mut state = self.state();
        state.enter(Operation::GetCommit)?;
        state
            .commits
            .get(sha)
            .map(|c| GitCommit {
                sha: sha.to_string(),
                tree_sha: c.tree_sha.clone(),
                message: c.message.clone(),
            })
            .ok_or_else(|| HostingError::not_found(format!("commit {sha}")))
    }

    async fn create_blob(&self, content: &str, encoding: Encoding) -> HostingResult<BlobRef> {
        let mut state = self.state();
        state.enter(Operation::CreateBlob)?;
        if content.len() > state.max_blob_size {
            return Err(HostingError::BlobTooLarge {
                size: content.len(),
                limit: state.max_blob_size,
            });
        }
        let sha = digest(&["blob", content]);
        state.blobs.insert(
            sha.clone(),
            StoredBlob {
                content: content.to_string(),
                encoding,
            },
        );
        Ok(BlobRef { sha })
    }

    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> HostingResult<String> {
        let mut state = self.state();
        state.enter(Operation::CreateTree)?;
        let mut files = state
            .trees
            .get(base_tree)
            .cloned()
            .ok_or_else(|| HostingError::not_found(format!("tree {base_tree}")))?;
        for entry in entries {
            if !state.blobs.contains_key(&entry.blob_sha) {
                return Err(HostingError::not_found(format!("blob {}", entry.blob_sha)));
            }
            files.insert(entry.path.clone(), entry.blob_sha.clone());
        }
        let mut parts = vec!["tree".to_string()];
        for (path, blob) in &files {
            parts.push(format!("{path}:{blob}"));
        }
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let sha = digest(&refs);
        state.trees.insert(sha.clone(), files);
        Ok(sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> HostingResult<CommitRef> {
        let mut state = self.state();
        state.enter(Operation::CreateCommit)?;
        if !state.trees.contains_key(tree_sha) {
            return Err(HostingError::not_found(format!("tree {tree_sha}")));
        }
        let mut parts = vec!["commit", tree_sha, message];
        parts.extend(parents.iter().map(String::as_str));
        let sha = digest(&parts);
        state.commits.insert(
            sha.clone(),
            StoredCommit {
                tree_sha: tree_sha.to_string(),
                parents: parents.to_vec(),
                message: message.to_string(),
            },
        );
        state
            .commit_messages
            .insert(sha.clone(), message.to_string());
        Ok(CommitRef {
            url: format!("memory://commits/{sha}"),
            sha,
        })
    }

    async fn update_ref(&self, branch: &str, sha: &str) -> HostingResult<()> {
        let mut state = self.state();
        state.enter(Operation::UpdateRef)?;
        let current = state
            .refs
            .get(branch)
            .cloned()
            .ok_or_else(|| HostingError::not_found(format!("ref {branch}")))?;
        let fast_forward = state
            .commits
            .get(sha)
            .map(|c| c.parents.contains(&current))
            .unwrap_or(false);
        if !fast_forward {
            return Err(HostingError::Http {
                status: 422,
                message: "Update is not a fast forward".to_string(),
            });
        }
        state.refs.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn list_changes(&self, source: &ChangeSource) -> HostingResult<Vec<FileChange>> {
        let mut state = self.state();
        state.enter(Operation::ListChanges)?;
        state
            .changes
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, changes)| changes.clone())
            .ok_or_else(|| HostingError::not_found(format!("changes for {source:?}")))
    }

    async fn list_comments(&self, pr_number: u64) -> HostingResult<Vec<String>> {
        let mut state = self.state();
        state.enter(Operation::ListComments)?;
        Ok(state.comments.get(&pr_number).cloned().unwrap_or_default())
    }

    async fn get_commit_message(&self, sha: &str) -> HostingResult<String> {
        let mut state = self.state();
        state.enter(Operation::GetCommitMessage)?;
        state
            .commit_messages
            .get(sha)
            .cloned()
            .ok_or_else(|| HostingError::not_found(format!("commit {sha}")))
    }

    async fn get_file(&self, path: &str, git_ref: &str) -> HostingResult<FileData> {
        let mut state = self.state();
        state.enter(Operation::GetFile)?;
        state
            .files
            .get(&(git_ref.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| HostingError::not_found(format!("file {path}@{git_ref}")))
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> HostingResult<()> {
        let mut state = self.state();
        state.enter(Operation::CreateComment)?;
        state.posted_comments.push((pr_number, body.to_string()));
        Ok(())
    }
}
