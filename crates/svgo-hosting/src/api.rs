//! Hosting API capability set
//!
//! The pipeline talks to the code host only through [`HostingApi`]:
//! - git data: refs, commits, blobs and trees (used by the atomic commit)
//! - pull request data: changed files, comments, commit messages
//! - repository contents: candidate files and configuration files
//!
//! The trait is async and backend-agnostic. [`GitHubClient`](crate::GitHubClient)
//! is the REST implementation; [`MemoryHosting`](crate::fakes::MemoryHosting)
//! is the in-memory fake used by tests.

use async_trait::async_trait;

use crate::error::HostingError;
use crate::types::{
    BlobRef, ChangeSource, CommitRef, Encoding, FileChange, FileData, GitCommit, GitRef, TreeEntry,
};

/// Result type for hosting operations
pub type HostingResult<T> = std::result::Result<T, HostingError>;

/// Operations the pipeline may invoke, used for call accounting and
/// failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetRef,
    GetCommit,
    CreateBlob,
    CreateTree,
    CreateCommit,
    UpdateRef,
    ListChanges,
    ListComments,
    GetCommitMessage,
    GetFile,
    CreateComment,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetRef => "getRef",
            Operation::GetCommit => "getCommit",
            Operation::CreateBlob => "createBlob",
            Operation::CreateTree => "createTree",
            Operation::CreateCommit => "createCommit",
            Operation::UpdateRef => "updateRef",
            Operation::ListChanges => "listChanges",
            Operation::ListComments => "listComments",
            Operation::GetCommitMessage => "getCommitMessage",
            Operation::GetFile => "getFile",
            Operation::CreateComment => "createComment",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Code host capability set.
///
/// Guarantees expected from implementations:
/// - Blob, tree and commit identifiers are content addresses; creating the
///   same content twice yields the same id.
/// - `update_ref` only fast-forwards; it never force-pushes.
/// - `list_comments` returns comment bodies newest first.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Resolve the tip of a branch (`heads/<name>`).
    async fn get_ref(&self, branch: &str) -> HostingResult<GitRef>;

    /// Fetch the commit object at `sha`.
    async fn get_commit(&self, sha: &str) -> HostingResult<GitCommit>;

    /// Store `content` as a blob and return its id.
    async fn create_blob(&self, content: &str, encoding: Encoding) -> HostingResult<BlobRef>;

    /// Create a tree layering `entries` onto `base_tree`, returning the new tree id.
    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> HostingResult<String>;

    /// Create a commit object.
    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parents: &[String],
    ) -> HostingResult<CommitRef>;

    /// Move `branch` to `sha`.
    async fn update_ref(&self, branch: &str, sha: &str) -> HostingResult<()>;

    /// List changed files in the order the host reports them.
    async fn list_changes(&self, source: &ChangeSource) -> HostingResult<Vec<FileChange>>;

    /// List pull request comment bodies, newest first.
    async fn list_comments(&self, pr_number: u64) -> HostingResult<Vec<String>>;

    /// Fetch the message of commit `sha`.
    async fn get_commit_message(&self, sha: &str) -> HostingResult<String>;

    /// Fetch a file's content at `git_ref`. Returns `HostingError::NotFound` if absent.
    async fn get_file(&self, path: &str, git_ref: &str) -> HostingResult<FileData>;

    /// Post a comment on a pull request.
    async fn create_comment(&self, pr_number: u64, body: &str) -> HostingResult<()>;
}
