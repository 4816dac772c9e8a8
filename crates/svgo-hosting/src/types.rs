//! Data types exchanged with the hosting API.
//!
//! Everything here is scoped to a single run: produced by the hosting API,
//! consumed by the pipeline, never persisted.

use serde::{Deserialize, Serialize};

/// Status of a changed file in a pull request or push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Removed,
    Renamed,
}

impl ChangeStatus {
    /// Map a GitHub file status string onto the four statuses the pipeline knows.
    ///
    /// `copied` creates a new path and counts as added; `changed` and
    /// `unchanged` (mode-only or no-op edits) count as modified.
    pub fn from_github(status: &str) -> Option<Self> {
        match status {
            "added" | "copied" => Some(ChangeStatus::Added),
            "modified" | "changed" | "unchanged" => Some(ChangeStatus::Modified),
            "removed" => Some(ChangeStatus::Removed),
            "renamed" => Some(ChangeStatus::Renamed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeStatus::Added => "added",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Removed => "removed",
            ChangeStatus::Renamed => "renamed",
        };
        f.write_str(s)
    }
}

/// A single entry of a pull request's or push's file list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: ChangeStatus,
    pub previous_path: Option<String>,
}

impl FileChange {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            status,
            previous_path: None,
        }
    }

    pub fn renamed(path: impl Into<String>, previous_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ChangeStatus::Renamed,
            previous_path: Some(previous_path.into()),
        }
    }
}

/// Transfer encoding of file or blob content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "base64")]
    Base64,
    #[serde(rename = "utf-8")]
    Utf8,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Base64 => "base64",
            Encoding::Utf8 => "utf-8",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "base64" => Some(Encoding::Base64),
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            _ => None,
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File content as returned by the contents API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    pub path: String,
    pub content: String,
    pub encoding: Encoding,
    pub sha: String,
}

/// Where the list of changed files comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
    /// Files of an open pull request.
    PullRequest { number: u64 },
    /// Files between two commits, used for push events.
    Compare { base: String, head: String },
}

/// A branch pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    /// Ref name without the `refs/` prefix, e.g. `heads/main`.
    pub name: String,
    /// Commit the ref points at.
    pub sha: String,
}

/// The subset of a commit object the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    pub tree_sha: String,
    pub message: String,
}

/// Identifier of a created blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub sha: String,
}

/// One file entry layered onto a base tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    pub blob_sha: String,
}

impl TreeEntry {
    /// Regular (non-executable) file entry.
    pub fn file(path: impl Into<String>, blob_sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: "100644".to_string(),
            blob_sha: blob_sha.into(),
        }
    }
}

/// A created commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
    pub url: String,
}
