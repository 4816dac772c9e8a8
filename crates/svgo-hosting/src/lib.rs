//! svgo-hosting: Hosting API layer for SVGO Action
//!
//! This crate is the only place that talks to the code host. It exposes the
//! capability set the pipeline needs as the [`HostingApi`] trait, so the
//! pipeline can run against GitHub or against an in-memory fake.
//!
//! ## Key Components
//!
//! - `HostingApi`: refs, commits, blobs, trees, pull request files/comments, contents
//! - `GitHubClient`: REST implementation
//! - `fakes::MemoryHosting`: content-addressed in-memory repository for tests

pub mod api;
mod error;
pub mod fakes;
mod github;
pub mod types;

pub use api::{HostingApi, HostingResult, Operation};
pub use error::HostingError;
pub use github::{GitHubClient, GitHubConfig};
pub use types::{
    BlobRef, ChangeSource, ChangeStatus, CommitRef, Encoding, FileChange, FileData, GitCommit,
    GitRef, TreeEntry,
};
