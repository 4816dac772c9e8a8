//! Error taxonomy for the SVGO Action pipeline.
//!
//! Per-file failures that only exclude a file ([`OptimizeError::InvalidSvg`],
//! blob creation) are handled inside the stages. Everything that reaches a
//! caller as [`ActionError`] fails the run.

use svgo_hosting::HostingError;

/// Content could not be decoded from its transfer encoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Optimizer failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptimizeError {
    /// The content was rejected as not being valid SVG. Non-fatal.
    #[error("invalid SVG: {0}")]
    InvalidSvg(String),

    /// The optimizer engine itself is unusable. Fatal.
    #[error("optimizer engine failed: {0}")]
    Engine(String),
}

/// Failures of the atomic commit protocol.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("branch {branch} not found: {source}")]
    RefNotFound {
        branch: String,
        #[source]
        source: HostingError,
    },

    #[error("commit {sha} not found: {source}")]
    CommitNotFound {
        sha: String,
        #[source]
        source: HostingError,
    },

    #[error("tree could not be created: {0}")]
    TreeCreation(#[source] HostingError),

    #[error("commit could not be created: {0}")]
    CommitCreation(#[source] HostingError),

    #[error("branch {branch} could not be updated: {source}")]
    RefUpdate {
        branch: String,
        #[source]
        source: HostingError,
    },
}

/// Configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid YAML in {path}: {source}")]
    InvalidYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid ignore glob '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("invalid {key} template: {source}")]
    InvalidTemplate {
        key: String,
        #[source]
        source: TemplateError,
    },

    #[error("{path} could not be fetched: {source}")]
    Fetch {
        path: String,
        #[source]
        source: HostingError,
    },

    #[error("{path} could not be decoded: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeError,
    },
}

/// Template rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template syntax error: {0}")]
    Syntax(#[from] handlebars::TemplateError),

    #[error("template rendering failed: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Run-level errors. Any of these fails the run.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Event '{0}' not supported")]
    UnsupportedEvent(String),

    #[error("pull request number could not be resolved from the event payload")]
    PullRequestNotFound,

    #[error("invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("changed files could not be listed: {0}")]
    ListChanges(#[source] HostingError),

    #[error("manual control signals could not be fetched: {0}")]
    ManualControl(#[source] HostingError),

    #[error("file {path} could not be fetched: {source}")]
    Fetch {
        path: String,
        #[source]
        source: HostingError,
    },

    #[error("file {path} could not be decoded: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeError,
    },

    #[error("{0}")]
    Optimizer(OptimizeError),

    #[error("commit failed: {0}")]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("worker task failed: {0}")]
    Task(String),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ActionError>;
