//! Triggering event context.

use serde_json::Value;
use svgo_hosting::ChangeSource;

use crate::domain::{ActionError, Result};

pub const EVENT_PULL_REQUEST: &str = "pull_request";
pub const EVENT_PUSH: &str = "push";

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// The parts of a webhook payload the pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventContext {
    PullRequest {
        number: u64,
        /// Source branch name, without `refs/heads/`.
        head_ref: String,
        head_sha: String,
    },
    Push {
        /// Full pushed ref, e.g. `refs/heads/main`.
        git_ref: String,
        before: String,
        after: String,
        head_commit_message: Option<String>,
    },
}

impl EventContext {
    /// Build the context of event `event_name` from its JSON payload.
    pub fn from_payload(event_name: &str, payload: &Value) -> Result<Self> {
        match event_name {
            EVENT_PULL_REQUEST => {
                let pr = payload
                    .get("pull_request")
                    .filter(|pr| pr.is_object())
                    .ok_or(ActionError::PullRequestNotFound)?;
                let number = pr
                    .get("number")
                    .and_then(Value::as_u64)
                    .or_else(|| payload.get("number").and_then(Value::as_u64))
                    .ok_or(ActionError::PullRequestNotFound)?;
                Ok(EventContext::PullRequest {
                    number,
                    head_ref: str_at(pr, &["head", "ref"])?,
                    head_sha: str_at(pr, &["head", "sha"])?,
                })
            }
            EVENT_PUSH => {
                let git_ref = str_at(payload, &["ref"])?;
                if !git_ref.starts_with(BRANCH_REF_PREFIX) {
                    return Err(ActionError::InvalidPayload(format!(
                        "push to {git_ref} is not a branch push"
                    )));
                }
                Ok(EventContext::Push {
                    before: str_at(payload, &["before"])?,
                    after: str_at(payload, &["after"])?,
                    head_commit_message: payload
                        .pointer("/head_commit/message")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    git_ref,
                })
            }
            other => Err(ActionError::UnsupportedEvent(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventContext::PullRequest { .. } => EVENT_PULL_REQUEST,
            EventContext::Push { .. } => EVENT_PUSH,
        }
    }

    /// Branch the optimized files are committed to, as `heads/<name>`.
    pub fn target_branch(&self) -> String {
        match self {
            EventContext::PullRequest { head_ref, .. } => format!("heads/{head_ref}"),
            EventContext::Push { git_ref, .. } => git_ref
                .strip_prefix("refs/")
                .unwrap_or(git_ref)
                .to_string(),
        }
    }

    /// Commit whose content is read and optimized.
    pub fn head_sha(&self) -> &str {
        match self {
            EventContext::PullRequest { head_sha, .. } => head_sha,
            EventContext::Push { after, .. } => after,
        }
    }

    pub fn change_source(&self) -> ChangeSource {
        match self {
            EventContext::PullRequest { number, .. } => ChangeSource::PullRequest { number: *number },
            EventContext::Push { before, after, .. } => ChangeSource::Compare {
                base: before.clone(),
                head: after.clone(),
            },
        }
    }

    pub fn pull_request_number(&self) -> Option<u64> {
        match self {
            EventContext::PullRequest { number, .. } => Some(*number),
            EventContext::Push { .. } => None,
        }
    }
}

fn str_at(value: &Value, path: &[&str]) -> Result<String> {
    let mut current = value;
    for key in path {
        current = current
            .get(key)
            .ok_or_else(|| ActionError::InvalidPayload(format!("missing '{}'", path.join("."))))?;
    }
    current
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ActionError::InvalidPayload(format!("'{}' is not a string", path.join("."))))
}
