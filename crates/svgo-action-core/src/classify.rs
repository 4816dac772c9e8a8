//! Change classification.
//!
//! Reduces the changed files of an event to the SVG candidates the
//! optimizer should see.

use globset::{GlobBuilder, GlobMatcher};
use svgo_hosting::{ChangeStatus, FileChange};

use crate::domain::ConfigError;

const SVG_EXTENSION: &str = ".svg";

/// Compiled `ignore` pattern.
///
/// `*` does not cross `/`, so `foo/*` excludes `foo/a.svg` but not
/// `foo/bar/a.svg`.
#[derive(Debug, Clone)]
pub struct IgnoreGlob {
    pattern: String,
    matcher: GlobMatcher,
}

impl IgnoreGlob {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| ConfigError::InvalidGlob {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

/// Whether a single change is an optimization candidate.
pub fn is_candidate(change: &FileChange, ignore: Option<&IgnoreGlob>) -> bool {
    if change.status == ChangeStatus::Removed {
        return false;
    }
    if !change.path.ends_with(SVG_EXTENSION) {
        return false;
    }
    !ignore.map(|glob| glob.is_match(&change.path)).unwrap_or(false)
}

/// Keep the candidate SVGs of `changes`, in their original order.
pub fn classify(changes: &[FileChange], ignore: Option<&IgnoreGlob>) -> Vec<FileChange> {
    changes
        .iter()
        .filter(|change| is_candidate(change, ignore))
        .cloned()
        .collect()
}
