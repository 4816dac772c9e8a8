//! Optimizer capability and the SVGO process engine.
//!
//! The pipeline only sees [`Optimizer`]. [`SvgoProcess`] implements it by
//! piping each SVG through an `svgo` CLI started with `npx`.

use std::io::Write;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::domain::OptimizeError;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Opaque SVG minimizer.
#[async_trait]
pub trait Optimizer: Send + Sync {
    /// Optimize `svg`. Returns [`OptimizeError::InvalidSvg`] when the content
    /// is rejected and [`OptimizeError::Engine`] when the engine is unusable.
    async fn optimize(&self, svg: &str) -> Result<String, OptimizeError>;
}

/// Which SVGO engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvgoVersion {
    V1,
    V2,
    V3,
    Latest,
    /// The `svgo` installed in the repository's own `node_modules`.
    Project,
}

impl Default for SvgoVersion {
    fn default() -> Self {
        SvgoVersion::V2
    }
}

/// An `svgo-version` value outside `1`, `2`, `3`, `latest` and `project`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported svgo-version '{0}'")]
pub struct UnknownSvgoVersion(pub String);

impl FromStr for SvgoVersion {
    type Err = UnknownSvgoVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(SvgoVersion::V1),
            "2" => Ok(SvgoVersion::V2),
            "3" => Ok(SvgoVersion::V3),
            "latest" => Ok(SvgoVersion::Latest),
            "project" => Ok(SvgoVersion::Project),
            other => Err(UnknownSvgoVersion(other.to_string())),
        }
    }
}

impl SvgoVersion {
    fn npx_args(&self) -> Vec<String> {
        let package = match self {
            SvgoVersion::V1 => "svgo@1",
            SvgoVersion::V2 => "svgo@2",
            SvgoVersion::V3 => "svgo@3",
            SvgoVersion::Latest => "svgo@latest",
            SvgoVersion::Project => {
                return vec!["--no-install".to_string(), "svgo".to_string()];
            }
        };
        vec![
            "--yes".to_string(),
            "--package".to_string(),
            package.to_string(),
            "svgo".to_string(),
        ]
    }
}

/// Optimizer options fetched from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgoOptions {
    /// Repository path the options came from; its extension is kept so SVGO
    /// can tell a `.js` config from a `.yml` one.
    pub path: String,
    pub content: String,
}

impl SvgoOptions {
    fn suffix(&self) -> String {
        std::path::Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default()
    }
}

/// SVGO CLI engine.
///
/// Each call spawns one process reading the SVG on stdin and writing the
/// result on stdout. A non-zero exit is a content rejection; failing to
/// spawn or timing out is an engine failure.
#[derive(Debug)]
pub struct SvgoProcess {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    // Held so the file lives as long as the engine.
    _config_file: Option<NamedTempFile>,
}

impl SvgoProcess {
    /// Build an engine for `version`, writing `options` to a temporary
    /// config file when present.
    pub fn new(version: SvgoVersion, options: Option<&SvgoOptions>) -> Result<Self, OptimizeError> {
        let mut args = version.npx_args();
        args.extend(["--input", "-", "--output", "-"].map(String::from));

        let config_file = match options {
            Some(options) => {
                let mut file = tempfile::Builder::new()
                    .prefix("svgo-options-")
                    .suffix(&options.suffix())
                    .tempfile()
                    .map_err(|e| OptimizeError::Engine(format!("cannot stage options: {e}")))?;
                file.write_all(options.content.as_bytes())
                    .map_err(|e| OptimizeError::Engine(format!("cannot stage options: {e}")))?;
                args.push("--config".to_string());
                args.push(file.path().to_string_lossy().to_string());
                Some(file)
            }
            None => None,
        };

        Ok(Self {
            program: "npx".to_string(),
            args,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            _config_file: config_file,
        })
    }

    /// Engine running an arbitrary stdin-to-stdout filter.
    pub fn with_command(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            _config_file: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments that will be executed.
    pub fn command_line(&self) -> Vec<String> {
        let mut line = vec![self.program.clone()];
        line.extend(self.args.iter().cloned());
        line
    }
}

#[async_trait]
impl Optimizer for SvgoProcess {
    async fn optimize(&self, svg: &str) -> Result<String, OptimizeError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OptimizeError::Engine(format!("failed to run {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = svg.to_string();
            tokio::spawn(async move {
                // A closed pipe means the engine exited early; its exit status reports why.
                let _ = stdin.write_all(input.as_bytes()).await;
            });
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                OptimizeError::Engine(format!(
                    "timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| OptimizeError::Engine(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(exit_code = ?output.status.code(), %stderr, "svgo rejected input");
            return Err(OptimizeError::InvalidSvg(if stderr.is_empty() {
                "optimizer exited with an error".to_string()
            } else {
                stderr
            }));
        }

        let optimized = String::from_utf8(output.stdout)
            .map_err(|_| OptimizeError::InvalidSvg("optimizer produced non UTF-8 output".into()))?;
        if optimized.trim().is_empty() {
            return Err(OptimizeError::InvalidSvg("optimizer produced no output".into()));
        }
        Ok(optimized)
    }
}
