//! SVGO Action - optimize the SVGs of a pull request or push
//!
//! The `svgo-action` binary runs as a GitHub Actions step. Action inputs
//! arrive as `INPUT_*` environment variables (or the matching flags), the
//! triggering event as `GITHUB_EVENT_NAME` and `GITHUB_EVENT_PATH`.
//!
//! Outputs `DID_OPTIMIZE`, `OPTIMIZED_COUNT`, `SKIPPED_COUNT` and
//! `SVG_COUNT` are appended to `GITHUB_OUTPUT`.

mod outputs;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use svgo_action_core::config::load_svgo_options;
use svgo_action_core::{
    init_tracing, ActionConfig, ActionInputs, EventContext, Pipeline, SvgoProcess,
    DEFAULT_CONFIG_PATH,
};
use svgo_hosting::{GitHubClient, GitHubConfig, HostingApi};
use tracing::{error, info, Level};

#[derive(Parser, Debug)]
#[command(name = "svgo-action")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Optimize SVGs changed by a pull request or push with SVGO", long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, env = "RUNNER_DEBUG")]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Token used to authenticate against the GitHub API
    #[arg(long, env = "INPUT_REPO-TOKEN", hide_env_values = true)]
    repo_token: String,

    /// Path of the YAML configuration file in the repository
    #[arg(long, env = "INPUT_CONFIGURATION-PATH", default_value = DEFAULT_CONFIG_PATH)]
    configuration_path: String,

    /// Optimize but do not commit or comment (true/false)
    #[arg(long, env = "INPUT_DRY-RUN")]
    dry_run: Option<String>,

    /// Glob of paths to leave alone
    #[arg(long, env = "INPUT_IGNORE")]
    ignore: Option<String>,

    /// `false`, `true`, or a comment template
    #[arg(long, env = "INPUT_COMMENT")]
    comment: Option<String>,

    /// Commit title template
    #[arg(long, env = "INPUT_COMMIT-TITLE")]
    commit_title: Option<String>,

    /// Commit body template
    #[arg(long, env = "INPUT_COMMIT-BODY")]
    commit_body: Option<String>,

    /// Path of the SVGO options file in the repository
    #[arg(long, env = "INPUT_SVGO-OPTIONS")]
    svgo_options: Option<String>,

    /// SVGO engine: 1, 2, 3, latest or project
    #[arg(long, env = "INPUT_SVGO-VERSION")]
    svgo_version: Option<String>,

    /// Marker that switches the action on
    #[arg(long, env = "INPUT_ENABLE-MARKER")]
    enable_marker: Option<String>,

    /// Marker that switches the action off
    #[arg(long, env = "INPUT_DISABLE-MARKER")]
    disable_marker: Option<String>,

    /// Maximum number of files optimized at once
    #[arg(long, env = "INPUT_MAX-CONCURRENCY")]
    max_concurrency: Option<String>,

    /// Name of the triggering event
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: String,

    /// Path of the JSON webhook payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: PathBuf,

    /// Repository as `owner/name`
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    api_url: String,

    /// File the run outputs are appended to
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,
}

impl Cli {
    fn inputs(&self) -> Result<ActionInputs> {
        let dry_run = match set(&self.dry_run) {
            Some(value) => Some(parse_bool(&value).context("invalid dry-run input")?),
            None => None,
        };
        let max_concurrency = match set(&self.max_concurrency) {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("invalid max-concurrency input '{value}'"))?,
            ),
            None => None,
        };
        Ok(ActionInputs {
            dry_run,
            ignore: set(&self.ignore),
            comment: set(&self.comment),
            commit_title: set(&self.commit_title),
            commit_body: set(&self.commit_body),
            svgo_options: set(&self.svgo_options),
            svgo_version: set(&self.svgo_version),
            enable_marker: set(&self.enable_marker),
            disable_marker: set(&self.disable_marker),
            max_concurrency,
        })
    }
}

/// The runner passes unset inputs as empty strings.
fn set(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => anyhow::bail!("expected true or false, got '{other}'"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("action failed with error '{err:#}'");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let payload = std::fs::read_to_string(&cli.event_path)
        .with_context(|| format!("failed to read event payload {}", cli.event_path.display()))?;
    let payload: Value = serde_json::from_str(&payload).context("event payload is not JSON")?;
    let event = EventContext::from_payload(&cli.event_name, &payload)?;
    let inputs = cli.inputs()?;

    let github = GitHubConfig::new(&cli.repository, &cli.repo_token).with_api_url(&cli.api_url);
    let api: Arc<dyn HostingApi> =
        Arc::new(GitHubClient::new(github).context("failed to build GitHub client")?);

    let config =
        ActionConfig::load(api.as_ref(), &inputs, &cli.configuration_path, event.head_sha())
            .await?;
    if config.dry_run {
        info!("Dry mode enabled, no changes will be committed");
    }

    let options = load_svgo_options(api.as_ref(), &config.svgo_options_path, event.head_sha())
        .await?;
    let optimizer = SvgoProcess::new(config.svgo_version, options.as_ref())?;

    let report = Pipeline::new(api, Arc::new(optimizer))
        .run(&event, &config)
        .await?;

    outputs::write_outputs(cli.output_file.as_deref(), &report.outcome)
}
