//! Log output for the `svgo-action` binary.
//!
//! The GitHub Actions runner captures stdout/stderr into the step log, so
//! plain lines are the default. `RUNNER_DEBUG` (re-run with debug logging)
//! maps to `DEBUG` through the CLI's `--verbose` flag and `RUST_LOG` still
//! wins when set. Only the first [`init_tracing`] call installs a subscriber.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, JSON lines when `json` is set.
///
/// The step log viewer prints escape codes verbatim, so colours are only
/// used outside a runner (`GITHUB_ACTIONS` unset).
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let on_runner = std::env::var_os("GITHUB_ACTIONS").is_some();

    let json_layer = json.then(|| fmt::layer().with_target(false).json());
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .without_time()
            .with_ansi(!on_runner)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .ok();
}
