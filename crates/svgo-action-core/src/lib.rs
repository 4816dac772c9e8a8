//! SVGO Action core library
//!
//! The change-processing pipeline of the SVGO Action bot: classify the
//! changed files of an event, honour manual control markers, optimize the
//! SVGs and commit them back to the branch in a single atomic commit.

pub mod classify;
pub mod commit;
pub mod config;
pub mod domain;
pub mod encoder;
pub mod event;
pub mod manual_control;
pub mod obs;
pub mod optimize;
pub mod optimizer;
pub mod pipeline;
pub mod summary;
pub mod telemetry;
pub mod templating;

pub use classify::{classify, IgnoreGlob};
pub use config::{ActionConfig, ActionInputs, RawConfig, DEFAULT_CONFIG_PATH};
pub use domain::{
    ActionError, CommitError, ConfigError, DecodeError, FileOutcome, ManualControlState,
    OptimizationResult, OptimizeError, Result, RunOutcome, RunReport, Terminal,
};
pub use event::EventContext;
pub use manual_control::Markers;
pub use optimizer::{Optimizer, SvgoOptions, SvgoProcess, SvgoVersion, UnknownSvgoVersion};
pub use pipeline::Pipeline;
pub use telemetry::init_tracing;
