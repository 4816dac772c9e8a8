//! Domain types for SVGO Action runs.

pub mod error;
pub mod run;

pub use error::{
    ActionError, CommitError, ConfigError, DecodeError, OptimizeError, Result, TemplateError,
};
pub use run::{
    CommitPlan, FileOutcome, ManualControlState, OptimizationResult, PlannedFile, RunOutcome,
    RunReport, Terminal, OUTPUT_DID_OPTIMIZE, OUTPUT_OPTIMIZED_COUNT, OUTPUT_SKIPPED_COUNT,
    OUTPUT_SVG_COUNT,
};
