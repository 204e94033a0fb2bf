//! Plan execution engine: live application and preview share one code path for
//! sizing, template resolution and command construction.

pub mod dry_run;
pub mod engine;
pub mod errors;
mod terminal_setup;
pub mod types;

pub use dry_run::get_dry_run_steps;
pub use engine::apply_plan;
pub use errors::{ErrorCategory, ExecutionError};
pub use types::{
    AutoConfirm, ConfirmPrompt, DryRunStep, ExecutionOptions, ExecutionResult, ExecutionState,
    RetryPolicy, Sleeper, ThreadSleeper,
};
