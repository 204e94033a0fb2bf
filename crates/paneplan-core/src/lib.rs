//! paneplan-core: layout compiler and execution engine for terminal multiplexers
//!
//! A preset document is compiled into a flat, hashed sequence of split and focus steps
//! which is then either previewed or executed against tmux or WezTerm.
//!
//! # Main Entry Points
//!
//! - [`handler`] - Compile/plan/emit a preset, preview it or apply it
//! - [`preset`] - Preset validation into [`CompiledPreset`]
//! - [`plan`] - Virtual pane IDs and step emission
//! - [`executor`] - Dry-run rendering and live execution
//! - [`backends`] - tmux and WezTerm drivers

pub mod backends;
pub mod errors;
pub mod escape;
pub mod executor;
pub mod handler;
pub mod logging;
pub mod panes;
pub mod plan;
pub mod preset;
pub mod ratio;
pub mod selection;
pub mod sizing;
pub mod test_support;

pub use backends::{Backend, CommandRunner, SystemRunner};
pub use errors::{ErrorPhase, LayoutError, PaneplanError};
pub use executor::{
    AutoConfirm, ConfirmPrompt, DryRunStep, ErrorCategory, ExecutionError, ExecutionOptions,
    ExecutionResult, Sleeper, ThreadSleeper,
};
pub use plan::{CommandStep, LayoutPlan, PlanEmission, SplitSizing};
pub use preset::{CompiledPreset, LayoutNode, Orientation, WeightSpec};
pub use ratio::normalize_ratio;

// Re-export config types from paneplan-config
pub use paneplan_config::{BackendKind, ConfigError, PaneplanConfig, WindowMode};

// Re-export handler module as the primary API
pub use handler as layout_ops;

// Re-export logging initialization
pub use logging::init_logging;
