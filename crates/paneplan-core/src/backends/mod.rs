//! Multiplexer backends.
//!
//! [`Backend`] is the closed set of supported multiplexers. Each variant wraps a
//! [`MuxDriver`] that knows the multiplexer's command surface and talks to it through a
//! [`CommandRunner`].

pub mod runner;
pub mod tmux;
pub mod traits;
pub mod wezterm;

use paneplan_config::{BackendKind, WindowMode};
use tracing::debug;

use crate::executor::{
    DryRunStep, ExecutionError, ExecutionOptions, ExecutionResult, apply_plan, get_dry_run_steps,
};
use crate::plan::PlanEmission;

pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use tmux::TmuxDriver;
pub use traits::{MuxDriver, PaneSize};
pub use wezterm::WeztermDriver;

pub enum Backend<R: CommandRunner = SystemRunner> {
    Tmux(TmuxDriver<R>),
    Wezterm(WeztermDriver<R>),
}

impl Backend<SystemRunner> {
    /// Backend that runs real processes.
    pub fn system(kind: BackendKind) -> Self {
        Self::new(kind, SystemRunner)
    }
}

impl<R: CommandRunner> Backend<R> {
    pub fn new(kind: BackendKind, runner: R) -> Self {
        debug!(event = "core.backend.selected", backend = %kind);
        match kind {
            BackendKind::Tmux => Backend::Tmux(TmuxDriver::new(runner)),
            BackendKind::Wezterm => Backend::Wezterm(WeztermDriver::new(runner)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.driver().kind()
    }

    fn driver(&self) -> &dyn MuxDriver {
        match self {
            Backend::Tmux(driver) => driver,
            Backend::Wezterm(driver) => driver,
        }
    }

    /// Check binary, version and session before any state is changed.
    pub fn verify_environment(&self) -> Result<(), ExecutionError> {
        self.driver().verify_environment()
    }

    pub fn apply_plan(
        &self,
        emission: &PlanEmission,
        window_mode: WindowMode,
        window_name: Option<&str>,
        options: &ExecutionOptions<'_>,
    ) -> Result<ExecutionResult, ExecutionError> {
        apply_plan(self.driver(), emission, window_mode, window_name, options)
    }

    pub fn get_dry_run_steps(
        &self,
        emission: &PlanEmission,
        options: &ExecutionOptions<'_>,
    ) -> Result<Vec<DryRunStep>, ExecutionError> {
        get_dry_run_steps(self.driver(), emission, options)
    }
}
