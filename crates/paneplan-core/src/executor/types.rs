use std::fmt;
use std::time::Duration;

use paneplan_config::{BackendKind, RuntimeConfig};
use serde::Serialize;

use crate::escape::render_command_line;

/// Lifecycle of one `apply_plan` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    EnvironmentVerified,
    PaneMapSeeded,
    /// Number of split steps executed so far.
    StepExecuted(usize),
    TerminalsConfigured,
    Done,
    Aborted,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionState::Idle => write!(f, "idle"),
            ExecutionState::EnvironmentVerified => write!(f, "environment_verified"),
            ExecutionState::PaneMapSeeded => write!(f, "pane_map_seeded"),
            ExecutionState::StepExecuted(n) => write!(f, "step_executed({n})"),
            ExecutionState::TerminalsConfigured => write!(f, "terminals_configured"),
            ExecutionState::Done => write!(f, "done"),
            ExecutionState::Aborted => write!(f, "aborted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Split steps that created a pane.
    pub executed_steps: usize,
    /// Real ID of the pane left focused.
    pub focus_pane_id: Option<String>,
}

/// One line of a preview: what would run, and a human summary of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DryRunStep {
    pub backend: BackendKind,
    pub summary: String,
    pub command: Vec<String>,
}

impl DryRunStep {
    pub fn command_line(&self) -> String {
        render_command_line(&self.command)
    }
}

/// Bounded polling used while waiting for a spawned pane to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_runtime(runtime: &RuntimeConfig) -> Self {
        Self {
            attempts: runtime.pane_registration_attempts().max(1),
            delay: Duration::from_millis(runtime.pane_registration_delay_ms()),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_runtime(&RuntimeConfig::default())
    }
}

/// Blocking wait, injectable so tests never sleep.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Asks the user before destructive actions such as closing existing panes.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

/// Answers every prompt with yes (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ConfirmPrompt for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Runtime collaborators and tunables for one execution.
#[derive(Clone, Copy)]
pub struct ExecutionOptions<'a> {
    pub retry: RetryPolicy,
    pub preview_max_chars: usize,
    pub sleeper: &'a dyn Sleeper,
    pub prompt: &'a dyn ConfirmPrompt,
}

impl<'a> ExecutionOptions<'a> {
    pub fn new(
        runtime: &RuntimeConfig,
        sleeper: &'a dyn Sleeper,
        prompt: &'a dyn ConfirmPrompt,
    ) -> Self {
        Self {
            retry: RetryPolicy::from_runtime(runtime),
            preview_max_chars: runtime.preview_max_chars(),
            sleeper,
            prompt,
        }
    }
}

impl fmt::Debug for ExecutionOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("retry", &self.retry)
            .field("preview_max_chars", &self.preview_max_chars)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.delay, Duration::from_millis(100));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ExecutionState::StepExecuted(2).to_string(), "step_executed(2)");
        assert_eq!(ExecutionState::Aborted.to_string(), "aborted");
    }
}
