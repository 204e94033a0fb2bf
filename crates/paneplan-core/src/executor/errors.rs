use std::collections::BTreeMap;

use crate::errors::{ErrorPhase, PaneplanError};

/// Broad classification used by callers to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The host is missing something (binary, version, session).
    Environment,
    /// The user declined a confirmation.
    Cancelled,
    /// The plan cannot be executed as written.
    Structural,
    /// A multiplexer subprocess failed or printed something unexpected.
    Process,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("'{binary}' is not installed or not in PATH")]
    MissingDependency { binary: String },

    #[error("{binary} {found} is not supported (requires {required} or newer)")]
    UnsupportedVersion {
        binary: String,
        found: String,
        required: String,
    },

    #[error("Not running inside a {backend} session: {message}")]
    NotInSession { backend: String, message: String },

    #[error("Cancelled by user")]
    UserCancelled,

    #[error("Pane '{pane_id}' did not register after {attempts} attempts")]
    PaneRegistrationTimeout { pane_id: String, attempts: u32 },

    #[error("Step '{step_id}' references unknown pane '{pane_id}'")]
    InvalidPane { step_id: String, pane_id: String },

    #[error(
        "Unresolved template token {{{{{token_kind}:{name}}}}} at '{path}' (known panes: {})",
        .known.join(", ")
    )]
    TemplateTokenUnresolved {
        path: String,
        token_kind: String,
        name: String,
        known: Vec<String>,
    },

    #[error("Cannot size split '{step_id}': {message}")]
    SplitSizeResolutionFailed { step_id: String, message: String },

    #[error("Invalid plan at step '{step_id}': {message}")]
    InvalidPlan { step_id: String, message: String },

    #[error("Split '{step_id}' did not produce a new pane")]
    SplitPaneNotFound { step_id: String },

    #[error("Command failed at '{path}': {command}: {stderr}")]
    TerminalCommandFailed {
        path: String,
        command: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Failed to spawn '{command}': {message}")]
    ProcessSpawnFailed {
        path: String,
        command: String,
        message: String,
    },

    #[error("Could not parse output of '{command}': {message}")]
    OutputParseFailed {
        path: String,
        command: String,
        message: String,
    },
}

impl ExecutionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExecutionError::MissingDependency { .. }
            | ExecutionError::UnsupportedVersion { .. }
            | ExecutionError::NotInSession { .. } => ErrorCategory::Environment,
            ExecutionError::UserCancelled => ErrorCategory::Cancelled,
            ExecutionError::PaneRegistrationTimeout { .. }
            | ExecutionError::InvalidPane { .. }
            | ExecutionError::TemplateTokenUnresolved { .. }
            | ExecutionError::SplitSizeResolutionFailed { .. }
            | ExecutionError::InvalidPlan { .. }
            | ExecutionError::SplitPaneNotFound { .. } => ErrorCategory::Structural,
            ExecutionError::TerminalCommandFailed { .. }
            | ExecutionError::ProcessSpawnFailed { .. }
            | ExecutionError::OutputParseFailed { .. } => ErrorCategory::Process,
        }
    }

    /// Attach the step or pane path a process failure happened at.
    pub(crate) fn at_path(self, at: &str) -> Self {
        match self {
            ExecutionError::TerminalCommandFailed {
                command,
                stderr,
                exit_code,
                ..
            } => ExecutionError::TerminalCommandFailed {
                path: at.to_string(),
                command,
                stderr,
                exit_code,
            },
            ExecutionError::ProcessSpawnFailed {
                command, message, ..
            } => ExecutionError::ProcessSpawnFailed {
                path: at.to_string(),
                command,
                message,
            },
            ExecutionError::OutputParseFailed {
                command, message, ..
            } => ExecutionError::OutputParseFailed {
                path: at.to_string(),
                command,
                message,
            },
            other => other,
        }
    }
}

impl PaneplanError for ExecutionError {
    fn error_code(&self) -> &'static str {
        match self {
            ExecutionError::MissingDependency { .. } => "MISSING_DEPENDENCY",
            ExecutionError::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            ExecutionError::NotInSession { .. } => "NOT_IN_SESSION",
            ExecutionError::UserCancelled => "USER_CANCELLED",
            ExecutionError::PaneRegistrationTimeout { .. } => "PANE_REGISTRATION_TIMEOUT",
            ExecutionError::InvalidPane { .. } => "INVALID_PANE",
            ExecutionError::TemplateTokenUnresolved { .. } => "TEMPLATE_TOKEN_UNRESOLVED",
            ExecutionError::SplitSizeResolutionFailed { .. } => "SPLIT_SIZE_RESOLUTION_FAILED",
            ExecutionError::InvalidPlan { .. } => "INVALID_PLAN",
            ExecutionError::SplitPaneNotFound { .. } => "SPLIT_PANE_NOT_FOUND",
            ExecutionError::TerminalCommandFailed { .. } => "TERMINAL_COMMAND_FAILED",
            ExecutionError::ProcessSpawnFailed { .. } => "PROCESS_SPAWN_FAILED",
            ExecutionError::OutputParseFailed { .. } => "OUTPUT_PARSE_FAILED",
        }
    }

    fn phase(&self) -> ErrorPhase {
        ErrorPhase::Execution
    }

    fn path(&self) -> Option<&str> {
        match self {
            ExecutionError::PaneRegistrationTimeout { pane_id, .. } => Some(pane_id),
            ExecutionError::InvalidPane { step_id, .. }
            | ExecutionError::SplitSizeResolutionFailed { step_id, .. }
            | ExecutionError::InvalidPlan { step_id, .. }
            | ExecutionError::SplitPaneNotFound { step_id } => Some(step_id),
            ExecutionError::TemplateTokenUnresolved { path, .. } => Some(path),
            // Process failures outside any step carry no path.
            ExecutionError::TerminalCommandFailed { path, .. }
            | ExecutionError::ProcessSpawnFailed { path, .. }
            | ExecutionError::OutputParseFailed { path, .. } => {
                Some(path.as_str()).filter(|p| !p.is_empty())
            }
            _ => None,
        }
    }

    fn details(&self) -> BTreeMap<&'static str, String> {
        let mut details = BTreeMap::new();
        match self {
            ExecutionError::InvalidPane { pane_id, .. } => {
                details.insert("pane_id", pane_id.clone());
            }
            ExecutionError::TemplateTokenUnresolved {
                token_kind,
                name,
                known,
                ..
            } => {
                details.insert("token", token_kind.clone());
                details.insert("name", name.clone());
                details.insert("known", known.join(", "));
            }
            ExecutionError::TerminalCommandFailed {
                command,
                stderr,
                exit_code,
                ..
            } => {
                details.insert("command", command.clone());
                details.insert("stderr", stderr.clone());
                if let Some(code) = exit_code {
                    details.insert("exit_code", code.to_string());
                }
            }
            ExecutionError::UnsupportedVersion {
                found, required, ..
            } => {
                details.insert("found", found.clone());
                details.insert("required", required.clone());
            }
            ExecutionError::ProcessSpawnFailed { command, message, .. }
            | ExecutionError::OutputParseFailed { command, message, .. } => {
                details.insert("command", command.clone());
                details.insert("message", message.clone());
            }
            _ => {}
        }
        details
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Environment | ErrorCategory::Cancelled
        ) || matches!(self, ExecutionError::TemplateTokenUnresolved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_error_lists_known_names() {
        let error = ExecutionError::TemplateTokenUnresolved {
            path: "root.1".to_string(),
            token_kind: "pane_id".to_string(),
            name: "missing".to_string(),
            known: vec!["editor".to_string(), "shell".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Unresolved template token {{pane_id:missing}} at 'root.1' (known panes: editor, shell)"
        );
        assert_eq!(error.error_code(), "TEMPLATE_TOKEN_UNRESOLVED");
        assert_eq!(error.path(), Some("root.1"));
        assert_eq!(error.category(), ErrorCategory::Structural);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ExecutionError::PaneRegistrationTimeout {
                pane_id: "%3".to_string(),
                attempts: 5
            }
            .category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            ExecutionError::UserCancelled.category(),
            ErrorCategory::Cancelled
        );
        assert_eq!(
            ExecutionError::MissingDependency {
                binary: "tmux".to_string()
            }
            .category(),
            ErrorCategory::Environment
        );
        assert_eq!(
            ExecutionError::ProcessSpawnFailed {
                path: String::new(),
                command: "tmux".to_string(),
                message: "denied".to_string()
            }
            .category(),
            ErrorCategory::Process
        );
    }

    #[test]
    fn test_at_path_only_touches_process_failures() {
        let failed = ExecutionError::TerminalCommandFailed {
            path: String::new(),
            command: "tmux split-window".to_string(),
            stderr: "no space for new pane".to_string(),
            exit_code: Some(1),
        }
        .at_path("split:root.1");
        assert_eq!(failed.path(), Some("split:root.1"));
        assert_eq!(
            failed.details().get("stderr").map(String::as_str),
            Some("no space for new pane")
        );

        let cancelled = ExecutionError::UserCancelled.at_path("split:root.1");
        assert_eq!(cancelled, ExecutionError::UserCancelled);
    }

    #[test]
    fn test_at_path_fills_parse_and_spawn_failures() {
        let parse = ExecutionError::OutputParseFailed {
            path: String::new(),
            command: "tmux display-message".to_string(),
            message: "expected '<width> <height>', got 'garbage'".to_string(),
        };
        assert_eq!(parse.path(), None);

        let parse = parse.at_path("split:root.1");
        assert_eq!(parse.path(), Some("split:root.1"));
        assert_eq!(
            parse.details().get("command").map(String::as_str),
            Some("tmux display-message")
        );

        let spawn = ExecutionError::ProcessSpawnFailed {
            path: String::new(),
            command: "wezterm".to_string(),
            message: "permission denied".to_string(),
        }
        .at_path("root.0");
        assert_eq!(spawn.path(), Some("root.0"));
    }

    #[test]
    fn test_command_failure_outside_step_has_no_path() {
        let failed = ExecutionError::TerminalCommandFailed {
            path: String::new(),
            command: "tmux kill-pane -a -t %0".to_string(),
            stderr: "no server".to_string(),
            exit_code: Some(1),
        };
        assert_eq!(failed.path(), None);
    }
}
