use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use crate::executor::errors::ExecutionError;
use crate::plan::errors::{EmitError, PlanError};
use crate::preset::errors::CompileError;

/// Pipeline phase an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    Config,
    Compile,
    Plan,
    Emit,
    Execution,
}

impl ErrorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPhase::Config => "config",
            ErrorPhase::Compile => "compile",
            ErrorPhase::Plan => "plan",
            ErrorPhase::Emit => "emit",
            ErrorPhase::Execution => "execution",
        }
    }
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base trait for all paneplan errors
pub trait PaneplanError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Phase of the pipeline that produced the error
    fn phase(&self) -> ErrorPhase;

    /// Preset path, virtual pane ID or step ID the error points at
    fn path(&self) -> Option<&str> {
        None
    }

    /// Extra diagnostic key/value pairs
    fn details(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::new()
    }

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

impl PaneplanError for paneplan_config::ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            paneplan_config::ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            paneplan_config::ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            paneplan_config::ConfigError::PresetNotFound { .. } => "PRESET_NOT_FOUND",
            paneplan_config::ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn phase(&self) -> ErrorPhase {
        ErrorPhase::Config
    }

    fn path(&self) -> Option<&str> {
        match self {
            paneplan_config::ConfigError::ConfigParseError { source_label, .. } => {
                Some(source_label)
            }
            paneplan_config::ConfigError::PresetNotFound { key, .. } => Some(key),
            _ => None,
        }
    }

    fn is_user_error(&self) -> bool {
        !matches!(self, paneplan_config::ConfigError::IoError { .. })
    }
}

/// Any failure along the compile → plan → emit → execute pipeline.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Config(#[from] paneplan_config::ConfigError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl LayoutError {
    fn inner(&self) -> &dyn PaneplanError {
        match self {
            LayoutError::Config(e) => e,
            LayoutError::Compile(e) => e,
            LayoutError::Plan(e) => e,
            LayoutError::Emit(e) => e,
            LayoutError::Execution(e) => e,
        }
    }
}

impl PaneplanError for LayoutError {
    fn error_code(&self) -> &'static str {
        self.inner().error_code()
    }

    fn phase(&self) -> ErrorPhase {
        self.inner().phase()
    }

    fn path(&self) -> Option<&str> {
        self.inner().path()
    }

    fn details(&self) -> BTreeMap<&'static str, String> {
        self.inner().details()
    }

    fn is_user_error(&self) -> bool {
        self.inner().is_user_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::errors::PlanError;

    #[test]
    fn test_config_parse_error() {
        let error = paneplan_config::ConfigError::ConfigParseError {
            source_label: "config.toml".to_string(),
            message: "invalid TOML syntax".to_string(),
        };
        assert_eq!(error.error_code(), "CONFIG_PARSE_ERROR");
        assert_eq!(error.phase(), ErrorPhase::Config);
        assert_eq!(error.path(), Some("config.toml"));
        assert!(error.is_user_error());
    }

    #[test]
    fn test_layout_error_delegates_to_inner() {
        let error: LayoutError = PlanError::NoTerminalPanes.into();
        assert_eq!(error.error_code(), "NO_TERMINAL_PANES");
        assert_eq!(error.phase(), ErrorPhase::Plan);
        assert_eq!(error.to_string(), PlanError::NoTerminalPanes.to_string());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ErrorPhase::Execution.to_string(), "execution");
        assert_eq!(ErrorPhase::Compile.to_string(), "compile");
    }
}
