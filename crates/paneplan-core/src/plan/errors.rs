use std::collections::BTreeMap;

use crate::errors::{ErrorPhase, PaneplanError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("Only one pane may set focus = true, found {}: {}", .paths.len(), .paths.join(", "))]
    MultipleFocusPanes { paths: Vec<String> },

    #[error("Layout contains no terminal panes")]
    NoTerminalPanes,
}

impl PaneplanError for PlanError {
    fn error_code(&self) -> &'static str {
        match self {
            PlanError::MultipleFocusPanes { .. } => "MULTIPLE_FOCUS_PANES",
            PlanError::NoTerminalPanes => "NO_TERMINAL_PANES",
        }
    }

    fn phase(&self) -> ErrorPhase {
        ErrorPhase::Plan
    }

    fn path(&self) -> Option<&str> {
        match self {
            PlanError::MultipleFocusPanes { paths } => paths.get(1).map(String::as_str),
            PlanError::NoTerminalPanes => None,
        }
    }

    fn details(&self) -> BTreeMap<&'static str, String> {
        let mut details = BTreeMap::new();
        if let PlanError::MultipleFocusPanes { paths } = self {
            details.insert("focus_panes", paths.join(", "));
        }
        details
    }

    fn is_user_error(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    #[error("Invalid split at '{path}': {message}")]
    InvalidSplit { path: String, message: String },

    #[error("Failed to serialize emission for hashing: {message}")]
    Serialization { message: String },
}

impl PaneplanError for EmitError {
    fn error_code(&self) -> &'static str {
        match self {
            EmitError::InvalidSplit { .. } => "INVALID_SPLIT",
            EmitError::Serialization { .. } => "EMISSION_SERIALIZATION_FAILED",
        }
    }

    fn phase(&self) -> ErrorPhase {
        ErrorPhase::Emit
    }

    fn path(&self) -> Option<&str> {
        match self {
            EmitError::InvalidSplit { path, .. } => Some(path),
            EmitError::Serialization { .. } => None,
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, EmitError::InvalidSplit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_focus_display_and_path() {
        let error = PlanError::MultipleFocusPanes {
            paths: vec!["root.0".to_string(), "root.1".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Only one pane may set focus = true, found 2: root.0, root.1"
        );
        assert_eq!(error.path(), Some("root.1"));
        assert_eq!(error.error_code(), "MULTIPLE_FOCUS_PANES");
        assert_eq!(error.phase(), ErrorPhase::Plan);
    }

    #[test]
    fn test_emit_error_codes_are_unique() {
        let codes = [
            EmitError::InvalidSplit {
                path: "root".to_string(),
                message: "x".to_string(),
            }
            .error_code(),
            EmitError::Serialization {
                message: "x".to_string(),
            }
            .error_code(),
        ];
        assert_ne!(codes[0], codes[1]);
    }
}
