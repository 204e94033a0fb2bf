use std::collections::BTreeMap;

use crate::errors::{ErrorPhase, PaneplanError};

/// What was wrong with a preset document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileErrorKind {
    #[error("expected a table")]
    NotATable,

    #[error("missing required field")]
    MissingField,

    #[error("expected {expected}")]
    InvalidType { expected: &'static str },

    #[error("value must not be empty")]
    EmptyValue,

    #[error("ratio has {ratio} entries but there are {panes} panes")]
    RatioPanesMismatch { ratio: usize, panes: usize },

    #[error("ratio entry must be a positive number, got {value}")]
    InvalidRatio { value: String },

    #[error("a split needs at least 2 panes, got {count}")]
    TooFewPanes { count: usize },

    #[error("'layout' and 'command' are mutually exclusive")]
    LayoutCommandConflict,

    #[error("unknown node type '{found}' (expected horizontal or vertical)")]
    UnknownNodeType { found: String },

    #[error("invalid value '{value}': {expected}")]
    InvalidValue { value: String, expected: String },
}

/// A preset failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{source_label}: {kind} at '{path}'")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// Dotted path of the offending field, e.g. `presets.dev.layout.panes[1].ratio[0]`.
    pub path: String,
    /// Where the preset came from (file path or other label).
    pub source_label: String,
}

impl PaneplanError for CompileError {
    fn error_code(&self) -> &'static str {
        match self.kind {
            CompileErrorKind::NotATable => "NOT_A_TABLE",
            CompileErrorKind::MissingField => "MISSING_FIELD",
            CompileErrorKind::InvalidType { .. } => "INVALID_FIELD_TYPE",
            CompileErrorKind::EmptyValue => "EMPTY_VALUE",
            CompileErrorKind::RatioPanesMismatch { .. } => "RATIO_PANES_MISMATCH",
            CompileErrorKind::InvalidRatio { .. } => "INVALID_RATIO",
            CompileErrorKind::TooFewPanes { .. } => "TOO_FEW_PANES",
            CompileErrorKind::LayoutCommandConflict => "LAYOUT_COMMAND_CONFLICT",
            CompileErrorKind::UnknownNodeType { .. } => "UNKNOWN_NODE_TYPE",
            CompileErrorKind::InvalidValue { .. } => "INVALID_VALUE",
        }
    }

    fn phase(&self) -> ErrorPhase {
        ErrorPhase::Compile
    }

    fn path(&self) -> Option<&str> {
        Some(&self.path)
    }

    fn details(&self) -> BTreeMap<&'static str, String> {
        let mut details = BTreeMap::new();
        details.insert("source", self.source_label.clone());
        match &self.kind {
            CompileErrorKind::RatioPanesMismatch { ratio, panes } => {
                details.insert("ratio_len", ratio.to_string());
                details.insert("panes_len", panes.to_string());
            }
            CompileErrorKind::InvalidRatio { value } => {
                details.insert("value", value.clone());
            }
            CompileErrorKind::InvalidValue { value, .. } => {
                details.insert("value", value.clone());
            }
            _ => {}
        }
        details
    }

    fn is_user_error(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_source_and_path() {
        let error = CompileError {
            kind: CompileErrorKind::RatioPanesMismatch { ratio: 3, panes: 2 },
            path: "presets.dev.layout".to_string(),
            source_label: "config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "config.toml: ratio has 3 entries but there are 2 panes at 'presets.dev.layout'"
        );
        assert_eq!(error.error_code(), "RATIO_PANES_MISMATCH");
        assert_eq!(error.details().get("ratio_len").map(String::as_str), Some("3"));
        assert!(error.is_user_error());
    }
}
