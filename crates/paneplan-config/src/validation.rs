//! Configuration validation logic.
//!
//! Preset bodies are validated by the layout compiler; this module only checks
//! the surrounding configuration.

use crate::errors::ConfigError;
use crate::types::PaneplanConfig;

/// Validate a PaneplanConfig, returning an error if any values are invalid.
///
/// # Validation Rules
///
/// - `runtime.pane_registration_attempts` must be at least 1
/// - `runtime.preview_max_chars` must be at least 1
/// - Preset keys must be non-empty and contain no whitespace
pub fn validate_config(config: &PaneplanConfig) -> Result<(), ConfigError> {
    if config.runtime.pane_registration_attempts() == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "runtime.pane_registration_attempts must be at least 1".to_string(),
        });
    }

    if config.runtime.preview_max_chars() == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "runtime.preview_max_chars must be at least 1".to_string(),
        });
    }

    if let Some(key) = config
        .presets
        .keys()
        .find(|key| key.is_empty() || key.chars().any(char::is_whitespace))
    {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "Invalid preset key '{}': keys must be non-empty and contain no whitespace",
                key
            ),
        });
    }

    Ok(())
}
