//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.paneplan/config.toml`
//! 3. **Project config** - `./.paneplan/config.toml`
//!
//! An explicit config file (`--config`) replaces the hierarchy entirely.

use std::fs;
use std::path::Path;

use paneplan_paths::PaneplanPaths;
use tracing::debug;

use crate::errors::ConfigError;
use crate::types::{DefaultsConfig, PaneplanConfig, RuntimeConfig};
use crate::validation::validate_config;

/// Load configuration from the user and project config files.
///
/// Missing config files are not errors; parse and validation failures are.
pub fn load_hierarchy() -> Result<PaneplanConfig, ConfigError> {
    let paths = PaneplanPaths::resolve().map_err(|e| ConfigError::InvalidConfiguration {
        message: e.to_string(),
    })?;
    let project_root = std::env::current_dir()?;
    load_hierarchy_from(&paths, &project_root)
}

/// Load the hierarchy using explicit base paths. Use in tests.
pub fn load_hierarchy_from(
    paths: &PaneplanPaths,
    project_root: &Path,
) -> Result<PaneplanConfig, ConfigError> {
    let mut config = PaneplanConfig::default();

    for path in [
        paths.user_config(),
        PaneplanPaths::project_config(project_root),
    ] {
        match load_optional_file(&path)? {
            Some(layer) => {
                debug!(
                    event = "config.layer_loaded",
                    path = %path.display(),
                    presets = layer.presets.len()
                );
                config = merge_configs(config, layer);
            }
            None => {
                debug!(event = "config.layer_missing", path = %path.display());
            }
        }
    }

    validate_config(&config)?;
    Ok(config)
}

/// Load a single config file. The file must exist.
pub fn load_file(path: &Path) -> Result<PaneplanConfig, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| std::io::Error::new(e.kind(), format!("'{}': {}", path.display(), e)))?;
    let config = parse_config(&content, &path.display().to_string())?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse TOML config text. `source_label` is used only in error messages.
pub fn parse_config(content: &str, source_label: &str) -> Result<PaneplanConfig, ConfigError> {
    let mut config: PaneplanConfig =
        toml::from_str(content).map_err(|e| ConfigError::ConfigParseError {
            source_label: source_label.to_string(),
            message: e.to_string(),
        })?;
    config.preset_sources = config
        .presets
        .keys()
        .map(|key| (key.clone(), source_label.to_string()))
        .collect();
    Ok(config)
}

fn load_optional_file(path: &Path) -> Result<Option<PaneplanConfig>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content, &path.display().to_string()).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::IoError { source: e }),
    }
}

/// Merge two configurations, with `override_config` taking precedence.
///
/// Presets are replaced whole by key; `[defaults]` and `[runtime]` merge field by field.
pub fn merge_configs(base: PaneplanConfig, override_config: PaneplanConfig) -> PaneplanConfig {
    PaneplanConfig {
        defaults: DefaultsConfig::merge(&base.defaults, &override_config.defaults),
        runtime: RuntimeConfig::merge(&base.runtime, &override_config.runtime),
        presets: {
            let mut merged = base.presets;
            for (key, value) in override_config.presets {
                merged.insert(key, value);
            }
            merged
        },
        preset_sources: {
            let mut merged = base.preset_sources;
            merged.extend(override_config.preset_sources);
            merged
        },
    }
}
