//! Configuration type definitions for paneplan.
//!
//! These types are deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! [defaults]
//! backend = "tmux"
//! window_mode = "new-window"
//!
//! [runtime]
//! pane_registration_attempts = 5
//! pane_registration_delay_ms = 100
//!
//! [presets.dev]
//! name = "Development"
//!
//! [presets.dev.layout]
//! type = "horizontal"
//! ratio = [3, 2]
//!
//! [[presets.dev.layout.panes]]
//! name = "editor"
//! command = "nvim"
//! focus = true
//!
//! [[presets.dev.layout.panes]]
//! name = "shell"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::errors::ConfigError;

/// Terminal multiplexer a layout is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Tmux,
    Wezterm,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Tmux, BackendKind::Wezterm];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Tmux => "tmux",
            BackendKind::Wezterm => "wezterm",
        }
    }

    /// Comma-separated list of accepted names, for error messages.
    pub fn supported_string() -> String {
        Self::ALL
            .iter()
            .map(|b| b.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tmux" => Ok(BackendKind::Tmux),
            "wezterm" => Ok(BackendKind::Wezterm),
            other => Err(format!(
                "unknown backend '{}' (expected one of: {})",
                other,
                Self::supported_string()
            )),
        }
    }
}

/// Whether a layout reuses the current window or opens a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowMode {
    NewWindow,
    CurrentWindow,
}

impl WindowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowMode::NewWindow => "new-window",
            WindowMode::CurrentWindow => "current-window",
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new-window" => Ok(WindowMode::NewWindow),
            "current-window" => Ok(WindowMode::CurrentWindow),
            other => Err(format!(
                "unknown window mode '{}' (expected new-window or current-window)",
                other
            )),
        }
    }
}

/// Main configuration loaded from TOML config files.
///
/// Loaded from `~/.paneplan/config.toml`, then `./.paneplan/config.toml`.
/// Project config values override user config values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaneplanConfig {
    /// Fallbacks used when neither the CLI nor the preset chooses.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Execution tunables.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Raw preset documents keyed by preset key.
    ///
    /// Kept untyped: the layout compiler owns validation and reports errors
    /// with the full path of the offending field.
    #[serde(default)]
    pub presets: BTreeMap<String, serde_json::Value>,

    /// File each preset was read from, for error messages.
    #[serde(skip)]
    pub preset_sources: BTreeMap<String, String>,
}

impl PaneplanConfig {
    /// Look up a raw preset by key.
    pub fn preset(&self, key: &str) -> Result<&serde_json::Value, ConfigError> {
        self.presets
            .get(key)
            .ok_or_else(|| ConfigError::PresetNotFound {
                key: key.to_string(),
                available: self.preset_keys().join(", "),
            })
    }

    /// Label of the file a preset came from, or `"config"` when unknown.
    pub fn preset_source(&self, key: &str) -> &str {
        self.preset_sources
            .get(key)
            .map(String::as_str)
            .unwrap_or("config")
    }

    /// Preset keys in sorted order.
    pub fn preset_keys(&self) -> Vec<String> {
        self.presets.keys().cloned().collect()
    }
}

/// Global defaults.
///
/// Fields are `Option<T>` so that only explicitly-set values override
/// lower-priority configs during merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,

    #[serde(default, alias = "windowMode", skip_serializing_if = "Option::is_none")]
    pub window_mode: Option<WindowMode>,
}

impl DefaultsConfig {
    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            backend: override_config.backend.or(base.backend),
            window_mode: override_config.window_mode.or(base.window_mode),
        }
    }
}

/// Execution tunables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// How many times to look for a freshly spawned pane before giving up.
    /// Default: 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane_registration_attempts: Option<u32>,

    /// Delay between pane registration attempts in milliseconds.
    /// Default: 100ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane_registration_delay_ms: Option<u64>,

    /// Longest dry-run summary line before truncation.
    /// Default: 120.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_max_chars: Option<usize>,
}

impl RuntimeConfig {
    pub fn pane_registration_attempts(&self) -> u32 {
        self.pane_registration_attempts
            .unwrap_or(defaults::DEFAULT_PANE_REGISTRATION_ATTEMPTS)
    }

    pub fn pane_registration_delay_ms(&self) -> u64 {
        self.pane_registration_delay_ms
            .unwrap_or(defaults::DEFAULT_PANE_REGISTRATION_DELAY_MS)
    }

    pub fn preview_max_chars(&self) -> usize {
        self.preview_max_chars
            .unwrap_or(defaults::DEFAULT_PREVIEW_MAX_CHARS)
    }

    pub fn merge(base: &Self, override_config: &Self) -> Self {
        Self {
            pane_registration_attempts: override_config
                .pane_registration_attempts
                .or(base.pane_registration_attempts),
            pane_registration_delay_ms: override_config
                .pane_registration_delay_ms
                .or(base.pane_registration_delay_ms),
            preview_max_chars: override_config
                .preview_max_chars
                .or(base.preview_max_chars),
        }
    }
}
