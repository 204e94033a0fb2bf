//! # paneplan-config
//!
//! TOML configuration types, loading, merging and validation for paneplan.
//!
//! Owns the backend and window-mode enums shared by the core and the CLI.
//! Depends only on `paneplan-paths`.

mod defaults;
mod loading;
mod validation;

pub mod errors;
pub mod types;

// Public API re-exports
pub use defaults::{
    DEFAULT_BACKEND, DEFAULT_PANE_REGISTRATION_ATTEMPTS, DEFAULT_PANE_REGISTRATION_DELAY_MS,
    DEFAULT_PREVIEW_MAX_CHARS, DEFAULT_WINDOW_MODE,
};
pub use errors::ConfigError;
pub use loading::{load_file, load_hierarchy, load_hierarchy_from, merge_configs, parse_config};
pub use types::{BackendKind, DefaultsConfig, PaneplanConfig, RuntimeConfig, WindowMode};
pub use validation::validate_config;

impl PaneplanConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
