use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("home directory not found: set $HOME environment variable")]
    HomeNotFound,
}

/// Centralized path construction for the `~/.paneplan/` directory layout.
///
/// Use `resolve()` in production code and `from_dir()` in tests.
#[derive(Debug, Clone)]
pub struct PaneplanPaths {
    base_dir: PathBuf,
}

impl PaneplanPaths {
    /// Resolve paths from the user's home directory (`~/.paneplan`).
    pub fn resolve() -> Result<Self, PathError> {
        let home = dirs::home_dir().ok_or(PathError::HomeNotFound)?;
        Ok(Self {
            base_dir: home.join(".paneplan"),
        })
    }

    /// Create paths from an explicit base directory. Use in tests.
    pub fn from_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// The base `~/.paneplan` directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn user_config(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    /// Project-level config: `<project_root>/.paneplan/config.toml`.
    pub fn project_config(project_root: &Path) -> PathBuf {
        project_root.join(".paneplan").join("config.toml")
    }
}
