//! Backend and window-mode precedence: CLI override, then preset, then config defaults,
//! then the built-in default.

use paneplan_config::{BackendKind, DEFAULT_BACKEND, DEFAULT_WINDOW_MODE, DefaultsConfig, WindowMode};
use tracing::debug;

pub fn resolve_window_mode(
    cli_override: Option<WindowMode>,
    preset: Option<WindowMode>,
    defaults: &DefaultsConfig,
) -> WindowMode {
    let (mode, source) = pick(cli_override, preset, defaults.window_mode, DEFAULT_WINDOW_MODE);
    debug!(
        event = "core.selection.window_mode_resolved",
        window_mode = %mode,
        source = source
    );
    mode
}

pub fn resolve_backend(
    cli_override: Option<BackendKind>,
    preset: Option<BackendKind>,
    defaults: &DefaultsConfig,
) -> BackendKind {
    let (backend, source) = pick(cli_override, preset, defaults.backend, DEFAULT_BACKEND);
    debug!(
        event = "core.selection.backend_resolved",
        backend = %backend,
        source = source
    );
    backend
}

fn pick<T>(cli: Option<T>, preset: Option<T>, config: Option<T>, builtin: T) -> (T, &'static str) {
    if let Some(value) = cli {
        (value, "cli")
    } else if let Some(value) = preset {
        (value, "preset")
    } else if let Some(value) = config {
        (value, "config")
    } else {
        (builtin, "default")
    }
}
