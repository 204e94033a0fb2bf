//! Built-in fallback values for optional configuration fields.

use crate::types::{BackendKind, WindowMode};

/// Attempts made while waiting for a freshly spawned pane to show up in the
/// multiplexer's pane inventory.
pub const DEFAULT_PANE_REGISTRATION_ATTEMPTS: u32 = 5;

/// Delay between pane registration attempts.
pub const DEFAULT_PANE_REGISTRATION_DELAY_MS: u64 = 100;

/// Longest dry-run summary line before it is truncated.
pub const DEFAULT_PREVIEW_MAX_CHARS: usize = 120;

pub const DEFAULT_BACKEND: BackendKind = BackendKind::Tmux;

pub const DEFAULT_WINDOW_MODE: WindowMode = WindowMode::NewWindow;
