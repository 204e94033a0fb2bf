use paneplan_config::BackendKind;

use crate::backends::runner::CommandOutput;
use crate::executor::errors::ExecutionError;
use crate::preset::Orientation;
use crate::sizing::SizeArgument;

/// Live extent of a pane in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneSize {
    pub cols: u32,
    pub rows: u32,
}

impl PaneSize {
    /// Cells along the axis a split of `orientation` divides.
    pub fn along(&self, orientation: Orientation) -> u32 {
        match orientation {
            Orientation::Horizontal => self.cols,
            Orientation::Vertical => self.rows,
        }
    }

    /// Copy of this size with the split axis replaced.
    pub fn with_along(self, orientation: Orientation, cells: u32) -> Self {
        match orientation {
            Orientation::Horizontal => Self { cols: cells, ..self },
            Orientation::Vertical => Self { rows: cells, ..self },
        }
    }
}

/// Multiplexer-specific operations used by the execution engine.
///
/// Argument builders return the arguments after the program name and never run anything,
/// so preview and live execution render identical commands.
pub trait MuxDriver {
    fn kind(&self) -> BackendKind;

    /// Executable name, e.g. `tmux`.
    fn program(&self) -> &'static str;

    /// Check the binary, its version and that we are inside a session.
    fn verify_environment(&self) -> Result<(), ExecutionError>;

    /// Real ID of the pane paneplan was started from.
    fn current_pane(&self) -> Result<String, ExecutionError>;

    /// Real IDs of every pane in the same window (tab) as `anchor`, including it.
    fn list_panes(&self, anchor: &str) -> Result<Vec<String>, ExecutionError>;

    fn pane_size(&self, pane: &str) -> Result<PaneSize, ExecutionError>;

    /// Open a new window and return the ID of its first pane as printed by the multiplexer.
    fn spawn_window(&self, name: Option<&str>) -> Result<String, ExecutionError>;

    /// Close `siblings`, keeping `keep`.
    fn close_panes(&self, keep: &str, siblings: &[String]) -> Result<(), ExecutionError>;

    fn split_args(&self, target: &str, orientation: Orientation, size: &SizeArgument) -> Vec<String>;

    fn focus_args(&self, pane: &str) -> Vec<String>;

    fn send_text_args(&self, pane: &str, text: &str) -> Vec<String>;

    fn title_args(&self, pane: &str, title: &str) -> Vec<String>;

    /// Whether a failed title command is only logged instead of aborting the run.
    fn title_is_best_effort(&self) -> bool {
        false
    }

    /// Run the program with `args`, failing on a non-zero exit.
    fn run(&self, args: &[String]) -> Result<CommandOutput, ExecutionError>;

    /// Full argument vector including the program name.
    fn argv(&self, args: Vec<String>) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.program().to_string());
        argv.extend(args);
        argv
    }

    /// Size of the current pane, if it can be determined without side effects.
    fn probe_current_size(&self) -> Option<PaneSize> {
        let pane = self.current_pane().ok()?;
        self.pane_size(&pane).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_selection() {
        let size = PaneSize { cols: 200, rows: 50 };
        assert_eq!(size.along(Orientation::Horizontal), 200);
        assert_eq!(size.along(Orientation::Vertical), 50);
        assert_eq!(
            size.with_along(Orientation::Vertical, 20),
            PaneSize { cols: 200, rows: 20 }
        );
    }
}
