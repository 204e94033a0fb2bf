//! tmux driver.

use paneplan_config::BackendKind;
use tracing::{debug, warn};

use crate::backends::runner::{CommandOutput, CommandRunner, run_checked};
use crate::backends::traits::{MuxDriver, PaneSize};
use crate::executor::errors::ExecutionError;
use crate::preset::Orientation;
use crate::sizing::SizeArgument;

const PROGRAM: &str = "tmux";
/// `split-window -l N%` needs tmux 3.1.
const MIN_VERSION: (u32, u32) = (3, 1);
const PANE_ID_FORMAT: &str = "#{pane_id}";

pub struct TmuxDriver<R> {
    runner: R,
}

impl<R: CommandRunner> TmuxDriver<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn query(&self, args: &[&str]) -> Result<CommandOutput, ExecutionError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.run(&args)
    }
}

impl<R: CommandRunner> MuxDriver for TmuxDriver<R> {
    fn kind(&self) -> BackendKind {
        BackendKind::Tmux
    }

    fn program(&self) -> &'static str {
        PROGRAM
    }

    fn verify_environment(&self) -> Result<(), ExecutionError> {
        if self.runner.locate(PROGRAM).is_none() {
            return Err(ExecutionError::MissingDependency {
                binary: PROGRAM.to_string(),
            });
        }

        if self.runner.env_var("TMUX").is_none() {
            return Err(ExecutionError::NotInSession {
                backend: PROGRAM.to_string(),
                message: "$TMUX is not set; start paneplan from inside tmux".to_string(),
            });
        }

        let output = self.query(&["-V"])?;
        let raw = output.stdout.trim();
        match parse_tmux_version(raw) {
            Some(version) if version < MIN_VERSION => {
                return Err(ExecutionError::UnsupportedVersion {
                    binary: PROGRAM.to_string(),
                    found: raw.to_string(),
                    required: format!("{}.{}", MIN_VERSION.0, MIN_VERSION.1),
                });
            }
            Some(_) => {}
            None => warn!(
                event = "core.backend.tmux_version_unparsed",
                output = raw,
                "Could not parse tmux version, assuming a development build"
            ),
        }

        debug!(event = "core.backend.tmux_verify_completed", version = raw);
        Ok(())
    }

    fn current_pane(&self) -> Result<String, ExecutionError> {
        if let Some(pane) = self.runner.env_var("TMUX_PANE") {
            return Ok(pane);
        }
        let output = self.query(&["display-message", "-p", PANE_ID_FORMAT])?;
        output
            .last_line()
            .map(str::to_string)
            .ok_or_else(|| ExecutionError::OutputParseFailed {
                path: String::new(),
                command: "tmux display-message".to_string(),
                message: "no pane ID printed".to_string(),
            })
    }

    fn list_panes(&self, anchor: &str) -> Result<Vec<String>, ExecutionError> {
        let output = self.query(&["list-panes", "-t", anchor, "-F", PANE_ID_FORMAT])?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn pane_size(&self, pane: &str) -> Result<PaneSize, ExecutionError> {
        let output = self.query(&[
            "display-message",
            "-p",
            "-t",
            pane,
            "#{pane_width} #{pane_height}",
        ])?;
        parse_tmux_size(output.stdout.trim()).ok_or_else(|| ExecutionError::OutputParseFailed {
            path: String::new(),
            command: "tmux display-message".to_string(),
            message: format!("expected '<width> <height>', got '{}'", output.stdout.trim()),
        })
    }

    fn spawn_window(&self, name: Option<&str>) -> Result<String, ExecutionError> {
        let mut args = vec!["new-window", "-P", "-F", PANE_ID_FORMAT];
        if let Some(name) = name {
            args.extend(["-n", name]);
        }
        let output = self.query(&args)?;
        output
            .last_line()
            .map(str::to_string)
            .ok_or_else(|| ExecutionError::OutputParseFailed {
                path: String::new(),
                command: "tmux new-window".to_string(),
                message: "no pane ID printed".to_string(),
            })
    }

    fn close_panes(&self, keep: &str, siblings: &[String]) -> Result<(), ExecutionError> {
        if siblings.is_empty() {
            return Ok(());
        }
        self.query(&["kill-pane", "-a", "-t", keep])?;
        Ok(())
    }

    fn split_args(&self, target: &str, orientation: Orientation, size: &SizeArgument) -> Vec<String> {
        let direction = match orientation {
            Orientation::Horizontal => "-h",
            Orientation::Vertical => "-v",
        };
        let length = match size {
            SizeArgument::Percent(p) => format!("{p}%"),
            SizeArgument::Cells(c) => c.to_string(),
            SizeArgument::Unresolved(placeholder) => placeholder.clone(),
        };
        vec![
            "split-window".to_string(),
            direction.to_string(),
            "-t".to_string(),
            target.to_string(),
            "-l".to_string(),
            length,
            "-P".to_string(),
            "-F".to_string(),
            PANE_ID_FORMAT.to_string(),
        ]
    }

    fn focus_args(&self, pane: &str) -> Vec<String> {
        vec!["select-pane".to_string(), "-t".to_string(), pane.to_string()]
    }

    fn send_text_args(&self, pane: &str, text: &str) -> Vec<String> {
        vec![
            "send-keys".to_string(),
            "-t".to_string(),
            pane.to_string(),
            text.to_string(),
            "Enter".to_string(),
        ]
    }

    fn title_args(&self, pane: &str, title: &str) -> Vec<String> {
        vec![
            "select-pane".to_string(),
            "-t".to_string(),
            pane.to_string(),
            "-T".to_string(),
            title.to_string(),
        ]
    }

    fn run(&self, args: &[String]) -> Result<CommandOutput, ExecutionError> {
        run_checked(&self.runner, PROGRAM, args)
    }
}

/// Parse `tmux -V` output (`tmux 3.3a`, `tmux next-3.4`) into `(major, minor)`.
pub(crate) fn parse_tmux_version(output: &str) -> Option<(u32, u32)> {
    let token = output.split_whitespace().nth(1)?;
    let token = token.strip_prefix("next-").unwrap_or(token);
    let (major, rest) = token.split_once('.').unwrap_or((token, "0"));
    let major = major.parse().ok()?;
    let minor: String = rest.chars().take_while(char::is_ascii_digit).collect();
    Some((major, minor.parse().unwrap_or(0)))
}

fn parse_tmux_size(output: &str) -> Option<PaneSize> {
    let mut parts = output.split_whitespace();
    let cols = parts.next()?.parse().ok()?;
    let rows = parts.next()?.parse().ok()?;
    Some(PaneSize { cols, rows })
}
