//! WezTerm driver, built on `wezterm cli`.

use paneplan_config::BackendKind;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backends::runner::{CommandOutput, CommandRunner, run_checked};
use crate::backends::traits::{MuxDriver, PaneSize};
use crate::executor::errors::ExecutionError;
use crate::preset::Orientation;
use crate::sizing::SizeArgument;

const PROGRAM: &str = "wezterm";
/// First release with `wezterm cli split-pane --percent/--cells` and `activate-pane`.
const MIN_VERSION_DATE: u32 = 20220624;

/// One entry of `wezterm cli list --format json`. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WeztermPane {
    pub pane_id: u64,
    #[serde(default)]
    pub tab_id: u64,
    #[serde(default)]
    pub size: WeztermSize,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct WeztermSize {
    #[serde(default)]
    pub rows: u32,
    #[serde(default)]
    pub cols: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct WeztermClient {
    focused_pane_id: Option<u64>,
}

pub struct WeztermDriver<R> {
    runner: R,
}

impl<R: CommandRunner> WeztermDriver<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn cli(&self, args: &[&str]) -> Result<CommandOutput, ExecutionError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("cli".to_string());
        full.extend(args.iter().map(|a| a.to_string()));
        self.run(&full)
    }

    fn list_all(&self) -> Result<Vec<WeztermPane>, ExecutionError> {
        let output = self.cli(&["list", "--format", "json"])?;
        parse_pane_list(&output.stdout)
    }

    fn find(&self, pane: &str) -> Result<Option<WeztermPane>, ExecutionError> {
        let Ok(id) = pane.parse::<u64>() else {
            return Ok(None);
        };
        Ok(self.list_all()?.into_iter().find(|p| p.pane_id == id))
    }
}

impl<R: CommandRunner> MuxDriver for WeztermDriver<R> {
    fn kind(&self) -> BackendKind {
        BackendKind::Wezterm
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

        let output = self.run(&["--version".to_string()])?;
        let raw = output.stdout.trim();
        match parse_wezterm_version(raw) {
            Some(date) if date < MIN_VERSION_DATE => {
                return Err(ExecutionError::UnsupportedVersion {
                    binary: PROGRAM.to_string(),
                    found: raw.to_string(),
                    required: MIN_VERSION_DATE.to_string(),
                });
            }
            Some(_) => {}
            None => warn!(
                event = "core.backend.wezterm_version_unparsed",
                output = raw,
                "Could not parse WezTerm version, assuming a development build"
            ),
        }

        self.list_all().map_err(|e| ExecutionError::NotInSession {
            backend: PROGRAM.to_string(),
            message: format!("the WezTerm mux is not reachable ({e})"),
        })?;

        debug!(event = "core.backend.wezterm_verify_completed", version = raw);
        Ok(())
    }

    fn current_pane(&self) -> Result<String, ExecutionError> {
        if let Some(pane) = self.runner.env_var("WEZTERM_PANE") {
            return Ok(pane);
        }

        let output = self.cli(&["list-clients", "--format", "json"])?;
        let clients: Vec<WeztermClient> =
            serde_json::from_str(&output.stdout).map_err(|e| ExecutionError::OutputParseFailed {
                path: String::new(),
                command: "wezterm cli list-clients".to_string(),
                message: e.to_string(),
            })?;
        clients
            .into_iter()
            .find_map(|c| c.focused_pane_id)
            .map(|id| id.to_string())
            .ok_or_else(|| ExecutionError::NotInSession {
                backend: PROGRAM.to_string(),
                message: "$WEZTERM_PANE is not set and no client has a focused pane".to_string(),
            })
    }

    fn list_panes(&self, anchor: &str) -> Result<Vec<String>, ExecutionError> {
        let panes = self.list_all()?;
        let Some(tab_id) = anchor
            .parse::<u64>()
            .ok()
            .and_then(|id| panes.iter().find(|p| p.pane_id == id))
            .map(|p| p.tab_id)
        else {
            return Ok(Vec::new());
        };
        Ok(panes
            .iter()
            .filter(|p| p.tab_id == tab_id)
            .map(|p| p.pane_id.to_string())
            .collect())
    }

    fn pane_size(&self, pane: &str) -> Result<PaneSize, ExecutionError> {
        let found = self.find(pane)?.ok_or_else(|| ExecutionError::OutputParseFailed {
            path: String::new(),
            command: "wezterm cli list".to_string(),
            message: format!("pane {pane} is not listed"),
        })?;
        Ok(PaneSize {
            cols: found.size.cols,
            rows: found.size.rows,
        })
    }

    fn spawn_window(&self, name: Option<&str>) -> Result<String, ExecutionError> {
        let output = self.cli(&["spawn", "--new-window"])?;
        let pane = output
            .last_line()
            .filter(|line| line.parse::<u64>().is_ok())
            .map(str::to_string)
            .ok_or_else(|| ExecutionError::OutputParseFailed {
                path: String::new(),
                command: "wezterm cli spawn".to_string(),
                message: format!("expected a pane ID, got '{}'", output.stdout.trim()),
            })?;

        if let Some(name) = name
            && let Err(e) = self.cli(&["set-window-title", "--pane-id", &pane, name])
        {
            // Older releases lack set-window-title; the window is still usable.
            warn!(
                event = "core.backend.wezterm_window_title_failed",
                pane_id = %pane,
                error = %e
            );
        }

        Ok(pane)
    }

    fn close_panes(&self, keep: &str, siblings: &[String]) -> Result<(), ExecutionError> {
        for pane in siblings.iter().filter(|p| p.as_str() != keep) {
            self.cli(&["kill-pane", "--pane-id", pane])?;
        }
        Ok(())
    }

    fn split_args(&self, target: &str, orientation: Orientation, size: &SizeArgument) -> Vec<String> {
        let direction = match orientation {
            Orientation::Horizontal => "--right",
            Orientation::Vertical => "--bottom",
        };
        let (flag, value) = match size {
            SizeArgument::Percent(p) => ("--percent", p.to_string()),
            SizeArgument::Cells(c) => ("--cells", c.to_string()),
            SizeArgument::Unresolved(placeholder) => ("--cells", placeholder.clone()),
        };
        vec![
            "cli".to_string(),
            "split-pane".to_string(),
            "--pane-id".to_string(),
            target.to_string(),
            direction.to_string(),
            flag.to_string(),
            value,
        ]
    }

    fn focus_args(&self, pane: &str) -> Vec<String> {
        vec![
            "cli".to_string(),
            "activate-pane".to_string(),
            "--pane-id".to_string(),
            pane.to_string(),
        ]
    }

    fn send_text_args(&self, pane: &str, text: &str) -> Vec<String> {
        vec![
            "cli".to_string(),
            "send-text".to_string(),
            "--pane-id".to_string(),
            pane.to_string(),
            "--no-paste".to_string(),
            format!("{text}\n"),
        ]
    }

    fn title_args(&self, pane: &str, title: &str) -> Vec<String> {
        vec![
            "cli".to_string(),
            "set-tab-title".to_string(),
            "--pane-id".to_string(),
            pane.to_string(),
            title.to_string(),
        ]
    }

    // set-tab-title postdates the minimum supported release.
    fn title_is_best_effort(&self) -> bool {
        true
    }

    fn run(&self, args: &[String]) -> Result<CommandOutput, ExecutionError> {
        run_checked(&self.runner, PROGRAM, args)
    }
}

pub(crate) fn parse_pane_list(json: &str) -> Result<Vec<WeztermPane>, ExecutionError> {
    serde_json::from_str(json).map_err(|e| ExecutionError::OutputParseFailed {
        path: String::new(),
        command: "wezterm cli list --format json".to_string(),
        message: e.to_string(),
    })
}

/// Parse the build date from `wezterm 20240203-110809-5046fc22`.
pub(crate) fn parse_wezterm_version(output: &str) -> Option<u32> {
    let token = output.split_whitespace().nth(1)?;
    let date: String = token.chars().take_while(char::is_ascii_digit).collect();
    if date.len() != 8 {
        return None;
    }
    date.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeMultiplexer;

    #[test]
    fn test_parse_wezterm_version() {
        assert_eq!(
            parse_wezterm_version("wezterm 20240203-110809-5046fc22"),
            Some(20240203)
        );
        assert_eq!(parse_wezterm_version("wezterm 20220101-000000-abc"), Some(20220101));
        assert_eq!(parse_wezterm_version("wezterm nightly"), None);
    }

    #[test]
    fn test_parse_pane_list_ignores_unknown_fields() {
        let json = r#"[
            {"window_id": 0, "tab_id": 3, "pane_id": 7, "workspace": "default",
             "size": {"rows": 40, "cols": 160, "pixel_width": 0, "pixel_height": 0, "dpi": 0},
             "title": "zsh", "cwd": "file:///home/me"}
        ]"#;
        let panes = parse_pane_list(json).unwrap();
        assert_eq!(panes.len(), 1);
        assert_eq!(panes[0].pane_id, 7);
        assert_eq!(panes[0].tab_id, 3);
        assert_eq!(panes[0].size.cols, 160);
    }

    #[test]
    fn test_parse_pane_list_rejects_garbage() {
        let error = parse_pane_list("not json").unwrap_err();
        assert!(matches!(error, ExecutionError::OutputParseFailed { .. }));
    }

    #[test]
    fn test_split_args() {
        let driver = WeztermDriver::new(FakeMultiplexer::wezterm());
        assert_eq!(
            driver.split_args("3", Orientation::Vertical, &SizeArgument::Percent(40)),
            vec!["cli", "split-pane", "--pane-id", "3", "--bottom", "--percent", "40"]
        );
        assert_eq!(
            driver.split_args("3", Orientation::Horizontal, &SizeArgument::Cells(30)),
            vec!["cli", "split-pane", "--pane-id", "3", "--right", "--cells", "30"]
        );
    }

    #[test]
    fn test_send_text_appends_newline() {
        let driver = WeztermDriver::new(FakeMultiplexer::wezterm());
        let args = driver.send_text_args("3", "ls");
        assert_eq!(args.last().map(String::as_str), Some("ls\n"));
        assert!(args.contains(&"--no-paste".to_string()));
    }

    #[test]
    fn test_verify_rejects_old_version() {
        let fake = FakeMultiplexer::wezterm();
        fake.set_version("wezterm 20210502-154244-3f7122cb");
        let error = WeztermDriver::new(&fake).verify_environment().unwrap_err();
        assert!(matches!(error, ExecutionError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_list_panes_is_scoped_to_anchor_tab() {
        let fake = FakeMultiplexer::wezterm();
        fake.add_foreign_pane();
        let driver = WeztermDriver::new(&fake);
        let current = driver.current_pane().unwrap();
        assert_eq!(driver.list_panes(&current).unwrap(), vec![current]);
    }
}
