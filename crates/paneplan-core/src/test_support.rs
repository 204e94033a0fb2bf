//! Scripted multiplexer for tests.
//!
//! [`FakeMultiplexer`] implements [`CommandRunner`] and answers the tmux and `wezterm cli`
//! commands the drivers issue, keeping an in-memory pane inventory with sequential IDs.
//! It can delay registration of spawned panes, fail selected subcommands and records
//! every invocation.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use paneplan_config::BackendKind;

use crate::backends::runner::{CommandOutput, CommandRunner};
use crate::executor::errors::ExecutionError;

const DEFAULT_COLS: u32 = 200;
const DEFAULT_ROWS: u32 = 50;

/// How a split command behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitBehavior {
    /// Create the pane and print its ID.
    Normal,
    /// Create the pane but print nothing.
    Silent,
    /// Exit successfully without creating a pane.
    NoPane,
}

#[derive(Debug, Clone)]
struct FakePane {
    id: u64,
    window: u64,
    cols: u32,
    rows: u32,
}

#[derive(Debug)]
struct FakeState {
    kind: BackendKind,
    installed: bool,
    mux_reachable: bool,
    version: String,
    env: BTreeMap<String, String>,
    panes: Vec<FakePane>,
    next_pane: u64,
    next_window: u64,
    current: u64,
    registration_lag: u32,
    pending: BTreeMap<u64, u32>,
    split_behavior: SplitBehavior,
    failures: BTreeMap<String, String>,
    calls: Vec<Vec<String>>,
    sent: Vec<(String, String)>,
    titles: BTreeMap<String, String>,
    focused: Option<String>,
    window_names: Vec<String>,
}

pub struct FakeMultiplexer {
    state: RefCell<FakeState>,
}

impl FakeMultiplexer {
    /// A running tmux session with one 200x50 pane `%0`.
    pub fn tmux() -> Self {
        let fake = Self::new(BackendKind::Tmux, "tmux 3.4");
        fake.set_env("TMUX", "/tmp/tmux-1000/default,4242,0");
        fake.set_env("TMUX_PANE", "%0");
        fake
    }

    /// A running WezTerm mux with one 200x50 pane `0`.
    pub fn wezterm() -> Self {
        let fake = Self::new(BackendKind::Wezterm, "wezterm 20240203-110809-5046fc22");
        fake.set_env("WEZTERM_PANE", "0");
        fake
    }

    pub fn for_backend(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Tmux => Self::tmux(),
            BackendKind::Wezterm => Self::wezterm(),
        }
    }

    fn new(kind: BackendKind, version: &str) -> Self {
        Self {
            state: RefCell::new(FakeState {
                kind,
                installed: true,
                mux_reachable: true,
                version: version.to_string(),
                env: BTreeMap::new(),
                panes: vec![FakePane {
                    id: 0,
                    window: 0,
                    cols: DEFAULT_COLS,
                    rows: DEFAULT_ROWS,
                }],
                next_pane: 1,
                next_window: 1,
                current: 0,
                registration_lag: 0,
                pending: BTreeMap::new(),
                split_behavior: SplitBehavior::Normal,
                failures: BTreeMap::new(),
                calls: Vec::new(),
                sent: Vec::new(),
                titles: BTreeMap::new(),
                focused: None,
                window_names: Vec::new(),
            }),
        }
    }

    pub fn set_env(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .env
            .insert(key.to_string(), value.to_string());
    }

    pub fn unset_env(&self, key: &str) {
        self.state.borrow_mut().env.remove(key);
    }

    pub fn set_installed(&self, installed: bool) {
        self.state.borrow_mut().installed = installed;
    }

    pub fn set_mux_reachable(&self, reachable: bool) {
        self.state.borrow_mut().mux_reachable = reachable;
    }

    pub fn set_version(&self, version: &str) {
        self.state.borrow_mut().version = version.to_string();
    }

    /// Resize the current pane.
    pub fn set_current_size(&self, cols: u32, rows: u32) {
        let mut state = self.state.borrow_mut();
        let current = state.current;
        if let Some(pane) = state.panes.iter_mut().find(|p| p.id == current) {
            pane.cols = cols;
            pane.rows = rows;
        }
    }

    /// Number of inventory queries a newly spawned window's pane stays invisible for.
    pub fn set_registration_lag(&self, lag: u32) {
        self.state.borrow_mut().registration_lag = lag;
    }

    pub fn set_split_behavior(&self, behavior: SplitBehavior) {
        self.state.borrow_mut().split_behavior = behavior;
    }

    /// Make every invocation of `subcommand` (e.g. `send-keys`, `split-pane`) exit 1.
    pub fn fail_command(&self, subcommand: &str, stderr: &str) {
        self.state
            .borrow_mut()
            .failures
            .insert(subcommand.to_string(), stderr.to_string());
    }

    /// Add a pane next to the current one and return its ID.
    pub fn add_sibling_pane(&self) -> String {
        let mut state = self.state.borrow_mut();
        let window = state.current_window();
        let id = state.add_pane(window, DEFAULT_COLS, DEFAULT_ROWS);
        state.render_id(id)
    }

    /// Add a pane in another window and return its ID.
    pub fn add_foreign_pane(&self) -> String {
        let mut state = self.state.borrow_mut();
        let window = state.next_window;
        state.next_window += 1;
        let id = state.add_pane(window, DEFAULT_COLS, DEFAULT_ROWS);
        state.render_id(id)
    }

    /// Every invocation as `[program, args...]`.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.borrow().calls.clone()
    }

    /// Invocations whose first argument (after `cli` for WezTerm) is `subcommand`.
    pub fn calls_of(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| subcommand_of(&call[1..]) == Some(subcommand))
            .cloned()
            .collect()
    }

    /// Text typed into panes, in order, as `(pane_id, text)`.
    pub fn sent_text(&self) -> Vec<(String, String)> {
        self.state.borrow().sent.clone()
    }

    pub fn title(&self, pane: &str) -> Option<String> {
        self.state.borrow().titles.get(pane).cloned()
    }

    pub fn focused_pane(&self) -> Option<String> {
        self.state.borrow().focused.clone()
    }

    pub fn window_names(&self) -> Vec<String> {
        self.state.borrow().window_names.clone()
    }

    /// IDs of all live panes, including ones still registering.
    pub fn pane_ids(&self) -> Vec<String> {
        let state = self.state.borrow();
        state.panes.iter().map(|p| state.render_id(p.id)).collect()
    }

    /// `(cols, rows)` of a pane.
    pub fn pane_geometry(&self, pane: &str) -> Option<(u32, u32)> {
        let state = self.state.borrow();
        let id = state.parse_id(pane)?;
        state
            .panes
            .iter()
            .find(|p| p.id == id)
            .map(|p| (p.cols, p.rows))
    }
}

impl CommandRunner for FakeMultiplexer {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecutionError> {
        let mut state = self.state.borrow_mut();

        let mut call = vec![program.to_string()];
        call.extend(args.iter().cloned());
        state.calls.push(call);

        if !state.installed || program != state.kind.as_str() {
            return Err(ExecutionError::ProcessSpawnFailed {
                path: String::new(),
                command: program.to_string(),
                message: "No such file or directory (os error 2)".to_string(),
            });
        }

        if let Some(stderr) = subcommand_of(args).and_then(|sub| state.failures.get(sub)) {
            return Ok(CommandOutput::failure(1, stderr.clone()));
        }

        Ok(match state.kind {
            BackendKind::Tmux => state.tmux(args),
            BackendKind::Wezterm => state.wezterm(args),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        let state = self.state.borrow();
        (state.installed && program == state.kind.as_str())
            .then(|| PathBuf::from(format!("/usr/bin/{program}")))
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.state.borrow().env.get(key).cloned()
    }
}

fn subcommand_of(args: &[String]) -> Option<&str> {
    let mut iter = args.iter().map(String::as_str);
    match iter.next()? {
        "cli" => iter.next(),
        first => Some(first),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

impl FakeState {
    fn render_id(&self, id: u64) -> String {
        match self.kind {
            BackendKind::Tmux => format!("%{id}"),
            BackendKind::Wezterm => id.to_string(),
        }
    }

    fn parse_id(&self, raw: &str) -> Option<u64> {
        match self.kind {
            BackendKind::Tmux => raw.strip_prefix('%')?.parse().ok(),
            BackendKind::Wezterm => raw.parse().ok(),
        }
    }

    fn current_window(&self) -> u64 {
        self.panes
            .iter()
            .find(|p| p.id == self.current)
            .map(|p| p.window)
            .unwrap_or(0)
    }

    fn add_pane(&mut self, window: u64, cols: u32, rows: u32) -> u64 {
        let id = self.next_pane;
        self.next_pane += 1;
        self.panes.push(FakePane {
            id,
            window,
            cols,
            rows,
        });
        id
    }

    /// Panes visible to inventory queries. Each query ages pending registrations.
    fn visible_panes(&mut self) -> Vec<FakePane> {
        let hidden: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, lag)| **lag > 0)
            .map(|(id, _)| *id)
            .collect();
        for lag in self.pending.values_mut() {
            *lag = lag.saturating_sub(1);
        }
        self.panes
            .iter()
            .filter(|p| !hidden.contains(&p.id))
            .cloned()
            .collect()
    }

    fn pane(&self, raw: Option<&str>) -> Option<FakePane> {
        let id = self.parse_id(raw?)?;
        self.panes.iter().find(|p| p.id == id).cloned()
    }

    fn spawn_window(&mut self) -> u64 {
        let window = self.next_window;
        self.next_window += 1;
        let id = self.add_pane(window, DEFAULT_COLS, DEFAULT_ROWS);
        if self.registration_lag > 0 {
            self.pending.insert(id, self.registration_lag);
        }
        id
    }

    /// Split `target`, giving the new pane `created` cells along the axis.
    fn split(&mut self, target: &FakePane, horizontal: bool, size: SplitSize) -> Option<u64> {
        if self.split_behavior == SplitBehavior::NoPane {
            return None;
        }
        let total = if horizontal { target.cols } else { target.rows };
        let created = match size {
            SplitSize::Percent(p) => total * p / 100,
            SplitSize::Cells(c) => c.min(total),
        };
        let kept = total - created;

        let (cols, rows) = if horizontal {
            (created, target.rows)
        } else {
            (target.cols, created)
        };
        let id = self.add_pane(target.window, cols, rows);
        if let Some(existing) = self.panes.iter_mut().find(|p| p.id == target.id) {
            if horizontal {
                existing.cols = kept;
            } else {
                existing.rows = kept;
            }
        }
        Some(id)
    }

    fn split_output(&self, created: Option<u64>) -> CommandOutput {
        match (created, self.split_behavior) {
            (Some(id), SplitBehavior::Normal) => CommandOutput::success(format!("{}\n", self.render_id(id))),
            _ => CommandOutput::success(""),
        }
    }

    fn missing(&self, what: &str) -> CommandOutput {
        CommandOutput::failure(1, format!("can't find pane: {what}"))
    }

    fn tmux(&mut self, args: &[String]) -> CommandOutput {
        match subcommand_of(args) {
            Some("-V") => CommandOutput::success(format!("{}\n", self.version)),
            Some("display-message") => {
                let target = flag_value(args, "-t");
                let format = args.last().map(String::as_str).unwrap_or_default();
                let pane = match target {
                    Some(raw) => match self.pane(Some(raw)) {
                        Some(pane) => pane,
                        None => return self.missing(raw),
                    },
                    None => match self.pane(Some(&self.render_id(self.current))) {
                        Some(pane) => pane,
                        None => return self.missing("current"),
                    },
                };
                if format.contains("pane_width") {
                    CommandOutput::success(format!("{} {}\n", pane.cols, pane.rows))
                } else {
                    CommandOutput::success(format!("{}\n", self.render_id(pane.id)))
                }
            }
            Some("list-panes") => {
                let raw = flag_value(args, "-t").unwrap_or_default().to_string();
                let visible = self.visible_panes();
                let Some(anchor) = self
                    .parse_id(&raw)
                    .and_then(|id| visible.iter().find(|p| p.id == id))
                else {
                    return self.missing(&raw);
                };
                let window = anchor.window;
                let lines: Vec<String> = visible
                    .iter()
                    .filter(|p| p.window == window)
                    .map(|p| self.render_id(p.id))
                    .collect();
                CommandOutput::success(format!("{}\n", lines.join("\n")))
            }
            Some("new-window") => {
                if let Some(name) = flag_value(args, "-n") {
                    self.window_names.push(name.to_string());
                }
                let id = self.spawn_window();
                CommandOutput::success(format!("{}\n", self.render_id(id)))
            }
            Some("split-window") => {
                let raw = flag_value(args, "-t").unwrap_or_default().to_string();
                let Some(target) = self.pane(Some(&raw)) else {
                    return self.missing(&raw);
                };
                let Some(size) = flag_value(args, "-l").and_then(SplitSize::parse) else {
                    return CommandOutput::failure(1, "invalid length");
                };
                let created = self.split(&target, has_flag(args, "-h"), size);
                self.split_output(created)
            }
            Some("select-pane") => {
                let raw = flag_value(args, "-t").unwrap_or_default().to_string();
                if self.pane(Some(&raw)).is_none() {
                    return self.missing(&raw);
                }
                match flag_value(args, "-T") {
                    Some(title) => {
                        self.titles.insert(raw, title.to_string());
                    }
                    None => self.focused = Some(raw),
                }
                CommandOutput::success("")
            }
            Some("send-keys") => {
                let raw = flag_value(args, "-t").unwrap_or_default().to_string();
                if self.pane(Some(&raw)).is_none() {
                    return self.missing(&raw);
                }
                let text = args
                    .iter()
                    .position(|a| a == "-t")
                    .and_then(|i| args.get(i + 2))
                    .cloned()
                    .unwrap_or_default();
                self.sent.push((raw, text));
                CommandOutput::success("")
            }
            Some("kill-pane") => {
                let raw = flag_value(args, "-t").unwrap_or_default().to_string();
                let Some(keep) = self.pane(Some(&raw)) else {
                    return self.missing(&raw);
                };
                if has_flag(args, "-a") {
                    self.panes
                        .retain(|p| p.window != keep.window || p.id == keep.id);
                } else {
                    self.panes.retain(|p| p.id != keep.id);
                }
                CommandOutput::success("")
            }
            other => CommandOutput::failure(1, format!("unknown command: {}", other.unwrap_or(""))),
        }
    }

    fn wezterm(&mut self, args: &[String]) -> CommandOutput {
        if subcommand_of(args) == Some("--version") {
            return CommandOutput::success(format!("{}\n", self.version));
        }
        if !self.mux_reachable {
            return CommandOutput::failure(1, "failed to connect to mux socket");
        }

        match subcommand_of(args) {
            Some("list") => {
                let visible = self.visible_panes();
                let entries: Vec<serde_json::Value> = visible
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "window_id": p.window,
                            "tab_id": p.window,
                            "pane_id": p.id,
                            "workspace": "default",
                            "size": {"rows": p.rows, "cols": p.cols},
                            "title": "zsh",
                        })
                    })
                    .collect();
                CommandOutput::success(serde_json::Value::Array(entries).to_string())
            }
            Some("list-clients") => CommandOutput::success(
                serde_json::json!([{ "focused_pane_id": self.current }]).to_string(),
            ),
            Some("spawn") => {
                let id = self.spawn_window();
                CommandOutput::success(format!("{id}\n"))
            }
            Some("set-window-title") => {
                if let Some(name) = args.last() {
                    self.window_names.push(name.clone());
                }
                CommandOutput::success("")
            }
            Some("split-pane") => {
                let raw = flag_value(args, "--pane-id").unwrap_or_default().to_string();
                let Some(target) = self.pane(Some(&raw)) else {
                    return self.missing(&raw);
                };
                let size = if let Some(p) = flag_value(args, "--percent") {
                    p.parse().ok().map(SplitSize::Percent)
                } else {
                    flag_value(args, "--cells").and_then(|c| c.parse().ok().map(SplitSize::Cells))
                };
                let Some(size) = size else {
                    return CommandOutput::failure(1, "invalid size");
                };
                let created = self.split(&target, has_flag(args, "--right"), size);
                self.split_output(created)
            }
            Some("activate-pane") => {
                let raw = flag_value(args, "--pane-id").unwrap_or_default().to_string();
                if self.pane(Some(&raw)).is_none() {
                    return self.missing(&raw);
                }
                self.focused = Some(raw);
                CommandOutput::success("")
            }
            Some("send-text") => {
                let raw = flag_value(args, "--pane-id").unwrap_or_default().to_string();
                if self.pane(Some(&raw)).is_none() {
                    return self.missing(&raw);
                }
                let text = args.last().cloned().unwrap_or_default();
                let text = text.strip_suffix('\n').unwrap_or(&text).to_string();
                self.sent.push((raw, text));
                CommandOutput::success("")
            }
            Some("set-tab-title") => {
                let raw = flag_value(args, "--pane-id").unwrap_or_default().to_string();
                if let Some(title) = args.last() {
                    self.titles.insert(raw, title.clone());
                }
                CommandOutput::success("")
            }
            Some("kill-pane") => {
                let raw = flag_value(args, "--pane-id").unwrap_or_default().to_string();
                let Some(id) = self.parse_id(&raw) else {
                    return self.missing(&raw);
                };
                self.panes.retain(|p| p.id != id);
                CommandOutput::success("")
            }
            other => CommandOutput::failure(1, format!("unknown command: {}", other.unwrap_or(""))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SplitSize {
    Percent(u32),
    Cells(u32),
}

impl SplitSize {
    fn parse(raw: &str) -> Option<Self> {
        match raw.strip_suffix('%') {
            Some(p) => p.parse().ok().map(SplitSize::Percent),
            None => raw.parse().ok().map(SplitSize::Cells),
        }
    }
}
