//! Live execution of a plan emission against a multiplexer.

use paneplan_config::WindowMode;
use tracing::{debug, error, info, warn};

use crate::backends::MuxDriver;
use crate::errors::PaneplanError;
use crate::executor::errors::ExecutionError;
use crate::executor::terminal_setup::{SetupAction, plan_terminal_setup};
use crate::executor::types::{ExecutionOptions, ExecutionResult, ExecutionState};
use crate::panes::{PaneMap, TemplateContext, build_name_table};
use crate::plan::{CommandStep, PlanEmission, ROOT_PANE_ID, SplitSizing};
use crate::preset::Orientation;
use crate::sizing::resolve_split_size;

/// Execute `emission` step by step, creating and configuring real panes.
///
/// Steps run strictly in order and stop at the first failure. Panes created before a
/// failure are left in place.
pub fn apply_plan<D: MuxDriver + ?Sized>(
    driver: &D,
    emission: &PlanEmission,
    window_mode: WindowMode,
    window_name: Option<&str>,
    options: &ExecutionOptions<'_>,
) -> Result<ExecutionResult, ExecutionError> {
    info!(
        event = "core.executor.apply_started",
        backend = %driver.kind(),
        window_mode = %window_mode,
        steps = emission.steps.len(),
        hash = %emission.hash
    );

    let mut context = ExecutionContext::new(driver, emission, options);
    match context.run(window_mode, window_name) {
        Ok(result) => {
            info!(
                event = "core.executor.apply_completed",
                executed_steps = result.executed_steps,
                focus_pane_id = ?result.focus_pane_id
            );
            Ok(result)
        }
        Err(e) => {
            context.transition(ExecutionState::Aborted);
            if e.is_user_error() {
                warn!(
                    event = "core.executor.apply_failed",
                    error = %e,
                    error_code = e.error_code(),
                    executed_steps = context.executed_steps
                );
            } else {
                error!(
                    event = "core.executor.apply_failed",
                    error = %e,
                    error_code = e.error_code(),
                    executed_steps = context.executed_steps
                );
            }
            Err(e)
        }
    }
}

struct ExecutionContext<'a, D: ?Sized> {
    driver: &'a D,
    emission: &'a PlanEmission,
    options: &'a ExecutionOptions<'a>,
    state: ExecutionState,
    pane_map: PaneMap,
    executed_steps: usize,
}

impl<'a, D: MuxDriver + ?Sized> ExecutionContext<'a, D> {
    fn new(driver: &'a D, emission: &'a PlanEmission, options: &'a ExecutionOptions<'a>) -> Self {
        Self {
            driver,
            emission,
            options,
            state: ExecutionState::Idle,
            pane_map: PaneMap::new(),
            executed_steps: 0,
        }
    }

    fn transition(&mut self, next: ExecutionState) {
        debug!(
            event = "core.executor.state_changed",
            from = %self.state,
            to = %next
        );
        self.state = next;
    }

    fn run(
        &mut self,
        window_mode: WindowMode,
        window_name: Option<&str>,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.driver.verify_environment()?;
        self.transition(ExecutionState::EnvironmentVerified);

        let initial = match window_mode {
            WindowMode::NewWindow => self.acquire_new_window(window_name)?,
            WindowMode::CurrentWindow => self.acquire_current_window()?,
        };
        self.pane_map.insert(ROOT_PANE_ID, initial.as_str());
        self.transition(ExecutionState::PaneMapSeeded);

        let emission = self.emission;
        for step in &emission.steps {
            self.execute_step(step)?;
            self.transition(ExecutionState::StepExecuted(self.executed_steps));
        }

        self.configure_terminals()?;
        self.transition(ExecutionState::TerminalsConfigured);

        let focus_pane_id = self
            .pane_map
            .resolve(ROOT_PANE_ID, &emission.summary.focus_pane_id)?;
        self.transition(ExecutionState::Done);

        Ok(ExecutionResult {
            executed_steps: self.executed_steps,
            focus_pane_id: Some(focus_pane_id),
        })
    }

    fn acquire_new_window(&mut self, window_name: Option<&str>) -> Result<String, ExecutionError> {
        let printed = self.driver.spawn_window(window_name)?;
        let policy = self.options.retry;

        for attempt in 1..=policy.attempts {
            match self.driver.list_panes(&printed) {
                Ok(panes) if panes.iter().any(|p| p == &printed) => {
                    debug!(
                        event = "core.executor.pane_registered",
                        pane_id = %printed,
                        attempt = attempt
                    );
                    return Ok(printed);
                }
                Ok(_) => debug!(
                    event = "core.executor.pane_registration_pending",
                    pane_id = %printed,
                    attempt = attempt
                ),
                Err(e) => debug!(
                    event = "core.executor.pane_registration_pending",
                    pane_id = %printed,
                    attempt = attempt,
                    error = %e
                ),
            }
            if attempt < policy.attempts {
                self.options.sleeper.sleep(policy.delay);
            }
        }

        Err(ExecutionError::PaneRegistrationTimeout {
            pane_id: printed,
            attempts: policy.attempts,
        })
    }

    fn acquire_current_window(&mut self) -> Result<String, ExecutionError> {
        let current = self.driver.current_pane()?;
        let siblings: Vec<String> = self
            .driver
            .list_panes(&current)?
            .into_iter()
            .filter(|p| p != &current)
            .collect();

        if !siblings.is_empty() {
            let message = format!(
                "Close {} other pane(s) in the current window to apply the layout?",
                siblings.len()
            );
            if !self.options.prompt.confirm(&message) {
                return Err(ExecutionError::UserCancelled);
            }
            self.driver.close_panes(&current, &siblings)?;
            info!(
                event = "core.executor.siblings_closed",
                kept = %current,
                closed = siblings.len()
            );
        }

        Ok(current)
    }

    fn execute_step(&mut self, step: &CommandStep) -> Result<(), ExecutionError> {
        debug!(event = "core.executor.step_started", step_id = step.id());
        match step {
            CommandStep::Split {
                id,
                target_pane_id,
                created_pane_id,
                orientation,
                sizing,
            } => self.execute_split(id, target_pane_id, created_pane_id, *orientation, sizing),
            CommandStep::Focus { id, target_pane_id } => {
                let pane = self.pane_map.resolve(id, target_pane_id)?;
                let args = self.driver.focus_args(&pane);
                self.driver.run(&args).map_err(|e| e.at_path(id))?;
                Ok(())
            }
        }
    }

    fn execute_split(
        &mut self,
        id: &str,
        target_pane_id: &str,
        created_pane_id: &str,
        orientation: Orientation,
        sizing: &SplitSizing,
    ) -> Result<(), ExecutionError> {
        let target = self.pane_map.resolve(id, target_pane_id)?;

        let pane_cells = match sizing {
            SplitSizing::Percent { .. } => None,
            SplitSizing::DynamicCells { .. } => Some(
                self.driver
                    .pane_size(&target)
                    .map_err(|e| e.at_path(id))?
                    .along(orientation),
            ),
        };
        let size = resolve_split_size(id, sizing, pane_cells)?;

        let before = self.driver.list_panes(&target).map_err(|e| e.at_path(id))?;
        let args = self
            .driver
            .split_args(&target, orientation, &size.created_argument());
        let output = self.driver.run(&args).map_err(|e| e.at_path(id))?;
        let after = self.driver.list_panes(&target).map_err(|e| e.at_path(id))?;

        let new_panes: Vec<&String> = after.iter().filter(|p| !before.contains(p)).collect();
        let created = match new_panes.as_slice() {
            [only] => (*only).clone(),
            _ => output
                .last_line()
                .map(str::to_string)
                .ok_or_else(|| ExecutionError::SplitPaneNotFound {
                    step_id: id.to_string(),
                })?,
        };

        debug!(
            event = "core.executor.split_completed",
            step_id = id,
            target = %target,
            created = %created,
            size = ?size
        );

        self.pane_map.insert(created_pane_id, created);
        self.executed_steps += 1;
        Ok(())
    }

    fn configure_terminals(&mut self) -> Result<(), ExecutionError> {
        let emission = self.emission;
        let pane_map = &mut self.pane_map;
        let names = build_name_table(&emission.terminals, |t| {
            pane_map.resolve(&t.virtual_pane_id, &t.virtual_pane_id)
        })?;
        let focus = self
            .pane_map
            .resolve(ROOT_PANE_ID, &emission.summary.focus_pane_id)?;

        for terminal in &emission.terminals {
            let path = terminal.virtual_pane_id.as_str();
            let pane = self.pane_map.resolve(path, path)?;
            let context = TemplateContext {
                this_pane: &pane,
                focus_pane: &focus,
                panes_by_name: &names,
            };

            for action in plan_terminal_setup(terminal, &context)? {
                match action {
                    SetupAction::SendText { text, delay_ms, .. } => {
                        if let Some(ms) = delay_ms {
                            self.options
                                .sleeper
                                .sleep(std::time::Duration::from_millis(ms));
                        }
                        let args = self.driver.send_text_args(&pane, &text);
                        self.driver.run(&args).map_err(|e| e.at_path(path))?;
                    }
                    SetupAction::SetTitle { title } => {
                        let args = self.driver.title_args(&pane, &title);
                        match self.driver.run(&args) {
                            Ok(_) => {}
                            Err(e) if self.driver.title_is_best_effort() => warn!(
                                event = "core.executor.title_failed",
                                pane = path,
                                real_pane = %pane,
                                error = %e
                            ),
                            Err(e) => return Err(e.at_path(path)),
                        }
                    }
                }
            }

            debug!(
                event = "core.executor.terminal_configured",
                pane = path,
                real_pane = %pane
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use paneplan_config::RuntimeConfig;
    use serde_json::json;

    use super::*;
    use std::path::PathBuf;

    use crate::backends::{CommandOutput, CommandRunner, TmuxDriver, WeztermDriver};
    use crate::executor::errors::ErrorCategory;
    use crate::executor::types::{AutoConfirm, ConfirmPrompt, Sleeper};
    use crate::plan::{create_layout_plan, emit_plan};
    use crate::preset::compile_preset_from_value;
    use crate::test_support::{FakeMultiplexer, SplitBehavior};

    #[derive(Default)]
    struct RecordingSleeper {
        slept: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }

    struct Decline;

    impl ConfirmPrompt for Decline {
        fn confirm(&self, _message: &str) -> bool {
            false
        }
    }

    fn emission(preset: serde_json::Value) -> PlanEmission {
        let compiled = compile_preset_from_value("dev", &preset, "test").unwrap();
        emit_plan(&create_layout_plan(&compiled).unwrap()).unwrap()
    }

    fn two_pane() -> PlanEmission {
        emission(json!({
            "name": "Dev",
            "layout": {
                "type": "horizontal",
                "ratio": [3, 2],
                "panes": [
                    { "name": "editor", "command": "nvim ." },
                    { "name": "shell" }
                ]
            }
        }))
    }

    fn runtime(attempts: u32) -> RuntimeConfig {
        RuntimeConfig {
            pane_registration_attempts: Some(attempts),
            pane_registration_delay_ms: Some(100),
            preview_max_chars: None,
        }
    }

    #[test]
    fn test_two_pane_layout_in_current_window() {
        let fake = FakeMultiplexer::tmux();
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let result = apply_plan(
            &TmuxDriver::new(&fake),
            &two_pane(),
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap();

        assert_eq!(result.executed_steps, 1);
        assert_eq!(result.focus_pane_id.as_deref(), Some("%0"));

        let splits = fake.calls_of("split-window");
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0][1..7], ["split-window", "-h", "-t", "%0", "-l", "40%"]);
        assert_eq!(fake.focused_pane().as_deref(), Some("%0"));
        assert_eq!(
            fake.sent_text(),
            vec![("%0".to_string(), "nvim .".to_string())]
        );
        assert!(fake.calls_of("new-window").is_empty());
    }

    #[test]
    fn test_new_window_waits_for_registration() {
        let fake = FakeMultiplexer::tmux();
        fake.set_registration_lag(2);
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let result = apply_plan(
            &TmuxDriver::new(&fake),
            &two_pane(),
            WindowMode::NewWindow,
            Some("dev"),
            &options,
        )
        .unwrap();

        assert_eq!(*sleeper.slept.borrow(), vec![Duration::from_millis(100); 2]);
        assert_eq!(result.focus_pane_id.as_deref(), Some("%1"));
        assert_eq!(fake.window_names(), vec!["dev"]);
    }

    #[test]
    fn test_registration_timeout() {
        let fake = FakeMultiplexer::tmux();
        fake.set_registration_lag(10);
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(3), &sleeper, &AutoConfirm);

        let error = apply_plan(
            &TmuxDriver::new(&fake),
            &two_pane(),
            WindowMode::NewWindow,
            None,
            &options,
        )
        .unwrap_err();

        assert_eq!(
            error,
            ExecutionError::PaneRegistrationTimeout {
                pane_id: "%1".to_string(),
                attempts: 3
            }
        );
        assert_eq!(error.category(), ErrorCategory::Structural);
        assert_eq!(sleeper.slept.borrow().len(), 2);
        assert!(fake.calls_of("split-window").is_empty());
    }

    #[test]
    fn test_declined_prompt_cancels_without_closing() {
        let fake = FakeMultiplexer::tmux();
        fake.add_sibling_pane();
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &Decline);

        let error = apply_plan(
            &TmuxDriver::new(&fake),
            &two_pane(),
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap_err();

        assert_eq!(error, ExecutionError::UserCancelled);
        assert!(fake.calls_of("kill-pane").is_empty());
        assert_eq!(fake.pane_ids().len(), 2);
    }

    #[test]
    fn test_confirmed_prompt_closes_siblings() {
        let fake = FakeMultiplexer::tmux();
        let sibling = fake.add_sibling_pane();
        let foreign = fake.add_foreign_pane();
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        apply_plan(
            &TmuxDriver::new(&fake),
            &two_pane(),
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap();

        let panes = fake.pane_ids();
        assert!(!panes.contains(&sibling));
        assert!(panes.contains(&foreign));
        assert_eq!(fake.calls_of("kill-pane").len(), 1);
    }

    #[test]
    fn test_split_without_new_pane_fails() {
        let fake = FakeMultiplexer::tmux();
        fake.set_split_behavior(SplitBehavior::NoPane);
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let error = apply_plan(
            &TmuxDriver::new(&fake),
            &two_pane(),
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap_err();

        assert_eq!(
            error,
            ExecutionError::SplitPaneNotFound {
                step_id: "split:root.1".to_string()
            }
        );
    }

    #[test]
    fn test_silent_split_is_found_by_snapshot() {
        let fake = FakeMultiplexer::tmux();
        fake.set_split_behavior(SplitBehavior::Silent);
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let layout = emission(json!({
            "name": "Dev",
            "layout": {
                "type": "vertical",
                "panes": [
                    { "name": "top" },
                    { "name": "bottom", "command": "echo {{this_pane}}" }
                ]
            }
        }));
        apply_plan(
            &TmuxDriver::new(&fake),
            &layout,
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap();

        assert_eq!(
            fake.sent_text(),
            vec![("%1".to_string(), "echo %1".to_string())]
        );
    }

    #[test]
    fn test_fixed_cells_use_live_geometry() {
        let fake = FakeMultiplexer::tmux();
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let layout = emission(json!({
            "name": "Dev",
            "layout": {
                "type": "horizontal",
                "ratio": [{ "cells": 30 }, 1],
                "panes": [ { "name": "tree" }, { "name": "main" } ]
            }
        }));
        apply_plan(
            &TmuxDriver::new(&fake),
            &layout,
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap();

        let splits = fake.calls_of("split-window");
        assert_eq!(splits[0][5..7], ["-l", "170"]);
        assert_eq!(fake.pane_geometry("%0"), Some((30, 50)));
    }

    #[test]
    fn test_terminal_setup_order_and_templates() {
        let fake = FakeMultiplexer::tmux();
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let layout = emission(json!({
            "name": "Dev",
            "layout": {
                "type": "horizontal",
                "panes": [
                    { "name": "server", "command": "cargo run" },
                    {
                        "name": "logs",
                        "cwd": "/var/log",
                        "env": { "SERVER": "{{pane_id:server}}" },
                        "title": "Logs",
                        "delay": 500,
                        "command": "tail -f app.log",
                        "focus": true
                    }
                ]
            }
        }));
        let result = apply_plan(
            &TmuxDriver::new(&fake),
            &layout,
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap();

        assert_eq!(result.focus_pane_id.as_deref(), Some("%1"));
        assert_eq!(
            fake.sent_text(),
            vec![
                ("%0".to_string(), "cargo run".to_string()),
                ("%1".to_string(), "cd '/var/log'".to_string()),
                ("%1".to_string(), "export SERVER='%0'".to_string()),
                ("%1".to_string(), "tail -f app.log".to_string()),
            ]
        );
        assert_eq!(fake.title("%1").as_deref(), Some("Logs"));
        assert_eq!(*sleeper.slept.borrow(), vec![Duration::from_millis(500)]);
    }

    #[test]
    fn test_command_failure_carries_pane_path() {
        let fake = FakeMultiplexer::tmux();
        fake.fail_command("send-keys", "pane is dead");
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let error = apply_plan(
            &TmuxDriver::new(&fake),
            &two_pane(),
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap_err();

        assert_eq!(error.error_code(), "TERMINAL_COMMAND_FAILED");
        assert_eq!(error.path(), Some("root.0"));
        assert_eq!(error.category(), ErrorCategory::Process);
        assert_eq!(
            error.details().get("stderr").map(String::as_str),
            Some("pane is dead")
        );
    }

    /// Answers geometry queries with unparseable output; everything else goes to the fake.
    struct GarbledGeometry<'a> {
        inner: &'a FakeMultiplexer,
    }

    impl CommandRunner for GarbledGeometry<'_> {
        fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecutionError> {
            if args.iter().any(|a| a == "#{pane_width} #{pane_height}") {
                return Ok(CommandOutput::success("garbage\n"));
            }
            self.inner.run(program, args)
        }

        fn locate(&self, program: &str) -> Option<PathBuf> {
            self.inner.locate(program)
        }

        fn env_var(&self, key: &str) -> Option<String> {
            self.inner.env_var(key)
        }
    }

    #[test]
    fn test_unparseable_geometry_carries_step_path() {
        let fake = FakeMultiplexer::tmux();
        let runner = GarbledGeometry { inner: &fake };
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let layout = emission(json!({
            "name": "Dev",
            "layout": {
                "type": "horizontal",
                "ratio": [{ "cells": 30 }, 1],
                "panes": [ { "name": "tree" }, { "name": "main" } ]
            }
        }));
        let error = apply_plan(
            &TmuxDriver::new(&runner),
            &layout,
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap_err();

        assert_eq!(error.error_code(), "OUTPUT_PARSE_FAILED");
        assert_eq!(error.path(), Some("split:root.1"));
        assert_eq!(error.category(), ErrorCategory::Process);
        assert!(fake.calls_of("split-window").is_empty());
    }

    fn titled_two_pane() -> PlanEmission {
        emission(json!({
            "name": "Dev",
            "layout": {
                "type": "horizontal",
                "ratio": [1, 1],
                "panes": [
                    { "name": "editor", "title": "A", "command": "nvim ." },
                    { "name": "shell" }
                ]
            }
        }))
    }

    #[test]
    fn test_wezterm_title_failure_is_not_fatal() {
        let fake = FakeMultiplexer::wezterm();
        fake.fail_command("set-tab-title", "unknown subcommand");
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let result = apply_plan(
            &WeztermDriver::new(&fake),
            &titled_two_pane(),
            WindowMode::CurrentWindow,
            None,
            &options,
        )
        .unwrap();

        assert_eq!(result.executed_steps, 1);
        assert_eq!(fake.calls_of("set-tab-title").len(), 1);
        assert_eq!(fake.title("0"), None);
        assert_eq!(
            fake.sent_text(),
            vec![("0".to_string(), "nvim .".to_string())]
        );
    }

    #[test]
    fn test_only_wezterm_titles_are_best_effort() {
        let fake = FakeMultiplexer::tmux();
        assert!(!TmuxDriver::new(&fake).title_is_best_effort());
        assert!(WeztermDriver::new(&fake).title_is_best_effort());
    }

    #[test]
    fn test_missing_binary_stops_before_any_change() {
        let fake = FakeMultiplexer::tmux();
        fake.set_installed(false);
        let sleeper = RecordingSleeper::default();
        let options = ExecutionOptions::new(&runtime(5), &sleeper, &AutoConfirm);

        let error = apply_plan(
            &TmuxDriver::new(&fake),
            &two_pane(),
            WindowMode::NewWindow,
            None,
            &options,
        )
        .unwrap_err();

        assert!(matches!(error, ExecutionError::MissingDependency { .. }));
        assert!(fake.calls().is_empty());
    }
}
