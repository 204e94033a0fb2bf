use clap::ArgMatches;
use paneplan_core::layout_ops::{self, ApplyRequest, Applied, Preview};
use paneplan_core::{
    AutoConfirm, BackendKind, ConfirmPrompt, DryRunStep, ExecutionOptions, PaneplanConfig,
    SystemRunner, ThreadSleeper, WindowMode,
};
use tracing::info;

use super::helpers::{parse_optional, report_error, short_hash};
use crate::prompt::StdinPrompt;

pub(crate) fn handle_apply_command(
    config: &PaneplanConfig,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let preset_key = matches
        .get_one::<String>("preset")
        .ok_or("Preset argument is required")?;
    let dry_run = matches.get_flag("dry-run");

    let request = ApplyRequest {
        preset_key: preset_key.clone(),
        backend: parse_optional::<BackendKind>(matches, "backend")?,
        window_mode: parse_optional::<WindowMode>(matches, "window-mode")?,
        window_name: matches.get_one::<String>("window-name").cloned(),
    };

    info!(
        event = "cli.apply_started",
        preset = %preset_key,
        dry_run = dry_run,
        backend_override = ?request.backend,
        window_mode_override = ?request.window_mode
    );

    let sleeper = ThreadSleeper;
    let stdin_prompt = StdinPrompt;
    let prompt: &dyn ConfirmPrompt = if matches.get_flag("yes") {
        &AutoConfirm
    } else {
        &stdin_prompt
    };
    let options = ExecutionOptions::new(&config.runtime, &sleeper, prompt);

    if dry_run {
        match layout_ops::preview(config, &request, SystemRunner, &options) {
            Ok(preview) => {
                for line in preview_lines(&preview) {
                    println!("{}", line);
                }
                info!(
                    event = "cli.apply_dry_run_completed",
                    preset = %preset_key,
                    steps = preview.steps.len()
                );
                Ok(())
            }
            Err(e) => {
                report_error(&e);
                Err(e.into())
            }
        }
    } else {
        match layout_ops::apply(config, &request, SystemRunner, &options) {
            Ok(applied) => {
                println!("{}", applied_line(preset_key, &applied));
                info!(
                    event = "cli.apply_completed",
                    preset = %preset_key,
                    backend = %applied.backend,
                    executed_steps = applied.result.executed_steps,
                    focus_pane_id = applied.result.focus_pane_id.as_deref()
                );
                Ok(())
            }
            Err(e) => {
                report_error(&e);
                Err(e.into())
            }
        }
    }
}

/// Header followed by one line per dry-run step.
pub(crate) fn preview_lines(preview: &Preview) -> Vec<String> {
    let mut lines = Vec::with_capacity(preview.steps.len() + 1);
    lines.push(format!(
        "Dry run of '{}' via {} ({}), plan {}:",
        preview.prepared.preset.key,
        preview.backend,
        preview.window_mode,
        short_hash(&preview.prepared.emission.hash)
    ));
    lines.extend(
        preview
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| step_line(index + 1, step)),
    );
    lines
}

fn step_line(number: usize, step: &DryRunStep) -> String {
    format!("{:>3}. {}  $ {}", number, step.summary, step.command_line())
}

pub(crate) fn applied_line(preset_key: &str, applied: &Applied) -> String {
    let focus = applied
        .result
        .focus_pane_id
        .as_deref()
        .map(|pane| format!(", focused {}", pane))
        .unwrap_or_default();
    format!(
        "Applied '{}' via {} ({}): {} split(s){}, plan {}",
        preset_key,
        applied.backend,
        applied.window_mode,
        applied.result.executed_steps,
        focus,
        short_hash(&applied.hash)
    )
}
