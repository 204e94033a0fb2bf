//! Preview rendering: the commands a live run would issue, without changing anything.

use std::collections::BTreeMap;

use tracing::debug;

use crate::backends::{MuxDriver, PaneSize};
use crate::executor::errors::ExecutionError;
use crate::executor::terminal_setup::{SetupAction, SetupKind, plan_terminal_setup};
use crate::executor::types::{DryRunStep, ExecutionOptions};
use crate::panes::{TemplateContext, build_name_table};
use crate::plan::{CommandStep, PlanEmission, ROOT_PANE_ID, SplitSizing};
use crate::preset::Orientation;
use crate::sizing::{ResolvedSplitSize, SizeArgument, resolve_split_size};

/// Render every step and terminal setup action of `emission` as it would be executed.
///
/// Pane references are virtual IDs. Cell-based splits are sized from a probe of the
/// current pane when one is available, otherwise they carry a `<cells:...>` placeholder.
pub fn get_dry_run_steps<D: MuxDriver + ?Sized>(
    driver: &D,
    emission: &PlanEmission,
    options: &ExecutionOptions<'_>,
) -> Result<Vec<DryRunStep>, ExecutionError> {
    let probe = driver.probe_current_size();
    debug!(
        event = "core.executor.dry_run_started",
        backend = %driver.kind(),
        probed = probe.is_some()
    );

    let mut geometry = GeometryTracker::default();
    if let Some(size) = probe {
        geometry.sizes.insert(ROOT_PANE_ID.to_string(), size);
    }

    let limit = options.preview_max_chars;
    let step = |summary: String, args: Vec<String>| DryRunStep {
        backend: driver.kind(),
        summary: truncate(&summary, limit),
        command: driver.argv(args),
    };

    let mut steps = Vec::new();
    for command in &emission.steps {
        match command {
            CommandStep::Split {
                id,
                target_pane_id,
                created_pane_id,
                orientation,
                sizing,
            } => {
                let known = geometry.lookup(target_pane_id);
                let (argument, summary) = match (sizing, known) {
                    (SplitSizing::DynamicCells { .. }, None) => (
                        SizeArgument::Unresolved(format!("<cells:{created_pane_id}>")),
                        format!(
                            "split {target_pane_id} {orientation}: new pane {created_pane_id} sized from live geometry"
                        ),
                    ),
                    _ => {
                        let cells = known.map(|size| size.along(*orientation));
                        let resolved = resolve_split_size(id, sizing, cells)?;
                        if let Some(size) = known {
                            geometry.record_split(
                                target_pane_id,
                                created_pane_id,
                                *orientation,
                                size,
                                &resolved,
                            );
                        }
                        (
                            resolved.created_argument(),
                            split_summary(target_pane_id, created_pane_id, *orientation, &resolved),
                        )
                    }
                };
                steps.push(step(
                    summary,
                    driver.split_args(target_pane_id, *orientation, &argument),
                ));
            }
            CommandStep::Focus { target_pane_id, .. } => {
                steps.push(step(
                    format!("focus {target_pane_id}"),
                    driver.focus_args(target_pane_id),
                ));
            }
        }
    }

    let names = build_name_table(&emission.terminals, |t| Ok(t.virtual_pane_id.clone()))?;
    for terminal in &emission.terminals {
        let pane = terminal.virtual_pane_id.as_str();
        let context = TemplateContext {
            this_pane: pane,
            focus_pane: &emission.summary.focus_pane_id,
            panes_by_name: &names,
        };
        for action in plan_terminal_setup(terminal, &context)? {
            match action {
                SetupAction::SendText {
                    kind,
                    text,
                    delay_ms,
                } => {
                    let summary = match (kind, delay_ms) {
                        (SetupKind::Cwd, _) => format!("{pane} ({}): {text}", terminal.name),
                        (SetupKind::Env { key }, _) => {
                            format!("{pane} ({}): set {key}", terminal.name)
                        }
                        (SetupKind::Command, Some(ms)) => {
                            format!("{pane} ({}) after {ms}ms: {text}", terminal.name)
                        }
                        (SetupKind::Command, None) => format!("{pane} ({}): {text}", terminal.name),
                    };
                    steps.push(step(summary, driver.send_text_args(pane, &text)));
                }
                SetupAction::SetTitle { title } => {
                    steps.push(step(
                        format!("{pane} ({}): title '{title}'", terminal.name),
                        driver.title_args(pane, &title),
                    ));
                }
            }
        }
    }

    Ok(steps)
}

fn split_summary(
    target: &str,
    created: &str,
    orientation: Orientation,
    size: &ResolvedSplitSize,
) -> String {
    match size {
        ResolvedSplitSize::Percent {
            target_percent,
            created_percent,
        } => format!(
            "split {target} {orientation}: keep {target_percent}%, new pane {created} gets {created_percent}%"
        ),
        ResolvedSplitSize::Cells {
            target_cells,
            created_cells,
        } => format!(
            "split {target} {orientation}: keep {target_cells} cells, new pane {created} gets {created_cells} cells"
        ),
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Best-effort pane geometry propagated through previewed splits.
#[derive(Debug, Default)]
struct GeometryTracker {
    sizes: BTreeMap<String, PaneSize>,
}

impl GeometryTracker {
    /// Exact entry or the nearest ancestor's.
    fn lookup(&self, virtual_id: &str) -> Option<PaneSize> {
        let mut id = virtual_id;
        loop {
            if let Some(size) = self.sizes.get(id) {
                return Some(*size);
            }
            let idx = id.rfind('.')?;
            id = &id[..idx];
        }
    }

    fn record_split(
        &mut self,
        target: &str,
        created: &str,
        orientation: Orientation,
        size: PaneSize,
        resolved: &ResolvedSplitSize,
    ) {
        let total = size.along(orientation);
        let (kept, new) = match *resolved {
            ResolvedSplitSize::Percent {
                created_percent, ..
            } => {
                let new = total * created_percent / 100;
                (total - new, new)
            }
            ResolvedSplitSize::Cells {
                target_cells,
                created_cells,
            } => (target_cells, created_cells),
        };
        self.sizes
            .insert(target.to_string(), size.with_along(orientation, kept));
        self.sizes
            .insert(created.to_string(), size.with_along(orientation, new));
    }
}
