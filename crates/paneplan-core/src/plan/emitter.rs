use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::plan::errors::EmitError;
use crate::plan::types::{
    CommandStep, EmissionSummary, EmittedTerminal, LayoutPlan, PlanEmission, PlanNode, SplitSizing,
};
use crate::preset::WeightSpec;
use crate::ratio::normalize_ratio;

/// Flatten a layout plan into ordered command steps and per-pane terminal setup.
///
/// An N-way split becomes N-1 binary splits. Step `k` keeps child `k` in the pane being
/// split and creates a new pane registered under child `k + 1`'s ID. Every binary split
/// of a node is emitted before recursing into its children, so each pane exists before
/// it is referenced. One focus step closes the sequence.
pub fn emit_plan(plan: &LayoutPlan) -> Result<PlanEmission, EmitError> {
    let mut steps = Vec::new();
    emit_splits(&plan.root, &mut steps)?;
    steps.push(CommandStep::Focus {
        id: format!("focus:{}", plan.focus_pane_id),
        target_pane_id: plan.focus_pane_id.clone(),
    });

    let mut terminals = Vec::new();
    collect_terminals(&plan.root, &plan.focus_pane_id, &mut terminals);

    let initial_pane_id = terminals
        .first()
        .map(|t| t.virtual_pane_id.clone())
        .unwrap_or_else(|| plan.root.id().to_string());

    let summary = EmissionSummary {
        steps_count: steps.len(),
        focus_pane_id: plan.focus_pane_id.clone(),
        initial_pane_id,
    };

    let hash = compute_hash(&steps, &terminals, &summary)?;

    debug!(
        event = "core.plan.emit_completed",
        steps = steps.len(),
        terminals = terminals.len(),
        hash = %hash
    );

    Ok(PlanEmission {
        steps,
        terminals,
        summary,
        hash,
    })
}

fn emit_splits(node: &PlanNode, steps: &mut Vec<CommandStep>) -> Result<(), EmitError> {
    let PlanNode::Split {
        id,
        orientation,
        ratio,
        children,
    } = node
    else {
        return Ok(());
    };

    if children.len() < 2 {
        return Err(EmitError::InvalidSplit {
            path: id.clone(),
            message: format!("a split needs at least 2 children, got {}", children.len()),
        });
    }
    if ratio.len() != children.len() {
        return Err(EmitError::InvalidSplit {
            path: id.clone(),
            message: format!(
                "ratio has {} entries but there are {} children",
                ratio.len(),
                children.len()
            ),
        });
    }

    let sizings = split_sizings(ratio);
    for (k, sizing) in sizings.into_iter().enumerate() {
        let created = children[k + 1].id();
        steps.push(CommandStep::Split {
            id: format!("split:{created}"),
            target_pane_id: children[k].id().to_string(),
            created_pane_id: created.to_string(),
            orientation: *orientation,
            sizing,
        });
    }

    for child in children {
        emit_splits(child, steps)?;
    }
    Ok(())
}

/// Sizing for each of the `ratio.len() - 1` binary splits of one node.
fn split_sizings(ratio: &[WeightSpec]) -> Vec<SplitSizing> {
    let steps = ratio.len().saturating_sub(1);

    if ratio.iter().any(WeightSpec::is_fixed) {
        return (0..steps)
            .map(|k| {
                let rest = &ratio[k + 1..];
                let mut remaining_fixed_cells = 0u32;
                let mut remaining_weight = 0.0;
                let mut remaining_weight_pane_count = 0u32;
                for spec in rest {
                    match spec {
                        WeightSpec::FixedCells { cells } => {
                            remaining_fixed_cells = remaining_fixed_cells.saturating_add(*cells)
                        }
                        WeightSpec::Weight { weight } => {
                            remaining_weight += weight;
                            remaining_weight_pane_count += 1;
                        }
                    }
                }
                SplitSizing::DynamicCells {
                    target: ratio[k],
                    remaining_fixed_cells,
                    remaining_weight,
                    remaining_weight_pane_count,
                }
            })
            .collect();
    }

    let weights: Vec<f64> = ratio
        .iter()
        .map(|spec| match spec {
            WeightSpec::Weight { weight } => *weight,
            WeightSpec::FixedCells { cells } => f64::from(*cells),
        })
        .collect();
    let normalized = normalize_ratio(&weights);

    (0..steps)
        .map(|k| {
            let remaining: u32 = normalized[k..].iter().sum();
            let percentage = if remaining == 0 {
                50.0
            } else {
                f64::from(normalized[k]) / f64::from(remaining) * 100.0
            };
            SplitSizing::Percent { percentage }
        })
        .collect()
}

fn collect_terminals(node: &PlanNode, focus_pane_id: &str, out: &mut Vec<EmittedTerminal>) {
    match node {
        PlanNode::Terminal { id, terminal } => out.push(EmittedTerminal {
            virtual_pane_id: id.clone(),
            name: terminal.name.clone(),
            command: terminal.command.clone(),
            cwd: terminal.cwd.clone(),
            env: terminal.env.clone(),
            focus: id == focus_pane_id,
            delay_ms: terminal.delay_ms,
            title: terminal.title.clone(),
            ephemeral: terminal.ephemeral,
            close_on_error: terminal.close_on_error,
        }),
        PlanNode::Split { children, .. } => {
            for child in children {
                collect_terminals(child, focus_pane_id, out);
            }
        }
    }
}

#[derive(Serialize)]
struct HashInput<'a> {
    steps: &'a [CommandStep],
    terminals: &'a [EmittedTerminal],
    summary: &'a EmissionSummary,
}

fn compute_hash(
    steps: &[CommandStep],
    terminals: &[EmittedTerminal],
    summary: &EmissionSummary,
) -> Result<String, EmitError> {
    let canonical = serde_json::to_vec(&HashInput {
        steps,
        terminals,
        summary,
    })
    .map_err(|e| EmitError::Serialization {
        message: e.to_string(),
    })?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}
