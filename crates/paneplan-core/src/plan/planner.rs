use tracing::debug;

use crate::plan::errors::PlanError;
use crate::plan::types::{LayoutPlan, PlanNode};
use crate::preset::{CompiledPreset, LayoutNode};

/// Virtual ID of the layout root.
pub const ROOT_PANE_ID: &str = "root";

/// Assign hierarchical virtual IDs (`root`, `root.0`, `root.0.1`, ...) and pick the focus pane.
///
/// The terminal marked `focus = true` becomes the focus pane. Without a marker the first
/// terminal in document order is used.
pub fn create_layout_plan(preset: &CompiledPreset) -> Result<LayoutPlan, PlanError> {
    let mut terminals: Vec<(String, bool)> = Vec::new();
    let root = assign_ids(&preset.layout, ROOT_PANE_ID.to_string(), &mut terminals);

    let focused: Vec<String> = terminals
        .iter()
        .filter(|(_, focus)| *focus)
        .map(|(id, _)| id.clone())
        .collect();

    let focus_pane_id = match focused.len() {
        0 => terminals
            .first()
            .map(|(id, _)| id.clone())
            .ok_or(PlanError::NoTerminalPanes)?,
        1 => focused[0].clone(),
        _ => return Err(PlanError::MultipleFocusPanes { paths: focused }),
    };

    debug!(
        event = "core.plan.create_completed",
        preset = %preset.key,
        terminals = terminals.len(),
        focus_pane_id = %focus_pane_id
    );

    Ok(LayoutPlan {
        root,
        focus_pane_id,
    })
}

fn assign_ids(node: &LayoutNode, id: String, terminals: &mut Vec<(String, bool)>) -> PlanNode {
    match node {
        LayoutNode::Terminal(terminal) => {
            terminals.push((id.clone(), terminal.focus));
            PlanNode::Terminal {
                id,
                terminal: terminal.clone(),
            }
        }
        LayoutNode::Split(split) => {
            let children = split
                .panes
                .iter()
                .enumerate()
                .map(|(index, child)| assign_ids(child, format!("{id}.{index}"), terminals))
                .collect();
            PlanNode::Split {
                id,
                orientation: split.orientation,
                ratio: split.ratio.clone(),
                children,
            }
        }
    }
}
