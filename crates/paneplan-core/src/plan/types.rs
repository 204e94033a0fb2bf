use std::collections::BTreeMap;

use serde::Serialize;

use crate::preset::{Orientation, TerminalSpec, WeightSpec};

/// A layout node annotated with its virtual pane ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum PlanNode {
    Split {
        id: String,
        orientation: Orientation,
        ratio: Vec<WeightSpec>,
        children: Vec<PlanNode>,
    },
    Terminal {
        id: String,
        terminal: TerminalSpec,
    },
}

impl PlanNode {
    pub fn id(&self) -> &str {
        match self {
            PlanNode::Split { id, .. } | PlanNode::Terminal { id, .. } => id,
        }
    }
}

/// The compiled layout with hierarchical virtual pane IDs and a single focus pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub root: PlanNode,
    pub focus_pane_id: String,
}

/// How the size argument of a binary split is determined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SplitSizing {
    /// Statically known share (in percent) the target pane keeps.
    Percent { percentage: f64 },
    /// Resolved at execution time from the live size of the pane being split.
    ///
    /// The `remaining_*` fields describe the siblings that still have to be
    /// split off the created pane after this step.
    DynamicCells {
        target: WeightSpec,
        remaining_fixed_cells: u32,
        remaining_weight: f64,
        remaining_weight_pane_count: u32,
    },
}

/// One primitive multiplexer operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommandStep {
    Split {
        id: String,
        /// Pane that is split and keeps the target share.
        target_pane_id: String,
        /// Virtual ID the newly created pane is registered under.
        created_pane_id: String,
        orientation: Orientation,
        sizing: SplitSizing,
    },
    Focus {
        id: String,
        target_pane_id: String,
    },
}

impl CommandStep {
    pub fn id(&self) -> &str {
        match self {
            CommandStep::Split { id, .. } | CommandStep::Focus { id, .. } => id,
        }
    }

    pub fn target_pane_id(&self) -> &str {
        match self {
            CommandStep::Split { target_pane_id, .. } | CommandStep::Focus { target_pane_id, .. } => {
                target_pane_id
            }
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, CommandStep::Split { .. })
    }
}

/// Per-pane setup applied after all split and focus steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmittedTerminal {
    pub virtual_pane_id: String,
    pub name: String,
    pub command: Option<String>,
    pub cwd: Option<String>,
    pub env: BTreeMap<String, String>,
    pub focus: bool,
    pub delay_ms: Option<u64>,
    pub title: Option<String>,
    pub ephemeral: bool,
    pub close_on_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionSummary {
    pub steps_count: usize,
    pub focus_pane_id: String,
    /// Virtual ID of the pane that keeps the multiplexer's original pane.
    pub initial_pane_id: String,
}

/// Flat, ordered output of the emitter. Backends execute `steps` in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEmission {
    pub steps: Vec<CommandStep>,
    pub terminals: Vec<EmittedTerminal>,
    pub summary: EmissionSummary,
    /// Hex SHA-256 over steps, terminals and summary.
    pub hash: String,
}

impl PlanEmission {
    pub fn split_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_split()).count()
    }
}
