use std::collections::BTreeMap;
use std::fmt;

use paneplan_config::{BackendKind, WindowMode};
use serde::Serialize;

/// Direction panes are laid out in a split.
///
/// `Horizontal` places panes side by side (the split axis is columns),
/// `Vertical` stacks them (the split axis is rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sizing request for one pane of a split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WeightSpec {
    /// Share of the space left after fixed-size siblings.
    Weight { weight: f64 },
    /// Exact number of terminal cells along the split axis.
    FixedCells { cells: u32 },
}

impl WeightSpec {
    pub fn is_fixed(&self) -> bool {
        matches!(self, WeightSpec::FixedCells { .. })
    }
}

impl fmt::Display for WeightSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightSpec::Weight { weight } => write!(f, "weight {}", weight),
            WeightSpec::FixedCells { cells } => write!(f, "{} cells", cells),
        }
    }
}

/// Setup instructions for a single terminal pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalSpec {
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

impl TerminalSpec {
    /// A plain shell pane with no setup.
    pub fn shell(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: None,
            cwd: None,
            env: BTreeMap::new(),
            focus: false,
            delay_ms: None,
            title: None,
            ephemeral: false,
            close_on_error: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitSpec {
    pub orientation: Orientation,
    /// One entry per pane, validated positive.
    pub ratio: Vec<WeightSpec>,
    pub panes: Vec<LayoutNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum LayoutNode {
    Split(SplitSpec),
    Terminal(TerminalSpec),
}

/// A validated preset with defaults applied. Never mutated after compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledPreset {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub backend: Option<BackendKind>,
    pub window_mode: Option<WindowMode>,
    pub layout: LayoutNode,
}

impl CompiledPreset {
    /// Number of terminal panes in the layout.
    pub fn terminal_count(&self) -> usize {
        fn count(node: &LayoutNode) -> usize {
            match node {
                LayoutNode::Terminal(_) => 1,
                LayoutNode::Split(split) => split.panes.iter().map(count).sum(),
            }
        }
        count(&self.layout)
    }
}
