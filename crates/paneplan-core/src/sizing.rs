//! Turns split sizing intent into the numeric argument a multiplexer accepts.

use crate::executor::errors::ExecutionError;
use crate::plan::SplitSizing;
use crate::preset::WeightSpec;

/// Concrete size of one binary split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSplitSize {
    Percent {
        target_percent: u32,
        created_percent: u32,
    },
    Cells {
        target_cells: u32,
        created_cells: u32,
    },
}

impl ResolvedSplitSize {
    /// Size of the pane the split creates, as passed to `-l` / `--percent` / `--cells`.
    pub fn created_argument(&self) -> SizeArgument {
        match *self {
            ResolvedSplitSize::Percent {
                created_percent, ..
            } => SizeArgument::Percent(created_percent),
            ResolvedSplitSize::Cells { created_cells, .. } => SizeArgument::Cells(created_cells),
        }
    }
}

/// Size flag value for the created pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeArgument {
    Percent(u32),
    Cells(u32),
    /// Cell count that depends on geometry unknown at preview time.
    Unresolved(String),
}

/// Resolve the size of a split step.
///
/// `pane_cells` is the live extent of the pane being split along the split axis. It is
/// only consulted for dynamic sizing, where it is required.
pub fn resolve_split_size(
    step_id: &str,
    sizing: &SplitSizing,
    pane_cells: Option<u32>,
) -> Result<ResolvedSplitSize, ExecutionError> {
    match *sizing {
        SplitSizing::Percent { percentage } => {
            if !percentage.is_finite() {
                return Err(ExecutionError::InvalidPlan {
                    step_id: step_id.to_string(),
                    message: format!("split percentage is not a finite number ({percentage})"),
                });
            }
            let target_percent = percentage.clamp(1.0, 99.0).round() as u32;
            Ok(ResolvedSplitSize::Percent {
                target_percent,
                created_percent: 100 - target_percent,
            })
        }
        SplitSizing::DynamicCells {
            target,
            remaining_fixed_cells,
            remaining_weight,
            remaining_weight_pane_count,
        } => {
            let fail = |message: String| ExecutionError::SplitSizeResolutionFailed {
                step_id: step_id.to_string(),
                message,
            };

            let pane_cells =
                pane_cells.ok_or_else(|| fail("pane size is unknown".to_string()))?;

            let min_target = match target {
                WeightSpec::FixedCells { cells } => cells,
                WeightSpec::Weight { .. } => 1,
            };
            let min_created = remaining_fixed_cells.saturating_add(remaining_weight_pane_count);

            if u64::from(pane_cells) < u64::from(min_target) + u64::from(min_created) {
                return Err(fail(format!(
                    "pane has {pane_cells} cells but needs at least {} ({min_target} kept, {min_created} for the remaining panes)",
                    u64::from(min_target) + u64::from(min_created)
                )));
            }

            let target_cells = match target {
                WeightSpec::FixedCells { cells } => cells,
                WeightSpec::Weight { weight } => {
                    let available = f64::from(pane_cells - remaining_fixed_cells);
                    let share = weight / (weight + remaining_weight);
                    if !share.is_finite() {
                        return Err(ExecutionError::InvalidPlan {
                            step_id: step_id.to_string(),
                            message: format!("weight {weight} yields no usable share"),
                        });
                    }
                    let raw = (available * share).round();
                    let max_target = pane_cells - min_created;
                    (raw.max(0.0) as u32).clamp(min_target, max_target)
                }
            };

            let created_cells = pane_cells - target_cells;
            if created_cells == 0 || created_cells < min_created {
                return Err(fail(format!(
                    "only {created_cells} cells left for the new pane, need {}",
                    min_created.max(1)
                )));
            }

            Ok(ResolvedSplitSize::Cells {
                target_cells,
                created_cells,
            })
        }
    }
}
