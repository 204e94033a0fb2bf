pub mod emitter;
pub mod errors;
pub mod planner;
pub mod types;

pub use emitter::emit_plan;
pub use errors::{EmitError, PlanError};
pub use planner::{ROOT_PANE_ID, create_layout_plan};
pub use types::{
    CommandStep, EmissionSummary, EmittedTerminal, LayoutPlan, PlanEmission, PlanNode, SplitSizing,
};
