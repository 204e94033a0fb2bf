//! Preset compilation: raw documents in, immutable typed layouts out.

mod compile;
pub mod errors;
pub mod types;

pub use compile::compile_preset_from_value;
pub use errors::{CompileError, CompileErrorKind};
pub use types::{CompiledPreset, LayoutNode, Orientation, SplitSpec, TerminalSpec, WeightSpec};
