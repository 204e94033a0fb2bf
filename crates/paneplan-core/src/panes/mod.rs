pub mod pane_map;
pub mod template;

pub use pane_map::PaneMap;
pub use template::{TemplateContext, build_name_table, resolve_template_tokens};
