//! Per-step request resolution, execution and variable extraction.
mod context;
mod extract;
mod step;
mod template;


pub use context::{Builtins, VariableContext};
pub use extract::{apply_extractions, extract_json_path};
pub use step::{StepExecutor, StepPosition, resolve_request};
pub use template::render_template;
