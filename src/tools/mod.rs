pub mod builtin;
pub mod executor;
pub mod handler;
pub mod registry;

pub use executor::{ToolExecutor, ToolOutcome, DEFAULT_TOOL_TIMEOUT};
pub use handler::{ToolDef, ToolHandler};
pub use registry::ToolRegistry;
