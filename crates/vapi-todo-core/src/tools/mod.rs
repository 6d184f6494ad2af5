//! Tool-calling surface: envelope parsing, argument decoding and dispatch
//! of the ten record tools.

mod arguments;
pub mod envelope;
mod router;
pub mod timestamps;

pub use arguments::Arguments;
pub use envelope::{RawArguments, ToolCall, ToolRequest, ToolResponse, ToolResult};
pub use router::{ToolName, ToolRouter};
