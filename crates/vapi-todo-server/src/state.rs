use std::sync::Arc;

use vapi_todo_core::ToolRouter;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ToolRouter>,
}

impl AppState {
    pub fn new(tools: ToolRouter) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }
}
