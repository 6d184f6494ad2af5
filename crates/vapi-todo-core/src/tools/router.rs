use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use super::arguments::Arguments;
use super::envelope::{ToolCall, ToolRequest, ToolResponse, ToolResult};
use super::timestamps::resolve_window;
use crate::error::{CoreError, ValidationError};
use crate::records::{
    CalendarEntry, CalendarEntryResponse, NewCalendarEntry, NewReminder, NewTodo, Reminder,
    ReminderResponse, Todo, TodoResponse,
};
use crate::sync::{SyncService, TodoChange};

/// Every tool the assistant can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateTodo,
    GetTodos,
    CompleteTodo,
    DeleteTodo,
    AddReminder,
    GetReminders,
    DeleteReminder,
    AddCalendarEntry,
    GetCalendarEntries,
    DeleteCalendarEntry,
}

impl ToolName {
    pub const ALL: [ToolName; 10] = [
        ToolName::CreateTodo,
        ToolName::GetTodos,
        ToolName::CompleteTodo,
        ToolName::DeleteTodo,
        ToolName::AddReminder,
        ToolName::GetReminders,
        ToolName::DeleteReminder,
        ToolName::AddCalendarEntry,
        ToolName::GetCalendarEntries,
        ToolName::DeleteCalendarEntry,
    ];

    /// Function name inside the envelope.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::CreateTodo => "createTodo",
            ToolName::GetTodos => "getTodos",
            ToolName::CompleteTodo => "completeTodo",
            ToolName::DeleteTodo => "deleteTodo",
            ToolName::AddReminder => "addReminder",
            ToolName::GetReminders => "getReminders",
            ToolName::DeleteReminder => "deleteReminder",
            ToolName::AddCalendarEntry => "addCalendarEntry",
            ToolName::GetCalendarEntries => "getCalendarEntries",
            ToolName::DeleteCalendarEntry => "deleteCalendarEntry",
        }
    }

    /// HTTP path segment serving this tool.
    pub fn route(self) -> &'static str {
        match self {
            ToolName::CreateTodo => "create_todo",
            ToolName::GetTodos => "get_todos",
            ToolName::CompleteTodo => "complete_todo",
            ToolName::DeleteTodo => "delete_todo",
            ToolName::AddReminder => "add_reminder",
            ToolName::GetReminders => "get_reminders",
            ToolName::DeleteReminder => "delete_reminder",
            ToolName::AddCalendarEntry => "add_calendar_entry",
            ToolName::GetCalendarEntries => "get_calendar_entries",
            ToolName::DeleteCalendarEntry => "delete_calendar_entry",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownTool(s.to_string()))
    }
}

fn success() -> Value {
    json!("success")
}

/// Executes tool calls against the [`SyncService`].
pub struct ToolRouter {
    sync: Arc<SyncService>,
}

impl ToolRouter {
    pub fn new(sync: Arc<SyncService>) -> Self {
        Self { sync }
    }

    pub fn sync(&self) -> &SyncService {
        &self.sync
    }

    /// Run one tool and return its `result` value.
    pub async fn call(&self, tool: ToolName, args: &Arguments) -> Result<Value, CoreError> {
        tracing::debug!(tool = %tool, "dispatching tool call");
        let sync = &self.sync;

        let result = match tool {
            ToolName::CreateTodo => {
                let new = NewTodo {
                    title: args.text("title"),
                    description: args.optional_text("description"),
                };
                sync.create::<Todo>(&new).await?;
                success()
            }
            ToolName::GetTodos => {
                let todos: Vec<TodoResponse> =
                    sync.list::<Todo>()?.iter().map(TodoResponse::from).collect();
                serde_json::to_value(todos)?
            }
            ToolName::CompleteTodo => {
                sync.update::<Todo>(args.record_id()?, &TodoChange::Complete)
                    .await?;
                success()
            }
            ToolName::DeleteTodo => {
                sync.delete::<Todo>(args.record_id()?).await?;
                success()
            }
            ToolName::AddReminder => {
                let new = NewReminder {
                    reminder_text: args.text("reminder_text"),
                    importance: args.text("importance"),
                };
                sync.create::<Reminder>(&new).await?;
                success()
            }
            ToolName::GetReminders => {
                let reminders: Vec<ReminderResponse> = sync
                    .list::<Reminder>()?
                    .iter()
                    .map(ReminderResponse::from)
                    .collect();
                serde_json::to_value(reminders)?
            }
            ToolName::DeleteReminder => {
                sync.delete::<Reminder>(args.record_id()?).await?;
                success()
            }
            ToolName::AddCalendarEntry => {
                let from = args.optional_text("event_from");
                let to = args.optional_text("event_to");
                let (event_from, event_to) =
                    resolve_window(from.as_deref(), to.as_deref(), Utc::now());
                let new = NewCalendarEntry {
                    title: args.text("title"),
                    description: args.optional_text("description"),
                    event_from,
                    event_to,
                };
                sync.create::<CalendarEntry>(&new).await?;
                success()
            }
            ToolName::GetCalendarEntries => {
                let entries: Vec<CalendarEntryResponse> = sync
                    .list::<CalendarEntry>()?
                    .iter()
                    .map(CalendarEntryResponse::from)
                    .collect();
                serde_json::to_value(entries)?
            }
            ToolName::DeleteCalendarEntry => {
                sync.delete::<CalendarEntry>(args.record_id()?).await?;
                success()
            }
        };

        Ok(result)
    }

    async fn run(&self, tool: ToolName, call: &ToolCall) -> Result<ToolResult, CoreError> {
        let args = Arguments::decode(&call.function.arguments)?;
        let result = self.call(tool, &args).await?;
        Ok(ToolResult {
            tool_call_id: call.id.clone(),
            result,
        })
    }

    /// Serve a single-tool route: run the first call named `tool`.
    pub async fn handle(
        &self,
        tool: ToolName,
        request: &ToolRequest,
    ) -> Result<ToolResponse, CoreError> {
        let call = request.find(tool.as_str())?;
        let result = self.run(tool, call).await?;
        Ok(ToolResponse {
            results: vec![result],
        })
    }

    /// Run every call in the envelope, in order.
    ///
    /// A failing call yields `{"error": message}` as its result and does not
    /// stop the calls after it.
    pub async fn handle_all(&self, request: &ToolRequest) -> ToolResponse {
        let mut results = Vec::with_capacity(request.message.tool_calls.len());
        for call in &request.message.tool_calls {
            let outcome = match call.function.name.parse::<ToolName>() {
                Ok(tool) => self.run(tool, call).await,
                Err(e) => Err(e.into()),
            };
            results.push(outcome.unwrap_or_else(|e| {
                tracing::warn!(tool = %call.function.name, error = %e, "tool call failed");
                ToolResult {
                    tool_call_id: call.id.clone(),
                    result: json!({ "error": e.to_string() }),
                }
            }));
        }
        ToolResponse { results }
    }
}
