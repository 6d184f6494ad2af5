use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use vapi_todo_core::{CoreError, ToolName, ToolRequest, ToolResponse};

use crate::state::AppState;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps core errors to HTTP responses.
pub struct AppError(CoreError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            CoreError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            other => {
                tracing::error!(error = %other, "tool call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<CoreError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn run_tool(
    state: AppState,
    tool: ToolName,
    body: Bytes,
) -> Result<Json<ToolResponse>, AppError> {
    let request = ToolRequest::parse(&body)?;
    Ok(Json(state.tools.handle(tool, &request).await?))
}

async fn tool_calls(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ToolResponse>, AppError> {
    let request = ToolRequest::parse(&body)?;
    Ok(Json(state.tools.handle_all(&request).await))
}

async fn health() -> &'static str {
    "ok"
}

/// Normalize a configured prefix to `/segment` form; `None` means root.
fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_matches('/');
    (!trimmed.is_empty()).then(|| format!("/{trimmed}"))
}

/// One POST route per tool plus `/tool_calls`, mounted under `prefix`.
pub fn router(state: AppState, prefix: &str) -> Router {
    let mut tools = Router::new().route("/tool_calls", post(tool_calls));
    for tool in ToolName::ALL {
        tools = tools.route(
            &format!("/{}", tool.route()),
            post(move |State(state): State<AppState>, body: Bytes| run_tool(state, tool, body)),
        );
    }

    let app = match normalize_prefix(prefix) {
        Some(prefix) => Router::new().nest(&prefix, tools),
        None => Router::new().merge(tools),
    };

    app.route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use vapi_todo_core::calendar::testing::{RecordedCall, RecordingCalendar};
    use vapi_todo_core::{CalendarApi, Database, SyncService, ToolRouter};

    fn app_with(calendar: &Arc<RecordingCalendar>, prefix: &str) -> Router {
        let api: Arc<dyn CalendarApi> = calendar.clone();
        let sync = SyncService::new(Database::open_memory().unwrap(), Some(api));
        router(AppState::new(ToolRouter::new(Arc::new(sync))), prefix)
    }

    async fn post_json(app: &Router, uri: &str, body: String) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn envelope(id: &str, name: &str, arguments: Value) -> String {
        json!({
            "message": {"toolCalls": [{"id": id, "function": {"name": name, "arguments": arguments}}]}
        })
        .to_string()
    }

    #[test]
    fn prefixes_are_normalized() {
        assert_eq!(normalize_prefix("/vapi_project"), Some("/vapi_project".to_string()));
        assert_eq!(normalize_prefix("vapi_project/"), Some("/vapi_project".to_string()));
        assert_eq!(normalize_prefix("/"), None);
        assert_eq!(normalize_prefix(""), None);
    }

    #[tokio::test]
    async fn create_and_list_todo() {
        let calendar = Arc::new(RecordingCalendar::new());
        let app = app_with(&calendar, "/vapi_project");

        let (status, body) = post_json(
            &app,
            "/vapi_project/create_todo",
            envelope("call-1", "createTodo", json!({"title": "Buy milk", "description": "2%"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"results": [{"toolCallId": "call-1", "result": "success"}]}));

        let (status, body) = post_json(
            &app,
            "/vapi_project/get_todos",
            envelope("call-2", "getTodos", json!("{}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["results"][0]["result"],
            json!([{"id": 1, "title": "Buy milk", "description": "2%", "completed": false}])
        );
        assert!(matches!(calendar.calls().as_slice(), [RecordedCall::Create(_)]));
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        let calendar = Arc::new(RecordingCalendar::new());
        let app = app_with(&calendar, "/vapi_project");

        let (status, body) = post_json(&app, "/vapi_project/create_todo", String::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid JSON payload."}));
    }

    #[tokio::test]
    async fn route_without_matching_call_is_bad_request() {
        let calendar = Arc::new(RecordingCalendar::new());
        let app = app_with(&calendar, "/vapi_project");

        let (status, body) = post_json(
            &app,
            "/vapi_project/delete_reminder",
            envelope("call-1", "getReminders", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "Tool call with function name 'deleteReminder' not found."})
        );
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let calendar = Arc::new(RecordingCalendar::new());
        let app = app_with(&calendar, "/vapi_project");

        let (status, body) = post_json(
            &app,
            "/vapi_project/delete_calendar_entry",
            envelope("call-1", "deleteCalendarEntry", json!({"id": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "calendar entry 42 not found"}));
        assert!(calendar.calls().is_empty());
    }

    #[tokio::test]
    async fn calendar_outage_still_succeeds() {
        let calendar = Arc::new(RecordingCalendar::failing());
        let app = app_with(&calendar, "/vapi_project");

        let (status, body) = post_json(
            &app,
            "/vapi_project/add_calendar_entry",
            envelope(
                "call-1",
                "addCalendarEntry",
                json!({"title": "Dentist", "event_from": "2024-01-01T10:00:00Z"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["result"], "success");

        let (_, body) = post_json(
            &app,
            "/vapi_project/get_calendar_entries",
            envelope("call-2", "getCalendarEntries", json!({})),
        )
        .await;
        assert_eq!(
            body["results"][0]["result"],
            json!([{
                "id": 1,
                "title": "Dentist",
                "description": null,
                "event_from": "2024-01-01T10:00:00Z",
                "event_to": "2024-01-01T11:00:00Z"
            }])
        );
    }

    #[tokio::test]
    async fn batch_endpoint_at_root_prefix() {
        let calendar = Arc::new(RecordingCalendar::new());
        let app = app_with(&calendar, "/");
        let body = json!({
            "message": {"toolCalls": [
                {"id": "a", "function": {"name": "addReminder", "arguments": {"reminder_text": "Stretch", "importance": "low"}}},
                {"id": "b", "function": {"name": "completeTodo", "arguments": {}}},
                {"id": "c", "function": {"name": "getReminders", "arguments": {}}}
            ]}
        });

        let (status, body) = post_json(&app, "/tool_calls", body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0], json!({"toolCallId": "a", "result": "success"}));
        assert_eq!(
            body["results"][1]["result"],
            json!({"error": "Validation error: Missing 'id' in arguments."})
        );
        assert_eq!(
            body["results"][2]["result"],
            json!([{"id": 1, "reminder_text": "Stretch", "importance": "low"}])
        );
    }

    #[tokio::test]
    async fn health_is_outside_prefix() {
        let calendar = Arc::new(RecordingCalendar::new());
        let app = app_with(&calendar, "/vapi_project");

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }
}
