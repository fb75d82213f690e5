//! End-to-end tool flows against the in-memory backend.

use std::sync::Arc;

use serde_json::{json, Value};

use mcp_protocol::{dispatch_tool, McpError, McpToolHandler};
use mocks::MockTickTickApi;
use ticktick_core::protocol::ToolHandler;
use ticktick_core::{GetAllParams, TickTickApi, TickTickError};

fn handler() -> (Arc<MockTickTickApi>, McpToolHandler<MockTickTickApi>) {
    let api = Arc::new(MockTickTickApi::with_sample_state());
    let handler = McpToolHandler::new(api.clone());
    (api, handler)
}

async fn call(
    handler: &McpToolHandler<MockTickTickApi>,
    name: &str,
    args: Value,
) -> Result<Value, McpError> {
    dispatch_tool(handler, name, args).await
}

#[tokio::test]
async fn create_task_defaults_to_inbox() {
    let (api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_create_task",
        json!({"title": "Water plants"}),
    )
    .await
    .unwrap();

    assert_eq!(result["title"], "Water plants");
    assert_eq!(result["projectId"], "inbox-1");

    let id = result["id"].as_str().unwrap();
    assert!(api.get_task(id).await.unwrap().is_some());
}

#[tokio::test]
async fn create_task_with_dates_normalizes_to_wire_format() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_create_task",
        json!({
            "title": "Team meeting",
            "projectId": "p-work",
            "startDate": "2024-07-27T09:00:00",
            "dueDate": "2024-07-27T10:30:00",
            "timeZone": "Asia/Seoul",
            "priority": 5
        }),
    )
    .await
    .unwrap();

    assert_eq!(result["startDate"], "2024-07-27T00:00:00.000+0000");
    assert_eq!(result["dueDate"], "2024-07-27T01:30:00.000+0000");
    assert_eq!(result["isAllDay"], false);
    assert_eq!(result["priority"], 5);
}

#[tokio::test]
async fn create_task_rejects_bad_dates_as_error_payload() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_create_task",
        json!({"title": "Meeting", "dueDate": "next friday"}),
    )
    .await
    .unwrap();

    let message = result["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to create task:"));
    assert_eq!(result["status"], "error");
}

#[tokio::test]
async fn update_task_merges_patch_into_stored_object() {
    let (api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_update_task",
        json!({"task_object": {"id": "t-report", "title": "Q3 report", "priority": 1}}),
    )
    .await
    .unwrap();

    assert_eq!(result["title"], "Q3 report");
    assert_eq!(result["priority"], 1);
    // Fields not in the patch survive the merge.
    assert_eq!(result["projectId"], "p-work");
    assert_eq!(result["dueDate"], "2024-07-26T09:00:00.000+0000");

    let stored = api.get_task("t-report").await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Q3 report"));
}

#[tokio::test]
async fn update_unknown_task_reports_error_payload() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_update_task",
        json!({"task_object": {"id": "missing", "title": "x"}}),
    )
    .await
    .unwrap();
    assert!(result["error"]
        .as_str()
        .unwrap()
        .contains("Task with ID missing not found"));
}

#[tokio::test]
async fn delete_tasks_partitions_found_missing_and_invalid() {
    let (api, handler) = handler();
    // "p-work" resolves to a project, not a task.
    let result = call(
        &handler,
        "ticktick_delete_tasks",
        json!({"task_ids": ["t-groceries", "missing-id", "p-work"]}),
    )
    .await
    .unwrap();

    assert_eq!(result["status"], "success");
    assert_eq!(result["deleted_count"], 1);
    assert_eq!(result["tasks_deleted_ids"], json!(["t-groceries"]));
    let warnings = result["warnings"].as_str().unwrap();
    assert!(warnings.contains("missing-id"));
    assert!(warnings.contains("p-work"));

    assert!(api.get_task("t-groceries").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_tasks_accepts_single_id_string() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_delete_tasks",
        json!({"task_ids": "t-groceries"}),
    )
    .await
    .unwrap();
    assert_eq!(result["deleted_count"], 1);
}

#[tokio::test]
async fn delete_tasks_with_no_resolvable_ids_reports_not_found() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_delete_tasks",
        json!({"task_ids": ["nope-1", "nope-2"]}),
    )
    .await
    .unwrap();
    assert_eq!(result["status"], "not_found");
    assert_eq!(result["missing_ids"], json!(["nope-1", "nope-2"]));
}

#[tokio::test]
async fn get_tasks_from_project_trims_bookkeeping() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_get_tasks_from_project",
        json!({"project_id": "p-work"}),
    )
    .await
    .unwrap();

    let tasks = result.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    for task in tasks {
        // status 0 is trimmed from listings.
        assert!(task.get("status").is_none());
    }
}

#[tokio::test]
async fn complete_task_flips_status_and_verifies() {
    let (api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_complete_task",
        json!({"task_id": "t-groceries"}),
    )
    .await
    .unwrap();

    assert_eq!(result["status"], 2);
    assert!(result["completedTime"].as_str().is_some());
    assert!(api.get_task("t-groceries").await.unwrap().unwrap().is_completed());
}

#[tokio::test]
async fn complete_unknown_task_reports_not_found() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_complete_task",
        json!({"task_id": "missing"}),
    )
    .await
    .unwrap();
    assert_eq!(result["status"], "not_found");
}

#[tokio::test]
async fn move_task_changes_project() {
    let (api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_move_task",
        json!({"task_id": "t-groceries", "new_project_id": "p-work"}),
    )
    .await
    .unwrap();

    assert_eq!(result["projectId"], "p-work");
    let stored = api.get_task("t-groceries").await.unwrap().unwrap();
    assert_eq!(stored.project_id.as_deref(), Some("p-work"));
}

#[tokio::test]
async fn make_subtask_requires_same_project() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_make_subtask",
        json!({"parent_task_id": "t-report", "child_task_id": "t-groceries"}),
    )
    .await
    .unwrap();

    assert_eq!(
        result["error"],
        "Tasks must be in the same project to create a subtask relationship."
    );
    assert_eq!(result["child_project"], "p-home");
    assert_eq!(result["parent_project"], "p-work");
}

#[tokio::test]
async fn make_subtask_links_and_returns_parent() {
    let (api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_make_subtask",
        json!({"parent_task_id": "t-report", "child_task_id": "t-review"}),
    )
    .await
    .unwrap();

    assert_eq!(result["status"], "success");
    assert_eq!(result["updated_parent_task"]["id"], "t-report");

    let child = api.get_task("t-review").await.unwrap().unwrap();
    assert_eq!(child.parent_id.as_deref(), Some("t-report"));
}

#[tokio::test]
async fn make_subtask_rejects_self_link() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_make_subtask",
        json!({"parent_task_id": "t-report", "child_task_id": "t-report"}),
    )
    .await
    .unwrap();
    assert!(result["error"]
        .as_str()
        .unwrap()
        .contains("cannot be the same"));
}

#[tokio::test]
async fn get_by_id_returns_null_for_unknown() {
    let (_api, handler) = handler();
    let found = call(&handler, "ticktick_get_by_id", json!({"obj_id": "p-home"}))
        .await
        .unwrap();
    assert_eq!(found["name"], "Home");

    let missing = call(&handler, "ticktick_get_by_id", json!({"obj_id": "zzz"}))
        .await
        .unwrap();
    assert!(missing.is_null());
}

#[tokio::test]
async fn get_all_projects_starts_with_inbox() {
    let (api, handler) = handler();
    let result = call(&handler, "ticktick_get_all", json!({"search": "projects"}))
        .await
        .unwrap();

    let projects = result.as_array().unwrap();
    assert_eq!(projects[0], json!({"id": "inbox-1", "name": "Inbox"}));
    assert_eq!(projects.len(), 3);
    // get_all re-syncs before reading state.
    assert_eq!(api.sync_count(), 1);
}

#[tokio::test]
async fn get_all_tasks_sweeps_every_project() {
    let (_api, handler) = handler();
    let result = call(&handler, "ticktick_get_all", json!({"search": "TASKS"}))
        .await
        .unwrap();
    assert_eq!(result.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn get_all_rejects_unknown_kind() {
    let (_api, handler) = handler();
    let result = call(&handler, "ticktick_get_all", json!({"search": "habits"}))
        .await
        .unwrap();
    assert!(result["error"].as_str().unwrap().contains("Invalid search type"));
}

#[tokio::test]
async fn filter_tasks_by_project_and_priority() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_filter_tasks",
        json!({"filter_criteria": {"project_id": "p-work", "priority": 5}}),
    )
    .await
    .unwrap();

    let tasks = result.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], "t-report");
}

#[tokio::test]
async fn filter_tasks_resolves_tag_labels() {
    let api = Arc::new(MockTickTickApi::with_sample_state());
    // Give the report task the canonical tag name.
    let mut task = api.get_task("t-report").await.unwrap().unwrap();
    task.tags = Some(vec!["work".to_string()]);
    api.update_task(task).await.unwrap();

    let handler = McpToolHandler::new(api);
    // Filter by the display label; it must resolve to the name.
    let result = call(
        &handler,
        "ticktick_filter_tasks",
        json!({"filter_criteria": {"tag_label": "Work"}}),
    )
    .await
    .unwrap();

    let tasks = result.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], "t-report");
}

#[tokio::test]
async fn filter_tasks_due_window_and_sort() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_filter_tasks",
        json!({"filter_criteria": {
            "due_start_date": "2024-07-01",
            "due_end_date": "2024-08-31",
            "sort_by_priority": true
        }}),
    )
    .await
    .unwrap();

    let tasks = result.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["id"], "t-report"); // priority 5 before 3
    assert_eq!(tasks[1]["id"], "t-review");
}

#[tokio::test]
async fn filter_completed_requires_date_bound() {
    let api = Arc::new(MockTickTickApi::new({
        let mut state = mocks::fixtures::sample_state();
        state.tasks.push(mocks::fixtures::completed_task(
            "t-done",
            "p-work",
            "2024-07-20T12:00:00.000+0000",
        ));
        state
    }));
    let handler = McpToolHandler::new(api);

    // No completion bound: nothing comes back.
    let empty = call(
        &handler,
        "ticktick_filter_tasks",
        json!({"filter_criteria": {"status": "completed"}}),
    )
    .await
    .unwrap();
    assert_eq!(empty.as_array().unwrap().len(), 0);

    // Bounded window finds the completed task.
    let found = call(
        &handler,
        "ticktick_filter_tasks",
        json!({"filter_criteria": {
            "status": "completed",
            "completion_start_date": "2024-07-18",
            "completion_end_date": "2024-07-25"
        }}),
    )
    .await
    .unwrap();
    let tasks = found.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], "t-done");
}

#[tokio::test]
async fn filter_tasks_accepts_encoded_criteria_string() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_filter_tasks",
        json!({"filter_criteria": "{\"project_id\": \"p-home\"}"}),
    )
    .await
    .unwrap();
    assert_eq!(result.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn convert_datetime_formats_for_the_wire() {
    let (_api, handler) = handler();
    let result = call(
        &handler,
        "ticktick_convert_datetime_to_ticktick_format",
        json!({"datetime_iso_string": "2025-04-26T10:00:00", "tz": "Asia/Seoul"}),
    )
    .await
    .unwrap();
    assert_eq!(result["ticktick_format"], "2025-04-26T01:00:00.000+0000");

    let bad = call(
        &handler,
        "ticktick_convert_datetime_to_ticktick_format",
        json!({"datetime_iso_string": "2025-04-26T10:00:00", "tz": "Mars/Olympus"}),
    )
    .await
    .unwrap();
    assert!(bad["error"].as_str().unwrap().contains("Invalid timezone"));
}

#[tokio::test]
async fn backend_failures_surface_as_error_payloads() {
    let (api, handler) = handler();
    api.fail_with(TickTickError::Api("status 500".into()));

    let result = call(&handler, "ticktick_get_by_id", json!({"obj_id": "t-report"}))
        .await
        .unwrap();
    assert!(result["error"]
        .as_str()
        .unwrap()
        .contains("TickTick API error: status 500"));

    // The typed handler surface propagates the error itself.
    let direct = handler
        .get_all(GetAllParams {
            search: "projects".into(),
        })
        .await;
    assert!(direct.is_err());
}

#[tokio::test]
async fn unknown_tool_is_a_protocol_error() {
    let (_api, handler) = handler();
    let err = call(&handler, "ticktick_rename_tag", json!({})).await.unwrap_err();
    assert_eq!(err.to_error_code(), -32005);
}

#[tokio::test]
async fn malformed_params_are_serialization_errors() {
    let (_api, handler) = handler();
    let err = call(&handler, "ticktick_get_by_id", json!({"wrong": 1}))
        .await
        .unwrap_err();
    assert_eq!(err.to_error_code(), -32006);
}
