//! Tool catalog and dispatch.
//!
//! The catalog is what `tools/list` returns; dispatch routes a `tools/call`
//! by name into the handler. Failures inside tool logic are reported as
//! `{"error": ...}` payloads the agent can read; only malformed parameters
//! or unknown tool names become JSON-RPC errors.

use serde_json::{json, Value};

use ticktick_core::error::Result;
use ticktick_core::TickTickApi;

use crate::error::McpError;
use crate::handler::McpToolHandler;
use crate::serialization::{deserialize_mcp_params, error_payload};

/// Render a tool result, converting logic failures into error payloads.
fn payload_or_error(result: Result<Value>, context: &str) -> Value {
    match result {
        Ok(payload) => payload,
        Err(e) => error_payload(format!("{context}: {e}")),
    }
}

/// Execute a tool call by name.
pub async fn dispatch_tool<A: TickTickApi>(
    handler: &McpToolHandler<A>,
    name: &str,
    arguments: Value,
) -> std::result::Result<Value, McpError> {
    use ticktick_core::protocol::ToolHandler;

    let payload = match name {
        "ticktick_create_task" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.create_task(params).await, "Failed to create task")
        }
        "ticktick_update_task" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.update_task(params).await, "Failed to update task")
        }
        "ticktick_delete_tasks" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.delete_tasks(params).await, "Failed to delete tasks")
        }
        "ticktick_get_tasks_from_project" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(
                handler.get_tasks_from_project(params).await,
                "Failed to get tasks from project",
            )
        }
        "ticktick_complete_task" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.complete_task(params).await, "Failed to complete task")
        }
        "ticktick_move_task" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.move_task(params).await, "Failed to move task")
        }
        "ticktick_make_subtask" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.make_subtask(params).await, "Failed to make subtask")
        }
        "ticktick_get_by_id" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.get_by_id(params).await, "Failed to get object by ID")
        }
        "ticktick_get_all" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.get_all(params).await, "Failed to get all items")
        }
        "ticktick_filter_tasks" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.filter_tasks(params).await, "Failed to filter tasks")
        }
        "ticktick_convert_datetime_to_ticktick_format" => {
            let params = deserialize_mcp_params(arguments)?;
            payload_or_error(handler.convert_datetime(params).await, "Conversion failed")
        }
        other => return Err(McpError::Protocol(format!("Unknown tool: {other}"))),
    };

    Ok(payload)
}

/// The tool list served by `tools/list`, schemas included.
pub fn tool_catalog() -> Value {
    json!({
        "tools": [
            {
                "name": "ticktick_create_task",
                "description": "Create a new task in TickTick. Only 'title' is required; \
                    dates are ISO 8601 strings, priority is 0 (none), 1 (low), 3 (medium) \
                    or 5 (high). Without a projectId the task lands in the inbox.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "projectId": {"type": "string"},
                        "content": {"type": "string"},
                        "desc": {"type": "string"},
                        "allDay": {"type": "boolean"},
                        "startDate": {"type": "string", "description": "ISO 8601, e.g. 2024-07-27T09:00:00+09:00"},
                        "dueDate": {"type": "string", "description": "ISO 8601; a bare date means all day"},
                        "timeZone": {"type": "string", "description": "IANA zone name, e.g. Asia/Seoul"},
                        "reminders": {"type": "array", "items": {"type": "string"}, "description": "RFC 5545 triggers, e.g. TRIGGER:-PT30M"},
                        "repeat": {"type": "string", "description": "RFC 5545 rule, e.g. RRULE:FREQ=DAILY;INTERVAL=1"},
                        "priority": {"type": "integer", "enum": [0, 1, 3, 5]},
                        "sortOrder": {"type": "integer"},
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {"title": {"type": "string"}},
                                "required": ["title"]
                            },
                            "description": "Checklist subtasks; each needs at least a title"
                        }
                    },
                    "required": ["title"]
                }
            },
            {
                "name": "ticktick_update_task",
                "description": "Update an existing task. Pass the task object with its 'id' \
                    and only the fields to change; the stored task is merged and sent back whole.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "task_object": {
                            "type": "object",
                            "properties": {"id": {"type": "string"}},
                            "required": ["id"]
                        }
                    },
                    "required": ["task_object"]
                }
            },
            {
                "name": "ticktick_delete_tasks",
                "description": "Delete one or more tasks by ID. Accepts a single ID string \
                    or a list. IDs that cannot be resolved are reported in the result.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "task_ids": {
                            "oneOf": [
                                {"type": "string"},
                                {"type": "array", "items": {"type": "string"}}
                            ]
                        }
                    },
                    "required": ["task_ids"]
                }
            },
            {
                "name": "ticktick_get_tasks_from_project",
                "description": "List the uncompleted tasks of one project. Completed tasks \
                    are not included; use ticktick_filter_tasks for those.",
                "inputSchema": {
                    "type": "object",
                    "properties": {"project_id": {"type": "string"}},
                    "required": ["project_id"]
                }
            },
            {
                "name": "ticktick_complete_task",
                "description": "Mark a task as complete by ID. Completing a recurring task \
                    creates its next occurrence.",
                "inputSchema": {
                    "type": "object",
                    "properties": {"task_id": {"type": "string"}},
                    "required": ["task_id"]
                }
            },
            {
                "name": "ticktick_move_task",
                "description": "Move a task to a different project. Subtasks move with it.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "task_id": {"type": "string"},
                        "new_project_id": {"type": "string"}
                    },
                    "required": ["task_id", "new_project_id"]
                }
            },
            {
                "name": "ticktick_make_subtask",
                "description": "Make one task a subtask of another. Both tasks must belong \
                    to the same project.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "parent_task_id": {"type": "string"},
                        "child_task_id": {"type": "string"}
                    },
                    "required": ["parent_task_id", "child_task_id"]
                }
            },
            {
                "name": "ticktick_get_by_id",
                "description": "Fetch a single object (task, project, folder or tag) by its \
                    unique ID. Returns null when nothing matches.",
                "inputSchema": {
                    "type": "object",
                    "properties": {"obj_id": {"type": "string"}},
                    "required": ["obj_id"]
                }
            },
            {
                "name": "ticktick_get_all",
                "description": "List all objects of one kind: 'tasks' (uncompleted, across \
                    every project), 'projects' (inbox included) or 'tags'.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "search": {"type": "string", "enum": ["tasks", "projects", "tags"]}
                    },
                    "required": ["search"]
                }
            },
            {
                "name": "ticktick_filter_tasks",
                "description": "Find tasks matching criteria: status ('uncompleted' or \
                    'completed'), project_id, tag_label, priority, due date window \
                    (due_start_date/due_end_date), completion window \
                    (completion_start_date/completion_end_date, requires status \
                    'completed'), sort_by_priority, tz. Dates are ISO 8601 and compared \
                    at day granularity in tz.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "filter_criteria": {
                            "type": "object",
                            "properties": {
                                "status": {"type": "string", "enum": ["uncompleted", "completed"]},
                                "project_id": {"type": "string"},
                                "tag_label": {"type": "string"},
                                "priority": {"type": "integer", "enum": [0, 1, 3, 5]},
                                "due_start_date": {"type": "string"},
                                "due_end_date": {"type": "string"},
                                "completion_start_date": {"type": "string"},
                                "completion_end_date": {"type": "string"},
                                "sort_by_priority": {"type": "boolean"},
                                "tz": {"type": "string"}
                            }
                        }
                    },
                    "required": ["filter_criteria"]
                }
            },
            {
                "name": "ticktick_convert_datetime_to_ticktick_format",
                "description": "Convert an ISO 8601 date/time string to the exact date \
                    format the TickTick API expects, interpreting it in the given timezone.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "datetime_iso_string": {"type": "string"},
                        "tz": {"type": "string", "description": "IANA zone name"}
                    },
                    "required": ["datetime_iso_string", "tz"]
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_all_tools() {
        let catalog = tool_catalog();
        let tools = catalog["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        for tool in tools {
            assert!(tool["name"].as_str().unwrap().starts_with("ticktick_"));
            assert!(tool["inputSchema"]["type"] == "object");
            assert!(tool["description"].as_str().is_some());
        }
    }

    #[test]
    fn test_payload_or_error() {
        let ok = payload_or_error(Ok(json!({"id": "t1"})), "ctx");
        assert_eq!(ok["id"], "t1");

        let err = payload_or_error(
            Err(ticktick_core::TickTickError::Api("boom".into())),
            "Failed to create task",
        );
        assert_eq!(err["error"], "Failed to create task: TickTick API error: boom");
        assert_eq!(err["status"], "error");
    }
}
