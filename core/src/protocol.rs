//! Tool parameter types and the protocol handler trait.
//!
//! Parameter field names follow the tool contracts the agents see:
//! `ticktick_create_task` mirrors the TickTick task shape (camelCase),
//! everything else uses snake_case argument names.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::builder::TaskBuilder;
use crate::error::{Result, TickTickError};
use crate::filter::FilterCriteria;
use crate::models::{SubtaskItem, Task};

/// A parameter that accepts either a single string or a list of strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// The IDs in input order.
    pub fn ids(&self) -> Vec<String> {
        match self {
            OneOrMany::One(id) => vec![id.clone()],
            OneOrMany::Many(ids) => ids.clone(),
        }
    }

    /// Whether the caller passed a bare string.
    pub fn is_single(&self) -> bool {
        matches!(self, OneOrMany::One(_))
    }
}

/// Parameters for `ticktick_create_task`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskParams {
    pub title: String,
    #[serde(default, rename = "projectId")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default, rename = "allDay")]
    pub all_day: Option<bool>,
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, rename = "dueDate")]
    pub due_date: Option<String>,
    #[serde(default, rename = "timeZone")]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub reminders: Option<Vec<String>>,
    #[serde(default)]
    pub repeat: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default, rename = "sortOrder")]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub items: Option<Vec<SubtaskItem>>,
}

impl CreateTaskParams {
    pub fn into_builder(self) -> TaskBuilder {
        TaskBuilder {
            title: self.title,
            project_id: self.project_id,
            content: self.content,
            desc: self.desc,
            all_day: self.all_day,
            start_date: self.start_date,
            due_date: self.due_date,
            time_zone: self.time_zone,
            reminders: self.reminders,
            repeat: self.repeat,
            priority: self.priority,
            sort_order: self.sort_order,
            items: self.items,
        }
    }
}

/// Parameters for `ticktick_update_task`. The patch must carry the task ID;
/// any other non-null field overwrites the stored value.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTaskParams {
    pub task_object: Task,
}

/// Parameters for `ticktick_delete_tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteTasksParams {
    pub task_ids: OneOrMany,
}

/// Parameters for `ticktick_get_tasks_from_project`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetTasksFromProjectParams {
    pub project_id: String,
}

/// Parameters for `ticktick_complete_task`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteTaskParams {
    pub task_id: String,
}

/// Parameters for `ticktick_move_task`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveTaskParams {
    pub task_id: String,
    pub new_project_id: String,
}

/// Parameters for `ticktick_make_subtask`.
#[derive(Debug, Clone, Deserialize)]
pub struct MakeSubtaskParams {
    pub parent_task_id: String,
    pub child_task_id: String,
}

/// Parameters for `ticktick_get_by_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetByIdParams {
    pub obj_id: String,
}

/// Parameters for `ticktick_get_all`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetAllParams {
    pub search: String,
}

/// Filter criteria accepted either as a JSON object or as a JSON-encoded
/// string (both forms exist in the wild).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CriteriaInput {
    Object(FilterCriteria),
    Encoded(String),
}

impl CriteriaInput {
    pub fn resolve(self) -> Result<FilterCriteria> {
        match self {
            CriteriaInput::Object(criteria) => Ok(criteria),
            CriteriaInput::Encoded(raw) => serde_json::from_str(&raw).map_err(|e| {
                TickTickError::Validation(format!("Invalid JSON string provided: {e}"))
            }),
        }
    }
}

/// Parameters for `ticktick_filter_tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterTasksParams {
    pub filter_criteria: CriteriaInput,
}

/// Parameters for `ticktick_convert_datetime_to_ticktick_format`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertDatetimeParams {
    pub datetime_iso_string: String,
    pub tz: String,
}

/// The tool surface of the server.
///
/// Each method returns the JSON payload the tool reports back; the
/// transport renders it as an MCP text content block. Errors become
/// `{"error": ...}` payloads at that layer, so implementations just
/// propagate them with `?`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn create_task(&self, params: CreateTaskParams) -> Result<Value>;
    async fn update_task(&self, params: UpdateTaskParams) -> Result<Value>;
    async fn delete_tasks(&self, params: DeleteTasksParams) -> Result<Value>;
    async fn get_tasks_from_project(&self, params: GetTasksFromProjectParams) -> Result<Value>;
    async fn complete_task(&self, params: CompleteTaskParams) -> Result<Value>;
    async fn move_task(&self, params: MoveTaskParams) -> Result<Value>;
    async fn make_subtask(&self, params: MakeSubtaskParams) -> Result<Value>;
    async fn get_by_id(&self, params: GetByIdParams) -> Result<Value>;
    async fn get_all(&self, params: GetAllParams) -> Result<Value>;
    async fn filter_tasks(&self, params: FilterTasksParams) -> Result<Value>;
    async fn convert_datetime(&self, params: ConvertDatetimeParams) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_or_many_accepts_both_shapes() {
        let one: OneOrMany = serde_json::from_value(json!("t1")).unwrap();
        assert!(one.is_single());
        assert_eq!(one.ids(), vec!["t1"]);

        let many: OneOrMany = serde_json::from_value(json!(["t1", "t2"])).unwrap();
        assert!(!many.is_single());
        assert_eq!(many.ids(), vec!["t1", "t2"]);
    }

    #[test]
    fn test_create_params_camel_case() {
        let params: CreateTaskParams = serde_json::from_value(json!({
            "title": "Team Meeting",
            "projectId": "p1",
            "startDate": "2024-07-27T09:00:00+09:00",
            "dueDate": "2024-07-27T10:30:00+09:00",
            "timeZone": "Asia/Seoul",
            "reminders": ["TRIGGER:-PT15M"],
            "priority": 5
        }))
        .unwrap();
        assert_eq!(params.project_id.as_deref(), Some("p1"));
        assert_eq!(params.time_zone.as_deref(), Some("Asia/Seoul"));
        assert_eq!(params.priority, Some(5));
    }

    #[test]
    fn test_update_params_require_task_object() {
        let params: UpdateTaskParams = serde_json::from_value(json!({
            "task_object": {"id": "t1", "title": "Revised"}
        }))
        .unwrap();
        assert_eq!(params.task_object.id.as_deref(), Some("t1"));

        let missing: std::result::Result<UpdateTaskParams, _> =
            serde_json::from_value(json!({}));
        assert!(missing.is_err());
    }

    #[test]
    fn test_criteria_input_object_and_string() {
        let object: CriteriaInput =
            serde_json::from_value(json!({"status": "uncompleted", "priority": 5})).unwrap();
        let criteria = object.resolve().unwrap();
        assert_eq!(criteria.priority, Some(5));

        let encoded: CriteriaInput =
            serde_json::from_value(json!(r#"{"priority": 3}"#)).unwrap();
        let criteria = encoded.resolve().unwrap();
        assert_eq!(criteria.priority, Some(3));

        let bad: CriteriaInput = serde_json::from_value(json!("not json")).unwrap();
        assert!(bad.resolve().is_err());
    }
}
