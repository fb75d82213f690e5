use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TickTickError};

/// Task status value for an active (uncompleted) task.
pub const STATUS_ACTIVE: i32 = 0;
/// Task status value for a completed task.
pub const STATUS_COMPLETED: i32 = 2;

/// Task priority levels as used by the TickTick API.
///
/// The wire representation is a plain integer: 0 (none), 1 (low),
/// 3 (medium), 5 (high). Anything else is rejected at the tool boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    /// Wire value of this priority level.
    pub fn value(self) -> i32 {
        match self {
            Priority::None => 0,
            Priority::Low => 1,
            Priority::Medium => 3,
            Priority::High => 5,
        }
    }

    /// Parse a wire value into a priority level.
    pub fn from_value(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Priority::None),
            1 => Ok(Priority::Low),
            3 => Ok(Priority::Medium),
            5 => Ok(Priority::High),
            other => Err(TickTickError::Validation(format!(
                "Invalid priority {other}: must be 0 (none), 1 (low), 3 (medium) or 5 (high)"
            ))),
        }
    }
}

/// A checklist entry (subtask) inside a task.
///
/// Subtasks only carry a start date; the TickTick API does not support due
/// dates on checklist items.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<String>,
    /// Fields the API returns that we do not model explicitly.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A TickTick task.
///
/// Date fields keep the API's string representation
/// (`YYYY-MM-DDThh:mm:ss.000+0000`) verbatim; parsing happens on demand in
/// [`crate::time`]. Every field is optional because the same shape serves as
/// both full objects from the API and sparse patches from
/// `ticktick_update_task`. Unknown fields survive a round-trip through the
/// flattened `extra` map, which matters because TickTick updates expect the
/// whole object back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<SubtaskItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Whether the task is completed (any non-zero status).
    pub fn is_completed(&self) -> bool {
        self.status.unwrap_or(STATUS_ACTIVE) != STATUS_ACTIVE
    }

    /// Priority wire value, defaulting to 0 when absent.
    pub fn priority_value(&self) -> i32 {
        self.priority.unwrap_or(0)
    }

    /// Tag names on this task, empty when absent.
    pub fn tag_names(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    /// Task ID, or a validation error when missing.
    pub fn require_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TickTickError::empty_field("id"))
    }

    /// Overlay the non-null fields of `patch` onto this task.
    ///
    /// This is the merge step of `ticktick_update_task`: the caller fetches
    /// the current object, applies the sparse patch, and sends the whole
    /// thing back.
    pub fn merge_patch(&mut self, patch: &Task) {
        fn overlay<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if src.is_some() {
                *dst = src.clone();
            }
        }
        overlay(&mut self.id, &patch.id);
        overlay(&mut self.project_id, &patch.project_id);
        overlay(&mut self.title, &patch.title);
        overlay(&mut self.content, &patch.content);
        overlay(&mut self.desc, &patch.desc);
        overlay(&mut self.is_all_day, &patch.is_all_day);
        overlay(&mut self.start_date, &patch.start_date);
        overlay(&mut self.due_date, &patch.due_date);
        overlay(&mut self.time_zone, &patch.time_zone);
        overlay(&mut self.reminders, &patch.reminders);
        overlay(&mut self.repeat_flag, &patch.repeat_flag);
        overlay(&mut self.priority, &patch.priority);
        overlay(&mut self.sort_order, &patch.sort_order);
        overlay(&mut self.status, &patch.status);
        overlay(&mut self.items, &patch.items);
        overlay(&mut self.tags, &patch.tags);
        overlay(&mut self.parent_id, &patch.parent_id);
        overlay(&mut self.created_time, &patch.created_time);
        overlay(&mut self.modified_time, &patch.modified_time);
        overlay(&mut self.completed_time, &patch.completed_time);
        overlay(&mut self.etag, &patch.etag);
        overlay(&mut self.kind, &patch.kind);
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Into::into)
    }
}

/// A TickTick project (list).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A TickTick tag.
///
/// The `name` is the canonical lowercase key the API filters on; `label` is
/// the user-visible spelling.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A project folder ("project group" on the wire).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFolder {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Synchronized snapshot of the account, as produced by a `batch/check`
/// round-trip. Tasks here are the uncompleted ones the sync endpoint pushes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    pub inbox_id: String,
    pub projects: Vec<Project>,
    pub project_folders: Vec<ProjectFolder>,
    pub tags: Vec<Tag>,
    pub tasks: Vec<Task>,
}

impl SyncState {
    /// IDs of all known projects plus the inbox.
    pub fn project_ids_with_inbox(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.projects.iter().map(|p| p.id.clone()).collect();
        if !self.inbox_id.is_empty() && !ids.iter().any(|id| *id == self.inbox_id) {
            ids.push(self.inbox_id.clone());
        }
        ids
    }

    /// Look up any object by ID across tasks, projects, folders and tags
    /// (tags are keyed by name).
    pub fn find_by_id(&self, obj_id: &str) -> Option<Value> {
        if let Some(task) = self
            .tasks
            .iter()
            .find(|t| t.id.as_deref() == Some(obj_id))
        {
            return serde_json::to_value(task).ok();
        }
        if let Some(project) = self.projects.iter().find(|p| p.id == obj_id) {
            return serde_json::to_value(project).ok();
        }
        if let Some(folder) = self.project_folders.iter().find(|f| f.id == obj_id) {
            return serde_json::to_value(folder).ok();
        }
        if let Some(tag) = self.tags.iter().find(|t| t.name == obj_id) {
            return serde_json::to_value(tag).ok();
        }
        None
    }

    /// Resolve a user-supplied tag label to the canonical tag name.
    ///
    /// A label that already matches a tag name is returned as-is; a label
    /// matching a tag's display label resolves to that tag's name; anything
    /// else passes through unchanged.
    pub fn resolve_tag_label(&self, label: &str) -> String {
        for tag in &self.tags {
            if tag.name == label {
                return label.to_string();
            }
            if tag.label.as_deref() == Some(label) {
                return tag.name.clone();
            }
        }
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_from_json(value: Value) -> Task {
        serde_json::from_value(value).expect("valid task json")
    }

    #[test]
    fn test_priority_round_trip() {
        for (level, value) in [
            (Priority::None, 0),
            (Priority::Low, 1),
            (Priority::Medium, 3),
            (Priority::High, 5),
        ] {
            assert_eq!(level.value(), value);
            assert_eq!(Priority::from_value(value).unwrap(), level);
        }
        assert!(Priority::from_value(2).is_err());
        assert!(Priority::from_value(-1).is_err());
    }

    #[test]
    fn test_task_preserves_unknown_fields() {
        let task = task_from_json(json!({
            "id": "t1",
            "projectId": "p1",
            "title": "Buy milk",
            "focusSummaries": [{"pomoCount": 2}],
            "imgMode": 1
        }));
        assert_eq!(task.id.as_deref(), Some("t1"));
        assert!(task.extra.contains_key("focusSummaries"));

        let value = task.to_value().unwrap();
        assert_eq!(value["imgMode"], 1);
        assert_eq!(value["projectId"], "p1");
        // Unset optionals stay out of the payload.
        assert!(value.get("dueDate").is_none());
    }

    #[test]
    fn test_task_status_helpers() {
        let mut task = Task::default();
        assert!(!task.is_completed());
        task.status = Some(STATUS_COMPLETED);
        assert!(task.is_completed());
    }

    #[test]
    fn test_merge_patch_overlays_non_null() {
        let mut current = task_from_json(json!({
            "id": "t1",
            "projectId": "p1",
            "title": "Old title",
            "priority": 1,
            "tags": ["home"]
        }));
        let patch = task_from_json(json!({
            "id": "t1",
            "title": "New title",
            "priority": 5
        }));

        current.merge_patch(&patch);
        assert_eq!(current.title.as_deref(), Some("New title"));
        assert_eq!(current.priority, Some(5));
        // Fields absent from the patch survive.
        assert_eq!(current.project_id.as_deref(), Some("p1"));
        assert_eq!(current.tags, Some(vec!["home".to_string()]));
    }

    #[test]
    fn test_sync_state_find_by_id() {
        let state = SyncState {
            inbox_id: "inbox1".into(),
            projects: vec![Project {
                id: "p1".into(),
                name: "Work".into(),
                ..Default::default()
            }],
            project_folders: vec![ProjectFolder {
                id: "f1".into(),
                name: "Areas".into(),
                ..Default::default()
            }],
            tags: vec![Tag {
                name: "errand".into(),
                label: Some("Errand".into()),
                ..Default::default()
            }],
            tasks: vec![task_from_json(json!({"id": "t1", "title": "Call"}))],
        };

        assert_eq!(state.find_by_id("t1").unwrap()["title"], "Call");
        assert_eq!(state.find_by_id("p1").unwrap()["name"], "Work");
        assert_eq!(state.find_by_id("f1").unwrap()["name"], "Areas");
        assert_eq!(state.find_by_id("errand").unwrap()["name"], "errand");
        assert!(state.find_by_id("missing").is_none());
    }

    #[test]
    fn test_project_ids_include_inbox_once() {
        let state = SyncState {
            inbox_id: "inbox1".into(),
            projects: vec![
                Project {
                    id: "p1".into(),
                    name: "Work".into(),
                    ..Default::default()
                },
                Project {
                    id: "inbox1".into(),
                    name: "Inbox".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let ids = state.project_ids_with_inbox();
        assert_eq!(ids.iter().filter(|id| *id == "inbox1").count(), 1);
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_resolve_tag_label() {
        let state = SyncState {
            tags: vec![Tag {
                name: "deep-work".into(),
                label: Some("Deep Work".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(state.resolve_tag_label("deep-work"), "deep-work");
        assert_eq!(state.resolve_tag_label("Deep Work"), "deep-work");
        assert_eq!(state.resolve_tag_label("unknown"), "unknown");
    }
}
