//! MCP tool handler.
//!
//! Implements the [`ToolHandler`] trait on top of a [`TickTickApi`] backend.
//! The flows here mirror what the TickTick apps do for the same gestures:
//! updates send the whole merged object back, deletions resolve IDs to
//! objects first, completion is verified with a re-fetch.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{info, warn};

use ticktick_core::error::Result;
use ticktick_core::filter::{sort_by_priority_desc, StatusFilter};
use ticktick_core::models::Task;
use ticktick_core::protocol::*;
use ticktick_core::validation::{SearchKind, ToolValidator};
use ticktick_core::{time, TickTickApi, TickTickError};

use crate::trim::trim_tasks;

/// Outcome of resolving an object ID that should name a task.
enum ResolvedTask {
    Task(Task),
    /// The ID resolved to something that is not a task (a project, a tag).
    NotATask,
    Missing,
}

/// Tool handler bridging MCP tool calls to a TickTick backend.
#[derive(Clone)]
pub struct McpToolHandler<A> {
    api: Arc<A>,
}

impl<A: TickTickApi> McpToolHandler<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// All uncompleted tasks across every project, inbox included.
    ///
    /// A project that fails to list is logged and skipped so one broken
    /// project does not empty the whole sweep.
    async fn all_uncompleted_tasks(&self) -> Result<Vec<Task>> {
        let state = self.api.state().await?;
        let mut all_tasks = Vec::new();
        for project_id in state.project_ids_with_inbox() {
            match self.api.tasks_in_project(&project_id).await {
                Ok(tasks) => all_tasks.extend(tasks),
                Err(e) => {
                    warn!(project_id = %project_id, error = %e, "failed to list tasks for project");
                }
            }
        }
        info!(count = all_tasks.len(), "collected uncompleted tasks");
        Ok(all_tasks)
    }

    /// Resolve an ID expected to name a task. An object qualifies when it
    /// carries a project ID and a title, matching how the generic lookup
    /// distinguishes tasks from projects and tags.
    async fn resolve_task(&self, task_id: &str) -> Result<ResolvedTask> {
        let Some(value) = self.api.get_by_id(task_id).await? else {
            return Ok(ResolvedTask::Missing);
        };
        if !looks_like_task(&value) {
            warn!(obj_id = %task_id, "object found but it is not a task");
            return Ok(ResolvedTask::NotATask);
        }
        match serde_json::from_value::<Task>(value) {
            Ok(task) => Ok(ResolvedTask::Task(task)),
            Err(e) => {
                warn!(obj_id = %task_id, error = %e, "task object failed to deserialize");
                Ok(ResolvedTask::NotATask)
            }
        }
    }

    fn tasks_to_values(tasks: &[Task]) -> Result<Vec<Value>> {
        tasks.iter().map(Task::to_value).collect()
    }
}

fn looks_like_task(value: &Value) -> bool {
    value
        .get("projectId")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty())
        && value.get("title").is_some()
}

fn not_found_payload(what: &str, id: &str) -> Value {
    json!({
        "error": format!("{what} with ID {id} not found or invalid."),
        "status": "not_found"
    })
}

#[async_trait]
impl<A: TickTickApi> ToolHandler for McpToolHandler<A> {
    async fn create_task(&self, params: CreateTaskParams) -> Result<Value> {
        info!(title = %params.title, "creating task");
        let inbox_id = self.api.inbox_id().await?;
        let task = params.into_builder().build(&inbox_id)?;
        let created = self.api.create_task(task).await?;
        info!(task_id = ?created.id, "task created");
        created.to_value()
    }

    async fn update_task(&self, params: UpdateTaskParams) -> Result<Value> {
        let patch = params.task_object;
        let task_id = patch.require_id()?.to_string();
        info!(task_id = %task_id, "updating task");

        let mut current = self
            .api
            .get_task(&task_id)
            .await?
            .ok_or_else(|| TickTickError::not_found_task(&task_id))?;
        current.merge_patch(&patch);

        let updated = self.api.update_task(current).await?;
        updated.to_value()
    }

    async fn delete_tasks(&self, params: DeleteTasksParams) -> Result<Value> {
        let ids = params.task_ids.ids();
        if ids.is_empty() {
            return Ok(json!({"message": "No task IDs provided.", "status": "error"}));
        }

        let mut tasks_to_delete = Vec::new();
        let mut missing_ids = Vec::new();
        let mut invalid_ids = Vec::new();
        for id in &ids {
            match self.resolve_task(id).await? {
                ResolvedTask::Task(task) => tasks_to_delete.push(task),
                ResolvedTask::Missing => missing_ids.push(id.clone()),
                ResolvedTask::NotATask => invalid_ids.push(id.clone()),
            }
        }

        let mut warning = String::new();
        if !missing_ids.is_empty() {
            warn!(?missing_ids, "could not find tasks to delete");
            warning.push_str(&format!("Could not find objects for IDs: {missing_ids:?}. "));
        }
        if !invalid_ids.is_empty() {
            warn!(?invalid_ids, "objects found but they were not tasks");
            warning.push_str(&format!(
                "Found objects for IDs but they were not valid tasks: {invalid_ids:?}."
            ));
        }

        if tasks_to_delete.is_empty() {
            return Ok(json!({
                "message": "No valid tasks found for the provided ID(s) to delete.",
                "status": "not_found",
                "missing_ids": missing_ids,
                "invalid_ids": invalid_ids
            }));
        }

        let deleted_ids: Vec<String> = tasks_to_delete
            .iter()
            .filter_map(|t| t.id.clone())
            .collect();
        let api_response = self.api.delete_tasks(&tasks_to_delete).await?;

        let mut response = json!({
            "status": "success",
            "deleted_count": tasks_to_delete.len(),
            "api_response": api_response,
            "tasks_deleted_ids": deleted_ids
        });
        if !warning.is_empty() {
            response["warnings"] = json!(warning.trim());
        }
        Ok(response)
    }

    async fn get_tasks_from_project(&self, params: GetTasksFromProjectParams) -> Result<Value> {
        let tasks = self.api.tasks_in_project(&params.project_id).await?;
        let values = trim_tasks(Self::tasks_to_values(&tasks)?);
        Ok(Value::Array(values))
    }

    async fn complete_task(&self, params: CompleteTaskParams) -> Result<Value> {
        let task = match self.resolve_task(&params.task_id).await? {
            ResolvedTask::Task(task) => task,
            _ => return Ok(not_found_payload("Task", &params.task_id)),
        };

        let completed = self.api.complete_task(&task).await?;

        // Re-fetch to confirm the status actually flipped.
        match self.api.get_task(&params.task_id).await? {
            Some(refreshed) if refreshed.is_completed() => refreshed.to_value(),
            other => {
                warn!(
                    task_id = %params.task_id,
                    refetched = other.is_some(),
                    "completed task but refetch did not confirm the new status"
                );
                completed.to_value()
            }
        }
    }

    async fn move_task(&self, params: MoveTaskParams) -> Result<Value> {
        let task = match self.resolve_task(&params.task_id).await? {
            ResolvedTask::Task(task) => task,
            _ => return Ok(not_found_payload("Task", &params.task_id)),
        };

        // Let the service arbitrate an unknown destination; just flag it.
        if self.api.get_by_id(&params.new_project_id).await?.is_none() {
            warn!(
                project_id = %params.new_project_id,
                "target project for move not found in synced state"
            );
        }

        let moved = self.api.move_task(&task, &params.new_project_id).await?;
        moved.to_value()
    }

    async fn make_subtask(&self, params: MakeSubtaskParams) -> Result<Value> {
        if params.child_task_id == params.parent_task_id {
            return Err(TickTickError::Validation(
                "Child and parent task IDs cannot be the same".to_string(),
            ));
        }

        let child = match self.resolve_task(&params.child_task_id).await? {
            ResolvedTask::Task(task) => task,
            _ => return Ok(not_found_payload("Child task", &params.child_task_id)),
        };
        let parent = match self.resolve_task(&params.parent_task_id).await? {
            ResolvedTask::Task(task) => task,
            _ => return Ok(not_found_payload("Parent task", &params.parent_task_id)),
        };

        if child.project_id != parent.project_id {
            return Ok(json!({
                "error": "Tasks must be in the same project to create a subtask relationship.",
                "child_project": child.project_id,
                "parent_project": parent.project_id
            }));
        }

        let api_response = self
            .api
            .make_subtask(&child, &params.parent_task_id)
            .await?;
        let updated_parent = self.api.get_task(&params.parent_task_id).await?;

        Ok(json!({
            "message": format!(
                "Task {} successfully made a subtask of {}.",
                params.child_task_id, params.parent_task_id
            ),
            "status": "success",
            "updated_parent_task": updated_parent,
            "api_response": api_response
        }))
    }

    async fn get_by_id(&self, params: GetByIdParams) -> Result<Value> {
        let found = self.api.get_by_id(&params.obj_id).await?;
        Ok(found.unwrap_or(Value::Null))
    }

    async fn get_all(&self, params: GetAllParams) -> Result<Value> {
        let kind = ToolValidator::parse_search_kind(&params.search)?;
        self.api.sync().await?;

        match kind {
            SearchKind::Tasks => {
                let tasks = self.all_uncompleted_tasks().await?;
                let values = trim_tasks(Self::tasks_to_values(&tasks)?);
                Ok(Value::Array(values))
            }
            SearchKind::Projects => {
                let state = self.api.state().await?;
                let mut projects = vec![json!({"id": state.inbox_id, "name": "Inbox"})];
                for project in &state.projects {
                    projects.push(serde_json::to_value(project)?);
                }
                Ok(Value::Array(projects))
            }
            SearchKind::Tags => {
                let state = self.api.state().await?;
                Ok(serde_json::to_value(&state.tags)?)
            }
        }
    }

    async fn filter_tasks(&self, params: FilterTasksParams) -> Result<Value> {
        let mut criteria = params.filter_criteria.resolve()?;

        // Tag labels match against the synced tag list, so refresh first.
        self.api.sync().await?;
        if let Some(label) = criteria.tag_label.take() {
            let state = self.api.state().await?;
            criteria.tag_label = Some(state.resolve_tag_label(&label));
        }

        let (filter, sort_by_priority) = criteria.build()?;

        let mut tasks = match filter.status {
            StatusFilter::Completed => {
                if !filter.completion_date.is_bounded() {
                    warn!("fetching completed tasks requires a completion date bound; returning nothing");
                    Vec::new()
                } else {
                    let from = filter.completion_date.start.map(start_of_day);
                    let to = filter.completion_date.end.map(end_of_day);
                    self.api.completed_tasks(from, to).await?
                }
            }
            StatusFilter::Uncompleted => self.all_uncompleted_tasks().await?,
        };

        let before = tasks.len();
        tasks.retain(|task| filter.matches(task));
        info!(fetched = before, matched = tasks.len(), "filtered tasks");

        if sort_by_priority {
            sort_by_priority_desc(&mut tasks);
        }

        Ok(serde_json::to_value(&tasks)?)
    }

    async fn convert_datetime(&self, params: ConvertDatetimeParams) -> Result<Value> {
        let parsed = time::parse_iso(&params.datetime_iso_string)?;
        let tz = time::parse_zone(&params.tz)?;
        let formatted = time::to_ticktick_format(&parsed, &tz)?;
        Ok(json!({"ticktick_format": formatted}))
    }
}

fn start_of_day(date: NaiveDate) -> chrono::NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is valid")
}

fn end_of_day(date: NaiveDate) -> chrono::NaiveDateTime {
    date.and_hms_opt(23, 59, 59).expect("end of day is valid")
}
