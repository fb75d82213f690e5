//! Backend abstraction over the TickTick service.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::error::Result;
use crate::models::{SyncState, Task};

/// Access to a TickTick account.
///
/// The HTTP client in `ticktick-client` is the production implementation;
/// the `mocks` crate provides an in-memory one for handler tests. All
/// implementations maintain a [`SyncState`] snapshot that `sync` refreshes
/// and the read operations serve from.
#[async_trait]
pub trait TickTickApi: Send + Sync {
    /// Refresh the account snapshot from the service.
    async fn sync(&self) -> Result<()>;

    /// Current snapshot of the account state.
    async fn state(&self) -> Result<SyncState>;

    /// ID of the account's inbox pseudo-project.
    async fn inbox_id(&self) -> Result<String>;

    /// Generic lookup across tasks, projects, folders and tags. Returns the
    /// raw object, or `None` when nothing carries the ID.
    async fn get_by_id(&self, obj_id: &str) -> Result<Option<Value>>;

    /// Typed task lookup.
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>>;

    /// Uncompleted tasks of one project.
    async fn tasks_in_project(&self, project_id: &str) -> Result<Vec<Task>>;

    /// Create a task and return the stored object.
    async fn create_task(&self, task: Task) -> Result<Task>;

    /// Update a task (full object) and return the stored result.
    async fn update_task(&self, task: Task) -> Result<Task>;

    /// Delete the given tasks. Returns the raw service response.
    async fn delete_tasks(&self, tasks: &[Task]) -> Result<Value>;

    /// Mark a task completed and return the stored result.
    async fn complete_task(&self, task: &Task) -> Result<Task>;

    /// Move a task to another project and return the stored result.
    async fn move_task(&self, task: &Task, dest_project_id: &str) -> Result<Task>;

    /// Make `child` a subtask of the task with `parent_id`. Returns the raw
    /// service response.
    async fn make_subtask(&self, child: &Task, parent_id: &str) -> Result<Value>;

    /// Tasks completed inside the given window. At least one bound must be
    /// present; a missing bound collapses the window to the other one.
    async fn completed_tasks(
        &self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Result<Vec<Task>>;
}
