//! In-memory [`TickTickApi`] implementation for tests.
//!
//! Behaves like a tiny TickTick account: state mutations are visible to
//! subsequent reads, IDs are assigned sequentially, and an injectable
//! failure lets tests exercise error paths.

pub mod fixtures;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use ticktick_core::error::{Result, TickTickError};
use ticktick_core::models::{SyncState, Task, STATUS_COMPLETED};
use ticktick_core::time;
use ticktick_core::TickTickApi;

struct Inner {
    state: SyncState,
    next_id: u64,
    sync_count: u64,
    fail_with: Option<TickTickError>,
}

/// Mock TickTick backend backed by a [`SyncState`] behind a mutex.
pub struct MockTickTickApi {
    inner: Mutex<Inner>,
}

impl MockTickTickApi {
    pub fn new(state: SyncState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                next_id: 1,
                sync_count: 0,
                fail_with: None,
            }),
        }
    }

    /// Mock with the standard sample account.
    pub fn with_sample_state() -> Self {
        Self::new(fixtures::sample_state())
    }

    /// Make every subsequent call fail with the given error.
    pub fn fail_with(&self, error: TickTickError) {
        self.inner.lock().fail_with = Some(error);
    }

    /// Number of `sync` calls seen so far.
    pub fn sync_count(&self) -> u64 {
        self.inner.lock().sync_count
    }

    /// Direct snapshot access for assertions.
    pub fn snapshot(&self) -> SyncState {
        self.inner.lock().state.clone()
    }

    fn check_failure(inner: &Inner) -> Result<()> {
        match &inner.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn find_task(state: &SyncState, task_id: &str) -> Option<Task> {
        state
            .tasks
            .iter()
            .find(|t| t.id.as_deref() == Some(task_id))
            .cloned()
    }
}

#[async_trait]
impl TickTickApi for MockTickTickApi {
    async fn sync(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner)?;
        inner.sync_count += 1;
        Ok(())
    }

    async fn state(&self) -> Result<SyncState> {
        let inner = self.inner.lock();
        Self::check_failure(&inner)?;
        Ok(inner.state.clone())
    }

    async fn inbox_id(&self) -> Result<String> {
        let inner = self.inner.lock();
        Self::check_failure(&inner)?;
        Ok(inner.state.inbox_id.clone())
    }

    async fn get_by_id(&self, obj_id: &str) -> Result<Option<Value>> {
        let inner = self.inner.lock();
        Self::check_failure(&inner)?;
        Ok(inner.state.find_by_id(obj_id))
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        let inner = self.inner.lock();
        Self::check_failure(&inner)?;
        Ok(Self::find_task(&inner.state, task_id))
    }

    async fn tasks_in_project(&self, project_id: &str) -> Result<Vec<Task>> {
        let inner = self.inner.lock();
        Self::check_failure(&inner)?;
        Ok(inner
            .state
            .tasks
            .iter()
            .filter(|t| t.project_id.as_deref() == Some(project_id) && !t.is_completed())
            .cloned()
            .collect())
    }

    async fn create_task(&self, mut task: Task) -> Result<Task> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner)?;
        if task.id.is_none() {
            task.id = Some(format!("mock-task-{}", inner.next_id));
            inner.next_id += 1;
        }
        task.etag = Some(format!("etag-{}", inner.next_id));
        inner.state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, task: Task) -> Result<Task> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner)?;
        let id = task.require_id()?.to_string();
        let slot = inner
            .state
            .tasks
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| TickTickError::not_found_task(&id))?;
        *slot = task.clone();
        Ok(task)
    }

    async fn delete_tasks(&self, tasks: &[Task]) -> Result<Value> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner)?;
        let ids: Vec<String> = tasks
            .iter()
            .filter_map(|t| t.id.clone())
            .collect();
        inner
            .state
            .tasks
            .retain(|t| !t.id.as_deref().is_some_and(|id| ids.iter().any(|d| d == id)));
        Ok(json!({"id2etag": {}, "id2error": {}}))
    }

    async fn complete_task(&self, task: &Task) -> Result<Task> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner)?;
        let id = task.require_id()?.to_string();
        let slot = inner
            .state
            .tasks
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| TickTickError::not_found_task(&id))?;
        slot.status = Some(STATUS_COMPLETED);
        slot.completed_time = Some(time::format_utc(Utc::now()));
        Ok(slot.clone())
    }

    async fn move_task(&self, task: &Task, dest_project_id: &str) -> Result<Task> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner)?;
        let id = task.require_id()?.to_string();
        let slot = inner
            .state
            .tasks
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| TickTickError::not_found_task(&id))?;
        slot.project_id = Some(dest_project_id.to_string());
        Ok(slot.clone())
    }

    async fn make_subtask(&self, child: &Task, parent_id: &str) -> Result<Value> {
        let mut inner = self.inner.lock();
        Self::check_failure(&inner)?;
        let id = child.require_id()?.to_string();
        let slot = inner
            .state
            .tasks
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| TickTickError::not_found_task(&id))?;
        slot.parent_id = Some(parent_id.to_string());
        let mut id2etag = serde_json::Map::new();
        id2etag.insert(id, json!("etag-sub"));
        Ok(json!({"id2etag": id2etag, "id2error": {}}))
    }

    async fn completed_tasks(
        &self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Result<Vec<Task>> {
        let inner = self.inner.lock();
        Self::check_failure(&inner)?;
        Ok(inner
            .state
            .tasks
            .iter()
            .filter(|t| t.is_completed())
            .filter(|t| {
                let Some(raw) = t.completed_time.as_deref() else {
                    return false;
                };
                let Some(parsed) = time::parse_task_date(raw) else {
                    return false;
                };
                let when = parsed.naive;
                from.map_or(true, |f| when >= f) && to.map_or(true, |u| when <= u)
            })
            .cloned()
            .collect())
    }
}
