//! Deserialization of the `batch/check` sync payload.

use serde::Deserialize;

use ticktick_core::models::{Project, ProjectFolder, SyncState, Tag, Task};

/// The parts of the `batch/check/0` response the server consumes. The
/// endpoint returns much more; unknown fields are simply skipped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCheck {
    #[serde(default)]
    pub inbox_id: String,
    #[serde(default)]
    pub project_profiles: Option<Vec<Project>>,
    #[serde(default)]
    pub project_groups: Option<Vec<ProjectFolder>>,
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
    #[serde(default)]
    pub sync_task_bean: Option<SyncTaskBean>,
}

/// Task delta container inside the sync payload. A full sync (checkpoint 0)
/// reports every uncompleted task under `update`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTaskBean {
    #[serde(default)]
    pub update: Vec<Task>,
}

impl From<BatchCheck> for SyncState {
    fn from(check: BatchCheck) -> Self {
        SyncState {
            inbox_id: check.inbox_id,
            projects: check.project_profiles.unwrap_or_default(),
            project_folders: check.project_groups.unwrap_or_default(),
            tags: check.tags.unwrap_or_default(),
            tasks: check.sync_task_bean.map(|bean| bean.update).unwrap_or_default(),
        }
    }
}
