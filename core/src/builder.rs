//! Construction of new task payloads from tool input.

use chrono_tz::Tz;

use crate::error::Result;
use crate::models::{SubtaskItem, Task, STATUS_ACTIVE};
use crate::time::{self, IsoDateTime};
use crate::validation::ToolValidator;

/// Builder turning `ticktick_create_task` arguments into a task payload the
/// batch endpoint accepts.
///
/// Date strings are strict ISO 8601 and get normalized to the wire format in
/// the resolved timezone (explicit `time_zone` argument, falling back to the
/// system zone). A task built from date-only input becomes an all-day task
/// unless the caller said otherwise.
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    pub title: String,
    pub project_id: Option<String>,
    pub content: Option<String>,
    pub desc: Option<String>,
    pub all_day: Option<bool>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub time_zone: Option<String>,
    pub reminders: Option<Vec<String>>,
    pub repeat: Option<String>,
    pub priority: Option<i32>,
    pub sort_order: Option<i64>,
    pub items: Option<Vec<SubtaskItem>>,
}

impl TaskBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Build the task payload. `inbox_id` is the fallback project.
    pub fn build(self, inbox_id: &str) -> Result<Task> {
        ToolValidator::require_non_empty("title", &self.title)?;
        if let Some(priority) = self.priority {
            ToolValidator::validate_priority(priority)?;
        }

        let zone = match self.time_zone.as_deref() {
            Some(name) => time::parse_zone(name)?,
            None => time::local_zone(),
        };

        let start = self.start_date.as_deref().map(time::parse_iso).transpose()?;
        let due = self.due_date.as_deref().map(time::parse_iso).transpose()?;

        let all_day = match self.all_day {
            Some(explicit) => Some(explicit),
            None => infer_all_day(start.as_ref(), due.as_ref()),
        };

        let start_date = start
            .as_ref()
            .map(|dt| time::to_ticktick_format(dt, &zone))
            .transpose()?;
        let due_date = due
            .as_ref()
            .map(|dt| time::to_ticktick_format(dt, &zone))
            .transpose()?;

        Ok(Task {
            title: Some(self.title),
            project_id: self
                .project_id
                .filter(|id| !id.is_empty())
                .or_else(|| Some(inbox_id.to_string())),
            content: self.content,
            desc: self.desc,
            is_all_day: all_day,
            start_date,
            due_date,
            time_zone: Some(zone.name().to_string()),
            reminders: self.reminders,
            repeat_flag: self.repeat,
            priority: self.priority,
            sort_order: self.sort_order,
            items: self.items,
            status: Some(STATUS_ACTIVE),
            ..Default::default()
        })
    }
}

fn infer_all_day(start: Option<&IsoDateTime>, due: Option<&IsoDateTime>) -> Option<bool> {
    match (start, due) {
        (None, None) => None,
        (start, due) => Some(
            start.map(|dt| dt.date_only).unwrap_or(true)
                && due.map(|dt| dt.date_only).unwrap_or(true),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_defaults_to_inbox() {
        let task = TaskBuilder::new("Buy milk").build("inbox42").unwrap();
        assert_eq!(task.project_id.as_deref(), Some("inbox42"));
        assert_eq!(task.title.as_deref(), Some("Buy milk"));
        assert_eq!(task.status, Some(STATUS_ACTIVE));
        assert!(task.time_zone.is_some());
    }

    #[test]
    fn test_build_keeps_explicit_project() {
        let mut builder = TaskBuilder::new("Report");
        builder.project_id = Some("p9".into());
        let task = builder.build("inbox42").unwrap();
        assert_eq!(task.project_id.as_deref(), Some("p9"));
    }

    #[test]
    fn test_build_rejects_empty_title() {
        assert!(TaskBuilder::new("  ").build("inbox").is_err());
    }

    #[test]
    fn test_build_rejects_bad_priority() {
        let mut builder = TaskBuilder::new("Report");
        builder.priority = Some(4);
        assert!(builder.build("inbox").is_err());
    }

    #[test]
    fn test_build_converts_dates_in_zone() {
        let mut builder = TaskBuilder::new("Meeting");
        builder.start_date = Some("2024-07-27T09:00:00".into());
        builder.due_date = Some("2024-07-27T10:30:00".into());
        builder.time_zone = Some("Asia/Seoul".into());
        let task = builder.build("inbox").unwrap();
        assert_eq!(task.start_date.as_deref(), Some("2024-07-27T00:00:00.000+0000"));
        assert_eq!(task.due_date.as_deref(), Some("2024-07-27T01:30:00.000+0000"));
        assert_eq!(task.time_zone.as_deref(), Some("Asia/Seoul"));
        assert_eq!(task.is_all_day, Some(false));
    }

    #[test]
    fn test_build_infers_all_day_from_date_only() {
        let mut builder = TaskBuilder::new("Ship release");
        builder.due_date = Some("2024-08-01".into());
        builder.time_zone = Some("UTC".into());
        let task = builder.build("inbox").unwrap();
        assert_eq!(task.is_all_day, Some(true));
        assert_eq!(task.due_date.as_deref(), Some("2024-08-01T00:00:00.000+0000"));
    }

    #[test]
    fn test_build_explicit_all_day_wins() {
        let mut builder = TaskBuilder::new("Ship release");
        builder.due_date = Some("2024-08-01".into());
        builder.all_day = Some(false);
        builder.time_zone = Some("UTC".into());
        let task = builder.build("inbox").unwrap();
        assert_eq!(task.is_all_day, Some(false));
    }

    #[test]
    fn test_build_rejects_invalid_date() {
        let mut builder = TaskBuilder::new("Meeting");
        builder.due_date = Some("next friday".into());
        let err = builder.build("inbox").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_build_rejects_invalid_zone() {
        let mut builder = TaskBuilder::new("Meeting");
        builder.time_zone = Some("Mars/Olympus".into());
        assert!(builder.build("inbox").is_err());
    }
}
