//! Task filtering.
//!
//! `ticktick_filter_tasks` takes a criteria object, fetches the candidate
//! set by status (uncompleted sweep or completed-in-range query) and then
//! narrows it with [`TaskFilter::matches`]. Date containment is evaluated at
//! calendar-day granularity in the criteria's timezone, mirroring how the
//! TickTick apps treat due dates.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, TickTickError};
use crate::models::Task;
use crate::time;

/// Which completion status a filter targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Uncompleted,
    Completed,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "uncompleted" => Ok(StatusFilter::Uncompleted),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(TickTickError::Validation(format!(
                "Invalid status value '{other}'. Must be 'uncompleted' or 'completed'"
            ))),
        }
    }
}

/// An inclusive day-granularity period, optionally bounded on either side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub tz: Option<Tz>,
}

impl PeriodFilter {
    /// Build from optional ISO bound strings. Unparseable bounds are logged
    /// and dropped rather than failing the whole filter.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>, tz: Option<Tz>) -> Self {
        Self {
            start: start.and_then(|s| Self::bound_date(s, tz)),
            end: end.and_then(|s| Self::bound_date(s, tz)),
            tz,
        }
    }

    fn bound_date(input: &str, tz: Option<Tz>) -> Option<NaiveDate> {
        match time::parse_iso(input) {
            Ok(parsed) => match parsed.offset {
                // An explicit offset pins an instant; project it onto the
                // filter zone's calendar.
                Some(_) => time::task_date_in_zone(input, tz),
                None => Some(parsed.naive.date()),
            },
            Err(_) => {
                warn!(input, "ignoring unparseable filter date bound");
                None
            }
        }
    }

    /// Whether this period has any bound at all.
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Whether a task timestamp falls inside the period.
    ///
    /// A task without the relevant date (or with an unreadable one) matches
    /// only an unbounded period.
    pub fn contains(&self, date_str: Option<&str>) -> bool {
        let Some(raw) = date_str else {
            return !self.is_bounded();
        };
        let Some(task_date) = time::task_date_in_zone(raw, self.tz) else {
            return !self.is_bounded();
        };
        if let Some(start) = self.start {
            if task_date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if task_date > end {
                return false;
            }
        }
        true
    }
}

/// The full set of criteria a task must satisfy.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub project_id: Option<String>,
    pub tag_label: Option<String>,
    pub priority: Option<i32>,
    pub due_date: PeriodFilter,
    pub completion_date: PeriodFilter,
}

impl TaskFilter {
    /// Whether a task matches every criterion.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(tag) = &self.tag_label {
            if !task.tag_names().iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(project_id) = &self.project_id {
            if task.project_id.as_deref() != Some(project_id.as_str()) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority_value() != priority {
                return false;
            }
        }

        let wants_completed = self.status == StatusFilter::Completed;
        if wants_completed != task.is_completed() {
            return false;
        }

        // The date window that applies depends on which status matched.
        if !task.is_completed() {
            self.due_date.contains(task.due_date.as_deref())
        } else {
            self.completion_date.contains(task.completed_time.as_deref())
        }
    }
}

/// Raw criteria as they arrive from the MCP client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterCriteria {
    pub status: Option<String>,
    pub project_id: Option<String>,
    pub tag_label: Option<String>,
    pub priority: Option<i32>,
    pub due_start_date: Option<String>,
    pub due_end_date: Option<String>,
    pub completion_start_date: Option<String>,
    pub completion_end_date: Option<String>,
    #[serde(default)]
    pub sort_by_priority: bool,
    pub tz: Option<String>,
}

impl FilterCriteria {
    /// Resolve the criteria into an executable filter.
    ///
    /// An invalid status is an error; an unknown timezone is logged and
    /// ignored (dates then use their face value). The returned flag is
    /// `sort_by_priority`.
    pub fn build(&self) -> Result<(TaskFilter, bool)> {
        let status = match self.status.as_deref() {
            Some(value) => StatusFilter::parse(value)?,
            None => StatusFilter::Uncompleted,
        };

        let tz = match self.tz.as_deref() {
            Some(name) => match time::parse_zone(name) {
                Ok(tz) => Some(tz),
                Err(_) => {
                    warn!(zone = name, "invalid timezone in filter criteria, using local dates");
                    None
                }
            },
            None => None,
        };

        if let Some(priority) = self.priority {
            crate::validation::ToolValidator::validate_priority(priority)?;
        }

        let filter = TaskFilter {
            status,
            project_id: self.project_id.clone(),
            tag_label: self.tag_label.clone(),
            priority: self.priority,
            due_date: PeriodFilter::from_bounds(
                self.due_start_date.as_deref(),
                self.due_end_date.as_deref(),
                tz,
            ),
            completion_date: PeriodFilter::from_bounds(
                self.completion_start_date.as_deref(),
                self.completion_end_date.as_deref(),
                tz,
            ),
        };

        Ok((filter, self.sort_by_priority))
    }
}

/// Sort tasks by priority, highest first. Stable, so ties keep their
/// fetched order.
pub fn sort_by_priority_desc(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| std::cmp::Reverse(t.priority_value()));
}
