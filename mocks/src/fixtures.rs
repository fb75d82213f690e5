//! Canned account state for tests.

use serde_json::json;
use ticktick_core::models::{Project, SyncState, Tag, Task, STATUS_COMPLETED};

/// Build a task from shorthand. Panics on bad input, which is fine in tests.
pub fn task(id: &str, project_id: &str, title: &str) -> Task {
    serde_json::from_value(json!({
        "id": id,
        "projectId": project_id,
        "title": title,
        "status": 0
    }))
    .expect("valid task fixture")
}

/// A task with a due date and priority.
pub fn due_task(id: &str, project_id: &str, due_date: &str, priority: i32) -> Task {
    serde_json::from_value(json!({
        "id": id,
        "projectId": project_id,
        "title": format!("task {id}"),
        "status": 0,
        "dueDate": due_date,
        "priority": priority
    }))
    .expect("valid task fixture")
}

/// A completed task with a completion timestamp.
pub fn completed_task(id: &str, project_id: &str, completed_time: &str) -> Task {
    serde_json::from_value(json!({
        "id": id,
        "projectId": project_id,
        "title": format!("task {id}"),
        "status": STATUS_COMPLETED,
        "completedTime": completed_time
    }))
    .expect("valid task fixture")
}

pub fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn tag(name: &str, label: &str) -> Tag {
    Tag {
        name: name.to_string(),
        label: Some(label.to_string()),
        ..Default::default()
    }
}

/// A small account: inbox plus two projects, two tags, a handful of tasks.
pub fn sample_state() -> SyncState {
    SyncState {
        inbox_id: "inbox-1".to_string(),
        projects: vec![project("p-work", "Work"), project("p-home", "Home")],
        project_folders: vec![],
        tags: vec![tag("work", "Work"), tag("errand", "Errand")],
        tasks: vec![
            due_task("t-report", "p-work", "2024-07-26T09:00:00.000+0000", 5),
            due_task("t-review", "p-work", "2024-08-02T09:00:00.000+0000", 3),
            task("t-groceries", "p-home", "Buy groceries"),
            task("t-inbox-note", "inbox-1", "Loose note"),
        ],
    }
}
