//! Response slimming for task listings.
//!
//! Raw task objects from the service carry a lot of bookkeeping the agent
//! never needs. Listing tools pass their results through here to cut the
//! payload down: default-valued and empty fields disappear, as do fields
//! that only matter to the official clients.

use serde_json::Value;

/// Integer fields dropped when their value is zero.
const ZERO_VALUE_PROPS: &[&str] = &["deleted", "imgMode", "priority", "progress", "status"];

/// Fields dropped unconditionally.
const ALWAYS_REMOVE: &[&str] = &[
    "columnId",
    "commentCount",
    "completedUserId",
    "creator",
    "createdTime",
    "etag",
    "focusSummaries",
    "isFloating",
    "modifiedTime",
    "pomodoroSummaries",
    "repeatFirstData",
    "repeatFrom",
    "sortOrder",
];

/// Fields dropped when empty (null, empty string, empty array or object).
const REMOVE_WHEN_EMPTY: &[&str] = &[
    "attachments",
    "childIds",
    "desc",
    "exDate",
    "items",
    "reminder",
    "reminders",
    "repeatFlag",
    "tags",
];

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Trim one task object in place. Non-object values pass through untouched.
pub fn trim_task(task: &mut Value) {
    let Some(map) = task.as_object_mut() else {
        return;
    };

    for prop in ZERO_VALUE_PROPS {
        if map.get(*prop).and_then(Value::as_i64) == Some(0) {
            map.remove(*prop);
        }
    }

    for prop in ALWAYS_REMOVE {
        map.remove(*prop);
    }

    for prop in REMOVE_WHEN_EMPTY {
        if map.get(*prop).is_some_and(is_empty_value) {
            map.remove(*prop);
        }
    }

    if map.get("kind").and_then(Value::as_str) == Some("TEXT") {
        map.remove("kind");
    }

    if map.get("isAllDay").and_then(Value::as_bool) == Some(false) {
        map.remove("isAllDay");
    }

    let own_id = map.get("id").cloned();
    if let (Some(id), Some(repeat_id)) = (own_id, map.get("repeatTaskId")) {
        if *repeat_id == id {
            map.remove("repeatTaskId");
        }
    }
}

/// Trim a whole listing.
pub fn trim_tasks(mut tasks: Vec<Value>) -> Vec<Value> {
    for task in &mut tasks {
        trim_task(task);
    }
    tasks
}
