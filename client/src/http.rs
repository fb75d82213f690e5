//! HTTP implementation of [`TickTickApi`] against the v2 web API.
//!
//! Authentication is two-step, matching what the official clients do: the
//! OAuth token authorizes the application, and a username/password sign-on
//! establishes the session cookie the v2 endpoints actually check. Write
//! operations go through the batch endpoints and are followed by a sync so
//! the local snapshot reflects what the service stored.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use ticktick_core::error::{Result, TickTickError};
use ticktick_core::models::{SyncState, Task, STATUS_COMPLETED};
use ticktick_core::validation::ToolValidator;
use ticktick_core::{time, TickTickApi};

use crate::oauth::OAuthToken;
use crate::state::BatchCheck;

const BASE_URL: &str = "https://api.ticktick.com/api/v2";
// The v2 endpoints are the web app's own; they expect a browser-ish agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const COMPLETED_PAGE_LIMIT: u32 = 100;

/// TickTick backend over HTTPS.
pub struct TickTickHttpClient {
    http: reqwest::Client,
    base_url: String,
    state: RwLock<SyncState>,
}

impl TickTickHttpClient {
    /// Sign on and run the initial sync against the production API.
    pub async fn connect(username: &str, password: &str, token: &OAuthToken) -> Result<Self> {
        Self::connect_with_base(BASE_URL, username, password, token).await
    }

    /// Same as [`connect`](Self::connect) with an overridable base URL.
    pub async fn connect_with_base(
        base_url: &str,
        username: &str,
        password: &str,
        token: &OAuthToken,
    ) -> Result<Self> {
        ToolValidator::require_non_empty("username", username)?;
        ToolValidator::require_non_empty("password", password)?;

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.access_token))
            .map_err(|e| TickTickError::Auth(format!("Invalid access token: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| TickTickError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let client = Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            state: RwLock::new(SyncState::default()),
        };

        client.signon(username, password).await?;
        client.sync().await?;
        info!("TickTick client connected");
        Ok(client)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Session sign-on. The session token comes back both in the body and as
    /// the `t` cookie; the cookie store carries it on every later call.
    async fn signon(&self, username: &str, password: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("user/signon"))
            .query(&[("wc", "true"), ("remember", "true")])
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .map_err(|e| TickTickError::Auth(format!("Sign-on request failed: {e}")))?;

        let body = read_json(response, "sign-on").await.map_err(|e| match e {
            TickTickError::Api(msg) => TickTickError::Auth(msg),
            other => other,
        })?;

        if body.get("token").and_then(Value::as_str).is_none() {
            return Err(TickTickError::Auth(
                "Sign-on response carries no session token".to_string(),
            ));
        }
        debug!("session established");
        Ok(())
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| TickTickError::Api(format!("GET {path} failed: {e}")))?;
        read_json(response, path).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| TickTickError::Api(format!("POST {path} failed: {e}")))?;
        read_json(response, path).await
    }

    /// Push one task through `batch/task`, re-sync, and return the stored
    /// object. The batch response maps new IDs to etags, which is how a
    /// server-assigned ID is discovered after a create.
    async fn batch_task(&self, bucket: &str, task: &Task) -> Result<Task> {
        let mut payload = serde_json::Map::new();
        payload.insert(bucket.to_string(), Value::Array(vec![task.to_value()?]));
        let response = self
            .post_json("batch/task", &Value::Object(payload))
            .await?;

        let id = task
            .id
            .clone()
            .or_else(|| first_batch_id(&response))
            .ok_or_else(|| {
                TickTickError::Api("Batch response did not identify the task".to_string())
            })?;

        self.sync().await?;
        match self.get_task(&id).await? {
            Some(stored) => Ok(stored),
            None => {
                // Not in the uncompleted snapshot (completed or deleted
                // concurrently); return what we sent, with the ID filled in.
                let mut sent = task.clone();
                sent.id = Some(id);
                Ok(sent)
            }
        }
    }
}

async fn read_json(response: reqwest::Response, context: &str) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TickTickError::Api(format!("Failed to read {context} response: {e}")))?;
    if !status.is_success() {
        return Err(TickTickError::Api(format!(
            "{context} returned status {status}: {body}"
        )));
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| TickTickError::Api(format!("Unexpected {context} response: {e}")))
}

/// First task ID mentioned in a batch response's `id2etag` map.
fn first_batch_id(response: &Value) -> Option<String> {
    response
        .get("id2etag")
        .and_then(Value::as_object)
        .and_then(|map| map.keys().next().cloned())
}

/// Format the completed-tasks window for the query string. A missing bound
/// collapses to the other bound's day.
fn completed_window(
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> Result<(String, String)> {
    let (from_dt, to_dt) = match (from, to) {
        (Some(f), Some(t)) => (f, t),
        (Some(f), None) => (
            f,
            f.date().and_hms_opt(23, 59, 59).expect("end of day is valid"),
        ),
        (None, Some(t)) => (
            t.date().and_hms_opt(0, 0, 0).expect("midnight is valid"),
            t,
        ),
        (None, None) => {
            return Err(TickTickError::Validation(
                "Completed task query requires at least one date bound".to_string(),
            ))
        }
    };
    let fmt = "%Y-%m-%d %H:%M:%S";
    Ok((
        from_dt.format(fmt).to_string(),
        to_dt.format(fmt).to_string(),
    ))
}

#[async_trait]
impl TickTickApi for TickTickHttpClient {
    async fn sync(&self) -> Result<()> {
        let payload = self.get_json("batch/check/0", &[]).await?;
        let check: BatchCheck = serde_json::from_value(payload)
            .map_err(|e| TickTickError::Api(format!("Unexpected sync response: {e}")))?;
        let new_state: SyncState = check.into();
        debug!(
            projects = new_state.projects.len(),
            tasks = new_state.tasks.len(),
            "synced account state"
        );
        *self.state.write().await = new_state;
        Ok(())
    }

    async fn state(&self) -> Result<SyncState> {
        Ok(self.state.read().await.clone())
    }

    async fn inbox_id(&self) -> Result<String> {
        let state = self.state.read().await;
        if state.inbox_id.is_empty() {
            return Err(TickTickError::Internal(
                "Inbox ID not known; sync has not completed".to_string(),
            ));
        }
        Ok(state.inbox_id.clone())
    }

    async fn get_by_id(&self, obj_id: &str) -> Result<Option<Value>> {
        Ok(self.state.read().await.find_by_id(obj_id))
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self
            .state
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.id.as_deref() == Some(task_id))
            .cloned())
    }

    async fn tasks_in_project(&self, project_id: &str) -> Result<Vec<Task>> {
        Ok(self
            .state
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.project_id.as_deref() == Some(project_id) && !t.is_completed())
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: Task) -> Result<Task> {
        self.batch_task("add", &task).await
    }

    async fn update_task(&self, task: Task) -> Result<Task> {
        task.require_id()?;
        self.batch_task("update", &task).await
    }

    async fn delete_tasks(&self, tasks: &[Task]) -> Result<Value> {
        let mut deletions = Vec::with_capacity(tasks.len());
        for task in tasks {
            deletions.push(json!({
                "taskId": task.require_id()?,
                "projectId": task.project_id
            }));
        }
        let response = self
            .post_json("batch/task", &json!({"delete": deletions}))
            .await?;
        self.sync().await?;
        Ok(response)
    }

    async fn complete_task(&self, task: &Task) -> Result<Task> {
        let mut completed = task.clone();
        completed.status = Some(STATUS_COMPLETED);
        completed.completed_time = Some(time::format_utc(Utc::now()));
        self.batch_task("update", &completed).await
    }

    async fn move_task(&self, task: &Task, dest_project_id: &str) -> Result<Task> {
        let task_id = task.require_id()?.to_string();
        let moves = json!([{
            "taskId": task_id,
            "fromProjectId": task.project_id,
            "toProjectId": dest_project_id
        }]);
        self.post_json("batch/taskProject", &moves).await?;
        self.sync().await?;
        match self.get_task(&task_id).await? {
            Some(moved) => Ok(moved),
            None => {
                let mut sent = task.clone();
                sent.project_id = Some(dest_project_id.to_string());
                Ok(sent)
            }
        }
    }

    async fn make_subtask(&self, child: &Task, parent_id: &str) -> Result<Value> {
        let links = json!([{
            "taskId": child.require_id()?,
            "parentId": parent_id,
            "projectId": child.project_id
        }]);
        let response = self.post_json("batch/taskParent", &links).await?;
        self.sync().await?;
        Ok(response)
    }

    async fn completed_tasks(
        &self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Result<Vec<Task>> {
        let (from_arg, to_arg) = completed_window(from, to)?;
        let payload = self
            .get_json(
                "project/all/completedInAll/",
                &[
                    ("from", from_arg),
                    ("to", to_arg),
                    ("limit", COMPLETED_PAGE_LIMIT.to_string()),
                ],
            )
            .await?;
        if payload.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(payload)
            .map_err(|e| TickTickError::Api(format!("Unexpected completed-tasks response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_completed_window_both_bounds() {
        let (from, to) =
            completed_window(Some(at(2024, 7, 18, 0, 0, 0)), Some(at(2024, 7, 25, 23, 59, 59)))
                .unwrap();
        assert_eq!(from, "2024-07-18 00:00:00");
        assert_eq!(to, "2024-07-25 23:59:59");
    }

    #[test]
    fn test_completed_window_single_bound_covers_the_day() {
        let (from, to) = completed_window(Some(at(2024, 7, 18, 9, 30, 0)), None).unwrap();
        assert_eq!(from, "2024-07-18 09:30:00");
        assert_eq!(to, "2024-07-18 23:59:59");

        let (from, to) = completed_window(None, Some(at(2024, 7, 25, 12, 0, 0))).unwrap();
        assert_eq!(from, "2024-07-25 00:00:00");
        assert_eq!(to, "2024-07-25 12:00:00");
    }

    #[test]
    fn test_completed_window_requires_a_bound() {
        assert!(completed_window(None, None).is_err());
    }

    #[test]
    fn test_first_batch_id() {
        let response = json!({"id2etag": {"63aa1e...": "u0pzq2xq"}, "id2error": {}});
        assert_eq!(first_batch_id(&response).unwrap(), "63aa1e...");

        assert!(first_batch_id(&json!({"id2etag": {}})).is_none());
        assert!(first_batch_id(&json!({})).is_none());
    }
}
