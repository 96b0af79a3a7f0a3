//! One function per server endpoint.
//!
//! Each operation shapes its payload, calls [`HttpClient`], decodes the typed
//! response and turns every failure into an [`ApiError`] carrying a readable
//! message.

use std::fmt::Display;
use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{ApiError, ApiResult, HttpError};
use crate::http::HttpClient;
use crate::models::{
    CompletionUpdate, Credentials, LoginResponse, NewTask, NewUser, Session, Task, TaskUpdate, User, UserUpdate,
};
use crate::session::{SessionStore, StoredSession};

/// Which slice of the task list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
    /// Every user's tasks ordered by owner. Administrators only.
    #[value(name = "by-owner")]
    GroupedByOwner,
}

impl TaskFilter {
    pub fn path(self) -> &'static str {
        match self {
            TaskFilter::All => "/api/tasks",
            TaskFilter::Pending => "/api/tasks/pending",
            TaskFilter::Completed => "/api/tasks/completed",
            TaskFilter::GroupedByOwner => "/api/tasks/byuser",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskFilter::All => "All",
            TaskFilter::Pending => "Pending",
            TaskFilter::Completed => "Completed",
            TaskFilter::GroupedByOwner => "Grouped by owner",
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
}

impl ApiClient {
    pub fn new(http: HttpClient) -> ApiClient {
        ApiClient { http }
    }

    /// Builds a client for `config.api_url` backed by the given session store.
    pub fn connect(config: &Config, session: Arc<dyn SessionStore>) -> Result<ApiClient, HttpError> {
        let http = HttpClient::with_timeout(&config.api_url, session, Some(config.timeout))?;
        Ok(ApiClient::new(http))
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        self.http.session()
    }

    /// The user id of the current login, or [`ApiError::Unauthenticated`].
    pub fn current_user_id(&self) -> ApiResult<String> {
        self.session()
            .get()
            .map(|s| s.user_id)
            .ok_or(ApiError::Unauthenticated)
    }

    // Auth

    pub async fn create_user(&self, name: &str, email: &str, password: &str) -> ApiResult<User> {
        let body = NewUser {
            name: required(name, "Name")?,
            email: required(email, "Email")?,
            password: required_secret(password, "Password")?,
        };
        let result = self.http.post("/api/user/create", Some(&body)).await;
        self.decode(result, "Failed to create user")
    }

    /// Logs in and persists the returned token and user id.
    ///
    /// Nothing is stored when the request fails, and a rejected login leaves
    /// any existing session in place.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = Credentials {
            email: required(email, "Email")?,
            password: required_secret(password, "Password")?,
        };
        let text = self
            .http
            .post("/api/login", Some(&body))
            .await
            .map_err(|e| ApiError::from_http(e, "Failed to login"))?;
        let response: LoginResponse = self.decode(Ok(text), "Failed to login")?;
        self.session().set(StoredSession {
            token: response.token.clone(),
            user_id: response.id.to_string(),
            expires_at: response.expires_at,
        })?;
        tracing::info!(user_id = response.id, "logged in");
        Ok(response)
    }

    /// Ends the session on the server and always clears the local one.
    ///
    /// A failed server call is still returned to the caller, after the local
    /// session is gone.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self.http.post::<()>("/api/logout", None).await;
        self.session().clear()?;
        tracing::info!("local session cleared");
        self.discard(result, "Failed to logout")
    }

    // Users

    pub async fn get_user(&self, id: impl Display) -> ApiResult<User> {
        let result = self.http.get(&format!("/api/user/{}", id)).await;
        self.decode(result, "Failed to fetch user")
    }

    pub async fn get_current_user(&self) -> ApiResult<User> {
        let id = self.current_user_id()?;
        self.get_user(id).await
    }

    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        let result = self.http.get("/api/users").await;
        self.decode(result, "Failed to fetch users")
    }

    pub async fn update_user(&self, id: impl Display, update: &UserUpdate) -> ApiResult<()> {
        required(&update.name, "Name")?;
        required(&update.email, "Email")?;
        let result = self.http.put(&format!("/api/user/update/{}", id), update).await;
        self.discard(result, "Failed to update user")
    }

    pub async fn delete_user(&self, id: impl Display) -> ApiResult<()> {
        let result = self.http.delete(&format!("/api/user/delete/{}", id)).await;
        self.discard(result, "Failed to delete user")
    }

    pub async fn promote_user(&self, id: impl Display) -> ApiResult<()> {
        let result = self.http.post::<()>(&format!("/api/users/promote/{}", id), None).await;
        self.discard(result, "Failed to promote user")
    }

    // Tasks

    pub async fn list_tasks(&self, filter: TaskFilter) -> ApiResult<Vec<Task>> {
        let result = self.http.get(filter.path()).await;
        self.decode(result, "Failed to fetch tasks")
    }

    pub async fn get_tasks(&self) -> ApiResult<Vec<Task>> {
        self.list_tasks(TaskFilter::All).await
    }

    pub async fn get_pending_tasks(&self) -> ApiResult<Vec<Task>> {
        self.list_tasks(TaskFilter::Pending).await
    }

    pub async fn get_completed_tasks(&self) -> ApiResult<Vec<Task>> {
        self.list_tasks(TaskFilter::Completed).await
    }

    pub async fn get_tasks_by_owner(&self) -> ApiResult<Vec<Task>> {
        self.list_tasks(TaskFilter::GroupedByOwner).await
    }

    pub async fn get_task(&self, id: impl Display) -> ApiResult<Task> {
        let result = self.http.get(&format!("/api/task/{}", id)).await;
        self.decode(result, "Failed to fetch task")
    }

    pub async fn create_task(&self, task: &NewTask) -> ApiResult<Task> {
        required(&task.title, "Title")?;
        let result = self.http.post("/api/task/create", Some(task)).await;
        self.decode(result, "Failed to create task")
    }

    pub async fn update_task(&self, id: impl Display, update: &TaskUpdate) -> ApiResult<()> {
        required(&update.title, "Title")?;
        let result = self.http.put(&format!("/api/task/update/{}", id), update).await;
        self.discard(result, "Failed to update task")
    }

    pub async fn delete_task(&self, id: impl Display) -> ApiResult<()> {
        let result = self.http.delete(&format!("/api/task/delete/{}", id)).await;
        self.discard(result, "Failed to delete task")
    }

    pub async fn complete_task(&self, id: impl Display, completed: bool) -> ApiResult<()> {
        let result = self
            .http
            .patch(&format!("/api/task/complete/{}", id), &CompletionUpdate { completed })
            .await;
        self.discard(result, "Failed to update task status")
    }

    // Sessions

    pub async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
        let result = self.http.get("/api/sessions").await;
        self.decode(result, "Failed to fetch sessions")
    }

    fn decode<T: DeserializeOwned>(&self, result: Result<String, HttpError>, fallback: &str) -> ApiResult<T> {
        let body = result.map_err(|e| self.fail(e, fallback))?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("{}: unexpected response body: {}", fallback, e);
            ApiError::RequestFailed(fallback.to_string())
        })
    }

    fn discard(&self, result: Result<String, HttpError>, fallback: &str) -> ApiResult<()> {
        result.map(|_| ()).map_err(|e| self.fail(e, fallback))
    }

    /// A 401 means the stored token is no longer accepted, so it is dropped.
    fn fail(&self, err: HttpError, fallback: &str) -> ApiError {
        if err.status() == Some(StatusCode::UNAUTHORIZED) && self.session().get().is_some() {
            match self.session().clear() {
                Ok(()) => tracing::info!("server rejected the stored token; session cleared"),
                Err(e) => tracing::warn!("failed to clear rejected session: {}", e),
            }
        }
        ApiError::from_http(err, fallback)
    }
}

fn required(value: &str, field: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Like [`required`] but keeps surrounding whitespace, which may be part of a password.
fn required_secret(value: &str, field: &str) -> ApiResult<String> {
    if value.is_empty() {
        Err(ApiError::validation(format!("{} is required", field)))
    } else {
        Ok(value.to_string())
    }
}
