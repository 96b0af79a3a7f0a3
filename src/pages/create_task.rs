use chrono::NaiveDate;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{due_date_to_utc, non_empty, NewTask};
use crate::pages::{EditForm, Route};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

impl NewTaskDraft {
    /// Blank description and missing due date are left out of the request.
    pub fn to_request(&self) -> NewTask {
        NewTask {
            title: self.title.trim().to_string(),
            description: non_empty(&self.description),
            due_date: self.due_date.map(due_date_to_utc),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTaskPage {
    pub form: EditForm<NewTaskDraft>,
    pub error: Option<String>,
}

impl CreateTaskPage {
    pub fn new() -> CreateTaskPage {
        CreateTaskPage::default()
    }

    /// Creates the task and returns to the dashboard.
    pub async fn submit(&mut self, api: &ApiClient) -> Option<Route> {
        self.error = None;
        if !self.form.can_submit() {
            return None;
        }
        let request = self.form.draft().to_request();
        if request.title.is_empty() {
            self.error = Some(ApiError::validation("Title is required").to_string());
            return None;
        }
        match api.create_task(&request).await {
            Ok(task) => {
                tracing::info!(task_id = task.id, "task created");
                self.form.mark_saved(NewTaskDraft::default());
                Some(Route::Dashboard)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}
