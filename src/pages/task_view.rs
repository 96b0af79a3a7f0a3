use chrono::NaiveDate;

use crate::api::ApiClient;
use crate::models::{due_date_to_utc, non_empty, Task, TaskUpdate};
use crate::pages::{DeleteConfirmation, EditForm, Route};

/// Editable fields of a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> TaskDraft {
        TaskDraft {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task.due_date.map(|d| d.date_naive()),
            completed: task.completed,
        }
    }

    pub fn to_update(&self) -> TaskUpdate {
        TaskUpdate {
            title: self.title.trim().to_string(),
            description: non_empty(&self.description),
            due_date: self.due_date.map(due_date_to_utc),
            completed: self.completed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskViewPage {
    pub task_id: i64,
    pub task: Option<Task>,
    pub form: EditForm<TaskDraft>,
    pub confirm: DeleteConfirmation,
    pub message: Option<String>,
}

impl TaskViewPage {
    pub fn new(task_id: i64) -> TaskViewPage {
        TaskViewPage {
            task_id,
            task: None,
            form: EditForm::default(),
            confirm: DeleteConfirmation::Idle,
            message: None,
        }
    }

    pub async fn load(&mut self, api: &ApiClient) {
        match api.get_task(self.task_id).await {
            Ok(task) => {
                self.form.reset(TaskDraft::from_task(&task));
                self.task = Some(task);
                self.message = None;
            }
            Err(e) => {
                tracing::warn!(task_id = self.task_id, "failed to load task: {}", e);
                self.message = Some(e.to_string());
            }
        }
    }

    /// Saves the draft. The form stays dirty if the server refuses it.
    ///
    /// Nothing is sent until the task has loaded, or when the draft clears
    /// a description or due date: an update leaves out blank fields, so the
    /// server would keep the old value.
    pub async fn save(&mut self, api: &ApiClient) {
        if !self.form.can_submit() {
            return;
        }
        if self.task.is_none() {
            self.message = Some("The task has not been loaded.".into());
            return;
        }
        if let Some(field) = self.cleared_field() {
            self.message = Some(format!("{} can be changed but not removed.", field));
            return;
        }
        let update = self.form.draft().to_update();
        match api.update_task(self.task_id, &update).await {
            Ok(()) => {
                let stored = self.form.draft().clone();
                self.form.mark_saved(stored);
                self.message = Some("Changes saved.".into());
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn cleared_field(&self) -> Option<&'static str> {
        let (saved, draft) = (self.form.saved(), self.form.draft());
        if !saved.description.trim().is_empty() && draft.description.trim().is_empty() {
            Some("Description")
        } else if saved.due_date.is_some() && draft.due_date.is_none() {
            Some("Due date")
        } else {
            None
        }
    }

    /// Deletes the task once the prompt has been confirmed.
    pub async fn confirm_delete(&mut self, api: &ApiClient) -> Option<Route> {
        if !self.confirm.is_pending() {
            return None;
        }
        match api.delete_task(self.task_id).await {
            Ok(()) => {
                self.confirm = DeleteConfirmation::Deleted;
                Some(Route::Dashboard)
            }
            Err(e) => {
                self.confirm = DeleteConfirmation::Idle;
                self.message = Some(e.to_string());
                None
            }
        }
    }
}
