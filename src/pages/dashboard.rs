use std::collections::BTreeMap;

use crate::api::{ApiClient, TaskFilter};
use crate::context::AuthContext;
use crate::models::Task;

/// A row of the task list: either a task or the header of an owner group.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    Task(Task),
    OwnerHeader(i64, usize), // owner id, count
}

/// The task list with its filter.
#[derive(Debug, Clone)]
pub struct DashboardPage {
    pub tasks: Vec<Task>,
    pub filter: TaskFilter,
    pub is_admin: bool,
    pub message: Option<String>,
}

impl DashboardPage {
    pub fn new(ctx: &AuthContext) -> DashboardPage {
        DashboardPage {
            tasks: Vec::new(),
            filter: TaskFilter::All,
            is_admin: ctx.is_admin,
            message: None,
        }
    }

    /// Filters offered to the acting user. Grouping by owner is admin-only.
    pub fn available_filters(&self) -> Vec<TaskFilter> {
        let mut filters = vec![TaskFilter::All, TaskFilter::Pending, TaskFilter::Completed];
        if self.is_admin {
            filters.push(TaskFilter::GroupedByOwner);
        }
        filters
    }

    /// Non-admins asking for the grouped view get the full list instead.
    pub fn effective_filter(&self, filter: TaskFilter) -> TaskFilter {
        if filter == TaskFilter::GroupedByOwner && !self.is_admin {
            TaskFilter::All
        } else {
            filter
        }
    }

    /// The filter after the current one, wrapping around.
    pub fn next_filter(&self) -> TaskFilter {
        let filters = self.available_filters();
        let i = filters.iter().position(|f| *f == self.filter).unwrap_or(0);
        filters[(i + 1) % filters.len()]
    }

    /// Fetches the list for the current filter and replaces what is shown.
    pub async fn load(&mut self, api: &ApiClient) {
        match api.list_tasks(self.filter).await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.message = None;
            }
            Err(e) => {
                tracing::warn!(filter = ?self.filter, "failed to load tasks: {}", e);
                self.message = Some(e.to_string());
            }
        }
    }

    pub async fn set_filter(&mut self, filter: TaskFilter, api: &ApiClient) {
        self.filter = self.effective_filter(filter);
        self.load(api).await;
    }

    /// Flips `completed` on the task with `id` only. Returns the new value.
    pub fn toggle_local(&mut self, id: i64) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        Some(task.completed)
    }

    /// Toggles completion optimistically, then tells the server.
    ///
    /// The local flip stays even if the request fails; the next full fetch
    /// reconciles the list with the server.
    pub async fn toggle_completion(&mut self, id: i64, api: &ApiClient) {
        let Some(completed) = self.toggle_local(id) else {
            return;
        };
        if let Err(e) = api.complete_task(id, completed).await {
            tracing::warn!(task_id = id, "failed to update completion: {}", e);
            self.message = Some(e.to_string());
        }
    }

    /// Rows to render. In the grouped view tasks are listed under a header
    /// per owner, owners in ascending id order.
    pub fn display_items(&self) -> Vec<DisplayItem> {
        if self.filter != TaskFilter::GroupedByOwner {
            return self.tasks.iter().cloned().map(DisplayItem::Task).collect();
        }

        let mut owners: BTreeMap<i64, Vec<&Task>> = BTreeMap::new();
        for t in &self.tasks {
            owners.entry(t.user_id).or_default().push(t);
        }
        let mut items = Vec::new();
        for (owner, tasks) in owners {
            items.push(DisplayItem::OwnerHeader(owner, tasks.len()));
            items.extend(tasks.into_iter().cloned().map(DisplayItem::Task));
        }
        items
    }
}
