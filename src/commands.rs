use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::api::{ApiClient, TaskFilter};
use crate::context::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::models::{parse_due_date, Task};
use crate::pages::dashboard::DisplayItem;
use crate::pages::sessions::short_token;
use crate::pages::{
    CreateTaskPage, DashboardPage, LoginPage, ProfilePage, Route, SessionsPage, SignupPage, TaskViewPage,
    UsersListPage,
};

/// Creates a new account.
pub async fn cmd_signup(api: &ApiClient, name: String, email: String, password: String) -> ApiResult<()> {
    let mut page = SignupPage { name, email, password, message: None };
    let next = page.submit(api).await;
    report(next.is_some(), page.message)?;
    println!("You can now log in with `taskhub login`.");
    Ok(())
}

/// Logs in and stores the session for later commands.
pub async fn cmd_login(api: &ApiClient, email: String, password: String) -> ApiResult<()> {
    let mut page = LoginPage { email, password, message: None };
    let next = page.submit(api).await;
    report(next.is_some(), page.message)
}

/// Logs out. The local session is removed even if the server call fails.
pub async fn cmd_logout(api: &ApiClient) -> ApiResult<()> {
    let (_, error) = crate::pages::logout(api).await;
    match error {
        Some(message) => Err(ApiError::RequestFailed(format!(
            "local session cleared, but the server reported: {}",
            message
        ))),
        None => {
            println!("Logged out.");
            Ok(())
        }
    }
}

/// Shows the acting user's profile.
pub async fn cmd_whoami(api: &ApiClient) -> ApiResult<()> {
    let user = api.get_current_user().await?;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.add_row(vec![Cell::new("ID").add_attribute(Attribute::Bold), Cell::new(user.id)]);
    table.add_row(vec![Cell::new("Name").add_attribute(Attribute::Bold), Cell::new(&user.name)]);
    table.add_row(vec![Cell::new("Email").add_attribute(Attribute::Bold), Cell::new(&user.email)]);
    table.add_row(vec![
        Cell::new("Joined").add_attribute(Attribute::Bold),
        Cell::new(format_day(user.created_at)),
    ]);
    table.add_row(vec![
        Cell::new("Role").add_attribute(Attribute::Bold),
        Cell::new(role_label(user.is_admin)),
    ]);
    println!("{table}");
    Ok(())
}

/// Lists tasks in a formatted table.
///
/// `by-owner` is only honoured for administrators; others get every task.
pub async fn cmd_list(api: &ApiClient, filter: TaskFilter) -> ApiResult<()> {
    let ctx = AuthContext::resolve(api).await?;
    let mut page = DashboardPage::new(&ctx);
    if filter == TaskFilter::GroupedByOwner && !ctx.is_admin {
        eprintln!("Grouping by owner is only available to administrators; showing all tasks.");
    }
    page.set_filter(filter, api).await;
    if let Some(message) = page.message.take() {
        return Err(ApiError::RequestFailed(message));
    }
    if page.tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut header = vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Due").add_attribute(Attribute::Bold),
        Cell::new("Time Left").add_attribute(Attribute::Bold),
        Cell::new("Updated").add_attribute(Attribute::Bold),
        Cell::new("Status").add_attribute(Attribute::Bold),
    ];
    if ctx.is_admin {
        header.push(Cell::new("Owner").add_attribute(Attribute::Bold));
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for item in page.display_items() {
        match item {
            DisplayItem::OwnerHeader(owner, count) => {
                let mut row = vec![
                    Cell::new(""),
                    Cell::new(format!("User {} ({} tasks)", owner, count))
                        .add_attribute(Attribute::Bold)
                        .fg(Color::Cyan),
                ];
                row.extend((0..4).map(|_| Cell::new("")));
                if ctx.is_admin {
                    row.push(Cell::new(""));
                }
                table.add_row(row);
            }
            DisplayItem::Task(t) => {
                table.add_row(task_row(&t, ctx.is_admin));
            }
        }
    }

    println!("{table}");
    Ok(())
}

/// Shows a single task.
pub async fn cmd_show(api: &ApiClient, id: i64) -> ApiResult<()> {
    let task = api.get_task(id).await?;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![Cell::new("ID").add_attribute(Attribute::Bold), Cell::new(task.id)]);
    table.add_row(vec![Cell::new("Title").add_attribute(Attribute::Bold), Cell::new(&task.title)]);
    table.add_row(vec![
        Cell::new("Description").add_attribute(Attribute::Bold),
        Cell::new(task.description.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![Cell::new("Due").add_attribute(Attribute::Bold), Cell::new(format_day(task.due_date))]);
    table.add_row(vec![
        Cell::new("Created").add_attribute(Attribute::Bold),
        Cell::new(format_day(task.created_at)),
    ]);
    table.add_row(vec![
        Cell::new("Updated").add_attribute(Attribute::Bold),
        Cell::new(format_day(task.updated_at)),
    ]);
    table.add_row(vec![
        Cell::new("Status").add_attribute(Attribute::Bold),
        Cell::new(status_label(task.completed)).fg(status_color(task.completed)),
    ]);
    table.add_row(vec![Cell::new("Owner").add_attribute(Attribute::Bold), Cell::new(task.user_id)]);
    println!("{table}");
    Ok(())
}

/// Adds a new task. Description and due date are optional.
pub async fn cmd_add(api: &ApiClient, title: String, description: Option<String>, due: Option<String>) -> ApiResult<()> {
    let due_date = parse_due_date(due.as_deref().unwrap_or("")).map_err(ApiError::ValidationFailed)?;
    let mut page = CreateTaskPage::new();
    page.form.edit(|d| {
        d.title = title;
        d.description = description.unwrap_or_default();
        d.due_date = due_date;
    });
    match page.submit(api).await {
        Some(_) => {
            println!("Task added.");
            Ok(())
        }
        None => Err(failure(page.error, "Title is required")),
    }
}

/// Edits an existing task's details. Only the given fields change.
///
/// Blank values are refused: the server keeps a field that is left out of
/// the update, so there is no way to remove one.
pub async fn cmd_edit(
    api: &ApiClient,
    id: i64,
    title: Option<String>,
    description: Option<String>,
    due: Option<String>,
) -> ApiResult<()> {
    if description.as_deref().is_some_and(|d| d.trim().is_empty()) {
        return Err(ApiError::validation("Description cannot be blank"));
    }
    let due_date = match due {
        Some(d) => match parse_due_date(&d).map_err(ApiError::ValidationFailed)? {
            Some(date) => Some(date),
            None => return Err(ApiError::validation("Due date cannot be blank")),
        },
        None => None,
    };
    let mut page = TaskViewPage::new(id);
    page.load(api).await;
    if page.task.is_none() {
        return Err(failure(page.message, "Failed to fetch task"));
    }
    page.form.edit(|d| {
        if let Some(t) = title { d.title = t; }
        if let Some(desc) = description { d.description = desc; }
        if let Some(due) = due_date { d.due_date = Some(due); }
    });
    if !page.form.can_submit() {
        println!("Nothing to change for task {}.", id);
        return Ok(());
    }
    page.save(api).await;
    if page.form.is_dirty() {
        return Err(failure(page.message, "Failed to update task"));
    }
    println!("Task {} updated.", id);
    Ok(())
}

/// Marks a task as complete, or pending again with `undo`.
pub async fn cmd_complete(api: &ApiClient, id: i64, undo: bool) -> ApiResult<()> {
    api.complete_task(id, !undo).await?;
    if undo {
        println!("Task {} marked as pending.", id);
    } else {
        println!("Task {} marked as complete.", id);
    }
    Ok(())
}

/// Removes a task after confirmation.
pub async fn cmd_remove(api: &ApiClient, id: i64, force: bool) -> ApiResult<()> {
    let mut page = TaskViewPage::new(id);
    page.confirm.request();
    if !force && !confirm(&format!("Delete task {}? This cannot be undone.", id)) {
        page.confirm.cancel();
        println!("Aborted.");
        return Ok(());
    }
    match page.confirm_delete(api).await {
        Some(_) => {
            println!("Task {} removed.", id);
            Ok(())
        }
        None => Err(failure(page.message, "Failed to delete task")),
    }
}

/// Lists the login sessions, newest first.
pub async fn cmd_sessions(api: &ApiClient) -> ApiResult<()> {
    let ctx = AuthContext::resolve(api).await?;
    let mut page = SessionsPage::new(&ctx);
    page.load(api).await;
    if let Some(message) = page.message.take() {
        return Err(ApiError::RequestFailed(message));
    }
    if page.sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    let mut header = vec!["ID", "Token", "Expires"];
    if page.show_owner {
        header.push("User");
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    let now = Utc::now();
    for s in &page.sessions {
        let expires = s.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
        let mut row = vec![
            Cell::new(s.id),
            Cell::new(short_token(&s.token)),
            Cell::new(expires).fg(if s.expires_at < now { Color::Grey } else { Color::Green }),
        ];
        if page.show_owner {
            row.push(Cell::new(s.user_id));
        }
        table.add_row(row);
    }
    println!("{table}");
    Ok(())
}

/// Lists all users. Administrators only.
pub async fn cmd_users_list(api: &ApiClient) -> ApiResult<()> {
    let ctx = AuthContext::resolve(api).await?;
    let mut page = UsersListPage::new(&ctx);
    page.load(api).await;
    if let Some(message) = page.message.take() {
        return Err(ApiError::RequestFailed(message));
    }
    if page.users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Name", "Email", "Joined", "Role"]);
    for u in &page.users {
        let marker = if u.id.to_string() == page.current_user_id { " (you)" } else { "" };
        table.add_row(vec![
            Cell::new(u.id),
            Cell::new(format!("{}{}", u.name, marker)),
            Cell::new(&u.email),
            Cell::new(format_day(u.created_at)),
            Cell::new(role_label(u.is_admin)).fg(if u.is_admin { Color::Magenta } else { Color::Reset }),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Promotes a user to administrator.
pub async fn cmd_promote(api: &ApiClient, id: i64) -> ApiResult<()> {
    let ctx = AuthContext::resolve(api).await?;
    let mut page = UsersListPage::new(&ctx);
    page.load(api).await;
    if let Some(message) = page.message.take() {
        return Err(ApiError::RequestFailed(message));
    }
    if !page.can_promote(id) {
        println!("User {} is already an administrator or does not exist.", id);
        return Ok(());
    }
    page.promote(id, api).await;
    match page.message.take() {
        Some(message) => Err(ApiError::RequestFailed(message)),
        None => {
            println!("User {} promoted to administrator.", id);
            Ok(())
        }
    }
}

/// Updates a profile; `id` defaults to the acting user.
pub async fn cmd_profile_edit(
    api: &ApiClient,
    id: Option<i64>,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> ApiResult<()> {
    let ctx = AuthContext::resolve(api).await?;
    let user_id = id.map(|i| i.to_string()).unwrap_or_else(|| ctx.user_id.clone());
    let mut page = ProfilePage::new(user_id.clone(), &ctx);
    page.load(api).await;
    if page.user.is_none() {
        return Err(failure(page.message, "Failed to fetch user"));
    }
    page.form.edit(|d| {
        if let Some(n) = name { d.name = n; }
        if let Some(e) = email { d.email = e; }
        if let Some(p) = password { d.password = p; }
    });
    if !page.form.can_submit() {
        println!("Nothing to change for user {}.", user_id);
        return Ok(());
    }
    page.save(api).await;
    if page.form.is_dirty() {
        return Err(failure(page.message, "Failed to update user"));
    }
    println!("Profile {} updated.", user_id);
    Ok(())
}

/// Deletes an account after confirmation; `id` defaults to the acting user.
pub async fn cmd_profile_delete(api: &ApiClient, id: Option<i64>, force: bool) -> ApiResult<()> {
    let ctx = AuthContext::resolve(api).await?;
    let user_id = id.map(|i| i.to_string()).unwrap_or_else(|| ctx.user_id.clone());
    let mut page = ProfilePage::new(user_id.clone(), &ctx);
    let prompt = if page.is_self() {
        "Delete your account? This cannot be undone.".to_string()
    } else {
        format!("Delete user {}? This cannot be undone.", user_id)
    };
    page.confirm.request();
    if !force && !confirm(&prompt) {
        page.confirm.cancel();
        println!("Aborted.");
        return Ok(());
    }
    match page.confirm_delete(api).await {
        Some(Route::Home) => {
            println!("Account deleted. You have been logged out.");
            Ok(())
        }
        Some(_) => {
            println!("User {} deleted.", user_id);
            Ok(())
        }
        None => Err(failure(page.message, "Failed to delete user")),
    }
}

fn task_row(t: &Task, show_owner: bool) -> Vec<Cell> {
    let today = Local::now().date_naive();
    let (time_left, overdue) = match t.due_date {
        Some(due) => {
            let days_left = (due.date_naive() - today).num_days();
            let s = if days_left < 0 {
                format!("{}d overdue", days_left.abs())
            } else if days_left == 0 {
                "Today".to_string()
            } else {
                format!("{}d", days_left)
            };
            (s, days_left < 0 && !t.completed)
        }
        None => ("-".to_string(), false),
    };

    let mut row = vec![
        Cell::new(t.id),
        Cell::new(&t.title),
        Cell::new(format_day(t.due_date)),
        Cell::new(time_left).fg(if overdue { Color::Red } else { Color::Reset }),
        Cell::new(format_day(t.updated_at)),
        Cell::new(status_label(t.completed)).fg(status_color(t.completed)),
    ];
    if show_owner {
        row.push(Cell::new(t.user_id));
    }
    row
}

fn format_day(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into())
}

fn status_label(completed: bool) -> &'static str {
    if completed { "Done" } else { "Pending" }
}

fn status_color(completed: bool) -> Color {
    if completed { Color::Green } else { Color::Yellow }
}

fn role_label(is_admin: bool) -> &'static str {
    if is_admin { "Administrator" } else { "User" }
}

/// Prints a page's outcome message and turns a failure into an error.
fn report(ok: bool, message: Option<String>) -> ApiResult<()> {
    if ok {
        if let Some(m) = message {
            println!("{}", m);
        }
        Ok(())
    } else {
        Err(failure(message, "Request failed"))
    }
}

fn failure(message: Option<String>, fallback: &str) -> ApiError {
    ApiError::RequestFailed(message.unwrap_or_else(|| fallback.to_string()))
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    input.trim().eq_ignore_ascii_case("y")
}
