//! Page controllers.
//!
//! Each page owns its local state (form drafts, filters, messages) and
//! talks to the server only through [`crate::api::ApiClient`]. Operations
//! that leave the page return the [`Route`] to go to next.

pub mod create_task;
pub mod dashboard;
pub mod form;
pub mod login;
pub mod profile;
pub mod sessions;
pub mod signup;
pub mod task_view;
pub mod users_list;

pub use create_task::CreateTaskPage;
pub use dashboard::DashboardPage;
pub use form::{DeleteConfirmation, EditForm};
pub use login::LoginPage;
pub use profile::ProfilePage;
pub use sessions::SessionsPage;
pub use signup::SignupPage;
pub use task_view::TaskViewPage;
pub use users_list::UsersListPage;

/// Navigation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Dashboard,
    CreateTask,
    Sessions,
    Profile(String),
    UsersList,
    Task(i64),
}

impl Route {
    /// Pages that need a logged-in user.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Home | Route::Login | Route::Signup)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Login",
            Route::Signup => "Sign up",
            Route::Dashboard => "My Tasks",
            Route::CreateTask => "New Task",
            Route::Sessions => "My Sessions",
            Route::Profile(_) => "Profile",
            Route::UsersList => "Users",
            Route::Task(_) => "Edit Task",
        }
    }
}

/// Logs out from any page.
///
/// The local session is gone whatever the server says, so the user always
/// lands on the login page; a failed server call is only reported.
pub async fn logout(api: &crate::api::ApiClient) -> (Route, Option<String>) {
    match api.logout().await {
        Ok(()) => (Route::Login, None),
        Err(e) => {
            tracing::warn!("logout failed: {}", e);
            (Route::Login, Some(e.to_string()))
        }
    }
}
