use crate::api::ApiClient;
use crate::context::AuthContext;
use crate::models::User;
use crate::pages::Route;

/// All accounts, for administrators.
#[derive(Debug, Clone)]
pub struct UsersListPage {
    pub users: Vec<User>,
    pub current_user_id: String,
    pub message: Option<String>,
}

impl UsersListPage {
    pub fn new(ctx: &AuthContext) -> UsersListPage {
        UsersListPage {
            users: Vec::new(),
            current_user_id: ctx.user_id.clone(),
            message: None,
        }
    }

    pub async fn load(&mut self, api: &ApiClient) {
        match api.list_users().await {
            Ok(users) => {
                self.users = users;
                self.message = None;
            }
            Err(e) => {
                tracing::warn!("failed to load users: {}", e);
                self.message = Some(e.to_string());
            }
        }
    }

    /// Only regular users can be promoted.
    pub fn can_promote(&self, id: i64) -> bool {
        self.users.iter().any(|u| u.id == id && !u.is_admin)
    }

    /// Promotes `id` and marks the row as admin once the server agrees.
    pub async fn promote(&mut self, id: i64, api: &ApiClient) {
        if !self.can_promote(id) {
            return;
        }
        match api.promote_user(id).await {
            Ok(()) => {
                if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
                    user.is_admin = true;
                }
                self.message = None;
            }
            Err(e) => {
                tracing::warn!(user_id = id, "failed to promote user: {}", e);
                self.message = Some(e.to_string());
            }
        }
    }

    pub fn edit_route(&self, id: i64) -> Route {
        Route::Profile(id.to_string())
    }
}
