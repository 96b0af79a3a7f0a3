use crate::api::ApiClient;
use crate::context::AuthContext;
use crate::models::{User, UserUpdate};
use crate::pages::{DeleteConfirmation, EditForm, Route};

/// Editable profile fields. A blank password means "keep the current one".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl ProfileDraft {
    pub fn from_user(user: &User) -> ProfileDraft {
        ProfileDraft {
            name: user.name.clone(),
            email: user.email.clone(),
            password: String::new(),
        }
    }

    pub fn to_update(&self) -> UserUpdate {
        UserUpdate {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: if self.password.is_empty() {
                None
            } else {
                Some(self.password.clone())
            },
        }
    }
}

/// Profile of `user_id`, which is the acting user or, for administrators,
/// anyone else.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub user_id: String,
    pub user: Option<User>,
    pub form: EditForm<ProfileDraft>,
    pub confirm: DeleteConfirmation,
    pub message: Option<String>,
    /// Whether the profile belongs to the acting user.
    is_self: bool,
}

impl ProfilePage {
    pub fn new(user_id: impl Into<String>, ctx: &AuthContext) -> ProfilePage {
        let user_id = user_id.into();
        ProfilePage {
            is_self: ctx.is_self(&user_id),
            user_id,
            user: None,
            form: EditForm::default(),
            confirm: DeleteConfirmation::Idle,
            message: None,
        }
    }

    pub fn is_self(&self) -> bool {
        self.is_self
    }

    pub async fn load(&mut self, api: &ApiClient) {
        match api.get_user(&self.user_id).await {
            Ok(user) => {
                self.form.reset(ProfileDraft::from_user(&user));
                self.user = Some(user);
                self.message = None;
            }
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, "failed to load profile: {}", e);
                self.message = Some(e.to_string());
            }
        }
    }

    /// Saves the draft; the password field is cleared afterwards.
    pub async fn save(&mut self, api: &ApiClient) {
        if !self.form.can_submit() {
            return;
        }
        let update = self.form.draft().to_update();
        match api.update_user(&self.user_id, &update).await {
            Ok(()) => {
                let stored = ProfileDraft {
                    name: update.name.clone(),
                    email: update.email.clone(),
                    password: String::new(),
                };
                if let Some(user) = self.user.as_mut() {
                    user.name = update.name;
                    user.email = update.email;
                }
                self.form.mark_saved(stored);
                self.message = Some("Changes saved.".into());
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    /// Deletes the account once confirmed.
    ///
    /// Deleting your own account ends the local session and goes home; an
    /// administrator deleting someone else returns to the users list.
    pub async fn confirm_delete(&mut self, api: &ApiClient) -> Option<Route> {
        if !self.confirm.is_pending() {
            return None;
        }
        match api.delete_user(&self.user_id).await {
            Ok(()) => {
                self.confirm = DeleteConfirmation::Deleted;
                if self.is_self {
                    if let Err(e) = api.session().clear() {
                        tracing::warn!("failed to clear session after account deletion: {}", e);
                    }
                    Some(Route::Home)
                } else {
                    Some(Route::UsersList)
                }
            }
            Err(e) => {
                self.confirm = DeleteConfirmation::Idle;
                self.message = Some(e.to_string());
                None
            }
        }
    }
}
