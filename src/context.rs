use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::User;

/// Who is acting, resolved once per navigation and handed to each page.
///
/// `is_admin` only decides which links and columns are offered. The server
/// still enforces every permission.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub user_id: String,
    pub user: Option<User>,
    pub is_admin: bool,
}

impl AuthContext {
    /// Reads the stored session and looks up the acting user's profile.
    ///
    /// Fails with [`ApiError::Unauthenticated`] when nobody is logged in. A
    /// failed profile lookup does not block the page: the context is
    /// returned without a profile and treated as non-admin.
    pub async fn resolve(api: &ApiClient) -> ApiResult<AuthContext> {
        let user_id = api.current_user_id()?;
        match api.get_user(&user_id).await {
            Ok(user) => Ok(AuthContext {
                is_admin: user.is_admin,
                user: Some(user),
                user_id,
            }),
            Err(ApiError::SessionStorage(e)) => Err(ApiError::SessionStorage(e)),
            Err(e) => {
                tracing::warn!(user_id = %user_id, "could not resolve profile, assuming non-admin: {}", e);
                // A rejected token clears the session; surface that as logged out.
                if api.session().get().is_none() {
                    return Err(ApiError::Unauthenticated);
                }
                Ok(AuthContext {
                    user_id,
                    user: None,
                    is_admin: false,
                })
            }
        }
    }

    /// Whether `id` names the acting user.
    pub fn is_self(&self, id: impl std::fmt::Display) -> bool {
        id.to_string() == self.user_id
    }

    pub fn display_name(&self) -> &str {
        self.user.as_ref().map(|u| u.name.as_str()).unwrap_or(self.user_id.as_str())
    }
}
