use crate::api::ApiClient;
use crate::context::AuthContext;
use crate::models::Session;

/// Login history, newest expiry first.
#[derive(Debug, Clone)]
pub struct SessionsPage {
    pub sessions: Vec<Session>,
    /// Owner ids are only shown to administrators.
    pub show_owner: bool,
    pub message: Option<String>,
}

impl SessionsPage {
    pub fn new(ctx: &AuthContext) -> SessionsPage {
        SessionsPage {
            sessions: Vec::new(),
            show_owner: ctx.is_admin,
            message: None,
        }
    }

    pub async fn load(&mut self, api: &ApiClient) {
        match api.list_sessions().await {
            Ok(mut sessions) => {
                sort_by_expiry(&mut sessions);
                self.sessions = sessions;
                self.message = None;
            }
            Err(e) => {
                tracing::warn!("failed to load sessions: {}", e);
                self.message = Some(e.to_string());
            }
        }
    }
}

pub fn sort_by_expiry(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.expires_at.cmp(&a.expires_at));
}

const TOKEN_PREFIX_LEN: usize = 8;

/// Tokens are listed by their first characters only.
pub fn short_token(token: &str) -> String {
    if token.chars().count() <= TOKEN_PREFIX_LEN {
        return token.to_string();
    }
    let prefix: String = token.chars().take(TOKEN_PREFIX_LEN).collect();
    format!("{}…", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_tokens_are_truncated() {
        assert_eq!(short_token("abcdefghijklmnop"), "abcdefgh…");
        assert_eq!(short_token("abc"), "abc");
    }
}
