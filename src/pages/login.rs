use crate::api::ApiClient;
use crate::pages::Route;

#[derive(Debug, Clone, Default)]
pub struct LoginPage {
    pub email: String,
    pub password: String,
    pub message: Option<String>,
}

impl LoginPage {
    pub fn new() -> LoginPage {
        LoginPage::default()
    }

    /// Logs in with the entered credentials.
    ///
    /// On success the session is stored before this returns, so the next
    /// page's requests are authenticated.
    pub async fn submit(&mut self, api: &ApiClient) -> Option<Route> {
        match api.login(&self.email, &self.password).await {
            Ok(_) => {
                self.password.clear();
                self.message = Some("Logged in successfully.".into());
                Some(Route::Dashboard)
            }
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }
}
