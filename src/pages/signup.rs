use crate::api::ApiClient;
use crate::pages::Route;

#[derive(Debug, Clone, Default)]
pub struct SignupPage {
    pub name: String,
    pub email: String,
    pub password: String,
    pub message: Option<String>,
}

impl SignupPage {
    pub fn new() -> SignupPage {
        SignupPage::default()
    }

    /// Creates the account and sends the user on to the login page.
    pub async fn submit(&mut self, api: &ApiClient) -> Option<Route> {
        match api.create_user(&self.name, &self.email, &self.password).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "account created");
                self.password.clear();
                self.message = Some("Account created successfully.".into());
                Some(Route::Login)
            }
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }
}
