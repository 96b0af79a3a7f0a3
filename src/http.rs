//! Thin wrapper over `reqwest` bound to one base URL.
//!
//! Every request reads the persisted session first and, when a token is
//! present, sends it as `Authorization: Bearer <token>`. Nothing is retried
//! or cached; responses come back as raw body text.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::error::HttpError;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
}

impl HttpClient {
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>) -> Result<HttpClient, HttpError> {
        HttpClient::with_timeout(base_url, session, None)
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<dyn SessionStore>,
        timeout: Option<Duration>,
    ) -> Result<HttpClient, HttpError> {
        let base_url = Url::parse(base_url)?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(HttpClient {
            client: builder.build()?,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub async fn get(&self, path: &str) -> Result<String, HttpError> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<String, HttpError> {
        self.send(Method::POST, path, body).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, HttpError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, HttpError> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<String, HttpError> {
        self.send::<()>(Method::DELETE, path, None).await
    }

    /// Resolves `path` against the base URL.
    ///
    /// The result must stay on the base URL's origin, otherwise the bearer
    /// token could be handed to another host.
    pub fn url_for(&self, path: &str) -> Result<Url, HttpError> {
        let joined = join_url_segments(self.base_url.as_str(), path);
        let url = Url::parse(&joined)?;
        if url.origin() != self.base_url.origin() {
            return Err(HttpError::ForeignOrigin(url.to_string()));
        }
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, HttpError> {
        let url = self.url_for(path)?;
        let mut request = self.client.request(method.clone(), url.as_str());
        let authenticated = match self.session.get() {
            Some(session) => {
                request = request.bearer_auth(session.token);
                true
            }
            None => false,
        };
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, authenticated, "sending request");
        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, "request failed: {}", e);
            HttpError::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(%method, path, status = status.as_u16(), "received response");

        if status.is_success() {
            Ok(text)
        } else {
            tracing::warn!(%method, path, status = status.as_u16(), "server rejected request");
            Err(HttpError::Status { status, body: text })
        }
    }
}

/// Joins a base URL and a path without doubling or dropping slashes.
fn join_url_segments(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;

    fn client(base: &str) -> HttpClient {
        HttpClient::new(base, Arc::new(MemorySessionStore::new())).unwrap()
    }

    #[test]
    fn joins_paths_onto_base() {
        let c = client("http://localhost:3001/");
        assert_eq!(c.url_for("/api/tasks").unwrap().as_str(), "http://localhost:3001/api/tasks");

        let c = client("https://example.com/backend");
        assert_eq!(c.url_for("api/login").unwrap().as_str(), "https://example.com/backend/api/login");
    }

    #[test]
    fn protocol_relative_paths_stay_on_base_origin() {
        let c = client("http://localhost:3001");
        let url = c.url_for("//evil.example.com/api/tasks").unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(3001));
    }
}
