//! HTTP collaborators for the portal session core.
//!
//! The backend authenticates with cookies and wants an anti-forgery token in
//! the `X-CSRF-TOKEN` header on state-changing calls. [`PortalClient`] keeps a
//! cookie store so the token fetch and the logout call share one session.

use async_trait::async_trait;
use portal_session::{CsrfTokenProvider, RemoteError, SessionEndpoint};
use serde::Deserialize;
use std::time::Duration;

pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";
pub const CSRF_TOKEN_PATH: &str = "csrf_token";
pub const LOGOUT_PATH: &str = "logout";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct CsrfTokenResponse {
    csrf_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    api_url: String,
}

impl PortalClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, RemoteError> {
        Self::with_timeout(api_url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    async fn request_token(&self) -> Result<Option<String>, RemoteError> {
        let response = self
            .http
            .get(self.url(CSRF_TOKEN_PATH))
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        let body: CsrfTokenResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Rejected(format!("malformed token response: {e}")))?;
        Ok(body.csrf_token.filter(|token| !token.is_empty()))
    }
}

#[async_trait]
impl CsrfTokenProvider for PortalClient {
    async fn fetch_token(&self) -> Option<String> {
        match self.request_token().await {
            Ok(Some(token)) => Some(token),
            Ok(None) => {
                tracing::warn!("token response carried no csrf_token");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "fetching anti-forgery token failed");
                None
            }
        }
    }
}

#[async_trait]
impl SessionEndpoint for PortalClient {
    async fn end_session(&self, csrf_token: Option<&str>) -> Result<(), RemoteError> {
        let mut request = self
            .http
            .post(self.url(LOGOUT_PATH))
            .json(&serde_json::json!({}));
        if let Some(token) = csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(%status, "backend acknowledged logout");
            Ok(())
        } else {
            Err(RemoteError::Status(status.as_u16()))
        }
    }
}
