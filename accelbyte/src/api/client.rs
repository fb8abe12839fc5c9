use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;
use super::match_pools::MatchPoolsApi;
use super::rule_sets::RuleSetsApi;
use super::session_templates::SessionTemplatesApi;

/// Timeout applied to every request, login included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// AccelByte admin API client holding one bearer token
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("auth_header", &"<redacted>")
            .finish()
    }
}

pub(crate) fn build_http_client() -> Result<reqwest::Client, ApiError> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

impl Client {
    /// Create a client for an already issued access token
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, ApiError> {
        Ok(Self::from_parts(
            build_http_client()?,
            base_url,
            access_token,
        ))
    }

    pub(crate) fn from_parts(
        http_client: reqwest::Client,
        base_url: &str,
        access_token: &str,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url.trim_end_matches('/').to_string(),
                auth_header: format!("Bearer {}", access_token),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Match pools (match2 service)
    pub fn match_pools(&self) -> MatchPoolsApi<'_> {
        MatchPoolsApi::new(self)
    }

    /// Match rule sets (match2 service)
    pub fn rule_sets(&self) -> RuleSetsApi<'_> {
        RuleSetsApi::new(self)
    }

    /// Session configuration templates (session service)
    pub fn session_templates(&self) -> SessionTemplatesApi<'_> {
        SessionTemplatesApi::new(self)
    }

    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("GET request to: {}", url);

        let response = self
            .inner
            .http_client
            .get(&url)
            .header(AUTHORIZATION, &self.inner.auth_header)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("POST request to: {}", url);

        let response = self
            .inner
            .http_client
            .post(&url)
            .header(AUTHORIZATION, &self.inner.auth_header)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn put<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("PUT request to: {}", url);

        let response = self
            .inner
            .http_client
            .put(&url)
            .header(AUTHORIZATION, &self.inner.auth_header)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn delete<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("DELETE request to: {}", url);

        let response = self
            .inner
            .http_client
            .delete(&url)
            .header(AUTHORIZATION, &self.inner.auth_header)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return self.parse_success_response(response).await;
        }
        self.handle_error_response(response).await
    }

    /// Empty bodies (201/204 without content) decode as JSON null
    async fn parse_success_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        let body = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str::<T>(body).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::Parse(format!("Failed to parse response: {}", e))
        })
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::debug!("API error response ({}): {}", status, text);

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth(text));
        }

        Err(ApiError::Api {
            status: status.as_u16(),
            message: text,
        })
    }
}
