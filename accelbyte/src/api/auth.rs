//! IAM login
//!
//! The provider logs in once with the OAuth2 password grant and every API
//! call afterwards reuses the issued access token.

use serde::Deserialize;
use std::fmt;

use super::client::{build_http_client, Client};
use super::error::ApiError;

const TOKEN_PATH: &str = "/iam/v3/oauth/token";

/// IAM client plus admin user credentials
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response from POST /iam/v3/oauth/token
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

impl Client {
    /// POST /iam/v3/oauth/token
    pub async fn login(base_url: &str, credentials: &Credentials) -> Result<Client, ApiError> {
        let http_client = build_http_client()?;
        let url = format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH);
        tracing::debug!("POST request to: {}", url);

        let response = http_client
            .post(&url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!("Login rejected with HTTP {}", status);
            return Err(ApiError::Auth(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let token: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::Parse(format!("Failed to parse token response: {}", e)))?;
        tracing::info!(
            username = %credentials.username,
            expires_in = token.expires_in,
            "logged in to AccelByte IAM"
        );

        Ok(Client::from_parts(
            http_client,
            base_url,
            &token.access_token,
        ))
    }
}
