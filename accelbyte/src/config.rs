//! Provider settings
//!
//! Each of the five settings comes from the provider block first and from
//! its `ACCELBYTE_*` environment variable second.

use crate::api::Credentials;
use tfplug::types::{AttributePath, DynamicValue};
use thiserror::Error;
use url::Url;

pub const BASE_URL_ENV: &str = "ACCELBYTE_BASE_URL";
pub const IAM_CLIENT_ID_ENV: &str = "ACCELBYTE_IAM_CLIENT_ID";
pub const IAM_CLIENT_SECRET_ENV: &str = "ACCELBYTE_IAM_CLIENT_SECRET";
pub const ADMIN_USERNAME_ENV: &str = "ACCELBYTE_ADMIN_USERNAME";
pub const ADMIN_PASSWORD_ENV: &str = "ACCELBYTE_ADMIN_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{attribute} is required (set it in the provider configuration or the {env_var} environment variable)")]
    Missing {
        attribute: &'static str,
        env_var: &'static str,
    },

    #[error("base_url {value:?} is not an absolute http(s) URL: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}

impl ConfigError {
    /// The provider attribute at fault
    pub fn attribute(&self) -> &'static str {
        match self {
            ConfigError::Missing { attribute, .. } => attribute,
            ConfigError::InvalidBaseUrl { .. } => "base_url",
        }
    }
}

/// Everything needed to log in
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub credentials: Credentials,
}

impl ProviderSettings {
    /// Resolves all five settings, reporting every one that is missing or invalid
    pub fn resolve(config: &DynamicValue) -> Result<Self, Vec<ConfigError>> {
        let mut errors = Vec::new();
        let mut take = |attribute: &'static str, env_var: &'static str| {
            match resolve_setting(config, attribute, env_var) {
                Ok(value) => value,
                Err(e) => {
                    errors.push(e);
                    String::new()
                }
            }
        };

        let base_url = take("base_url", BASE_URL_ENV);
        let client_id = take("iam_client_id", IAM_CLIENT_ID_ENV);
        let client_secret = take("iam_client_secret", IAM_CLIENT_SECRET_ENV);
        let username = take("admin_username", ADMIN_USERNAME_ENV);
        let password = take("admin_password", ADMIN_PASSWORD_ENV);

        if !base_url.is_empty() {
            if let Err(e) = validate_base_url(&base_url) {
                errors.push(e);
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: Credentials {
                client_id,
                client_secret,
                username,
                password,
            },
        })
    }
}

/// Declared value first, then the environment; empty strings count as unset
fn resolve_setting(
    config: &DynamicValue,
    attribute: &'static str,
    env_var: &'static str,
) -> Result<String, ConfigError> {
    config
        .get_optional_string(&AttributePath::new(attribute))
        .ok()
        .flatten()
        .filter(|value| !value.is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|value| !value.is_empty()))
        .ok_or(ConfigError::Missing { attribute, env_var })
}

fn validate_base_url(value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        "http" | "https" => Err(invalid("missing host".to_string())),
        other => Err(invalid(format!("unsupported scheme {:?}", other))),
    }
}
