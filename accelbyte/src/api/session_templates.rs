//! Session configuration template API (session service)

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{segment, ListField};
use super::error::ApiError;

/// Custom session function callback settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcSessionConfig {
    #[serde(default)]
    pub app_name: String,
    #[serde(rename = "customURL", default)]
    pub custom_url: String,
    /// Bit field of the session and party events that trigger the callback
    #[serde(default)]
    pub function_flag: i64,
}

/// Response from the configuration template endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationTemplate {
    pub name: Option<String>,
    pub min_players: Option<i64>,
    pub max_players: Option<i64>,
    pub joinability: Option<String>,
    #[serde(default)]
    pub max_active_sessions: i64,
    pub invite_timeout: Option<i64>,
    pub inactive_timeout: Option<i64>,
    #[serde(default)]
    pub leader_election_grace_period: i64,

    // Server discriminator pair
    #[serde(rename = "type")]
    pub server_type: Option<String>,
    #[serde(default)]
    pub ds_source: String,

    #[serde(default)]
    pub requested_regions: ListField,
    #[serde(default)]
    pub preferred_claim_keys: ListField,
    #[serde(default)]
    pub fallback_claim_keys: ListField,
    #[serde(rename = "customURLGRPC", default)]
    pub custom_url_grpc: String,
    #[serde(default)]
    pub app_name: String,

    #[serde(default)]
    pub grpc_session_config: Option<GrpcSessionConfig>,

    #[serde(default)]
    pub auto_join: bool,
    pub text_chat: Option<bool>,
    #[serde(default)]
    pub enable_secret: bool,
    #[serde(default)]
    pub disable_code_generation: bool,
    #[serde(default)]
    pub immutable_storage: bool,
    #[serde(default)]
    pub ds_manual_set_ready: bool,
    #[serde(default)]
    pub tie_teams_session_lifetime: bool,
    #[serde(default)]
    pub auto_leave_session: bool,

    #[serde(default)]
    pub attributes: serde_json::Value,
}

/// Request body for updating configuration templates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationTemplateConfig {
    pub min_players: i64,
    pub max_players: i64,
    pub joinability: String,
    pub max_active_sessions: i64,
    pub invite_timeout: i64,
    pub inactive_timeout: i64,
    pub leader_election_grace_period: i64,

    #[serde(rename = "type")]
    pub server_type: String,
    pub ds_source: String,
    pub requested_regions: ListField,
    pub preferred_claim_keys: ListField,
    pub fallback_claim_keys: ListField,
    #[serde(rename = "customURLGRPC")]
    pub custom_url_grpc: String,
    pub app_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_session_config: Option<GrpcSessionConfig>,

    pub auto_join: bool,
    pub text_chat: bool,
    pub enable_secret: bool,
    pub disable_code_generation: bool,
    pub immutable_storage: bool,
    pub ds_manual_set_ready: bool,
    pub tie_teams_session_lifetime: bool,
    pub auto_leave_session: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
}

/// Request body for creating configuration templates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateConfigurationTemplateRequest {
    pub name: String,
    #[serde(flatten)]
    pub config: ConfigurationTemplateConfig,
}

fn admin_path(namespace: &str) -> String {
    format!("/session/v1/admin/namespaces/{}", segment(namespace))
}

fn template_path(namespace: &str, name: &str) -> String {
    format!("{}/configurations/{}", admin_path(namespace), segment(name))
}

/// Configuration templates API
pub struct SessionTemplatesApi<'a> {
    client: &'a Client,
}

impl<'a> SessionTemplatesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /session/v1/admin/namespaces/{namespace}/configuration
    pub async fn create(
        &self,
        namespace: &str,
        request: &CreateConfigurationTemplateRequest,
    ) -> Result<ConfigurationTemplate, ApiError> {
        let path = format!("{}/configuration", admin_path(namespace));
        self.client.post(&path, request).await
    }

    /// GET /session/v1/admin/namespaces/{namespace}/configurations/{name}
    pub async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ConfigurationTemplate, ApiError> {
        self.client.get(&template_path(namespace, name)).await
    }

    /// PUT /session/v1/admin/namespaces/{namespace}/configurations/{name}
    pub async fn update(
        &self,
        namespace: &str,
        name: &str,
        config: &ConfigurationTemplateConfig,
    ) -> Result<ConfigurationTemplate, ApiError> {
        self.client
            .put(&template_path(namespace, name), config)
            .await
    }

    /// DELETE /session/v1/admin/namespaces/{namespace}/configurations/{name}
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<(), ApiError> {
        self.client
            .delete::<()>(&template_path(namespace, name))
            .await
    }
}
