//! Terraform provider for AccelByte Gaming Services
//!
//! Manages match pools, match rulesets and session templates through the
//! AccelByte admin APIs. The provider logs in once during configure and hands
//! the authenticated client to every resource and data source.

pub mod api;
pub mod config;
pub mod data_sources;
pub mod models;
pub mod provider_data;
pub mod resources;

pub use provider_data::AccelByteProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tfplug::context::Context;
use tfplug::data_source::{DataSourceFactory, DataSourceWithConfigure};
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse,
};
use tfplug::resource::{ManagedResource, ResourceFactory};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic};
use tracing::{error, info};

use crate::api::Client;
use crate::config::ProviderSettings;
use crate::data_sources::{MatchPoolDataSource, MatchRuleSetDataSource, SessionTemplateDataSource};
use crate::provider_data::DEFAULT_SETTLE_DELAY;
use crate::resources::{MatchPoolResource, MatchRuleSetResource, SessionTemplateResource};

pub const PROVIDER_TYPE_NAME: &str = "accelbyte";

pub struct AccelByteProvider {
    settle_delay: Duration,
}

impl Default for AccelByteProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelByteProvider {
    pub fn new() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// How long match pool writes wait before the pool is read back
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

#[async_trait]
impl Provider for AccelByteProvider {
    fn type_name(&self) -> &str {
        PROVIDER_TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: PROVIDER_TYPE_NAME.to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Provider for AccelByte Gaming Services")
            .attribute(
                AttributeBuilder::new("base_url", AttributeType::String)
                    .description("AccelByte environment URL, for example https://demo.accelbyte.io. Can also be set with ACCELBYTE_BASE_URL")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("iam_client_id", AttributeType::String)
                    .description("IAM client ID. Can also be set with ACCELBYTE_IAM_CLIENT_ID")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("iam_client_secret", AttributeType::String)
                    .description("IAM client secret. Can also be set with ACCELBYTE_IAM_CLIENT_SECRET")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("admin_username", AttributeType::String)
                    .description("Admin user name. Can also be set with ACCELBYTE_ADMIN_USERNAME")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("admin_password", AttributeType::String)
                    .description("Admin password. Can also be set with ACCELBYTE_ADMIN_PASSWORD")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let settings = match ProviderSettings::resolve(&request.config) {
            Ok(settings) => settings,
            Err(errors) => {
                let diagnostics = errors
                    .into_iter()
                    .map(|e| {
                        Diagnostic::error("Invalid provider configuration", e.to_string())
                            .with_attribute(AttributePath::new(e.attribute()))
                    })
                    .collect();
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        let login = Client::login(&settings.base_url, &settings.credentials);
        let client = match login.await {
            Ok(client) => client,
            Err(e) => {
                error!(base_url = %settings.base_url, error = %e, "login failed");
                return ConfigureProviderResponse {
                    diagnostics: vec![Diagnostic::error(
                        "Unable to log in to AccelByte",
                        format!(
                            "Login to {} as '{}' failed: {}",
                            settings.base_url, settings.credentials.username, e
                        ),
                    )],
                    provider_data: None,
                };
            }
        };
        info!(base_url = %settings.base_url, "logged in to AccelByte");

        let provider_data =
            AccelByteProviderData::new(client).with_settle_delay(self.settle_delay);
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(provider_data)),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            resources::match_pool::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(MatchPoolResource::default()) as Box<dyn ManagedResource>
            }),
        );
        resources.insert(
            resources::match_ruleset::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(MatchRuleSetResource::default()) as Box<dyn ManagedResource>
            }),
        );
        resources.insert(
            resources::session_template::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(SessionTemplateResource::new()) as Box<dyn ManagedResource>
            }),
        );
        resources.insert(
            resources::session_template::CONFIGURATION_TEMPLATE_TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(SessionTemplateResource::configuration_template())
                    as Box<dyn ManagedResource>
            }),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
        data_sources.insert(
            data_sources::match_pool::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(MatchPoolDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            data_sources::match_ruleset::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(MatchRuleSetDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            resources::session_template::TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(SessionTemplateDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources.insert(
            resources::session_template::CONFIGURATION_TEMPLATE_TYPE_NAME.to_string(),
            Box::new(|| {
                Box::new(SessionTemplateDataSource::configuration_template())
                    as Box<dyn DataSourceWithConfigure>
            }),
        );
        data_sources
    }
}
