use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource,
    DataSourceMetadataRequest, DataSourceMetadataResponse, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::types::{Diagnostic, DynamicValue};
use tracing::debug;

use super::{data_source_not_found, lookup_schema};
use crate::models::match_pool::MatchPoolModel;
use crate::models::Identity;
use crate::resources::match_pool::settings_attributes;
use crate::resources::{api_error, downcast_provider_data, invalid_state, not_configured};
use crate::AccelByteProviderData;

pub const TYPE_NAME: &str = "accelbyte_match_pool";

const KIND: &str = "match pool";

#[derive(Default)]
pub struct MatchPoolDataSource {
    provider_data: Option<AccelByteProviderData>,
}

impl MatchPoolDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(not_configured)?;
        let identity = Identity::from_state(config).map_err(invalid_state)?;

        debug!(namespace = %identity.namespace, name = %identity.name, "looking up match pool");
        let pool = data
            .client
            .match_pools()
            .get(&identity.namespace, &identity.name)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    data_source_not_found("Match pool", &identity)
                } else {
                    api_error(
                        "Error when reading match pool via AccelByte API",
                        "read",
                        KIND,
                        &identity,
                        &e,
                    )
                }
            })?;

        MatchPoolModel::from_api(identity, &DynamicValue::object(), &pool)
            .and_then(|model| model.to_state())
            .map_err(invalid_state)
    }
}

#[async_trait]
impl DataSource for MatchPoolDataSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: TYPE_NAME.to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: lookup_schema(KIND, settings_attributes()),
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        match self.lookup(&request.config).await {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            },
            Err(diagnostic) => ReadDataSourceResponse {
                state: request.config,
                diagnostics: vec![diagnostic],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for MatchPoolDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match downcast_provider_data(request.provider_data) {
            Ok(provider_data) => {
                self.provider_data = Some(provider_data);
                ConfigureDataSourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diagnostic) => ConfigureDataSourceResponse {
                diagnostics: vec![diagnostic],
            },
        }
    }
}
