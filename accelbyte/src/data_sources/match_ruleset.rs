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
use crate::models::match_ruleset::MatchRuleSetModel;
use crate::models::Identity;
use crate::resources::match_ruleset::settings_attributes;
use crate::resources::{api_error, downcast_provider_data, invalid_state, not_configured};
use crate::AccelByteProviderData;

pub const TYPE_NAME: &str = "accelbyte_match_ruleset";

const KIND: &str = "ruleset";

#[derive(Default)]
pub struct MatchRuleSetDataSource {
    provider_data: Option<AccelByteProviderData>,
}

impl MatchRuleSetDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// `configuration` comes back as canonical JSON text
    async fn lookup(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(not_configured)?;
        let identity = Identity::from_state(config).map_err(invalid_state)?;

        debug!(namespace = %identity.namespace, name = %identity.name, "looking up match ruleset");
        let rule_set = data
            .client
            .rule_sets()
            .get(&identity.namespace, &identity.name)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    data_source_not_found("Match ruleset", &identity)
                } else {
                    api_error(
                        "Error when reading match ruleset via AccelByte API",
                        "read",
                        KIND,
                        &identity,
                        &e,
                    )
                }
            })?;

        MatchRuleSetModel::from_api(identity, &DynamicValue::object(), &rule_set)
            .and_then(|model| model.to_state())
            .map_err(invalid_state)
    }
}

#[async_trait]
impl DataSource for MatchRuleSetDataSource {
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
            schema: lookup_schema("match ruleset", settings_attributes()),
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
impl DataSourceWithConfigure for MatchRuleSetDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let diagnostics = match downcast_provider_data(request.provider_data) {
            Ok(provider_data) => {
                self.provider_data = Some(provider_data);
                vec![]
            }
            Err(diagnostic) => vec![diagnostic],
        };
        ConfigureDataSourceResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Client;
    use mockito::Server;
    use tfplug::types::{AttributePath, ClientCapabilities};

    fn request() -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: TYPE_NAME.to_string(),
            config: DynamicValue::decode_json(br#"{"namespace":"mygame","name":"duel"}"#)
                .unwrap(),
            client_capabilities: ClientCapabilities::default(),
        }
    }

    fn configured(server: &Server) -> MatchRuleSetDataSource {
        let client = Client::new(&server.url(), "token").unwrap();
        MatchRuleSetDataSource {
            provider_data: Some(AccelByteProviderData::new(client)),
        }
    }

    #[tokio::test]
    async fn configuration_is_canonical_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/match2/v1/namespaces/mygame/rulesets/duel")
            .with_status(200)
            .with_body(
                r#"{"name":"duel","enable_custom_match_function":true,"data":{"b":2,"a":{"z":1,"y":[1,2]}}}"#,
            )
            .create_async()
            .await;

        let response = configured(&server).read(Context::new(), request()).await;

        assert!(
            response.diagnostics.is_empty(),
            "{:?}",
            response.diagnostics
        );
        assert_eq!(
            response
                .state
                .get_string(&AttributePath::new("configuration"))
                .unwrap(),
            r#"{"a":{"y":[1,2],"z":1},"b":2}"#
        );
        assert!(response
            .state
            .get_bool(&AttributePath::new("enable_custom_match_function"))
            .unwrap());
    }

    #[tokio::test]
    async fn server_errors_name_the_ruleset() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/match2/v1/namespaces/mygame/rulesets/duel")
            .with_status(500)
            .with_body(r#"{"errorCode":20000,"errorMessage":"internal server error"}"#)
            .create_async()
            .await;

        let response = configured(&server).read(Context::new(), request()).await;

        assert_eq!(
            response.diagnostics[0].summary,
            "Error when reading match ruleset via AccelByte API"
        );
        assert!(response.diagnostics[0]
            .detail
            .starts_with("Unable to read ruleset 'duel' in namespace 'mygame'"));
    }
}
