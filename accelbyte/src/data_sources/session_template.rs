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
use crate::models::session_template::SessionTemplateModel;
use crate::models::Identity;
use crate::resources::session_template::{
    settings_attributes, CONFIGURATION_TEMPLATE_TYPE_NAME, TYPE_NAME,
};
use crate::resources::{api_error, downcast_provider_data, invalid_state, not_configured};
use crate::AccelByteProviderData;

const KIND: &str = "session template";

/// Looks up a session template; also served as `accelbyte_configuration_template`
pub struct SessionTemplateDataSource {
    type_name: &'static str,
    provider_data: Option<AccelByteProviderData>,
}

impl Default for SessionTemplateDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTemplateDataSource {
    pub fn new() -> Self {
        Self {
            type_name: TYPE_NAME,
            provider_data: None,
        }
    }

    pub fn configuration_template() -> Self {
        Self {
            type_name: CONFIGURATION_TEMPLATE_TYPE_NAME,
            provider_data: None,
        }
    }

    async fn lookup(&self, config: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data.as_ref().ok_or_else(not_configured)?;
        let identity = Identity::from_state(config).map_err(invalid_state)?;

        debug!(namespace = %identity.namespace, name = %identity.name, "looking up session template");
        let template = data
            .client
            .session_templates()
            .get(&identity.namespace, &identity.name)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    data_source_not_found("Session template", &identity)
                } else {
                    api_error(
                        "Error when reading session template via AccelByte API",
                        "read",
                        KIND,
                        &identity,
                        &e,
                    )
                }
            })?;

        SessionTemplateModel::from_api(identity, &DynamicValue::object(), &template)
            .and_then(|model| model.to_state())
            .map_err(invalid_state)
    }
}

#[async_trait]
impl DataSource for SessionTemplateDataSource {
    fn type_name(&self) -> &str {
        self.type_name
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name.to_string(),
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
impl DataSourceWithConfigure for SessionTemplateDataSource {
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
    use serde_json::json;
    use std::any::Any;
    use std::sync::Arc;
    use tfplug::types::{AttributePath, ClientCapabilities};

    fn request() -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: CONFIGURATION_TEMPLATE_TYPE_NAME.to_string(),
            config: DynamicValue::decode_json(br#"{"namespace":"mygame","name":"squad"}"#)
                .unwrap(),
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[tokio::test]
    async fn ams_template_is_read_through_either_name() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock(
                "GET",
                "/session/v1/admin/namespaces/mygame/configurations/squad",
            )
            .with_status(200)
            .with_body(
                json!({
                    "name": "squad",
                    "minPlayers": 2,
                    "maxPlayers": 8,
                    "joinability": "INVITE_ONLY",
                    "inviteTimeout": 60,
                    "inactiveTimeout": 30,
                    "type": "DS",
                    "dsSource": "AMS",
                    "requestedRegions": ["us-east-2", "eu-west-1"],
                    "textChat": true,
                    "attributes": {"mode": "ranked"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut data_source = SessionTemplateDataSource::configuration_template();
        assert_eq!(data_source.type_name(), "accelbyte_configuration_template");
        let client = Client::new(&server.url(), "token").unwrap();
        let provider_data: Arc<dyn Any + Send + Sync> =
            Arc::new(AccelByteProviderData::new(client));
        let configured = data_source
            .configure(
                Context::new(),
                ConfigureDataSourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await;
        assert!(configured.diagnostics.is_empty());

        let response = data_source.read(Context::new(), request()).await;

        assert!(
            response.diagnostics.is_empty(),
            "{:?}",
            response.diagnostics
        );
        let state = response.state;
        let regions = AttributePath::new("ams_server").attribute("requested_regions");
        assert_eq!(
            state.get_string_list(&regions).unwrap(),
            vec!["us-east-2".to_string(), "eu-west-1".to_string()]
        );
        assert!(state.is_null_at(&AttributePath::new("p2p_server")));
        let function = AttributePath::new("custom_session_function");
        assert!(state.is_null_at(&function));
        assert!(state.get_bool(&AttributePath::new("chat_room")).unwrap());
        assert_eq!(
            state
                .get_string(&AttributePath::new("custom_attributes"))
                .unwrap(),
            r#"{"mode":"ranked"}"#
        );
    }

    #[tokio::test]
    async fn missing_template_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock(
                "GET",
                "/session/v1/admin/namespaces/mygame/configurations/squad",
            )
            .with_status(404)
            .with_body(r#"{"errorCode":20041,"errorMessage":"template not found"}"#)
            .create_async()
            .await;
        let client = Client::new(&server.url(), "token").unwrap();
        let data_source = SessionTemplateDataSource {
            type_name: TYPE_NAME,
            provider_data: Some(AccelByteProviderData::new(client)),
        };

        let response = data_source.read(Context::new(), request()).await;

        assert_eq!(response.diagnostics[0].summary, "Data source not found");
        assert_eq!(
            response.diagnostics[0].detail,
            "Session template 'squad' does not exist in namespace 'mygame'"
        );
    }
}
