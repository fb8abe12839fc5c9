//! Match ruleset resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import::import_state_composite_id;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tracing::{info, warn};

use super::{
    api_error, downcast_provider_data, identity_attributes, invalid_state, not_configured,
    resource_not_found, response_error,
};
use crate::models::match_ruleset::{MatchRuleSetModel, CONFIGURATION};
use crate::models::{json_blob, CodecError, Identity};
use crate::AccelByteProviderData;

pub const TYPE_NAME: &str = "accelbyte_match_ruleset";

const KIND: &str = "ruleset";

const CONVERSION_ERROR: &str =
    "Error when converting our internal state to an AccelByte API match ruleset";
const PROCESSING_ERROR: &str =
    "Error when updating match ruleset model according to AccelByte API response";

pub(crate) fn settings_attributes() -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("enable_custom_match_function", AttributeType::Bool)
            .description("Let a custom match function interpret the ruleset")
            .default(StaticDefault::bool(false))
            .build(),
        AttributeBuilder::new(CONFIGURATION, AttributeType::String)
            .description("Ruleset configuration as JSON text, validated by the service")
            .required()
            .build(),
    ]
}

fn conversion_error(error: CodecError) -> Diagnostic {
    Diagnostic::error(CONVERSION_ERROR, error.to_string())
        .with_attribute(AttributePath::new(CONFIGURATION))
}

#[derive(Default)]
pub struct MatchRuleSetResource {
    provider_data: Option<AccelByteProviderData>,
}

impl MatchRuleSetResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn provider_data(&self) -> Result<&AccelByteProviderData, Diagnostic> {
        self.provider_data.as_ref().ok_or_else(not_configured)
    }

    async fn create_rule_set(
        &self,
        planned_state: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data()?;
        let model = MatchRuleSetModel::from_plan(planned_state).map_err(invalid_state)?;
        let identity = model.identity.clone();
        let request = model.to_create_request().map_err(conversion_error)?;

        info!(namespace = %identity.namespace, name = %identity.name, "creating match ruleset");
        data.client
            .rule_sets()
            .create(&identity.namespace, &request)
            .await
            .map_err(|e| {
                api_error(
                    "Error when creating match ruleset via AccelByte API",
                    "create",
                    KIND,
                    &identity,
                    &e,
                )
            })?;

        let rule_set = data
            .client
            .rule_sets()
            .get(&identity.namespace, &identity.name)
            .await
            .map_err(|e| {
                api_error(
                    "Error when refreshing match ruleset via AccelByte API",
                    "read",
                    KIND,
                    &identity,
                    &e,
                )
            })?;

        MatchRuleSetModel::from_api(identity.clone(), planned_state, &rule_set)
            .and_then(|model| model.to_state())
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn read_rule_set(
        &self,
        current_state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = self.provider_data()?;
        let identity = Identity::from_state(current_state).map_err(invalid_state)?;

        let rule_set = match data
            .client
            .rule_sets()
            .get(&identity.namespace, &identity.name)
            .await
        {
            Ok(rule_set) => rule_set,
            Err(e) if e.is_not_found() => {
                info!(
                    namespace = %identity.namespace,
                    name = %identity.name,
                    "match ruleset no longer exists, removing from state"
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(api_error(
                    "Error when reading match ruleset via AccelByte API",
                    "read",
                    KIND,
                    &identity,
                    &e,
                ))
            }
        };

        MatchRuleSetModel::from_api(identity.clone(), current_state, &rule_set)
            .and_then(|model| model.to_state())
            .map(Some)
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn update_rule_set(
        &self,
        planned_state: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data()?;
        let model = MatchRuleSetModel::from_plan(planned_state).map_err(invalid_state)?;
        let identity = model.identity.clone();
        let config = model.to_config().map_err(conversion_error)?;

        info!(namespace = %identity.namespace, name = %identity.name, "updating match ruleset");
        let rule_set = data
            .client
            .rule_sets()
            .update(&identity.namespace, &identity.name, &config)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    resource_not_found("Match ruleset", &identity)
                } else {
                    api_error(
                        "Error when updating match ruleset via AccelByte API",
                        "update",
                        KIND,
                        &identity,
                        &e,
                    )
                }
            })?;

        MatchRuleSetModel::from_api(identity.clone(), planned_state, &rule_set)
            .and_then(|model| model.to_state())
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn delete_rule_set(&self, prior_state: &DynamicValue) -> Result<(), Diagnostic> {
        let data = self.provider_data()?;
        let identity = Identity::from_state(prior_state).map_err(invalid_state)?;

        info!(namespace = %identity.namespace, name = %identity.name, "deleting match ruleset");
        data.client
            .rule_sets()
            .delete(&identity.namespace, &identity.name)
            .await
            .map_err(|e| {
                api_error(
                    "Error when deleting ruleset via AccelByte API",
                    "delete",
                    KIND,
                    &identity,
                    &e,
                )
            })
    }
}

#[async_trait]
impl Resource for MatchRuleSetResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a matchmaking ruleset in AccelByte Gaming Services");
        for attribute in identity_attributes("ruleset")
            .into_iter()
            .chain(settings_attributes())
        {
            builder = builder.attribute(attribute);
        }

        ResourceSchemaResponse {
            schema: builder.build(),
            diagnostics: vec![],
        }
    }

    /// Catches malformed configuration text before planning
    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];
        let path = AttributePath::new(CONFIGURATION);
        if let Ok(Some(text)) = request.config.get_optional_string(&path) {
            if let Err(e) = json_blob::parse(CONFIGURATION, &text) {
                diagnostics.push(
                    Diagnostic::error("Invalid JSON configuration", e.to_string())
                        .with_attribute(path),
                );
            }
        }
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(
        &self,
        _ctx: Context,
        request: CreateResourceRequest,
    ) -> CreateResourceResponse {
        match self.create_rule_set(&request.planned_state).await {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diagnostic) => {
                warn!(detail = %diagnostic.detail, "{}", diagnostic.summary);
                CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diagnostic],
                }
            }
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        match self.read_rule_set(&request.current_state).await {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diagnostic) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![diagnostic],
            },
        }
    }

    async fn update(
        &self,
        _ctx: Context,
        request: UpdateResourceRequest,
    ) -> UpdateResourceResponse {
        match self.update_rule_set(&request.planned_state).await {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(diagnostic) => {
                warn!(detail = %diagnostic.detail, "{}", diagnostic.summary);
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![diagnostic],
                }
            }
        }
    }

    async fn delete(
        &self,
        _ctx: Context,
        request: DeleteResourceRequest,
    ) -> DeleteResourceResponse {
        let diagnostics = match self.delete_rule_set(&request.prior_state).await {
            Ok(()) => vec![],
            Err(diagnostic) => vec![diagnostic],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for MatchRuleSetResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        match downcast_provider_data(request.provider_data) {
            Ok(provider_data) => {
                self.provider_data = Some(provider_data);
                ConfigureResourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diagnostic) => ConfigureResourceResponse {
                diagnostics: vec![diagnostic],
            },
        }
    }
}

#[async_trait]
impl ResourceWithImportState for MatchRuleSetResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        import_state_composite_id(&ctx, "namespace", "name", &request, &mut response);
        response
    }
}
