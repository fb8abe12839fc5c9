//! Match pool resource implementation
//!
//! The match2 service serves reads from a cache that lags behind writes, so
//! every write is followed by the configured settle delay before the pool is
//! read back.

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
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::{IntAtLeast, OneOf};
use tracing::{debug, info, warn};

use super::{
    api_error, downcast_provider_data, identity_attributes, invalid_state, not_configured,
    resource_not_found, response_error,
};
use crate::models::match_pool::{MatchPoolModel, MATCH_FUNCTION_OVERRIDE};
use crate::models::Identity;
use crate::AccelByteProviderData;

pub const TYPE_NAME: &str = "accelbyte_match_pool";

const KIND: &str = "match pool";

/// Everything but the identity attributes
pub(crate) fn settings_attributes() -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("rule_set", AttributeType::String)
            .description("Name of the match ruleset used by this pool")
            .required()
            .build(),
        AttributeBuilder::new("session_template", AttributeType::String)
            .description("Name of the session template used for matches from this pool")
            .required()
            .build(),
        AttributeBuilder::new("ticket_expiration_seconds", AttributeType::Number)
            .description("Seconds a matchmaking ticket stays in the pool")
            .default(StaticDefault::int(300))
            .validator(IntAtLeast::new(0))
            .build(),
        AttributeBuilder::new("best_latency_calculation_method", AttributeType::String)
            .description("How the best latency is computed: empty, Average or P95")
            .default(StaticDefault::string(""))
            .validator(OneOf::strings(&["", "Average", "P95"]))
            .build(),
        AttributeBuilder::new("auto_accept_backfill_proposal", AttributeType::Bool)
            .description("Accept backfill proposals without asking the game server")
            .default(StaticDefault::bool(false))
            .build(),
        AttributeBuilder::new(
            "backfill_proposal_expiration_seconds",
            AttributeType::Number,
        )
        .description("Seconds a backfill proposal waits for acceptance")
        .default(StaticDefault::int(30))
        .validator(IntAtLeast::new(0))
        .build(),
        AttributeBuilder::new("backfill_ticket_expiration_seconds", AttributeType::Number)
            .description("Seconds a backfill ticket stays in the pool")
            .default(StaticDefault::int(300))
            .validator(IntAtLeast::new(0))
            .build(),
        AttributeBuilder::new("match_function", AttributeType::String)
            .description("Match function used by the pool")
            .default(StaticDefault::string("default"))
            .build(),
        AttributeBuilder::nested(
            MATCH_FUNCTION_OVERRIDE,
            NestedType::single(vec![
                AttributeBuilder::new("backfill_matches", AttributeType::String)
                    .description("Extend app that replaces backfill matching")
                    .default(StaticDefault::string(""))
                    .build(),
                AttributeBuilder::new("enrichment", AttributeType::list_of_strings())
                    .description("Extend apps that enrich tickets, in order")
                    .default(StaticDefault::empty_list())
                    .build(),
                AttributeBuilder::new("make_matches", AttributeType::String)
                    .description("Extend app that replaces match making")
                    .default(StaticDefault::string(""))
                    .build(),
                AttributeBuilder::new("stat_codes", AttributeType::list_of_strings())
                    .description("Statistic codes made available to the match function")
                    .default(StaticDefault::empty_list())
                    .build(),
                AttributeBuilder::new("validation", AttributeType::list_of_strings())
                    .description("Extend apps that validate tickets, in order")
                    .default(StaticDefault::empty_list())
                    .build(),
            ]),
        )
        .description("Extend apps overriding parts of the match function")
        .optional()
        .computed()
        .build(),
        AttributeBuilder::new("crossplay_enabled", AttributeType::Bool)
            .description("Match players across platforms")
            .default(StaticDefault::bool(false))
            .build(),
        AttributeBuilder::new("platform_group_enabled", AttributeType::Bool)
            .description("Match players within platform groups")
            .default(StaticDefault::bool(false))
            .build(),
    ]
}

#[derive(Default)]
pub struct MatchPoolResource {
    provider_data: Option<AccelByteProviderData>,
}

impl MatchPoolResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn provider_data(&self) -> Result<&AccelByteProviderData, Diagnostic> {
        self.provider_data.as_ref().ok_or_else(not_configured)
    }

    async fn settle(&self, data: &AccelByteProviderData, identity: &Identity) {
        debug!(
            namespace = %identity.namespace,
            name = %identity.name,
            delay = ?data.settle_delay,
            "waiting for match pool cache to settle"
        );
        tokio::time::sleep(data.settle_delay).await;
    }

    async fn create_pool(&self, planned_state: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data()?;
        let model = MatchPoolModel::from_plan(planned_state).map_err(invalid_state)?;
        let identity = model.identity.clone();

        info!(namespace = %identity.namespace, name = %identity.name, "creating match pool");
        data.client
            .match_pools()
            .create(&identity.namespace, &model.to_create_request())
            .await
            .map_err(|e| {
                api_error(
                    "Error when creating match pool via AccelByte API",
                    "create",
                    KIND,
                    &identity,
                    &e,
                )
            })?;

        self.settle(data, &identity).await;

        // Read back for the values the service filled in
        let pool = data
            .client
            .match_pools()
            .get(&identity.namespace, &identity.name)
            .await
            .map_err(|e| {
                api_error(
                    "Error when reading match pool via AccelByte API",
                    "read",
                    KIND,
                    &identity,
                    &e,
                )
            })?;

        MatchPoolModel::from_api(identity.clone(), planned_state, &pool)
            .and_then(|model| model.to_state())
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn read_pool(
        &self,
        current_state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = self.provider_data()?;
        let identity = Identity::from_state(current_state).map_err(invalid_state)?;

        let pool = match data
            .client
            .match_pools()
            .get(&identity.namespace, &identity.name)
            .await
        {
            Ok(pool) => pool,
            Err(e) if e.is_not_found() => {
                info!(
                    namespace = %identity.namespace,
                    name = %identity.name,
                    "match pool no longer exists, removing from state"
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(api_error(
                    "Error when reading match pool via AccelByte API",
                    "read",
                    KIND,
                    &identity,
                    &e,
                ))
            }
        };

        MatchPoolModel::from_api(identity.clone(), current_state, &pool)
            .and_then(|model| model.to_state())
            .map(Some)
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn update_pool(&self, planned_state: &DynamicValue) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data()?;
        let model = MatchPoolModel::from_plan(planned_state).map_err(invalid_state)?;
        let identity = model.identity.clone();

        info!(namespace = %identity.namespace, name = %identity.name, "updating match pool");
        let pool = data
            .client
            .match_pools()
            .update(&identity.namespace, &identity.name, &model.to_config())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    resource_not_found("Match pool", &identity)
                } else {
                    api_error(
                        "Error when updating match pool via AccelByte API",
                        "update",
                        KIND,
                        &identity,
                        &e,
                    )
                }
            })?;

        self.settle(data, &identity).await;

        MatchPoolModel::from_api(identity.clone(), planned_state, &pool)
            .and_then(|model| model.to_state())
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn delete_pool(&self, prior_state: &DynamicValue) -> Result<(), Diagnostic> {
        let data = self.provider_data()?;
        let identity = Identity::from_state(prior_state).map_err(invalid_state)?;

        info!(namespace = %identity.namespace, name = %identity.name, "deleting match pool");
        data.client
            .match_pools()
            .delete(&identity.namespace, &identity.name)
            .await
            .map_err(|e| {
                api_error(
                    "Error when deleting match pool via AccelByte API",
                    "delete",
                    KIND,
                    &identity,
                    &e,
                )
            })?;

        self.settle(data, &identity).await;
        Ok(())
    }
}

const PROCESSING_ERROR: &str =
    "Error when updating match pool model according to AccelByte API response";

#[async_trait]
impl Resource for MatchPoolResource {
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
            .description("Manages a matchmaking pool in AccelByte Gaming Services");
        for attribute in identity_attributes(KIND)
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

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn create(
        &self,
        _ctx: Context,
        request: CreateResourceRequest,
    ) -> CreateResourceResponse {
        match self.create_pool(&request.planned_state).await {
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
        match self.read_pool(&request.current_state).await {
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
        match self.update_pool(&request.planned_state).await {
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
        let diagnostics = match self.delete_pool(&request.prior_state).await {
            Ok(()) => vec![],
            Err(diagnostic) => vec![diagnostic],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for MatchPoolResource {
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
impl ResourceWithImportState for MatchPoolResource {
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
