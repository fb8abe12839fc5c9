//! Session template resource implementation
//!
//! Also registered as `accelbyte_configuration_template`, the name the
//! session service uses for the same object.

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
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{ConflictsWith, ExactlyOneOf, IntAtLeast, OneOf};
use tracing::{info, warn};

use super::{
    api_error, downcast_provider_data, identity_attributes, invalid_state, not_configured,
    resource_not_found, response_error,
};
use crate::models::server::{
    FunctionFlags, AMS_SERVER, CUSTOM_SERVER, CUSTOM_SESSION_FUNCTION, P2P_SERVER,
};
use crate::models::session_template::{
    SessionTemplateModel, CUSTOM_ATTRIBUTES, JOINABILITY_VALUES,
};
use crate::models::{json_blob, CodecError, Identity};
use crate::AccelByteProviderData;

pub const TYPE_NAME: &str = "accelbyte_session_template";
pub const CONFIGURATION_TEMPLATE_TYPE_NAME: &str = "accelbyte_configuration_template";

const KIND: &str = "session template";

const CONVERSION_ERROR: &str =
    "Error when converting our internal state to an AccelByte API session template";
const PROCESSING_ERROR: &str =
    "Error when updating session template model according to AccelByte API response";

/// `custom_url` and `extend_app`, exactly one of which is set
fn callback_target_attributes(kind: &str) -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("custom_url", AttributeType::String)
            .description(&format!("URL of a self-hosted {}", kind))
            .default(StaticDefault::string(""))
            .validator(ExactlyOneOf::siblings(&["extend_app"]))
            .build(),
        AttributeBuilder::new("extend_app", AttributeType::String)
            .description(&format!("Extend app acting as the {}", kind))
            .default(StaticDefault::string(""))
            .build(),
    ]
}

fn bool_attribute(name: &str, description: &str, default: bool) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Bool)
        .description(description)
        .default(StaticDefault::bool(default))
        .build()
}

fn timeout_attribute(name: &str, description: &str, default: i64) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Number)
        .description(description)
        .default(StaticDefault::int(default))
        .validator(IntAtLeast::new(0))
        .build()
}

pub(crate) fn settings_attributes() -> Vec<Attribute> {
    let mut function_attributes: Vec<Attribute> = FunctionFlags::ATTRIBUTES
        .iter()
        .map(|flag| {
            bool_attribute(
                flag,
                &format!("Call the function {}", flag.replace('_', " ")),
                false,
            )
        })
        .collect();
    function_attributes.extend(callback_target_attributes("session function"));

    vec![
        AttributeBuilder::new("min_players", AttributeType::Number)
            .description("Minimum number of players in a session")
            .required()
            .validator(IntAtLeast::new(0))
            .build(),
        AttributeBuilder::new("max_players", AttributeType::Number)
            .description("Maximum number of players in a session")
            .required()
            .validator(IntAtLeast::new(0))
            .build(),
        AttributeBuilder::new("joinability", AttributeType::String)
            .description("Who may join: OPEN, CLOSED, INVITE_ONLY, FRIENDS_OF_MEMBERS, FRIENDS_OF_LEADER or FRIENDS_OF_FRIENDS")
            .required()
            .validator(OneOf::strings(&JOINABILITY_VALUES))
            .build(),
        AttributeBuilder::new("max_active_sessions", AttributeType::Number)
            .description("Sessions a player may be in at once; -1 means unlimited")
            .default(StaticDefault::int(-1))
            .validator(IntAtLeast::new(-1))
            .build(),
        AttributeBuilder::nested(
            CUSTOM_SESSION_FUNCTION,
            NestedType::single(function_attributes),
        )
        .description(
            "Callback invoked on session and party events. Removing this block keeps the \
             callback already configured on the template.",
        )
        .optional()
        .computed()
        .build(),
        timeout_attribute(
            "invite_timeout",
            "Seconds an invitation stays valid",
            60,
        ),
        timeout_attribute(
            "inactive_timeout",
            "Seconds a disconnected player keeps their place",
            60,
        ),
        timeout_attribute(
            "leader_election_grace_period",
            "Seconds to wait for a disconnected leader before electing another",
            0,
        ),
        AttributeBuilder::nested(P2P_SERVER, NestedType::single(vec![]))
            .description("Players host sessions peer to peer")
            .optional()
            .validator(ConflictsWith::root(&[AMS_SERVER, CUSTOM_SERVER]))
            .build(),
        AttributeBuilder::nested(
            AMS_SERVER,
            NestedType::single(vec![
                AttributeBuilder::new("requested_regions", AttributeType::list_of_strings())
                    .description("Regions to claim servers from, in order of preference")
                    .default(StaticDefault::empty_list())
                    .build(),
                AttributeBuilder::new("preferred_claim_keys", AttributeType::list_of_strings())
                    .description("Claim keys tried first")
                    .default(StaticDefault::empty_list())
                    .build(),
                AttributeBuilder::new("fallback_claim_keys", AttributeType::list_of_strings())
                    .description("Claim keys tried when no preferred key has a server")
                    .default(StaticDefault::empty_list())
                    .build(),
            ]),
        )
        .description("Dedicated servers claimed from AccelByte Multiplayer Servers")
        .optional()
        .validator(ConflictsWith::root(&[CUSTOM_SERVER]))
        .build(),
        AttributeBuilder::nested(
            CUSTOM_SERVER,
            NestedType::single(callback_target_attributes("server manager")),
        )
        .description("Dedicated servers supplied by a custom server manager")
        .optional()
        .build(),
        bool_attribute(
            "auto_join_session",
            "Invited players join without accepting",
            false,
        ),
        bool_attribute(
            "chat_room",
            "Create a text chat room for each session",
            false,
        ),
        bool_attribute(
            "secret_validation",
            "Issue a secret that the server validates on join",
            false,
        ),
        bool_attribute(
            "generate_code",
            "Generate a join code for each session",
            true,
        ),
        bool_attribute(
            "immutable_session_storage",
            "Session storage cannot be changed once written",
            false,
        ),
        bool_attribute(
            "manual_set_ready_for_ds",
            "The dedicated server reports readiness itself",
            false,
        ),
        bool_attribute(
            "tied_teams_session_lifetime",
            "Team membership ends with the session",
            false,
        ),
        bool_attribute(
            "auto_leave_session",
            "Players leave their previous session when joining a new one",
            false,
        ),
        AttributeBuilder::new(CUSTOM_ATTRIBUTES, AttributeType::String)
            .description("Free-form session attributes as JSON text")
            .optional()
            .build(),
    ]
}

/// A configured session function must react to at least one event
fn validate_function_flags(config: &DynamicValue) -> Option<Diagnostic> {
    let base = AttributePath::new(CUSTOM_SESSION_FUNCTION);
    let object = config.get_object(&base).ok().flatten()?;

    let flags: Vec<_> = FunctionFlags::ATTRIBUTES
        .iter()
        .map(|flag| object.get(&AttributePath::new(flag)))
        .collect();
    if flags.iter().any(|flag| flag.is_unknown()) {
        return None;
    }
    if flags.iter().any(|flag| flag.as_bool() == Some(true)) {
        return None;
    }

    Some(
        Diagnostic::error(
            "Invalid Attribute Combination",
            format!(
                "At least one of [{}] must be true",
                FunctionFlags::ATTRIBUTES.join(", ")
            ),
        )
        .with_attribute(base),
    )
}

fn conversion_error(error: CodecError) -> Diagnostic {
    let diagnostic = Diagnostic::error(CONVERSION_ERROR, error.to_string());
    match error {
        CodecError::InvalidJson { attribute, .. } => {
            diagnostic.with_attribute(AttributePath::new(attribute))
        }
        _ => diagnostic,
    }
}

pub struct SessionTemplateResource {
    type_name: &'static str,
    provider_data: Option<AccelByteProviderData>,
}

impl Default for SessionTemplateResource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTemplateResource {
    pub fn new() -> Self {
        Self {
            type_name: TYPE_NAME,
            provider_data: None,
        }
    }

    /// The same resource under `accelbyte_configuration_template`
    pub fn configuration_template() -> Self {
        Self {
            type_name: CONFIGURATION_TEMPLATE_TYPE_NAME,
            provider_data: None,
        }
    }

    fn provider_data(&self) -> Result<&AccelByteProviderData, Diagnostic> {
        self.provider_data.as_ref().ok_or_else(not_configured)
    }

    async fn create_template(
        &self,
        planned_state: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data()?;
        let model = SessionTemplateModel::from_plan(planned_state).map_err(invalid_state)?;
        let identity = model.identity.clone();
        let request = model.to_create_request().map_err(conversion_error)?;

        info!(namespace = %identity.namespace, name = %identity.name, "creating session template");
        let template = data
            .client
            .session_templates()
            .create(&identity.namespace, &request)
            .await
            .map_err(|e| {
                api_error(
                    "Error when creating session template via AccelByte API",
                    "create",
                    KIND,
                    &identity,
                    &e,
                )
            })?;

        SessionTemplateModel::from_api(identity.clone(), planned_state, &template)
            .and_then(|model| model.to_state())
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn read_template(
        &self,
        current_state: &DynamicValue,
    ) -> Result<Option<DynamicValue>, Diagnostic> {
        let data = self.provider_data()?;
        let identity = Identity::from_state(current_state).map_err(invalid_state)?;

        let template = match data
            .client
            .session_templates()
            .get(&identity.namespace, &identity.name)
            .await
        {
            Ok(template) => template,
            Err(e) if e.is_not_found() => {
                info!(
                    namespace = %identity.namespace,
                    name = %identity.name,
                    "session template no longer exists, removing from state"
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(api_error(
                    "Error when reading session template via AccelByte API",
                    "read",
                    KIND,
                    &identity,
                    &e,
                ))
            }
        };

        SessionTemplateModel::from_api(identity.clone(), current_state, &template)
            .and_then(|model| model.to_state())
            .map(Some)
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn update_template(
        &self,
        planned_state: &DynamicValue,
    ) -> Result<DynamicValue, Diagnostic> {
        let data = self.provider_data()?;
        let model = SessionTemplateModel::from_plan(planned_state).map_err(invalid_state)?;
        let identity = model.identity.clone();
        let config = model.to_config().map_err(conversion_error)?;

        info!(namespace = %identity.namespace, name = %identity.name, "updating session template");
        let template = data
            .client
            .session_templates()
            .update(&identity.namespace, &identity.name, &config)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    resource_not_found("Session template", &identity)
                } else {
                    api_error(
                        "Error when updating session template via AccelByte API",
                        "update",
                        KIND,
                        &identity,
                        &e,
                    )
                }
            })?;

        SessionTemplateModel::from_api(identity.clone(), planned_state, &template)
            .and_then(|model| model.to_state())
            .map_err(|e| response_error(PROCESSING_ERROR, KIND, &identity, &e))
    }

    async fn delete_template(&self, prior_state: &DynamicValue) -> Result<(), Diagnostic> {
        let data = self.provider_data()?;
        let identity = Identity::from_state(prior_state).map_err(invalid_state)?;

        info!(namespace = %identity.namespace, name = %identity.name, "deleting session template");
        data.client
            .session_templates()
            .delete(&identity.namespace, &identity.name)
            .await
            .map_err(|e| {
                api_error(
                    "Error when deleting session template via AccelByte API",
                    "delete",
                    KIND,
                    &identity,
                    &e,
                )
            })
    }
}

#[async_trait]
impl Resource for SessionTemplateResource {
    fn type_name(&self) -> &str {
        self.type_name
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
            .description("Manages a session template in AccelByte Gaming Services");
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
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics: Vec<Diagnostic> = validate_function_flags(&request.config)
            .into_iter()
            .collect();

        let path = AttributePath::new(CUSTOM_ATTRIBUTES);
        if let Ok(Some(text)) = request.config.get_optional_string(&path) {
            if let Err(e) = json_blob::parse(CUSTOM_ATTRIBUTES, &text) {
                diagnostics.push(
                    Diagnostic::error("Invalid JSON attributes", e.to_string())
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
        match self.create_template(&request.planned_state).await {
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
        match self.read_template(&request.current_state).await {
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
        match self.update_template(&request.planned_state).await {
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
        let diagnostics = match self.delete_template(&request.prior_state).await {
            Ok(()) => vec![],
            Err(diagnostic) => vec![diagnostic],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for SessionTemplateResource {
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
impl ResourceWithImportState for SessionTemplateResource {
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
