//! In-process provider host
//!
//! [`ProviderHost`] performs the host-side steps Terraform core drives over
//! the plugin protocol: configure the provider, validate resource
//! configuration against its schema, plan a change (defaults, computed
//! values, plan modifiers), apply it, refresh, import and read data sources.
//! Resource and data source instances are built fresh per request from the
//! provider's factories and configured with the provider data before use.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest,
};
use crate::error::TfplugError;
use crate::provider::{ConfigureProviderRequest, Provider, ProviderSchemaRequest};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ImportedResource, ManagedResource, ReadResourceRequest,
    ResourceSchemaRequest, UpdateResourceRequest, ValidateResourceConfigRequest,
};
use crate::schema::{Attribute, DefaultRequest, PlanModifierRequest, Schema, ValidatorRequest};
use crate::types::{
    has_errors, AttributePath, ClientCapabilities, Diagnostic, Dynamic, DynamicValue,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn, Instrument};

/// Log level for the host's tracing subscriber
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Install a stderr fmt subscriber when the host is created
    pub enable_logging: bool,
    pub log_level: LogLevel,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            log_level: LogLevel::Info,
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_logging(mut self) -> Self {
        self.enable_logging = false;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

/// Installing twice is a no-op; the first subscriber wins
fn init_logging(config: &HostConfig) {
    if !config.enable_logging {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Result of planning one resource change
#[derive(Debug)]
pub struct PlanResult {
    /// Null when the change destroys the resource
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct ApplyResult {
    /// The state to persist; null when no object is tracked any more
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct ReadResult {
    /// Null when the remote object no longer exists
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
pub struct ImportResult {
    pub imported: Vec<ImportedResource>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ProviderHost<P: Provider> {
    provider: RwLock<P>,
    provider_data: RwLock<Option<Arc<dyn Any + Send + Sync>>>,
}

impl<P: Provider> ProviderHost<P> {
    pub fn new(provider: P, config: HostConfig) -> Self {
        init_logging(&config);
        Self {
            provider: RwLock::new(provider),
            provider_data: RwLock::new(None),
        }
    }

    pub async fn is_configured(&self) -> bool {
        self.provider_data.read().await.is_some()
    }

    /// Validates the provider block against the provider schema, then configures it
    pub async fn configure(
        &self,
        terraform_version: &str,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let ctx = Context::new().for_operation("provider", "configure");
        let mut provider = self.provider.write().await;

        let schema_response = provider
            .schema(ctx.clone(), ProviderSchemaRequest)
            .await;
        let mut diagnostics = schema_response.diagnostics;
        validate_object(
            &schema_response.schema.block.attributes,
            &config,
            &config.value,
            &AttributePath::root(),
            &mut diagnostics,
        );
        if has_errors(&diagnostics) {
            return diagnostics;
        }

        let response = provider
            .configure(
                ctx.clone(),
                ConfigureProviderRequest {
                    terraform_version: terraform_version.to_string(),
                    config,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .instrument(ctx.span())
            .await;
        diagnostics.extend(response.diagnostics);

        if !has_errors(&diagnostics) {
            info!(provider = provider.type_name(), "provider configured");
            *self.provider_data.write().await = response.provider_data;
        }
        diagnostics
    }

    /// Schema checks followed by the resource's own cross-attribute checks
    pub async fn validate_resource_config(
        &self,
        type_name: &str,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let ctx = Context::new().for_operation(type_name, "validate");
        let (resource, schema) = match self.resource_with_schema(&ctx, type_name).await {
            Ok(found) => found,
            Err(diagnostics) => return diagnostics,
        };

        let mut diagnostics = Vec::new();
        validate_object(
            &schema.block.attributes,
            &config,
            &config.value,
            &AttributePath::root(),
            &mut diagnostics,
        );
        if has_errors(&diagnostics) {
            return diagnostics;
        }

        let response = resource
            .validate(
                ctx.clone(),
                ValidateResourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .instrument(ctx.span())
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    /// Produces the planned state for moving from `prior_state` to `config`
    ///
    /// A null config plans a destroy. When a plan modifier asks for
    /// replacement, the returned plan is the plan for the replacement object.
    pub async fn plan_resource_change(
        &self,
        type_name: &str,
        prior_state: DynamicValue,
        config: DynamicValue,
    ) -> PlanResult {
        if config.is_null() {
            return PlanResult {
                planned_state: DynamicValue::null(),
                requires_replace: Vec::new(),
                diagnostics: Vec::new(),
            };
        }

        let ctx = Context::new().for_operation(type_name, "plan");
        let (_, schema) = match self.resource_with_schema(&ctx, type_name).await {
            Ok(found) => found,
            Err(diagnostics) => {
                return PlanResult {
                    planned_state: DynamicValue::null(),
                    requires_replace: Vec::new(),
                    diagnostics,
                }
            }
        };

        let mut plan = plan_change(&schema, &prior_state, &config);
        if !plan.requires_replace.is_empty() {
            debug!(type_name, replace = ?plan.requires_replace, "planning replacement");
            let replacement = plan_change(&schema, &DynamicValue::null(), &config);
            plan.planned_state = replacement.planned_state;
            plan.diagnostics.extend(replacement.diagnostics);
        }
        plan
    }

    /// Dispatches to create, update or delete from the prior and planned states
    pub async fn apply_resource_change(
        &self,
        type_name: &str,
        prior_state: DynamicValue,
        planned_state: DynamicValue,
        config: DynamicValue,
    ) -> ApplyResult {
        let operation = match (prior_state.is_null(), planned_state.is_null()) {
            (true, true) => {
                return ApplyResult {
                    new_state: DynamicValue::null(),
                    diagnostics: Vec::new(),
                }
            }
            (true, false) => "create",
            (false, true) => "delete",
            (false, false) => "update",
        };
        let ctx = Context::new().for_operation(type_name, operation);

        let resource = match self.configured_resource(&ctx, type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ApplyResult {
                    new_state: prior_state,
                    diagnostics,
                }
            }
        };

        match operation {
            "create" => {
                let response = resource
                    .create(
                        ctx.clone(),
                        CreateResourceRequest {
                            type_name: type_name.to_string(),
                            planned_state,
                            config,
                        },
                    )
                    .instrument(ctx.span())
                    .await;
                if has_errors(&response.diagnostics) {
                    warn!(type_name, "create failed, no state persisted");
                    return ApplyResult {
                        new_state: DynamicValue::null(),
                        diagnostics: response.diagnostics,
                    };
                }
                ApplyResult {
                    new_state: response.new_state,
                    diagnostics: response.diagnostics,
                }
            }
            "delete" => {
                let response = resource
                    .delete(
                        ctx.clone(),
                        DeleteResourceRequest {
                            type_name: type_name.to_string(),
                            prior_state: prior_state.clone(),
                        },
                    )
                    .instrument(ctx.span())
                    .await;
                let new_state = if has_errors(&response.diagnostics) {
                    prior_state
                } else {
                    DynamicValue::null()
                };
                ApplyResult {
                    new_state,
                    diagnostics: response.diagnostics,
                }
            }
            _ => {
                let response = resource
                    .update(
                        ctx.clone(),
                        UpdateResourceRequest {
                            type_name: type_name.to_string(),
                            prior_state: prior_state.clone(),
                            planned_state,
                            config,
                        },
                    )
                    .instrument(ctx.span())
                    .await;
                if has_errors(&response.diagnostics) {
                    warn!(type_name, "update failed, prior state kept");
                    return ApplyResult {
                        new_state: prior_state,
                        diagnostics: response.diagnostics,
                    };
                }
                ApplyResult {
                    new_state: response.new_state,
                    diagnostics: response.diagnostics,
                }
            }
        }
    }

    /// Refreshes state from the remote object
    pub async fn read_resource(&self, type_name: &str, current_state: DynamicValue) -> ReadResult {
        if current_state.is_null() {
            return ReadResult {
                new_state: current_state,
                diagnostics: Vec::new(),
            };
        }

        let ctx = Context::new().for_operation(type_name, "read");
        let resource = match self.configured_resource(&ctx, type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ReadResult {
                    new_state: current_state,
                    diagnostics,
                }
            }
        };

        let response = resource
            .read(
                ctx.clone(),
                ReadResourceRequest {
                    type_name: type_name.to_string(),
                    current_state: current_state.clone(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .instrument(ctx.span())
            .await;

        if has_errors(&response.diagnostics) {
            return ReadResult {
                new_state: current_state,
                diagnostics: response.diagnostics,
            };
        }

        let new_state = response.new_state.unwrap_or_else(|| {
            info!(type_name, "remote object is gone, dropping from state");
            DynamicValue::null()
        });
        ReadResult {
            new_state,
            diagnostics: response.diagnostics,
        }
    }

    /// Imports by id, then refreshes each imported object
    pub async fn import_resource_state(&self, type_name: &str, id: &str) -> ImportResult {
        let ctx = Context::new().for_operation(type_name, "import");
        let resource = match self.configured_resource(&ctx, type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ImportResult {
                    imported: Vec::new(),
                    diagnostics,
                }
            }
        };

        let response = resource
            .import_state(
                ctx.clone(),
                ImportResourceStateRequest {
                    type_name: type_name.to_string(),
                    id: id.to_string(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .instrument(ctx.span())
            .await;
        let mut diagnostics = response.diagnostics;
        if has_errors(&diagnostics) {
            return ImportResult {
                imported: Vec::new(),
                diagnostics,
            };
        }

        let mut imported = Vec::with_capacity(response.imported_resources.len());
        for candidate in response.imported_resources {
            let read = self
                .read_resource(&candidate.type_name, candidate.state)
                .await;
            diagnostics.extend(read.diagnostics);
            if has_errors(&diagnostics) {
                return ImportResult {
                    imported: Vec::new(),
                    diagnostics,
                };
            }
            if read.new_state.is_null() {
                diagnostics.push(Diagnostic::error(
                    "Cannot import non-existent remote object",
                    format!(
                        "While attempting to import an existing object to \"{}\", the provider detected that no object exists with the given id {:?}.",
                        candidate.type_name, id
                    ),
                ));
                return ImportResult {
                    imported: Vec::new(),
                    diagnostics,
                };
            }
            imported.push(ImportedResource {
                type_name: candidate.type_name,
                state: read.new_state,
            });
        }

        ImportResult {
            imported,
            diagnostics,
        }
    }

    /// Validates the data source configuration and reads it
    pub async fn read_data_source(&self, type_name: &str, config: DynamicValue) -> ReadResult {
        let ctx = Context::new().for_operation(type_name, "read_data_source");
        let data_source = match self.configured_data_source(&ctx, type_name).await {
            Ok(data_source) => data_source,
            Err(diagnostics) => {
                return ReadResult {
                    new_state: DynamicValue::null(),
                    diagnostics,
                }
            }
        };

        let schema_response = data_source
            .schema(ctx.clone(), DataSourceSchemaRequest)
            .await;
        let mut diagnostics = schema_response.diagnostics;
        validate_object(
            &schema_response.schema.block.attributes,
            &config,
            &config.value,
            &AttributePath::root(),
            &mut diagnostics,
        );
        if has_errors(&diagnostics) {
            return ReadResult {
                new_state: DynamicValue::null(),
                diagnostics,
            };
        }

        let response = data_source
            .read(
                ctx.clone(),
                ReadDataSourceRequest {
                    type_name: type_name.to_string(),
                    config,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .instrument(ctx.span())
            .await;
        diagnostics.extend(response.diagnostics);
        let new_state = if has_errors(&diagnostics) {
            DynamicValue::null()
        } else {
            response.state
        };
        ReadResult {
            new_state,
            diagnostics,
        }
    }

    async fn resource_with_schema(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<(Box<dyn ManagedResource>, Schema), Vec<Diagnostic>> {
        let resource = self.build_resource(type_name).await?;
        let response = resource.schema(ctx.clone(), ResourceSchemaRequest).await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok((resource, response.schema))
    }

    async fn build_resource(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn ManagedResource>, Vec<Diagnostic>> {
        let factories = self.provider.read().await.resources();
        let factory = factories.get(type_name).ok_or_else(|| {
            vec![Diagnostic::error(
                "Unknown resource type",
                TfplugError::ResourceNotFound(type_name.to_string()).to_string(),
            )]
        })?;
        Ok(factory())
    }

    async fn configured_resource(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<Box<dyn ManagedResource>, Vec<Diagnostic>> {
        let mut resource = self.build_resource(type_name).await?;
        let provider_data = self.provider_data().await?;
        let response = resource
            .configure(
                ctx.clone(),
                ConfigureResourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    async fn configured_data_source(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        let factories = self.provider.read().await.data_sources();
        let factory = factories.get(type_name).ok_or_else(|| {
            vec![Diagnostic::error(
                "Unknown data source type",
                TfplugError::DataSourceNotFound(type_name.to_string()).to_string(),
            )]
        })?;
        let mut data_source = factory();
        let provider_data = self.provider_data().await?;
        let response = data_source
            .configure(
                ctx.clone(),
                ConfigureDataSourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }

    async fn provider_data(&self) -> Result<Arc<dyn Any + Send + Sync>, Vec<Diagnostic>> {
        self.provider_data.read().await.clone().ok_or_else(|| {
            vec![Diagnostic::error(
                "Provider not configured",
                TfplugError::ProviderNotConfigured.to_string(),
            )]
        })
    }
}

fn field(object: &Dynamic, name: &str) -> Dynamic {
    match object {
        Dynamic::Map(fields) => fields.get(name).cloned().unwrap_or(Dynamic::Null),
        _ => Dynamic::Null,
    }
}

/// Schema checks for one object level; nested objects are only checked when set
fn validate_object(
    attributes: &[Attribute],
    config: &DynamicValue,
    object: &Dynamic,
    base: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Dynamic::Map(fields) = object {
        let mut unexpected: Vec<&String> = fields
            .keys()
            .filter(|key| !attributes.iter().any(|attr| &attr.name == *key))
            .collect();
        unexpected.sort();
        for name in unexpected {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here.", name),
                )
                .with_attribute(base.clone().attribute(name)),
            );
        }
    }

    for attr in attributes {
        let path = base.clone().attribute(&attr.name);
        let value = field(object, &attr.name);

        if attr.required && value.is_null() {
            diagnostics.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!(
                        "The argument \"{}\" is required, but no definition was found.",
                        path
                    ),
                )
                .with_attribute(path),
            );
            continue;
        }

        if attr.computed && !attr.optional && !attr.required && !value.is_null() {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid Configuration for Read-Only Attribute",
                    format!(
                        "Cannot set value for \"{}\" as the provider has marked it as read-only.",
                        path
                    ),
                )
                .with_attribute(path),
            );
            continue;
        }

        match (&attr.nested_type, &value) {
            (Some(nested), Dynamic::Map(_)) => {
                validate_object(&nested.attributes, config, &value, &path, diagnostics);
            }
            _ if !attr.r#type.accepts(&value) => {
                diagnostics.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!(
                            "Inappropriate value for attribute \"{}\": got {}.",
                            path,
                            value.type_name()
                        ),
                    )
                    .with_attribute(path),
                );
                continue;
            }
            _ => {}
        }

        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                config,
                config_value: value.clone(),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }
    }
}

/// Builds the proposed value for one object level
///
/// Configured values win. Unset attributes take their default, or for
/// computed attributes the prior value; the paths of the latter are recorded
/// so they can be marked unknown if the object changes.
fn propose_object(
    attributes: &[Attribute],
    config: &Dynamic,
    prior: &DynamicValue,
    base: &AttributePath,
    unset_computed: &mut Vec<AttributePath>,
) -> Dynamic {
    let mut planned = HashMap::with_capacity(attributes.len());
    for attr in attributes {
        let path = base.clone().attribute(&attr.name);
        let configured = field(config, &attr.name);

        let nested = match (&attr.nested_type, &configured) {
            (Some(nested), Dynamic::Map(_)) => Some(nested),
            _ => None,
        };

        let value = if let Some(nested) = nested {
            propose_object(
                &nested.attributes,
                &configured,
                prior,
                &path,
                unset_computed,
            )
        } else if configured.is_null() {
            match &attr.default {
                Some(default) => {
                    default
                        .default_value(DefaultRequest { path: path.clone() })
                        .value
                }
                None if attr.computed => {
                    unset_computed.push(path.clone());
                    prior.get(&path)
                }
                None => Dynamic::Null,
            }
        } else {
            configured
        };
        planned.insert(attr.name.clone(), value);
    }
    Dynamic::Map(planned)
}

fn plan_change(schema: &Schema, prior_state: &DynamicValue, config: &DynamicValue) -> PlanResult {
    let resource_exists = !prior_state.is_null();
    let mut diagnostics = Vec::new();
    let mut requires_replace = Vec::new();

    let mut unset_computed = Vec::new();
    let mut planned = DynamicValue::new(propose_object(
        &schema.block.attributes,
        &config.value,
        prior_state,
        &AttributePath::root(),
        &mut unset_computed,
    ));

    if !resource_exists || !planned.value.semantically_equals(&prior_state.value) {
        for path in &unset_computed {
            if let Err(e) = planned.mark_unknown(path) {
                diagnostics.push(Diagnostic::error("Failed to plan attribute", e.to_string()));
            }
        }
    }

    for attr in &schema.block.attributes {
        if attr.plan_modifiers.is_empty() {
            continue;
        }
        let path = AttributePath::new(&attr.name);
        let mut plan_value = planned.get(&path);
        for modifier in &attr.plan_modifiers {
            let response = modifier.modify(PlanModifierRequest {
                config_value: config.get(&path),
                state_value: prior_state.get(&path),
                plan_value,
                path: path.clone(),
                resource_exists,
            });
            plan_value = response.plan_value;
            if response.requires_replace && !requires_replace.contains(&path) {
                requires_replace.push(path.clone());
            }
            diagnostics.extend(response.diagnostics);
        }
        if let Err(e) = planned.set_value(&path, plan_value) {
            diagnostics.push(Diagnostic::error("Failed to plan attribute", e.to_string()));
        }
    }

    PlanResult {
        planned_state: planned,
        requires_replace,
        diagnostics,
    }
}
