//! Resource implementations
//!
//! Every resource is keyed by `namespace` + `name`, exposes `id` as
//! `namespace/name`, and imports from that same string.

pub mod match_pool;
pub mod match_ruleset;
pub mod session_template;

pub use match_pool::MatchPoolResource;
pub use match_ruleset::MatchRuleSetResource;
pub use session_template::SessionTemplateResource;

use std::any::Any;
use std::sync::Arc;

use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::Diagnostic;

use crate::api::ApiError;
use crate::models::{CodecError, Identity};
use crate::AccelByteProviderData;

/// `namespace` and `name` force replacement; `id` survives plans unchanged
pub(crate) fn identity_attributes(kind: &str) -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("namespace", AttributeType::String)
            .description(&format!("Game namespace which the {} belongs to", kind))
            .required()
            .plan_modifier(RequiresReplace::create())
            .build(),
        AttributeBuilder::new("name", AttributeType::String)
            .description(&format!("Name of the {}", kind))
            .required()
            .plan_modifier(RequiresReplace::create())
            .build(),
        AttributeBuilder::new("id", AttributeType::String)
            .description("Identifier in the form namespace/name")
            .computed()
            .plan_modifier(UseStateForUnknown::create())
            .build(),
    ]
}

/// Extracts the session handed out by the provider's configure step
pub(crate) fn downcast_provider_data(
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
) -> Result<AccelByteProviderData, Diagnostic> {
    let data = provider_data.ok_or_else(not_configured)?;
    match data.downcast_ref::<AccelByteProviderData>() {
        Some(provider_data) => Ok(provider_data.clone()),
        None => {
            tracing::error!("Failed to downcast provider data to AccelByteProviderData");
            Err(Diagnostic::error(
                "Invalid provider data",
                "Failed to extract AccelByteProviderData from provider data",
            ))
        }
    }
}

pub(crate) fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

/// "Unable to {action} {kind} '{name}' in namespace '{namespace}', got error: ..."
pub(crate) fn api_error(
    summary: &str,
    action: &str,
    kind: &str,
    identity: &Identity,
    error: &ApiError,
) -> Diagnostic {
    Diagnostic::error(
        summary,
        format!(
            "Unable to {} {} '{}' in namespace '{}', got error: {}",
            action, kind, identity.name, identity.namespace, error
        ),
    )
}

/// The object vanished between plan and apply
pub(crate) fn resource_not_found(kind: &str, identity: &Identity) -> Diagnostic {
    Diagnostic::error(
        "Resource not found",
        format!(
            "{} '{}' does not exist in namespace '{}'",
            kind, identity.name, identity.namespace
        ),
    )
}

pub(crate) fn invalid_state(error: CodecError) -> Diagnostic {
    Diagnostic::error("Invalid resource state", error.to_string())
}

/// Turning a response into state failed
pub(crate) fn response_error(
    summary: &str,
    kind: &str,
    identity: &Identity,
    error: &CodecError,
) -> Diagnostic {
    Diagnostic::error(
        summary,
        format!(
            "Unable to process API response for {} '{}' in namespace '{}' into model, got error: {}",
            kind, identity.name, identity.namespace, error
        ),
    )
}
