//! Conversion between Terraform state and AccelByte API payloads
//!
//! Each resource kind has a typed model built from a plan (or state) and
//! rebuilt from an API response. Values only present in the prior state,
//! such as whether an all-default nested object was declared, are passed in
//! so that decoding reproduces what the operator wrote.

pub mod json_blob;
pub mod match_pool;
pub mod match_ruleset;
pub mod server;
pub mod session_template;

use tfplug::types::{AttributePath, Dynamic, DynamicValue};
use tfplug::TfplugError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("{attribute} is not valid JSON: {reason}")]
    InvalidJson {
        attribute: &'static str,
        reason: String,
    },

    #[error("API response is missing required field {field}")]
    MissingField { field: &'static str },

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<TfplugError> for CodecError {
    fn from(e: TfplugError) -> Self {
        CodecError::InvalidState(e.to_string())
    }
}

/// Fields documented as always present must be there
pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> Result<T, CodecError> {
    value.ok_or(CodecError::MissingField { field })
}

/// Externally visible identifier of every resource
pub fn compute_id(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// Namespace and name, immutable for the life of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub namespace: String,
    pub name: String,
}

impl Identity {
    pub fn from_state(state: &DynamicValue) -> Result<Self, CodecError> {
        Ok(Self {
            namespace: state.get_string(&AttributePath::new("namespace"))?,
            name: state.get_string(&AttributePath::new("name"))?,
        })
    }

    pub fn id(&self) -> String {
        compute_id(&self.namespace, &self.name)
    }

    /// Starts a state document with namespace, name and id set
    pub(crate) fn to_state(&self) -> Result<DynamicValue, CodecError> {
        let mut state = DynamicValue::object();
        state.set_string(&AttributePath::new("namespace"), self.namespace.as_str())?;
        state.set_string(&AttributePath::new("name"), self.name.as_str())?;
        state.set_string(&AttributePath::new("id"), self.id())?;
        Ok(state)
    }
}

/// Whether a nested object is set and known in `state`
pub(crate) fn object_declared(state: &DynamicValue, attribute: &str) -> bool {
    matches!(
        state.value_at(&AttributePath::new(attribute)),
        Some(Dynamic::Map(_))
    )
}

/// Nested string, empty when unset
pub(crate) fn nested_string(object: &DynamicValue, name: &str) -> Result<String, CodecError> {
    Ok(object
        .get_optional_string(&AttributePath::new(name))?
        .unwrap_or_default())
}

/// Nested string list, empty when unset
pub(crate) fn nested_list(object: &DynamicValue, name: &str) -> Result<Vec<String>, CodecError> {
    let path = AttributePath::new(name);
    if !object.get(&path).is_present() {
        return Ok(Vec::new());
    }
    Ok(object.get_string_list(&path)?)
}

/// Nested bool, false when unset
pub(crate) fn nested_bool(object: &DynamicValue, name: &str) -> Result<bool, CodecError> {
    let path = AttributePath::new(name);
    if !object.get(&path).is_present() {
        return Ok(false);
    }
    Ok(object.get_bool(&path)?)
}
