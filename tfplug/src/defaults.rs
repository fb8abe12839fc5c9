//! Default value providers for attributes
//!
//! A default is evaluated during planning when an optional+computed attribute
//! is absent from configuration. Nested attributes receive their defaults only
//! when the enclosing object itself is configured.

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::Dynamic;

/// A fixed default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn int(value: i64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value as f64))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }

    /// An explicit empty list rather than null
    pub fn empty_list() -> Box<dyn Default> {
        Self::create(Dynamic::List(Vec::new()))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("defaults to {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: self.value.clone(),
        }
    }
}
