use serde_json::Value;
use tfplug::types::{AttributePath, DynamicValue};

use super::{json_blob, required, CodecError, Identity};
use crate::api::rule_sets::{CreateRuleSetRequest, RuleSet, RuleSetConfig};

pub const CONFIGURATION: &str = "configuration";

/// Declared shape of `accelbyte_match_ruleset`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRuleSetModel {
    pub identity: Identity,
    pub enable_custom_match_function: bool,
    /// JSON text as stored in state
    pub configuration: String,
}

impl MatchRuleSetModel {
    pub fn from_plan(plan: &DynamicValue) -> Result<Self, CodecError> {
        Ok(Self {
            identity: Identity::from_state(plan)?,
            enable_custom_match_function: plan
                .get_bool(&AttributePath::new("enable_custom_match_function"))?,
            configuration: plan.get_string(&AttributePath::new(CONFIGURATION))?,
        })
    }

    /// Keeps the prior configuration text when the service reports the same value
    pub fn from_api(
        identity: Identity,
        prior: &DynamicValue,
        api: &RuleSet,
    ) -> Result<Self, CodecError> {
        let prior_text = prior.get_optional_string(&AttributePath::new(CONFIGURATION))?;
        tracing::trace!(data = %api.data, "rule set data from API");

        Ok(Self {
            identity,
            enable_custom_match_function: required(
                api.enable_custom_match_function,
                "enable_custom_match_function",
            )?,
            configuration: json_blob::reconcile(prior_text.as_deref(), &api.data),
        })
    }

    pub fn to_state(&self) -> Result<DynamicValue, CodecError> {
        let mut state = self.identity.to_state()?;
        state.set_bool(
            &AttributePath::new("enable_custom_match_function"),
            self.enable_custom_match_function,
        )?;
        state.set_string(
            &AttributePath::new(CONFIGURATION),
            self.configuration.as_str(),
        )?;
        Ok(state)
    }

    fn data(&self) -> Result<Value, CodecError> {
        json_blob::parse(CONFIGURATION, &self.configuration)
    }

    pub fn to_config(&self) -> Result<RuleSetConfig, CodecError> {
        Ok(RuleSetConfig {
            enable_custom_match_function: self.enable_custom_match_function,
            data: self.data()?,
        })
    }

    pub fn to_create_request(&self) -> Result<CreateRuleSetRequest, CodecError> {
        Ok(CreateRuleSetRequest {
            name: self.identity.name.clone(),
            config: self.to_config()?,
        })
    }
}
