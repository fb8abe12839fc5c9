use tfplug::types::{AttributePath, DynamicValue};

use super::{nested_list, nested_string, object_declared, required, CodecError, Identity};
use crate::api::match_pools::{
    CreateMatchPoolRequest, MatchFunctionOverride, MatchPool, MatchPoolConfig,
};
use crate::api::ListField;

pub const MATCH_FUNCTION_OVERRIDE: &str = "match_function_override";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFunctionOverrideModel {
    pub backfill_matches: String,
    pub enrichment: Vec<String>,
    pub make_matches: String,
    pub stat_codes: Vec<String>,
    pub validation: Vec<String>,
}

impl MatchFunctionOverrideModel {
    fn from_object(object: &DynamicValue) -> Result<Self, CodecError> {
        Ok(Self {
            backfill_matches: nested_string(object, "backfill_matches")?,
            enrichment: nested_list(object, "enrichment")?,
            make_matches: nested_string(object, "make_matches")?,
            stat_codes: nested_list(object, "stat_codes")?,
            validation: nested_list(object, "validation")?,
        })
    }

    fn to_object(&self) -> Result<DynamicValue, CodecError> {
        let mut object = DynamicValue::object();
        object.set_string(
            &AttributePath::new("backfill_matches"),
            self.backfill_matches.as_str(),
        )?;
        object.set_string_list(&AttributePath::new("enrichment"), &self.enrichment)?;
        object.set_string(
            &AttributePath::new("make_matches"),
            self.make_matches.as_str(),
        )?;
        object.set_string_list(&AttributePath::new("stat_codes"), &self.stat_codes)?;
        object.set_string_list(&AttributePath::new("validation"), &self.validation)?;
        Ok(object)
    }

    fn to_api(&self) -> MatchFunctionOverride {
        MatchFunctionOverride {
            backfill_matches: self.backfill_matches.clone(),
            enrichment: ListField::from_items(self.enrichment.clone()),
            make_matches: self.make_matches.clone(),
            stat_codes: ListField::from_items(self.stat_codes.clone()),
            validation: ListField::from_items(self.validation.clone()),
        }
    }

    /// Null lists from the service read as empty
    fn from_api(api: &MatchFunctionOverride) -> Self {
        Self {
            backfill_matches: api.backfill_matches.clone(),
            enrichment: api.enrichment.items().to_vec(),
            make_matches: api.make_matches.clone(),
            stat_codes: api.stat_codes.items().to_vec(),
            validation: api.validation.items().to_vec(),
        }
    }

    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Declared shape of `accelbyte_match_pool`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPoolModel {
    pub identity: Identity,
    pub rule_set: String,
    pub session_template: String,
    pub ticket_expiration_seconds: i64,
    pub best_latency_calculation_method: String,
    pub auto_accept_backfill_proposal: bool,
    pub backfill_proposal_expiration_seconds: i64,
    pub backfill_ticket_expiration_seconds: i64,
    pub match_function: String,
    pub match_function_override: Option<MatchFunctionOverrideModel>,
    pub crossplay_enabled: bool,
    pub platform_group_enabled: bool,
}

impl MatchPoolModel {
    /// Reads a planned state; defaults have already been applied by planning
    pub fn from_plan(plan: &DynamicValue) -> Result<Self, CodecError> {
        let match_function_override = plan
            .get_object(&AttributePath::new(MATCH_FUNCTION_OVERRIDE))?
            .map(|object| MatchFunctionOverrideModel::from_object(&object))
            .transpose()?;

        Ok(Self {
            identity: Identity::from_state(plan)?,
            rule_set: plan.get_string(&AttributePath::new("rule_set"))?,
            session_template: plan.get_string(&AttributePath::new("session_template"))?,
            ticket_expiration_seconds: plan
                .get_i64(&AttributePath::new("ticket_expiration_seconds"))?,
            best_latency_calculation_method: plan
                .get_string(&AttributePath::new("best_latency_calculation_method"))?,
            auto_accept_backfill_proposal: plan
                .get_bool(&AttributePath::new("auto_accept_backfill_proposal"))?,
            backfill_proposal_expiration_seconds: plan
                .get_i64(&AttributePath::new("backfill_proposal_expiration_seconds"))?,
            backfill_ticket_expiration_seconds: plan
                .get_i64(&AttributePath::new("backfill_ticket_expiration_seconds"))?,
            match_function: plan.get_string(&AttributePath::new("match_function"))?,
            match_function_override,
            crossplay_enabled: plan.get_bool(&AttributePath::new("crossplay_enabled"))?,
            platform_group_enabled: plan.get_bool(&AttributePath::new("platform_group_enabled"))?,
        })
    }

    /// Rebuilds the model from the service's view of the pool
    ///
    /// `prior` is the plan or state the call started from. An override the
    /// service does not report is kept as an empty object when `prior`
    /// declared one, and left absent otherwise.
    pub fn from_api(
        identity: Identity,
        prior: &DynamicValue,
        api: &MatchPool,
    ) -> Result<Self, CodecError> {
        let remote_override = api
            .match_function_override
            .as_ref()
            .map(MatchFunctionOverrideModel::from_api)
            .filter(|model| !model.is_empty());
        let match_function_override = match remote_override {
            Some(model) => Some(model),
            None if object_declared(prior, MATCH_FUNCTION_OVERRIDE) => {
                Some(MatchFunctionOverrideModel::default())
            }
            None => None,
        };

        Ok(Self {
            identity,
            rule_set: required(api.rule_set.clone(), "rule_set")?,
            session_template: required(api.session_template.clone(), "session_template")?,
            ticket_expiration_seconds: required(
                api.ticket_expiration_seconds,
                "ticket_expiration_seconds",
            )?,
            best_latency_calculation_method: api.best_latency_calculation_method.clone(),
            auto_accept_backfill_proposal: required(
                api.auto_accept_backfill_proposal,
                "auto_accept_backfill_proposal",
            )?,
            backfill_proposal_expiration_seconds: required(
                api.backfill_proposal_expiration_seconds,
                "backfill_proposal_expiration_seconds",
            )?,
            backfill_ticket_expiration_seconds: required(
                api.backfill_ticket_expiration_seconds,
                "backfill_ticket_expiration_seconds",
            )?,
            match_function: required(api.match_function.clone(), "match_function")?,
            match_function_override,
            crossplay_enabled: !api.crossplay_disabled,
            platform_group_enabled: api.platform_group_enabled,
        })
    }

    pub fn to_state(&self) -> Result<DynamicValue, CodecError> {
        let mut state = self.identity.to_state()?;
        state.set_string(&AttributePath::new("rule_set"), self.rule_set.as_str())?;
        state.set_string(
            &AttributePath::new("session_template"),
            self.session_template.as_str(),
        )?;
        state.set_i64(
            &AttributePath::new("ticket_expiration_seconds"),
            self.ticket_expiration_seconds,
        )?;
        state.set_string(
            &AttributePath::new("best_latency_calculation_method"),
            self.best_latency_calculation_method.as_str(),
        )?;
        state.set_bool(
            &AttributePath::new("auto_accept_backfill_proposal"),
            self.auto_accept_backfill_proposal,
        )?;
        state.set_i64(
            &AttributePath::new("backfill_proposal_expiration_seconds"),
            self.backfill_proposal_expiration_seconds,
        )?;
        state.set_i64(
            &AttributePath::new("backfill_ticket_expiration_seconds"),
            self.backfill_ticket_expiration_seconds,
        )?;
        state.set_string(
            &AttributePath::new("match_function"),
            self.match_function.as_str(),
        )?;
        match &self.match_function_override {
            Some(model) => state.set_object(
                &AttributePath::new(MATCH_FUNCTION_OVERRIDE),
                model.to_object()?,
            )?,
            None => state.set_null(&AttributePath::new(MATCH_FUNCTION_OVERRIDE))?,
        }
        state.set_bool(
            &AttributePath::new("crossplay_enabled"),
            self.crossplay_enabled,
        )?;
        state.set_bool(
            &AttributePath::new("platform_group_enabled"),
            self.platform_group_enabled,
        )?;
        Ok(state)
    }

    /// Mutable fields only; the pool name travels in the path
    pub fn to_config(&self) -> MatchPoolConfig {
        MatchPoolConfig {
            rule_set: self.rule_set.clone(),
            session_template: self.session_template.clone(),
            ticket_expiration_seconds: self.ticket_expiration_seconds,
            best_latency_calculation_method: self.best_latency_calculation_method.clone(),
            auto_accept_backfill_proposal: self.auto_accept_backfill_proposal,
            backfill_proposal_expiration_seconds: self.backfill_proposal_expiration_seconds,
            backfill_ticket_expiration_seconds: self.backfill_ticket_expiration_seconds,
            match_function: self.match_function.clone(),
            match_function_override: self
                .match_function_override
                .as_ref()
                .map(MatchFunctionOverrideModel::to_api),
            crossplay_disabled: !self.crossplay_enabled,
            platform_group_enabled: self.platform_group_enabled,
        }
    }

    pub fn to_create_request(&self) -> CreateMatchPoolRequest {
        CreateMatchPoolRequest {
            name: self.identity.name.clone(),
            config: self.to_config(),
        }
    }
}
