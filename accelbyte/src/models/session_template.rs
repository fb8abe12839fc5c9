use serde_json::Value;
use tfplug::types::{AttributePath, DynamicValue};

use super::server::{CustomSessionFunction, ServerProvider, CUSTOM_SESSION_FUNCTION};
use super::{json_blob, object_declared, required, CodecError, Identity};
use crate::api::session_templates::{
    ConfigurationTemplate, ConfigurationTemplateConfig, CreateConfigurationTemplateRequest,
};
use crate::api::ListField;

pub const CUSTOM_ATTRIBUTES: &str = "custom_attributes";

pub const JOINABILITY_VALUES: [&str; 6] = [
    "OPEN",
    "CLOSED",
    "INVITE_ONLY",
    "FRIENDS_OF_MEMBERS",
    "FRIENDS_OF_LEADER",
    "FRIENDS_OF_FRIENDS",
];

/// Declared shape of `accelbyte_session_template`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTemplateModel {
    pub identity: Identity,
    pub min_players: i64,
    pub max_players: i64,
    pub joinability: String,
    pub max_active_sessions: i64,
    pub custom_session_function: Option<CustomSessionFunction>,
    pub invite_timeout: i64,
    pub inactive_timeout: i64,
    pub leader_election_grace_period: i64,
    pub server: ServerProvider,
    pub auto_join_session: bool,
    pub chat_room: bool,
    pub secret_validation: bool,
    pub generate_code: bool,
    pub immutable_session_storage: bool,
    pub manual_set_ready_for_ds: bool,
    pub tied_teams_session_lifetime: bool,
    pub auto_leave_session: bool,
    /// JSON text, absent when not declared
    pub custom_attributes: Option<String>,
}

impl SessionTemplateModel {
    pub fn from_plan(plan: &DynamicValue) -> Result<Self, CodecError> {
        let custom_session_function = plan
            .get_object(&AttributePath::new(CUSTOM_SESSION_FUNCTION))?
            .map(|object| CustomSessionFunction::from_object(&object))
            .transpose()?;
        let int = |name: &str| plan.get_i64(&AttributePath::new(name));
        let flag = |name: &str| plan.get_bool(&AttributePath::new(name));

        Ok(Self {
            identity: Identity::from_state(plan)?,
            min_players: int("min_players")?,
            max_players: int("max_players")?,
            joinability: plan.get_string(&AttributePath::new("joinability"))?,
            max_active_sessions: int("max_active_sessions")?,
            custom_session_function,
            invite_timeout: int("invite_timeout")?,
            inactive_timeout: int("inactive_timeout")?,
            leader_election_grace_period: int("leader_election_grace_period")?,
            server: ServerProvider::from_state(plan)?,
            auto_join_session: flag("auto_join_session")?,
            chat_room: flag("chat_room")?,
            secret_validation: flag("secret_validation")?,
            generate_code: flag("generate_code")?,
            immutable_session_storage: flag("immutable_session_storage")?,
            manual_set_ready_for_ds: flag("manual_set_ready_for_ds")?,
            tied_teams_session_lifetime: flag("tied_teams_session_lifetime")?,
            auto_leave_session: flag("auto_leave_session")?,
            custom_attributes: plan.get_optional_string(&AttributePath::new(CUSTOM_ATTRIBUTES))?,
        })
    }

    /// Rebuilds the model from the service's view of the template
    ///
    /// A custom session function the service reports as blank stays an
    /// empty object when `prior` declared one. Attributes the service reports
    /// as null or `{}` read as absent unless `prior` declared them.
    pub fn from_api(
        identity: Identity,
        prior: &DynamicValue,
        api: &ConfigurationTemplate,
    ) -> Result<Self, CodecError> {
        let remote_function = api
            .grpc_session_config
            .as_ref()
            .and_then(CustomSessionFunction::from_wire);
        let custom_session_function = match remote_function {
            Some(function) => Some(function),
            None if object_declared(prior, CUSTOM_SESSION_FUNCTION) => {
                Some(CustomSessionFunction::default())
            }
            None => None,
        };

        let prior_attributes = prior.get_optional_string(&AttributePath::new(CUSTOM_ATTRIBUTES))?;
        let custom_attributes = match (&api.attributes, prior_attributes.as_deref()) {
            (Value::Null, None) => None,
            (Value::Object(fields), None) if fields.is_empty() => None,
            (remote, prior_text) => Some(json_blob::reconcile(prior_text, remote)),
        };

        Ok(Self {
            identity,
            min_players: required(api.min_players, "minPlayers")?,
            max_players: required(api.max_players, "maxPlayers")?,
            joinability: required(api.joinability.clone(), "joinability")?,
            max_active_sessions: api.max_active_sessions,
            custom_session_function,
            invite_timeout: required(api.invite_timeout, "inviteTimeout")?,
            inactive_timeout: required(api.inactive_timeout, "inactiveTimeout")?,
            leader_election_grace_period: api.leader_election_grace_period,
            server: ServerProvider::from_wire(api),
            auto_join_session: api.auto_join,
            chat_room: api.text_chat.unwrap_or_default(),
            secret_validation: api.enable_secret,
            generate_code: !api.disable_code_generation,
            immutable_session_storage: api.immutable_storage,
            manual_set_ready_for_ds: api.ds_manual_set_ready,
            tied_teams_session_lifetime: api.tie_teams_session_lifetime,
            auto_leave_session: api.auto_leave_session,
            custom_attributes,
        })
    }

    pub fn to_state(&self) -> Result<DynamicValue, CodecError> {
        let mut state = self.identity.to_state()?;
        for (name, value) in [
            ("min_players", self.min_players),
            ("max_players", self.max_players),
            ("max_active_sessions", self.max_active_sessions),
            ("invite_timeout", self.invite_timeout),
            ("inactive_timeout", self.inactive_timeout),
            ("leader_election_grace_period", self.leader_election_grace_period),
        ] {
            state.set_i64(&AttributePath::new(name), value)?;
        }
        state.set_string(
            &AttributePath::new("joinability"),
            self.joinability.as_str(),
        )?;

        match &self.custom_session_function {
            Some(function) => state.set_object(
                &AttributePath::new(CUSTOM_SESSION_FUNCTION),
                function.to_object()?,
            )?,
            None => state.set_null(&AttributePath::new(CUSTOM_SESSION_FUNCTION))?,
        }
        self.server.write_state(&mut state)?;

        for (name, value) in [
            ("auto_join_session", self.auto_join_session),
            ("chat_room", self.chat_room),
            ("secret_validation", self.secret_validation),
            ("generate_code", self.generate_code),
            ("immutable_session_storage", self.immutable_session_storage),
            ("manual_set_ready_for_ds", self.manual_set_ready_for_ds),
            ("tied_teams_session_lifetime", self.tied_teams_session_lifetime),
            ("auto_leave_session", self.auto_leave_session),
        ] {
            state.set_bool(&AttributePath::new(name), value)?;
        }

        let attributes = AttributePath::new(CUSTOM_ATTRIBUTES);
        match &self.custom_attributes {
            Some(text) => state.set_string(&attributes, text.as_str())?,
            None => state.set_null(&attributes)?,
        }
        Ok(state)
    }

    /// Mutable fields only; the template name travels in the path
    pub fn to_config(&self) -> Result<ConfigurationTemplateConfig, CodecError> {
        let attributes = self
            .custom_attributes
            .as_deref()
            .map(|text| json_blob::parse(CUSTOM_ATTRIBUTES, text))
            .transpose()?;

        let mut config = ConfigurationTemplateConfig {
            min_players: self.min_players,
            max_players: self.max_players,
            joinability: self.joinability.clone(),
            max_active_sessions: self.max_active_sessions,
            invite_timeout: self.invite_timeout,
            inactive_timeout: self.inactive_timeout,
            leader_election_grace_period: self.leader_election_grace_period,
            server_type: String::new(),
            ds_source: String::new(),
            requested_regions: ListField::Empty,
            preferred_claim_keys: ListField::Empty,
            fallback_claim_keys: ListField::Empty,
            custom_url_grpc: String::new(),
            app_name: String::new(),
            grpc_session_config: self
                .custom_session_function
                .as_ref()
                .map(CustomSessionFunction::to_wire),
            auto_join: self.auto_join_session,
            text_chat: self.chat_room,
            enable_secret: self.secret_validation,
            disable_code_generation: !self.generate_code,
            immutable_storage: self.immutable_session_storage,
            ds_manual_set_ready: self.manual_set_ready_for_ds,
            tie_teams_session_lifetime: self.tied_teams_session_lifetime,
            auto_leave_session: self.auto_leave_session,
            attributes,
        };
        self.server.write_wire(&mut config);
        Ok(config)
    }

    pub fn to_create_request(&self) -> Result<CreateConfigurationTemplateRequest, CodecError> {
        Ok(CreateConfigurationTemplateRequest {
            name: self.identity.name.clone(),
            config: self.to_config()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::server::{AmsServer, FunctionFlags, AMS_SERVER, P2P_SERVER};
    use serde_json::json;
    use tfplug::types::Dynamic;

    fn plan_json() -> &'static [u8] {
        br#"{
            "namespace": "mygame",
            "name": "squad",
            "id": null,
            "min_players": 2,
            "max_players": 4,
            "joinability": "INVITE_ONLY",
            "max_active_sessions": -1,
            "custom_session_function": {
                "on_session_created": false,
                "on_session_updated": true,
                "on_session_deleted": false,
                "on_party_created": true,
                "on_party_updated": false,
                "on_party_deleted": false,
                "custom_url": "",
                "extend_app": "session-hooks"
            },
            "invite_timeout": 60,
            "inactive_timeout": 120,
            "leader_election_grace_period": 0,
            "p2p_server": null,
            "ams_server": {
                "requested_regions": ["eu-central-1", "us-west-2"],
                "preferred_claim_keys": ["squad"],
                "fallback_claim_keys": []
            },
            "custom_server": null,
            "auto_join_session": true,
            "chat_room": false,
            "secret_validation": false,
            "generate_code": true,
            "immutable_session_storage": false,
            "manual_set_ready_for_ds": true,
            "tied_teams_session_lifetime": false,
            "auto_leave_session": false,
            "custom_attributes": "{\"mode\": \"ranked\", \"tier\": 3}"
        }"#
    }

    fn echo(request: &CreateConfigurationTemplateRequest) -> ConfigurationTemplate {
        serde_json::from_value(serde_json::to_value(request).unwrap()).unwrap()
    }

    #[test]
    fn decoding_the_request_restores_the_model() {
        let plan = DynamicValue::decode_json(plan_json()).unwrap();
        let model = SessionTemplateModel::from_plan(&plan).unwrap();

        let response = echo(&model.to_create_request().unwrap());
        let restored = SessionTemplateModel::from_api(model.identity.clone(), &plan, &response)
            .unwrap();

        assert_eq!(restored, model);
        assert_eq!(
            restored.server,
            ServerProvider::Ams(AmsServer {
                requested_regions: vec!["eu-central-1".to_string(), "us-west-2".to_string()],
                preferred_claim_keys: vec!["squad".to_string()],
                fallback_claim_keys: vec![],
            })
        );
    }

    #[test]
    fn wire_names_follow_the_session_service() {
        let plan = DynamicValue::decode_json(plan_json()).unwrap();
        let request = SessionTemplateModel::from_plan(&plan)
            .unwrap()
            .to_create_request()
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["name"], "squad");
        assert_eq!(json["type"], "DS");
        assert_eq!(json["dsSource"], "AMS");
        assert_eq!(json["disableCodeGeneration"], false);
        assert_eq!(json["fallbackClaimKeys"], json!([]));
        assert_eq!(
            json["grpcSessionConfig"],
            json!({"appName": "session-hooks", "customURL": "", "functionFlag": 10})
        );
        assert_eq!(json["attributes"], json!({"mode": "ranked", "tier": 3}));

        let update = serde_json::to_value(&request.config).unwrap();
        assert!(update.get("name").is_none());
    }

    #[test]
    fn state_keeps_one_server_variant() {
        let plan = DynamicValue::decode_json(plan_json()).unwrap();
        let model = SessionTemplateModel::from_plan(&plan).unwrap();
        let state = model.to_state().unwrap();

        assert!(state.is_null_at(&AttributePath::new(P2P_SERVER)));
        assert!(!state.is_null_at(&AttributePath::new(AMS_SERVER)));
        let party_created =
            AttributePath::new(CUSTOM_SESSION_FUNCTION).attribute("on_party_created");
        assert!(state.get_bool(&party_created).unwrap());
    }

    #[test]
    fn blank_function_is_kept_only_when_declared() {
        let mut plan = DynamicValue::decode_json(plan_json()).unwrap();
        let model = SessionTemplateModel::from_plan(&plan).unwrap();
        let mut response = echo(&model.to_create_request().unwrap());
        response.grpc_session_config = Some(Default::default());

        let kept =
            SessionTemplateModel::from_api(model.identity.clone(), &plan, &response).unwrap();
        assert_eq!(
            kept.custom_session_function,
            Some(CustomSessionFunction::default())
        );

        plan.set_null(&AttributePath::new(CUSTOM_SESSION_FUNCTION))
            .unwrap();
        let dropped =
            SessionTemplateModel::from_api(model.identity.clone(), &plan, &response).unwrap();
        assert_eq!(dropped.custom_session_function, None);
    }

    #[test]
    fn custom_attributes_follow_the_prior_declaration() {
        let mut plan = DynamicValue::decode_json(plan_json()).unwrap();
        plan.set_null(&AttributePath::new(CUSTOM_ATTRIBUTES))
            .unwrap();
        let model = SessionTemplateModel::from_plan(&plan).unwrap();
        assert!(model.to_config().unwrap().attributes.is_none());

        let mut response = echo(&model.to_create_request().unwrap());
        response.attributes = json!({});
        let restored =
            SessionTemplateModel::from_api(model.identity.clone(), &plan, &response).unwrap();
        assert_eq!(restored.custom_attributes, None);

        plan.set_string(&AttributePath::new(CUSTOM_ATTRIBUTES), "{}")
            .unwrap();
        let declared =
            SessionTemplateModel::from_api(model.identity.clone(), &plan, &response).unwrap();
        assert_eq!(declared.custom_attributes.as_deref(), Some("{}"));

        response.attributes = json!({"z": 1, "a": [true]});
        let drifted =
            SessionTemplateModel::from_api(model.identity.clone(), &plan, &response).unwrap();
        assert_eq!(
            drifted.custom_attributes.as_deref(),
            Some(r#"{"a":[true],"z":1}"#)
        );
    }

    #[test]
    fn declared_null_attributes_read_back_as_null() {
        let mut plan = DynamicValue::decode_json(plan_json()).unwrap();
        plan.set_string(&AttributePath::new(CUSTOM_ATTRIBUTES), "null")
            .unwrap();
        let model = SessionTemplateModel::from_plan(&plan).unwrap();

        let request = model.to_create_request().unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap()["attributes"],
            Value::Null
        );

        let response = echo(&request);
        let restored =
            SessionTemplateModel::from_api(model.identity.clone(), &plan, &response).unwrap();
        assert_eq!(restored.custom_attributes.as_deref(), Some("null"));

        let imported = SessionTemplateModel::from_api(
            model.identity.clone(),
            &DynamicValue::object(),
            &response,
        )
        .unwrap();
        assert_eq!(imported.custom_attributes, None);
    }

    #[test]
    fn invalid_custom_attributes_block_encoding() {
        let mut plan = DynamicValue::decode_json(plan_json()).unwrap();
        plan.set_string(&AttributePath::new(CUSTOM_ATTRIBUTES), "{mode: ranked}")
            .unwrap();

        let err = SessionTemplateModel::from_plan(&plan)
            .unwrap()
            .to_config()
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("custom_attributes is not valid JSON"));
    }

    #[test]
    fn p2p_template_from_the_service() {
        let response: ConfigurationTemplate = serde_json::from_str(
            r#"{
                "name": "casual",
                "minPlayers": 1,
                "maxPlayers": 8,
                "joinability": "OPEN",
                "maxActiveSessions": -1,
                "inviteTimeout": 60,
                "inactiveTimeout": 60,
                "type": "P2P",
                "requestedRegions": null,
                "textChat": true,
                "disableCodeGeneration": true
            }"#,
        )
        .unwrap();
        let identity = Identity {
            namespace: "mygame".to_string(),
            name: "casual".to_string(),
        };

        let model =
            SessionTemplateModel::from_api(identity, &DynamicValue::object(), &response).unwrap();
        let state = model.to_state().unwrap();

        assert_eq!(model.server, ServerProvider::P2P);
        assert!(model.chat_room);
        assert!(!model.generate_code);
        assert_eq!(model.custom_session_function, None);
        assert_eq!(
            state.get(&AttributePath::new(P2P_SERVER)),
            Dynamic::Map(Default::default())
        );
        assert_eq!(
            state.get(&AttributePath::new(CUSTOM_ATTRIBUTES)),
            Dynamic::Null
        );
    }

    #[test]
    fn missing_player_counts_are_an_error() {
        let response: ConfigurationTemplate =
            serde_json::from_str(r#"{"name":"broken","joinability":"OPEN"}"#).unwrap();
        let identity = Identity {
            namespace: "mygame".to_string(),
            name: "broken".to_string(),
        };

        let err = SessionTemplateModel::from_api(identity, &DynamicValue::object(), &response)
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::MissingField {
                field: "minPlayers"
            }
        );
    }

    #[test]
    fn party_created_flag_encodes_as_eight() {
        let mut plan = DynamicValue::decode_json(plan_json()).unwrap();
        let path = AttributePath::new(CUSTOM_SESSION_FUNCTION);
        plan.set_bool(&path.clone().attribute("on_session_updated"), false)
            .unwrap();

        let config = SessionTemplateModel::from_plan(&plan)
            .unwrap()
            .to_config()
            .unwrap();
        let wire = config.grpc_session_config.unwrap();
        assert_eq!(wire.function_flag, 8);
        assert_eq!(
            FunctionFlags::from_bits(wire.function_flag),
            FunctionFlags {
                on_party_created: true,
                ..FunctionFlags::default()
            }
        );
    }
}
