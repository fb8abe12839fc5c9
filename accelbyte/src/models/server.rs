//! Server provider variants and custom session function flags
//!
//! A session template names at most one way of sourcing game servers. The
//! declared shape has one optional object per variant; the wire shape has a
//! `type`/`dsSource` discriminator pair plus loose fields.

use tfplug::types::{AttributePath, DynamicValue};

use super::{nested_bool, nested_list, nested_string, CodecError};
use crate::api::session_templates::{
    ConfigurationTemplate, ConfigurationTemplateConfig, GrpcSessionConfig,
};
use crate::api::ListField;

pub const P2P_SERVER: &str = "p2p_server";
pub const AMS_SERVER: &str = "ams_server";
pub const CUSTOM_SERVER: &str = "custom_server";
pub const SERVER_VARIANTS: [&str; 3] = [P2P_SERVER, AMS_SERVER, CUSTOM_SERVER];

/// Coarse discriminator, the wire `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerType {
    None,
    P2P,
    Ds,
}

impl ServerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::None => "NONE",
            ServerType::P2P => "P2P",
            ServerType::Ds => "DS",
        }
    }

    /// Unrecognised tags read as `None`
    pub fn parse(value: &str) -> Self {
        match value {
            "P2P" => ServerType::P2P,
            "DS" => ServerType::Ds,
            _ => ServerType::None,
        }
    }
}

/// Fine discriminator for dedicated servers, the wire `dsSource` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsSource {
    None,
    Ams,
    Custom,
}

impl DsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DsSource::None => "",
            DsSource::Ams => "AMS",
            DsSource::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "AMS" => DsSource::Ams,
            "custom" => DsSource::Custom,
            _ => DsSource::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmsServer {
    pub requested_regions: Vec<String>,
    pub preferred_claim_keys: Vec<String>,
    pub fallback_claim_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomServer {
    pub custom_url: String,
    pub extend_app: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServerProvider {
    #[default]
    None,
    P2P,
    Ams(AmsServer),
    Custom(CustomServer),
}

impl ServerProvider {
    /// Reads whichever variant object is set and known
    pub fn from_state(state: &DynamicValue) -> Result<Self, CodecError> {
        let mut found = Vec::new();
        for variant in SERVER_VARIANTS {
            if let Some(object) = state.get_object(&AttributePath::new(variant))? {
                found.push((variant, object));
            }
        }

        let (variant, object) = match found.len() {
            0 => return Ok(ServerProvider::None),
            1 => found.remove(0),
            _ => {
                let names: Vec<&str> = found.iter().map(|(name, _)| *name).collect();
                return Err(CodecError::InvalidState(format!(
                    "only one of {} may be set, found {}",
                    SERVER_VARIANTS.join(", "),
                    names.join(" and ")
                )));
            }
        };

        Ok(match variant {
            P2P_SERVER => ServerProvider::P2P,
            AMS_SERVER => ServerProvider::Ams(AmsServer {
                requested_regions: nested_list(&object, "requested_regions")?,
                preferred_claim_keys: nested_list(&object, "preferred_claim_keys")?,
                fallback_claim_keys: nested_list(&object, "fallback_claim_keys")?,
            }),
            _ => ServerProvider::Custom(CustomServer {
                custom_url: nested_string(&object, "custom_url")?,
                extend_app: nested_string(&object, "extend_app")?,
            }),
        })
    }

    /// Sets the active variant object and nulls the other two
    pub fn write_state(&self, state: &mut DynamicValue) -> Result<(), CodecError> {
        for variant in SERVER_VARIANTS {
            state.set_null(&AttributePath::new(variant))?;
        }

        match self {
            ServerProvider::None => {}
            ServerProvider::P2P => {
                state.set_object(&AttributePath::new(P2P_SERVER), DynamicValue::object())?;
            }
            ServerProvider::Ams(ams) => {
                let mut object = DynamicValue::object();
                object.set_string_list(
                    &AttributePath::new("requested_regions"),
                    &ams.requested_regions,
                )?;
                object.set_string_list(
                    &AttributePath::new("preferred_claim_keys"),
                    &ams.preferred_claim_keys,
                )?;
                object.set_string_list(
                    &AttributePath::new("fallback_claim_keys"),
                    &ams.fallback_claim_keys,
                )?;
                state.set_object(&AttributePath::new(AMS_SERVER), object)?;
            }
            ServerProvider::Custom(custom) => {
                let mut object = DynamicValue::object();
                object.set_string(
                    &AttributePath::new("custom_url"),
                    custom.custom_url.as_str(),
                )?;
                object.set_string(
                    &AttributePath::new("extend_app"),
                    custom.extend_app.as_str(),
                )?;
                state.set_object(&AttributePath::new(CUSTOM_SERVER), object)?;
            }
        }
        Ok(())
    }

    pub fn discriminator(&self) -> (ServerType, DsSource) {
        match self {
            ServerProvider::None => (ServerType::None, DsSource::None),
            ServerProvider::P2P => (ServerType::P2P, DsSource::None),
            ServerProvider::Ams(_) => (ServerType::Ds, DsSource::Ams),
            ServerProvider::Custom(_) => (ServerType::Ds, DsSource::Custom),
        }
    }

    pub fn from_wire(api: &ConfigurationTemplate) -> Self {
        let server_type = api
            .server_type
            .as_deref()
            .map_or(ServerType::None, ServerType::parse);

        match (server_type, DsSource::parse(&api.ds_source)) {
            (ServerType::P2P, _) => ServerProvider::P2P,
            (ServerType::Ds, DsSource::Ams) => ServerProvider::Ams(AmsServer {
                requested_regions: api.requested_regions.items().to_vec(),
                preferred_claim_keys: api.preferred_claim_keys.items().to_vec(),
                fallback_claim_keys: api.fallback_claim_keys.items().to_vec(),
            }),
            (ServerType::Ds, DsSource::Custom) => ServerProvider::Custom(CustomServer {
                custom_url: api.custom_url_grpc.clone(),
                extend_app: api.app_name.clone(),
            }),
            _ => ServerProvider::None,
        }
    }

    /// Fills the discriminator pair and variant fields; the rest stay zero
    pub fn write_wire(&self, config: &mut ConfigurationTemplateConfig) {
        let (server_type, ds_source) = self.discriminator();
        config.server_type = server_type.as_str().to_string();
        config.ds_source = ds_source.as_str().to_string();
        config.requested_regions = ListField::Empty;
        config.preferred_claim_keys = ListField::Empty;
        config.fallback_claim_keys = ListField::Empty;
        config.custom_url_grpc = String::new();
        config.app_name = String::new();

        match self {
            ServerProvider::None | ServerProvider::P2P => {}
            ServerProvider::Ams(ams) => {
                config.requested_regions = ListField::from_items(ams.requested_regions.clone());
                config.preferred_claim_keys =
                    ListField::from_items(ams.preferred_claim_keys.clone());
                config.fallback_claim_keys = ListField::from_items(ams.fallback_claim_keys.clone());
            }
            ServerProvider::Custom(custom) => {
                config.custom_url_grpc = custom.custom_url.clone();
                config.app_name = custom.extend_app.clone();
            }
        }
    }
}

/// Session and party events that trigger the custom session function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionFlags {
    pub on_session_created: bool,
    pub on_session_updated: bool,
    pub on_session_deleted: bool,
    pub on_party_created: bool,
    pub on_party_updated: bool,
    pub on_party_deleted: bool,
}

impl FunctionFlags {
    /// Attribute names, indexed by bit position
    pub const ATTRIBUTES: [&'static str; 6] = [
        "on_session_created",
        "on_session_updated",
        "on_session_deleted",
        "on_party_created",
        "on_party_updated",
        "on_party_deleted",
    ];

    fn to_array(self) -> [bool; 6] {
        [
            self.on_session_created,
            self.on_session_updated,
            self.on_session_deleted,
            self.on_party_created,
            self.on_party_updated,
            self.on_party_deleted,
        ]
    }

    fn from_array(flags: [bool; 6]) -> Self {
        let [
            on_session_created,
            on_session_updated,
            on_session_deleted,
            on_party_created,
            on_party_updated,
            on_party_deleted,
        ] = flags;
        Self {
            on_session_created,
            on_session_updated,
            on_session_deleted,
            on_party_created,
            on_party_updated,
            on_party_deleted,
        }
    }

    pub fn bits(self) -> i64 {
        self.to_array()
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(0, |bits, (bit, _)| bits | (1 << bit))
    }

    /// Bits above the six known events are ignored
    pub fn from_bits(bits: i64) -> Self {
        Self::from_array(std::array::from_fn(|bit| bits & (1 << bit) != 0))
    }

    pub fn any(self) -> bool {
        self.bits() != 0
    }

    pub fn from_object(object: &DynamicValue) -> Result<Self, CodecError> {
        let mut flags = [false; 6];
        for (flag, attribute) in flags.iter_mut().zip(Self::ATTRIBUTES) {
            *flag = nested_bool(object, attribute)?;
        }
        Ok(Self::from_array(flags))
    }

    fn write_object(self, object: &mut DynamicValue) -> Result<(), CodecError> {
        for (flag, attribute) in self.to_array().into_iter().zip(Self::ATTRIBUTES) {
            object.set_bool(&AttributePath::new(attribute), flag)?;
        }
        Ok(())
    }
}

pub const CUSTOM_SESSION_FUNCTION: &str = "custom_session_function";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomSessionFunction {
    pub flags: FunctionFlags,
    pub custom_url: String,
    pub extend_app: String,
}

impl CustomSessionFunction {
    pub fn from_object(object: &DynamicValue) -> Result<Self, CodecError> {
        Ok(Self {
            flags: FunctionFlags::from_object(object)?,
            custom_url: nested_string(object, "custom_url")?,
            extend_app: nested_string(object, "extend_app")?,
        })
    }

    pub fn to_object(&self) -> Result<DynamicValue, CodecError> {
        let mut object = DynamicValue::object();
        self.flags.write_object(&mut object)?;
        object.set_string(&AttributePath::new("custom_url"), self.custom_url.as_str())?;
        object.set_string(&AttributePath::new("extend_app"), self.extend_app.as_str())?;
        Ok(object)
    }

    pub fn to_wire(&self) -> GrpcSessionConfig {
        GrpcSessionConfig {
            app_name: self.extend_app.clone(),
            custom_url: self.custom_url.clone(),
            function_flag: self.flags.bits(),
        }
    }

    /// An all-zero config means the function is not set up
    pub fn from_wire(wire: &GrpcSessionConfig) -> Option<Self> {
        if wire == &GrpcSessionConfig::default() {
            return None;
        }
        Some(Self {
            flags: FunctionFlags::from_bits(wire.function_flag),
            custom_url: wire.custom_url.clone(),
            extend_app: wire.app_name.clone(),
        })
    }
}
