//! Core value model for tfplug
//!
//! Configuration, plans and state all travel as [`DynamicValue`]s. Providers
//! read and write them through typed, path-based accessors rather than by
//! matching on [`Dynamic`] directly.

use crate::error::{Result, TfplugError};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Marker used when an unknown value has to cross a serialization boundary
const UNKNOWN_SENTINEL: &str = "__tfplug_unknown__";

/// A Terraform value of any type
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    Null,
    Bool(bool),
    /// Terraform numbers are arbitrary precision; f64 covers every integer the providers use
    Number(f64),
    String(String),
    List(Vec<Dynamic>),
    /// Objects and maps share this representation
    Map(HashMap<String, Dynamic>),
    /// Not known until apply
    Unknown,
}

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    /// Neither null nor unknown
    pub fn is_present(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Dynamic::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "object",
            Dynamic::Unknown => "unknown",
        }
    }

    /// Structural equality with numeric tolerance
    pub fn semantically_equals(&self, other: &Dynamic) -> bool {
        match (self, other) {
            (Dynamic::Number(a), Dynamic::Number(b)) => (a - b).abs() < f64::EPSILON,
            (Dynamic::List(a), Dynamic::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.semantically_equals(y))
            }
            (Dynamic::Map(a), Dynamic::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.get(k)
                            .is_some_and(|other_value| v.semantically_equals(other_value))
                    })
            }
            _ => self == other,
        }
    }

    pub fn string_list<I, S>(items: I) -> Dynamic
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Dynamic::List(
            items
                .into_iter()
                .map(|item| Dynamic::String(item.into()))
                .collect(),
        )
    }
}

impl Serialize for Dynamic {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serializer.serialize_f64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(items) => items.serialize(serializer),
            Dynamic::Map(fields) => fields.serialize(serializer),
            Dynamic::Unknown => serializer.serialize_str(UNKNOWN_SENTINEL),
        }
    }
}

struct DynamicVisitor;

impl<'de> Visitor<'de> for DynamicVisitor {
    type Value = Dynamic;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a terraform value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Null)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<Dynamic, D::Error> {
        Dynamic::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Number(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Number(value as f64))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Dynamic, E> {
        Ok(Dynamic::Number(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Dynamic, E> {
        if value == UNKNOWN_SENTINEL {
            Ok(Dynamic::Unknown)
        } else {
            Ok(Dynamic::String(value.to_string()))
        }
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Dynamic, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Dynamic::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Dynamic, A::Error> {
        let mut fields = HashMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Dynamic>()? {
            fields.insert(key, value);
        }
        Ok(Dynamic::Map(fields))
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// A configuration, plan or state document
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self::new(Dynamic::Null)
    }

    pub fn unknown() -> Self {
        Self::new(Dynamic::Unknown)
    }

    /// An empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self::new(Dynamic::Map(HashMap::new()))
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    /// Persisted state uses msgpack; an empty buffer means "no object"
    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        if self.is_null() {
            return Ok(Vec::new());
        }
        rmp_serde::encode::to_vec_named(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("msgpack encoding failed: {}", e)))
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }
        rmp_serde::decode::from_slice::<Dynamic>(data)
            .map(Self::new)
            .map_err(|e| TfplugError::DecodingError(format!("msgpack decoding failed: {}", e)))
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("json encoding failed: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice::<Dynamic>(data)
            .map(Self::new)
            .map_err(|e| TfplugError::DecodingError(format!("json decoding failed: {}", e)))
    }

    /// The value at `path`, or None when any step along the way is missing
    pub fn value_at(&self, path: &AttributePath) -> Option<&Dynamic> {
        let mut current = &self.value;
        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(fields), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(fields), AttributePathStep::ElementKeyString(name)) => {
                    fields.get(name)?
                }
                (Dynamic::List(items), AttributePathStep::ElementKeyInt(idx)) => {
                    items.get(usize::try_from(*idx).ok()?)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Missing attributes read as null
    pub fn get(&self, path: &AttributePath) -> Dynamic {
        self.value_at(path).cloned().unwrap_or(Dynamic::Null)
    }

    pub fn is_null_at(&self, path: &AttributePath) -> bool {
        self.value_at(path).map_or(true, Dynamic::is_null)
    }

    pub fn is_unknown_at(&self, path: &AttributePath) -> bool {
        self.value_at(path).is_some_and(Dynamic::is_unknown)
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        let value = self.require(path)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(path, "string", value))
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        let value = self.require(path)?;
        value.as_bool().ok_or_else(|| mismatch(path, "bool", value))
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        match self.require(path)? {
            Dynamic::Number(n) => Ok(*n),
            other => Err(mismatch(path, "number", other)),
        }
    }

    pub fn get_i64(&self, path: &AttributePath) -> Result<i64> {
        let value = self.require(path)?;
        value
            .as_i64()
            .ok_or_else(|| mismatch(path, "whole number", value))
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        match self.require(path)? {
            Dynamic::List(items) => Ok(items.clone()),
            other => Err(mismatch(path, "list", other)),
        }
    }

    pub fn get_string_list(&self, path: &AttributePath) -> Result<Vec<String>> {
        self.get_list(path)?
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| mismatch(path, "list of strings", item))
            })
            .collect()
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        match self.require(path)? {
            Dynamic::Map(fields) => Ok(fields.clone()),
            other => Err(mismatch(path, "object", other)),
        }
    }

    /// Null, unknown and absent strings all read as None
    pub fn get_optional_string(&self, path: &AttributePath) -> Result<Option<String>> {
        match self.value_at(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(_) => self.get_string(path).map(Some),
        }
    }

    /// The nested object at `path` when it is set and known
    pub fn get_object(&self, path: &AttributePath) -> Result<Option<DynamicValue>> {
        match self.value_at(path) {
            None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
            Some(value @ Dynamic::Map(_)) => Ok(Some(DynamicValue::new(value.clone()))),
            Some(other) => Err(mismatch(path, "object", other)),
        }
    }

    pub fn set_string(&mut self, path: &AttributePath, value: impl Into<String>) -> Result<()> {
        self.set_value(path, Dynamic::String(value.into()))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set_value(path, Dynamic::Bool(value))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set_value(path, Dynamic::Number(value))
    }

    pub fn set_i64(&mut self, path: &AttributePath, value: i64) -> Result<()> {
        self.set_value(path, Dynamic::Number(value as f64))
    }

    pub fn set_list(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::List(value))
    }

    pub fn set_string_list(&mut self, path: &AttributePath, items: &[String]) -> Result<()> {
        self.set_value(path, Dynamic::string_list(items.iter().cloned()))
    }

    pub fn set_object(&mut self, path: &AttributePath, value: DynamicValue) -> Result<()> {
        self.set_value(path, value.value)
    }

    pub fn set_null(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Null)
    }

    pub fn mark_unknown(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Unknown)
    }

    /// Writes `value` at `path`, creating intermediate objects as needed
    pub fn set_value(&mut self, path: &AttributePath, value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = value;
            return Ok(());
        };

        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for step in parents {
            current = match (current, step) {
                (Dynamic::Map(fields), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(fields), AttributePathStep::ElementKeyString(name)) => {
                    let entry = fields
                        .entry(name.clone())
                        .or_insert_with(|| Dynamic::Map(HashMap::new()));
                    if !matches!(entry, Dynamic::Map(_) | Dynamic::List(_)) {
                        *entry = Dynamic::Map(HashMap::new());
                    }
                    entry
                }
                (Dynamic::List(items), AttributePathStep::ElementKeyInt(idx)) => {
                    let len = items.len();
                    usize::try_from(*idx)
                        .ok()
                        .and_then(|i| items.get_mut(i))
                        .ok_or_else(|| {
                            TfplugError::Custom(format!(
                                "list index {} out of bounds (len {})",
                                idx, len
                            ))
                        })?
                }
                _ => {
                    return Err(TfplugError::Custom(format!(
                        "cannot navigate to {}",
                        path
                    )))
                }
            };
        }

        match (current, last) {
            (Dynamic::Map(fields), AttributePathStep::AttributeName(name))
            | (Dynamic::Map(fields), AttributePathStep::ElementKeyString(name)) => {
                fields.insert(name.clone(), value);
                Ok(())
            }
            (Dynamic::List(items), AttributePathStep::ElementKeyInt(idx)) => {
                let slot = usize::try_from(*idx)
                    .ok()
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(|| {
                        TfplugError::Custom(format!("list index {} out of bounds", idx))
                    })?;
                *slot = value;
                Ok(())
            }
            _ => Err(TfplugError::Custom(format!("cannot set value at {}", path))),
        }
    }

    fn require(&self, path: &AttributePath) -> Result<&Dynamic> {
        self.value_at(path)
            .ok_or_else(|| TfplugError::AttributeNotFound(path.to_string()))
    }
}

fn mismatch(path: &AttributePath, expected: &str, actual: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// Path to an attribute inside a [`DynamicValue`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    /// The enclosing path; the root is its own parent
    pub fn parent(&self) -> Self {
        let mut steps = self.steps.clone();
        steps.pop();
        Self { steps }
    }

    /// A sibling attribute sharing this path's parent
    pub fn sibling(&self, name: &str) -> Self {
        self.parent().attribute(name)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[{:?}]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributePathStep {
    AttributeName(String),
    ElementKeyString(String),
    ElementKeyInt(i64),
}

/// A warning or error surfaced to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// True when any diagnostic in the slice is an error
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Capabilities advertised by the Terraform client
#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub deferral_allowed: bool,
    pub write_only_attributes_allowed: bool,
}

pub type Config = DynamicValue;

pub type State = DynamicValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_set_creates_intermediate_objects() {
        let mut dv = DynamicValue::object();
        let path = AttributePath::new("ams_server").attribute("requested_regions");
        dv.set_string_list(&path, &["eu-central-1".to_string()])
            .unwrap();

        assert_eq!(dv.get_string_list(&path).unwrap(), vec!["eu-central-1"]);
        assert!(dv
            .get_object(&AttributePath::new("ams_server"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn missing_and_null_attributes_read_as_null() {
        let mut dv = DynamicValue::object();
        let attributes = AttributePath::new("custom_attributes");
        dv.set_null(&attributes).unwrap();

        assert!(dv.is_null_at(&attributes));
        assert!(dv.is_null_at(&AttributePath::new("never_set")));
        assert_eq!(dv.get_optional_string(&attributes).unwrap(), None);
        assert!(dv
            .get_string(&AttributePath::new("never_set"))
            .unwrap_err()
            .is_missing());
    }

    #[test]
    fn get_i64_rejects_fractions_and_wrong_types() {
        let mut dv = DynamicValue::object();
        dv.set_number(&AttributePath::new("ratio"), 1.5).unwrap();
        dv.set_string(&AttributePath::new("name"), "pool").unwrap();
        dv.set_i64(&AttributePath::new("ttl"), 300).unwrap();

        assert_eq!(dv.get_i64(&AttributePath::new("ttl")).unwrap(), 300);
        assert!(matches!(
            dv.get_i64(&AttributePath::new("ratio")),
            Err(TfplugError::TypeMismatch { .. })
        ));
        assert!(matches!(
            dv.get_bool(&AttributePath::new("name")),
            Err(TfplugError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn msgpack_preserves_unknown_and_nested_values() {
        let mut dv = DynamicValue::object();
        let override_path = AttributePath::new("match_function_override");
        dv.set_string(&AttributePath::new("id"), "ns/pool").unwrap();
        dv.mark_unknown(&override_path).unwrap();
        dv.set_value(
            &AttributePath::new("p2p_server"),
            Dynamic::Map(HashMap::new()),
        )
        .unwrap();

        let bytes = dv.encode_msgpack().unwrap();
        let decoded = DynamicValue::decode_msgpack(&bytes).unwrap();

        assert_eq!(decoded, dv);
        assert!(decoded.is_unknown_at(&override_path));
    }

    #[test]
    fn null_document_encodes_to_empty_buffer() {
        assert!(DynamicValue::null().encode_msgpack().unwrap().is_empty());
        assert!(DynamicValue::decode_msgpack(&[]).unwrap().is_null());
    }

    #[test]
    fn decode_json_builds_documents() {
        let dv = DynamicValue::decode_json(br#"{"name":"pool","ttl":300,"tags":["a","b"]}"#)
            .unwrap();

        assert_eq!(dv.get_string(&AttributePath::new("name")).unwrap(), "pool");
        assert_eq!(dv.get_i64(&AttributePath::new("ttl")).unwrap(), 300);
        assert_eq!(
            dv.get_string_list(&AttributePath::new("tags")).unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn semantic_equality_ignores_key_order() {
        let a = DynamicValue::decode_json(br#"{"x":1,"y":[true,"s"]}"#).unwrap();
        let b = DynamicValue::decode_json(br#"{"y":[true,"s"],"x":1.0}"#).unwrap();
        assert!(a.value.semantically_equals(&b.value));
    }

    #[test]
    fn path_display_and_sibling() {
        let path = AttributePath::new("custom_server").attribute("custom_url");
        assert_eq!(path.to_string(), "custom_server.custom_url");
        assert_eq!(
            path.sibling("extend_app").to_string(),
            "custom_server.extend_app"
        );
    }
}
