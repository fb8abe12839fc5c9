//! Schema types and builders for tfplug
//!
//! Schemas describe the attributes of a provider, resource or data source,
//! including which are required, which are computed, and the validators,
//! plan modifiers and defaults the host applies during validation and
//! planning.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;

/// Terraform type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    pub fn list_of_strings() -> Self {
        AttributeType::List(Box::new(AttributeType::String))
    }

    /// Whether `value` is acceptable for this type; null and unknown always are
    pub fn accepts(&self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
            (AttributeType::String, Dynamic::String(_)) => true,
            (AttributeType::Number, Dynamic::Number(_)) => true,
            (AttributeType::Bool, Dynamic::Bool(_)) => true,
            (AttributeType::List(element), Dynamic::List(items)) => {
                items.iter().all(|item| element.accepts(item))
            }
            (AttributeType::Map(element), Dynamic::Map(entries)) => {
                entries.values().all(|entry| element.accepts(entry))
            }
            (AttributeType::Object(fields), Dynamic::Map(entries)) => {
                entries.iter().all(|(name, entry)| {
                    fields
                        .get(name)
                        .is_some_and(|field_type| field_type.accepts(entry))
                })
            }
            _ => false,
        }
    }
}

/// Schema is returned by providers, resources and data sources
#[derive(Debug)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|attr| attr.name == name)
    }
}

#[derive(Debug)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub description: String,
}

/// A single attribute; objects nest further attributes through `nested_type`
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Box<dyn Validator>>,
    pub plan_modifiers: Vec<Box<dyn PlanModifier>>,
    pub default: Option<Box<dyn Default>>,
    pub nested_type: Option<NestedType>,
}

impl Attribute {
    /// Optional and computed with a default: the host fills it in when unset
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Strips configurability, leaving a read-only copy of the attribute and its children
    pub fn into_computed(self) -> Attribute {
        Attribute {
            name: self.name,
            r#type: self.r#type,
            description: self.description,
            required: false,
            optional: false,
            computed: true,
            sensitive: self.sensitive,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
            default: None,
            nested_type: self.nested_type.map(|nested| NestedType {
                attributes: nested
                    .attributes
                    .into_iter()
                    .map(Attribute::into_computed)
                    .collect(),
            }),
        }
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("validators", &self.validators.len())
            .field("plan_modifiers", &self.plan_modifiers.len())
            .field("default", &self.default.is_some())
            .field("nested_type", &self.nested_type)
            .finish()
    }
}

/// Attributes of a single nested object
#[derive(Debug)]
pub struct NestedType {
    pub attributes: Vec<Attribute>,
}

impl NestedType {
    pub fn single(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    fn object_type(&self) -> AttributeType {
        AttributeType::Object(
            self.attributes
                .iter()
                .map(|attr| (attr.name.clone(), attr.r#type.clone()))
                .collect(),
        )
    }
}

/// Checks a configured value before any plan is produced
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse;
}

pub struct ValidatorRequest<'a> {
    /// The whole configuration document, for cross-attribute checks
    pub config: &'a DynamicValue,
    pub config_value: Dynamic,
    pub path: AttributePath,
}

#[derive(Default)]
pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Adjusts the planned value of one attribute
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;
    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse;
}

pub struct PlanModifierRequest {
    pub config_value: Dynamic,
    pub state_value: Dynamic,
    pub plan_value: Dynamic,
    pub path: AttributePath,
    /// False while planning a create
    pub resource_exists: bool,
}

pub struct PlanModifierResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Supplies a value for an optional+computed attribute left unset in configuration
pub trait Default: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: Dynamic,
}

/// Fluent construction of attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                default: None,
                nested_type: None,
            },
        }
    }

    /// A single nested object attribute; the object type follows the nested attributes
    pub fn nested(name: &str, nested: NestedType) -> Self {
        let mut builder = Self::new(name, nested.object_type());
        builder.attribute.nested_type = Some(nested);
        builder
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(validator);
        self
    }

    pub fn plan_modifier(mut self, modifier: Box<dyn PlanModifier>) -> Self {
        self.attribute.plan_modifiers.push(modifier);
        self
    }

    /// Defaults only apply to optional+computed attributes
    pub fn default(mut self, default: Box<dyn Default>) -> Self {
        self.attribute.default = Some(default);
        self.attribute.optional = true;
        self.attribute.required = false;
        self.attribute.computed = true;
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// Fluent construction of schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    attributes: Vec::new(),
                    description: String::new(),
                    },
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("namespace", AttributeType::String)
            .description("Game namespace")
            .required()
            .build();

        assert_eq!(attr.name, "namespace");
        assert!(attr.required);
        assert!(!attr.optional);
        assert!(!attr.computed);
    }

    #[test]
    fn default_marks_attribute_optional_and_computed() {
        let attr = AttributeBuilder::new("ticket_expiration_seconds", AttributeType::Number)
            .default(StaticDefault::int(300))
            .build();

        assert!(attr.optional);
        assert!(attr.computed);
        assert!(attr.has_default());
    }

    #[test]
    fn nested_attribute_derives_object_type() {
        let attr = AttributeBuilder::nested(
            "custom_server",
            NestedType::single(vec![
                AttributeBuilder::new("custom_url", AttributeType::String)
                    .optional()
                    .build(),
                AttributeBuilder::new("extend_app", AttributeType::String)
                    .optional()
                    .build(),
            ]),
        )
        .optional()
        .build();

        match &attr.r#type {
            AttributeType::Object(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields.get("custom_url"), Some(&AttributeType::String));
            }
            other => panic!("expected object type, got {:?}", other),
        }
    }

    #[test]
    fn into_computed_strips_configurability_recursively() {
        let attr = AttributeBuilder::nested(
            "ams_server",
            NestedType::single(vec![AttributeBuilder::new(
                "requested_regions",
                AttributeType::list_of_strings(),
            )
            .default(StaticDefault::empty_list())
            .build()]),
        )
        .optional()
        .build()
        .into_computed();

        assert!(attr.computed && !attr.optional && !attr.required);
        let nested = attr.nested_type.as_ref().unwrap();
        assert!(nested.attributes[0].computed);
        assert!(!nested.attributes[0].has_default());
    }

    #[test]
    fn object_type_rejects_unknown_fields() {
        let ty = AttributeType::Object(HashMap::from([(
            "custom_url".to_string(),
            AttributeType::String,
        )]));

        let ok = Dynamic::Map(HashMap::from([(
            "custom_url".to_string(),
            Dynamic::String("https://hooks".to_string()),
        )]));
        let bad = Dynamic::Map(HashMap::from([(
            "extend_app".to_string(),
            Dynamic::String("app".to_string()),
        )]));

        assert!(ty.accepts(&ok));
        assert!(!ty.accepts(&bad));
        assert!(AttributeType::list_of_strings().accepts(&Dynamic::Unknown));
    }
}
