//! Read-only lookups of existing objects
//!
//! Each data source takes `namespace` + `name` and reports every setting of
//! its resource counterpart as a computed attribute.

pub mod match_pool;
pub mod match_ruleset;
pub mod session_template;

pub use match_pool::MatchPoolDataSource;
pub use match_ruleset::MatchRuleSetDataSource;
pub use session_template::SessionTemplateDataSource;

use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::Diagnostic;

use crate::models::Identity;

/// Lookup keys plus the resource's settings, all computed
pub(crate) fn lookup_schema(kind: &str, settings: Vec<Attribute>) -> Schema {
    let description = format!("Reads an existing {} from AccelByte Gaming Services", kind);
    let mut builder = SchemaBuilder::new()
        .version(0)
        .description(&description)
        .attribute(
            AttributeBuilder::new("namespace", AttributeType::String)
                .description(&format!("Game namespace which the {} belongs to", kind))
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .description(&format!("Name of the {}", kind))
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .description("Identifier in the form namespace/name")
                .computed()
                .build(),
        );

    for attribute in settings {
        builder = builder.attribute(attribute.into_computed());
    }
    builder.build()
}

pub(crate) fn data_source_not_found(title: &str, identity: &Identity) -> Diagnostic {
    Diagnostic::error(
        "Data source not found",
        format!(
            "{} '{}' does not exist in namespace '{}'",
            title, identity.name, identity.namespace
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfplug::defaults::StaticDefault;

    #[test]
    fn settings_become_computed() {
        let schema = lookup_schema(
            "match pool",
            vec![AttributeBuilder::new("match_function", AttributeType::String)
                .default(StaticDefault::string("default"))
                .build()],
        );

        assert!(schema.attribute("namespace").unwrap().required);
        let setting = schema.attribute("match_function").unwrap();
        assert!(setting.computed && !setting.optional);
        assert!(!setting.has_default());
    }

    #[test]
    fn not_found_names_the_object() {
        let identity = Identity {
            namespace: "mygame".to_string(),
            name: "ranked".to_string(),
        };

        let diagnostic = data_source_not_found("Match pool", &identity);
        assert_eq!(diagnostic.summary, "Data source not found");
        assert_eq!(
            diagnostic.detail,
            "Match pool 'ranked' does not exist in namespace 'mygame'"
        );
    }
}
