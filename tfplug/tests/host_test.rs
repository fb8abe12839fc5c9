//! Host protocol steps against an in-memory provider

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tfplug::context::Context;
use tfplug::data_source::DataSourceFactory;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::provider::*;
use tfplug::resource::*;
use tfplug::schema::{AttributeBuilder, AttributeType, NestedType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{ConflictsWith, OneOf};
use tfplug::{HostConfig, ProviderHost};
use tokio_test::assert_ok;

type Store = Arc<Mutex<HashMap<String, DynamicValue>>>;

struct WidgetProvider {
    store: Store,
}

#[async_trait]
impl Provider for WidgetProvider {
    fn type_name(&self) -> &str {
        "test"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "test".to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("endpoint", AttributeType::String)
                        .optional()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(self.store.clone())),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            "test_widget".to_string(),
            Box::new(|| {
                Box::new(WidgetResource { store: None }) as Box<dyn ManagedResource>
            }),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        HashMap::new()
    }
}

struct WidgetResource {
    store: Option<Store>,
}

impl WidgetResource {
    fn store(&self) -> &Store {
        self.store.as_ref().unwrap()
    }
}

#[async_trait]
impl Resource for WidgetResource {
    fn type_name(&self) -> &str {
        "test_widget"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: "test_widget".to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("size", AttributeType::Number)
                    .default(StaticDefault::int(3))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("color", AttributeType::String)
                    .optional()
                    .validator(OneOf::strings(&["red", "blue"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("revision", AttributeType::Number)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::nested(
                    "box",
                    NestedType::single(vec![
                        AttributeBuilder::new("labels", AttributeType::list_of_strings())
                            .default(StaticDefault::empty_list())
                            .build(),
                    ]),
                )
                .optional()
                .validator(ConflictsWith::root(&["bag"]))
                .build(),
            )
            .attribute(
                AttributeBuilder::nested("bag", NestedType::single(vec![]))
                    .optional()
                    .build(),
            )
            .build();
        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn create(
        &self,
        _ctx: Context,
        request: CreateResourceRequest,
    ) -> CreateResourceResponse {
        let mut state = request.planned_state;
        let name = state.get_string(&AttributePath::new("name")).unwrap();
        if name == "broken" {
            return CreateResourceResponse {
                new_state: state,
                diagnostics: vec![Diagnostic::error("Create failed", "remote rejected")],
            };
        }
        state
            .set_string(&AttributePath::new("id"), name.clone())
            .unwrap();
        state.set_i64(&AttributePath::new("revision"), 1).unwrap();
        self.store().lock().unwrap().insert(name, state.clone());
        CreateResourceResponse {
            new_state: state,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let id = request
            .current_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        ReadResourceResponse {
            new_state: self.store().lock().unwrap().get(&id).cloned(),
            diagnostics: vec![],
        }
    }

    async fn update(
        &self,
        _ctx: Context,
        request: UpdateResourceRequest,
    ) -> UpdateResourceResponse {
        let mut state = request.planned_state;
        let revision = request
            .prior_state
            .get_i64(&AttributePath::new("revision"))
            .unwrap();
        state
            .set_i64(&AttributePath::new("revision"), revision + 1)
            .unwrap();
        let id = state.get_string(&AttributePath::new("id")).unwrap();
        self.store().lock().unwrap().insert(id, state.clone());
        UpdateResourceResponse {
            new_state: state,
            diagnostics: vec![],
        }
    }

    async fn delete(
        &self,
        _ctx: Context,
        request: DeleteResourceRequest,
    ) -> DeleteResourceResponse {
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let removed = self.store().lock().unwrap().remove(&id);
        DeleteResourceResponse {
            diagnostics: match removed {
                Some(_) => vec![],
                None => vec![Diagnostic::error("Delete failed", "already gone")],
            },
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for WidgetResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let data: Option<Arc<dyn Any + Send + Sync>> = request.provider_data;
        self.store = data.and_then(|d| d.downcast_ref::<Store>().cloned());
        ConfigureResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithImportState for WidgetResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut state = DynamicValue::object();
        state
            .set_string(&AttributePath::new("id"), request.id.clone())
            .unwrap();
        ImportResourceStateResponse {
            imported_resources: vec![ImportedResource {
                type_name: request.type_name,
                state,
            }],
            diagnostics: vec![],
        }
    }
}

fn host() -> (ProviderHost<WidgetProvider>, Store) {
    let store: Store = Arc::new(Mutex::new(HashMap::new()));
    let host = ProviderHost::new(
        WidgetProvider {
            store: store.clone(),
        },
        HostConfig::new().without_logging(),
    );
    (host, store)
}

fn json(text: &str) -> DynamicValue {
    DynamicValue::decode_json(text.as_bytes()).unwrap()
}

#[tokio::test]
async fn validation_reports_schema_violations() {
    let (host, _) = host();

    let diagnostics = host
        .validate_resource_config(
            "test_widget",
            json(r#"{"color":"green","box":{},"bag":{},"extra":1,"revision":2}"#),
        )
        .await;

    let summaries: Vec<&str> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
    for expected in [
        "Unsupported argument",
        "Missing required argument",
        "Invalid Configuration for Read-Only Attribute",
        "Invalid Attribute Value Match",
        "Invalid Attribute Combination",
    ] {
        assert!(summaries.contains(&expected), "missing {}", expected);
    }
}

#[tokio::test]
async fn unknown_resource_type_is_reported() {
    let (host, _) = host();
    let diagnostics = host
        .validate_resource_config("test_gadget", json(r#"{"name":"a"}"#))
        .await;
    assert_eq!(diagnostics[0].summary, "Unknown resource type");
}

#[tokio::test]
async fn apply_requires_configuration() {
    let (host, _) = host();
    let result = host
        .apply_resource_change(
            "test_widget",
            DynamicValue::null(),
            json(r#"{"name":"a"}"#),
            json(r#"{"name":"a"}"#),
        )
        .await;
    assert_eq!(result.diagnostics[0].summary, "Provider not configured");
    assert!(result.new_state.is_null());
}

#[tokio::test]
async fn create_plan_applies_defaults_and_unknowns() {
    let (host, _) = host();
    let plan = host
        .plan_resource_change(
            "test_widget",
            DynamicValue::null(),
            json(r#"{"name":"a","box":{}}"#),
        )
        .await;

    assert!(plan.diagnostics.is_empty());
    let planned = plan.planned_state;
    assert_eq!(planned.get_i64(&AttributePath::new("size")).unwrap(), 3);
    assert!(planned.is_unknown_at(&AttributePath::new("id")));
    assert!(planned.is_unknown_at(&AttributePath::new("revision")));
    assert_eq!(
        planned.get(&AttributePath::new("box").attribute("labels")),
        Dynamic::List(vec![])
    );
    assert!(planned.is_null_at(&AttributePath::new("bag")));
}

#[tokio::test]
async fn full_lifecycle_through_host() {
    let (host, store) = host();
    assert!(host.configure("1.9.0", json("{}")).await.is_empty());

    let config = json(r#"{"name":"a","color":"red"}"#);
    let plan = host
        .plan_resource_change("test_widget", DynamicValue::null(), config.clone())
        .await;
    let created = host
        .apply_resource_change(
            "test_widget",
            DynamicValue::null(),
            plan.planned_state,
            config,
        )
        .await;
    assert!(created.diagnostics.is_empty());
    let state = created.new_state;
    assert_eq!(assert_ok!(state.get_string(&AttributePath::new("id"))), "a");

    // No change: plan equals state, computed values carried over
    let same = host
        .plan_resource_change(
            "test_widget",
            state.clone(),
            json(r#"{"name":"a","color":"red"}"#),
        )
        .await;
    assert_eq!(same.planned_state, state);

    // In-place change keeps the id and marks revision unknown
    let config = json(r#"{"name":"a","color":"blue"}"#);
    let changed = host
        .plan_resource_change("test_widget", state.clone(), config.clone())
        .await;
    assert!(changed.requires_replace.is_empty());
    assert_eq!(
        changed
            .planned_state
            .get_string(&AttributePath::new("id"))
            .unwrap(),
        "a"
    );
    assert!(changed
        .planned_state
        .is_unknown_at(&AttributePath::new("revision")));
    let updated = host
        .apply_resource_change("test_widget", state, changed.planned_state, config)
        .await;
    assert_eq!(
        updated
            .new_state
            .get_i64(&AttributePath::new("revision"))
            .unwrap(),
        2
    );

    // Out-of-band removal drops the object on refresh
    store.lock().unwrap().clear();
    let read = host.read_resource("test_widget", updated.new_state).await;
    assert!(read.diagnostics.is_empty());
    assert!(read.new_state.is_null());
}

#[tokio::test]
async fn identity_change_plans_replacement() {
    let (host, _) = host();
    let prior = json(
        r#"{"id":"a","name":"a","size":3,"color":null,"revision":1,"box":null,"bag":null}"#,
    );

    let plan = host
        .plan_resource_change("test_widget", prior, json(r#"{"name":"b"}"#))
        .await;

    assert_eq!(plan.requires_replace, vec![AttributePath::new("name")]);
    assert!(plan.planned_state.is_unknown_at(&AttributePath::new("id")));
}

#[tokio::test]
async fn failed_create_persists_nothing_and_failed_delete_keeps_state() {
    let (host, _) = host();
    host.configure("1.9.0", json("{}")).await;

    let config = json(r#"{"name":"broken"}"#);
    let plan = host
        .plan_resource_change("test_widget", DynamicValue::null(), config.clone())
        .await;
    let created = host
        .apply_resource_change(
            "test_widget",
            DynamicValue::null(),
            plan.planned_state,
            config,
        )
        .await;
    assert!(created.new_state.is_null());
    assert_eq!(created.diagnostics[0].summary, "Create failed");

    let prior = json(r#"{"id":"ghost","name":"ghost"}"#);
    let deleted = host
        .apply_resource_change(
            "test_widget",
            prior.clone(),
            DynamicValue::null(),
            DynamicValue::null(),
        )
        .await;
    assert_eq!(deleted.new_state, prior);
    assert_eq!(deleted.diagnostics[0].summary, "Delete failed");
}

#[tokio::test]
async fn import_reads_back_or_fails_for_missing_objects() {
    let (host, store) = host();
    host.configure("1.9.0", json("{}")).await;
    store
        .lock()
        .unwrap()
        .insert("a".to_string(), json(r#"{"id":"a","name":"a"}"#));

    let imported = host.import_resource_state("test_widget", "a").await;
    assert!(imported.diagnostics.is_empty());
    assert_eq!(
        imported.imported[0]
            .state
            .get_string(&AttributePath::new("name"))
            .unwrap(),
        "a"
    );

    let missing = host.import_resource_state("test_widget", "zzz").await;
    assert!(missing.imported.is_empty());
    assert_eq!(
        missing.diagnostics[0].summary,
        "Cannot import non-existent remote object"
    );
}
