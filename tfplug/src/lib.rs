//! tfplug - Terraform Plugin Framework for Rust
//!
//! The building blocks of a Terraform provider: the dynamic value model,
//! schemas with validators, plan modifiers and defaults, the provider,
//! resource and data source traits, and an in-process host that runs the
//! plan/apply protocol steps against them.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod plan_modifier;
pub mod validator;

pub mod host;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use host::{HostConfig, LogLevel, ProviderHost};
pub use import::import_state_composite_id;
pub use provider::{Provider, ProviderMetadataRequest, ProviderMetadataResponse};
pub use resource::{
    ManagedResource, Resource, ResourceWithConfigure, ResourceWithImportState,
};
pub use schema::{AttributeBuilder, AttributeType, NestedType, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
