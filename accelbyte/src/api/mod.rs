//! AccelByte admin API client
//!
//! One authenticated [`Client`] serves the match2 and session services;
//! per-service accessors (`match_pools()`, `rule_sets()`,
//! `session_templates()`) expose the endpoints the provider manages.

pub mod auth;
pub mod client;
pub mod common;
pub mod error;
pub mod match_pools;
pub mod rule_sets;
pub mod session_templates;

pub use auth::Credentials;
pub use client::Client;
pub use common::ListField;
pub use error::ApiError;
