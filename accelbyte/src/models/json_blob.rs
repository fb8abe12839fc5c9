//! Free-form JSON attributes stored as text
//!
//! Stored text is canonical (sorted keys, compact) unless the prior text
//! already describes the same value, in which case it is kept as written.

use serde_json::Value;

use super::CodecError;

pub fn parse(attribute: &'static str, text: &str) -> Result<Value, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::InvalidJson {
        attribute,
        reason: e.to_string(),
    })
}

/// Compact text with object keys in lexicographic order at every level
///
/// `serde_json::Map` is ordered by key, so plain serialization is enough.
pub fn canonical(value: &Value) -> String {
    value.to_string()
}

/// Text to store for `remote` given what was stored or declared before
pub fn reconcile(prior: Option<&str>, remote: &Value) -> String {
    match prior {
        Some(text) if serde_json::from_str::<Value>(text).is_ok_and(|parsed| &parsed == remote) => {
            text.to_string()
        }
        _ => canonical(remote),
    }
}
