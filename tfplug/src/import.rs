//! Import helper for resources addressed by a `<parent>/<name>` identifier

use crate::context::Context;
use crate::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

/// Splits a `<parent>/<name>` import ID into two attributes and keeps the
/// full ID in `id`
///
/// Example: ID "mygame/ranked" -> namespace = "mygame", name = "ranked", id = "mygame/ranked"
pub fn import_state_composite_id(
    _ctx: &Context,
    parent_attr: &str,
    name_attr: &str,
    request: &ImportResourceStateRequest,
    response: &mut ImportResourceStateResponse,
) {
    let parts: Vec<&str> = request.id.split('/').collect();
    let (parent, name) = match parts.as_slice() {
        [parent, name] if !parent.is_empty() && !name.is_empty() => (*parent, *name),
        _ => {
            response.diagnostics.push(Diagnostic::error(
                "Invalid import ID",
                format!(
                    "Expected import identifier with format: {}/{}. Got: {:?}",
                    parent_attr, name_attr, request.id
                ),
            ));
            return;
        }
    };

    let mut state = DynamicValue::object();
    for (attr, value) in [
        (parent_attr, parent),
        (name_attr, name),
        ("id", request.id.as_str()),
    ] {
        if let Err(e) = state.set_string(&AttributePath::new(attr), value) {
            response.diagnostics.push(Diagnostic::error(
                "Failed to build imported state",
                e.to_string(),
            ));
            return;
        }
    }

    response.imported_resources.push(ImportedResource {
        type_name: request.type_name.clone(),
        state,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClientCapabilities;

    fn request(id: &str) -> ImportResourceStateRequest {
        ImportResourceStateRequest {
            type_name: "accelbyte_match_pool".to_string(),
            id: id.to_string(),
            client_capabilities: ClientCapabilities::default(),
        }
    }

    fn empty_response() -> ImportResourceStateResponse {
        ImportResourceStateResponse {
            imported_resources: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn composite_id_splits_namespace_and_name() {
        let mut response = empty_response();
        import_state_composite_id(
            &Context::new(),
            "namespace",
            "name",
            &request("mygame/ranked"),
            &mut response,
        );

        assert!(response.diagnostics.is_empty());
        let state = &response.imported_resources[0].state;
        assert_eq!(
            state.get_string(&AttributePath::new("namespace")).unwrap(),
            "mygame"
        );
        assert_eq!(
            state.get_string(&AttributePath::new("name")).unwrap(),
            "ranked"
        );
        assert_eq!(
            state.get_string(&AttributePath::new("id")).unwrap(),
            "mygame/ranked"
        );
    }

    #[test]
    fn composite_id_rejects_malformed_ids() {
        for id in ["ranked", "mygame/", "/ranked", "a/b/c"] {
            let mut response = empty_response();
            import_state_composite_id(
                &Context::new(),
                "namespace",
                "name",
                &request(id),
                &mut response,
            );

            assert!(
                response.imported_resources.is_empty(),
                "{} was accepted",
                id
            );
            assert!(response.diagnostics[0].detail.contains("namespace/name"));
        }
    }
}
