//! Request-scoped context passed to every provider call
//!
//! A [`Context`] carries the labels (resource type, operation) the host
//! attaches so that provider logs can be correlated with the request that
//! produced them.

use std::sync::Arc;

/// Pass this as the first parameter to every async trait method
#[derive(Clone, Default)]
pub struct Context {
    inner: Arc<ContextInner>,
}

#[derive(Default)]
struct ContextInner {
    type_name: Option<String>,
    operation: Option<&'static str>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels the context with the resource type and the protocol step being served
    pub fn for_operation(&self, type_name: &str, operation: &'static str) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                type_name: Some(type_name.to_string()),
                operation: Some(operation),
            }),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.inner.type_name.as_deref()
    }

    pub fn operation(&self) -> Option<&'static str> {
        self.inner.operation
    }

    /// Span carrying the context labels; enter it around provider calls
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "tfplug",
            type_name = self.type_name().unwrap_or(""),
            operation = self.operation().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_has_no_labels() {
        let ctx = Context::new();

        assert_eq!(ctx.type_name(), None);
        assert_eq!(ctx.operation(), None);
    }

    #[test]
    fn operation_labels_are_attached() {
        let ctx = Context::new().for_operation("accelbyte_match_pool", "create");

        assert_eq!(ctx.type_name(), Some("accelbyte_match_pool"));
        assert_eq!(ctx.operation(), Some("create"));
    }

    #[test]
    fn relabelling_replaces_previous_labels() {
        let ctx = Context::new()
            .for_operation("accelbyte_match_pool", "create")
            .for_operation("accelbyte_match_ruleset", "read");

        assert_eq!(ctx.type_name(), Some("accelbyte_match_ruleset"));
        assert_eq!(ctx.operation(), Some("read"));
    }
}
