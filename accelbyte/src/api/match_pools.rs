//! Match pool API (match2 service)

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{segment, ListField};
use super::error::ApiError;

/// Per-pool overrides of the match function's individual hooks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchFunctionOverride {
    #[serde(default)]
    pub backfill_matches: String,
    #[serde(default)]
    pub enrichment: ListField,
    #[serde(default)]
    pub make_matches: String,
    #[serde(default)]
    pub stat_codes: ListField,
    #[serde(default)]
    pub validation: ListField,
}

/// Response from GET/PUT /match2/v1/namespaces/{namespace}/match-pools/{pool}
///
/// Fields the service documents as always present are optional here so that
/// a missing one surfaces as a decoding error instead of a silent default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchPool {
    pub name: Option<String>,
    pub rule_set: Option<String>,
    pub session_template: Option<String>,
    pub ticket_expiration_seconds: Option<i64>,
    #[serde(default)]
    pub best_latency_calculation_method: String,
    pub auto_accept_backfill_proposal: Option<bool>,
    pub backfill_proposal_expiration_seconds: Option<i64>,
    pub backfill_ticket_expiration_seconds: Option<i64>,
    pub match_function: Option<String>,
    #[serde(default)]
    pub match_function_override: Option<MatchFunctionOverride>,
    #[serde(default)]
    pub crossplay_disabled: bool,
    #[serde(default)]
    pub platform_group_enabled: bool,
}

/// Request body for updating match pools; the pool name is immutable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPoolConfig {
    pub rule_set: String,
    pub session_template: String,
    pub ticket_expiration_seconds: i64,
    pub best_latency_calculation_method: String,
    pub auto_accept_backfill_proposal: bool,
    pub backfill_proposal_expiration_seconds: i64,
    pub backfill_ticket_expiration_seconds: i64,
    pub match_function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_function_override: Option<MatchFunctionOverride>,
    pub crossplay_disabled: bool,
    pub platform_group_enabled: bool,
}

/// Request body for creating match pools
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateMatchPoolRequest {
    pub name: String,
    #[serde(flatten)]
    pub config: MatchPoolConfig,
}

fn pools_path(namespace: &str) -> String {
    format!("/match2/v1/namespaces/{}/match-pools", segment(namespace))
}

fn pool_path(namespace: &str, pool: &str) -> String {
    format!("{}/{}", pools_path(namespace), segment(pool))
}

/// Match pools API
pub struct MatchPoolsApi<'a> {
    client: &'a Client,
}

impl<'a> MatchPoolsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /match2/v1/namespaces/{namespace}/match-pools
    ///
    /// The service answers 201 without a body.
    pub async fn create(
        &self,
        namespace: &str,
        request: &CreateMatchPoolRequest,
    ) -> Result<(), ApiError> {
        self.client
            .post::<(), _>(&pools_path(namespace), request)
            .await
    }

    /// GET /match2/v1/namespaces/{namespace}/match-pools/{pool}
    pub async fn get(&self, namespace: &str, pool: &str) -> Result<MatchPool, ApiError> {
        self.client.get(&pool_path(namespace, pool)).await
    }

    /// PUT /match2/v1/namespaces/{namespace}/match-pools/{pool}
    pub async fn update(
        &self,
        namespace: &str,
        pool: &str,
        config: &MatchPoolConfig,
    ) -> Result<MatchPool, ApiError> {
        self.client.put(&pool_path(namespace, pool), config).await
    }

    /// DELETE /match2/v1/namespaces/{namespace}/match-pools/{pool}
    pub async fn delete(&self, namespace: &str, pool: &str) -> Result<(), ApiError> {
        self.client
            .delete::<()>(&pool_path(namespace, pool))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn config() -> MatchPoolConfig {
        MatchPoolConfig {
            rule_set: "ranked-rules".to_string(),
            session_template: "ranked-session".to_string(),
            ticket_expiration_seconds: 300,
            best_latency_calculation_method: "P95".to_string(),
            auto_accept_backfill_proposal: false,
            backfill_proposal_expiration_seconds: 30,
            backfill_ticket_expiration_seconds: 300,
            match_function: "default".to_string(),
            match_function_override: None,
            crossplay_disabled: true,
            platform_group_enabled: false,
        }
    }

    #[test]
    fn create_request_flattens_config_and_omits_absent_override() {
        let request = CreateMatchPoolRequest {
            name: "ranked".to_string(),
            config: config(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["name"], "ranked");
        assert_eq!(json["rule_set"], "ranked-rules");
        assert_eq!(json["crossplay_disabled"], true);
        assert!(json.get("match_function_override").is_none());
    }

    #[test]
    fn override_lists_serialize_as_arrays() {
        let mut config = config();
        config.match_function_override = Some(MatchFunctionOverride {
            validation: ListField::Populated(vec!["validate-a".to_string()]),
            ..MatchFunctionOverride::default()
        });
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(
            json["match_function_override"],
            serde_json::json!({
                "backfill_matches": "",
                "enrichment": [],
                "make_matches": "",
                "stat_codes": [],
                "validation": ["validate-a"],
            })
        );
    }

    #[test]
    fn response_tolerates_null_override_lists() {
        let pool: MatchPool = serde_json::from_str(
            r#"{
                "name": "ranked",
                "rule_set": "ranked-rules",
                "session_template": "ranked-session",
                "ticket_expiration_seconds": 300,
                "match_function": "default",
                "match_function_override": {"make_matches": "mm", "enrichment": null}
            }"#,
        )
        .unwrap();

        let overrides = pool.match_function_override.unwrap();
        assert_eq!(overrides.make_matches, "mm");
        assert_eq!(overrides.enrichment, ListField::Unspecified);
        assert_eq!(overrides.stat_codes, ListField::Unspecified);
        assert_eq!(pool.auto_accept_backfill_proposal, None);
    }

    #[tokio::test]
    async fn paths_are_namespaced_and_encoded() {
        let mut server = Server::new_async().await;
        let get_mock = server
            .mock(
                "GET",
                "/match2/v1/namespaces/my%20game/match-pools/ranked%2Feu",
            )
            .with_body(r#"{"name":"ranked/eu"}"#)
            .create_async()
            .await;
        let put_mock = server
            .mock("PUT", "/match2/v1/namespaces/mygame/match-pools/ranked")
            .match_body(Matcher::PartialJson(
                serde_json::json!({"rule_set": "ranked-rules"}),
            ))
            .with_body(r#"{"name":"ranked","rule_set":"ranked-rules"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token").unwrap();
        let pool = client
            .match_pools()
            .get("my game", "ranked/eu")
            .await
            .unwrap();
        assert_eq!(pool.name.as_deref(), Some("ranked/eu"));

        let updated = client
            .match_pools()
            .update("mygame", "ranked", &config())
            .await
            .unwrap();
        assert_eq!(updated.rule_set.as_deref(), Some("ranked-rules"));

        get_mock.assert_async().await;
        put_mock.assert_async().await;
    }
}
