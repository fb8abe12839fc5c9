//! Match rule set API (match2 service)

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::segment;
use super::error::ApiError;

/// Response from GET/PUT /match2/v1/namespaces/{namespace}/rulesets/{ruleset}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: Option<String>,
    pub enable_custom_match_function: Option<bool>,
    /// Free-form rule configuration validated by the service
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Request body for updating rule sets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSetConfig {
    pub enable_custom_match_function: bool,
    pub data: serde_json::Value,
}

/// Request body for creating rule sets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRuleSetRequest {
    pub name: String,
    #[serde(flatten)]
    pub config: RuleSetConfig,
}

fn rule_sets_path(namespace: &str) -> String {
    format!("/match2/v1/namespaces/{}/rulesets", segment(namespace))
}

fn rule_set_path(namespace: &str, rule_set: &str) -> String {
    format!("{}/{}", rule_sets_path(namespace), segment(rule_set))
}

/// Rule sets API
pub struct RuleSetsApi<'a> {
    client: &'a Client,
}

impl<'a> RuleSetsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /match2/v1/namespaces/{namespace}/rulesets
    pub async fn create(
        &self,
        namespace: &str,
        request: &CreateRuleSetRequest,
    ) -> Result<(), ApiError> {
        self.client
            .post::<(), _>(&rule_sets_path(namespace), request)
            .await
    }

    /// GET /match2/v1/namespaces/{namespace}/rulesets/{ruleset}
    pub async fn get(&self, namespace: &str, rule_set: &str) -> Result<RuleSet, ApiError> {
        self.client.get(&rule_set_path(namespace, rule_set)).await
    }

    /// PUT /match2/v1/namespaces/{namespace}/rulesets/{ruleset}
    pub async fn update(
        &self,
        namespace: &str,
        rule_set: &str,
        config: &RuleSetConfig,
    ) -> Result<RuleSet, ApiError> {
        self.client
            .put(&rule_set_path(namespace, rule_set), config)
            .await
    }

    /// DELETE /match2/v1/namespaces/{namespace}/rulesets/{ruleset}
    pub async fn delete(&self, namespace: &str, rule_set: &str) -> Result<(), ApiError> {
        self.client
            .delete::<()>(&rule_set_path(namespace, rule_set))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn create_posts_name_and_data() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/match2/v1/namespaces/mygame/rulesets")
            .match_body(Matcher::Json(json!({
                "name": "duel",
                "enable_custom_match_function": false,
                "data": {"alliance": {"min_number": 2, "max_number": 2}},
            })))
            .with_status(201)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token").unwrap();
        let request = CreateRuleSetRequest {
            name: "duel".to_string(),
            config: RuleSetConfig {
                enable_custom_match_function: false,
                data: json!({"alliance": {"min_number": 2, "max_number": 2}}),
            },
        };

        client
            .rule_sets()
            .create("mygame", &request)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delete_of_missing_rule_set_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/match2/v1/namespaces/mygame/rulesets/gone")
            .with_status(404)
            .with_body(r#"{"errorCode":510110,"errorMessage":"rule set not found"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token").unwrap();
        let err = client
            .rule_sets()
            .delete("mygame", "gone")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn response_without_data_reads_as_null() {
        let rule_set: RuleSet =
            serde_json::from_str(r#"{"name":"duel","enable_custom_match_function":true}"#)
                .unwrap();

        assert_eq!(rule_set.data, serde_json::Value::Null);
        assert_eq!(rule_set.enable_custom_match_function, Some(true));
    }
}
