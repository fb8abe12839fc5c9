//! Built-in attribute validators
//!
//! Validators run against configuration before any plan is produced, so a
//! failing validator stops the operation before a provider makes any remote
//! call. Unknown values are never rejected; they are checked again once known.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{AttributePath, Diagnostic, Dynamic};

/// Rejects configurations that set this attribute together with any of the listed root attributes
pub struct ConflictsWith {
    others: Vec<String>,
}

impl ConflictsWith {
    pub fn root(others: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            others: others.iter().map(|name| name.to_string()).collect(),
        })
    }
}

impl Validator for ConflictsWith {
    fn description(&self) -> String {
        format!("cannot be set together with any of {:?}", self.others)
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if !request.config_value.is_present() {
            return response;
        }

        for other in &self.others {
            let other_path = AttributePath::new(other);
            if other_path == request.path {
                continue;
            }
            if request.config.get(&other_path).is_present() {
                response.diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Combination",
                        format!(
                            "Attribute \"{}\" cannot be specified when \"{}\" is specified",
                            other, request.path
                        ),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        response
    }
}

/// Requires exactly one of this attribute and the listed siblings to be set
pub struct ExactlyOneOf {
    siblings: Vec<String>,
}

impl ExactlyOneOf {
    pub fn siblings(siblings: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            siblings: siblings.iter().map(|name| name.to_string()).collect(),
        })
    }
}

impl Validator for ExactlyOneOf {
    fn description(&self) -> String {
        format!(
            "exactly one of this attribute and {:?} must be set",
            self.siblings
        )
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();

        let mut names = vec![request.path.to_string()];
        let mut values = vec![request.config_value.clone()];
        for sibling in &self.siblings {
            let path = request.path.sibling(sibling);
            names.push(path.to_string());
            values.push(request.config.get(&path));
        }

        if values.iter().any(Dynamic::is_unknown) {
            return response;
        }

        let set = values.iter().filter(|value| !value.is_null()).count();
        let detail = match set {
            1 => return response,
            0 => format!(
                "No attribute specified when one (and only one) of [{}] is required",
                names.join(", ")
            ),
            n => format!(
                "{} attributes specified when one (and only one) of [{}] is required",
                n,
                names.join(", ")
            ),
        };

        response.diagnostics.push(
            Diagnostic::error("Invalid Attribute Combination", detail)
                .with_attribute(request.path.clone()),
        );
        response
    }
}

/// Restricts a string attribute to an enumerated set
pub struct OneOf {
    allowed: Vec<String>,
}

impl OneOf {
    pub fn strings(allowed: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            allowed: allowed.iter().map(|value| value.to_string()).collect(),
        })
    }
}

impl Validator for OneOf {
    fn description(&self) -> String {
        format!("value must be one of {:?}", self.allowed)
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::String(value) = &request.config_value {
            if !self.allowed.iter().any(|allowed| allowed == value) {
                response.diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value Match",
                        format!(
                            "Attribute {} value must be one of: {:?}, got: {:?}",
                            request.path, self.allowed, value
                        ),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        response
    }
}

/// Lower bound for whole-number attributes
pub struct IntAtLeast {
    min: i64,
}

impl IntAtLeast {
    pub fn new(min: i64) -> Box<dyn Validator> {
        Box::new(Self { min })
    }
}

impl Validator for IntAtLeast {
    fn description(&self) -> String {
        format!("value must be at least {}", self.min)
    }

    fn validate(&self, request: ValidatorRequest<'_>) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::Number(n) = request.config_value {
            if n.fract() != 0.0 || (n as i64) < self.min {
                response.diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value",
                        format!(
                            "Attribute {} must be a whole number of at least {}, got: {}",
                            request.path, self.min, n
                        ),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DynamicValue;

    fn run(validator: &dyn Validator, config: &DynamicValue, path: AttributePath) -> usize {
        validator
            .validate(ValidatorRequest {
                config,
                config_value: config.get(&path),
                path,
            })
            .diagnostics
            .len()
    }

    #[test]
    fn conflicts_with_flags_second_server_variant() {
        let config = DynamicValue::decode_json(
            br#"{"p2p_server":{},"ams_server":{"requested_regions":[]}}"#,
        )
        .unwrap();
        let validator = ConflictsWith::root(&["ams_server", "custom_server"]);
        let path = AttributePath::new("p2p_server");

        assert_eq!(run(validator.as_ref(), &config, path), 1);
    }

    #[test]
    fn conflicts_with_ignores_unset_attribute() {
        let config = DynamicValue::decode_json(br#"{"ams_server":{}}"#).unwrap();
        let validator = ConflictsWith::root(&["ams_server", "custom_server"]);
        let path = AttributePath::new("p2p_server");

        assert_eq!(run(validator.as_ref(), &config, path), 0);
    }

    #[test]
    fn exactly_one_of_counts_siblings() {
        let validator = ExactlyOneOf::siblings(&["extend_app"]);
        let path = AttributePath::new("custom_server").attribute("custom_url");

        let one = DynamicValue::decode_json(br#"{"custom_server":{"custom_url":"grpc://x"}}"#)
            .unwrap();
        let both = DynamicValue::decode_json(
            br#"{"custom_server":{"custom_url":"grpc://x","extend_app":"app"}}"#,
        )
        .unwrap();
        let neither = DynamicValue::decode_json(br#"{"custom_server":{}}"#).unwrap();

        assert_eq!(run(validator.as_ref(), &one, path.clone()), 0);
        assert_eq!(run(validator.as_ref(), &both, path.clone()), 1);
        assert_eq!(run(validator.as_ref(), &neither, path), 1);
    }

    #[test]
    fn exactly_one_of_defers_on_unknown() {
        let mut config = DynamicValue::object();
        let path = AttributePath::new("custom_server").attribute("custom_url");
        config.mark_unknown(&path).unwrap();

        let validator = ExactlyOneOf::siblings(&["extend_app"]);
        assert_eq!(run(validator.as_ref(), &config, path), 0);
    }

    #[test]
    fn one_of_rejects_unlisted_values() {
        let validator = OneOf::strings(&["", "Average", "P95"]);
        let ok = DynamicValue::decode_json(br#"{"m":"P95"}"#).unwrap();
        let bad = DynamicValue::decode_json(br#"{"m":"P99"}"#).unwrap();

        assert_eq!(run(validator.as_ref(), &ok, AttributePath::new("m")), 0);
        assert_eq!(run(validator.as_ref(), &bad, AttributePath::new("m")), 1);
    }

    #[test]
    fn int_at_least_rejects_negative_durations() {
        let validator = IntAtLeast::new(0);
        let ok = DynamicValue::decode_json(br#"{"ttl":0}"#).unwrap();
        let bad = DynamicValue::decode_json(br#"{"ttl":-5}"#).unwrap();

        assert_eq!(run(validator.as_ref(), &ok, AttributePath::new("ttl")), 0);
        assert_eq!(run(validator.as_ref(), &bad, AttributePath::new("ttl")), 1);
    }
}
