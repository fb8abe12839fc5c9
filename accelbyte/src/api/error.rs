use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl ApiError {
    /// The remote object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_404_counts_as_not_found() {
        let missing = ApiError::Api {
            status: 404,
            message: r#"{"errorCode":510110,"errorMessage":"match pool not found"}"#.to_string(),
        };
        let conflict = ApiError::Api {
            status: 409,
            message: "conflict".to_string(),
        };

        assert!(missing.is_not_found());
        assert!(!conflict.is_not_found());
        assert!(!ApiError::Parse("bad".to_string()).is_not_found());
    }

    #[test]
    fn api_error_text_carries_status() {
        let err = ApiError::Api {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "error 404: not found");
    }
}
