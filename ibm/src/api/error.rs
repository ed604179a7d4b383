use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        trace: Option<String>,
    },

    #[error("no {kind} found with name {name}")]
    NotFound { kind: String, name: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// True for a 404 from the API; name lookups report `NotFound` instead
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_404_counts_as_not_found() {
        let gone = ApiError::Api {
            status: 404,
            code: "not_found".to_string(),
            message: "Subnet not found".to_string(),
            trace: None,
        };
        assert!(gone.is_not_found());

        let lookup = ApiError::NotFound {
            kind: "subnet".to_string(),
            name: "web".to_string(),
        };
        assert!(!lookup.is_not_found());
        assert_eq!(lookup.to_string(), "no subnet found with name web");
    }
}
