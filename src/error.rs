//! Errors produced while loading a view tree.
//!
//! A single failed load can have several causes (network down *and* no
//! cache entry), so loads fail with [`FetchErrors`]: the ordered list of
//! [`BeagleError`]s, one per source attempted.

use serde::Serialize;
use thiserror::Error;

/// Status and body of a failed HTTP response, kept in a serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializableResponse {
    pub status: u16,
    pub body: String,
}

/// A single cause of a failed load.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "name")]
pub enum BeagleError {
    /// Transport failure, non-2xx status or unparsable payload.
    #[serde(rename = "BeagleNetworkError")]
    #[error("Network error while trying to access {url}")]
    Network {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<SerializableResponse>,
    },

    /// No cache entry for the request.
    #[serde(rename = "BeagleCacheError")]
    #[error("No cache found for {url}")]
    Cache { url: String },

    /// A cache entry exists but is older than its max age.
    #[serde(rename = "BeagleExpiredCacheError")]
    #[error("Cache for {url} has expired")]
    ExpiredCache { url: String },
}

impl BeagleError {
    pub fn network(url: impl Into<String>) -> Self {
        BeagleError::Network {
            url: url.into(),
            response: None,
        }
    }

    pub fn cache(url: impl Into<String>) -> Self {
        BeagleError::Cache { url: url.into() }
    }

    pub fn expired_cache(url: impl Into<String>) -> Self {
        BeagleError::ExpiredCache { url: url.into() }
    }

    pub fn url(&self) -> &str {
        match self {
            BeagleError::Network { url, .. }
            | BeagleError::Cache { url }
            | BeagleError::ExpiredCache { url } => url,
        }
    }

    /// Short type string, used in logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            BeagleError::Network { .. } => "network_error",
            BeagleError::Cache { .. } => "cache_error",
            BeagleError::ExpiredCache { .. } => "expired_cache_error",
        }
    }
}

/// Ordered causes of a failed load, in the order sources were attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.0))]
pub struct FetchErrors(pub Vec<BeagleError>);

impl FetchErrors {
    pub fn errors(&self) -> &[BeagleError] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<BeagleError> {
        self.0
    }
}

impl From<Vec<BeagleError>> for FetchErrors {
    fn from(errors: Vec<BeagleError>) -> Self {
        FetchErrors(errors)
    }
}

fn describe(errors: &[BeagleError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_network_error_serializes_response() {
        let err = BeagleError::Network {
            url: "http://a.com/view".to_string(),
            response: Some(SerializableResponse {
                status: 500,
                body: "oops".to_string(),
            }),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "name": "BeagleNetworkError",
                "url": "http://a.com/view",
                "response": { "status": 500, "body": "oops" },
            })
        );
    }

    #[test]
    fn test_cache_error_shape() {
        let err = BeagleError::expired_cache("http://a.com/view");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "name": "BeagleExpiredCacheError", "url": "http://a.com/view" })
        );
        assert_eq!(err.error_type(), "expired_cache_error");
    }

    #[test]
    fn test_fetch_errors_display_keeps_order() {
        let errors = FetchErrors(vec![
            BeagleError::cache("http://a.com"),
            BeagleError::network("http://a.com"),
        ]);
        assert_eq!(
            errors.to_string(),
            "No cache found for http://a.com; Network error while trying to access http://a.com"
        );
    }
}
