//! Failure taxonomy shared by both remote data sources

/// Why a remote fetch stopped short of a complete result.
///
/// Fetch paths still hand back whatever records were collected; this value
/// travels next to them so callers can tell an empty match from a failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The source reported zero matching records.
    #[error("no matching records")]
    NotFound,

    /// Transport failure or a non-success HTTP status.
    #[error("transient error: {0}")]
    Transient(String),

    /// The API answered with a non-success result code.
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Schema(String),
}

impl FetchError {
    /// Whether repeating the same request could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }

    /// Build a transient error from a non-success HTTP status.
    pub fn http_status(status: u16) -> Self {
        FetchError::Transient(format!("HTTP status {status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_failures_are_transient() {
        assert!(FetchError::http_status(503).is_transient());
        assert!(FetchError::Transient("timed out".to_string()).is_transient());
        assert!(!FetchError::NotFound.is_transient());
        assert!(!FetchError::Schema("missing body".to_string()).is_transient());
        assert!(!FetchError::Api {
            code: "99".to_string(),
            message: "SERVICE ERROR".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            FetchError::http_status(500).to_string(),
            "transient error: HTTP status 500"
        );
        assert_eq!(
            FetchError::Api {
                code: "30".to_string(),
                message: "SERVICE KEY IS NOT REGISTERED ERROR.".to_string()
            }
            .to_string(),
            "API error 30: SERVICE KEY IS NOT REGISTERED ERROR."
        );
    }
}
