use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client, the observer and the webhook helpers
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid client configuration (e.g. no base endpoint)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The realtime channel rejected or never confirmed the subscription
    #[error("subscription handshake failed: {0}")]
    Handshake(String),

    /// The realtime connection failed or dropped
    #[error("transport error: {0}")]
    Transport(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("webhook signature does not match")]
    InvalidSignature,

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Non-success status returned by the REST API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Not found! Resource does not exist or expired")]
    NotFound,

    #[error("Authorization failed! Check the API key to be valid")]
    Unauthorized,

    #[error("Bad request! Check your request parameters to be valid")]
    BadRequest,

    #[error("Unexpected API status: expected {expected}, got {actual}")]
    UnexpectedStatus { expected: u16, actual: u16 },

    #[error("Unknown error! Request failed for an unknown error ({0})")]
    Unknown(u16),
}

impl ApiError {
    /// Map a response status code to an error, `None` for success codes
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200 | 201 | 204 => None,
            404 => Some(ApiError::NotFound),
            401 => Some(ApiError::Unauthorized),
            403 => Some(ApiError::BadRequest),
            other => Some(ApiError::Unknown(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses() {
        assert_eq!(ApiError::from_status(200), None);
        assert_eq!(ApiError::from_status(201), None);
        assert_eq!(ApiError::from_status(204), None);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(ApiError::from_status(404), Some(ApiError::NotFound));
        assert_eq!(ApiError::from_status(401), Some(ApiError::Unauthorized));
        assert_eq!(ApiError::from_status(403), Some(ApiError::BadRequest));
        assert_eq!(ApiError::from_status(500), Some(ApiError::Unknown(500)));
    }

    #[test]
    fn test_unknown_message_includes_code() {
        let msg = ApiError::Unknown(502).to_string();
        assert!(msg.contains("502"));
    }
}
