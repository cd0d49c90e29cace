use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend unreachable, connection reset or timed out
    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend rejected the credential (HTTP 401)
    #[error("credential rejected by backend")]
    Unauthorized,

    /// An authenticated endpoint was called without a credential
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid backend url '{0}'")]
    InvalidBaseUrl(String),
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            BackendError::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            BackendError::Network(e.to_string())
        }
    }
}
