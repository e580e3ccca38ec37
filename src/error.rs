use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single config submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Connection, DNS or TLS failure reported by the HTTP client.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. The message is the raw response body.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// 2xx response whose body is not valid JSON.
    #[error(transparent)]
    Parse(serde_json::Error),

    #[error("failed to encode config: {0}")]
    Encode(serde_json::Error),
}

impl SubmitError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}
