use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("verifier unreachable: {0}")]
    Unreachable(String),

    #[error("verifier request failed: {0}")]
    RequestFailed(String),

    #[error("verifier returned HTTP {status}")]
    Upstream { status: u16, body: String },

    #[error("invalid response from verifier: {0}")]
    InvalidResponse(String),

    #[error("verifier misconfigured: {0}")]
    Config(String),
}

impl VerifierError {
    /// Upstream payload worth echoing to a client, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Upstream { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::Unreachable(format!("connection failed: {e}"))
        } else {
            Self::RequestFailed(e.to_string())
        }
    }
}
