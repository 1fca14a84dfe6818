use thiserror::Error;

/// Why a single provider attempt failed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid url {0}")]
    InvalidUrl(String),
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("backend returned non-success status {status}")]
    Status { status: u16 },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    #[error("unsupported in this environment: {0}")]
    Unsupported(String),
    #[error("misconfigured: {0}")]
    Misconfigured(String),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() || error.is_body() {
            ProviderError::InvalidResponse(error.to_string())
        } else if error.is_builder() {
            ProviderError::Misconfigured(error.to_string())
        } else {
            ProviderError::Unreachable(error.to_string())
        }
    }
}
