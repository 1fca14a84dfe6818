use fetchgate_providers::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One failed provider attempt within a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider: String,
    pub message: String,
    pub elapsed_ms: f64,
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("no providers available")]
    NoProvidersAvailable,
    #[error("all {} attempted providers failed: {}", .attempts.len(), summarize(.attempts))]
    AllProvidersFailed { attempts: Vec<AttemptRecord> },
    #[error("provider `{0}` is already registered")]
    DuplicateProvider(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl BrokerError {
    /// The attempt log, empty unless every candidate failed.
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            BrokerError::AllProvidersFailed { attempts } => attempts,
            _ => &[],
        }
    }
}

fn summarize(attempts: &[AttemptRecord]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("{} ({})", attempt.provider, attempt.message))
        .collect::<Vec<_>>()
        .join("; ")
}
