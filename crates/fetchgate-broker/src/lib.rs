//! Provider selection, ordering and fallback.

pub mod config;
pub mod detection;
pub mod error;
pub mod manager;
pub mod registry;
pub mod snapshot;
pub mod strategy;

pub use config::{FetchgateConfig, ManagerConfig, ProvidersConfig};
pub use detection::{ScriptDetector, UrlHeuristicDetector, DEFAULT_SPA_TOKENS};
pub use error::{AttemptRecord, BrokerError};
pub use manager::{FetchOutcome, ProviderManager};
pub use registry::ProviderRegistry;
pub use snapshot::{HealthReport, MetricsReport};
pub use strategy::{Candidate, Strategy};
