//! Provider contract, metrics model and the bundled fetch backends.

pub mod cors_proxy;
pub mod direct;
pub mod error;
pub mod http;
pub mod metrics;
pub mod traits;
pub mod types;
pub mod unlocker;
pub mod webdriver;

pub use cors_proxy::{CorsProxyConfig, CorsProxyEndpoint, CorsProxyProvider};
pub use direct::{DirectConfig, DirectHttpProvider};
pub use error::ProviderError;
pub use metrics::{performance_score, MetricsTracker};
pub use traits::{Provider, MIN_CONTENT_LENGTH};
pub use types::{
    Capabilities, FetchMetadata, FetchOptions, FetchResult, HealthCheck, Metrics, Page, Priority,
};
pub use unlocker::{UnlockerConfig, UnlockerProvider};
pub use webdriver::{WebDriverConfig, WebDriverProvider};
