use async_trait::async_trait;
use fetchgate_stealth::BrowserIdentity;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{parse_url, HttpFetcher};
use crate::metrics::MetricsTracker;
use crate::traits::Provider;
use crate::types::{Capabilities, FetchOptions, Page};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectConfig {
    pub enabled: bool,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Plain HTTP GET straight from this process.
#[derive(Debug)]
pub struct DirectHttpProvider {
    capabilities: Capabilities,
    tracker: MetricsTracker,
    http: HttpFetcher,
}

impl DirectHttpProvider {
    pub const NAME: &'static str = "direct";

    pub fn new() -> Result<Self, ProviderError> {
        Ok(Self {
            capabilities: Capabilities {
                supports_javascript: false,
                supports_stealth: false,
                is_commercial: false,
                cost_per_request: 0.0,
                max_concurrency: 10,
                avg_response_time: 1_500,
            },
            tracker: MetricsTracker::new(),
            http: HttpFetcher::new(BrowserIdentity::default())?,
        })
    }
}

#[async_trait]
impl Provider for DirectHttpProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn tracker(&self) -> &MetricsTracker {
        &self.tracker
    }

    async fn execute(&self, url: &str, options: &FetchOptions) -> Result<Page, ProviderError> {
        let target = parse_url(url)?;
        self.http.get(target, options).await
    }
}
