use std::time::Duration;

use async_trait::async_trait;
use fetchgate_stealth::{backoff_delay_ms, BrowserIdentity};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{parse_url, HttpFetcher};
use crate::metrics::MetricsTracker;
use crate::traits::{validate_page, Provider};
use crate::types::{Capabilities, FetchOptions, Page};

/// A public proxy reached as `base?{param}=<target url>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsProxyEndpoint {
    pub base: String,
    #[serde(default = "default_param")]
    pub param: String,
}

fn default_param() -> String {
    "url".to_string()
}

impl CorsProxyEndpoint {
    pub fn new(base: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            param: param.into(),
        }
    }

    fn proxied(&self, target: &str) -> Result<Url, ProviderError> {
        Url::parse_with_params(&self.base, &[(self.param.as_str(), target)])
            .map_err(|error| ProviderError::Misconfigured(format!("proxy base `{}`: {error}", self.base)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsProxyConfig {
    pub enabled: bool,
    pub endpoints: Vec<CorsProxyEndpoint>,
    /// First backoff between rounds over the endpoint list; doubles each round.
    pub backoff_base_ms: u64,
}

impl Default for CorsProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoints: vec![
                CorsProxyEndpoint::new("https://api.allorigins.win/raw", "url"),
                CorsProxyEndpoint::new("https://corsproxy.io/", "url"),
            ],
            backoff_base_ms: 500,
        }
    }
}

/// Fetches through a rotating list of CORS proxies.
///
/// Each round tries every endpoint in order; `max_retries` extra rounds are
/// made with exponential backoff before the attempt is reported as failed.
#[derive(Debug)]
pub struct CorsProxyProvider {
    capabilities: Capabilities,
    tracker: MetricsTracker,
    http: HttpFetcher,
    endpoints: Vec<CorsProxyEndpoint>,
    backoff_base_ms: u64,
}

impl CorsProxyProvider {
    pub const NAME: &'static str = "cors-proxy";

    pub fn new(config: CorsProxyConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            capabilities: Capabilities {
                supports_javascript: false,
                supports_stealth: false,
                is_commercial: false,
                cost_per_request: 0.0,
                max_concurrency: 5,
                avg_response_time: 3_000,
            },
            tracker: MetricsTracker::new(),
            http: HttpFetcher::new(BrowserIdentity::default())?,
            endpoints: config.endpoints,
            backoff_base_ms: config.backoff_base_ms,
        })
    }

    async fn try_endpoint(
        &self,
        endpoint: &CorsProxyEndpoint,
        url: &str,
        options: &FetchOptions,
    ) -> Result<Page, ProviderError> {
        let proxied = endpoint.proxied(url)?;
        // A short 200 page (rate-limit notice) fails this endpoint only.
        let mut page = validate_page(self.http.get(proxied, options).await?)?;
        // The proxy hides the target's own redirects.
        page.final_url = url.to_string();
        Ok(page)
    }
}

#[async_trait]
impl Provider for CorsProxyProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn tracker(&self) -> &MetricsTracker {
        &self.tracker
    }

    async fn is_available(&self) -> bool {
        !self.endpoints.is_empty()
    }

    async fn execute(&self, url: &str, options: &FetchOptions) -> Result<Page, ProviderError> {
        parse_url(url)?;
        if self.endpoints.is_empty() {
            return Err(ProviderError::Misconfigured("no proxy endpoints configured".into()));
        }

        let mut last_error = None;
        for round in 0..=options.max_retries {
            if round > 0 {
                let delay = backoff_delay_ms(self.backoff_base_ms, round - 1);
                tracing::debug!(target: "fetchgate_providers", round, delay_ms = delay, "cors proxy backing off");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            for endpoint in &self.endpoints {
                match self.try_endpoint(endpoint, url, options).await {
                    Ok(page) => return Ok(page),
                    Err(error) => {
                        tracing::debug!(
                            target: "fetchgate_providers",
                            proxy = %endpoint.base,
                            round,
                            error = %error,
                            "cors proxy endpoint failed"
                        );
                        last_error = Some(error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Unreachable("no proxy endpoint answered".into())))
    }
}
