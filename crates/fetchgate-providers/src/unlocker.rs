use async_trait::async_trait;
use fetchgate_stealth::BrowserIdentity;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{parse_url, HttpFetcher};
use crate::metrics::MetricsTracker;
use crate::traits::Provider;
use crate::types::{Capabilities, FetchOptions, Page};

/// A commercial unlocking API addressed as `endpoint?{key_param}=..&{url_param}=..`.
///
/// Defaults match ScrapingBee's query interface; other services of the same
/// shape are configured by renaming the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockerConfig {
    pub name: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Environment variable read when `api_key` is not set.
    pub api_key_env: Option<String>,
    pub cost_per_request: f64,
    pub avg_response_time: u64,
    pub max_concurrency: u32,
    pub key_param: String,
    pub url_param: String,
    pub render_js_param: Option<String>,
    pub stealth_param: Option<String>,
    pub wait_for_param: Option<String>,
    pub block_resources_param: Option<String>,
}

impl Default for UnlockerConfig {
    fn default() -> Self {
        Self {
            name: "scrapingbee".to_string(),
            endpoint: "https://app.scrapingbee.com/api/v1/".to_string(),
            api_key: None,
            api_key_env: Some("SCRAPINGBEE_API_KEY".to_string()),
            cost_per_request: 0.005,
            avg_response_time: 4_000,
            max_concurrency: 5,
            key_param: "api_key".to_string(),
            url_param: "url".to_string(),
            render_js_param: Some("render_js".to_string()),
            stealth_param: Some("premium_proxy".to_string()),
            wait_for_param: Some("wait_for".to_string()),
            block_resources_param: Some("block_resources".to_string()),
        }
    }
}

impl UnlockerConfig {
    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| self.api_key_env.as_deref().and_then(|var| std::env::var(var).ok()))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug)]
pub struct UnlockerProvider {
    name: String,
    capabilities: Capabilities,
    tracker: MetricsTracker,
    http: HttpFetcher,
    config: UnlockerConfig,
    api_key: Option<String>,
}

impl UnlockerProvider {
    pub fn new(config: UnlockerConfig) -> Result<Self, ProviderError> {
        let capabilities = Capabilities {
            supports_javascript: config.render_js_param.is_some(),
            supports_stealth: config.stealth_param.is_some(),
            is_commercial: true,
            cost_per_request: config.cost_per_request,
            max_concurrency: config.max_concurrency,
            avg_response_time: config.avg_response_time,
        }
        .normalized();
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            tracing::debug!(target: "fetchgate_providers", provider = %config.name, "no api key resolved");
        }
        Ok(Self {
            name: config.name.clone(),
            capabilities,
            tracker: MetricsTracker::new(),
            http: HttpFetcher::new(BrowserIdentity::default())?,
            config,
            api_key,
        })
    }

    fn query(&self, api_key: &str, url: &str, options: &FetchOptions) -> Vec<(String, String)> {
        let config = &self.config;
        let mut query = vec![
            (config.key_param.clone(), api_key.to_string()),
            (config.url_param.clone(), url.to_string()),
        ];
        let wants_js = options.wait_for_selector.is_some() || options.wait_for_network;
        if let Some(param) = &config.render_js_param {
            query.push((param.clone(), wants_js.to_string()));
        }
        if options.stealth {
            if let Some(param) = &config.stealth_param {
                query.push((param.clone(), "true".to_string()));
            }
        }
        if let (Some(param), Some(selector)) = (&config.wait_for_param, &options.wait_for_selector) {
            query.push((param.clone(), selector.clone()));
        }
        if options.block_resources {
            if let Some(param) = &config.block_resources_param {
                query.push((param.clone(), "true".to_string()));
            }
        }
        query
    }
}

#[async_trait]
impl Provider for UnlockerProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn tracker(&self) -> &MetricsTracker {
        &self.tracker
    }

    async fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn execute(&self, url: &str, options: &FetchOptions) -> Result<Page, ProviderError> {
        parse_url(url)?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::Misconfigured(format!("{}: no api key", self.name)))?;
        let endpoint = reqwest::Url::parse_with_params(&self.config.endpoint, self.query(api_key, url, options))
            .map_err(|error| ProviderError::Misconfigured(format!("endpoint `{}`: {error}", self.config.endpoint)))?;

        let mut page = self.http.get(endpoint, options).await?;
        page.final_url = url.to_string();
        Ok(page)
    }
}
