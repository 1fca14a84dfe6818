use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::client::WebDriverClient;
use crate::error::ProviderError;
use crate::http::parse_url;
use crate::metrics::MetricsTracker;
use crate::traits::Provider;
use crate::types::{Capabilities, FetchOptions, Page};

pub const WEBDRIVER_URL_ENV: &str = "FETCHGATE_WEBDRIVER_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    pub enabled: bool,
    /// Remote end base URL. Falls back to `FETCHGATE_WEBDRIVER_URL`.
    pub endpoint: Option<String>,
    /// `alwaysMatch` capabilities sent when the session is created.
    pub capabilities: Value,
    pub selector_poll_ms: u64,
    /// Extra settle time after load when the request hints at script-rendered content.
    pub network_settle_ms: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            capabilities: json!({}),
            selector_poll_ms: 250,
            network_settle_ms: 1_000,
        }
    }
}

impl WebDriverConfig {
    fn resolve_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .or_else(|| std::env::var(WEBDRIVER_URL_ENV).ok())
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
    }
}

/// Renders pages in a headless browser driven over WebDriver.
///
/// One browser session is created lazily and reused; it is owned by the
/// provider and deleted on [`Provider::shutdown`]. Requests against this
/// provider are serialized on that session.
#[derive(Debug)]
pub struct WebDriverProvider {
    capabilities: Capabilities,
    tracker: MetricsTracker,
    config: WebDriverConfig,
    client: Option<WebDriverClient>,
    session: Mutex<Option<String>>,
}

impl WebDriverProvider {
    pub const NAME: &'static str = "webdriver";

    pub fn new(config: WebDriverConfig) -> Result<Self, ProviderError> {
        let client = config
            .resolve_endpoint()
            .map(|endpoint| WebDriverClient::new(&endpoint))
            .transpose()?;
        match &client {
            Some(client) => tracing::info!(
                target: "fetchgate_providers",
                base_url = %client.base(),
                "webdriver provider attached to remote end"
            ),
            None => tracing::info!(
                target: "fetchgate_providers",
                "webdriver provider has no endpoint; set {WEBDRIVER_URL_ENV} to enable it"
            ),
        }
        Ok(Self {
            capabilities: Capabilities {
                supports_javascript: true,
                supports_stealth: false,
                is_commercial: false,
                cost_per_request: 0.0,
                max_concurrency: 1,
                avg_response_time: 5_000,
            },
            tracker: MetricsTracker::new(),
            config,
            client,
            session: Mutex::new(None),
        })
    }

    async fn render(
        &self,
        client: &WebDriverClient,
        session: &str,
        url: &str,
        options: &FetchOptions,
    ) -> Result<Page, ProviderError> {
        client.set_page_load_timeout(session, options.timeout_ms()).await?;
        client.navigate(session, url).await?;

        if let Some(selector) = &options.wait_for_selector {
            let poll = Duration::from_millis(self.config.selector_poll_ms.max(10));
            while !client.has_element(session, selector).await? {
                tokio::time::sleep(poll).await;
            }
        }
        if options.wait_for_network {
            tokio::time::sleep(Duration::from_millis(self.config.network_settle_ms)).await;
        }

        let html = client.source(session).await?;
        let final_url = client
            .current_url(session)
            .await
            .unwrap_or_else(|_| url.to_string());
        Ok(Page {
            html,
            // WebDriver does not expose the document's HTTP status or hop count,
            // and the browser sends its own request headers.
            status: 200,
            final_url,
            redirects: 0,
            headers: BTreeMap::new(),
            user_agent: None,
        })
    }
}

#[async_trait]
impl Provider for WebDriverProvider {
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
        let Some(client) = &self.client else {
            return false;
        };
        match client.ready().await {
            Ok(ready) => ready,
            Err(error) => {
                tracing::debug!(target: "fetchgate_providers", error = %error, "webdriver status probe failed");
                false
            }
        }
    }

    async fn execute(&self, url: &str, options: &FetchOptions) -> Result<Page, ProviderError> {
        let client = self.client.as_ref().ok_or_else(|| {
            ProviderError::Unsupported(format!("no WebDriver endpoint configured (set {WEBDRIVER_URL_ENV})"))
        })?;
        parse_url(url)?;

        let mut held = self.session.lock().await;
        let session = match held.as_ref() {
            Some(id) => id.clone(),
            None => {
                let id = client.new_session(&self.config.capabilities).await?;
                tracing::debug!(target: "fetchgate_providers", session = %id, "webdriver session created");
                *held = Some(id.clone());
                id
            }
        };

        match self.render(client, &session, url, options).await {
            Ok(page) => Ok(page),
            Err(error) => {
                // Start from a clean session next time.
                if let Err(delete_error) = client.delete_session(&session).await {
                    tracing::debug!(
                        target: "fetchgate_providers",
                        error = %delete_error,
                        "discarding failed webdriver session"
                    );
                }
                *held = None;
                Err(error)
            }
        }
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        let session = self.session.lock().await.take();
        if let (Some(client), Some(session)) = (&self.client, session) {
            client.delete_session(&session).await?;
            tracing::info!(target: "fetchgate_providers", session = %session, "webdriver session closed");
        }
        Ok(())
    }
}
