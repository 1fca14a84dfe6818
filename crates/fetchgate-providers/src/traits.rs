use std::time::Instant;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::metrics::MetricsTracker;
use crate::types::{Capabilities, FetchMetadata, FetchOptions, FetchResult, HealthCheck, Metrics, Page};

/// Bodies shorter than this (after trimming) are treated as invalid responses.
pub const MIN_CONTENT_LENGTH: usize = 100;

/// One pluggable backend capable of retrieving URL content.
///
/// Implementors supply identity, capabilities, a [`MetricsTracker`] they own,
/// and [`Provider::execute`], the raw transport attempt. The provided
/// [`Provider::fetch`] bounds `execute` by the request timeout, validates the
/// page and records the attempt before returning either way.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    fn capabilities(&self) -> &Capabilities;

    fn tracker(&self) -> &MetricsTracker;

    /// One raw retrieval attempt against the backend.
    async fn execute(&self, url: &str, options: &FetchOptions) -> Result<Page, ProviderError>;

    /// Whether this provider should currently be considered. Must not fail.
    async fn is_available(&self) -> bool {
        true
    }

    /// Releases provider-owned resources.
    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResult, ProviderError> {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(options.timeout, self.execute(url, options)).await {
            Ok(result) => result.and_then(validate_page),
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: options.timeout_ms(),
            }),
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        let cost = self.capabilities().cost_per_request;

        match outcome {
            Ok(page) => {
                self.tracker().record_success(elapsed_ms, cost);
                tracing::debug!(
                    target: "fetchgate_providers",
                    provider = self.name(),
                    url = %url,
                    status = page.status,
                    elapsed_ms,
                    "fetch succeeded"
                );
                Ok(FetchResult {
                    html: page.html,
                    url: url.to_string(),
                    status: page.status,
                    response_time: elapsed_ms,
                    provider: self.name().to_string(),
                    cost,
                    metadata: FetchMetadata {
                        final_url: page.final_url,
                        redirects: page.redirects,
                        headers: page.headers,
                        user_agent: page.user_agent,
                    },
                })
            }
            Err(error) => {
                self.tracker().record_failure(elapsed_ms, cost, error.to_string());
                tracing::warn!(
                    target: "fetchgate_providers",
                    provider = self.name(),
                    url = %url,
                    elapsed_ms,
                    error = %error,
                    "fetch failed"
                );
                Err(error)
            }
        }
    }

    /// Health snapshot reflecting the latest metrics.
    fn health(&self) -> HealthCheck {
        self.tracker().health()
    }

    fn metrics(&self) -> Metrics {
        self.tracker().metrics()
    }

    fn performance_score(&self) -> f64 {
        self.tracker().performance_score(self.capabilities())
    }

    fn reset_metrics(&self) {
        self.tracker().reset();
    }
}

/// Status and minimum-length check applied to every page before it is accepted.
pub(crate) fn validate_page(page: Page) -> Result<Page, ProviderError> {
    if !(200..300).contains(&page.status) {
        return Err(ProviderError::Status { status: page.status });
    }
    let length = page.html.trim().len();
    if length < MIN_CONTENT_LENGTH {
        return Err(ProviderError::InvalidResponse(format!(
            "body too short ({length} bytes, need at least {MIN_CONTENT_LENGTH})"
        )));
    }
    Ok(page)
}
