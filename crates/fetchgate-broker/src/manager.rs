use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use fetchgate_providers::{FetchOptions, FetchResult, Provider};
use serde::Serialize;

use crate::config::ManagerConfig;
use crate::detection::{ScriptDetector, UrlHeuristicDetector};
use crate::error::{AttemptRecord, BrokerError};
use crate::registry::ProviderRegistry;
use crate::snapshot::{HealthReport, MetricsReport};
use crate::strategy::{prefer, Candidate, Strategy};

/// A successful fetch plus the failed attempts before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome {
    pub result: FetchResult,
    pub attempts: Vec<AttemptRecord>,
}

/// Selects, orders and falls back between registered providers.
///
/// Per request: probe availability, filter by budget (degrading to every
/// available provider when none fits), rank, then attempt each candidate in
/// turn until one succeeds. Attempts within one request never overlap.
pub struct ProviderManager {
    registry: ProviderRegistry,
    config: ManagerConfig,
    detector: Arc<dyn ScriptDetector>,
}

impl ProviderManager {
    pub fn new(config: ManagerConfig) -> Self {
        let detector = if config.js_tokens.is_empty() {
            UrlHeuristicDetector::default()
        } else {
            UrlHeuristicDetector::with_tokens(&config.js_tokens)
        };
        Self {
            registry: ProviderRegistry::new(),
            config,
            detector: Arc::new(detector),
        }
    }

    /// Replaces the JavaScript-requirement policy.
    pub fn with_detector(mut self, detector: impl ScriptDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Registers `provider`. Returns `Ok(false)` when the enabled list excludes it.
    pub fn add_provider(&self, provider: Arc<dyn Provider>) -> Result<bool, BrokerError> {
        if !self.config.is_enabled(provider.name()) {
            tracing::info!(
                target: "fetchgate_broker",
                provider = provider.name(),
                "provider not in enabled list; skipping"
            );
            return Ok(false);
        }
        self.registry.add(Arc::clone(&provider))?;
        tracing::info!(
            target: "fetchgate_broker",
            provider = provider.name(),
            cost = provider.capabilities().cost_per_request,
            javascript = provider.capabilities().supports_javascript,
            "provider registered"
        );
        Ok(true)
    }

    pub fn remove_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let removed = self.registry.remove(name);
        if removed.is_some() {
            tracing::info!(target: "fetchgate_broker", provider = name, "provider removed");
        }
        removed
    }

    pub fn get_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.registry.get(name)
    }

    pub fn list_providers(&self) -> Vec<String> {
        self.registry.list()
    }

    pub fn requires_javascript(&self, url: &str, options: &FetchOptions) -> bool {
        self.detector.requires_javascript(url, options)
    }

    /// Availability probe that turns panics and overruns into "unavailable".
    async fn probe(&self, provider: &Arc<dyn Provider>) -> bool {
        let mut task = {
            let provider = Arc::clone(provider);
            tokio::spawn(async move { provider.is_available().await })
        };
        match tokio::time::timeout(self.config.probe_timeout(), &mut task).await {
            Ok(Ok(available)) => available,
            Ok(Err(error)) => {
                tracing::warn!(
                    target: "fetchgate_broker",
                    provider = provider.name(),
                    error = %error,
                    "availability probe aborted"
                );
                false
            }
            Err(_) => {
                task.abort();
                tracing::warn!(
                    target: "fetchgate_broker",
                    provider = provider.name(),
                    timeout_ms = self.config.probe_timeout_ms,
                    "availability probe timed out"
                );
                false
            }
        }
    }

    /// Probes every registered provider, in registration order.
    pub async fn availability(&self) -> BTreeMap<String, bool> {
        let mut report = BTreeMap::new();
        for provider in self.registry.snapshot() {
            let available = self.probe(&provider).await;
            report.insert(provider.name().to_string(), available);
        }
        report
    }

    async fn select(&self, url: &str, options: &FetchOptions) -> Result<Vec<Candidate>, BrokerError> {
        let mut available = Vec::new();
        for provider in self.registry.snapshot() {
            if self.probe(&provider).await {
                available.push(provider);
            } else {
                tracing::debug!(target: "fetchgate_broker", provider = provider.name(), "provider unavailable");
            }
        }
        if available.is_empty() {
            return Err(BrokerError::NoProvidersAvailable);
        }

        let budget = self.config.max_cost_per_request;
        let affordable: Vec<_> = available
            .iter()
            .filter(|provider| provider.capabilities().cost_per_request <= budget)
            .cloned()
            .collect();
        let pool = if affordable.is_empty() {
            tracing::warn!(
                target: "fetchgate_broker",
                budget,
                "no provider within budget; falling back to every available provider"
            );
            available
        } else {
            affordable
        };

        let needs_javascript = self.requires_javascript(url, options);
        let strategy = options.priority.map(Strategy::from).unwrap_or(self.config.strategy);
        let mut candidates: Vec<Candidate> = pool.into_iter().map(Candidate::snapshot).collect();
        strategy.rank(&mut candidates, needs_javascript);
        let candidates = prefer(candidates, &self.config.preferred_providers);

        let order: Vec<&str> = candidates.iter().map(Candidate::name).collect();
        tracing::debug!(
            target: "fetchgate_broker",
            url = %url,
            strategy = %strategy,
            needs_javascript,
            order = ?order,
            "providers ranked"
        );
        Ok(candidates)
    }

    /// The order in which `fetch` would attempt providers, without fetching.
    pub async fn plan(&self, url: &str, options: &FetchOptions) -> Result<Vec<String>, BrokerError> {
        Ok(self
            .select(url, options)
            .await?
            .iter()
            .map(|candidate| candidate.name().to_string())
            .collect())
    }

    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResult, BrokerError> {
        self.fetch_detailed(url, options).await.map(|outcome| outcome.result)
    }

    /// Like [`ProviderManager::fetch`], also returning the failures that preceded success.
    pub async fn fetch_detailed(&self, url: &str, options: &FetchOptions) -> Result<FetchOutcome, BrokerError> {
        let candidates = self.select(url, options).await?;
        let mut attempts = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let started = Instant::now();
            tracing::debug!(target: "fetchgate_broker", provider = candidate.name(), url = %url, "attempting provider");
            match candidate.provider.fetch(url, options).await {
                Ok(result) => {
                    tracing::info!(
                        target: "fetchgate_broker",
                        provider = candidate.name(),
                        url = %url,
                        status = result.status,
                        failed_before = attempts.len(),
                        "fetch succeeded"
                    );
                    return Ok(FetchOutcome { result, attempts });
                }
                Err(error) => {
                    let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
                    tracing::warn!(
                        target: "fetchgate_broker",
                        provider = candidate.name(),
                        url = %url,
                        elapsed_ms,
                        error = %error,
                        "provider failed; falling back"
                    );
                    attempts.push(AttemptRecord {
                        provider: candidate.name().to_string(),
                        message: error.to_string(),
                        elapsed_ms,
                    });
                }
            }
        }

        tracing::error!(
            target: "fetchgate_broker",
            url = %url,
            attempts = attempts.len(),
            "all providers failed"
        );
        Err(BrokerError::AllProvidersFailed { attempts })
    }

    pub fn health_snapshot_all(&self) -> BTreeMap<String, HealthReport> {
        self.registry
            .snapshot()
            .iter()
            .map(|provider| (provider.name().to_string(), HealthReport::of(provider.as_ref())))
            .collect()
    }

    pub fn metrics_snapshot_all(&self) -> BTreeMap<String, MetricsReport> {
        self.registry
            .snapshot()
            .iter()
            .map(|provider| (provider.name().to_string(), MetricsReport::of(provider.as_ref())))
            .collect()
    }

    pub fn reset_metrics_all(&self) {
        for provider in self.registry.snapshot() {
            provider.reset_metrics();
        }
        tracing::info!(target: "fetchgate_broker", "metrics reset for all providers");
    }

    /// Tears down every provider; individual failures are logged, not fatal.
    pub async fn shutdown(&self) {
        for provider in self.registry.snapshot() {
            if let Err(error) = provider.shutdown().await {
                tracing::warn!(
                    target: "fetchgate_broker",
                    provider = provider.name(),
                    error = %error,
                    "provider shutdown failed"
                );
            }
        }
        tracing::info!(target: "fetchgate_broker", "manager shut down");
    }
}

impl std::fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderManager")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
