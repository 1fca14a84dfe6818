use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use fetchgate_providers::{
    CorsProxyConfig, CorsProxyProvider, DirectConfig, DirectHttpProvider, UnlockerConfig,
    UnlockerProvider, WebDriverConfig, WebDriverProvider,
};
use serde::{Deserialize, Serialize};

use crate::detection::DEFAULT_SPA_TOKENS;
use crate::error::BrokerError;
use crate::manager::ProviderManager;
use crate::strategy::Strategy;

pub const CONFIG_PATH_ENV: &str = "FETCHGATE_CONFIG";

/// Orchestrator options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub strategy: Strategy,
    /// Providers declaring a higher per-request cost are skipped unless nothing else is left.
    pub max_cost_per_request: f64,
    /// Attempted first, in this order, whenever they survive selection.
    pub preferred_providers: Vec<String>,
    /// When set, only these providers are instantiated and registered.
    pub enabled_providers: Option<Vec<String>>,
    /// URL tokens that mark a request as needing script execution; empty means the defaults.
    pub js_tokens: Vec<String>,
    pub probe_timeout_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_cost_per_request: 0.01,
            preferred_providers: Vec::new(),
            enabled_providers: None,
            js_tokens: DEFAULT_SPA_TOKENS.iter().map(|token| token.to_string()).collect(),
            probe_timeout_ms: 5_000,
        }
    }
}

impl ManagerConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled_providers
            .as_ref()
            .map_or(true, |enabled| enabled.iter().any(|entry| entry == name))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), BrokerError> {
        if !self.max_cost_per_request.is_finite() || self.max_cost_per_request < 0.0 {
            return Err(BrokerError::Config(format!(
                "max_cost_per_request must be a non-negative number, got {}",
                self.max_cost_per_request
            )));
        }
        if self.probe_timeout_ms == 0 {
            return Err(BrokerError::Config("probe_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Settings of the bundled adapters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub direct: DirectConfig,
    pub cors_proxy: CorsProxyConfig,
    pub webdriver: WebDriverConfig,
    pub unlockers: Vec<UnlockerConfig>,
}

/// Top-level TOML document.
///
/// ```toml
/// [manager]
/// strategy = "reliability-first"
/// max_cost_per_request = 0.002
/// preferred_providers = ["webdriver"]
///
/// [providers.webdriver]
/// endpoint = "http://127.0.0.1:4444"
///
/// [[providers.unlockers]]
/// name = "scrapingbee"
/// api_key_env = "SCRAPINGBEE_API_KEY"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchgateConfig {
    pub manager: ManagerConfig,
    pub providers: ProvidersConfig,
}

impl FetchgateConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, BrokerError> {
        let config: Self = toml::from_str(source).map_err(|error| BrokerError::Config(error.to_string()))?;
        config.manager.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::from_toml_str(&source)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracing::info!(target: "fetchgate_broker", path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Loads `path`, else `FETCHGATE_CONFIG`, else the defaults.
    pub fn discover(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    /// Instantiates every enabled adapter and registers it with a new manager.
    pub fn build_manager(&self) -> Result<ProviderManager, BrokerError> {
        self.manager.validate()?;
        let manager = ProviderManager::new(self.manager.clone());
        let providers = &self.providers;

        if providers.direct.enabled && self.manager.is_enabled(DirectHttpProvider::NAME) {
            manager.add_provider(Arc::new(DirectHttpProvider::new()?))?;
        }
        if providers.cors_proxy.enabled && self.manager.is_enabled(CorsProxyProvider::NAME) {
            manager.add_provider(Arc::new(CorsProxyProvider::new(providers.cors_proxy.clone())?))?;
        }
        if providers.webdriver.enabled && self.manager.is_enabled(WebDriverProvider::NAME) {
            manager.add_provider(Arc::new(WebDriverProvider::new(providers.webdriver.clone())?))?;
        }
        for unlocker in &providers.unlockers {
            if self.manager.is_enabled(&unlocker.name) {
                manager.add_provider(Arc::new(UnlockerProvider::new(unlocker.clone())?))?;
            }
        }

        Ok(manager)
    }
}
