use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static properties a provider declares at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_javascript: bool,
    pub supports_stealth: bool,
    pub is_commercial: bool,
    /// Declared cost charged per attempt, never negative.
    pub cost_per_request: f64,
    pub max_concurrency: u32,
    /// Baseline response time estimate in milliseconds (declared, not measured).
    pub avg_response_time: u64,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_javascript: false,
            supports_stealth: false,
            is_commercial: false,
            cost_per_request: 0.0,
            max_concurrency: 1,
            avg_response_time: 1_000,
        }
    }
}

impl Capabilities {
    /// Clamps the declared values into their valid ranges.
    pub fn normalized(mut self) -> Self {
        if !self.cost_per_request.is_finite() || self.cost_per_request < 0.0 {
            self.cost_per_request = 0.0;
        }
        self.max_concurrency = self.max_concurrency.max(1);
        self
    }

    pub fn is_free(&self) -> bool {
        self.cost_per_request <= 0.0
    }
}

/// Rolling statistics accumulated from every attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub request_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Mean over all attempts, successes and failures alike, in milliseconds.
    pub avg_response_time: f64,
    pub total_cost: f64,
    /// Unix timestamp in milliseconds of the most recent attempt.
    pub last_used: Option<u64>,
    pub success_rate: f64,
}

/// Pass/fail judgment derived from [`Metrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub is_healthy: bool,
    pub error_rate: f64,
    pub avg_response_time: f64,
    /// Unix timestamp in milliseconds.
    pub last_check: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-call ranking override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Speed,
    Cost,
    Reliability,
}

#[derive(Debug, Error)]
#[error("unknown priority `{0}` (expected speed, cost or reliability)")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "speed" => Ok(Priority::Speed),
            "cost" => Ok(Priority::Cost),
            "reliability" => Ok(Priority::Reliability),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Priority::Speed => "speed",
            Priority::Cost => "cost",
            Priority::Reliability => "reliability",
        };
        write!(f, "{label}")
    }
}

/// Request-scoped configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Upper bound for a single provider attempt.
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub wait_for_selector: Option<String>,
    /// Hint that the content is rendered by scripts after load.
    pub wait_for_network: bool,
    pub block_resources: bool,
    pub stealth: bool,
    /// Provider-internal retry hint. The orchestrator tries each provider once.
    pub max_retries: u32,
    pub priority: Option<Priority>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            headers: BTreeMap::new(),
            wait_for_selector: None,
            wait_for_network: false,
            block_resources: false,
            stealth: false,
            max_retries: 2,
            priority: None,
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_wait_for_selector(mut self, selector: impl Into<String>) -> Self {
        self.wait_for_selector = Some(selector.into());
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Raw output of one backend attempt, before validation and accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub html: String,
    pub status: u16,
    pub final_url: String,
    pub redirects: u32,
    /// Request headers sent to the backend, echoed back to the caller.
    pub headers: BTreeMap<String, String>,
    pub user_agent: Option<String>,
}

impl Page {
    pub fn ok(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            status: 200,
            final_url: url.into(),
            redirects: 0,
            headers: BTreeMap::new(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub final_url: String,
    pub redirects: u32,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// A successful retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub html: String,
    /// The URL as requested.
    pub url: String,
    pub status: u16,
    /// Measured milliseconds for the successful attempt.
    pub response_time: f64,
    pub provider: String,
    pub cost: f64,
    pub metadata: FetchMetadata,
}
