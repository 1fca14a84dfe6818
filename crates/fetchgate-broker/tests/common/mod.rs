//! Scripted providers for orchestrator tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fetchgate_providers::{
    Capabilities, FetchOptions, MetricsTracker, Page, Provider, ProviderError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
}

#[derive(Debug)]
pub struct MockProvider {
    name: String,
    capabilities: Capabilities,
    tracker: MetricsTracker,
    behavior: Behavior,
    available: bool,
    panic_on_probe: bool,
    failing_shutdown: bool,
    delay: Duration,
    pub fetch_calls: AtomicUsize,
    pub shutdown_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            capabilities: Capabilities {
                max_concurrency: 4,
                ..Capabilities::default()
            },
            tracker: MetricsTracker::new(),
            behavior,
            available: true,
            panic_on_probe: false,
            failing_shutdown: false,
            delay: Duration::ZERO,
            fetch_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(name: &str) -> Self {
        Self::new(name, Behavior::Succeed)
    }

    pub fn failing(name: &str) -> Self {
        Self::new(name, Behavior::Fail)
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.capabilities.cost_per_request = cost;
        self.capabilities.is_commercial = cost > 0.0;
        self
    }

    pub fn speed(mut self, avg_response_time: u64) -> Self {
        self.capabilities.avg_response_time = avg_response_time;
        self
    }

    pub fn javascript(mut self) -> Self {
        self.capabilities.supports_javascript = true;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn panicking_probe(mut self) -> Self {
        self.panic_on_probe = true;
        self
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.failing_shutdown = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

pub fn page_body(provider: &str) -> String {
    format!(
        "<html><body><h1>served by {provider}</h1>{}</body></html>",
        "<p>lorem ipsum</p>".repeat(8)
    )
}

#[async_trait]
impl Provider for MockProvider {
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
        if self.panic_on_probe {
            panic!("probe exploded");
        }
        self.available
    }

    async fn execute(&self, url: &str, _options: &FetchOptions) -> Result<Page, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.behavior {
            Behavior::Succeed => Ok(Page::ok(url, page_body(&self.name))),
            Behavior::Fail => Err(ProviderError::Unreachable(format!("{} is down", self.name))),
        }
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_shutdown {
            anyhow::bail!("{} refused to stop", self.name);
        }
        Ok(())
    }
}
