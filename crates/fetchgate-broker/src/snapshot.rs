use fetchgate_providers::{Capabilities, HealthCheck, Metrics, Provider};
use serde::{Deserialize, Serialize};

/// Per-provider health view for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(flatten)]
    pub health: HealthCheck,
    pub performance_score: f64,
    pub metrics: Metrics,
}

/// Per-provider usage view for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub capabilities: Capabilities,
    pub performance_score: f64,
}

impl HealthReport {
    pub fn of(provider: &dyn Provider) -> Self {
        Self {
            health: provider.health(),
            performance_score: provider.performance_score(),
            metrics: provider.metrics(),
        }
    }
}

impl MetricsReport {
    pub fn of(provider: &dyn Provider) -> Self {
        Self {
            metrics: provider.metrics(),
            capabilities: *provider.capabilities(),
            performance_score: provider.performance_score(),
        }
    }
}
