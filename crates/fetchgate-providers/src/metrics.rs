use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{Capabilities, HealthCheck, Metrics};

/// Response time at or above which the speed component of the score is zero.
pub const SPEED_CEILING_MS: f64 = 10_000.0;
/// Per-request cost at or above which the cost component of the score is zero.
pub const COST_CEILING: f64 = 0.01;

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

#[derive(Debug)]
struct TrackerState {
    metrics: Metrics,
    health: HealthCheck,
}

impl TrackerState {
    fn fresh() -> Self {
        Self {
            metrics: Metrics::default(),
            health: HealthCheck {
                is_healthy: true,
                error_rate: 0.0,
                avg_response_time: 0.0,
                last_check: now_ms(),
                message: None,
            },
        }
    }
}

/// Owned, mutex-guarded metrics and health for one provider.
///
/// Every attempt goes through [`MetricsTracker::record`], which performs the
/// whole read-modify-write in a single critical section so concurrent
/// requests against the same provider never lose an update.
#[derive(Debug)]
pub struct MetricsTracker {
    state: Mutex<TrackerState>,
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState::fresh()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_success(&self, response_time_ms: f64, cost: f64) {
        self.record(true, response_time_ms, cost, None);
    }

    pub fn record_failure(&self, response_time_ms: f64, cost: f64, message: impl Into<String>) {
        self.record(false, response_time_ms, cost, Some(message.into()));
    }

    pub fn record(&self, success: bool, response_time_ms: f64, cost: f64, message: Option<String>) {
        let now = now_ms();
        let mut state = self.lock();
        let TrackerState { metrics, health } = &mut *state;

        metrics.request_count += 1;
        metrics.last_used = Some(now);
        metrics.total_cost += cost.max(0.0);
        if success {
            metrics.success_count += 1;
        } else {
            metrics.failure_count += 1;
        }

        let n = metrics.request_count as f64;
        metrics.avg_response_time = (metrics.avg_response_time * (n - 1.0) + response_time_ms) / n;
        metrics.success_rate = metrics.success_count as f64 / n;

        health.error_rate = metrics.failure_count as f64 / n;
        health.avg_response_time = metrics.avg_response_time;
        health.is_healthy = metrics.success_rate > 0.5 && health.error_rate < 0.5;
        health.last_check = now;
        health.message = if success { None } else { message };
    }

    pub fn metrics(&self) -> Metrics {
        self.lock().metrics.clone()
    }

    /// Snapshot of the current health; freshens `last_check`.
    pub fn health(&self) -> HealthCheck {
        let mut state = self.lock();
        state.health.last_check = now_ms();
        state.health.clone()
    }

    pub fn reset(&self) {
        *self.lock() = TrackerState::fresh();
    }

    pub fn performance_score(&self, capabilities: &Capabilities) -> f64 {
        let state = self.lock();
        performance_score(capabilities, &state.metrics, &state.health)
    }
}

/// Weighted 0-100 blend: success rate 40, speed 30, cost 20, availability 10.
///
/// Speed uses the measured average once any attempt exists and the declared
/// baseline before that.
pub fn performance_score(capabilities: &Capabilities, metrics: &Metrics, health: &HealthCheck) -> f64 {
    let avg = if metrics.request_count > 0 {
        metrics.avg_response_time
    } else {
        capabilities.avg_response_time as f64
    };
    let speed = (1.0 - avg / SPEED_CEILING_MS).clamp(0.0, 1.0);
    let cost = (1.0 - capabilities.cost_per_request / COST_CEILING).clamp(0.0, 1.0);
    let available = if health.is_healthy { 1.0 } else { 0.0 };

    (metrics.success_rate * 40.0 + speed * 30.0 + cost * 20.0 + available * 10.0).clamp(0.0, 100.0)
}
