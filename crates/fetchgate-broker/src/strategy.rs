use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use fetchgate_providers::{Capabilities, Priority, Provider};
use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

/// Ranking policy applied to the candidates of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Free providers first, then ascending cost.
    #[default]
    CostOptimized,
    /// Ascending declared baseline response time.
    SpeedOptimized,
    /// Descending performance score.
    ReliabilityFirst,
    /// Script-capable providers first, each group by descending score.
    JavascriptFirst,
    /// Script-capable providers first only when the request needs scripts,
    /// each group by ascending cost.
    Adaptive,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::CostOptimized,
        Strategy::SpeedOptimized,
        Strategy::ReliabilityFirst,
        Strategy::JavascriptFirst,
        Strategy::Adaptive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::CostOptimized => "cost-optimized",
            Strategy::SpeedOptimized => "speed-optimized",
            Strategy::ReliabilityFirst => "reliability-first",
            Strategy::JavascriptFirst => "javascript-first",
            Strategy::Adaptive => "adaptive",
        }
    }

    /// Stable sort: candidates that compare equal keep their input order.
    pub fn rank(self, candidates: &mut [Candidate], needs_javascript: bool) {
        match self {
            Strategy::CostOptimized => candidates.sort_by(by_cost),
            Strategy::SpeedOptimized => {
                candidates.sort_by_key(|candidate| candidate.capabilities.avg_response_time);
            }
            Strategy::ReliabilityFirst => candidates.sort_by(by_score_desc),
            Strategy::JavascriptFirst => {
                candidates.sort_by(|a, b| by_javascript(a, b).then_with(|| by_score_desc(a, b)));
            }
            Strategy::Adaptive if needs_javascript => {
                candidates.sort_by(|a, b| by_javascript(a, b).then_with(|| by_cost(a, b)));
            }
            Strategy::Adaptive => candidates.sort_by(by_cost),
        }
    }
}

impl From<Priority> for Strategy {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Speed => Strategy::SpeedOptimized,
            Priority::Cost => Strategy::CostOptimized,
            Priority::Reliability => Strategy::ReliabilityFirst,
        }
    }
}

impl FromStr for Strategy {
    type Err = BrokerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase().replace('_', "-");
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| BrokerError::Config(format!("unknown strategy `{value}`")))
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider plus the capability and score snapshot it is ranked on.
#[derive(Clone)]
pub struct Candidate {
    pub provider: Arc<dyn Provider>,
    pub capabilities: Capabilities,
    pub score: f64,
}

impl Candidate {
    pub fn snapshot(provider: Arc<dyn Provider>) -> Self {
        let capabilities = *provider.capabilities();
        let score = provider.performance_score();
        Self {
            provider,
            capabilities,
            score,
        }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name())
            .field("capabilities", &self.capabilities)
            .field("score", &self.score)
            .finish()
    }
}

/// Moves the preferred providers to the front, in the order they are listed.
pub fn prefer(candidates: Vec<Candidate>, preferred: &[String]) -> Vec<Candidate> {
    if preferred.is_empty() {
        return candidates;
    }
    let mut rest = candidates;
    let mut front = Vec::with_capacity(rest.len());
    for name in preferred {
        if let Some(position) = rest.iter().position(|candidate| candidate.name() == name) {
            front.push(rest.remove(position));
        }
    }
    front.extend(rest);
    front
}

fn by_cost(a: &Candidate, b: &Candidate) -> Ordering {
    b.capabilities
        .is_free()
        .cmp(&a.capabilities.is_free())
        .then_with(|| {
            a.capabilities
                .cost_per_request
                .partial_cmp(&b.capabilities.cost_per_request)
                .unwrap_or(Ordering::Equal)
        })
}

fn by_score_desc(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
}

fn by_javascript(a: &Candidate, b: &Candidate) -> Ordering {
    b.capabilities
        .supports_javascript
        .cmp(&a.capabilities.supports_javascript)
}
