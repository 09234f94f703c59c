//! Priority scoring and candidate ordering
//!
//! Lower score wins. Cost and speed rank by ascending estimate; quality
//! ranks by negated score so the ascending sort still applies. Specialists
//! for the classified prompt type get a 10% boost.

use serde::{Deserialize, Serialize};
use switchboard_config::{ProviderSpec, Specialty};

/// Boost multiplier for cost/speed scores (smaller is better)
const COST_SPEED_BOOST: f64 = 0.9;

/// Boost multiplier for quality scores (more negative is better)
const QUALITY_BOOST: f64 = 1.1;

/// What the caller wants optimized when ranking providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Cost,
    Speed,
    Quality,
}

/// A provider that survived availability and budget filtering
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Provider name (config key)
    pub name: String,
    /// Static specification
    pub spec: ProviderSpec,
    /// Estimated cost of this prompt on this provider
    pub estimated_cost: f64,
}

impl Candidate {
    fn score(&self, priority: Priority, prompt_kind: Specialty) -> f64 {
        let base = match priority {
            Priority::Cost => self.estimated_cost,
            Priority::Speed => self.spec.latency_ms as f64,
            Priority::Quality => -self.spec.quality_score,
        };

        if self.spec.specialties.contains(&prompt_kind) {
            match priority {
                Priority::Cost | Priority::Speed => base * COST_SPEED_BOOST,
                Priority::Quality => base * QUALITY_BOOST,
            }
        } else {
            base
        }
    }
}

/// Order candidates best-first for the given priority and prompt type
///
/// The sort is stable, so candidates with equal scores keep their input
/// (configuration) order and the result is deterministic.
pub fn rank(mut candidates: Vec<Candidate>, priority: Priority, prompt_kind: Specialty) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        a.score(priority, prompt_kind)
            .partial_cmp(&b.score(priority, prompt_kind))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}
