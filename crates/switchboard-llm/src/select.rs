//! Availability filtering in front of the pure ranker
//!
//! Walks the provider table in config order, drops anything manually down,
//! over the request's cost cap, or refused by the breaker, then hands the
//! survivors to `switchboard_routing::rank`. Rate windows are not consulted
//! here: admission happens in the router right before invocation, so a
//! full-window skip is observable as a rate-limited attempt.

use std::collections::HashSet;

use indexmap::IndexMap;
use switchboard_config::{ClassifierConfig, ProviderSpec, Specialty};
use switchboard_routing::{Candidate, classify, estimate_cost, rank};

use crate::breaker::Admission;
use crate::store::StateStore;
use crate::types::RequestPreferences;

pub(crate) struct Selection {
    /// Admissible providers, best first
    pub candidates: Vec<Candidate>,
    /// Providers whose half-open probe slot this request holds; the caller
    /// must resolve or release every entry
    pub probes: HashSet<String>,
    pub prompt_kind: Specialty,
}

/// Filter and rank providers for one request
///
/// The breaker check runs last so probe slots are captured only for
/// providers that actually make the candidate list.
pub(crate) fn select_candidates(
    prompt: &str,
    prefs: &RequestPreferences,
    providers: &IndexMap<String, ProviderSpec>,
    keywords: &ClassifierConfig,
    store: &StateStore,
) -> Selection {
    let prompt_kind = classify(prompt, keywords);

    let mut survivors = Vec::new();
    let mut probes = HashSet::new();

    for (name, spec) in providers {
        if store.is_manual_down(name) {
            continue;
        }

        let estimated_cost = estimate_cost(spec, prompt);
        if let Some(cap) = prefs.max_cost_per_request
            && estimated_cost > cap
        {
            continue;
        }

        match store.breaker.try_admit(name) {
            Admission::Refused => continue,
            Admission::Probe => {
                probes.insert(name.clone());
            }
            Admission::Closed => {}
        }

        survivors.push(Candidate {
            name: name.clone(),
            spec: spec.clone(),
            estimated_cost,
        });
    }

    Selection {
        candidates: rank(survivors, prefs.priority, prompt_kind),
        probes,
        prompt_kind,
    }
}
