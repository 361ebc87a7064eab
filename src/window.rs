//! Sliding window discovery
//!
//! The central algorithm: starting from the minimum window width, expand a
//! trailing date window backwards one day at a time until it contains enough
//! active actions and a large enough cohort. An action activates once enough
//! of the windowed cohort has performed it; once active it stays active.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::IndicatorError;
use crate::types::{Action, Event, ModuleCategory, SlidingWindow, Window};

/// Fraction of the windowed cohort an action must reach to activate,
/// on top of the absolute `dynamic_cohort_min` floor
const COHORT_ACTIVATION_FRACTION: f64 = 0.1;

/// An action recorded during the search, before activation enrichment
#[derive(Debug, Clone)]
struct Candidate {
    iri: String,
    name: String,
    category: Option<ModuleCategory>,
}

/// Engine discovering the sliding window and its active actions
pub struct SlidingWindowEngine;

impl SlidingWindowEngine {
    /// Discover the narrowest trailing window ending at `until`.
    ///
    /// Preconditions are checked against the entire event set before the
    /// search begins; each failure maps to its own [`IndicatorError`]
    /// variant. Exhausting the date range without enough active actions is
    /// not an error: the result is the degenerate `[until, until]` window
    /// with no actions and no cohort.
    pub fn compute(
        events: &[Event],
        until: NaiveDate,
        config: &EngineConfig,
    ) -> Result<SlidingWindow, IndicatorError> {
        let earliest = check_preconditions(events, until, config)?;

        let mut since = until - Duration::days(i64::from(config.sliding_window_min));
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut candidate_iris: HashSet<String> = HashSet::new();

        while since >= earliest {
            let windowed: Vec<&Event> = events.iter().filter(|e| e.date >= since).collect();
            if windowed.is_empty() {
                // An empty day is skipped, not fatal
                since -= Duration::days(1);
                continue;
            }

            let cohort = distinct_actors(windowed.iter().map(|e| e.actor_id.as_str()));
            let cohort_size = cohort.len();

            for (key, participants) in group_participants(&windowed) {
                if candidate_iris.contains(&key.0) {
                    continue;
                }
                let count = participants.len();
                if count >= config.dynamic_cohort_min
                    && count as f64 >= COHORT_ACTIVATION_FRACTION * cohort_size as f64
                {
                    debug!(iri = %key.0, participants = count, since = %since, "Action activated");
                    candidate_iris.insert(key.0.clone());
                    candidates.push(Candidate {
                        iri: key.0,
                        name: key.1,
                        category: key.2,
                    });
                }
            }

            if candidates.len() < config.active_actions_min {
                since -= Duration::days(1);
            } else {
                debug!(
                    since = %since,
                    active_actions = candidates.len(),
                    cohort = cohort_size,
                    "Sliding window discovered"
                );
                return Ok(SlidingWindow {
                    window: Window { since, until },
                    active_actions: compute_activation(events, &candidates, cohort_size),
                    dynamic_cohort: cohort,
                });
            }
        }

        debug!(until = %until, "Search exhausted the date range");
        Ok(SlidingWindow::degenerate(until))
    }
}

/// Validate the event set against the configured thresholds and return the
/// earliest event date
fn check_preconditions(
    events: &[Event],
    until: NaiveDate,
    config: &EngineConfig,
) -> Result<NaiveDate, IndicatorError> {
    let earliest = events
        .iter()
        .map(|e| e.date)
        .min()
        .ok_or_else(|| IndicatorError::NoStatements("no statements have been found".to_string()))?;

    if (until - earliest).num_days() < i64::from(config.sliding_window_min) {
        return Err(IndicatorError::InsufficientTimeSpread {
            required: config.sliding_window_min,
        });
    }

    let actions: HashSet<&str> = events.iter().map(|e| e.object_id.as_str()).collect();
    if actions.len() < config.active_actions_min {
        return Err(IndicatorError::InsufficientActionDiversity {
            required: config.active_actions_min,
        });
    }

    let actors: HashSet<&str> = events.iter().map(|e| e.actor_id.as_str()).collect();
    if actors.len() < config.dynamic_cohort_min {
        return Err(IndicatorError::InsufficientCohortSize {
            required: config.dynamic_cohort_min,
        });
    }

    Ok(earliest)
}

/// Group windowed events by action and collect the distinct actors behind
/// each group, in ascending group-key order
fn group_participants<'a>(
    windowed: &[&'a Event],
) -> BTreeMap<(String, String, Option<ModuleCategory>), HashSet<&'a str>> {
    let mut groups: BTreeMap<(String, String, Option<ModuleCategory>), HashSet<&str>> =
        BTreeMap::new();
    for event in windowed {
        groups
            .entry((
                event.object_id.clone(),
                event.object_name.clone(),
                event.category,
            ))
            .or_default()
            .insert(event.actor_id.as_str());
    }
    groups
}

/// Distinct actor ids in first-seen order
fn distinct_actors<'a>(actors: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for actor in actors {
        if seen.insert(actor) {
            ordered.push(actor.to_string());
        }
    }
    ordered
}

/// Enrich the recorded candidates with activation information computed over
/// the entire (unwindowed) event set
fn compute_activation(
    events: &[Event],
    candidates: &[Candidate],
    dynamic_cohort_size: usize,
) -> Vec<Action> {
    candidates
        .iter()
        .map(|candidate| {
            let action_events: Vec<&Event> = events
                .iter()
                .filter(|e| e.object_id == candidate.iri)
                .collect();

            // Candidates come from grouped events, so at least one exists
            let activation_date = action_events
                .iter()
                .map(|e| e.date)
                .min()
                .unwrap_or(NaiveDate::MAX);
            let activation_students =
                distinct_actors(action_events.iter().map(|e| e.actor_id.as_str()));
            // Lifetime participation can exceed the window cohort; cap it
            let activation_rate =
                (activation_students.len() as f64 / dynamic_cohort_size as f64).min(1.0);

            Action {
                iri: candidate.iri.clone(),
                name: candidate.name.clone(),
                category: candidate.category,
                activation_date,
                activation_rate,
                activation_students,
            }
        })
        .collect()
}
