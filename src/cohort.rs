//! Cohort projection
//!
//! Maps each student to the active actions they performed. The projection
//! runs over the entire statement set restricted to active actions, not just
//! the discovered window, so participation before or after the window
//! boundary counts too.

use std::collections::HashSet;

use crate::types::{CohortActivity, Event, SlidingWindow};

/// Projector deriving per-student activity from a discovered window
pub struct CohortProjector;

impl CohortProjector {
    /// Project the cohort's activity onto the active-action set.
    ///
    /// Each student maps to the distinct active-action ids they performed,
    /// in first-seen order. With a `student_id` scope only that student's
    /// entry is kept; a student with no active-action events is simply
    /// omitted.
    pub fn project(
        sliding_window: &SlidingWindow,
        events: &[Event],
        student_id: Option<&str>,
    ) -> CohortActivity {
        let active_iris: HashSet<&str> = sliding_window
            .active_actions
            .iter()
            .map(|a| a.iri.as_str())
            .collect();

        let mut projection = CohortActivity::new();
        for event in events {
            if !active_iris.contains(event.object_id.as_str()) {
                continue;
            }
            if let Some(scope) = student_id {
                if event.actor_id != scope {
                    continue;
                }
            }
            let actions = projection.entry(event.actor_id.clone()).or_default();
            if !actions.contains(&event.object_id) {
                actions.push(event.object_id.clone());
            }
        }
        projection
    }
}
