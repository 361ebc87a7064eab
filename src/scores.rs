//! Score composition
//!
//! Builds the signed participation matrix over active actions: performing an
//! active action earns its activation rate, skipping it costs the same
//! amount. Cohort-wide aggregates are suppressed whenever a single student
//! is requested.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::types::{Action, CohortActivity, Scores, SlidingWindow};

/// Composer deriving scores from a window result and a cohort projection
pub struct ScoresComposer;

impl ScoresComposer {
    /// Compose scores for the cohort or one student.
    ///
    /// A requested student absent from the projection gets the defined
    /// fallback row: the negated activation rate of every active action.
    /// `totals`/`average` only apply to whole-cohort requests.
    pub fn compose(
        sliding_window: &SlidingWindow,
        cohort: &CohortActivity,
        student_id: Option<&str>,
        totals: bool,
        average: bool,
    ) -> Scores {
        let active_actions = &sliding_window.active_actions;

        if let Some(student) = student_id {
            if !cohort.contains_key(student) {
                let row: Vec<f64> = active_actions.iter().map(|a| -a.activation_rate).collect();
                return Scores {
                    actions: active_actions.clone(),
                    scores: BTreeMap::from([(student.to_string(), row)]),
                    total: None,
                    average: None,
                };
            }
        }

        let scope: CohortActivity = match student_id {
            Some(student) => cohort
                .iter()
                .filter(|(actor, _)| actor.as_str() == student)
                .map(|(actor, actions)| (actor.clone(), actions.clone()))
                .collect(),
            None => cohort.clone(),
        };

        // Columns: the sorted union of action ids the scope referenced
        let columns: Vec<&str> = scope
            .values()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rates: HashMap<&str, f64> = active_actions
            .iter()
            .map(|a| (a.iri.as_str(), a.activation_rate))
            .collect();

        // Active actions nobody in scope referenced keep their
        // first-discovered order after the referenced columns, so rows stay
        // aligned with the full action list
        let unreferenced: Vec<&Action> = active_actions
            .iter()
            .filter(|a| !columns.contains(&a.iri.as_str()))
            .collect();

        let mut scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (actor, actions) in &scope {
            let mut row: Vec<f64> = columns
                .iter()
                .map(|column| {
                    let rate = rates.get(column).copied().unwrap_or_default();
                    if actions.iter().any(|a| a == column) {
                        rate
                    } else {
                        -rate
                    }
                })
                .collect();
            row.extend(unreferenced.iter().map(|a| -a.activation_rate));
            scores.insert(actor.clone(), row);
        }

        let mut actions: Vec<Action> = columns
            .iter()
            .filter_map(|column| active_actions.iter().find(|a| a.iri == *column))
            .cloned()
            .collect();
        actions.extend(unreferenced.into_iter().cloned());

        let total = (totals && student_id.is_none()).then(|| column_sums(&scores, actions.len()));
        let average =
            (average && student_id.is_none()).then(|| column_means(&scores, actions.len()));

        Scores {
            actions,
            scores,
            total,
            average,
        }
    }
}

/// Column-wise sums over the score rows
fn column_sums(scores: &BTreeMap<String, Vec<f64>>, width: usize) -> Vec<f64> {
    let mut sums = vec![0.0; width];
    for row in scores.values() {
        for (sum, value) in sums.iter_mut().zip(row) {
            *sum += value;
        }
    }
    sums
}

/// Column-wise means over the score rows
fn column_means(scores: &BTreeMap<String, Vec<f64>>, width: usize) -> Vec<f64> {
    if scores.is_empty() {
        return vec![0.0; width];
    }
    let count = scores.len() as f64;
    column_sums(scores, width)
        .into_iter()
        .map(|sum| sum / count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::CohortProjector;
    use crate::config::EngineConfig;
    use crate::factory::{self, action_iri, student_id};
    use crate::types::{Event, Window};
    use crate::window::SlidingWindowEngine;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn reference() -> (Vec<Event>, SlidingWindow, CohortActivity) {
        let until = factory::until();
        let events = factory::course_events(until);
        let window = SlidingWindowEngine::compute(
            &events,
            until,
            &EngineConfig::with_thresholds(15, 6, 3),
        )
        .unwrap();
        let cohort = CohortProjector::project(&window, &events, None);
        (events, window, cohort)
    }

    fn make_action(iri: &str, rate: f64) -> Action {
        Action {
            iri: iri.to_string(),
            name: iri.to_string(),
            category: None,
            activation_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            activation_rate: rate,
            activation_students: vec![],
        }
    }

    #[test]
    fn test_cohort_scores_signed_by_participation() {
        let (_, window, cohort) = reference();
        let scores = ScoresComposer::compose(&window, &cohort, None, false, false);

        assert_eq!(scores.scores.len(), 9);
        let row = scores.scores.get("student_1").unwrap();
        assert_eq!(row, &vec![0.3, 0.3, -0.3, 0.3, -0.3, -0.3]);
        assert!(scores.total.is_none());
        assert!(scores.average.is_none());
    }

    #[test]
    fn test_score_magnitude_matches_activation_rate() {
        let (_, window, cohort) = reference();
        let scores = ScoresComposer::compose(&window, &cohort, None, false, false);

        let rates: Vec<f64> = scores.actions.iter().map(|a| a.activation_rate).collect();
        for row in scores.scores.values() {
            assert_eq!(row.len(), scores.actions.len());
            for (value, rate) in row.iter().zip(&rates) {
                assert!((value.abs() - rate).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_aggregates_for_cohort_request() {
        let (_, window, cohort) = reference();
        let scores = ScoresComposer::compose(&window, &cohort, None, true, true);

        // Every action has 3 participants out of 9 projected students
        for total in scores.total.unwrap() {
            assert!((total - (-0.9)).abs() < 1e-9);
        }
        for average in scores.average.unwrap() {
            assert!((average - (-0.1)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_student_suppresses_aggregates() {
        let (_, window, cohort) = reference();
        let student = student_id(2);
        let scores = ScoresComposer::compose(&window, &cohort, Some(&student), true, true);

        assert!(scores.total.is_none());
        assert!(scores.average.is_none());
        assert_eq!(scores.scores.len(), 1);
    }

    #[test]
    fn test_single_student_row_stays_aligned() {
        let (_, window, cohort) = reference();
        let student = student_id(7);
        let scores = ScoresComposer::compose(&window, &cohort, Some(&student), false, false);

        let row = scores.scores.get("student_7").unwrap();
        assert_eq!(row.len(), scores.actions.len());
        // The one action student_7 performed leads; the rest follow in
        // first-discovered order with negated rates
        assert_eq!(scores.actions[0].iri, action_iri(6));
        assert_eq!(row[0], 0.3);
        for value in &row[1..] {
            assert_eq!(*value, -0.3);
        }
    }

    #[test]
    fn test_inactive_student_fallback() {
        let (_, window, cohort) = reference();
        let scores = ScoresComposer::compose(&window, &cohort, Some("student_10"), true, true);

        assert_eq!(scores.scores.len(), 1);
        let row = scores.scores.get("student_10").unwrap();
        let expected: Vec<f64> = window
            .active_actions
            .iter()
            .map(|a| -a.activation_rate)
            .collect();
        assert_eq!(row, &expected);
        assert!(scores.total.is_none());
        assert!(scores.average.is_none());
    }

    #[test]
    fn test_actions_re_sorted_to_column_order() {
        let until = factory::until();
        let window = SlidingWindow {
            window: Window {
                since: until,
                until,
            },
            active_actions: vec![make_action("b", 0.5), make_action("a", 0.25)],
            dynamic_cohort: vec![student_id(1)],
        };
        let cohort =
            CohortActivity::from([(student_id(1), vec!["b".to_string(), "a".to_string()])]);

        let scores = ScoresComposer::compose(&window, &cohort, None, false, false);

        let iris: Vec<&str> = scores.actions.iter().map(|a| a.iri.as_str()).collect();
        assert_eq!(iris, vec!["a", "b"]);
        assert_eq!(scores.scores.get("student_1").unwrap(), &vec![0.25, 0.5]);
    }

    #[test]
    fn test_degenerate_window_yields_empty_scores() {
        let window = SlidingWindow::degenerate(factory::until());
        let cohort = CohortActivity::new();
        let scores = ScoresComposer::compose(&window, &cohort, None, true, true);

        assert!(scores.actions.is_empty());
        assert!(scores.scores.is_empty());
        assert_eq!(scores.total, Some(vec![]));
        assert_eq!(scores.average, Some(vec![]));
    }
}
