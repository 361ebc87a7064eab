//! Grade composition
//!
//! Pivots graded statements into a student x activity matrix restricted to
//! the gradable active actions. A student holding more than one grade for
//! the same activity is a data-quality fault upstream and fails the
//! computation instead of being silently collapsed.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::IndicatorError;
use crate::types::{Action, Event, Grades, SlidingWindow};

/// Composer deriving grade matrices from a window result
pub struct GradesComposer;

impl GradesComposer {
    /// Compose grades for the cohort or one student.
    ///
    /// Only activity-category active actions are considered; an activity
    /// nobody was graded on is dropped from the output. `average` only
    /// applies to whole-cohort requests and skips missing cells.
    pub fn compose(
        sliding_window: &SlidingWindow,
        events: &[Event],
        student_id: Option<&str>,
        average: bool,
    ) -> Result<Grades, IndicatorError> {
        let gradable: Vec<&Action> = sliding_window
            .active_actions
            .iter()
            .filter(|a| a.category.is_some_and(|c| c.is_gradable()))
            .collect();
        let gradable_iris: HashSet<&str> = gradable.iter().map(|a| a.iri.as_str()).collect();

        // Pivot: student -> activity -> grade, duplicates fail loudly
        let mut pivot: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
        let mut columns: BTreeSet<&str> = BTreeSet::new();
        for event in events {
            if !gradable_iris.contains(event.object_id.as_str()) {
                continue;
            }
            if let Some(scope) = student_id {
                if event.actor_id != scope {
                    continue;
                }
            }
            let Some(score) = event.score else {
                continue;
            };
            let row = pivot.entry(event.actor_id.as_str()).or_default();
            if row.insert(event.object_id.as_str(), score).is_some() {
                return Err(IndicatorError::AmbiguousGrade {
                    student: event.actor_id.clone(),
                    action: event.object_id.clone(),
                });
            }
            columns.insert(event.object_id.as_str());
        }

        let grades: BTreeMap<String, Vec<Option<f64>>> = pivot
            .iter()
            .map(|(actor, row)| {
                let cells = columns
                    .iter()
                    .map(|column| row.get(column).copied())
                    .collect();
                (actor.to_string(), cells)
            })
            .collect();

        // Every reported column carries at least one grade by construction
        let actions: Vec<Action> = columns
            .iter()
            .filter_map(|column| gradable.iter().find(|a| a.iri == *column))
            .map(|a| (*a).clone())
            .collect();

        let average =
            (average && student_id.is_none()).then(|| column_means(&grades, columns.len()));

        Ok(Grades {
            actions,
            grades,
            average,
        })
    }
}

/// Column-wise means over present grades only
fn column_means(grades: &BTreeMap<String, Vec<Option<f64>>>, width: usize) -> Vec<f64> {
    let mut sums = vec![0.0; width];
    let mut counts = vec![0usize; width];
    for row in grades.values() {
        for (index, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                sums[index] += value;
                counts[index] += 1;
            }
        }
    }
    sums.iter()
        .zip(&counts)
        .map(|(sum, count)| if *count > 0 { sum / *count as f64 } else { 0.0 })
        .collect()
}
