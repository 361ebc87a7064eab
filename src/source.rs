//! Event store and course index boundaries
//!
//! The core consumes two external capabilities behind traits: a statement
//! store queried once per course action, and a content index resolving a
//! course to its action identifiers. In-memory implementations back the CLI
//! and tests; network-backed implementations own their retries and timeouts
//! and surface failures as [`IndicatorError::EventSourceUnavailable`].

use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;

use crate::error::IndicatorError;
use crate::statement::{parse_statements, RawStatement};

/// Store of raw statements, queried per course action
pub trait EventStore {
    /// Return every statement on `action_iri` occurring before the midnight
    /// following `until`
    fn read_statements(
        &self,
        action_iri: &str,
        until: NaiveDate,
    ) -> Result<Vec<RawStatement>, IndicatorError>;
}

/// Index resolving a course to its related action identifiers
pub trait CourseIndex {
    /// Return the action iris belonging to `course_id`.
    ///
    /// An unindexed course fails with [`IndicatorError::UnknownCourse`]; a
    /// course with no related content with
    /// [`IndicatorError::NoCourseContent`].
    fn related_actions(&self, course_id: &str) -> Result<Vec<String>, IndicatorError>;
}

/// In-memory event store over a fixed statement set
#[derive(Debug, Clone, Default)]
pub struct StaticEventStore {
    statements: Vec<RawStatement>,
}

impl StaticEventStore {
    pub fn new(statements: Vec<RawStatement>) -> Self {
        Self { statements }
    }

    /// Load a store from a JSON array of statements
    pub fn from_json(json: &str) -> Result<Self, IndicatorError> {
        Ok(Self::new(parse_statements(json)?))
    }

    /// Distinct action iris present in the store, in first-seen order
    pub fn action_iris(&self) -> Vec<String> {
        let mut iris: Vec<String> = Vec::new();
        for statement in &self.statements {
            if !iris.contains(&statement.object.id) {
                iris.push(statement.object.id.clone());
            }
        }
        iris
    }
}

impl EventStore for StaticEventStore {
    fn read_statements(
        &self,
        action_iri: &str,
        until: NaiveDate,
    ) -> Result<Vec<RawStatement>, IndicatorError> {
        Ok(self
            .statements
            .iter()
            .filter(|s| s.object.id == action_iri)
            .filter(|s| {
                // Unparseable timestamps pass through; the normalizer
                // reports them properly
                DateTime::parse_from_rfc3339(&s.timestamp)
                    .map(|ts| ts.date_naive() <= until)
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }
}

/// In-memory course index over a fixed course -> actions map
#[derive(Debug, Clone, Default)]
pub struct StaticCourseIndex {
    courses: BTreeMap<String, Vec<String>>,
}

impl StaticCourseIndex {
    pub fn new(courses: BTreeMap<String, Vec<String>>) -> Self {
        Self { courses }
    }

    /// Index holding a single course and its actions
    pub fn single_course(course_id: impl Into<String>, actions: Vec<String>) -> Self {
        Self {
            courses: BTreeMap::from([(course_id.into(), actions)]),
        }
    }
}

impl CourseIndex for StaticCourseIndex {
    fn related_actions(&self, course_id: &str) -> Result<Vec<String>, IndicatorError> {
        let actions = self
            .courses
            .get(course_id)
            .ok_or_else(|| IndicatorError::UnknownCourse(course_id.to_string()))?;
        if actions.is_empty() {
            return Err(IndicatorError::NoCourseContent(course_id.to_string()));
        }
        Ok(actions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{self, action_iri};
    use chrono::Duration;

    #[test]
    fn test_store_filters_by_action() {
        let until = factory::until();
        let store = StaticEventStore::new(factory::course_statements(until));

        let statements = store.read_statements(&action_iri(1), until).unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements.iter().all(|s| s.object.id == action_iri(1)));
    }

    #[test]
    fn test_store_honors_cutoff() {
        let until = factory::until();
        let store = StaticEventStore::new(factory::course_statements(until));

        // Action 6 has statements 2, 4 and 16 days back; cut 5 days early
        let earlier = until - Duration::days(5);
        let statements = store.read_statements(&action_iri(6), earlier).unwrap();
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_store_action_iris_in_first_seen_order() {
        let until = factory::until();
        let store = StaticEventStore::new(factory::course_statements(until));

        let iris = store.action_iris();
        assert_eq!(iris.len(), 13);
        assert_eq!(iris[0], action_iri(1));
    }

    #[test]
    fn test_index_resolves_course() {
        let index = StaticCourseIndex::single_course("course:101", vec![action_iri(1)]);
        let actions = index.related_actions("course:101").unwrap();
        assert_eq!(actions, vec![action_iri(1)]);
    }

    #[test]
    fn test_index_unknown_course() {
        let index = StaticCourseIndex::default();
        let result = index.related_actions("course:404");
        assert!(matches!(result, Err(IndicatorError::UnknownCourse(_))));
    }

    #[test]
    fn test_index_empty_course() {
        let index = StaticCourseIndex::single_course("course:101", vec![]);
        let result = index.related_actions("course:101");
        assert!(matches!(result, Err(IndicatorError::NoCourseContent(_))));
    }
}
