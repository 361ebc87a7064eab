//! Indicator orchestration
//!
//! This module provides the public API of coursepulse. Each entry point
//! resolves the course's actions, gathers and normalizes their statements,
//! reuses the memoized sliding window and runs the matching composer:
//! 1. CourseIndex - resolve course actions
//! 2. EventStore - read raw statements per action
//! 3. StatementNormalizer - normalize to events
//! 4. SlidingWindowEngine - discover the window (memoized)
//! 5. Composers - cohort, scores, grades

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::cache::{CacheKey, WindowCache};
use crate::cohort::CohortProjector;
use crate::config::EngineConfig;
use crate::error::IndicatorError;
use crate::grades::GradesComposer;
use crate::normalizer::StatementNormalizer;
use crate::scores::ScoresComposer;
use crate::source::{CourseIndex, EventStore};
use crate::types::{CohortActivity, Event, Grades, Scores, SlidingWindow};
use crate::window::SlidingWindowEngine;

/// Stateful processor computing indicators for courses.
///
/// Entry points are pure functions of their inputs; the processor only adds
/// window memoization across calls.
pub struct IndicatorProcessor<S, I> {
    store: S,
    index: I,
    config: EngineConfig,
    cache: WindowCache,
}

impl<S: EventStore, I: CourseIndex> IndicatorProcessor<S, I> {
    /// Create a processor with default thresholds
    pub fn new(store: S, index: I) -> Self {
        Self::with_config(store, index, EngineConfig::default())
    }

    /// Create a processor with an explicit configuration
    pub fn with_config(store: S, index: I, config: EngineConfig) -> Self {
        Self {
            store,
            index,
            config,
            cache: WindowCache::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of memoized window results
    pub fn cached_windows(&self) -> usize {
        self.cache.len()
    }

    /// Drop all memoized window results
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Compute the sliding window indicator
    pub fn window(
        &mut self,
        course_id: &str,
        until: Option<NaiveDate>,
    ) -> Result<SlidingWindow, IndicatorError> {
        let until = resolve_until(until);
        debug!(course_id, %until, "Start computing 'window' indicator");
        let events = self.gather_events(course_id, until)?;
        let result = self.window_for(course_id, until, &events)?;
        debug!(course_id, "Finish computing 'window' indicator");
        Ok(result)
    }

    /// Compute the per-student active-action lists
    pub fn cohort(
        &mut self,
        course_id: &str,
        until: Option<NaiveDate>,
        student_id: Option<&str>,
    ) -> Result<CohortActivity, IndicatorError> {
        let until = resolve_until(until);
        debug!(course_id, %until, "Start computing 'cohort' indicator");
        let events = self.gather_events(course_id, until)?;
        let window = self.window_for(course_id, until, &events)?;
        let cohort = CohortProjector::project(&window, &events, student_id);
        debug!(course_id, "Finish computing 'cohort' indicator");
        Ok(cohort)
    }

    /// Compute scores on active actions for the cohort or one student
    pub fn scores(
        &mut self,
        course_id: &str,
        until: Option<NaiveDate>,
        student_id: Option<&str>,
        totals: bool,
        average: bool,
    ) -> Result<Scores, IndicatorError> {
        let until = resolve_until(until);
        debug!(course_id, %until, "Start computing 'scores' indicator");
        let events = self.gather_events(course_id, until)?;
        let window = self.window_for(course_id, until, &events)?;
        let cohort = CohortProjector::project(&window, &events, student_id);
        let scores = ScoresComposer::compose(&window, &cohort, student_id, totals, average);
        debug!(course_id, "Finish computing 'scores' indicator");
        Ok(scores)
    }

    /// Compute grades on gradable active activities
    pub fn grades(
        &mut self,
        course_id: &str,
        until: Option<NaiveDate>,
        student_id: Option<&str>,
        average: bool,
    ) -> Result<Grades, IndicatorError> {
        let until = resolve_until(until);
        debug!(course_id, %until, "Start computing 'grades' indicator");
        let events = self.gather_events(course_id, until)?;
        let window = self.window_for(course_id, until, &events)?;
        let grades = GradesComposer::compose(&window, &events, student_id, average)?;
        debug!(course_id, "Finish computing 'grades' indicator");
        Ok(grades)
    }

    /// Read and normalize every statement related to the course's actions
    fn gather_events(
        &self,
        course_id: &str,
        until: NaiveDate,
    ) -> Result<Vec<Event>, IndicatorError> {
        let actions = self.index.related_actions(course_id)?;
        let mut statements = Vec::new();
        for action in &actions {
            statements.extend(self.store.read_statements(action, until)?);
        }
        StatementNormalizer::normalize(&statements, self.config.preferred_language.as_deref())
    }

    /// Discover the sliding window, reusing a memoized result when one exists
    fn window_for(
        &mut self,
        course_id: &str,
        until: NaiveDate,
        events: &[Event],
    ) -> Result<SlidingWindow, IndicatorError> {
        let key = CacheKey::new(course_id, until, &self.config);
        let config = self.config.clone();
        self.cache
            .get_or_compute(key, || SlidingWindowEngine::compute(events, until, &config))
    }
}

/// Default the cutoff to today when the caller gave none
fn resolve_until(until: Option<NaiveDate>) -> NaiveDate {
    until.unwrap_or_else(|| Utc::now().date_naive())
}
