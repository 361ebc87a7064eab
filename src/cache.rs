//! Sliding window memoization
//!
//! Window discovery is a pure function of its inputs, so results can be
//! memoized by the tuple that determines them: course, cutoff date and
//! thresholds. The cache is an optimization only; a hit is
//! indistinguishable from recomputation.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::error::IndicatorError;
use crate::types::SlidingWindow;

/// Key identifying one window computation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub course_id: String,
    pub until: NaiveDate,
    pub sliding_window_min: u32,
    pub active_actions_min: usize,
    pub dynamic_cohort_min: usize,
}

impl CacheKey {
    pub fn new(course_id: &str, until: NaiveDate, config: &EngineConfig) -> Self {
        Self {
            course_id: course_id.to_string(),
            until,
            sliding_window_min: config.sliding_window_min,
            active_actions_min: config.active_actions_min,
            dynamic_cohort_min: config.dynamic_cohort_min,
        }
    }
}

/// In-memory store of computed window results
#[derive(Debug, Clone, Default)]
pub struct WindowCache {
    entries: HashMap<CacheKey, SlidingWindow>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `key`, computing and storing it on a miss
    pub fn get_or_compute<F>(
        &mut self,
        key: CacheKey,
        compute: F,
    ) -> Result<SlidingWindow, IndicatorError>
    where
        F: FnOnce() -> Result<SlidingWindow, IndicatorError>,
    {
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.clone());
        }
        let result = compute()?;
        self.entries.insert(key, result.clone());
        Ok(result)
    }

    /// Number of memoized results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all memoized results
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;

    fn key(course: &str, config: &EngineConfig) -> CacheKey {
        CacheKey::new(course, factory::until(), config)
    }

    #[test]
    fn test_miss_computes_and_stores() {
        let mut cache = WindowCache::new();
        let config = EngineConfig::default();

        let result = cache
            .get_or_compute(key("course:101", &config), || {
                Ok(SlidingWindow::degenerate(factory::until()))
            })
            .unwrap();

        assert!(result.is_degenerate());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_hit_skips_recomputation() {
        let mut cache = WindowCache::new();
        let config = EngineConfig::default();
        let mut calls = 0;

        for _ in 0..3 {
            cache
                .get_or_compute(key("course:101", &config), || {
                    calls += 1;
                    Ok(SlidingWindow::degenerate(factory::until()))
                })
                .unwrap();
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut cache = WindowCache::new();
        let config = EngineConfig::default();

        let result = cache.get_or_compute(key("course:101", &config), || {
            Err(IndicatorError::NoStatements("empty".to_string()))
        });

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_thresholds_separate_entries() {
        let mut cache = WindowCache::new();
        let defaults = EngineConfig::default();
        let strict = EngineConfig::with_thresholds(30, 10, 5);

        for config in [&defaults, &strict] {
            cache
                .get_or_compute(key("course:101", config), || {
                    Ok(SlidingWindow::degenerate(factory::until()))
                })
                .unwrap();
        }

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut cache = WindowCache::new();
        let config = EngineConfig::default();
        cache
            .get_or_compute(key("course:101", &config), || {
                Ok(SlidingWindow::degenerate(factory::until()))
            })
            .unwrap();

        cache.clear();
        assert!(cache.is_empty());
    }
}
