//! Engine configuration
//!
//! Thresholds driving window discovery, plus the display-name language
//! preference used during normalization.

use serde::{Deserialize, Serialize};

/// Minimum sliding window width in days
pub const DEFAULT_SLIDING_WINDOW_MIN: u32 = 15;

/// Minimum number of active actions a window must yield
pub const DEFAULT_ACTIVE_ACTIONS_MIN: usize = 6;

/// Minimum dynamic cohort size
pub const DEFAULT_DYNAMIC_COHORT_MIN: usize = 3;

/// Configuration for indicator computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum window width in days
    pub sliding_window_min: u32,
    /// Minimum number of active actions
    pub active_actions_min: usize,
    /// Minimum cohort size
    pub dynamic_cohort_min: usize,
    /// Preferred language tag for action display names.
    ///
    /// When the preferred tag is absent from a statement's localized name
    /// map, the first tag in lexicographic order is used instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sliding_window_min: DEFAULT_SLIDING_WINDOW_MIN,
            active_actions_min: DEFAULT_ACTIVE_ACTIONS_MIN,
            dynamic_cohort_min: DEFAULT_DYNAMIC_COHORT_MIN,
            preferred_language: None,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with explicit thresholds
    pub fn with_thresholds(
        sliding_window_min: u32,
        active_actions_min: usize,
        dynamic_cohort_min: usize,
    ) -> Self {
        Self {
            sliding_window_min,
            active_actions_min,
            dynamic_cohort_min,
            preferred_language: None,
        }
    }

    /// Set the preferred display-name language tag
    pub fn with_preferred_language(mut self, language: impl Into<String>) -> Self {
        self.preferred_language = Some(language.into());
        self
    }
}
