//! Core types for the coursepulse indicator pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized events, the discovered sliding window, and the derived
//! indicator records (cohort activity, scores, grades).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Course module category, identified by its LMS event name.
///
/// Activity modules carry grades; resource modules are consultation-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleCategory {
    // Activities (gradable)
    AssignmentSubmitted,
    AssignmentGraded,
    Feedback,
    ForumDiscussionCreated,
    ForumPostCreated,
    Quiz,
    ScormPackageLaunched,
    ScormRawSubmitted,
    ScormStatusSubmitted,

    // Resources (consultation)
    Book,
    Chat,
    Database,
    Folder,
    Forum,
    Glossary,
    ImsContentPackage,
    ExternalTool,
    Page,
    Url,
    Wiki,
}

impl ModuleCategory {
    /// Map an LMS event name to its category, if known
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            r"\mod_assign\event\assessable_submitted" => Some(Self::AssignmentSubmitted),
            r"\mod_assign\event\submission_graded" => Some(Self::AssignmentGraded),
            r"\mod_feedback\event\response_submitted" => Some(Self::Feedback),
            r"\mod_forum\event\discussion_created" => Some(Self::ForumDiscussionCreated),
            r"\mod_forum\event\post_created" => Some(Self::ForumPostCreated),
            r"\mod_quiz\event\attempt_submitted" => Some(Self::Quiz),
            r"\mod_scorm\event\sco_launched" => Some(Self::ScormPackageLaunched),
            r"\mod_scorm\event\scoreraw_submitted" => Some(Self::ScormRawSubmitted),
            r"\mod_scorm\event\status_submitted" => Some(Self::ScormStatusSubmitted),
            r"\mod_book\event\chapter_viewed" => Some(Self::Book),
            r"\mod_chat\event\course_module_viewed" => Some(Self::Chat),
            r"\mod_data\event\course_module_viewed" => Some(Self::Database),
            r"\mod_folder\event\course_module_viewed" => Some(Self::Folder),
            r"\mod_forum\event\discussion_viewed" => Some(Self::Forum),
            r"\mod_glossary\event\course_module_viewed" => Some(Self::Glossary),
            r"\mod_imscp\event\course_module_viewed" => Some(Self::ImsContentPackage),
            r"\mod_lti\event\course_module_viewed" => Some(Self::ExternalTool),
            r"\mod_page\event\course_module_viewed" => Some(Self::Page),
            r"\mod_url\event\course_module_viewed" => Some(Self::Url),
            r"\mod_wiki\event\course_module_viewed" => Some(Self::Wiki),
            _ => None,
        }
    }

    /// The LMS event name this category was mapped from
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::AssignmentSubmitted => r"\mod_assign\event\assessable_submitted",
            Self::AssignmentGraded => r"\mod_assign\event\submission_graded",
            Self::Feedback => r"\mod_feedback\event\response_submitted",
            Self::ForumDiscussionCreated => r"\mod_forum\event\discussion_created",
            Self::ForumPostCreated => r"\mod_forum\event\post_created",
            Self::Quiz => r"\mod_quiz\event\attempt_submitted",
            Self::ScormPackageLaunched => r"\mod_scorm\event\sco_launched",
            Self::ScormRawSubmitted => r"\mod_scorm\event\scoreraw_submitted",
            Self::ScormStatusSubmitted => r"\mod_scorm\event\status_submitted",
            Self::Book => r"\mod_book\event\chapter_viewed",
            Self::Chat => r"\mod_chat\event\course_module_viewed",
            Self::Database => r"\mod_data\event\course_module_viewed",
            Self::Folder => r"\mod_folder\event\course_module_viewed",
            Self::Forum => r"\mod_forum\event\discussion_viewed",
            Self::Glossary => r"\mod_glossary\event\course_module_viewed",
            Self::ImsContentPackage => r"\mod_imscp\event\course_module_viewed",
            Self::ExternalTool => r"\mod_lti\event\course_module_viewed",
            Self::Page => r"\mod_page\event\course_module_viewed",
            Self::Url => r"\mod_url\event\course_module_viewed",
            Self::Wiki => r"\mod_wiki\event\course_module_viewed",
        }
    }

    /// Whether this category carries a numeric grade
    pub fn is_gradable(&self) -> bool {
        matches!(
            self,
            Self::AssignmentSubmitted
                | Self::AssignmentGraded
                | Self::Feedback
                | Self::ForumDiscussionCreated
                | Self::ForumPostCreated
                | Self::Quiz
                | Self::ScormPackageLaunched
                | Self::ScormRawSubmitted
                | Self::ScormStatusSubmitted
        )
    }
}

/// One normalized learner activity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Student identifier
    pub actor_id: String,
    /// Action identifier (IRI)
    pub object_id: String,
    /// Action display name, selected from the localized name map
    pub object_name: String,
    /// Module category, when the event name is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ModuleCategory>,
    /// Full event timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// Calendar date, `timestamp` truncated to local midnight
    pub date: NaiveDate,
    /// Grade attached to the event, for graded activities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Closed date interval of the discovered sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

/// A discovered active action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Action identifier (IRI)
    pub iri: String,
    /// Display name
    pub name: String,
    /// Module category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ModuleCategory>,
    /// Earliest date anyone performed the action, over all statements
    pub activation_date: NaiveDate,
    /// Lifetime participation fraction, capped at 1.0
    pub activation_rate: f64,
    /// Students who ever performed the action
    pub activation_students: Vec<String>,
}

/// Computed sliding window indicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlidingWindow {
    pub window: Window,
    /// Active actions in first-qualification order
    pub active_actions: Vec<Action>,
    /// Students active within the final window
    pub dynamic_cohort: Vec<String>,
}

impl SlidingWindow {
    /// Degenerate result when the search exhausts the date range
    pub fn degenerate(until: NaiveDate) -> Self {
        Self {
            window: Window { since: until, until },
            active_actions: Vec::new(),
            dynamic_cohort: Vec::new(),
        }
    }

    /// Whether discovery produced no usable window
    pub fn is_degenerate(&self) -> bool {
        self.active_actions.is_empty()
    }
}

/// Active-action ids performed by each student, in first-seen order
pub type CohortActivity = BTreeMap<String, Vec<String>>;

/// Computed score indicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scores {
    /// Active actions, re-sorted to match the score column order
    pub actions: Vec<Action>,
    /// Signed participation scores per student, aligned with `actions`
    pub scores: BTreeMap<String, Vec<f64>>,
    /// Per-action score sums, omitted for single-student requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Vec<f64>>,
    /// Per-action score means, omitted for single-student requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<Vec<f64>>,
}

/// Computed grade indicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grades {
    /// Graded active activities, aligned with the grade columns
    pub actions: Vec<Action>,
    /// Grade per student and activity; `None` marks a missing grade
    pub grades: BTreeMap<String, Vec<Option<f64>>>,
    /// Per-activity means over present grades only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_event_name_round_trip() {
        for category in [
            ModuleCategory::Quiz,
            ModuleCategory::Forum,
            ModuleCategory::ScormRawSubmitted,
            ModuleCategory::Wiki,
        ] {
            let name = category.event_name();
            assert_eq!(ModuleCategory::from_event_name(name), Some(category));
        }
    }

    #[test]
    fn test_unknown_event_name() {
        assert_eq!(ModuleCategory::from_event_name(r"\mod_foo\event\bar"), None);
        assert_eq!(ModuleCategory::from_event_name(""), None);
    }

    #[test]
    fn test_gradable_split() {
        assert!(ModuleCategory::Quiz.is_gradable());
        assert!(ModuleCategory::AssignmentSubmitted.is_gradable());
        assert!(!ModuleCategory::Page.is_gradable());
        assert!(!ModuleCategory::Forum.is_gradable());
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&ModuleCategory::ForumPostCreated).unwrap();
        assert_eq!(json, "\"forum_post_created\"");

        let parsed: ModuleCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ModuleCategory::ForumPostCreated);
    }

    #[test]
    fn test_degenerate_window() {
        let until = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let result = SlidingWindow::degenerate(until);
        assert_eq!(result.window.since, result.window.until);
        assert!(result.active_actions.is_empty());
        assert!(result.dynamic_cohort.is_empty());
        assert!(result.is_degenerate());
    }

    #[test]
    fn test_scores_omit_absent_aggregates() {
        let scores = Scores {
            actions: vec![],
            scores: BTreeMap::new(),
            total: None,
            average: None,
        };
        let json = serde_json::to_value(&scores).unwrap();
        assert!(json.get("total").is_none());
        assert!(json.get("average").is_none());
    }
}
