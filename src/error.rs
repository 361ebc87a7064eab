//! Error types for coursepulse

use thiserror::Error;

/// Errors that can occur while computing indicators
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("No statements available: {0}")]
    NoStatements(String),

    #[error("Statements span fewer than {required} days")]
    InsufficientTimeSpread { required: u32 },

    #[error("Statements cover fewer than {required} distinct actions")]
    InsufficientActionDiversity { required: usize },

    #[error("Statements come from fewer than {required} distinct students")]
    InsufficientCohortSize { required: usize },

    #[error("Student {student} has multiple grades for action {action}")]
    AmbiguousGrade { student: String, action: String },

    #[error("Event store unavailable: {0}")]
    EventSourceUnavailable(String),

    #[error("Unknown course {0}. It should be indexed first")]
    UnknownCourse(String),

    #[error("No content indexed for course {0}")]
    NoCourseContent(String),

    #[error("Failed to parse statement: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
