//! coursepulse - Engagement analytics engine for course activity streams
//!
//! coursepulse derives engagement indicators from timestamped learner
//! activity statements through a deterministic pipeline: statement
//! normalization → sliding window discovery → indicator composition.
//!
//! ## Indicators
//!
//! - **Window**: the narrowest trailing date window holding enough active
//!   actions and a large enough cohort
//! - **Cohort**: active actions performed per student
//! - **Scores**: signed participation scores on active actions
//! - **Grades**: grade matrix on gradable active activities

pub mod cache;
pub mod cohort;
pub mod config;
pub mod error;
pub mod grades;
pub mod normalizer;
pub mod pipeline;
pub mod scores;
pub mod source;
pub mod statement;
pub mod types;
pub mod window;

#[cfg(test)]
mod factory;

pub use config::EngineConfig;
pub use error::IndicatorError;
pub use pipeline::IndicatorProcessor;
pub use source::{CourseIndex, EventStore, StaticCourseIndex, StaticEventStore};
pub use statement::{RawStatement, SCHEMA_VERSION};
pub use types::{Action, CohortActivity, Event, Grades, Scores, SlidingWindow, Window};

/// coursepulse version embedded in CLI envelopes
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI envelopes
pub const PRODUCER_NAME: &str = "coursepulse";
