//! Statement normalization
//!
//! Turns heterogeneous raw statements into the uniform [`Event`] records the
//! indicators compute over:
//! - one display name selected from the localized name map
//! - timestamp parsed and truncated to a calendar date for grouping
//! - LMS event names mapped to module categories

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::IndicatorError;
use crate::statement::RawStatement;
use crate::types::{Event, ModuleCategory};

/// Normalizer for raw statements
pub struct StatementNormalizer;

impl StatementNormalizer {
    /// Normalize raw statements into events.
    ///
    /// Fails with [`IndicatorError::NoStatements`] when `statements` is
    /// empty: no indicator can be derived from zero events.
    pub fn normalize(
        statements: &[RawStatement],
        preferred_language: Option<&str>,
    ) -> Result<Vec<Event>, IndicatorError> {
        if statements.is_empty() {
            return Err(IndicatorError::NoStatements(
                "no statements have been found".to_string(),
            ));
        }

        let events = statements
            .iter()
            .map(|statement| normalize_statement(statement, preferred_language))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = events.len(), "Normalized statements");
        Ok(events)
    }
}

/// Normalize a single statement
fn normalize_statement(
    statement: &RawStatement,
    preferred_language: Option<&str>,
) -> Result<Event, IndicatorError> {
    let timestamp = parse_timestamp(&statement.timestamp)?;
    let category = statement.event_name().and_then(ModuleCategory::from_event_name);

    Ok(Event {
        actor_id: statement.actor.account.name.clone(),
        object_id: statement.object.id.clone(),
        object_name: statement
            .display_name(preferred_language)
            .unwrap_or_default()
            .to_string(),
        category,
        date: timestamp.date_naive(),
        timestamp,
        score: statement.score(),
    })
}

/// Parse an RFC3339 timestamp into UTC
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, IndicatorError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| IndicatorError::ParseError(format!("invalid timestamp {:?}: {}", raw, e)))
}
