//! course.statement.v1 wire schema
//!
//! xAPI-shaped statements as returned by the event store. Only the fields the
//! indicators consume are modeled; everything else a store may attach is
//! ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::IndicatorError;

/// Current schema version
pub const SCHEMA_VERSION: &str = "course.statement.v1";

/// Extension key carrying the LMS event name
pub const INFO_EXTENSION: &str = "http://lrs.learninglocker.net/define/extensions/info";

/// Statement actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub account: Account,
}

/// Actor account on the LMS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Student identifier
    pub name: String,
    /// LMS home page
    #[serde(rename = "homePage", default, skip_serializing_if = "Option::is_none")]
    pub home_page: Option<String>,
}

/// Statement object: the course action acted upon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementObject {
    /// Action identifier (IRI)
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<ObjectDefinition>,
}

/// Object definition with language-tagged display names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDefinition {
    /// Display name per language tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<BTreeMap<String, String>>,
}

/// Statement verb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verb {
    pub id: String,
}

/// Statement context with LMS extensions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementContext {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// Grade attached to a statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementScore {
    /// Numeric grade on the course scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaled: Option<f64>,
}

/// Statement result block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<StatementScore>,
}

/// One raw statement as stored by the event store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStatement {
    /// Event timestamp (RFC3339)
    pub timestamp: String,
    pub actor: Actor,
    pub object: StatementObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<Verb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<StatementContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StatementResult>,
}

impl RawStatement {
    /// The LMS event name carried in the `info` context extension
    pub fn event_name(&self) -> Option<&str> {
        self.context
            .as_ref()?
            .extensions
            .get(INFO_EXTENSION)?
            .get("event_name")?
            .as_str()
    }

    /// Display name for the preferred language tag, falling back to the
    /// first tag in lexicographic order
    pub fn display_name(&self, preferred_language: Option<&str>) -> Option<&str> {
        let names = self.object.definition.as_ref()?.name.as_ref()?;
        if let Some(tag) = preferred_language {
            if let Some(name) = names.get(tag) {
                return Some(name.as_str());
            }
        }
        names.values().next().map(String::as_str)
    }

    /// The grade attached to this statement, if any
    pub fn score(&self) -> Option<f64> {
        self.result.as_ref()?.score.as_ref()?.scaled
    }
}

/// Parse a JSON array of statements
pub fn parse_statements(json: &str) -> Result<Vec<RawStatement>, IndicatorError> {
    serde_json::from_str(json)
        .map_err(|e| IndicatorError::ParseError(format!("invalid statement array: {}", e)))
}

/// Parse newline-delimited JSON, one statement per non-empty line
pub fn parse_ndjson(input: &str) -> Result<Vec<RawStatement>, IndicatorError> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| IndicatorError::ParseError(format!("invalid statement line: {}", e)))
        })
        .collect()
}
