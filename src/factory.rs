//! Deterministic statement fixtures for indicator tests
//!
//! Builds a reference course laid out so the discovery thresholds
//! (15 days / 6 actions / 3 students) are met at a 16-day window:
//! actions 1-5 qualify at the minimum width, action 6 one day later,
//! action 7 never, and actions 8-13 stay below the cohort floor.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::json;

use crate::statement::RawStatement;
use crate::types::{Event, ModuleCategory};

/// Fixed cutoff date for the reference course
pub fn until() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
}

pub fn action_iri(action: usize) -> String {
    format!("https://lms.example.com/action/{}", action)
}

pub fn student_id(student: usize) -> String {
    format!("student_{}", student)
}

/// (action, student, day offset before the cutoff)
const COURSE_LAYOUT: &[(usize, usize, i64)] = &[
    (1, 1, 1),
    (1, 2, 2),
    (1, 3, 3),
    (2, 1, 2),
    (2, 2, 5),
    (2, 4, 7),
    (3, 2, 3),
    (3, 3, 8),
    (3, 5, 10),
    (4, 1, 4),
    (4, 3, 6),
    (4, 6, 12),
    (5, 4, 5),
    (5, 5, 9),
    (5, 6, 14),
    (6, 7, 2),
    (6, 8, 4),
    (6, 9, 16),
    (7, 1, 3),
    (7, 5, 17),
    (7, 9, 17),
    // Noise: never enough participants to activate
    (8, 10, 1),
    (8, 1, 2),
    (9, 2, 0),
    (10, 3, 1),
    (10, 4, 2),
    (11, 5, 0),
    (12, 6, 3),
    (13, 7, 5),
];

/// Module category per reference action; 1-4 are gradable activities
fn category_for(action: usize) -> ModuleCategory {
    match action {
        1 => ModuleCategory::Quiz,
        2 => ModuleCategory::AssignmentSubmitted,
        3 => ModuleCategory::Feedback,
        4 => ModuleCategory::ForumPostCreated,
        5 => ModuleCategory::Page,
        6 => ModuleCategory::Url,
        7 => ModuleCategory::Book,
        8 => ModuleCategory::Forum,
        9 => ModuleCategory::Glossary,
        10 => ModuleCategory::Wiki,
        11 => ModuleCategory::Folder,
        12 => ModuleCategory::Chat,
        _ => ModuleCategory::Database,
    }
}

/// Deterministic grade for a graded activity statement
pub fn grade_for(student: usize, action: usize) -> f64 {
    (student + action) as f64
}

fn timestamp_at(until: NaiveDate, offset: i64, student: usize) -> DateTime<Utc> {
    (until - Duration::days(offset))
        .and_hms_opt(8, student as u32 % 60, 0)
        .unwrap()
        .and_utc()
}

/// One normalized event for the reference course
pub fn course_event(student: usize, action: usize, offset: i64, until: NaiveDate) -> Event {
    let category = category_for(action);
    let timestamp = timestamp_at(until, offset, student);
    Event {
        actor_id: student_id(student),
        object_id: action_iri(action),
        object_name: format!("Action {}", action),
        category: Some(category),
        date: timestamp.date_naive(),
        timestamp,
        score: category.is_gradable().then(|| grade_for(student, action)),
    }
}

/// A plain consultation event, for hand-built scenarios
pub fn resource_event(student: usize, action: usize, offset: i64, until: NaiveDate) -> Event {
    let timestamp = timestamp_at(until, offset, student);
    Event {
        actor_id: student_id(student),
        object_id: action_iri(action),
        object_name: format!("Action {}", action),
        category: Some(ModuleCategory::Page),
        date: timestamp.date_naive(),
        timestamp,
        score: None,
    }
}

/// The full normalized event set of the reference course
pub fn course_events(until: NaiveDate) -> Vec<Event> {
    COURSE_LAYOUT
        .iter()
        .map(|&(action, student, offset)| course_event(student, action, offset, until))
        .collect()
}

/// The reference course as raw statements, for end-to-end tests
pub fn course_statements(until: NaiveDate) -> Vec<RawStatement> {
    COURSE_LAYOUT
        .iter()
        .map(|&(action, student, offset)| raw_statement(student, action, offset, until))
        .collect()
}

/// One raw statement in the wire format the event store returns
pub fn raw_statement(
    student: usize,
    action: usize,
    offset: i64,
    until: NaiveDate,
) -> RawStatement {
    let category = category_for(action);
    let mut statement = json!({
        "timestamp": timestamp_at(until, offset, student).to_rfc3339(),
        "actor": {
            "account": {"name": student_id(student), "homePage": "https://lms.example.com"}
        },
        "object": {
            "id": action_iri(action),
            "definition": {"name": {"en-US": format!("Action {}", action)}}
        },
        "verb": {"id": "https://xapi.example.com/performed"},
        "context": {
            "extensions": {
                "http://lrs.learninglocker.net/define/extensions/info": {
                    "event_name": category.event_name()
                }
            }
        }
    });
    if category.is_gradable() {
        statement["result"] = json!({"score": {"scaled": grade_for(student, action)}});
    }
    serde_json::from_value(statement).unwrap()
}
