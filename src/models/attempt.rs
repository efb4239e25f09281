// src/models/attempt.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Sentinel the client sends on `violation_type` to mean "initialize the
/// attempt if absent" rather than reporting a real violation.
pub const INIT_SENTINEL: &str = "__init__";

/// Lifecycle state of an attempt. `InProgress` is the only non-terminal
/// state; `Passed` and `Failed` are immutable once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    InProgress,
    Passed,
    Failed,
}

/// Represents the 'attempts' table. At most one row exists per
/// (student_university_number, quiz_id), enforced by a unique index.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub student_university_number: String,
    pub quiz_id: i64,

    /// Question id -> chosen option label.
    pub answers: Json<HashMap<i64, String>>,

    pub score: i64,
    pub violation_count: i64,

    /// Ordered violation-type tags, in report order.
    pub violations: Json<Vec<String>>,

    pub status: AttemptStatus,
    pub started_at: String,
    pub submitted_at: Option<String>,
}

/// Wire payload of the violation endpoint.
#[derive(Debug, Deserialize)]
pub struct ViolationReport {
    pub violation_type: String,
}

/// What a violation payload actually asks for, decoded from the wire
/// sentinel so the two operations stay distinct in the handlers.
#[derive(Debug)]
pub enum AttemptSignal {
    Initialize,
    Violation(String),
}

impl ViolationReport {
    pub fn into_signal(self) -> AttemptSignal {
        if self.violation_type == INIT_SENTINEL {
            AttemptSignal::Initialize
        } else {
            AttemptSignal::Violation(self.violation_type)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViolationResponse {
    pub violation_count: i64,
    pub status: AttemptStatus,
}

/// Wire payload of the submit endpoint. `started_at` is echoed back from
/// the client because the attempt may not have been initialized server-side.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: HashMap<i64, String>,
    pub started_at: String,
    #[serde(default)]
    pub force_fail: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub score: i64,
    pub status: AttemptStatus,
    pub violation_count: i64,
    pub rank: i64,
    pub submitted_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sentinel_decodes_to_initialize() {
        let report = ViolationReport {
            violation_type: INIT_SENTINEL.to_string(),
        };
        assert!(matches!(report.into_signal(), AttemptSignal::Initialize));
    }

    #[test]
    fn other_tags_decode_to_violations() {
        let report = ViolationReport {
            violation_type: "fullscreen_exit".to_string(),
        };
        match report.into_signal() {
            AttemptSignal::Violation(tag) => assert_eq!(tag, "fullscreen_exit"),
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[test]
    fn status_serializes_to_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&AttemptStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::to_string(&AttemptStatus::Passed).unwrap(),
            "\"PASSED\""
        );
    }
}
