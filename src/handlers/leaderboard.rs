// src/handlers/leaderboard.rs

use std::cmp::Ordering;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use sqlx::{SqlitePool, prelude::FromRow};

use crate::{error::AppError, models::attempt::AttemptStatus};

/// Stand-in duration for attempts whose timestamps cannot be parsed, large
/// enough that they always sort last.
const UNPARSABLE_TIME_TAKEN_SECS: i64 = 99_999;

/// One leaderboard row, rank already assigned.
#[derive(Debug, Serialize)]
pub struct LeaderboardRow {
    pub name: String,
    pub university_number: String,
    pub score: i64,
    pub status: AttemptStatus,
    pub violation_count: i64,
    pub time_taken_seconds: i64,
    pub rank: i64,
}

/// Terminal attempt joined with the student's name, as fetched.
#[derive(Debug, FromRow)]
struct TerminalAttempt {
    student_university_number: String,
    name: Option<String>,
    score: i64,
    status: AttemptStatus,
    violation_count: i64,
    started_at: String,
    submitted_at: Option<String>,
}

/// Ranked standings for a quiz. Any authenticated caller.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows = ranked_entries(terminal_attempts(&pool, quiz_id).await?);
    Ok(Json(json!({ "leaderboard": rows })))
}

/// The student's 1-based position among the quiz's terminal attempts.
///
/// Runs through the same `ranked_entries` as the full leaderboard, so the
/// rank reported at submit time always matches a later leaderboard fetch.
pub(crate) async fn rank_for_student(
    pool: &SqlitePool,
    quiz_id: i64,
    university_number: &str,
) -> Result<i64, AppError> {
    let rows = ranked_entries(terminal_attempts(pool, quiz_id).await?);
    let rank = rows
        .iter()
        .find(|row| row.university_number == university_number)
        .map(|row| row.rank)
        .unwrap_or(rows.len() as i64 + 1);
    Ok(rank)
}

async fn terminal_attempts(
    pool: &SqlitePool,
    quiz_id: i64,
) -> Result<Vec<TerminalAttempt>, AppError> {
    sqlx::query_as::<_, TerminalAttempt>(
        r#"
        SELECT
            a.student_university_number,
            s.name,
            a.score,
            a.status,
            a.violation_count,
            a.started_at,
            a.submitted_at
        FROM attempts a
        LEFT JOIN students s ON s.university_number = a.student_university_number
        WHERE a.quiz_id = ? AND a.status IN ('PASSED', 'FAILED')
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

/// The single ranking implementation: score descending, elapsed time
/// ascending, sequential 1-based ranks (ties are not pooled).
fn ranked_entries(attempts: Vec<TerminalAttempt>) -> Vec<LeaderboardRow> {
    let mut rows: Vec<LeaderboardRow> = attempts
        .into_iter()
        .map(|a| LeaderboardRow {
            name: a.name.unwrap_or_else(|| "Unknown".to_string()),
            university_number: a.student_university_number,
            score: a.score,
            status: a.status,
            violation_count: a.violation_count,
            time_taken_seconds: time_taken_seconds(&a.started_at, a.submitted_at.as_deref()),
            rank: 0,
        })
        .collect();

    rows.sort_by(compare_rows);
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = (i + 1) as i64;
    }
    rows
}

fn compare_rows(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.time_taken_seconds.cmp(&b.time_taken_seconds))
}

/// Elapsed whole seconds between the two timestamps; the sentinel when
/// either is missing or unparsable, so one malformed attempt can never
/// error out the whole leaderboard.
fn time_taken_seconds(started_at: &str, submitted_at: Option<&str>) -> i64 {
    match (
        parse_timestamp(started_at),
        submitted_at.and_then(parse_timestamp),
    ) {
        (Some(start), Some(end)) => end - start,
        _ => UNPARSABLE_TIME_TAKEN_SECS,
    }
}

/// Accepts RFC 3339 and bare ISO-8601 (no offset, treated as UTC), since
/// `started_at` arrives from clients.
fn parse_timestamp(value: &str) -> Option<i64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    value
        .parse::<chrono::NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(univ: &str, score: i64, taken_secs: i64) -> TerminalAttempt {
        TerminalAttempt {
            student_university_number: univ.to_string(),
            name: Some(univ.to_string()),
            score,
            status: AttemptStatus::Passed,
            violation_count: 0,
            started_at: "2024-03-01T10:00:00+00:00".to_string(),
            submitted_at: Some(
                chrono::DateTime::parse_from_rfc3339("2024-03-01T10:00:00+00:00")
                    .unwrap()
                    .checked_add_signed(chrono::Duration::seconds(taken_secs))
                    .unwrap()
                    .to_rfc3339(),
            ),
        }
    }

    #[test]
    fn orders_by_score_desc_then_time_asc() {
        // A(8, 120s), B(8, 90s), C(9, 300s) must rank C, B, A.
        let rows = ranked_entries(vec![
            attempt("A", 8, 120),
            attempt("B", 8, 90),
            attempt("C", 9, 300),
        ]);

        let order: Vec<&str> = rows.iter().map(|r| r.university_number.as_str()).collect();
        assert_eq!(order, ["C", "B", "A"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[2].rank, 3);
    }

    #[test]
    fn equal_scores_get_sequential_distinct_ranks() {
        let rows = ranked_entries(vec![attempt("A", 5, 60), attempt("B", 5, 60)]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 2);
    }

    #[test]
    fn malformed_timestamps_sort_last() {
        let mut broken = attempt("X", 10, 30);
        broken.submitted_at = Some("not a timestamp".to_string());

        let rows = ranked_entries(vec![broken, attempt("Y", 10, 500)]);
        assert_eq!(rows[0].university_number, "Y");
        assert_eq!(rows[1].time_taken_seconds, UNPARSABLE_TIME_TAKEN_SECS);
    }

    #[test]
    fn missing_submission_timestamp_uses_sentinel() {
        let mut in_flight = attempt("X", 10, 30);
        in_flight.submitted_at = None;
        let rows = ranked_entries(vec![in_flight]);
        assert_eq!(rows[0].time_taken_seconds, UNPARSABLE_TIME_TAKEN_SECS);
    }

    #[test]
    fn parses_naive_iso_timestamps() {
        assert_eq!(
            time_taken_seconds("2024-03-01T10:00:00", Some("2024-03-01T10:02:00")),
            120
        );
    }

    #[test]
    fn unknown_students_render_as_unknown() {
        let mut anon = attempt("Z", 1, 10);
        anon.name = None;
        let rows = ranked_entries(vec![anon]);
        assert_eq!(rows[0].name, "Unknown");
    }
}
