// src/handlers/attempt.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{SqlitePool, prelude::FromRow, types::Json as SqlJson};

use crate::{
    config::{MAX_TOLERATED_VIOLATIONS, TAB_SWITCH_VIOLATION},
    error::AppError,
    handlers::{leaderboard, quiz::fetch_quiz},
    models::attempt::{
        AttemptSignal, AttemptStatus, SubmitQuizRequest, SubmitQuizResponse, ViolationReport,
        ViolationResponse,
    },
    notifier::{self, ResultNotification},
    state::AppState,
    utils::jwt::Claims,
};

const NO_ACTIVE_ATTEMPT: &str = "No active attempt found";

/// Minimal attempt projection for lifecycle decisions.
#[derive(FromRow)]
struct AttemptProgress {
    violation_count: i64,
    status: AttemptStatus,
}

/// Counts case-insensitive matches of the student's answers against the
/// quiz's full answer key. Unanswered questions and answers to unknown
/// question ids never match; no partial credit.
fn score_answers(answers: &HashMap<i64, String>, answer_key: &HashMap<i64, String>) -> i64 {
    answer_key
        .iter()
        .filter(|(question_id, correct)| {
            answers
                .get(question_id)
                .is_some_and(|chosen| chosen.eq_ignore_ascii_case(correct))
        })
        .count() as i64
}

/// Pass policy. `2 * score >= total` admits the exact half-mark boundary;
/// a violation count above the tolerated maximum caps eligibility for
/// PASSED even on a perfect score.
fn resolve_outcome(score: i64, total: i64, violation_count: i64) -> AttemptStatus {
    if 2 * score >= total && violation_count <= MAX_TOLERATED_VIOLATIONS {
        AttemptStatus::Passed
    } else {
        AttemptStatus::Failed
    }
}

/// Escalation rule: a tab switch fails the attempt immediately; any
/// violation past the first fails it too, whatever the type.
fn escalates(violation_type: &str, new_count: i64) -> bool {
    violation_type == TAB_SWITCH_VIOLATION || new_count > 1
}

/// Entry point of the violation endpoint. The `__init__` sentinel decodes
/// to an explicit initialize operation; everything else is a real violation.
pub async fn report_violation(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<ViolationReport>,
) -> Result<impl IntoResponse, AppError> {
    match payload.into_signal() {
        AttemptSignal::Initialize => initialize_attempt(&pool, &claims.sub, quiz_id).await,
        AttemptSignal::Violation(tag) => record_violation(&pool, &claims.sub, quiz_id, &tag).await,
    }
}

/// Idempotent: creates the attempt if absent, otherwise leaves it alone.
/// Either way, reports the attempt's current violation count and status.
async fn initialize_attempt(
    pool: &SqlitePool,
    university_number: &str,
    quiz_id: i64,
) -> Result<Json<ViolationResponse>, AppError> {
    sqlx::query(
        r#"
        INSERT INTO attempts
            (student_university_number, quiz_id, answers, score,
             violation_count, violations, status, started_at, submitted_at)
        VALUES (?, ?, '{}', 0, 0, '[]', 'IN_PROGRESS', ?, NULL)
        ON CONFLICT (student_university_number, quiz_id) DO NOTHING
        "#,
    )
    .bind(university_number)
    .bind(quiz_id)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    let attempt = fetch_progress(pool, university_number, quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_ACTIVE_ATTEMPT.to_string()))?;

    Ok(Json(ViolationResponse {
        violation_count: attempt.violation_count,
        status: attempt.status,
    }))
}

/// Records one violation against a live attempt.
///
/// The increment and tag append run as a single UPDATE guarded on
/// IN_PROGRESS, so a terminal attempt is never resurrected. The read
/// feeding `escalates` is a separate statement; two concurrent reports for
/// one attempt can still race on the escalation decision.
async fn record_violation(
    pool: &SqlitePool,
    university_number: &str,
    quiz_id: i64,
    violation_type: &str,
) -> Result<Json<ViolationResponse>, AppError> {
    let current = fetch_progress(pool, university_number, quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_ACTIVE_ATTEMPT.to_string()))?;

    if current.status != AttemptStatus::InProgress {
        return Err(AppError::NotFound(NO_ACTIVE_ATTEMPT.to_string()));
    }

    let failing = escalates(violation_type, current.violation_count + 1);

    let result = sqlx::query(
        r#"
        UPDATE attempts SET
            violation_count = violation_count + 1,
            violations = json_insert(violations, '$[#]', ?),
            status = CASE WHEN ? THEN 'FAILED' ELSE status END,
            submitted_at = CASE WHEN ? THEN ? ELSE submitted_at END
        WHERE student_university_number = ? AND quiz_id = ? AND status = 'IN_PROGRESS'
        "#,
    )
    .bind(violation_type)
    .bind(failing)
    .bind(failing)
    .bind(Utc::now().to_rfc3339())
    .bind(university_number)
    .bind(quiz_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(NO_ACTIVE_ATTEMPT.to_string()));
    }

    let attempt = fetch_progress(pool, university_number, quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NO_ACTIVE_ATTEMPT.to_string()))?;

    Ok(Json(ViolationResponse {
        violation_count: attempt.violation_count,
        status: attempt.status,
    }))
}

/// Finalizes the attempt: scores the answers, applies the pass policy,
/// upserts the record, and reports the post-submission rank.
///
/// * Rejects with 409 once the attempt is terminal.
/// * `force_fail` short-circuits scoring entirely (client-detected
///   disconnect or timer expiry with violations).
/// * The result notification is fired on a detached task and never
///   delays or fails the response.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let university_number = &claims.sub;
    let quiz = fetch_quiz(&state.pool, quiz_id).await?;

    let existing = fetch_progress(&state.pool, university_number, quiz_id).await?;
    if existing
        .as_ref()
        .is_some_and(|a| a.status != AttemptStatus::InProgress)
    {
        return Err(AppError::Conflict("Quiz already submitted".to_string()));
    }
    let violation_count = existing.map(|a| a.violation_count).unwrap_or(0);

    let (score, status) = if payload.force_fail {
        (0, AttemptStatus::Failed)
    } else {
        #[derive(FromRow)]
        struct AnswerKeyRow {
            id: i64,
            correct_option: String,
        }

        let key_rows: Vec<AnswerKeyRow> =
            sqlx::query_as("SELECT id, correct_option FROM questions WHERE quiz_id = ?")
                .bind(quiz_id)
                .fetch_all(&state.pool)
                .await?;
        let answer_key: HashMap<i64, String> = key_rows
            .into_iter()
            .map(|row| (row.id, row.correct_option))
            .collect();

        let score = score_answers(&payload.answers, &answer_key);
        let status = resolve_outcome(score, answer_key.len() as i64, violation_count);
        (score, status)
    };

    let submitted_at = Utc::now().to_rfc3339();

    // Upsert on the (student, quiz) key: a resubmission before terminal
    // status overwrites the in-progress record. The violations tag list
    // stays as recorded.
    sqlx::query(
        r#"
        INSERT INTO attempts
            (student_university_number, quiz_id, answers, score,
             violation_count, violations, status, started_at, submitted_at)
        VALUES (?, ?, ?, ?, ?, '[]', ?, ?, ?)
        ON CONFLICT (student_university_number, quiz_id) DO UPDATE SET
            answers = excluded.answers,
            score = excluded.score,
            violation_count = excluded.violation_count,
            status = excluded.status,
            started_at = excluded.started_at,
            submitted_at = excluded.submitted_at
        "#,
    )
    .bind(university_number)
    .bind(quiz_id)
    .bind(SqlJson(&payload.answers))
    .bind(score)
    .bind(violation_count)
    .bind(status)
    .bind(&payload.started_at)
    .bind(&submitted_at)
    .execute(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to persist attempt: {:?}", e);
        AppError::from(e)
    })?;

    let rank = leaderboard::rank_for_student(&state.pool, quiz_id, university_number).await?;

    let student: Option<(String, String)> =
        sqlx::query_as("SELECT name, email FROM students WHERE university_number = ?")
            .bind(university_number)
            .fetch_optional(&state.pool)
            .await?;

    if let Some((name, email)) = student {
        notifier::spawn_result_notification(
            state.http.clone(),
            state.config.result_service_url.clone(),
            ResultNotification {
                to: email,
                name,
                university_number: university_number.clone(),
                score,
                status,
                violation_count,
                rank,
                quiz_title: quiz.title,
            },
        );
    }

    Ok(Json(SubmitQuizResponse {
        score,
        status,
        violation_count,
        rank,
        submitted_at,
    }))
}

async fn fetch_progress(
    pool: &SqlitePool,
    university_number: &str,
    quiz_id: i64,
) -> Result<Option<AttemptProgress>, AppError> {
    sqlx::query_as::<_, AttemptProgress>(
        "SELECT violation_count, status FROM attempts
         WHERE student_university_number = ? AND quiz_id = ?",
    )
    .bind(university_number)
    .bind(quiz_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs.iter().map(|(id, v)| (*id, v.to_string())).collect()
    }

    #[test]
    fn score_counts_case_insensitive_matches() {
        let answer_key = key(&[(1, "A"), (2, "B"), (3, "C"), (4, "D")]);
        let answers = key(&[(1, "a"), (2, "B"), (3, "D"), (4, "b")]);
        assert_eq!(score_answers(&answers, &answer_key), 2);
    }

    #[test]
    fn unanswered_and_unknown_questions_never_match() {
        let answer_key = key(&[(1, "A"), (2, "B")]);
        let answers = key(&[(1, "A"), (99, "B")]);
        assert_eq!(score_answers(&answers, &answer_key), 1);
        assert_eq!(score_answers(&HashMap::new(), &answer_key), 0);
    }

    #[test]
    fn score_is_deterministic() {
        let answer_key = key(&[(1, "A"), (2, "B"), (3, "C")]);
        let answers = key(&[(1, "A"), (2, "C")]);
        let first = score_answers(&answers, &answer_key);
        for _ in 0..10 {
            assert_eq!(score_answers(&answers, &answer_key), first);
        }
    }

    #[test]
    fn half_mark_boundary_passes() {
        // 2 of 4 correct, clean run: the boundary equality counts as a pass.
        assert_eq!(resolve_outcome(2, 4, 0), AttemptStatus::Passed);
        assert_eq!(resolve_outcome(1, 4, 0), AttemptStatus::Failed);
    }

    #[test]
    fn odd_totals_round_the_boundary_up() {
        // 3 of 5 passes (3 >= 2.5); 2 of 5 fails.
        assert_eq!(resolve_outcome(3, 5, 0), AttemptStatus::Passed);
        assert_eq!(resolve_outcome(2, 5, 0), AttemptStatus::Failed);
    }

    #[test]
    fn violation_cap_overrides_perfect_score() {
        assert_eq!(resolve_outcome(4, 4, 2), AttemptStatus::Failed);
        // A single violation still allows a pass.
        assert_eq!(resolve_outcome(4, 4, 1), AttemptStatus::Passed);
    }

    #[test]
    fn empty_question_set_passes_trivially() {
        assert_eq!(resolve_outcome(0, 0, 0), AttemptStatus::Passed);
    }

    #[test]
    fn tab_switch_escalates_immediately() {
        assert!(escalates(TAB_SWITCH_VIOLATION, 1));
    }

    #[test]
    fn first_other_violation_does_not_escalate() {
        assert!(!escalates("noise", 1));
        assert!(!escalates("fullscreen_exit", 1));
    }

    #[test]
    fn second_violation_of_any_type_escalates() {
        assert!(escalates("noise", 2));
        assert!(escalates("fullscreen_exit", 3));
    }
}
