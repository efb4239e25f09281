// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sqlx::{SqlitePool, prelude::FromRow, types::Json as SqlJson};

use crate::{
    error::AppError,
    models::{
        attempt::AttemptStatus,
        question::{CreateQuestionRequest, PublicQuestion, Question, QuestionOptions},
        quiz::{CreateQuizRequest, Quiz, QuizTitle},
    },
    utils::{access_code, jwt::Claims, jwt::ROLE_STUDENT, sanitize::clean_text},
};
use validator::Validate;

/// Creates a quiz with a freshly generated unique access code.
///
/// * Only reachable by teachers (role middleware).
/// * The code pre-check loop plus the unique index on `access_code`
///   guarantee no two quizzes share a code.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let access_code = access_code::generate_unique_code(&pool).await?;

    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (title, duration_minutes, created_by, created_at, access_code)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(clean_text(&payload.title))
    .bind(payload.duration_minutes)
    .bind(&claims.sub)
    .bind(Utc::now().to_rfc3339())
    .bind(&access_code)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(json!({
        "quiz_id": quiz_id,
        "access_code": access_code,
        "message": "Quiz created",
    })))
}

/// Full quiz list, access codes included. Teachers only.
pub async fn list_quizzes(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT id, title, duration_minutes, created_by, created_at, access_code FROM quizzes",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "quizzes": quizzes })))
}

/// Quiz titles for the leaderboard dropdown. No access codes exposed.
pub async fn quiz_titles(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizTitle>("SELECT id, title FROM quizzes")
        .fetch_all(&pool)
        .await?;

    Ok(Json(json!({ "quizzes": quizzes })))
}

/// Student enters an access code and gets the quiz header to start with.
/// Lookup is trimmed and case-insensitive on the way in.
pub async fn get_quiz_by_code(
    State(pool): State<SqlitePool>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let code = code.trim().to_uppercase();
    if !access_code::is_valid_format(&code) {
        return Err(AppError::NotFound(
            "Invalid quiz code. Please ask your teacher for the correct code.".to_string(),
        ));
    }

    let quiz = sqlx::query_as::<_, Quiz>(
        "SELECT id, title, duration_minutes, created_by, created_at, access_code
         FROM quizzes WHERE access_code = ?",
    )
    .bind(&code)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(
            "Invalid quiz code. Please ask your teacher for the correct code.".to_string(),
        )
    })?;

    Ok(Json(json!({
        "quiz_id": quiz.id,
        "title": quiz.title,
        "duration_minutes": quiz.duration_minutes,
    })))
}

/// Adds a four-option question to an existing quiz. Teachers only.
pub async fn add_question(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    fetch_quiz(&pool, quiz_id).await?;

    let options = QuestionOptions {
        a: clean_text(&payload.option_a),
        b: clean_text(&payload.option_b),
        c: clean_text(&payload.option_c),
        d: clean_text(&payload.option_d),
    };

    let question_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions (quiz_id, question_text, options, correct_option)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(clean_text(&payload.question_text))
    .bind(SqlJson(options))
    .bind(payload.correct_option.to_uppercase())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to add question: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(json!({
        "question_id": question_id,
        "message": "Question added",
    })))
}

/// Returns the quiz header plus its questions.
///
/// Students get the public DTO with `correct_option` redacted; teachers
/// get the full rows.
pub async fn get_questions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, quiz_id).await?;

    let questions = if claims.role == ROLE_STUDENT {
        let qs = sqlx::query_as::<_, PublicQuestion>(
            "SELECT id, quiz_id, question_text, options FROM questions WHERE quiz_id = ?",
        )
        .bind(quiz_id)
        .fetch_all(&pool)
        .await?;
        serde_json::to_value(qs)?
    } else {
        let qs = sqlx::query_as::<_, Question>(
            "SELECT id, quiz_id, question_text, options, correct_option
             FROM questions WHERE quiz_id = ?",
        )
        .bind(quiz_id)
        .fetch_all(&pool)
        .await?;
        serde_json::to_value(qs)?
    };

    Ok(Json(json!({
        "quiz_id": quiz.id,
        "title": quiz.title,
        "duration_minutes": quiz.duration_minutes,
        "questions": questions,
    })))
}

/// Full quiz detail with answer keys. Teachers only.
pub async fn quiz_detail(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    #[derive(Serialize)]
    struct QuizDetailResponse {
        #[serde(flatten)]
        quiz: Quiz,
        questions: Vec<Question>,
    }

    let quiz = fetch_quiz(&pool, quiz_id).await?;

    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, question_text, options, correct_option
         FROM questions WHERE quiz_id = ?",
    )
    .bind(quiz_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(QuizDetailResponse { quiz, questions }))
}

/// Every attempt on the quiz, joined with student identity. Teachers only.
pub async fn list_attempts(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    #[derive(Serialize, FromRow)]
    struct AttemptOverview {
        id: i64,
        student_university_number: String,
        student_name: String,
        student_email: String,
        quiz_id: i64,
        answers: SqlJson<HashMap<i64, String>>,
        score: i64,
        violation_count: i64,
        violations: SqlJson<Vec<String>>,
        status: AttemptStatus,
        started_at: String,
        submitted_at: Option<String>,
    }

    fetch_quiz(&pool, quiz_id).await?;

    let attempts = sqlx::query_as::<_, AttemptOverview>(
        r#"
        SELECT
            a.id,
            a.student_university_number,
            COALESCE(s.name, 'Unknown') AS student_name,
            COALESCE(s.email, 'Unknown') AS student_email,
            a.quiz_id,
            a.answers,
            a.score,
            a.violation_count,
            a.violations,
            a.status,
            a.started_at,
            a.submitted_at
        FROM attempts a
        LEFT JOIN students s ON s.university_number = a.student_university_number
        WHERE a.quiz_id = ?
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "attempts": attempts })))
}

/// Shared existence check; 404 if the quiz id is unknown.
pub(crate) async fn fetch_quiz(pool: &SqlitePool, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        "SELECT id, title, duration_minutes, created_by, created_at, access_code
         FROM quizzes WHERE id = ?",
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}
