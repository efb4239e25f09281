// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
/// The access code is the only thing a student ever needs to join.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub duration_minutes: i64,

    /// Creating teacher's id, as stored in their JWT subject.
    pub created_by: String,

    pub created_at: String,

    /// Unique join code, format `QZ-` + 6 uppercase alphanumerics.
    pub access_code: String,
}

/// Reduced row for the public titles listing (no access codes exposed).
#[derive(Debug, Serialize, FromRow)]
pub struct QuizTitle {
    pub id: i64,
    pub title: String,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i64,
}
