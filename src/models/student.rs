// src/models/student.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'students' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,

    /// Unique campus identifier; also the subject of the student's JWT.
    pub university_number: String,

    pub name: String,

    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub created_at: String,
}

/// DTO for student self-registration.
#[derive(Debug, Deserialize, Validate)]
pub struct StudentRegisterRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "University number must be between 1 and 50 characters."
    ))]
    pub university_number: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for student login.
#[derive(Debug, Deserialize)]
pub struct StudentLoginRequest {
    pub university_number: String,
    pub password: String,
}
