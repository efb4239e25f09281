// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        student::{Student, StudentLoginRequest, StudentRegisterRequest},
        teacher::{Teacher, TeacherLoginRequest},
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::{ROLE_STUDENT, ROLE_TEACHER, sign_jwt},
    },
};

/// Registers a new student.
///
/// Hashes the password using Argon2 before storing it.
/// Duplicate university numbers and emails are caught by the unique
/// constraints and reported as 409 Conflict.
pub async fn student_register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<StudentRegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    sqlx::query(
        r#"
        INSERT INTO students (university_number, name, email, password, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.university_number)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(Utc::now().to_rfc3339())
    .execute(&pool)
    .await
    .map_err(|e| {
        let msg = e.to_string();
        if msg.contains("UNIQUE constraint failed: students.university_number") {
            AppError::Conflict("University number already registered".to_string())
        } else if msg.contains("UNIQUE constraint failed: students.email") {
            AppError::Conflict("Email already in use".to_string())
        } else {
            tracing::error!("Failed to register student: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Student registered successfully" })),
    ))
}

/// Authenticates a student by university number and returns a JWT.
pub async fn student_login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<StudentLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student = sqlx::query_as::<_, Student>(
        "SELECT id, university_number, name, email, password, created_at
         FROM students WHERE university_number = ?",
    )
    .bind(&payload.university_number)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Student login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let student = student.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &student.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        &student.university_number,
        &student.name,
        ROLE_STUDENT,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "access_token": token,
        "role": ROLE_STUDENT,
        "name": student.name,
        "university_number": student.university_number,
    })))
}

/// Authenticates a teacher by email and returns a JWT.
pub async fn teacher_login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<TeacherLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher =
        sqlx::query_as::<_, Teacher>("SELECT id, name, email, password FROM teachers WHERE email = ?")
            .bind(&payload.email)
            .fetch_optional(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Teacher login DB error: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    let teacher = teacher.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &teacher.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        &teacher.id.to_string(),
        &teacher.name,
        ROLE_TEACHER,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "access_token": token,
        "role": ROLE_TEACHER,
        "name": teacher.name,
    })))
}
