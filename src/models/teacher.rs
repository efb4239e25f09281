// src/models/teacher.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'teachers' table. Teachers are seeded, not self-registered.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
}

/// DTO for teacher login.
#[derive(Debug, Deserialize)]
pub struct TeacherLoginRequest {
    pub email: String,
    pub password: String,
}
