// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// The four labeled options of a question.
/// Stored as a JSON object in the database, keyed "A".."D" on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Owning quiz (foreign key).
    pub quiz_id: i64,

    pub question_text: String,

    pub options: Json<QuestionOptions>,

    /// The correct option label, stored uppercase ("A".."D").
    pub correct_option: String,
}

/// DTO for sending a question to students (excludes the correct option).
#[derive(Debug, Serialize, FromRow)]
pub struct PublicQuestion {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub options: Json<QuestionOptions>,
}

/// DTO for adding a question to a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(length(min = 1, max = 500))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500))]
    pub option_b: String,
    #[validate(length(min = 1, max = 500))]
    pub option_c: String,
    #[validate(length(min = 1, max = 500))]
    pub option_d: String,
    #[validate(custom(function = validate_option_label))]
    pub correct_option: String,
}

fn validate_option_label(label: &str) -> Result<(), validator::ValidationError> {
    match label.to_ascii_uppercase().as_str() {
        "A" | "B" | "C" | "D" => Ok(()),
        _ => Err(validator::ValidationError::new(
            "correct_option_must_be_one_of_a_b_c_d",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_four_labels_case_insensitively() {
        for label in ["A", "B", "C", "D", "a", "d"] {
            assert!(validate_option_label(label).is_ok(), "label {label}");
        }
    }

    #[test]
    fn rejects_non_labels() {
        for label in ["E", "AB", "", "1"] {
            assert!(validate_option_label(label).is_err(), "label {label}");
        }
    }
}
