// src/utils/access_code.rs

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use sqlx::SqlitePool;

use crate::error::AppError;

const CODE_PREFIX: &str = "QZ-";
const CODE_LEN: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

static CODE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Generates a short join code like `QZ-A3X9K2`, drawn uniformly from the
/// uppercase alphanumeric charset.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect();
    format!("{CODE_PREFIX}{suffix}")
}

/// True if `code` is a well-formed access code (`QZ-` + 6 of [A-Z0-9]).
pub fn is_valid_format(code: &str) -> bool {
    CODE_PATTERN
        .get_or_init(|| Regex::new("^QZ-[A-Z0-9]{6}$").expect("static pattern is valid"))
        .is_match(code)
}

/// Generates a code no existing quiz holds. The store's unique constraint
/// on `quizzes.access_code` remains the final arbiter on insert; this
/// pre-check keeps the expected iteration count at one.
pub async fn generate_unique_code(pool: &SqlitePool) -> Result<String, AppError> {
    loop {
        let code = generate_code();
        let taken: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM quizzes WHERE access_code = ?")
                .bind(&code)
                .fetch_one(pool)
                .await?;
        if taken == 0 {
            return Ok(code);
        }
        tracing::debug!(code, "access code collision, regenerating");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_well_formed() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(is_valid_format(&code), "bad code: {code}");
        }
    }

    #[test]
    fn format_check_rejects_near_misses() {
        assert!(is_valid_format("QZ-A3X9K2"));
        assert!(!is_valid_format("QZ-a3x9k2"));
        assert!(!is_valid_format("QZ-A3X9K"));
        assert!(!is_valid_format("QZ-A3X9K2X"));
        assert!(!is_valid_format("XX-A3X9K2"));
        assert!(!is_valid_format(" QZ-A3X9K2"));
    }
}
