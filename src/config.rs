// src/config.rs

use dotenvy::dotenv;
use std::env;
use url::Url;

/// Violations tolerated at submission time. A violation count above this
/// caps eligibility for PASSED even on a perfect score.
pub const MAX_TOLERATED_VIOLATIONS: i64 = 1;

/// Violation tag that fails an attempt immediately, regardless of count.
pub const TAB_SWITCH_VIOLATION: &str = "tab_switch";

/// Upper bound on the outbound result-notification call.
pub const NOTIFY_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub result_service_url: Url,
    pub seed_teacher_email: Option<String>,
    pub seed_teacher_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:quiz_app.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let result_service_url = env::var("RESULT_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:3001/send-result".to_string());
        let result_service_url =
            Url::parse(&result_service_url).expect("RESULT_SERVICE_URL must be a valid URL");

        let seed_teacher_email = env::var("SEED_TEACHER_EMAIL").ok();
        let seed_teacher_password = env::var("SEED_TEACHER_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            result_service_url,
            seed_teacher_email,
            seed_teacher_password,
        }
    }
}
