// src/routes.rs

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{attempt, auth, leaderboard, quiz},
    state::AppState,
    utils::jwt::{auth_middleware, require_student, require_teacher},
};

/// Assembles the main application router.
///
/// * Open auth routes, then three protected groups: teacher-only,
///   student-only, and any-authenticated.
/// * Role middleware stacks on top of `auth_middleware`, so 401 beats 403.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/student/register", post(auth::student_register))
        .route("/student/login", post(auth::student_login))
        .route("/teacher/login", post(auth::teacher_login));

    let teacher_routes = Router::new()
        .route("/quiz/create", post(quiz::create_quiz))
        .route("/quiz/list", get(quiz::list_quizzes))
        .route("/quiz/{quiz_id}/add-question", post(quiz::add_question))
        .route("/quiz/{quiz_id}/detail", get(quiz::quiz_detail))
        .route("/quiz/{quiz_id}/attempts", get(quiz::list_attempts))
        .layer(middleware::from_fn(require_teacher))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let student_routes = Router::new()
        .route("/quiz/by-code/{code}", get(quiz::get_quiz_by_code))
        .route("/quiz/{quiz_id}/violation", post(attempt::report_violation))
        .route("/quiz/{quiz_id}/submit", post(attempt::submit_quiz))
        .layer(middleware::from_fn(require_student))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let shared_routes = Router::new()
        .route("/quiz/titles", get(quiz::quiz_titles))
        .route("/quiz/{quiz_id}/questions", get(quiz::get_questions))
        .route(
            "/quiz/{quiz_id}/leaderboard",
            get(leaderboard::get_leaderboard),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(teacher_routes)
        .merge(student_routes)
        .merge(shared_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "time": Utc::now().to_rfc3339() }))
}
