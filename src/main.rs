// src/main.rs

use dotenvy::dotenv;
use proctorquiz::config::{Config, NOTIFY_TIMEOUT_SECS};
use proctorquiz::routes;
use proctorquiz::state::AppState;
use proctorquiz::utils::hash::hash_password;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("DATABASE_URL must be a valid sqlite URL")
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(connect_options)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Seed Default Teacher Account
    if let Err(e) = seed_default_teacher(&pool, &config).await {
        tracing::error!("Failed to seed default teacher: {:?}", e);
    }

    // Shared client for the fire-and-forget result notifications
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client");

    // Create AppState
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        http,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

async fn seed_default_teacher(
    pool: &SqlitePool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(email), Some(password)) = (
        &config.seed_teacher_email,
        &config.seed_teacher_password,
    ) {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM teachers WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        if existing.is_none() {
            tracing::info!("Seeding default teacher: {}", email);
            let hashed_password = hash_password(password)?;

            sqlx::query("INSERT INTO teachers (name, email, password) VALUES (?, ?, ?)")
                .bind("Admin Teacher")
                .bind(email)
                .bind(&hashed_password)
                .execute(pool)
                .await?;
            tracing::info!("Default teacher created successfully.");
        }
    }
    Ok(())
}
