// src/notifier.rs

use serde::Serialize;
use url::Url;

use crate::models::attempt::AttemptStatus;

/// Result summary posted to the external email service after submission.
#[derive(Debug, Clone, Serialize)]
pub struct ResultNotification {
    pub to: String,
    pub name: String,
    pub university_number: String,
    pub score: i64,
    pub status: AttemptStatus,
    pub violation_count: i64,
    pub rank: i64,
    pub quiz_title: String,
}

/// Fires the notification on a detached task. Best-effort: timeouts,
/// connection errors, and non-2xx responses are logged and discarded, so
/// the submit response is never delayed or failed by this call.
pub fn spawn_result_notification(client: reqwest::Client, url: Url, payload: ResultNotification) {
    tokio::spawn(async move {
        match client.post(url.as_str()).json(&payload).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(status = %resp.status(), "result notification rejected");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "result notification failed");
            }
        }
    });
}
