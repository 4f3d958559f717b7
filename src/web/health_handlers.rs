// src/web/health_handlers.rs
use crate::{db, state::AppState};
use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Instant;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn uptime_formatted(seconds: u64) -> String {
    format!("{}h {}m {}s", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

/// Sonda a base de dados e monta a resposta comum a /health e /api/health.
async fn probe(state: &AppState, headers: &HeaderMap, healthy_status: &str, endpoint: &str) -> (StatusCode, Json<Value>) {
    let started = Instant::now();
    let result = db::ping(&state.db_pool).await;
    let response_time = format!("{}ms", started.elapsed().as_millis());
    let uptime = format!("{}s", state.started_at.elapsed().as_secs());
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    match result {
        Ok(()) => {
            if user_agent.contains("UptimeRobot") {
                tracing::info!("[Health Check] {}: {}", user_agent, response_time);
            }
            (
                StatusCode::OK,
                Json(json!({
                    "status": healthy_status,
                    "message": "App and database are healthy",
                    "database": "connected",
                    "responseTime": response_time,
                    "uptime": uptime,
                    "timestamp": Utc::now(),
                    "userAgent": user_agent,
                    "version": VERSION,
                    "endpoint": endpoint,
                })),
            )
        }
        Err(e) => {
            tracing::error!("[Health Check] Base de dados indisponível: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "message": "Database connection failed",
                    "error": e.to_string(),
                    "responseTime": response_time,
                    "uptime": uptime,
                    "timestamp": Utc::now(),
                    "endpoint": endpoint,
                })),
            )
        }
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    probe(&state, &headers, "ok", "/health").await
}

/// GET /api/health
pub async fn api_health(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    probe(&state, &headers, "healthy", "/api/health").await
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let connected = db::ping(&state.db_pool).await.is_ok();
    Json(json!({
        "status": "operational",
        "database": if connected { "connected" } else { "disconnected" },
        "timestamp": Utc::now(),
        "uptime": state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/monitor
pub async fn monitor(State(state): State<AppState>) -> impl IntoResponse {
    let connected = db::ping(&state.db_pool).await.is_ok();
    let uptime = state.started_at.elapsed().as_secs();
    let code = if connected { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        code,
        Json(json!({
            "status": if connected { "ok" } else { "error" },
            "database": if connected { "connected" } else { "disconnected" },
            "email": if state.config.smtp.is_some() { "smtp" } else { "log" },
            "identityProvider": if state.identity.is_some() { "configured" } else { "disabled" },
            "timestamp": Utc::now(),
            "uptimeSeconds": uptime,
            "uptimeFormatted": uptime_formatted(uptime),
            "version": VERSION,
            "monitor": "complete",
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_human_readable() {
        assert_eq!(uptime_formatted(0), "0h 0m 0s");
        assert_eq!(uptime_formatted(3_725), "1h 2m 5s");
    }
}
