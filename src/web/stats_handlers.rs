// src/web/stats_handlers.rs
use crate::{error::AppResult, models::stats::MonthParams, services::stats_service, state::AppState};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{Datelike, Utc};

/// GET /api/stats
pub async fn show_stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(stats_service::stats(&state.db_pool).await?))
}

/// GET /api/dashboard/stats?month=&year= (por omissão o mês corrente, em UTC)
pub async fn show_dashboard_stats(
    State(state): State<AppState>,
    Query(params): Query<MonthParams>,
) -> AppResult<impl IntoResponse> {
    let today = Utc::now().date_naive();
    let month = params.month.unwrap_or_else(|| today.month());
    let year = params.year.unwrap_or_else(|| today.year());

    let stats = stats_service::dashboard(&state.db_pool, month, year, state.config.monthly_credit_allowance).await?;
    Ok(Json(stats))
}
