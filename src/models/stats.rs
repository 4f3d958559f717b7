// src/models/stats.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_services: i64,
    pub total_providers: i64,
    pub total_requesters: i64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MonthParams {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Contagens por status de um conjunto de serviços.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub resolved: i64,
    pub scheduled: i64,
    pub canceled: i64,
}

/// Números do mês pedido.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyFigures {
    pub total: i64,
    pub counts: StatusCounts,
    pub total_value: f64,
    pub credits_used: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_services: i64,
    pub total_providers: i64,
    pub total_requesters: i64,
    pub pending_services: i64,
    pub completed_services: i64,
    pub scheduled_services: i64,
    pub canceled_services: i64,

    pub month: u32,
    pub year: i32,
    pub monthly_total_services: i64,
    pub monthly_pending: i64,
    pub monthly_resolved: i64,
    pub monthly_scheduled: i64,
    pub monthly_canceled: i64,
    pub monthly_total_value: f64,
    pub monthly_credits_used: i64,
    pub monthly_remaining: i64,
}
