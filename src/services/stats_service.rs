// src/services/stats_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        party::PartyKind,
        service_order::{parse_amount, ServiceStatus},
        stats::{DashboardStats, MonthlyFigures, Stats, StatusCounts},
    },
    services::party_service,
};
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::try_join;
use sqlx::SqlitePool;

async fn count_services(db_pool: &SqlitePool, status: Option<ServiceStatus>) -> AppResult<i64> {
    let total = sqlx::query_scalar("SELECT COUNT(*) FROM services WHERE ?1 IS NULL OR status = ?1")
        .bind(status)
        .fetch_one(db_pool)
        .await?;
    Ok(total)
}

pub async fn stats(db_pool: &SqlitePool) -> AppResult<Stats> {
    let (total_services, total_providers, total_requesters) = try_join!(
        count_services(db_pool, None),
        party_service::count(db_pool, PartyKind::Provider),
        party_service::count(db_pool, PartyKind::Requester),
    )?;

    Ok(Stats {
        total_services,
        total_providers,
        total_requesters,
        last_updated: Utc::now(),
    })
}

/// Intervalo `[início do mês, início do mês seguinte)` em UTC.
pub fn month_bounds(month: u32, year: i32) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let start = NaiveDate::from_ymd_opt(year, month, 1);
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1);
    match (start, end) {
        (Some(start), Some(end)) => Ok((
            start.and_time(chrono::NaiveTime::MIN).and_utc(),
            end.and_time(chrono::NaiveTime::MIN).and_utc(),
        )),
        _ => Err(AppError::BadRequest(format!("Mês inválido: {month}/{year}"))),
    }
}

#[derive(sqlx::FromRow)]
struct MonthlyRow {
    status: ServiceStatus,
    value: Option<String>,
    credits_used: i64,
}

fn summarize(rows: &[MonthlyRow]) -> MonthlyFigures {
    let mut figures = MonthlyFigures {
        total: rows.len() as i64,
        ..Default::default()
    };
    for row in rows {
        match row.status {
            ServiceStatus::Pendente => figures.counts.pending += 1,
            ServiceStatus::Resolvido => figures.counts.resolved += 1,
            ServiceStatus::Programado => figures.counts.scheduled += 1,
            ServiceStatus::Cancelado => figures.counts.canceled += 1,
        }
        // Valores ilegíveis contam como zero
        figures.total_value += row.value.as_deref().and_then(parse_amount).unwrap_or(0.0);
        figures.credits_used += row.credits_used;
    }
    figures
}

pub async fn monthly_figures(db_pool: &SqlitePool, month: u32, year: i32) -> AppResult<MonthlyFigures> {
    let (start, end) = month_bounds(month, year)?;
    let rows = sqlx::query_as::<_, MonthlyRow>(
        "SELECT status, value, credits_used FROM services WHERE request_date >= ?1 AND request_date < ?2",
    )
    .bind(start)
    .bind(end)
    .fetch_all(db_pool)
    .await?;
    Ok(summarize(&rows))
}

async fn overall_counts(db_pool: &SqlitePool) -> AppResult<StatusCounts> {
    let (pending, resolved, scheduled, canceled) = try_join!(
        count_services(db_pool, Some(ServiceStatus::Pendente)),
        count_services(db_pool, Some(ServiceStatus::Resolvido)),
        count_services(db_pool, Some(ServiceStatus::Programado)),
        count_services(db_pool, Some(ServiceStatus::Cancelado)),
    )?;
    Ok(StatusCounts {
        pending,
        resolved,
        scheduled,
        canceled,
    })
}

pub async fn dashboard(
    db_pool: &SqlitePool,
    month: u32,
    year: i32,
    monthly_allowance: i64,
) -> AppResult<DashboardStats> {
    tracing::debug!("Calculando estatísticas do painel para {}/{}", month, year);
    let (totals, overall, monthly) = try_join!(
        stats(db_pool),
        overall_counts(db_pool),
        monthly_figures(db_pool, month, year),
    )?;

    Ok(DashboardStats {
        total_services: totals.total_services,
        total_providers: totals.total_providers,
        total_requesters: totals.total_requesters,
        pending_services: overall.pending,
        completed_services: overall.resolved,
        scheduled_services: overall.scheduled,
        canceled_services: overall.canceled,
        month,
        year,
        monthly_total_services: monthly.total,
        monthly_pending: monthly.counts.pending,
        monthly_resolved: monthly.counts.resolved,
        monthly_scheduled: monthly.counts.scheduled,
        monthly_canceled: monthly.counts.canceled,
        monthly_total_value: monthly.total_value,
        monthly_credits_used: monthly.credits_used,
        monthly_remaining: (monthly_allowance - monthly.credits_used).max(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::service_order::ServiceInput,
        services::service_order_service,
        test_support::test_pool,
    };
    use chrono::TimeZone;

    async fn add(pool: &SqlitePool, input: ServiceInput) {
        let draft = input.into_new_draft(vec![], Utc::now());
        service_order_service::insert(pool, &draft).await.unwrap();
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = month_bounds(12, 2024).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert!(matches!(month_bounds(13, 2024), Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn dashboard_splits_month_from_overall() {
        let pool = test_pool().await;
        let march = Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap();

        add(&pool, ServiceInput {
            title: Some("Pago".into()),
            value: Some(Some("100,50".into())),
            request_date: Some(march),
            ..Default::default()
        })
        .await;
        add(&pool, ServiceInput {
            title: Some("Pacote".into()),
            is_monthly_package: Some(true),
            credits_used: Some(3),
            status: Some(ServiceStatus::Resolvido),
            request_date: Some(march),
            ..Default::default()
        })
        .await;
        add(&pool, ServiceInput {
            title: Some("Abril".into()),
            value: Some(Some("999".into())),
            request_date: Some(april),
            ..Default::default()
        })
        .await;

        let stats = dashboard(&pool, 3, 2025, 50).await.unwrap();
        assert_eq!(stats.total_services, 3);
        assert_eq!(stats.pending_services, 2);
        assert_eq!(stats.completed_services, 1);
        assert_eq!(stats.monthly_total_services, 2);
        assert_eq!(stats.monthly_pending, 1);
        assert_eq!(stats.monthly_resolved, 1);
        assert!((stats.monthly_total_value - 100.5).abs() < f64::EPSILON);
        assert_eq!(stats.monthly_credits_used, 3);
        assert_eq!(stats.monthly_remaining, 47);
    }

    #[tokio::test]
    async fn remaining_credits_never_negative() {
        let pool = test_pool().await;
        let stats = dashboard(&pool, 1, 2025, 0).await.unwrap();
        assert_eq!(stats.monthly_remaining, 0);
        assert_eq!(stats.monthly_total_services, 0);
    }
}
