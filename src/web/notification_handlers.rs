// src/web/notification_handlers.rs
use crate::{
    error::AppResult,
    models::notification::NotificationSettings,
    services::notification_service,
    state::AppState,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

// Campos ausentes mantêm o valor gravado
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    pub email_notifications: Option<bool>,
    pub notify_providers: Option<bool>,
    pub notify_requesters: Option<bool>,
}

/// GET /api/notifications/settings
pub async fn show_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(notification_service::load_settings(&state.db_pool).await?))
}

/// PUT /api/notifications/settings (admin)
pub async fn update_settings(
    State(state): State<AppState>,
    Json(form): Json<SettingsForm>,
) -> AppResult<impl IntoResponse> {
    let current = notification_service::load_settings(&state.db_pool).await?;
    let wanted = NotificationSettings {
        email_notifications: form.email_notifications.unwrap_or(current.email_notifications),
        notify_providers: form.notify_providers.unwrap_or(current.notify_providers),
        notify_requesters: form.notify_requesters.unwrap_or(current.notify_requesters),
    };
    let settings = notification_service::save_settings(&state.db_pool, &wanted).await?;
    Ok(Json(json!({
        "message": "Notification settings updated successfully",
        "settings": settings,
    })))
}

/// POST /api/test-email-notifications (admin)
pub async fn send_test_emails(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let report = notification_service::send_test_emails(&state.db_pool, state.mailer.as_ref()).await?;
    Ok(Json(json!({
        "message": "Teste de notificações por email concluído",
        "emailsSent": report.emails_sent,
        "emailsTotal": report.emails_total,
        "success": report.emails_sent > 0,
    })))
}
