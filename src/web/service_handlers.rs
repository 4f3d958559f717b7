// src/web/service_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        notification::NotificationKind,
        party::Page,
        service_order::{ServiceFilter, ServiceListParams, ServiceStatus},
    },
    services::{
        notification_service,
        service_order_service::{self, ServiceOrdering},
    },
    state::AppState,
    web::{mw_auth::optional_claims, service_form::read_service_form},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

const DEFAULT_PAGE_SIZE: i64 = 50;

fn parse_status(raw: Option<&str>) -> AppResult<Option<ServiceStatus>> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ServiceStatus>().map_err(AppError::BadRequest))
        .transpose()
}

/// GET /api/services: com token admin vê tudo; sem ele pode filtrar por solicitante.
pub async fn list_services(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ServiceListParams>,
) -> AppResult<impl IntoResponse> {
    let is_admin = optional_claims(&state.tokens, &headers)
        .map(|c| c.has_admin_rights())
        .unwrap_or(false);
    let requester_id = params
        .requester_id
        .clone()
        .filter(|id| !id.is_empty() && id != "admin");

    let filter = ServiceFilter {
        requester_id: if is_admin { None } else { requester_id.clone() },
        status: parse_status(params.status.as_deref())?,
        search: params.search.clone(),
    };
    let page = Page::new(params.page, params.limit, DEFAULT_PAGE_SIZE);

    let services = service_order_service::list(&state.db_pool, &filter, ServiceOrdering::Newest, Some(page)).await?;
    let total = service_order_service::count(&state.db_pool, &filter).await?;

    Ok(Json(json!({
        "services": services,
        "total": total,
        "page": page.page,
        "limit": page.limit,
        "isAdmin": is_admin,
        "requesterId": requester_id,
    })))
}

/// GET /api/services/all (admin)
pub async fn list_all_services(
    State(state): State<AppState>,
    Query(params): Query<ServiceListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = ServiceFilter {
        requester_id: None,
        status: parse_status(params.status.as_deref())?,
        search: params.search,
    };
    let page = Page::new(params.page, params.limit, DEFAULT_PAGE_SIZE);
    let services =
        service_order_service::list(&state.db_pool, &filter, ServiceOrdering::RequestDate, Some(page)).await?;
    Ok(Json(services))
}

/// GET /api/services/{id}
pub async fn show_service(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let service = service_order_service::find_with_parties(&state.db_pool, &id)
        .await?
        .ok_or(AppError::NotFound("Service"))?;
    Ok(Json(service))
}

/// POST /api/services (admin, multipart)
pub async fn create_service(State(state): State<AppState>, mut multipart: Multipart) -> AppResult<impl IntoResponse> {
    let form = read_service_form(&mut multipart, &state.uploads, state.config.max_upload_files).await?;
    let uploaded = form.uploaded.clone();
    let draft = form.input.into_new_draft(form.uploaded, Utc::now());

    let result = match draft.check() {
        Ok(()) => service_order_service::insert(&state.db_pool, &draft).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };
    let service = match result {
        Ok(service) => service,
        Err(e) => {
            tracing::warn!("Criação de serviço recusada: {}", e);
            state.uploads.remove_all(&uploaded).await;
            return Err(e);
        }
    };

    notification_service::spawn_notification(
        state.db_pool.clone(),
        state.mailer.clone(),
        NotificationKind::ServiceCreated,
        service.clone(),
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Service created successfully", "service": service })),
    ))
}

/// PUT /api/services/{id} (admin, multipart)
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let current = service_order_service::find(&state.db_pool, &id)
        .await?
        .ok_or(AppError::NotFound("Service"))?;

    let form = read_service_form(&mut multipart, &state.uploads, state.config.max_upload_files).await?;
    let uploaded = form.uploaded.clone();
    let (draft, removed) = form.input.merge_into(&current, form.uploaded);

    let result = match draft.check() {
        Ok(()) => service_order_service::update(&state.db_pool, &id, &draft).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };
    let service = match result {
        Ok(service) => service,
        Err(e) => {
            tracing::warn!("Atualização do serviço '{}' recusada: {}", id, e);
            state.uploads.remove_all(&uploaded).await;
            return Err(e);
        }
    };

    // Só depois da linha gravada
    state.uploads.remove_all(&removed).await;

    if service.status != current.status {
        tracing::info!("Serviço '{}': status {} -> {}", id, current.status, service.status);
        notification_service::spawn_notification(
            state.db_pool.clone(),
            state.mailer.clone(),
            NotificationKind::StatusChanged,
            service.clone(),
        );
    }

    Ok(Json(json!({ "message": "Service updated successfully", "service": service })))
}

/// DELETE /api/services/{id} (admin)
pub async fn delete_service(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let deleted = service_order_service::delete(&state.db_pool, &id).await?;
    state.uploads.remove_all(&deleted.images).await;
    Ok(Json(json!({ "message": "Service deleted successfully" })))
}
