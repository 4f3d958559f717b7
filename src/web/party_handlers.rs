// src/web/party_handlers.rs
// Os mesmos handlers servem /api/requesters e /api/providers.
use crate::{
    error::{AppError, AppResult},
    models::party::{ListParams, Page, PartyForm, PartyKind},
    services::party_service,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 10;

async fn list(state: AppState, kind: PartyKind, params: ListParams) -> AppResult<impl IntoResponse> {
    let page = Page::new(params.page, params.limit, DEFAULT_PAGE_SIZE);
    let result = party_service::list(&state.db_pool, kind, page, params.search.as_deref()).await?;
    Ok(Json(json!({
        kind.plural_key(): result.items,
        "total": result.total,
        "page": result.page,
        "limit": result.limit,
    })))
}

async fn show(state: AppState, kind: PartyKind, id: String) -> AppResult<impl IntoResponse> {
    let party = party_service::find(&state.db_pool, kind, &id)
        .await?
        .ok_or(AppError::NotFound(kind.label()))?;
    Ok(Json(party))
}

async fn create(state: AppState, kind: PartyKind, form: PartyForm) -> AppResult<impl IntoResponse> {
    let form = form.normalized();
    form.validate()?;
    let party = party_service::create(&state.db_pool, kind, form).await?;
    Ok(Json(json!({
        "message": format!("{} created successfully", kind.label()),
        kind.singular_key(): party,
    })))
}

async fn update(state: AppState, kind: PartyKind, id: String, form: PartyForm) -> AppResult<impl IntoResponse> {
    let form = form.normalized();
    form.validate()?;
    let party = party_service::update(&state.db_pool, kind, &id, form).await?;
    Ok(Json(json!({
        "message": format!("{} updated successfully", kind.label()),
        kind.singular_key(): party,
    })))
}

async fn delete(state: AppState, kind: PartyKind, id: String) -> AppResult<impl IntoResponse> {
    party_service::delete(&state.db_pool, kind, &id).await?;
    Ok(Json(json!({ "message": format!("{} deleted successfully", kind.label()) })))
}

// --- Fornecedores ---

pub async fn list_providers(State(state): State<AppState>, Query(params): Query<ListParams>) -> AppResult<impl IntoResponse> {
    list(state, PartyKind::Provider, params).await
}

pub async fn show_provider(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    show(state, PartyKind::Provider, id).await
}

pub async fn create_provider(State(state): State<AppState>, Json(form): Json<PartyForm>) -> AppResult<impl IntoResponse> {
    create(state, PartyKind::Provider, form).await
}

pub async fn update_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<PartyForm>,
) -> AppResult<impl IntoResponse> {
    update(state, PartyKind::Provider, id, form).await
}

pub async fn delete_provider(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    delete(state, PartyKind::Provider, id).await
}

// --- Solicitantes ---

pub async fn list_requesters(State(state): State<AppState>, Query(params): Query<ListParams>) -> AppResult<impl IntoResponse> {
    list(state, PartyKind::Requester, params).await
}

pub async fn show_requester(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    show(state, PartyKind::Requester, id).await
}

pub async fn create_requester(State(state): State<AppState>, Json(form): Json<PartyForm>) -> AppResult<impl IntoResponse> {
    create(state, PartyKind::Requester, form).await
}

pub async fn update_requester(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<PartyForm>,
) -> AppResult<impl IntoResponse> {
    update(state, PartyKind::Requester, id, form).await
}

pub async fn delete_requester(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    delete(state, PartyKind::Requester, id).await
}
