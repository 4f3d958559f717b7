// src/web/admin_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{PublicUser, SetUserTypeForm, UserType},
    services::user_service,
    state::AppState,
    web::mw_auth::AuthUser,
};
use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    tracing::debug!("GET /api/admin/users");
    let users: Vec<PublicUser> = user_service::find_all_users(&state.db_pool)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    Ok(Json(users))
}

/// POST /api/admin/users/{id}/promote
pub async fn promote_user(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let user = user_service::promote_to_admin(&state.db_pool, &id).await?;
    tracing::info!("🔑 '{}' promovido a administrador.", user.email);
    Ok(Json(json!({
        "message": "Usuário promovido a administrador",
        "user": PublicUser::from(user),
    })))
}

/// POST /api/admin/users/{id}/revoke
pub async fn revoke_user(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if claims.user_id == id {
        return Err(AppError::BadRequest(
            "Não pode retirar o seu próprio acesso de administrador".to_string(),
        ));
    }
    let user = user_service::revoke_admin(&state.db_pool, &id).await?;
    tracing::info!("Acesso admin retirado a '{}'.", user.email);
    Ok(Json(json!({
        "message": "Acesso de administrador removido",
        "user": PublicUser::from(user),
    })))
}

/// PUT /api/admin/users/{id}/type
pub async fn set_user_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<SetUserTypeForm>,
) -> AppResult<impl IntoResponse> {
    let user_type = form.user_type.parse::<UserType>().map_err(AppError::BadRequest)?;
    let user = user_service::set_user_type(&state.db_pool, &id, user_type).await?;
    Ok(Json(json!({
        "message": "Tipo de usuário atualizado",
        "user": PublicUser::from(user),
    })))
}
