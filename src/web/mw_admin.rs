// src/web/mw_admin.rs
use crate::{error::AppError, services::user_service, web::mw_auth::AuthUser};
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;

/// Middleware que exige direitos de administrador.
/// Deve ser executado *depois* do middleware `require_auth`.
/// Os direitos vêm da linha atual em `users`, não das claims do token.
pub async fn require_admin(
    State(db_pool): State<SqlitePool>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = user_service::find_user_by_id(&db_pool, &claims.user_id).await?;

    match user {
        Some(user) if user.has_admin_rights() => {
            tracing::debug!("Admin MW: Acesso admin concedido para {}", user.email);
            Ok(next.run(request).await)
        }
        Some(user) => {
            tracing::warn!(
                "Admin MW: Acesso negado para {} (role {}) em {}",
                user.email,
                user.user_type.as_str(),
                request.uri().path()
            );
            Err(AppError::Forbidden)
        }
        None => {
            tracing::warn!(
                "Admin MW: utilizador '{}' do token já não existe ({})",
                claims.user_id,
                request.uri().path()
            );
            Err(AppError::Forbidden)
        }
    }
}
