// src/web/mw_auth.rs
use crate::{
    error::AppError,
    services::token_service::{Claims, TokenService},
};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

// Claims verificadas, postas nas extensões da requisição por `require_auth`
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Middleware que exige um token Bearer válido.
pub async fn require_auth(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match tokens.verify_header(authorization(request.headers())) {
        Ok(claims) => {
            tracing::debug!("Autenticação MW: '{}' autenticado.", claims.email);
            request.extensions_mut().insert(AuthUser(claims));
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::warn!("Autenticação MW: pedido recusado em {}: {}", request.uri().path(), e);
            Err(e)
        }
    }
}

/// Para rotas públicas que mudam de comportamento com um token válido.
/// Um token inválido conta como ausente.
pub fn optional_claims(tokens: &TokenService, headers: &HeaderMap) -> Option<Claims> {
    authorization(headers)?;
    match tokens.verify_header(authorization(headers)) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Token opcional ignorado: {}", e);
            None
        }
    }
}
