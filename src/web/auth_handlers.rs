// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult, FieldError},
    models::user::{LoginForm, PublicUser, RegisterForm, UserType},
    services::{auth_service, user_service},
    state::AppState,
    web::mw_auth::AuthUser,
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct GoogleAuthForm {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: Option<String>,
    pub password: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("POST /api/register: {}", form.email);
    form.validate()?;

    let user_type = match form.user_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        None => UserType::Visualizador,
        Some(raw) => raw.parse::<UserType>().map_err(|msg| {
            AppError::Validation(vec![FieldError::new("userType", "invalid_enum_value", msg)])
        })?,
    };
    // O registo nunca concede acesso admin
    let user_type = if user_type == UserType::Admin {
        tracing::warn!("Registo de '{}' pediu tipo admin; gravado como visualizador.", form.email);
        UserType::Visualizador
    } else {
        user_type
    };

    let user = user_service::create_local_user(
        &state.db_pool,
        user_service::NewLocalUser {
            email: &form.email,
            first_name: &form.first_name,
            last_name: form.last_name.as_deref(),
            raw_password: &form.password,
            user_type,
            is_admin: false,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "user": PublicUser::from(user) })),
    ))
}

/// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> AppResult<impl IntoResponse> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".to_string()));
    }
    tracing::info!("POST /api/login: tentativa para {}", form.email);

    let user = user_service::find_user_by_email(&state.db_pool, &form.email).await?;
    let user = match auth_service::check_credentials(user, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Login falhou para {}", form.email);
            return Err(e);
        }
    };

    let token = state.tokens.issue(&user)?;
    tracing::info!("✅ Login bem-sucedido para {}", user.email);
    Ok(Json(json!({
        "message": "Login successful",
        "user": PublicUser::from(user),
        "token": token,
    })))
}

/// POST /api/auth/google: troca o token do serviço de identidade por um JWT nosso.
pub async fn handle_google_auth(
    State(state): State<AppState>,
    Json(form): Json<GoogleAuthForm>,
) -> AppResult<impl IntoResponse> {
    let token = present(form.token).ok_or_else(|| AppError::BadRequest("Token required".to_string()))?;
    let identity = state.identity.as_ref().ok_or(AppError::IdentityNotConfigured)?;

    let external = identity
        .verify_token(&token)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid token".to_string()))?;
    let user = user_service::find_or_create_external(&state.db_pool, &external).await?;

    let token = state.tokens.issue(&user)?;
    tracing::info!("✅ Login Google para {}", user.email);
    Ok(Json(json!({
        "message": "Login successful",
        "user": PublicUser::from(user),
        "token": token,
    })))
}

/// POST /api/auth/forgot-password
pub async fn handle_forgot_password(
    State(state): State<AppState>,
    Json(form): Json<ForgotPasswordForm>,
) -> AppResult<impl IntoResponse> {
    let email = present(form.email).ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
    let identity = state.identity.as_ref().ok_or(AppError::IdentityNotConfigured)?;

    let redirect_to = format!("{}/reset-password", state.config.frontend_url.trim_end_matches('/'));
    if !identity.send_password_reset(&email, &redirect_to).await? {
        return Err(AppError::BadRequest("Error sending reset email".to_string()));
    }
    tracing::info!("Email de reset pedido para {}", email);
    Ok(Json(json!({ "message": "Password reset email sent" })))
}

/// POST /api/auth/reset-password
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Json(form): Json<ResetPasswordForm>,
) -> AppResult<impl IntoResponse> {
    let (Some(token), Some(password)) = (present(form.token), form.password.filter(|p| !p.is_empty())) else {
        return Err(AppError::BadRequest("Token and password are required".to_string()));
    };
    if password.chars().count() < 6 {
        return Err(AppError::Validation(vec![FieldError::new(
            "password",
            "length",
            "A senha deve ter pelo menos 6 caracteres",
        )]));
    }
    let identity = state.identity.as_ref().ok_or(AppError::IdentityNotConfigured)?;

    if !identity.update_password(&token, &password).await? {
        return Err(AppError::BadRequest("Error updating password".to_string()));
    }
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

/// GET /api/me
pub async fn handle_me(Extension(AuthUser(claims)): Extension<AuthUser>) -> impl IntoResponse {
    Json(json!({
        "user": {
            "userId": claims.user_id,
            "email": claims.email,
            "isAdmin": claims.has_admin_rights(),
            "role": claims.role,
        }
    }))
}
