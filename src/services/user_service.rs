// src/services/user_service.rs
use crate::{
    config::AdminSeed,
    error::{AppError, AppResult},
    models::user::{AuthProvider, ExternalIdentity, User, UserType},
    services::auth_service,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, provider, is_admin, \
     user_type, receive_email_notification, created_at, updated_at";

/// Busca um utilizador pelo ID.
pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Busca um utilizador pelo email (comparação sem distinção de maiúsculas).
pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por email: {}", email);
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))
        .bind(email.trim())
        .fetch_optional(db_pool)
        .await?;

    if user.is_none() {
        tracing::debug!("Utilizador '{}' não encontrado.", email);
    }
    Ok(user)
}

pub async fn find_all_users(db_pool: &SqlitePool) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"))
        .fetch_all(db_pool)
        .await?;
    tracing::debug!("Encontrados {} utilizadores.", users.len());
    Ok(users)
}

pub struct NewLocalUser<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: Option<&'a str>,
    pub raw_password: &'a str,
    pub user_type: UserType,
    pub is_admin: bool,
}

/// Cria uma conta local com senha.
pub async fn create_local_user(db_pool: &SqlitePool, new_user: NewLocalUser<'_>) -> AppResult<User> {
    tracing::info!("Tentando criar utilizador local: {}", new_user.email);
    let password_hash = auth_service::hash_password(new_user.raw_password).await?;
    insert_user(
        db_pool,
        new_user.email,
        new_user.first_name,
        new_user.last_name,
        Some(&password_hash),
        AuthProvider::Local,
        new_user.is_admin,
        new_user.user_type,
    )
    .await
}

/// Devolve o utilizador com este email ou cria-o como visualizador (login Google).
pub async fn find_or_create_external(db_pool: &SqlitePool, identity: &ExternalIdentity) -> AppResult<User> {
    if let Some(user) = find_user_by_email(db_pool, &identity.email).await? {
        return Ok(user);
    }
    let (first_name, last_name) = identity.split_name();
    insert_user(
        db_pool,
        &identity.email,
        &first_name,
        last_name.as_deref(),
        None,
        AuthProvider::Google,
        false,
        UserType::Visualizador,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn insert_user(
    db_pool: &SqlitePool,
    email: &str,
    first_name: &str,
    last_name: Option<&str>,
    password_hash: Option<&str>,
    provider: AuthProvider,
    is_admin: bool,
    user_type: UserType,
) -> AppResult<User> {
    let now = Utc::now();
    let result = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, email, first_name, last_name, password_hash, provider,
                           is_admin, user_type, receive_email_notification, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(email.trim())
    .bind(first_name.trim())
    .bind(last_name.map(str::trim).filter(|l| !l.is_empty()))
    .bind(password_hash)
    .bind(provider)
    .bind(is_admin)
    .bind(user_type)
    .bind(now)
    .fetch_one(db_pool)
    .await;

    match result {
        Ok(user) => {
            tracing::info!("✅ Utilizador '{}' criado com sucesso.", user.email);
            Ok(user)
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::warn!("Falha ao criar user: email '{}' já existe.", email);
            Err(AppError::UserAlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// Grava `is_admin` e `user_type` de uma só vez.
pub async fn update_permissions(
    db_pool: &SqlitePool,
    user_id: &str,
    is_admin: bool,
    user_type: UserType,
) -> AppResult<User> {
    tracing::info!(
        "Atualizando permissões de '{}': is_admin={}, user_type={}",
        user_id,
        is_admin,
        user_type
    );
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_admin = ?1, user_type = ?2, updated_at = ?3 WHERE id = ?4 RETURNING {USER_COLUMNS}"
    ))
    .bind(is_admin)
    .bind(user_type)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound("User"))
}

pub async fn promote_to_admin(db_pool: &SqlitePool, user_id: &str) -> AppResult<User> {
    update_permissions(db_pool, user_id, true, UserType::Admin).await
}

/// Retira o acesso admin. Um utilizador cujo tipo era `admin` passa a visualizador,
/// senão o papel no token voltaria a conceder o acesso.
pub async fn revoke_admin(db_pool: &SqlitePool, user_id: &str) -> AppResult<User> {
    let user = find_user_by_id(db_pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let user_type = match user.user_type {
        UserType::Admin => UserType::Visualizador,
        other => other,
    };
    update_permissions(db_pool, user_id, false, user_type).await
}

/// Muda o tipo de utilizador sem mexer na flag de admin.
pub async fn set_user_type(db_pool: &SqlitePool, user_id: &str, user_type: UserType) -> AppResult<User> {
    if user_type == UserType::Admin {
        return Err(AppError::BadRequest(
            "Use a promoção para conceder acesso de administrador".to_string(),
        ));
    }
    let user = find_user_by_id(db_pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    update_permissions(db_pool, user_id, user.is_admin, user_type).await
}

/// Garante que existe a conta admin indicada em ADMIN_EMAIL/ADMIN_PASSWORD.
pub async fn seed_admin(db_pool: &SqlitePool, seed: &AdminSeed) -> AppResult<()> {
    if let Some(existing) = find_user_by_email(db_pool, &seed.email).await? {
        if !existing.has_admin_rights() {
            promote_to_admin(db_pool, &existing.id).await?;
            tracing::info!("🔑 Utilizador '{}' promovido a administrador.", seed.email);
        } else {
            tracing::debug!("Conta admin '{}' já existe.", seed.email);
        }
        return Ok(());
    }

    create_local_user(
        db_pool,
        NewLocalUser {
            email: &seed.email,
            first_name: "Administrador",
            last_name: None,
            raw_password: &seed.password,
            user_type: UserType::Admin,
            is_admin: true,
        },
    )
    .await?;
    tracing::info!("🔑 Conta admin '{}' criada.", seed.email);
    Ok(())
}
