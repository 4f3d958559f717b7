// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

/// Custo bcrypt usado nas senhas locais.
const BCRYPT_COST: u32 = 10;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, BCRYPT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Autentica um utilizador local. Contas Google (sem hash) nunca passam aqui.
pub async fn check_credentials(user: Option<User>, password: &str) -> AppResult<User> {
    let Some(user) = user else {
        return Err(AppError::InvalidCredentials);
    };
    let Some(hash) = user.password_hash.as_deref() else {
        tracing::warn!("Login local recusado para conta sem senha: {}", user.email);
        return Err(AppError::InvalidCredentials);
    };
    if verify_password(password, hash).await? {
        Ok(user)
    } else {
        Err(AppError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{AuthProvider, UserType};
    use chrono::Utc;

    fn user_with_hash(hash: Option<String>) -> User {
        User {
            id: "u1".into(),
            email: "ana@example.com".into(),
            first_name: "Ana".into(),
            last_name: None,
            password_hash: hash,
            provider: AuthProvider::Local,
            is_admin: false,
            user_type: UserType::Visualizador,
            receive_email_notification: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("segredo123").await.unwrap();
        assert!(verify_password("segredo123", &hash).await.unwrap());
        assert!(!verify_password("errada", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn credentials_rejected_without_local_password() {
        let result = check_credentials(Some(user_with_hash(None)), "qualquer").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));

        let result = check_credentials(None, "qualquer").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn credentials_accepted_with_matching_password() {
        let hash = hash_password("segredo123").await.unwrap();
        let user = check_credentials(Some(user_with_hash(Some(hash))), "segredo123")
            .await
            .unwrap();
        assert_eq!(user.id, "u1");
    }
}
