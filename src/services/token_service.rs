// src/services/token_service.rs
//! Tokens de sessão (JWT HS256) emitidos pelo próprio servidor.
//!
//! O direito de administrador viaja dentro do token (`isAdmin` / `role`) e é
//! verificado aqui; não existe outra forma de obter acesso admin.

use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserType},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
    pub role: UserType,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn has_admin_rights(&self) -> bool {
        self.is_admin || self.role == UserType::Admin
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

impl TokenService {
    pub fn new(secret: &str, expiry_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_days,
        }
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            is_admin: user.has_admin_rights(),
            role: user.user_type,
            iat: now.timestamp(),
            exp: (now + Duration::days(self.expiry_days)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Falha ao assinar JWT: {:?}", e);
            AppError::InternalServerError
        })
    }

    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Token expired"),
                _ => AppError::Unauthorized("Invalid token"),
            })
    }

    /// Lê o cabeçalho `Authorization: Bearer <jwt>`.
    pub fn verify_header(&self, header: Option<&str>) -> AppResult<Claims> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized("Access token required"))?;
        self.verify(token)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("expiry_days", &self.expiry_days)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::AuthProvider;

    fn user(user_type: UserType, is_admin: bool) -> User {
        User {
            id: "user-42".into(),
            email: "gestor@example.com".into(),
            first_name: "Gestor".into(),
            last_name: None,
            password_hash: None,
            provider: AuthProvider::Local,
            is_admin,
            user_type,
            receive_email_notification: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service() -> TokenService {
        TokenService::new("test-secret-key-that-is-long-enough", 7)
    }

    #[test]
    fn issued_token_carries_role_claims() {
        let tokens = service();
        let token = tokens.issue(&user(UserType::Fornecedor, false)).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.user_id, "user-42");
        assert_eq!(claims.role, UserType::Fornecedor);
        assert!(!claims.has_admin_rights());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn admin_flag_or_role_grants_admin() {
        let tokens = service();
        let by_flag = tokens.verify(&tokens.issue(&user(UserType::Visualizador, true)).unwrap()).unwrap();
        let by_role = tokens.verify(&tokens.issue(&user(UserType::Admin, false)).unwrap()).unwrap();
        assert!(by_flag.has_admin_rights());
        assert!(by_role.has_admin_rights());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = TokenService::new("another-secret-key-that-is-long-enough", 7);
        let token = other.issue(&user(UserType::Admin, true)).unwrap();
        assert!(matches!(service().verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("test-secret-key-that-is-long-enough", -1);
        let token = tokens.issue(&user(UserType::Admin, true)).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthorized("Token expired"))));
    }

    #[test]
    fn header_must_be_bearer() {
        let tokens = service();
        let token = tokens.issue(&user(UserType::Admin, true)).unwrap();

        assert!(tokens.verify_header(Some(&format!("Bearer {token}"))).is_ok());
        assert!(matches!(
            tokens.verify_header(None),
            Err(AppError::Unauthorized("Access token required"))
        ));
        // O antigo segredo partilhado já não abre nada
        assert!(tokens
            .verify_header(Some("AdminAppBrandness:Adminappbrandness"))
            .is_err());
    }
}
