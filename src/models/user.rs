// src/models/user.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use validator::Validate;

/// Perfil de acesso guardado em `users.user_type` e levado no token como `role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    Fornecedor,
    Solicitante,
    #[default]
    Visualizador,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "admin",
            UserType::Fornecedor => "fornecedor",
            UserType::Solicitante => "solicitante",
            UserType::Visualizador => "visualizador",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    // Aceita também os nomes ingleses que o cliente antigo enviava
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserType::Admin),
            "fornecedor" | "provider" => Ok(UserType::Fornecedor),
            "solicitante" | "requester" => Ok(UserType::Solicitante),
            "visualizador" | "viewer" => Ok(UserType::Visualizador),
            other => Err(format!("Tipo de utilizador inválido: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
}

// Representa um utilizador lido da tabela 'users'
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
    pub is_admin: bool,
    pub user_type: UserType,
    pub receive_email_notification: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_admin_rights(&self) -> bool {
        self.is_admin || self.user_type == UserType::Admin
    }
}

/// Vista pública do utilizador (sem hash da senha).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub user_type: UserType,
    pub is_admin: bool,
    pub provider: AuthProvider,
    pub receive_email_notification: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            is_admin: user.has_admin_rights(),
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            user_type: user.user_type,
            provider: user.provider,
            receive_email_notification: user.receive_email_notification,
            created_at: user.created_at,
        }
    }
}

// Corpo do POST /api/login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// Corpo do POST /api/register
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Nome é obrigatório"))]
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    #[validate(email(message = "Email inválido"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter pelo menos 6 caracteres"))]
    #[serde(default)]
    pub password: String,
    pub user_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserTypeForm {
    pub user_type: String,
}

/// Dados mínimos devolvidos pelo serviço de identidade externo.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub email: String,
    pub full_name: Option<String>,
}

impl ExternalIdentity {
    /// Divide o nome completo em primeiro nome e apelidos.
    pub fn split_name(&self) -> (String, Option<String>) {
        let full = self.full_name.as_deref().map(str::trim).unwrap_or_default();
        let mut parts = full.split_whitespace();
        match parts.next() {
            Some(first) => {
                let rest = parts.collect::<Vec<_>>().join(" ");
                (first.to_string(), Some(rest).filter(|r| !r.is_empty()))
            }
            None => ("Usuário".to_string(), None),
        }
    }
}
