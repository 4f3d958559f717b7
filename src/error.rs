// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Erro de validação de um campo, no formato que o cliente já sabe mostrar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub code: String,
    pub path: Vec<String>,
    pub message: String,
}

impl FieldError {
    /// O caminho segue as chaves camelCase do JSON (`credits_used` -> `creditsUsed`).
    pub fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            path: vec![camel_case(field)],
            message: message.into(),
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Acesso negado")]
    Forbidden,

    #[error("Authentication service not configured")]
    IdentityNotConfigured,

    #[error("Erro no serviço de identidade: {0}")]
    Identity(#[from] reqwest::Error),

    #[error("Erro ao enviar email: {0}")]
    Email(String),

    #[error("Erro de ficheiro: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro interno inesperado")]
    InternalServerError,
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record"),
            other => AppError::SqlxError(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(field_errors(&errors))
    }
}

/// Achata os erros do `validator` numa lista ordenada por campo.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Campo inválido: {field}"));
                FieldError::new(&field, &e.code, message)
            })
        })
        .collect();
    fields.sort_by(|a, b| a.path.cmp(&b.path));
    fields
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::SqlxError(_)
            | AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::InvalidCredentials
            | AppError::UserAlreadyExists => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Identity(_) => StatusCode::BAD_GATEWAY,
            AppError::SqlxMigrateError(_)
            | AppError::PasswordHashingError
            | AppError::IdentityNotConfigured
            | AppError::Email(_)
            | AppError::Io(_)
            | AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Como converter AppError numa resposta HTTP JSON
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Erro processado: {:?}", self);
        } else {
            tracing::debug!("Pedido rejeitado ({}): {}", status.as_u16(), self);
        }

        let body = match self {
            // Mensagem da base de dados devolvida tal como veio
            AppError::SqlxError(e) => json!({ "error": database_message(&e) }),
            AppError::Validation(errors) => json!({ "message": "Validation error", "errors": errors }),
            AppError::Forbidden => json!({
                "error": "Acesso negado. Permissão de administrador necessária."
            }),
            AppError::NotFound(_)
            | AppError::BadRequest(_)
            | AppError::InvalidCredentials
            | AppError::UserAlreadyExists
            | AppError::Unauthorized(_)
            | AppError::IdentityNotConfigured => json!({ "message": self.to_string() }),
            AppError::Identity(_) => json!({ "message": "Authentication service unavailable" }),
            AppError::SqlxMigrateError(_)
            | AppError::PasswordHashingError
            | AppError::Email(_)
            | AppError::Io(_)
            | AppError::InternalServerError => json!({ "message": "Internal server error" }),
        };

        (status, Json(body)).into_response()
    }
}

fn database_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Título é obrigatório"))]
        title: String,
        #[validate(range(min = 0, max = 4))]
        credits: i64,
    }

    #[test]
    fn validation_errors_become_field_list() {
        let sample = Sample { title: String::new(), credits: 9 };
        let err = AppError::from(sample.validate().unwrap_err());
        let AppError::Validation(fields) = err else {
            panic!("esperava erro de validação");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].path, vec!["credits".to_string()]);
        assert_eq!(fields[0].code, "range");
        assert_eq!(fields[1].path, vec!["title".to_string()]);
        assert_eq!(fields[1].message, "Título é obrigatório");
    }

    #[test]
    fn field_paths_are_camel_case() {
        let err = FieldError::new("service_type", "length", "x");
        assert_eq!(err.path, vec!["serviceType".to_string()]);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::IdentityNotConfigured.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
