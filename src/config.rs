// src/config.rs
use anyhow::Context;
use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

const DEV_JWT_SECRET: &str = "fallback-secret-key-for-dev";

/// Credenciais do transporte SMTP. Sem `SMTP_HOST` os emails são apenas registados no log.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Serviço de identidade externo (Supabase Auth) usado no login Google e no reset de senha.
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    pub uploads_dir: PathBuf,
    pub max_upload_file_bytes: usize,
    pub max_upload_files: usize,
    pub email_from: String,
    pub smtp: Option<SmtpSettings>,
    pub identity: Option<IdentitySettings>,
    pub frontend_url: String,
    pub monthly_credit_allowance: i64,
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host: String = try_load("HOST", "0.0.0.0")?;
        let port: u16 = try_load("PORT", "5000")?;
        let addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .with_context(|| format!("Endereço inválido: {host}:{port}"))?;

        let jwt_secret = optional("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("⚠️ JWT_SECRET não definida, a usar chave de desenvolvimento!");
            DEV_JWT_SECRET.to_string()
        });
        if jwt_secret.len() < 32 {
            tracing::warn!("⚠️ JWT_SECRET é curta, considere usar uma chave mais longa e aleatória!");
        }

        let email_user = optional("EMAIL_USER");
        let smtp = optional("SMTP_HOST")
            .map(|host| -> anyhow::Result<SmtpSettings> {
                Ok(SmtpSettings {
                    host,
                    port: try_load("SMTP_PORT", "587")?,
                    username: email_user.clone(),
                    password: optional("EMAIL_PASSWORD"),
                })
            })
            .transpose()?;
        let email_from = optional("EMAIL_FROM")
            .or_else(|| email_user.clone())
            .unwrap_or_else(|| "noreply@gestao.local".to_string());

        let identity = match (optional("SUPABASE_URL"), optional("SUPABASE_ANON_KEY")) {
            (Some(base_url), Some(api_key)) => Some(IdentitySettings {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
            }),
            _ => {
                tracing::info!("SUPABASE_URL/SUPABASE_ANON_KEY não definidas: login Google desativado.");
                None
            }
        };

        let admin_seed = match (optional("ADMIN_EMAIL"), optional("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            _ => None,
        };

        Ok(Self {
            addr,
            database_url: try_load("DATABASE_URL", "sqlite://data/gestao.db")?,
            jwt_secret,
            jwt_expiry_days: try_load("JWT_EXPIRY_DAYS", "7")?,
            uploads_dir: PathBuf::from(try_load::<String>("UPLOADS_DIR", "uploads")?),
            max_upload_file_bytes: try_load("MAX_UPLOAD_FILE_BYTES", "10485760")?,
            max_upload_files: try_load("MAX_UPLOAD_FILES", "10")?,
            email_from,
            smtp,
            identity,
            frontend_url: try_load("FRONTEND_URL", "http://localhost:5000")?,
            monthly_credit_allowance: try_load("MONTHLY_CREDIT_ALLOWANCE", "50")?,
            admin_seed,
        })
    }

    /// Limite total do corpo multipart: todos os ficheiros mais uma folga para os campos de texto.
    pub fn multipart_body_limit(&self) -> usize {
        self.max_upload_file_bytes * self.max_upload_files + 1024 * 1024
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        tracing::info!("{key} não definida, a usar padrão: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Valor inválido para {key} ({raw}): {e}"))
}

#[cfg(test)]
impl Config {
    pub fn for_tests(uploads_dir: PathBuf) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-that-is-long-enough".to_string(),
            jwt_expiry_days: 7,
            uploads_dir,
            max_upload_file_bytes: 1024 * 1024,
            max_upload_files: 3,
            email_from: "gestao@test.local".to_string(),
            smtp: None,
            identity: None,
            frontend_url: "http://localhost:5000".to_string(),
            monthly_credit_allowance: 50,
            admin_seed: None,
        }
    }
}
