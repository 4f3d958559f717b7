// src/test_support.rs
// Utilitários partilhados pelos testes; só compila em `cargo test`
use crate::{
    config::Config,
    db,
    error::{AppError, AppResult},
    models::{notification::OutgoingEmail, user::ExternalIdentity},
    services::{identity_service::IdentityProvider, notification_service::Mailer},
    state::AppState,
};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};

/// Base de dados em memória com as migrações aplicadas.
/// Uma única ligação: cada ligação `:memory:` teria a sua própria base.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    db::run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

/// Guarda os emails em vez de os enviar.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    failing: Option<String>,
}

impl RecordingMailer {
    pub fn failing_for(address: &str) -> Self {
        Self {
            failing: Some(address.to_string()),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        if self.failing.as_deref() == Some(email.to.as_str()) {
            return Err(AppError::Email("caixa cheia".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Serviço de identidade falso: aceita apenas `good-token`.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify_token(&self, access_token: &str) -> AppResult<Option<ExternalIdentity>> {
        Ok((access_token == "good-token").then(|| ExternalIdentity {
            email: "google.user@example.com".into(),
            full_name: Some("Google User".into()),
        }))
    }

    async fn send_password_reset(&self, email: &str, _redirect_to: &str) -> AppResult<bool> {
        Ok(email.contains('@'))
    }

    async fn update_password(&self, access_token: &str, _new_password: &str) -> AppResult<bool> {
        Ok(access_token == "good-token")
    }
}

pub async fn test_state(uploads_dir: &Path) -> (AppState, RecordingMailer) {
    let mailer = RecordingMailer::default();
    let state = AppState::new(
        test_pool().await,
        Config::for_tests(uploads_dir.to_path_buf()),
        Arc::new(mailer.clone()),
        Some(Arc::new(FakeIdentity)),
    );
    (state, mailer)
}
