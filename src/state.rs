// src/state.rs
use crate::{
    config::Config,
    services::{
        identity_service::IdentityProvider, notification_service::Mailer, token_service::TokenService,
        upload_service::UploadStore,
    },
};
use sqlx::SqlitePool;
use std::{sync::Arc, time::Instant};

// Estado partilhado por todos os handlers; nada aqui é mutável
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
    // Só existe com SUPABASE_URL e SUPABASE_ANON_KEY
    pub identity: Option<Arc<dyn IdentityProvider>>,
    pub uploads: UploadStore,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        db_pool: SqlitePool,
        config: Config,
        mailer: Arc<dyn Mailer>,
        identity: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        Self {
            tokens: TokenService::new(&config.jwt_secret, config.jwt_expiry_days),
            uploads: UploadStore::new(config.uploads_dir.clone(), config.max_upload_file_bytes),
            db_pool,
            config: Arc::new(config),
            mailer,
            identity,
            started_at: Instant::now(),
        }
    }
}

// Permite extrair o pool da DB diretamente
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> TokenService {
        state.tokens.clone()
    }
}
