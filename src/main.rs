// src/main.rs

// --- Declaração dos Módulos ---
mod config;
mod db;
mod error;
mod models;
mod services;
mod state;
mod templates;
#[cfg(test)]
mod test_support;
mod web;

// --- Imports ---
use crate::{
    config::Config,
    services::{
        identity_service::{IdentityProvider, SupabaseIdentity},
        notification_service, user_service,
    },
    state::AppState,
};
use axum::serve;
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                env::var("RUST_LOG")
                    .unwrap_or_else(|_| "gestao_servicos=debug,tower_http=info,sqlx=warn".into())
                    .into()
            }),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando servidor Gestão de Serviços...");
    let config = Config::from_env()?;

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    if let Some(seed) = &config.admin_seed {
        user_service::seed_admin(&db_pool, seed)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar conta admin: {}", e))?;
    }

    // --- Serviços externos ---
    let mailer = notification_service::build_mailer(config.smtp.as_ref(), &config.email_from)
        .map_err(|e| anyhow::anyhow!("Configuração de email inválida: {}", e))?;
    let identity: Option<Arc<dyn IdentityProvider>> = match &config.identity {
        Some(settings) => Some(Arc::new(
            SupabaseIdentity::new(settings).map_err(|e| anyhow::anyhow!("Cliente de identidade: {}", e))?,
        )),
        None => None,
    };

    let addr = config.addr;
    let app_state = AppState::new(db_pool, config, mailer, identity);
    app_state
        .uploads
        .ensure_dir()
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao criar pasta de uploads: {}", e))?;
    tracing::info!("📁 Uploads em {}", app_state.uploads.dir().display());

    // --- Configuração do Endereço e Listener ---
    tracing::info!("📡 Servidor escutando em http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", addr, e);
            return Err(e.into());
        }
    };

    // --- Criação do Router e Aplicação das Camadas (Middlewares) ---
    tracing::info!("🛠️ Construindo router e aplicando middlewares...");
    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );
    tracing::info!("✅ Router e middlewares configurados.");

    // --- Início do Servidor ---
    tracing::info!("👂 Servidor pronto para aceitar conexões...");
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
