// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        admin_handlers, auth_handlers, health_handlers, mw_admin, mw_auth, notification_handlers, party_handlers,
        service_handlers, stats_handlers,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::services::ServeDir;

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/health", get(health_handlers::health))
        .route("/api/health", get(health_handlers::api_health))
        .route("/api/status", get(health_handlers::status))
        .route("/api/monitor", get(health_handlers::monitor))
        .route("/api/register", post(auth_handlers::handle_register))
        .route("/api/login", post(auth_handlers::handle_login))
        .route("/api/auth/google", post(auth_handlers::handle_google_auth))
        .route("/api/auth/forgot-password", post(auth_handlers::handle_forgot_password))
        .route("/api/auth/reset-password", post(auth_handlers::handle_reset_password))
        .route("/api/providers", get(party_handlers::list_providers))
        .route("/api/providers/{id}", get(party_handlers::show_provider))
        .route("/api/requesters", get(party_handlers::list_requesters))
        .route("/api/requesters/{id}", get(party_handlers::show_requester))
        // Token opcional, verificado dentro do handler
        .route("/api/services", get(service_handlers::list_services))
        .route("/api/services/{id}", get(service_handlers::show_service))
        .route("/api/stats", get(stats_handlers::show_stats))
        .route("/api/dashboard/stats", get(stats_handlers::show_dashboard_stats));

    // --- Rotas que exigem apenas login ---
    let user_routes = Router::new()
        .route("/api/me", get(auth_handlers::handle_me))
        .route("/api/notifications/settings", get(notification_handlers::show_settings));

    // --- Rotas multipart de serviços (admin) ---
    let upload_routes = Router::new()
        .route("/api/services", post(service_handlers::create_service))
        .route("/api/services/{id}", put(service_handlers::update_service))
        .layer(DefaultBodyLimit::max(app_state.config.multipart_body_limit()));

    // --- Rotas de Admin ---
    let admin_routes = Router::new()
        .route("/api/providers", post(party_handlers::create_provider))
        .route(
            "/api/providers/{id}",
            put(party_handlers::update_provider).delete(party_handlers::delete_provider),
        )
        .route("/api/requesters", post(party_handlers::create_requester))
        .route(
            "/api/requesters/{id}",
            put(party_handlers::update_requester).delete(party_handlers::delete_requester),
        )
        .route("/api/services/all", get(service_handlers::list_all_services))
        .route("/api/services/{id}", delete(service_handlers::delete_service))
        .route("/api/notifications/settings", put(notification_handlers::update_settings))
        .route("/api/test-email-notifications", post(notification_handlers::send_test_emails))
        .route("/api/admin/users", get(admin_handlers::list_users))
        .route("/api/admin/users/{id}/promote", post(admin_handlers::promote_user))
        .route("/api/admin/users/{id}/revoke", post(admin_handlers::revoke_user))
        .route("/api/admin/users/{id}/type", put(admin_handlers::set_user_type))
        .merge(upload_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_admin::require_admin,
        ));

    // require_auth corre antes de require_admin em tudo o que está abaixo
    let authenticated_routes = Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- Router Final ---
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .nest_service("/uploads", ServeDir::new(app_state.uploads.dir()))
        .with_state(app_state)
}
