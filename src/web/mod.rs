// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod health_handlers;
pub mod mw_admin;
pub mod mw_auth;
pub mod notification_handlers;
pub mod party_handlers;
pub mod routes;
pub mod service_form;
pub mod service_handlers;
pub mod stats_handlers;
