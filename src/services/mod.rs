// src/services/mod.rs
pub mod auth_service;
pub mod identity_service;
pub mod notification_service;
pub mod party_service;
pub mod service_order_service;
pub mod stats_service;
pub mod token_service;
pub mod upload_service;
pub mod user_service;
