// src/models/mod.rs
pub mod notification;
pub mod party;
pub mod service_order;
pub mod stats;
pub mod user;
