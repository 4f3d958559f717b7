// src/models/notification.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Interruptores globais de notificação (linha única `notification_settings`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub notify_providers: bool,
    pub notify_requesters: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            notify_providers: true,
            notify_requesters: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    ServiceCreated,
    StatusChanged,
    Test,
}

impl NotificationKind {
    pub fn heading(&self) -> &'static str {
        match self {
            NotificationKind::ServiceCreated => "Novo Serviço Criado",
            NotificationKind::StatusChanged => "Atualização de Serviço",
            NotificationKind::Test => "Teste de Notificação",
        }
    }

    pub fn intro(&self) -> &'static str {
        match self {
            NotificationKind::ServiceCreated => "Um novo serviço foi criado no sistema:",
            NotificationKind::StatusChanged => "Informamos que houve uma atualização no serviço:",
            NotificationKind::Test => "Este é um email de teste do sistema de notificações.",
        }
    }
}

/// Email já montado, pronto a entregar ao `Mailer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}
