// src/models/party.rs
// Solicitantes e fornecedores têm exatamente a mesma forma; só muda a tabela.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyKind {
    Requester,
    Provider,
}

impl PartyKind {
    pub fn table(&self) -> &'static str {
        match self {
            PartyKind::Requester => "requesters",
            PartyKind::Provider => "providers",
        }
    }

    /// Nome usado nas mensagens de erro e nas chaves JSON do singular.
    pub fn label(&self) -> &'static str {
        match self {
            PartyKind::Requester => "Requester",
            PartyKind::Provider => "Provider",
        }
    }

    pub fn singular_key(&self) -> &'static str {
        match self {
            PartyKind::Requester => "requester",
            PartyKind::Provider => "provider",
        }
    }

    pub fn plural_key(&self) -> &'static str {
        self.table()
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub receive_email_notification: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Party {
    /// Email do contacto, apenas se quiser receber notificações.
    pub fn notification_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty() && self.receive_email_notification)
    }
}

// Corpo de criação/edição (POST e PUT)
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PartyForm {
    #[validate(length(min = 1, message = "Nome é obrigatório"))]
    #[serde(default)]
    pub name: String,
    #[validate(email(message = "Email inválido"))]
    pub email: Option<String>,
    pub receive_email_notification: Option<bool>,
}

impl PartyForm {
    /// Limpa espaços e trata email vazio como ausente.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// Página validada (1-based) com limite entre 1 e 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(default_limit)
                .min(Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct PartyPage {
    pub items: Vec<Party>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(Page::new(None, None, 10), Page { page: 1, limit: 10 });
        assert_eq!(Page::new(Some(0), Some(-3), 10), Page { page: 1, limit: 10 });
        assert_eq!(Page::new(Some(3), Some(500), 10).limit, Page::MAX_LIMIT);
        assert_eq!(Page::new(Some(3), Some(20), 10).offset(), 40);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let page = Page::new(Some(i64::MAX), Some(100), 10);
        assert_eq!(page.offset(), i64::MAX);
        assert_eq!(Page::new(Some(i64::MAX), None, 10).offset(), i64::MAX);
    }

    #[test]
    fn blank_email_is_dropped() {
        let form = PartyForm {
            name: "  Oficina Central ".into(),
            email: Some("   ".into()),
            receive_email_notification: None,
        }
        .normalized();
        assert_eq!(form.name, "Oficina Central");
        assert!(form.email.is_none());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn notification_address_respects_flag() {
        let now = Utc::now();
        let mut party = Party {
            id: "1".into(),
            name: "Ana".into(),
            email: Some("ana@example.com".into()),
            receive_email_notification: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(party.notification_address(), Some("ana@example.com"));
        party.receive_email_notification = false;
        assert_eq!(party.notification_address(), None);
    }
}
