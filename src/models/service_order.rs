// src/models/service_order.rs
use crate::error::{field_errors, FieldError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use validator::Validate;

/// Tipo atribuído quando o formulário de criação não indica nenhum.
pub const DEFAULT_SERVICE_TYPE: &str = "Geral";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    #[default]
    Pendente,
    Resolvido,
    Programado,
    Cancelado,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 4] = [
        ServiceStatus::Pendente,
        ServiceStatus::Resolvido,
        ServiceStatus::Programado,
        ServiceStatus::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pendente => "PENDENTE",
            ServiceStatus::Resolvido => "RESOLVIDO",
            ServiceStatus::Programado => "PROGRAMADO",
            ServiceStatus::Cancelado => "CANCELADO",
        }
    }

    /// Rótulo mostrado nos emails.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceStatus::Pendente => "Pendente",
            ServiceStatus::Resolvido => "Resolvido",
            ServiceStatus::Programado => "Programado",
            ServiceStatus::Cancelado => "Cancelado",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDENTE" => Ok(ServiceStatus::Pendente),
            "RESOLVIDO" => Ok(ServiceStatus::Resolvido),
            "PROGRAMADO" => Ok(ServiceStatus::Programado),
            "CANCELADO" => Ok(ServiceStatus::Cancelado),
            other => Err(format!("Status inválido: {other}")),
        }
    }
}

// Linha da tabela 'services'
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(json)]
    pub service_type: Vec<String>,
    pub requester_id: Option<String>,
    pub provider_id: Option<String>,
    pub status: ServiceStatus,
    pub value: Option<String>,
    pub is_monthly_package: bool,
    pub is_courtesy: bool,
    pub credits_used: i64,
    #[sqlx(json)]
    pub images: Vec<String>,
    pub request_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serviço com os nomes e emails das partes (LEFT JOIN).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWithParties {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub service: ServiceOrder,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub provider_name: Option<String>,
    pub provider_email: Option<String>,
}

/// Registo completo pronto a gravar; sai sempre de `apply_billing_rules` + `check`.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct ServiceDraft {
    #[validate(length(min = 1, message = "Título é obrigatório"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Selecione pelo menos um tipo de serviço"))]
    pub service_type: Vec<String>,
    pub requester_id: Option<String>,
    pub provider_id: Option<String>,
    pub status: ServiceStatus,
    pub value: Option<String>,
    pub is_monthly_package: bool,
    pub is_courtesy: bool,
    #[validate(range(min = 0, max = 4, message = "Créditos utilizados devem estar entre 0 e 4"))]
    pub credits_used: i64,
    pub images: Vec<String>,
    pub request_date: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
}

impl ServiceDraft {
    /// Cortesia e pacote mensal excluem-se; ambos anulam o valor.
    /// Se os dois vierem marcados, prevalece a cortesia.
    pub fn apply_billing_rules(&mut self) {
        if self.is_courtesy {
            self.is_monthly_package = false;
            self.value = None;
            self.credits_used = 0;
        } else if self.is_monthly_package {
            self.value = None;
            if self.credits_used == 0 {
                self.credits_used = 1;
            }
        }
    }

    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        if let Some(value) = &self.value {
            if parse_amount(value).is_none() {
                errors.push(FieldError::new("value", "invalid_decimal", "Valor inválido"));
            }
        }
        if self.is_monthly_package && self.credits_used < 1 {
            errors.push(FieldError::new(
                "creditsUsed",
                "range",
                "Pacote mensal consome entre 1 e 4 créditos",
            ));
        }
        if let Some(done) = self.completion_date {
            if done < self.request_date {
                errors.push(FieldError::new(
                    "completionDate",
                    "invalid_date",
                    "Data de conclusão anterior à data do pedido",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Campos recebidos num pedido de criação/edição. `None` = campo ausente;
/// `Some(None)` = campo enviado vazio (limpa o valor).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceInput {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub service_type: Option<Vec<String>>,
    pub requester_id: Option<Option<String>>,
    pub provider_id: Option<Option<String>>,
    pub status: Option<ServiceStatus>,
    pub value: Option<Option<String>>,
    pub is_monthly_package: Option<bool>,
    pub is_courtesy: Option<bool>,
    pub credits_used: Option<i64>,
    pub request_date: Option<DateTime<Utc>>,
    pub completion_date: Option<Option<DateTime<Utc>>>,
    pub images_to_delete: Vec<String>,
}

impl ServiceInput {
    pub fn into_new_draft(self, images: Vec<String>, now: DateTime<Utc>) -> ServiceDraft {
        let mut service_type = normalize_tags(self.service_type.unwrap_or_default());
        if service_type.is_empty() {
            service_type.push(DEFAULT_SERVICE_TYPE.to_string());
        }

        let mut draft = ServiceDraft {
            title: self.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            description: self.description.flatten(),
            service_type,
            requester_id: self.requester_id.flatten(),
            provider_id: self.provider_id.flatten(),
            status: self.status.unwrap_or_default(),
            value: self.value.flatten().map(|v| normalize_amount(&v)),
            is_monthly_package: self.is_monthly_package.unwrap_or(false),
            is_courtesy: self.is_courtesy.unwrap_or(false),
            credits_used: self.credits_used.unwrap_or(0),
            images,
            request_date: self.request_date.unwrap_or(now),
            completion_date: self.completion_date.flatten(),
        };
        draft.apply_billing_rules();
        draft
    }

    /// Junta os campos enviados ao registo atual. Devolve o rascunho e as imagens
    /// que deixaram de pertencer ao serviço (só as que lhe pertenciam de facto).
    pub fn merge_into(self, current: &ServiceOrder, uploaded: Vec<String>) -> (ServiceDraft, Vec<String>) {
        let (kept, removed): (Vec<String>, Vec<String>) = current
            .images
            .iter()
            .cloned()
            .partition(|img| !self.images_to_delete.contains(img));
        let mut images = kept;
        images.extend(uploaded);

        // Marcar explicitamente um dos modos desliga o outro se este não vier no pedido
        let (mut is_monthly_package, mut is_courtesy) = (current.is_monthly_package, current.is_courtesy);
        match (self.is_monthly_package, self.is_courtesy) {
            (Some(monthly), Some(courtesy)) => {
                is_monthly_package = monthly;
                is_courtesy = courtesy;
            }
            (Some(monthly), None) => {
                is_monthly_package = monthly;
                if monthly {
                    is_courtesy = false;
                }
            }
            (None, Some(courtesy)) => {
                is_courtesy = courtesy;
                if courtesy {
                    is_monthly_package = false;
                }
            }
            (None, None) => {}
        }

        let mut draft = ServiceDraft {
            title: self
                .title
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| current.title.clone()),
            description: self.description.unwrap_or_else(|| current.description.clone()),
            service_type: self
                .service_type
                .map(normalize_tags)
                .unwrap_or_else(|| current.service_type.clone()),
            requester_id: self.requester_id.unwrap_or_else(|| current.requester_id.clone()),
            provider_id: self.provider_id.unwrap_or_else(|| current.provider_id.clone()),
            status: self.status.unwrap_or(current.status),
            value: self
                .value
                .map(|v| v.map(|v| normalize_amount(&v)))
                .unwrap_or_else(|| current.value.clone()),
            is_monthly_package,
            is_courtesy,
            credits_used: self.credits_used.unwrap_or(current.credits_used),
            images,
            request_date: self.request_date.unwrap_or(current.request_date),
            completion_date: self.completion_date.unwrap_or(current.completion_date),
        };
        draft.apply_billing_rules();
        (draft, removed)
    }
}

/// Remove vazios e repetidos mantendo a ordem de chegada.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

fn normalize_amount(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

/// Interpreta o valor decimal guardado como texto. Negativos e NaN são rejeitados.
pub fn parse_amount(raw: &str) -> Option<f64> {
    normalize_amount(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Aceita RFC 3339, `YYYY-MM-DDTHH:MM` (input datetime-local) ou `YYYY-MM-DD`.
pub fn parse_form_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Filtros das listagens de serviços.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub requester_id: Option<String>,
    pub status: Option<ServiceStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListParams {
    pub requester_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
