// src/services/notification_service.rs
use crate::{
    config::SmtpSettings,
    error::{AppError, AppResult},
    models::{
        notification::{NotificationKind, NotificationSettings, OutgoingEmail},
        party::{Party, PartyKind},
        service_order::ServiceOrder,
    },
    services::{party_service, user_service},
    templates::{render_notification, NotificationView, BRAND},
};
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Entrega de emails já montados.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings, from: &str) -> AppResult<Self> {
        // 465 usa TLS implícito; as outras portas negociam STARTTLS
        let builder = if settings.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| AppError::Email(format!("SMTP inválido ({}): {}", settings.host, e)))?
        .port(settings.port);

        let builder = match (&settings.username, &settings.password) {
            (Some(user), Some(password)) => builder.credentials(Credentials::new(user.clone(), password.clone())),
            _ => builder,
        };

        let from = from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Remetente inválido ({from}): {e}")))?;

        tracing::info!("📧 SMTP configurado: {}:{}", settings.host, settings.port);
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Destinatário inválido ({}): {}", email.to, e)))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(email.text.clone(), email.html.clone()))
            .map_err(|e| AppError::Email(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;
        Ok(())
    }
}

/// Usado quando não há SMTP configurado: o email fica apenas no log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        tracing::info!("📧 (sem SMTP) Email para {}: {}", email.to, email.subject);
        tracing::debug!("{}", email.text);
        Ok(())
    }
}

pub fn build_mailer(smtp: Option<&SmtpSettings>, from: &str) -> AppResult<Arc<dyn Mailer>> {
    match smtp {
        Some(settings) => Ok(Arc::new(SmtpMailer::new(settings, from)?)),
        None => {
            tracing::warn!("⚠️ SMTP_HOST não definido: emails apenas registados no log.");
            Ok(Arc::new(LogMailer))
        }
    }
}

// --- Preferências ---

pub async fn load_settings(db_pool: &SqlitePool) -> AppResult<NotificationSettings> {
    let settings = sqlx::query_as::<_, NotificationSettings>(
        "SELECT email_notifications, notify_providers, notify_requesters FROM notification_settings WHERE id = 1",
    )
    .fetch_optional(db_pool)
    .await?;
    Ok(settings.unwrap_or_default())
}

pub async fn save_settings(db_pool: &SqlitePool, settings: &NotificationSettings) -> AppResult<NotificationSettings> {
    sqlx::query(
        r#"
        INSERT INTO notification_settings (id, email_notifications, notify_providers, notify_requesters)
        VALUES (1, ?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET
            email_notifications = excluded.email_notifications,
            notify_providers = excluded.notify_providers,
            notify_requesters = excluded.notify_requesters
        "#,
    )
    .bind(settings.email_notifications)
    .bind(settings.notify_providers)
    .bind(settings.notify_requesters)
    .execute(db_pool)
    .await?;

    tracing::info!("Preferências de notificação gravadas: {:?}", settings);
    load_settings(db_pool).await
}

// --- Envio ---

pub fn compose(
    kind: NotificationKind,
    to: &str,
    recipient_name: Option<&str>,
    subject: String,
    service_title: &str,
    status_label: &str,
) -> AppResult<OutgoingEmail> {
    let view = NotificationView::new(kind, &subject, recipient_name, service_title, status_label);
    let (html, text) = render_notification(&view)?;
    Ok(OutgoingEmail {
        to: to.to_string(),
        subject,
        html,
        text,
    })
}

/// Envia e regista o resultado. Uma falha nunca sobe para quem chamou.
async fn deliver(mailer: &dyn Mailer, email: AppResult<OutgoingEmail>) -> bool {
    let email = match email {
        Ok(email) => email,
        Err(e) => {
            tracing::error!("Email não montado: {:?}", e);
            return false;
        }
    };
    match mailer.send(&email).await {
        Ok(()) => {
            tracing::info!("✅ Email enviado para {}: {}", email.to, email.subject);
            true
        }
        Err(e) => {
            tracing::error!("Erro ao enviar email para {}: {:?}", email.to, e);
            false
        }
    }
}

/// Destinatário de um tipo, se a preferência global e a do contacto o permitirem.
async fn recipient(
    db_pool: &SqlitePool,
    settings: &NotificationSettings,
    kind: PartyKind,
    party_id: Option<&str>,
) -> Option<Party> {
    let enabled = settings.email_notifications
        && match kind {
            PartyKind::Requester => settings.notify_requesters,
            PartyKind::Provider => settings.notify_providers,
        };
    let party_id = party_id.filter(|_| enabled)?;

    match party_service::find(db_pool, kind, party_id).await {
        Ok(Some(party)) if party.notification_address().is_some() => Some(party),
        Ok(_) => None,
        Err(e) => {
            tracing::error!("Erro ao buscar {} {}: {:?}", kind.label(), party_id, e);
            None
        }
    }
}

async fn notify_parties(
    db_pool: &SqlitePool,
    mailer: &dyn Mailer,
    kind: NotificationKind,
    service: &ServiceOrder,
) -> usize {
    let settings = match load_settings(db_pool).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Preferências de notificação indisponíveis: {:?}", e);
            return 0;
        }
    };

    let (requester_subject, provider_subject) = match kind {
        NotificationKind::ServiceCreated => (
            format!("Novo Serviço Criado: {}", service.title),
            format!("Novo Serviço Atribuído: {}", service.title),
        ),
        _ => {
            let subject = format!("Atualização de Serviço: {}", service.title);
            (subject.clone(), subject)
        }
    };

    let targets = [
        (PartyKind::Requester, service.requester_id.as_deref(), requester_subject),
        (PartyKind::Provider, service.provider_id.as_deref(), provider_subject),
    ];

    let mut sent = 0;
    for (party_kind, party_id, subject) in targets {
        let Some(party) = recipient(db_pool, &settings, party_kind, party_id).await else {
            continue;
        };
        let Some(address) = party.notification_address() else {
            continue;
        };
        let email = compose(
            kind,
            address,
            Some(&party.name),
            subject,
            &service.title,
            service.status.label(),
        );
        if deliver(mailer, email).await {
            sent += 1;
        }
    }
    sent
}

pub async fn notify_service_created(db_pool: &SqlitePool, mailer: &dyn Mailer, service: &ServiceOrder) -> usize {
    notify_parties(db_pool, mailer, NotificationKind::ServiceCreated, service).await
}

pub async fn notify_status_changed(db_pool: &SqlitePool, mailer: &dyn Mailer, service: &ServiceOrder) -> usize {
    notify_parties(db_pool, mailer, NotificationKind::StatusChanged, service).await
}

/// Dispara a notificação numa task própria; a resposta HTTP não espera por ela.
pub fn spawn_notification(
    db_pool: SqlitePool,
    mailer: Arc<dyn Mailer>,
    kind: NotificationKind,
    service: ServiceOrder,
) {
    tokio::spawn(async move {
        let sent = match kind {
            NotificationKind::ServiceCreated => notify_service_created(&db_pool, mailer.as_ref(), &service).await,
            NotificationKind::StatusChanged => notify_status_changed(&db_pool, mailer.as_ref(), &service).await,
            NotificationKind::Test => 0,
        };
        tracing::debug!("Notificações processadas para '{}': {} enviadas", service.id, sent);
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailReport {
    pub emails_sent: usize,
    pub emails_total: usize,
}

/// Email de teste para fornecedores e solicitantes com notificação ativa e para todos os utilizadores.
pub async fn send_test_emails(db_pool: &SqlitePool, mailer: &dyn Mailer) -> AppResult<TestEmailReport> {
    let mut outbox: Vec<(String, Option<String>, &'static str)> = Vec::new();

    for (kind, subject) in [
        (PartyKind::Provider, "Teste de Notificação - Fornecedor"),
        (PartyKind::Requester, "Teste de Notificação - Solicitante"),
    ] {
        for party in party_service::list_all(db_pool, kind).await? {
            if let Some(address) = party.notification_address() {
                outbox.push((address.to_string(), Some(party.name.clone()), subject));
            }
        }
    }
    for user in user_service::find_all_users(db_pool).await? {
        outbox.push((user.email, Some(user.first_name), "Teste de Notificação - Usuário do Sistema"));
    }

    let mut report = TestEmailReport {
        emails_sent: 0,
        emails_total: outbox.len(),
    };
    for (to, name, subject) in outbox {
        let email = compose(NotificationKind::Test, &to, name.as_deref(), subject.to_string(), BRAND, "Teste");
        if deliver(mailer, email).await {
            report.emails_sent += 1;
        }
    }

    tracing::info!(
        "Teste de notificações concluído: {}/{} enviados",
        report.emails_sent,
        report.emails_total
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{party::PartyForm, service_order::ServiceInput},
        services::service_order_service,
        test_support::{test_pool, RecordingMailer},
    };
    use chrono::Utc;

    async fn party(pool: &SqlitePool, kind: PartyKind, name: &str, email: &str, notify: bool) -> Party {
        party_service::create(
            pool,
            kind,
            PartyForm {
                name: name.into(),
                email: Some(email.into()),
                receive_email_notification: Some(notify),
            },
        )
        .await
        .unwrap()
    }

    async fn service_for(pool: &SqlitePool, requester: &Party, provider: &Party) -> ServiceOrder {
        let mut draft = ServiceInput {
            title: Some("Instalação".into()),
            ..Default::default()
        }
        .into_new_draft(vec![], Utc::now());
        draft.requester_id = Some(requester.id.clone());
        draft.provider_id = Some(provider.id.clone());
        service_order_service::insert(pool, &draft).await.unwrap()
    }

    #[tokio::test]
    async fn created_service_mails_both_parties() {
        let pool = test_pool().await;
        let requester = party(&pool, PartyKind::Requester, "Loja", "loja@example.com", true).await;
        let provider = party(&pool, PartyKind::Provider, "Técnico", "tec@example.com", true).await;
        let service = service_for(&pool, &requester, &provider).await;

        let mailer = RecordingMailer::default();
        assert_eq!(notify_service_created(&pool, &mailer, &service).await, 2);

        let sent = mailer.sent();
        assert_eq!(sent[0].to, "loja@example.com");
        assert_eq!(sent[0].subject, "Novo Serviço Criado: Instalação");
        assert_eq!(sent[1].to, "tec@example.com");
        assert_eq!(sent[1].subject, "Novo Serviço Atribuído: Instalação");
        assert!(sent[1].text.contains("Status: Pendente"));
    }

    #[tokio::test]
    async fn contact_flag_and_settings_gate_recipients() {
        let pool = test_pool().await;
        let requester = party(&pool, PartyKind::Requester, "Loja", "loja@example.com", false).await;
        let provider = party(&pool, PartyKind::Provider, "Técnico", "tec@example.com", true).await;
        let service = service_for(&pool, &requester, &provider).await;

        let mailer = RecordingMailer::default();
        assert_eq!(notify_status_changed(&pool, &mailer, &service).await, 1);
        assert_eq!(mailer.sent()[0].subject, "Atualização de Serviço: Instalação");

        save_settings(
            &pool,
            &NotificationSettings {
                notify_providers: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(notify_status_changed(&pool, &mailer, &service).await, 0);
    }

    #[tokio::test]
    async fn failed_delivery_is_not_counted() {
        let pool = test_pool().await;
        let requester = party(&pool, PartyKind::Requester, "Loja", "loja@example.com", true).await;
        let provider = party(&pool, PartyKind::Provider, "Técnico", "tec@example.com", true).await;
        let service = service_for(&pool, &requester, &provider).await;

        let mailer = RecordingMailer::failing_for("tec@example.com");
        assert_eq!(notify_service_created(&pool, &mailer, &service).await, 1);
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let pool = test_pool().await;
        assert_eq!(load_settings(&pool).await.unwrap(), NotificationSettings::default());

        let off = NotificationSettings {
            email_notifications: false,
            notify_providers: true,
            notify_requesters: false,
        };
        assert_eq!(save_settings(&pool, &off).await.unwrap(), off);
        assert_eq!(load_settings(&pool).await.unwrap(), off);
    }

    #[tokio::test]
    async fn test_emails_cover_contacts_and_users() {
        let pool = test_pool().await;
        party(&pool, PartyKind::Requester, "Loja", "loja@example.com", true).await;
        party(&pool, PartyKind::Provider, "Calado", "calado@example.com", false).await;
        user_service::create_local_user(
            &pool,
            user_service::NewLocalUser {
                email: "gestor@example.com",
                first_name: "Gestor",
                last_name: None,
                raw_password: "segredo123",
                user_type: crate::models::user::UserType::Visualizador,
                is_admin: false,
            },
        )
        .await
        .unwrap();

        let mailer = RecordingMailer::default();
        let report = send_test_emails(&pool, &mailer).await.unwrap();
        assert_eq!(report, TestEmailReport { emails_sent: 2, emails_total: 2 });
        assert!(mailer
            .sent()
            .iter()
            .any(|e| e.subject == "Teste de Notificação - Usuário do Sistema"));
    }
}
