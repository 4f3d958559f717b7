// src/templates.rs
use crate::{
    error::{AppError, AppResult},
    models::notification::NotificationKind,
};
use askama::Template;

pub const BRAND: &str = "Gestão Método Brandness";

/// Dados comuns às duas versões (HTML e texto) do email de notificação.
#[derive(Debug, Clone)]
pub struct NotificationView<'a> {
    pub brand: &'a str,
    pub subject: &'a str,
    pub heading: &'a str,
    pub intro: &'a str,
    pub recipient_name: Option<&'a str>,
    pub service_title: &'a str,
    pub status_label: &'a str,
}

impl<'a> NotificationView<'a> {
    pub fn new(
        kind: NotificationKind,
        subject: &'a str,
        recipient_name: Option<&'a str>,
        service_title: &'a str,
        status_label: &'a str,
    ) -> Self {
        Self {
            brand: BRAND,
            subject,
            heading: kind.heading(),
            intro: kind.intro(),
            recipient_name,
            service_title,
            status_label,
        }
    }
}

#[derive(Template)]
#[template(path = "email/notification.html")]
struct NotificationHtml<'a> {
    brand: &'a str,
    subject: &'a str,
    heading: &'a str,
    intro: &'a str,
    recipient_name: Option<&'a str>,
    service_title: &'a str,
    status_label: &'a str,
}

#[derive(Template)]
#[template(path = "email/notification.txt")]
struct NotificationText<'a> {
    brand: &'a str,
    heading: &'a str,
    intro: &'a str,
    recipient_name: Option<&'a str>,
    service_title: &'a str,
    status_label: &'a str,
}

/// Renderiza o email nas duas versões: `(html, texto)`.
pub fn render_notification(view: &NotificationView<'_>) -> AppResult<(String, String)> {
    let html = NotificationHtml {
        brand: view.brand,
        subject: view.subject,
        heading: view.heading,
        intro: view.intro,
        recipient_name: view.recipient_name,
        service_title: view.service_title,
        status_label: view.status_label,
    }
    .render();
    let text = NotificationText {
        brand: view.brand,
        heading: view.heading,
        intro: view.intro,
        recipient_name: view.recipient_name,
        service_title: view.service_title,
        status_label: view.status_label,
    }
    .render();

    match (html, text) {
        (Ok(html), Ok(text)) => Ok((html, text)),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Falha ao renderizar template de email: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escapes_service_title() {
        let view = NotificationView::new(
            NotificationKind::StatusChanged,
            "Atualização de Serviço: <b>Obra</b>",
            Some("Ana"),
            "<b>Obra</b>",
            "Resolvido",
        );
        let (html, text) = render_notification(&view).unwrap();

        assert!(html.contains("&#60;b&#62;Obra&#60;/b&#62;"));
        assert!(!html.contains("<b>Obra</b>"));
        assert!(html.contains("Atualização de Serviço"));
        assert!(html.contains("Olá Ana,"));
        assert!(text.contains("Serviço: <b>Obra</b>"));
        assert!(text.contains("Status: Resolvido"));
    }

    #[test]
    fn greeting_without_name() {
        let view = NotificationView::new(NotificationKind::Test, "Teste", None, BRAND, "Teste");
        let (_, text) = render_notification(&view).unwrap();
        assert!(text.contains("Olá,"));
        assert!(text.contains(NotificationKind::Test.intro()));
    }
}
