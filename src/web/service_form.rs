// src/web/service_form.rs
//! Leitura do formulário multipart de criação/edição de serviços.
use crate::{
    error::{AppError, AppResult, FieldError},
    models::service_order::{parse_form_date, ServiceInput, ServiceStatus},
    services::upload_service::UploadStore,
};
use axum::extract::Multipart;

/// Formulário lido, com os caminhos públicos das imagens já gravadas.
#[derive(Debug, Default)]
pub struct ServiceForm {
    pub input: ServiceInput,
    pub uploaded: Vec<String>,
}

/// Lê todos os campos. Se algo falhar, as imagens já gravadas por este pedido são apagadas.
pub async fn read_service_form(
    multipart: &mut Multipart,
    uploads: &UploadStore,
    max_files: usize,
) -> AppResult<ServiceForm> {
    let mut form = ServiceForm::default();
    match read_fields(multipart, uploads, max_files, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            uploads.remove_all(&form.uploaded).await;
            Err(e)
        }
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    uploads: &UploadStore,
    max_files: usize,
    form: &mut ServiceForm,
) -> AppResult<()> {
    let mut errors: Vec<FieldError> = Vec::new();
    let input = &mut form.input;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "images" || name == "images[]" {
            if form.uploaded.len() >= max_files {
                return Err(AppError::BadRequest(format!("Too many files (max {max_files})")));
            }
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(bad_multipart)?;
            // Campo de ficheiro vazio (nenhuma imagem escolhida)
            if bytes.is_empty() && file_name.as_deref().unwrap_or_default().is_empty() {
                continue;
            }
            let path = uploads
                .save_image(file_name.as_deref(), content_type.as_deref(), &bytes)
                .await?;
            form.uploaded.push(path);
            continue;
        }

        let text = field.text().await.map_err(bad_multipart)?;
        match name.as_str() {
            "title" => input.title = Some(text),
            "description" => input.description = Some(non_empty(text)),
            "serviceType" | "serviceType[]" => push_tags(input, &text, &mut errors),
            n if n.starts_with("serviceType[") && n.ends_with(']') => push_tags(input, &text, &mut errors),
            "requesterId" => input.requester_id = Some(non_empty(text)),
            "providerId" => input.provider_id = Some(non_empty(text)),
            "status" => match non_empty(text) {
                None => {}
                Some(raw) => match raw.parse::<ServiceStatus>() {
                    Ok(status) => input.status = Some(status),
                    Err(msg) => errors.push(FieldError::new("status", "invalid_enum_value", msg)),
                },
            },
            "value" => input.value = Some(non_empty(text)),
            "isMonthlyPackage" => match parse_bool(&text) {
                Some(flag) => input.is_monthly_package = Some(flag),
                None => errors.push(FieldError::new("isMonthlyPackage", "invalid_type", "Esperado true ou false")),
            },
            "isCourtesy" => match parse_bool(&text) {
                Some(flag) => input.is_courtesy = Some(flag),
                None => errors.push(FieldError::new("isCourtesy", "invalid_type", "Esperado true ou false")),
            },
            "creditsUsed" => match non_empty(text) {
                None => {}
                Some(raw) => match raw.parse::<i64>() {
                    Ok(credits) => input.credits_used = Some(credits),
                    Err(_) => errors.push(FieldError::new("creditsUsed", "invalid_type", "Número inválido")),
                },
            },
            "requestDate" => match non_empty(text) {
                None => {}
                Some(raw) => match parse_form_date(&raw) {
                    Some(date) => input.request_date = Some(date),
                    None => errors.push(FieldError::new("requestDate", "invalid_date", "Data inválida")),
                },
            },
            "completionDate" => match non_empty(text) {
                None => input.completion_date = Some(None),
                Some(raw) => match parse_form_date(&raw) {
                    Some(date) => input.completion_date = Some(Some(date)),
                    None => errors.push(FieldError::new("completionDate", "invalid_date", "Data inválida")),
                },
            },
            "imagesToDelete" | "imagesToDelete[]" => match parse_string_list(&text) {
                Some(paths) => input.images_to_delete.extend(paths),
                None => errors.push(FieldError::new("imagesToDelete", "invalid_type", "Lista de imagens inválida")),
            },
            other => tracing::debug!("Campo multipart ignorado: {}", other),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    tracing::warn!("Corpo multipart inválido: {}", e);
    AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
}

/// Vazio, "null" e "undefined" (o que o FormData do browser envia) contam como ausente.
fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Array JSON (`["a","b"]`) ou um único valor.
fn parse_string_list(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<String>>(trimmed).ok()
    } else if trimmed.is_empty() {
        Some(Vec::new())
    } else {
        Some(vec![trimmed.to_string()])
    }
}

fn push_tags(input: &mut ServiceInput, text: &str, errors: &mut Vec<FieldError>) {
    match parse_string_list(text) {
        Some(tags) => input.service_type.get_or_insert_with(Vec::new).extend(tags),
        None => errors.push(FieldError::new("serviceType", "invalid_type", "Tipos de serviço inválidos")),
    }
}
