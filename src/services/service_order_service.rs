// src/services/service_order_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        party::Page,
        service_order::{ServiceDraft, ServiceFilter, ServiceOrder, ServiceWithParties},
    },
};
use chrono::Utc;
use sqlx::{types::Json, SqlitePool};
use uuid::Uuid;

const SERVICE_COLUMNS: &str = "id, title, description, service_type, requester_id, provider_id, status, \
     value, is_monthly_package, is_courtesy, credits_used, images, request_date, completion_date, \
     created_at, updated_at";

// Mesmas colunas com o prefixo da tabela, para o JOIN
const JOINED_SELECT: &str = r#"
    SELECT s.id, s.title, s.description, s.service_type, s.requester_id, s.provider_id, s.status,
           s.value, s.is_monthly_package, s.is_courtesy, s.credits_used, s.images, s.request_date,
           s.completion_date, s.created_at, s.updated_at,
           r.name AS requester_name, r.email AS requester_email,
           p.name AS provider_name, p.email AS provider_email
    FROM services s
    LEFT JOIN requesters r ON r.id = s.requester_id
    LEFT JOIN providers p ON p.id = s.provider_id
"#;

const FILTER_CLAUSE: &str = r#"
    WHERE (?1 IS NULL OR s.requester_id = ?1)
      AND (?2 IS NULL OR s.status = ?2)
      AND (?3 IS NULL OR s.title LIKE ?3 OR s.description LIKE ?3)
"#;

/// Ordem das listagens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOrdering {
    Newest,
    RequestDate,
}

impl ServiceOrdering {
    fn sql(&self) -> &'static str {
        match self {
            ServiceOrdering::Newest => "ORDER BY s.created_at DESC",
            ServiceOrdering::RequestDate => "ORDER BY s.request_date DESC",
        }
    }
}

fn search_pattern(filter: &ServiceFilter) -> Option<String> {
    filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"))
}

/// Lista serviços com os nomes das partes. Sem `page` devolve tudo.
pub async fn list(
    db_pool: &SqlitePool,
    filter: &ServiceFilter,
    ordering: ServiceOrdering,
    page: Option<Page>,
) -> AppResult<Vec<ServiceWithParties>> {
    tracing::debug!("Listando serviços: {:?} {:?} {:?}", filter, ordering, page);
    let (limit, offset) = page.map(|p| (p.limit, p.offset())).unwrap_or((-1, 0));

    let services = sqlx::query_as::<_, ServiceWithParties>(&format!(
        "{JOINED_SELECT} {FILTER_CLAUSE} {} LIMIT ?4 OFFSET ?5",
        ordering.sql()
    ))
    .bind(filter.requester_id.as_deref())
    .bind(filter.status)
    .bind(search_pattern(filter))
    .bind(limit)
    .bind(offset)
    .fetch_all(db_pool)
    .await?;

    tracing::debug!("Encontrados {} serviços.", services.len());
    Ok(services)
}

pub async fn count(db_pool: &SqlitePool, filter: &ServiceFilter) -> AppResult<i64> {
    let total = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM services s {FILTER_CLAUSE}"))
        .bind(filter.requester_id.as_deref())
        .bind(filter.status)
        .bind(search_pattern(filter))
        .fetch_one(db_pool)
        .await?;
    Ok(total)
}

pub async fn find_with_parties(db_pool: &SqlitePool, id: &str) -> AppResult<Option<ServiceWithParties>> {
    let service = sqlx::query_as::<_, ServiceWithParties>(&format!("{JOINED_SELECT} WHERE s.id = ?1"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?;
    Ok(service)
}

pub async fn find(db_pool: &SqlitePool, id: &str) -> AppResult<Option<ServiceOrder>> {
    let service = sqlx::query_as::<_, ServiceOrder>(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?;
    Ok(service)
}

/// Grava um serviço novo. O rascunho já passou pelas regras de faturação e pela validação.
pub async fn insert(db_pool: &SqlitePool, draft: &ServiceDraft) -> AppResult<ServiceOrder> {
    let now = Utc::now();
    let service = sqlx::query_as::<_, ServiceOrder>(&format!(
        r#"
        INSERT INTO services (id, title, description, service_type, requester_id, provider_id, status,
                              value, is_monthly_package, is_courtesy, credits_used, images,
                              request_date, completion_date, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(&draft.title)
    .bind(draft.description.as_deref())
    .bind(Json(&draft.service_type))
    .bind(draft.requester_id.as_deref())
    .bind(draft.provider_id.as_deref())
    .bind(draft.status)
    .bind(draft.value.as_deref())
    .bind(draft.is_monthly_package)
    .bind(draft.is_courtesy)
    .bind(draft.credits_used)
    .bind(Json(&draft.images))
    .bind(draft.request_date)
    .bind(draft.completion_date)
    .bind(now)
    .fetch_one(db_pool)
    .await?;

    tracing::info!("✅ Serviço '{}' criado ({}).", service.title, service.id);
    Ok(service)
}

/// Reescreve a linha inteira com o rascunho resultante da junção.
pub async fn update(db_pool: &SqlitePool, id: &str, draft: &ServiceDraft) -> AppResult<ServiceOrder> {
    let service = sqlx::query_as::<_, ServiceOrder>(&format!(
        r#"
        UPDATE services SET
            title = ?1, description = ?2, service_type = ?3, requester_id = ?4, provider_id = ?5,
            status = ?6, value = ?7, is_monthly_package = ?8, is_courtesy = ?9, credits_used = ?10,
            images = ?11, request_date = ?12, completion_date = ?13, updated_at = ?14
        WHERE id = ?15
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(&draft.title)
    .bind(draft.description.as_deref())
    .bind(Json(&draft.service_type))
    .bind(draft.requester_id.as_deref())
    .bind(draft.provider_id.as_deref())
    .bind(draft.status)
    .bind(draft.value.as_deref())
    .bind(draft.is_monthly_package)
    .bind(draft.is_courtesy)
    .bind(draft.credits_used)
    .bind(Json(&draft.images))
    .bind(draft.request_date)
    .bind(draft.completion_date)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound("Service"))?;

    tracing::info!("Serviço '{}' atualizado (status {}).", service.id, service.status);
    Ok(service)
}

/// Apaga o serviço e devolve a linha removida (para limpar as imagens).
pub async fn delete(db_pool: &SqlitePool, id: &str) -> AppResult<ServiceOrder> {
    let service = sqlx::query_as::<_, ServiceOrder>(&format!(
        "DELETE FROM services WHERE id = ?1 RETURNING {SERVICE_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound("Service"))?;

    tracing::info!("Serviço '{}' apagado.", id);
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            party::{PartyForm, PartyKind},
            service_order::{ServiceInput, ServiceStatus},
        },
        services::party_service,
        test_support::test_pool,
    };

    fn draft(title: &str) -> ServiceDraft {
        ServiceInput {
            title: Some(title.into()),
            service_type: Some(vec!["Pintura".into(), "Elétrica".into()]),
            value: Some(Some("120.50".into())),
            ..Default::default()
        }
        .into_new_draft(vec!["/uploads/1-a.png".into()], Utc::now())
    }

    #[tokio::test]
    async fn insert_keeps_tags_and_images() {
        let pool = test_pool().await;
        let created = insert(&pool, &draft("Pintura da sala")).await.unwrap();

        let fetched = find(&pool, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched.service_type, vec!["Pintura".to_string(), "Elétrica".to_string()]);
        assert_eq!(fetched.images, vec!["/uploads/1-a.png".to_string()]);
        assert_eq!(fetched.value.as_deref(), Some("120.50"));
        assert_eq!(fetched.status, ServiceStatus::Pendente);
    }

    #[tokio::test]
    async fn joined_rows_carry_party_names() {
        let pool = test_pool().await;
        let requester = party_service::create(
            &pool,
            PartyKind::Requester,
            PartyForm {
                name: "Loja Centro".into(),
                email: Some("loja@example.com".into()),
                receive_email_notification: None,
            },
        )
        .await
        .unwrap();

        let mut with_requester = draft("Reparação");
        with_requester.requester_id = Some(requester.id.clone());
        let created = insert(&pool, &with_requester).await.unwrap();
        insert(&pool, &draft("Outro")).await.unwrap();

        let found = find_with_parties(&pool, &created.id).await.unwrap().unwrap();
        assert_eq!(found.requester_name.as_deref(), Some("Loja Centro"));
        assert_eq!(found.provider_name, None);

        let filter = ServiceFilter {
            requester_id: Some(requester.id.clone()),
            ..Default::default()
        };
        let only_mine = list(&pool, &filter, ServiceOrdering::Newest, None).await.unwrap();
        assert_eq!(only_mine.len(), 1);
        assert_eq!(count(&pool, &filter).await.unwrap(), 1);
        assert_eq!(count(&pool, &ServiceFilter::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_requester_violates_foreign_key() {
        let pool = test_pool().await;
        let mut bad = draft("Sem dono");
        bad.requester_id = Some("fantasma".into());
        assert!(matches!(insert(&pool, &bad).await, Err(AppError::SqlxError(_))));
    }

    #[tokio::test]
    async fn status_and_search_filters() {
        let pool = test_pool().await;
        let first = insert(&pool, &draft("Troca de janelas")).await.unwrap();
        insert(&pool, &draft("Limpeza geral")).await.unwrap();

        let mut done = draft("Troca de janelas");
        done.status = ServiceStatus::Resolvido;
        update(&pool, &first.id, &done).await.unwrap();

        let resolved = ServiceFilter {
            status: Some(ServiceStatus::Resolvido),
            ..Default::default()
        };
        assert_eq!(count(&pool, &resolved).await.unwrap(), 1);

        let search = ServiceFilter {
            search: Some("limpeza".into()),
            ..Default::default()
        };
        let found = list(&pool, &search, ServiceOrdering::RequestDate, Some(Page::new(None, None, 50)))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].service.title, "Limpeza geral");
    }

    #[tokio::test]
    async fn update_and_delete_missing_are_not_found() {
        let pool = test_pool().await;
        assert!(matches!(update(&pool, "x", &draft("X")).await, Err(AppError::NotFound("Service"))));
        assert!(matches!(delete(&pool, "x").await, Err(AppError::NotFound("Service"))));
    }
}
