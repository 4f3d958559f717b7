// src/services/party_service.rs
use crate::{
    error::{AppError, AppResult},
    models::party::{Page, Party, PartyForm, PartyKind, PartyPage},
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const PARTY_COLUMNS: &str = "id, name, email, receive_email_notification, created_at, updated_at";

fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"))
}

/// Lista paginada, mais recentes primeiro. A pesquisa procura no nome e no email,
/// e o total conta apenas as linhas que passam no filtro.
pub async fn list(
    db_pool: &SqlitePool,
    kind: PartyKind,
    page: Page,
    search: Option<&str>,
) -> AppResult<PartyPage> {
    let table = kind.table();
    let pattern = search_pattern(search);
    tracing::debug!(
        "Listando {} (página {}, limite {}, pesquisa {:?})",
        table,
        page.page,
        page.limit,
        pattern
    );

    let items = sqlx::query_as::<_, Party>(&format!(
        r#"
        SELECT {PARTY_COLUMNS} FROM {table}
        WHERE ?1 IS NULL OR name LIKE ?1 OR email LIKE ?1
        ORDER BY created_at DESC
        LIMIT ?2 OFFSET ?3
        "#
    ))
    .bind(pattern.as_deref())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(db_pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {table} WHERE ?1 IS NULL OR name LIKE ?1 OR email LIKE ?1"
    ))
    .bind(pattern.as_deref())
    .fetch_one(db_pool)
    .await?;

    Ok(PartyPage {
        items,
        total,
        page: page.page,
        limit: page.limit,
    })
}

/// Todos os contactos de um tipo (usado nos emails de teste).
pub async fn list_all(db_pool: &SqlitePool, kind: PartyKind) -> AppResult<Vec<Party>> {
    let parties = sqlx::query_as::<_, Party>(&format!(
        "SELECT {PARTY_COLUMNS} FROM {} ORDER BY name ASC",
        kind.table()
    ))
    .fetch_all(db_pool)
    .await?;
    Ok(parties)
}

pub async fn find(db_pool: &SqlitePool, kind: PartyKind, id: &str) -> AppResult<Option<Party>> {
    let party = sqlx::query_as::<_, Party>(&format!(
        "SELECT {PARTY_COLUMNS} FROM {} WHERE id = ?1",
        kind.table()
    ))
    .bind(id)
    .fetch_optional(db_pool)
    .await?;
    Ok(party)
}

pub async fn create(db_pool: &SqlitePool, kind: PartyKind, form: PartyForm) -> AppResult<Party> {
    let now = Utc::now();
    let party = sqlx::query_as::<_, Party>(&format!(
        r#"
        INSERT INTO {} (id, name, email, receive_email_notification, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        RETURNING {PARTY_COLUMNS}
        "#,
        kind.table()
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(&form.name)
    .bind(form.email.as_deref())
    .bind(form.receive_email_notification.unwrap_or(true))
    .bind(now)
    .fetch_one(db_pool)
    .await?;

    tracing::info!("✅ {} '{}' criado ({}).", kind.label(), party.name, party.id);
    Ok(party)
}

/// Substitui nome e email; a flag de notificação só muda se vier no pedido.
pub async fn update(db_pool: &SqlitePool, kind: PartyKind, id: &str, form: PartyForm) -> AppResult<Party> {
    let party = sqlx::query_as::<_, Party>(&format!(
        r#"
        UPDATE {} SET
            name = ?1,
            email = ?2,
            receive_email_notification = COALESCE(?3, receive_email_notification),
            updated_at = ?4
        WHERE id = ?5
        RETURNING {PARTY_COLUMNS}
        "#,
        kind.table()
    ))
    .bind(&form.name)
    .bind(form.email.as_deref())
    .bind(form.receive_email_notification)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound(kind.label()))?;

    tracing::info!("{} '{}' atualizado.", kind.label(), id);
    Ok(party)
}

/// Apaga o registo. Serviços que ainda o referenciam fazem falhar a chave estrangeira
/// e o erro da base de dados segue para o cliente.
pub async fn delete(db_pool: &SqlitePool, kind: PartyKind, id: &str) -> AppResult<()> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", kind.table()))
        .bind(id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(kind.label()));
    }
    tracing::info!("{} '{}' apagado.", kind.label(), id);
    Ok(())
}

pub async fn count(db_pool: &SqlitePool, kind: PartyKind) -> AppResult<i64> {
    let total = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", kind.table()))
        .fetch_one(db_pool)
        .await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;

    fn form(name: &str, email: Option<&str>) -> PartyForm {
        PartyForm {
            name: name.into(),
            email: email.map(Into::into),
            receive_email_notification: None,
        }
    }

    #[tokio::test]
    async fn create_find_update_delete() {
        let pool = test_pool().await;
        let created = create(&pool, PartyKind::Provider, form("Eletro Lda", Some("eletro@example.com")))
            .await
            .unwrap();
        assert!(created.receive_email_notification);

        let found = find(&pool, PartyKind::Provider, &created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Eletro Lda");
        // Tabelas separadas: o mesmo ID não existe como solicitante
        assert!(find(&pool, PartyKind::Requester, &created.id).await.unwrap().is_none());

        let mut changes = form("Eletro SA", None);
        changes.receive_email_notification = Some(false);
        let updated = update(&pool, PartyKind::Provider, &created.id, changes).await.unwrap();
        assert_eq!(updated.name, "Eletro SA");
        assert_eq!(updated.email, None);
        assert!(!updated.receive_email_notification);

        delete(&pool, PartyKind::Provider, &created.id).await.unwrap();
        assert!(matches!(
            delete(&pool, PartyKind::Provider, &created.id).await,
            Err(AppError::NotFound("Provider"))
        ));
    }

    #[tokio::test]
    async fn delete_referenced_requester_fails_on_foreign_key() {
        use crate::{models::service_order::ServiceInput, services::service_order_service};

        let pool = test_pool().await;
        let requester = create(&pool, PartyKind::Requester, form("Condomínio", None)).await.unwrap();
        let draft = ServiceInput {
            title: Some("Limpeza".into()),
            requester_id: Some(Some(requester.id.clone())),
            ..Default::default()
        }
        .into_new_draft(vec![], Utc::now());
        service_order_service::insert(&pool, &draft).await.unwrap();

        let err = delete(&pool, PartyKind::Requester, &requester.id).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        match err {
            AppError::SqlxError(e) => assert!(e.to_string().contains("FOREIGN KEY")),
            other => panic!("erro inesperado: {other:?}"),
        }
        assert!(find(&pool, PartyKind::Requester, &requester.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let pool = test_pool().await;
        let result = update(&pool, PartyKind::Requester, "nao-existe", form("X", None)).await;
        assert!(matches!(result, Err(AppError::NotFound("Requester"))));
    }

    #[tokio::test]
    async fn search_filters_items_and_total() {
        let pool = test_pool().await;
        for (name, email) in [
            ("Ana Souza", "ana@example.com"),
            ("Bruno Lima", "bruno@example.com"),
            ("Carla Souza", "carla@empresa.pt"),
        ] {
            create(&pool, PartyKind::Requester, form(name, Some(email))).await.unwrap();
        }

        let result = list(&pool, PartyKind::Requester, Page::new(None, None, 10), Some("souza"))
            .await
            .unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.items.len(), 2);

        let by_email = list(&pool, PartyKind::Requester, Page::new(None, None, 10), Some("empresa"))
            .await
            .unwrap();
        assert_eq!(by_email.total, 1);
        assert_eq!(by_email.items[0].name, "Carla Souza");

        let paged = list(&pool, PartyKind::Requester, Page::new(Some(2), Some(2), 10), None)
            .await
            .unwrap();
        assert_eq!(paged.total, 3);
        assert_eq!(paged.items.len(), 1);
    }
}
