// src/services/identity_service.rs
//! Cliente do serviço de identidade (Supabase Auth) para o login Google e o reset de senha.
use crate::{config::IdentitySettings, error::AppResult, models::user::ExternalIdentity};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` quando o token é recusado pelo serviço.
    async fn verify_token(&self, access_token: &str) -> AppResult<Option<ExternalIdentity>>;
    /// `false` quando o serviço recusa o pedido.
    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> AppResult<bool>;
    async fn update_password(&self, access_token: &str, new_password: &str) -> AppResult<bool>;
}

pub struct SupabaseIdentity {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseIdentity {
    pub fn new(settings: &IdentitySettings) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

impl SupabaseUser {
    fn into_identity(self) -> Option<ExternalIdentity> {
        let email = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty())?;
        Some(ExternalIdentity {
            email,
            full_name: self.user_metadata.full_name.or(self.user_metadata.name),
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify_token(&self, access_token: &str) -> AppResult<Option<ExternalIdentity>> {
        let response = self
            .client
            .get(self.url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Token externo recusado ({})", response.status());
            return Ok(None);
        }
        let user: SupabaseUser = response.json().await?;
        Ok(user.into_identity())
    }

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> AppResult<bool> {
        let response = self
            .client
            .post(self.url("recover"))
            .header("apikey", &self.api_key)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await?;

        let ok = response.status().is_success();
        if !ok {
            tracing::warn!("Pedido de reset recusado para {} ({})", email, response.status());
        }
        Ok(ok)
    }

    async fn update_password(&self, access_token: &str, new_password: &str) -> AppResult<bool> {
        let response = self
            .client
            .put(self.url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        let ok = response.status().is_success();
        if !ok {
            tracing::warn!("Atualização de senha recusada ({})", response.status());
        }
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_payload_prefers_full_name() {
        let user: SupabaseUser = serde_json::from_value(json!({
            "id": "abc",
            "email": "ana@example.com",
            "user_metadata": { "full_name": "Ana Souza", "name": "ana" }
        }))
        .unwrap();
        let identity = user.into_identity().unwrap();
        assert_eq!(identity.email, "ana@example.com");
        assert_eq!(identity.full_name.as_deref(), Some("Ana Souza"));
    }

    #[test]
    fn user_without_email_is_rejected() {
        let user: SupabaseUser = serde_json::from_value(json!({ "id": "abc" })).unwrap();
        assert!(user.into_identity().is_none());
    }

    #[test]
    fn endpoints_are_under_auth_v1() {
        let identity = SupabaseIdentity::new(&IdentitySettings {
            base_url: "https://proj.supabase.co".into(),
            api_key: "anon".into(),
        })
        .unwrap();
        assert_eq!(identity.url("recover"), "https://proj.supabase.co/auth/v1/recover");
    }
}
