//! Usuários de login
//!
//! Escritas síncronas: não geram task; em dry-run voltam [`Dispatch::DryRun`].

use crate::client::{Dispatch, KaonaviClient};
use crate::error::Result;
use crate::http::HttpMethod;
use crate::types::{User, UserPayload};

/// Operações sobre `/users`
pub struct Users<'a> {
    client: &'a KaonaviClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a KaonaviClient) -> Self {
        Self { client }
    }

    /// Todos os usuários (envelope `user_data`)
    pub async fn list(&self) -> Result<Vec<User>> {
        self.client.read_envelope("/users", "user_data").await
    }

    pub async fn get(&self, user_id: u64) -> Result<User> {
        self.client.read_json(&format!("/users/{}", user_id)).await
    }

    pub async fn create(&self, payload: &UserPayload) -> Result<Dispatch<User>> {
        tracing::info!("👤 Creating Kaonavi user {}", payload.email);
        self.client
            .write_json(HttpMethod::Post, "/users", payload)
            .await
    }

    pub async fn update(&self, user_id: u64, payload: &UserPayload) -> Result<Dispatch<User>> {
        self.client
            .write_json(HttpMethod::Patch, &format!("/users/{}", user_id), payload)
            .await
    }

    pub async fn delete(&self, user_id: u64) -> Result<Dispatch<()>> {
        tracing::info!("🗑️ Deleting Kaonavi user {}", user_id);
        self.client
            .write_no_content(HttpMethod::Delete, &format!("/users/{}", user_id))
            .await
    }
}
