use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use super::AdminKey;

/// Row of the provider's `proposals` relation. Field names follow the
/// relation's columns; rows are returned to the client verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    /// Opaque structured payload; stored and returned untouched.
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Server-authoritative operations on the `proposals` relation.
#[async_trait]
pub trait DataClient: Send + Sync {
    /// Rows owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Proposal>, DataError>;

    async fn insert(
        &self,
        owner_id: Uuid,
        title: &str,
        payload: Value,
    ) -> Result<Proposal, DataError>;
}

/// PostgREST-backed data client, authenticated with the service-role key so
/// this service, not the caller, is authoritative over row access.
pub struct PostgrestClient {
    http: reqwest::Client,
    base_url: String,
    admin_key: AdminKey,
}

impl PostgrestClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, admin_key: AdminKey) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            admin_key,
        }
    }

    fn proposals_url(&self) -> String {
        format!("{}/rest/v1/proposals", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.admin_key.0)
            .bearer_auth(&self.admin_key.0)
    }
}

#[async_trait]
impl DataClient for PostgrestClient {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Proposal>, DataError> {
        let response = self
            .authed(self.http.get(self.proposals_url()))
            .query(&[
                ("select", "*"),
                ("user_id", &format!("eq.{owner_id}")),
                ("order", "created_at.desc"),
            ])
            .send()
            .await
            .map_err(|e| DataError::StorageUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::StorageUnavailable(format!(
                "list returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DataError::StorageUnavailable(e.to_string()))
    }

    async fn insert(
        &self,
        owner_id: Uuid,
        title: &str,
        payload: Value,
    ) -> Result<Proposal, DataError> {
        // The payload goes through as structured JSON; the target column is
        // jsonb, so no stringification.
        let body = json!([{ "user_id": owner_id, "title": title, "data": payload }]);

        let response = self
            .authed(self.http.post(self.proposals_url()))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| DataError::StorageUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::StorageUnavailable(format!(
                "insert returned {status}: {body}"
            )));
        }

        let mut created: Vec<Proposal> = response
            .json()
            .await
            .map_err(|e| DataError::StorageUnavailable(e.to_string()))?;

        created
            .pop()
            .ok_or_else(|| DataError::StorageUnavailable("insert returned no row".to_string()))
    }
}
