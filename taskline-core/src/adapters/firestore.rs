//! Firestore REST document store
//!
//! Implements the item store port against the Firestore REST API. Document
//! `createTime`/`updateTime` metadata serve as the server-assigned item
//! timestamps, so "assigned at the moment of write" holds without client
//! clocks. The REST surface has no server push, so the scoped live query is
//! a polling watcher that emits a snapshot whenever the result set changes.
//!
//! API documentation: https://firebase.google.com/docs/firestore/use-rest-api

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;

use super::firebase_auth::TokenCell;
use crate::domain::result::{Error, Result};
use crate::domain::{Item, ItemPatch, NewItem};
use crate::ports::{ItemSnapshots, ItemStore, SnapshotDelivery};

/// Default production API URL
const FIRESTORE_PRODUCTION_URL: &str = "https://firestore.googleapis.com/v1";

/// Environment variable to override the Firestore base URL.
/// Set this to point at an emulator for testing.
pub const FIRESTORE_BASE_URL_ENV: &str = "TASKLINE_FIRESTORE_BASE_URL";

fn get_base_url() -> String {
    std::env::var(FIRESTORE_BASE_URL_ENV).unwrap_or_else(|_| FIRESTORE_PRODUCTION_URL.to_string())
}

// =============================================================================
// API Document Models (Firestore's typed value JSON)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FsValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boolean_value: Option<bool>,
}

impl FsValue {
    fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Default::default()
        }
    }

    fn boolean(value: bool) -> Self {
        Self {
            boolean_value: Some(value),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct FsDocument {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, FsValue>,
    #[serde(default)]
    create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<FsDocument>,
}

fn field_str(doc: &FsDocument, key: &str) -> String {
    doc.fields
        .get(key)
        .and_then(|v| v.string_value.clone())
        .unwrap_or_default()
}

fn decode_document(doc: FsDocument) -> Item {
    // Document names look like projects/_/databases/_/documents/todos/<id>.
    let id = doc.name.rsplit('/').next().unwrap_or(&doc.name).to_string();
    Item {
        id,
        text: field_str(&doc, "text"),
        completed: doc
            .fields
            .get("completed")
            .and_then(|v| v.boolean_value)
            .unwrap_or(false),
        owner_id: field_str(&doc, "ownerId"),
        created_at: doc.create_time,
        updated_at: doc.update_time,
    }
}

// =============================================================================
// Firestore HTTP Client
// =============================================================================

#[derive(Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    /// projects/{project}/databases/(default)/documents
    parent: String,
    collection: String,
    poll_interval: Duration,
    token: Arc<TokenCell>,
}

impl FirestoreStore {
    /// Create a new store for the given project and collection.
    ///
    /// Uses the `TASKLINE_FIRESTORE_BASE_URL` environment variable if set,
    /// otherwise defaults to the production API. `subscribe` spawns its
    /// polling watcher on the ambient tokio runtime.
    pub fn new(
        project_id: &str,
        collection: &str,
        poll_interval: Duration,
        token: Arc<TokenCell>,
    ) -> Result<Self> {
        if project_id.is_empty() {
            return Err(Error::config("Firestore project id cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: get_base_url().trim_end_matches('/').to_string(),
            parent: format!("projects/{}/databases/(default)/documents", project_id),
            collection: collection.to_string(),
            poll_interval,
            token,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, self.parent, self.collection)
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found("document does not exist"));
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::store(format!("Firestore returned {}: {}", status, body)))
    }

    /// Fetch the full scoped result set for one owner.
    async fn query_owned(&self, owner_id: &str) -> Result<Vec<Item>> {
        let url = format!("{}/{}:runQuery", self.base_url, self.parent);
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "ownerId" },
                        "op": "EQUAL",
                        "value": { "stringValue": owner_id }
                    }
                }
            }
        });

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let rows: Vec<QueryRow> = response.json().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.document)
            .map(decode_document)
            .collect())
    }
}

#[async_trait]
impl ItemStore for FirestoreStore {
    fn subscribe(&self, owner_id: &str) -> ItemSnapshots {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = Watcher {
            store: self.clone(),
            owner_id: owner_id.to_string(),
        };
        tokio::spawn(watcher.run(tx));
        ItemSnapshots::new(rx)
    }

    async fn create_item(&self, item: NewItem) -> Result<String> {
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), FsValue::string(item.text));
        fields.insert("completed".to_string(), FsValue::boolean(item.completed));
        fields.insert("ownerId".to_string(), FsValue::string(item.owner_id));

        let response = self
            .authorized(self.client.post(self.collection_url()))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let doc: FsDocument = response.json().await?;
        Ok(decode_document(doc).id)
    }

    async fn update_item(&self, id: &str, patch: ItemPatch) -> Result<()> {
        let mut fields = BTreeMap::new();
        let mut mask = Vec::new();
        if let Some(text) = patch.text {
            fields.insert("text".to_string(), FsValue::string(text));
            mask.push("text");
        }
        if let Some(completed) = patch.completed {
            fields.insert("completed".to_string(), FsValue::boolean(completed));
            mask.push("completed");
        }
        if mask.is_empty() {
            return Ok(());
        }

        // Field mask restricts the write to the patched fields; the exists
        // precondition keeps a patch from creating a fresh document. The
        // server refreshes updateTime as part of the commit.
        let mut query: Vec<(String, String)> = mask
            .iter()
            .map(|f| ("updateMask.fieldPaths".to_string(), f.to_string()))
            .collect();
        query.push(("currentDocument.exists".to_string(), "true".to_string()));

        let response = self
            .authorized(self.client.patch(self.document_url(id)))
            .query(&query)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        let response = self
            .authorized(self.client.delete(self.document_url(id)))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// Polling watcher behind one scoped subscription.
struct Watcher {
    store: FirestoreStore,
    owner_id: String,
}

impl Watcher {
    async fn run(self, tx: mpsc::UnboundedSender<SnapshotDelivery>) {
        let mut last: Option<Vec<Item>> = None;
        let mut failing = false;

        loop {
            let delivery = match self.store.query_owned(&self.owner_id).await {
                Ok(items) => {
                    failing = false;
                    if last.as_ref() == Some(&items) {
                        None
                    } else {
                        last = Some(items.clone());
                        Some(Ok(items))
                    }
                }
                // Report a failure once per outage, not once per tick.
                Err(err) if !failing => {
                    failing = true;
                    Some(Err(err))
                }
                Err(_) => None,
            };

            if let Some(delivery) = delivery {
                if tx.send(delivery).is_err() {
                    break;
                }
            } else if tx.is_closed() {
                break;
            }

            tokio::time::sleep(self.store.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_document() {
        let raw = json!({
            "name": "projects/demo/databases/(default)/documents/todos/abc123",
            "fields": {
                "text": { "stringValue": "Buy milk" },
                "completed": { "booleanValue": false },
                "ownerId": { "stringValue": "user-1" }
            },
            "createTime": "2024-03-01T09:00:00Z",
            "updateTime": "2024-03-01T09:05:00Z"
        });
        let doc: FsDocument = serde_json::from_value(raw).unwrap();
        let item = decode_document(doc);

        assert_eq!(item.id, "abc123");
        assert_eq!(item.text, "Buy milk");
        assert!(!item.completed);
        assert_eq!(item.owner_id, "user-1");
        assert!(item.created_at.is_some());
        assert!(item.updated_at > item.created_at);
    }

    #[test]
    fn test_decode_document_without_commit_times() {
        let raw = json!({
            "name": "projects/demo/databases/(default)/documents/todos/xyz",
            "fields": {
                "text": { "stringValue": "pending" },
                "ownerId": { "stringValue": "user-1" }
            }
        });
        let doc: FsDocument = serde_json::from_value(raw).unwrap();
        let item = decode_document(doc);

        assert_eq!(item.id, "xyz");
        assert!(!item.completed);
        assert!(item.created_at.is_none());
    }

    #[test]
    fn test_empty_project_id_rejected() {
        let token = Arc::new(TokenCell::default());
        assert!(FirestoreStore::new("", "todos", Duration::from_secs(2), token).is_err());
    }
}
