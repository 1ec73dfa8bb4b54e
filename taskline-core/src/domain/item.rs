//! Item domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single to-do entry owned by one identity.
///
/// The persistence layer assigns `id` on creation and both timestamps at the
/// moment of write. A `created_at` of `None` means the item has not been
/// server-stamped yet; such items sort as if their timestamp were zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Immutable scoping key; items are visible only to their owner.
    pub owner_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Sort key for the newest-first ordering. Items without a server
    /// timestamp fall back to the epoch and therefore sort to the end.
    pub fn created_at_or_epoch(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Fields for a new item. The store fills in `id`, `completed = false` is set
/// by the caller, and timestamps are assigned server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub text: String,
    pub completed: bool,
    pub owner_id: String,
}

impl NewItem {
    pub fn new(text: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
            owner_id: owner_id.into(),
        }
    }
}

/// Partial update for an existing item. Only the supplied fields change;
/// the store refreshes `updated_at` on every applied patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ItemPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            text: None,
            completed: Some(completed),
        }
    }
}
