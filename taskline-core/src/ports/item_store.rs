//! Item store port - persistence layer abstraction
//!
//! The store owns durable item storage. Consumers hold only a read-only
//! mirror fed by scoped live-query subscriptions; mutations go through the
//! request methods and are reflected back via the next snapshot.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::result::{Error, Result};
use crate::domain::{Item, ItemPatch, NewItem};

/// One delivery on a live-query stream: the full scoped result set, or a
/// transient failure the consumer is expected to log and swallow.
pub type SnapshotDelivery = std::result::Result<Vec<Item>, Error>;

/// Owned handle over a scoped live-query stream.
///
/// Each delivery carries the complete result set for the subscribed owner;
/// consumers replace their local list wholesale, never merge. Dropping the
/// handle cancels the subscription.
pub struct ItemSnapshots {
    rx: mpsc::UnboundedReceiver<SnapshotDelivery>,
}

impl ItemSnapshots {
    pub fn new(rx: mpsc::UnboundedReceiver<SnapshotDelivery>) -> Self {
        Self { rx }
    }

    /// Wait for the next delivery. Returns `None` when the store side has
    /// gone away.
    pub async fn next(&mut self) -> Option<SnapshotDelivery> {
        self.rx.recv().await
    }

    /// Drain one delivery without waiting, if one is already queued.
    pub fn try_next(&mut self) -> Option<SnapshotDelivery> {
        self.rx.try_recv().ok()
    }
}

/// Persistence layer abstraction.
///
/// Timestamps on stored items are assigned by the store at the moment of
/// write, never by the caller.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Open a live query restricted to items whose owner matches `owner_id`.
    /// Pushes an initial snapshot promptly, then the full result set on
    /// every change.
    fn subscribe(&self, owner_id: &str) -> ItemSnapshots;

    /// Create a new item and return its store-assigned id.
    async fn create_item(&self, item: NewItem) -> Result<String>;

    /// Apply a partial update to an existing item, refreshing `updated_at`.
    async fn update_item(&self, id: &str, patch: ItemPatch) -> Result<()>;

    /// Permanently remove an item. Deletion is not undoable.
    async fn delete_item(&self, id: &str) -> Result<()>;
}
