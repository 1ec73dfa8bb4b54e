//! Item list manager - scoped live subscription, mutations, filtering
//!
//! Owns the in-memory mirror of the current user's items. The mirror is
//! written only by the snapshot path; every other operation just issues a
//! request to the store and lets the next snapshot reconcile. Mutation and
//! delivery failures are logged and swallowed, never surfaced per-item.

use std::sync::Arc;

use crate::domain::{Identity, Item, ItemFilter, ItemPatch, NewItem};
use crate::ports::{ItemSnapshots, ItemStore};

pub struct ItemListManager {
    store: Arc<dyn ItemStore>,
    identity: Option<Identity>,
    items: Vec<Item>,
    filter: ItemFilter,
    editing: Option<String>,
    snapshots: Option<ItemSnapshots>,
}

impl ItemListManager {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            identity: None,
            items: Vec::new(),
            filter: ItemFilter::default(),
            editing: None,
            snapshots: None,
        }
    }

    /// Point the manager at an identity (or none).
    ///
    /// Any prior subscription is torn down first and the cache cleared, so a
    /// re-login as a different user can never see the previous user's items.
    /// With a non-null identity exactly one scoped subscription is opened;
    /// with a null one the manager holds no subscription at all.
    pub fn bind(&mut self, identity: Option<&Identity>) {
        self.snapshots = None;
        self.items.clear();
        self.editing = None;

        match identity {
            Some(identity) => {
                tracing::debug!(owner = %identity.id, "opening scoped subscription");
                self.snapshots = Some(self.store.subscribe(&identity.id));
                self.identity = Some(identity.clone());
            }
            None => {
                self.identity = None;
            }
        }
    }

    pub fn is_bound(&self) -> bool {
        self.identity.is_some()
    }

    /// Wait for the next delivery on the subscription and apply it.
    ///
    /// Returns true when the list was replaced by a fresh snapshot. A
    /// transient delivery failure is logged and swallowed; the list simply
    /// stops updating until the next snapshot or a rebind.
    pub async fn next_change(&mut self) -> bool {
        let Some(snapshots) = self.snapshots.as_mut() else {
            return false;
        };
        match snapshots.next().await {
            Some(Ok(items)) => {
                self.replace(items);
                true
            }
            Some(Err(err)) => {
                tracing::warn!(%err, "snapshot delivery failed");
                false
            }
            None => false,
        }
    }

    /// Apply all deliveries that are already queued, without waiting.
    /// Returns the number of snapshots applied.
    pub fn poll_changes(&mut self) -> usize {
        let mut applied = 0;
        while let Some(delivery) = self.snapshots.as_mut().and_then(|s| s.try_next()) {
            match delivery {
                Ok(items) => {
                    self.replace(items);
                    applied += 1;
                }
                Err(err) => tracing::warn!(%err, "snapshot delivery failed"),
            }
        }
        applied
    }

    /// Replace the mirror wholesale and restore the newest-first order.
    /// Items the store has not stamped yet sort to the end; the sort is
    /// stable, so their relative order is left as delivered.
    fn replace(&mut self, mut items: Vec<Item>) {
        items.sort_by(|a, b| b.created_at_or_epoch().cmp(&a.created_at_or_epoch()));
        self.items = items;
    }

    /// The full cached list, newest first.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The cached list projected through the current filter.
    pub fn visible(&self) -> Vec<&Item> {
        self.filter.apply(&self.items)
    }

    pub fn filter(&self) -> ItemFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: ItemFilter) {
        self.filter = filter;
    }

    /// Id of the item currently being edited, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Enter edit mode for an item. The consumer populates its text input
    /// with the item's current text.
    pub fn begin_edit(&mut self, item: &Item) {
        self.editing = Some(item.id.clone());
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Save the entered text: an update of the item being edited, or a
    /// create otherwise. Empty trimmed text (or no bound identity) is a
    /// no-op. Edit mode is cleared locally the moment the update request is
    /// dispatched, independent of its completion.
    pub async fn save(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.identity.is_none() {
            return;
        }

        match self.editing.take() {
            Some(id) => {
                if let Err(err) = self.store.update_item(&id, ItemPatch::text(trimmed)).await {
                    tracing::warn!(%err, %id, "failed to update item text");
                }
            }
            None => self.request_create(trimmed).await,
        }
    }

    /// Request a new item with the given text for the bound identity.
    /// No-op if the trimmed text is empty or no identity is bound.
    pub async fn create(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.identity.is_none() {
            return;
        }
        self.request_create(trimmed).await;
    }

    async fn request_create(&self, trimmed: &str) {
        // bind() guarantees the identity here.
        let Some(identity) = self.identity.as_ref() else {
            return;
        };
        if let Err(err) = self
            .store
            .create_item(NewItem::new(trimmed, identity.id.clone()))
            .await
        {
            tracing::warn!(%err, "failed to create item");
        }
    }

    /// Request the store flip an item's completion flag.
    pub async fn toggle(&self, item: &Item) {
        if let Err(err) = self
            .store
            .update_item(&item.id, ItemPatch::completed(!item.completed))
            .await
        {
            tracing::warn!(%err, id = %item.id, "failed to toggle item");
        }
    }

    /// Request permanent removal. The two-choice destructive confirmation is
    /// the consumer's responsibility and must happen before this call.
    pub async fn delete(&self, id: &str) {
        if let Err(err) = self.store.delete_item(id).await {
            tracing::warn!(%err, %id, "failed to delete item");
        }
    }
}
