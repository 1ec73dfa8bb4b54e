//! In-process backend for demo mode and tests
//!
//! Implements both ports against shared in-memory state, mirroring the
//! hosted backend's observable behavior: ids and timestamps are assigned at
//! the moment of write, auth-state watchers hear the current identity
//! immediately on subscribe, and every item mutation pushes a fresh scoped
//! snapshot to each live subscriber.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Identity, Item, ItemPatch, NewItem};
use crate::ports::{
    CredentialError, IdentityEvents, IdentityProvider, ItemSnapshots, ItemStore, SnapshotDelivery,
};
use crate::services::MIN_PASSWORD_LEN;

struct Account {
    identity: Identity,
    password: String,
}

struct ItemWatcher {
    owner_id: String,
    tx: mpsc::UnboundedSender<SnapshotDelivery>,
}

pub struct MemoryBackend {
    /// Accounts keyed by normalized email.
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Identity>>,
    auth_watchers: Mutex<Vec<mpsc::UnboundedSender<Option<Identity>>>>,
    items: Mutex<HashMap<String, Item>>,
    item_watchers: Mutex<Vec<ItemWatcher>>,
    email_re: Regex,
    /// Test hook: when set, the next mutation request fails once.
    fail_next_mutation: AtomicBool,
    credential_requests: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            auth_watchers: Mutex::new(Vec::new()),
            items: Mutex::new(HashMap::new()),
            item_watchers: Mutex::new(Vec::new()),
            email_re: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"),
            fail_next_mutation: AtomicBool::new(false),
            credential_requests: AtomicUsize::new(0),
        }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn set_session(&self, identity: Option<Identity>) {
        *self.session.lock().expect("session lock") = identity.clone();
        self.auth_watchers
            .lock()
            .expect("auth watcher lock")
            .retain(|tx| tx.send(identity.clone()).is_ok());
    }

    /// Push the current scoped result set to every live subscriber whose
    /// owner key matches the mutated item's owner; dropped subscribers are
    /// pruned as a side effect.
    fn push_snapshots(&self, owner_id: &str) {
        let items = self.items.lock().expect("item lock");
        self.item_watchers
            .lock()
            .expect("item watcher lock")
            .retain(|w| {
                if w.owner_id != owner_id {
                    return true;
                }
                let scoped: Vec<Item> = items
                    .values()
                    .filter(|i| i.owner_id == w.owner_id)
                    .cloned()
                    .collect();
                w.tx.send(Ok(scoped)).is_ok()
            });
    }

    fn take_injected_failure(&self) -> Option<Error> {
        if self.fail_next_mutation.swap(false, Ordering::SeqCst) {
            Some(Error::store("injected mutation failure"))
        } else {
            None
        }
    }

    // === Test hooks ===

    /// Make the next create/update/delete request fail once.
    pub fn fail_next_mutation(&self) {
        self.fail_next_mutation.store(true, Ordering::SeqCst);
    }

    /// Deliver a transient failure to every subscriber scoped to `owner_id`.
    pub fn push_snapshot_error(&self, owner_id: &str) {
        self.item_watchers
            .lock()
            .expect("item watcher lock")
            .retain(|w| {
                if w.owner_id != owner_id {
                    return true;
                }
                w.tx.send(Err(Error::store("simulated delivery failure")))
                    .is_ok()
            });
    }

    /// How many credential requests have reached this provider.
    pub fn credential_requests(&self) -> usize {
        self.credential_requests.load(Ordering::SeqCst)
    }

    /// Total stored items across all owners.
    pub fn item_count(&self) -> usize {
        self.items.lock().expect("item lock").len()
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    fn watch_identity(&self) -> IdentityEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        // Fires promptly with the current identity, then on every change.
        let current = self.session.lock().expect("session lock").clone();
        let _ = tx.send(current);
        self.auth_watchers
            .lock()
            .expect("auth watcher lock")
            .push(tx);
        IdentityEvents::new(rx)
    }

    async fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<Identity, CredentialError> {
        self.credential_requests.fetch_add(1, Ordering::SeqCst);
        let normalized = Self::normalize_email(email);

        if !self.email_re.is_match(&normalized) {
            return Err(CredentialError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(CredentialError::MissingPassword);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialError::WeakPassword);
        }

        let identity = {
            let mut accounts = self.accounts.lock().expect("account lock");
            if accounts.contains_key(&normalized) {
                return Err(CredentialError::DuplicateEmail);
            }
            let identity = Identity::new(Uuid::new_v4().simple().to_string(), normalized.clone());
            accounts.insert(
                normalized,
                Account {
                    identity: identity.clone(),
                    password: password.to_string(),
                },
            );
            identity
        };

        self.set_session(Some(identity.clone()));
        Ok(identity)
    }

    async fn verify_credential(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<Identity, CredentialError> {
        self.credential_requests.fetch_add(1, Ordering::SeqCst);
        let normalized = Self::normalize_email(email);

        if password.is_empty() {
            return Err(CredentialError::MissingPassword);
        }

        let identity = {
            let accounts = self.accounts.lock().expect("account lock");
            let account = accounts
                .get(&normalized)
                .ok_or(CredentialError::AccountNotFound)?;
            if account.password != password {
                return Err(CredentialError::WrongPassword);
            }
            account.identity.clone()
        };

        self.set_session(Some(identity.clone()));
        Ok(identity)
    }

    async fn clear_session(&self) -> std::result::Result<(), CredentialError> {
        self.set_session(None);
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryBackend {
    fn subscribe(&self, owner_id: &str) -> ItemSnapshots {
        let (tx, rx) = mpsc::unbounded_channel();
        // Initial snapshot is delivered promptly, before any change.
        let scoped: Vec<Item> = self
            .items
            .lock()
            .expect("item lock")
            .values()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        let _ = tx.send(Ok(scoped));
        self.item_watchers
            .lock()
            .expect("item watcher lock")
            .push(ItemWatcher {
                owner_id: owner_id.to_string(),
                tx,
            });
        ItemSnapshots::new(rx)
    }

    async fn create_item(&self, item: NewItem) -> Result<String> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }

        let now = Utc::now();
        let id = Uuid::new_v4().simple().to_string();
        let owner_id = item.owner_id.clone();
        self.items.lock().expect("item lock").insert(
            id.clone(),
            Item {
                id: id.clone(),
                text: item.text,
                completed: item.completed,
                owner_id: item.owner_id,
                created_at: Some(now),
                updated_at: Some(now),
            },
        );

        self.push_snapshots(&owner_id);
        Ok(id)
    }

    async fn update_item(&self, id: &str, patch: ItemPatch) -> Result<()> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }

        let owner_id = {
            let mut items = self.items.lock().expect("item lock");
            let item = items
                .get_mut(id)
                .ok_or_else(|| Error::not_found(format!("item {}", id)))?;
            if let Some(text) = patch.text {
                item.text = text;
            }
            if let Some(completed) = patch.completed {
                item.completed = completed;
            }
            item.updated_at = Some(Utc::now());
            item.owner_id.clone()
        };

        self.push_snapshots(&owner_id);
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }

        // Deleting an already-gone item is not an error.
        let removed = self.items.lock().expect("item lock").remove(id);
        if let Some(item) = removed {
            self.push_snapshots(&item.owner_id);
        }
        Ok(())
    }
}
