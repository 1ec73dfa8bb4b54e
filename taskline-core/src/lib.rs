//! Taskline Core - session and list-sync logic for a to-do client
//!
//! This crate implements the core client logic following hexagonal
//! architecture:
//!
//! - **domain**: Core entities (Identity, Item, ItemFilter)
//! - **ports**: Trait definitions for the two external collaborators
//!   (IdentityProvider, ItemStore)
//! - **services**: Session gate, credential flow, item list manager
//! - **adapters**: Concrete implementations (Firebase REST, in-memory demo)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use adapters::firebase_auth::{FirebaseAuth, TokenCell};
use adapters::firestore::FirestoreStore;
use adapters::memory::MemoryBackend;
use config::Config;
use domain::result::Result;
use services::{CredentialFlow, ItemListManager, SessionGate};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{Identity, Item, ItemFilter, ItemPatch, NewItem};
pub use ports::{CredentialError, IdentityProvider, ItemStore};
pub use services::{CredentialMode, SessionState};

/// Main context for Taskline operations
///
/// Holds the configuration and the injected provider handles, and builds
/// the session gate, credential flow, and list manager around them. There
/// is no shared global handle anywhere; embedders construct a context and
/// pass it down.
pub struct TasklineContext {
    pub config: Config,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub item_store: Arc<dyn ItemStore>,
}

impl TasklineContext {
    /// Create a context with the backend selected by configuration:
    /// the in-memory backend in demo mode, Firebase otherwise.
    pub fn new(config: Config) -> Result<Self> {
        if config.demo_mode {
            let backend = Arc::new(MemoryBackend::new());
            return Ok(Self::with_backends(config, backend.clone(), backend));
        }

        let token = Arc::new(TokenCell::default());
        let auth = Arc::new(FirebaseAuth::new(&config.firebase.api_key, token.clone())?);
        let store = Arc::new(FirestoreStore::new(
            &config.firebase.project_id,
            &config.firebase.collection,
            Duration::from_secs(config.firebase.poll_seconds),
            token,
        )?);
        Ok(Self::with_backends(config, auth, store))
    }

    /// Create a context around explicit provider handles. This is the
    /// dependency-injection seam used by tests and embedders.
    pub fn with_backends(
        config: Config,
        identity_provider: Arc<dyn IdentityProvider>,
        item_store: Arc<dyn ItemStore>,
    ) -> Self {
        Self {
            config,
            identity_provider,
            item_store,
        }
    }

    /// Session gate observing this context's identity provider.
    pub fn session_gate(&self) -> SessionGate {
        SessionGate::new(&self.identity_provider)
    }

    /// Credential-entry flow against this context's identity provider.
    pub fn credential_flow(&self) -> CredentialFlow {
        CredentialFlow::new(self.identity_provider.clone())
    }

    /// Item list manager over this context's item store, initially unbound.
    pub fn list_manager(&self) -> ItemListManager {
        ItemListManager::new(self.item_store.clone())
    }
}
