//! Identity provider port
//!
//! Defines the interface for the external identity provider: credential
//! creation/verification and a push stream of auth-state changes.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::Identity;

/// Failure kinds reported by the identity provider.
///
/// The credential flow maps each recognized kind to a fixed user-facing
/// message; anything else falls through `Other` to a generic one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("email already in use")]
    DuplicateEmail,
    #[error("invalid email")]
    InvalidEmail,
    #[error("missing password")]
    MissingPassword,
    #[error("weak password")]
    WeakPassword,
    #[error("wrong password")]
    WrongPassword,
    #[error("account not found")]
    AccountNotFound,
    #[error("{0}")]
    Other(String),
}

/// Owned handle over the provider's auth-state stream.
///
/// The provider pushes the current identity (or `None`) promptly after the
/// subscription is opened and again on every change. Dropping the handle
/// releases the subscription, so a torn-down consumer is never notified.
pub struct IdentityEvents {
    rx: mpsc::UnboundedReceiver<Option<Identity>>,
}

impl IdentityEvents {
    pub fn new(rx: mpsc::UnboundedReceiver<Option<Identity>>) -> Self {
        Self { rx }
    }

    /// Wait for the next auth-state notification. Returns `None` when the
    /// provider side has gone away.
    pub async fn next(&mut self) -> Option<Option<Identity>> {
        self.rx.recv().await
    }

    /// Drain one notification without waiting, if one is already queued.
    pub fn try_next(&mut self) -> Option<Option<Identity>> {
        self.rx.try_recv().ok()
    }
}

/// External identity provider abstraction.
///
/// Implementations are injected into the session gate and credential flow at
/// construction; nothing in the services knows which provider is live.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Open the auth-state stream. Fires at least once promptly after
    /// subscribing with the current identity.
    fn watch_identity(&self) -> IdentityEvents;

    /// Create a new credential (sign-up) and resolve its identity.
    async fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, CredentialError>;

    /// Verify an existing credential (login) and resolve its identity.
    async fn verify_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, CredentialError>;

    /// Invalidate the active session. Watchers observe a `None` identity.
    async fn clear_session(&self) -> Result<(), CredentialError>;
}
