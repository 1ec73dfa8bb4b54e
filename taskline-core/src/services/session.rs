//! Session gate - routes between the credential flow and the item list
//!
//! Wraps the identity provider's auth-state stream in an explicit state
//! machine. Consumers render a neutral wait indicator while `Resolving`,
//! the credential-entry flow while `Anonymous`, and the item list (with the
//! resolved identity) while `Authenticated`.

use std::sync::Arc;

use crate::domain::Identity;
use crate::ports::{IdentityEvents, IdentityProvider};

/// The three session states. `Resolving` is left only by an auth-state
/// notification from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Resolving,
    Anonymous,
    Authenticated(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Observes auth-state changes and holds the current session state.
///
/// The subscription is opened exactly once, at construction, and released
/// when the gate is dropped.
pub struct SessionGate {
    state: SessionState,
    events: IdentityEvents,
}

impl SessionGate {
    pub fn new(provider: &Arc<dyn IdentityProvider>) -> Self {
        Self {
            state: SessionState::Resolving,
            events: provider.watch_identity(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Wait for the next auth-state notification and transition.
    ///
    /// Returns `None` when the provider's stream has closed; the state is
    /// left as it was.
    pub async fn next_change(&mut self) -> Option<&SessionState> {
        let update = self.events.next().await?;
        self.apply(update);
        Some(&self.state)
    }

    /// Apply any notifications that are already queued, without waiting.
    /// Returns the number applied.
    pub fn poll_changes(&mut self) -> usize {
        let mut applied = 0;
        while let Some(update) = self.events.try_next() {
            self.apply(update);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, update: Option<Identity>) {
        self.state = match update {
            Some(identity) => {
                tracing::debug!(id = %identity.id, "session resolved");
                SessionState::Authenticated(identity)
            }
            None => SessionState::Anonymous,
        };
    }
}
