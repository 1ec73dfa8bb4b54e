//! Identity domain model

use serde::{Deserialize, Serialize};

/// An authenticated user's reference, resolved by the identity provider.
///
/// The id is opaque and unique per account; it is the sole scoping key for
/// item visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}
