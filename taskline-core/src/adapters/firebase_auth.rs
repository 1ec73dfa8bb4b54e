//! Firebase Authentication REST client
//!
//! Implements the identity provider port against the Identity Toolkit API
//! (email/password accounts). Auth-state changes are pushed to watchers by
//! this adapter: the hosted API has no push surface, so sign-in, sign-up and
//! sign-out are the only transition points.
//!
//! API documentation: https://firebase.google.com/docs/reference/rest/auth

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::result::{Error, Result};
use crate::domain::Identity;
use crate::ports::{CredentialError, IdentityEvents, IdentityProvider};

/// Default production API URL
const IDENTITY_TOOLKIT_PRODUCTION_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Environment variable to override the Identity Toolkit base URL.
/// Set this to point at an emulator for testing.
pub const IDENTITY_TOOLKIT_BASE_URL_ENV: &str = "TASKLINE_AUTH_BASE_URL";

fn get_base_url() -> String {
    std::env::var(IDENTITY_TOOLKIT_BASE_URL_ENV)
        .unwrap_or_else(|_| IDENTITY_TOOLKIT_PRODUCTION_URL.to_string())
}

/// Bearer token shared between the auth client and the document store.
/// Set on sign-in/sign-up, cleared on sign-out.
#[derive(Default)]
pub struct TokenCell(Mutex<Option<String>>);

impl TokenCell {
    pub fn set(&self, token: impl Into<String>) {
        *self.0.lock().expect("token lock") = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.lock().expect("token lock") = None;
    }

    pub fn get(&self) -> Option<String> {
        self.0.lock().expect("token lock").clone()
    }
}

// =============================================================================
// API Request/Response Models (matching the Identity Toolkit spec)
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: ApiError,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Map an Identity Toolkit error code onto a credential failure kind.
///
/// Codes may carry a trailing explanation ("WEAK_PASSWORD : Password should
/// be at least 6 characters"), so only the leading token is matched.
fn map_error_code(message: &str) -> CredentialError {
    let code = message
        .split([' ', ':'])
        .next()
        .unwrap_or_default()
        .trim();
    match code {
        "EMAIL_EXISTS" => CredentialError::DuplicateEmail,
        "INVALID_EMAIL" => CredentialError::InvalidEmail,
        "MISSING_PASSWORD" => CredentialError::MissingPassword,
        "WEAK_PASSWORD" => CredentialError::WeakPassword,
        // The newer blanket code covers both wrong-password and
        // unknown-account once email enumeration protection is on.
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => CredentialError::WrongPassword,
        "EMAIL_NOT_FOUND" => CredentialError::AccountNotFound,
        _ => CredentialError::Other(message.to_string()),
    }
}

// =============================================================================
// Firebase Auth HTTP Client
// =============================================================================

pub struct FirebaseAuth {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    token: Arc<TokenCell>,
    session: Mutex<Option<Identity>>,
    watchers: Mutex<Vec<mpsc::UnboundedSender<Option<Identity>>>>,
}

impl FirebaseAuth {
    /// Create a new client with the given web API key.
    ///
    /// Uses the `TASKLINE_AUTH_BASE_URL` environment variable if set,
    /// otherwise defaults to the production API.
    pub fn new(api_key: &str, token: Arc<TokenCell>) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::config("Firebase API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: get_base_url().trim_end_matches('/').to_string(),
            token,
            session: Mutex::new(None),
            watchers: Mutex::new(Vec::new()),
        })
    }

    fn set_session(&self, identity: Option<Identity>) {
        *self.session.lock().expect("session lock") = identity.clone();
        self.watchers
            .lock()
            .expect("watcher lock")
            .retain(|tx| tx.send(identity.clone()).is_ok());
    }

    async fn credential_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> std::result::Result<Identity, CredentialError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.base_url, endpoint, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&CredentialRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| CredentialError::Other(e.to_string()))?;

        if !response.status().is_success() {
            let body: ApiErrorBody = response
                .json()
                .await
                .map_err(|e| CredentialError::Other(e.to_string()))?;
            return Err(map_error_code(&body.error.message));
        }

        let body: CredentialResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Other(e.to_string()))?;

        self.token.set(body.id_token);
        let identity = Identity::new(
            body.local_id,
            body.email.unwrap_or_else(|| email.to_string()),
        );
        self.set_session(Some(identity.clone()));
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    fn watch_identity(&self) -> IdentityEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let current = self.session.lock().expect("session lock").clone();
        let _ = tx.send(current);
        self.watchers.lock().expect("watcher lock").push(tx);
        IdentityEvents::new(rx)
    }

    async fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<Identity, CredentialError> {
        self.credential_request("signUp", email, password).await
    }

    async fn verify_credential(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<Identity, CredentialError> {
        self.credential_request("signInWithPassword", email, password)
            .await
    }

    async fn clear_session(&self) -> std::result::Result<(), CredentialError> {
        self.token.clear();
        self.set_session(None);
        Ok(())
    }
}
