//! Credential entry flow - login / signup with canned error messages
//!
//! Client-side gating here is advisory only; the identity provider's own
//! validation is authoritative. A failed submit never clears the entered
//! fields and is always locally recoverable.

use std::sync::Arc;

use crate::ports::{CredentialError, IdentityProvider};

/// The two sub-modes of the credential screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Login,
    Signup,
}

/// Minimum password length accepted before the submit control is enabled.
pub const MIN_PASSWORD_LEN: usize = 6;

const MSG_FIELDS_REQUIRED: &str = "Email and password are required.";
const MSG_DUPLICATE_EMAIL: &str = "This email is already registered.";
const MSG_INVALID_EMAIL: &str = "Please enter a valid email.";
const MSG_MISSING_PASSWORD: &str = "Password is required.";
const MSG_WEAK_PASSWORD: &str = "Password should be at least 6 characters.";
const MSG_WRONG_PASSWORD: &str = "Wrong password. Try again.";
const MSG_UNKNOWN_ACCOUNT: &str = "No account found with this email.";
const MSG_GENERIC: &str = "Something went wrong. Please try again.";

/// Map a provider failure kind to its fixed user-facing message.
fn message_for(err: &CredentialError) -> &'static str {
    match err {
        CredentialError::DuplicateEmail => MSG_DUPLICATE_EMAIL,
        CredentialError::InvalidEmail => MSG_INVALID_EMAIL,
        CredentialError::MissingPassword => MSG_MISSING_PASSWORD,
        CredentialError::WeakPassword => MSG_WEAK_PASSWORD,
        CredentialError::WrongPassword => MSG_WRONG_PASSWORD,
        CredentialError::AccountNotFound => MSG_UNKNOWN_ACCOUNT,
        CredentialError::Other(_) => MSG_GENERIC,
    }
}

/// Holds the credential screen's entered fields, mode, and inline error.
pub struct CredentialFlow {
    provider: Arc<dyn IdentityProvider>,
    mode: CredentialMode,
    email: String,
    password: String,
    error: Option<&'static str>,
}

impl CredentialFlow {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            mode: CredentialMode::Login,
            email: String::new(),
            password: String::new(),
            error: None,
        }
    }

    pub fn mode(&self) -> CredentialMode {
        self.mode
    }

    /// Switch between login and signup. Clears the displayed error but
    /// leaves the entered fields alone.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            CredentialMode::Login => CredentialMode::Signup,
            CredentialMode::Signup => CredentialMode::Login,
        };
        self.error = None;
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Whether the submit control is enabled: non-empty email and a password
    /// of at least six characters.
    pub fn can_submit(&self) -> bool {
        !self.email.trim().is_empty() && self.password.chars().count() >= MIN_PASSWORD_LEN
    }

    /// Issue the create- or verify-credential request for the current mode.
    ///
    /// Returns true once the provider resolved an identity; routing to the
    /// list happens through the session gate's stream, not here. On failure
    /// the mapped message is displayed inline and the fields are retained.
    pub async fn submit(&mut self) -> bool {
        if self.email.trim().is_empty() || self.password.is_empty() {
            self.error = Some(MSG_FIELDS_REQUIRED);
            return false;
        }

        self.error = None;
        let email = self.email.trim().to_string();

        let result = match self.mode {
            CredentialMode::Signup => {
                self.provider
                    .create_credential(&email, &self.password)
                    .await
            }
            CredentialMode::Login => {
                self.provider
                    .verify_credential(&email, &self.password)
                    .await
            }
        };

        match result {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(%err, "credential request rejected");
                self.error = Some(message_for(&err));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryBackend;

    fn flow_over(backend: &Arc<MemoryBackend>) -> CredentialFlow {
        let provider: Arc<dyn IdentityProvider> = backend.clone();
        CredentialFlow::new(provider)
    }

    #[tokio::test]
    async fn test_short_password_never_reaches_the_provider() {
        let backend = Arc::new(MemoryBackend::new());
        let mut flow = flow_over(&backend);
        flow.set_email("ada@example.com");
        flow.set_password("abcd");

        // Submit control stays disabled; the gate is client-side.
        assert!(!flow.can_submit());
        assert_eq!(backend.credential_requests(), 0);
    }

    #[tokio::test]
    async fn test_empty_fields_show_local_message() {
        let backend = Arc::new(MemoryBackend::new());
        let mut flow = flow_over(&backend);

        assert!(!flow.submit().await);
        assert_eq!(flow.error(), Some(MSG_FIELDS_REQUIRED));
        assert_eq!(backend.credential_requests(), 0);
    }

    #[tokio::test]
    async fn test_toggle_mode_resets_error_but_keeps_fields() {
        let backend = Arc::new(MemoryBackend::new());
        let mut flow = flow_over(&backend);
        flow.set_email("ada@example.com");
        flow.set_password("hunter22");

        assert!(!flow.submit().await); // login against an unknown account
        assert_eq!(flow.error(), Some(MSG_UNKNOWN_ACCOUNT));

        flow.toggle_mode();
        assert_eq!(flow.mode(), CredentialMode::Signup);
        assert!(flow.error().is_none());
        assert_eq!(flow.email(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_signup_then_duplicate_email() {
        let backend = Arc::new(MemoryBackend::new());
        let mut flow = flow_over(&backend);
        flow.toggle_mode(); // signup
        flow.set_email("ada@example.com");
        flow.set_password("hunter22");

        assert!(flow.submit().await);
        assert!(flow.error().is_none());

        // Same email again maps to the duplicate-email message.
        assert!(!flow.submit().await);
        assert_eq!(flow.error(), Some(MSG_DUPLICATE_EMAIL));
    }

    #[tokio::test]
    async fn test_wrong_password_message() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .create_credential("ada@example.com", "hunter22")
            .await
            .unwrap();

        let mut flow = flow_over(&backend);
        flow.set_email("ada@example.com");
        flow.set_password("not-the-one");

        assert!(!flow.submit().await);
        assert_eq!(flow.error(), Some(MSG_WRONG_PASSWORD));
    }
}
