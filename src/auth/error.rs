//! Structured errors returned by auth backend clients.
//!
//! The managed backend reports failures as a status code plus a free-form
//! message. [`AuthErrorKind`] is derived from both so callers can map failures
//! to localized text without matching strings themselves. The substrings below
//! are the ones observed from `GoTrue`; the backend does not publish a formal
//! taxonomy, so anything unrecognized falls back to [`AuthErrorKind::Rejected`].

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The email is already bound to an account.
    UserAlreadyRegistered,
    /// The backend refused the password as too weak or too short.
    WeakPassword,
    /// Too many requests (HTTP 429).
    RateLimited,
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// The account exists but the email was never confirmed.
    EmailNotConfirmed,
    /// Expired or unknown one-time token.
    InvalidOtp,
    /// Any other structured rejection from the backend.
    Rejected,
    /// The backend could not be reached or timed out.
    Transport,
    /// The backend answered with something we could not interpret.
    Unexpected,
}

#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct AuthError {
    kind: AuthErrorKind,
    message: String,
    status: Option<u16>,
}

impl AuthError {
    /// Build an error from a backend response, classifying it from status and message.
    #[must_use]
    pub fn from_response(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify(Some(status), &message),
            message,
            status: Some(status),
        }
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: AuthErrorKind::Transport,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            kind: AuthErrorKind::Unexpected,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// True when the backend answered with a structured rejection, as opposed
    /// to a transport or decoding failure.
    #[must_use]
    pub fn is_backend_rejection(&self) -> bool {
        !matches!(
            self.kind,
            AuthErrorKind::Transport | AuthErrorKind::Unexpected
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::unexpected(format!("Failed to decode auth response: {err}"))
        } else if err.is_timeout() {
            Self::transport("Auth request timed out")
        } else {
            Self::transport(format!("Unable to reach the auth backend: {err}"))
        }
    }
}

/// Derive an error kind from a status code and backend message.
///
/// Message matches win over status codes so a 429 carrying a known message is
/// still reported by what the message says.
#[must_use]
pub fn classify(status: Option<u16>, message: &str) -> AuthErrorKind {
    if message.contains("User already registered") {
        AuthErrorKind::UserAlreadyRegistered
    } else if message.contains("Password should be at least") {
        AuthErrorKind::WeakPassword
    } else if status == Some(429) {
        AuthErrorKind::RateLimited
    } else if message.contains("Invalid login credentials") {
        AuthErrorKind::InvalidCredentials
    } else if message.contains("Email not confirmed") {
        AuthErrorKind::EmailNotConfirmed
    } else if message.contains("Token has expired or is invalid") {
        AuthErrorKind::InvalidOtp
    } else {
        AuthErrorKind::Rejected
    }
}
