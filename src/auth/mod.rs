//! Auth backend contract and clients.
//!
//! The managed auth service is consumed through [`AuthBackend`], which mirrors
//! its capability set: sign-up, password sign-in, sign-out, one-time token
//! verification, session retrieval and auth-state-change notifications.
//!
//! A client is bound to one browsing context: it holds that visitor's session
//! tokens and emits changes on its own notification stream. An
//! [`AuthConnector`] builds clients from the tokens a request carries.

mod error;
mod events;
pub mod gotrue;
pub mod memory;
#[cfg(test)]
pub(crate) mod stub;

pub use error::{AuthError, AuthErrorKind, classify};
pub use events::{AuthChange, AuthEvent, AuthEvents, Subscription};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

/// Profile fields collected by the signup wizard and stored as user metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_personality: Option<String>,
    /// Keys the backend returns that this crate does not model.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl User {
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

/// Token pair persisted in the visitor's cookies.
#[derive(Clone, Debug)]
pub struct SessionTokens {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

impl SessionTokens {
    #[must_use]
    pub fn new(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token: SecretString::from(access_token),
            refresh_token: SecretString::from(refresh_token),
        }
    }

    /// Compare token values without exposing them outside this check.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.access_token.expose_secret() == other.access_token.expose_secret()
            && self.refresh_token.expose_secret() == other.refresh_token.expose_secret()
    }
}

/// Proof of authentication plus the embedded user identity.
#[derive(Clone, Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub token_type: String,
    /// Unix timestamp (seconds) after which the access token is stale.
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    #[must_use]
    pub fn tokens(&self) -> SessionTokens {
        SessionTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, now_unix: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now_unix)
    }
}

/// One-time token kinds accepted by `verify_otp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtpType {
    Signup,
    Invite,
    MagicLink,
    Recovery,
    EmailChange,
    Email,
}

impl OtpType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Invite => "invite",
            Self::MagicLink => "magiclink",
            Self::Recovery => "recovery",
            Self::EmailChange => "email_change",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "signup" => Ok(Self::Signup),
            "invite" => Ok(Self::Invite),
            "magiclink" => Ok(Self::MagicLink),
            "recovery" => Ok(Self::Recovery),
            "email_change" => Ok(Self::EmailChange),
            "email" => Ok(Self::Email),
            other => Err(format!("unknown otp type: {other}")),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SignUpOptions {
    pub metadata: UserMetadata,
    /// Where the confirmation email should send the visitor back to.
    pub email_redirect_to: Option<String>,
}

/// Result of a sign-up: the created user and, when the backend auto-confirms
/// accounts, an active session.
#[derive(Clone, Debug, Default)]
pub struct SignUpResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

/// Capability set of the managed auth backend, bound to one browsing context.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        options: SignUpOptions,
    ) -> Result<SignUpResponse, AuthError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn verify_otp(
        &self,
        token_hash: &str,
        otp_type: OtpType,
    ) -> Result<Option<Session>, AuthError>;

    /// Resolve the current session, refreshing stale tokens when possible.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    fn on_auth_state_change(&self) -> Subscription;

    /// Tokens the client holds right now, used to persist the browsing context.
    fn stored_tokens(&self) -> Option<SessionTokens>;
}

/// Builds backend clients for a browsing context.
pub trait AuthConnector: Send + Sync {
    fn connect(&self, tokens: Option<SessionTokens>) -> Arc<dyn AuthBackend>;
}
