//! In-process auth backend for local development and tests.
//!
//! Accounts, pending confirmations and issued sessions live in a shared
//! [`MemoryDirectory`]. Confirmation emails are not sent; the link is logged
//! instead so a developer can follow it by hand.

use super::{
    AuthBackend, AuthConnector, AuthError, AuthEvent, AuthEvents, OtpType, Session,
    SessionTokens, SignUpOptions, SignUpResponse, Subscription, User,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info, instrument};
use url::Url;
use uuid::Uuid;

const MIN_PASSWORD_LENGTH: usize = 6;

struct Account {
    user: User,
    password: SecretString,
    confirmed: bool,
}

#[derive(Default)]
struct Directory {
    /// Keyed by lowercased email.
    accounts: HashMap<String, Account>,
    /// Confirmation token hash -> email.
    confirmations: HashMap<String, String>,
    /// Access token -> email.
    sessions: HashMap<String, String>,
    /// Refresh token -> email.
    refresh: HashMap<String, String>,
}

impl Directory {
    fn issue(&mut self, email: &str) -> Option<Session> {
        let user = self.accounts.get(email)?.user.clone();
        let access_token = Uuid::new_v4().to_string();
        let refresh_token = Uuid::new_v4().to_string();
        self.sessions.insert(access_token.clone(), email.to_string());
        self.refresh.insert(refresh_token.clone(), email.to_string());

        Some(Session {
            access_token: SecretString::from(access_token),
            refresh_token: SecretString::from(refresh_token),
            token_type: "bearer".to_string(),
            expires_at: None,
            user,
        })
    }

    fn revoke(&mut self, tokens: &SessionTokens) {
        self.sessions.remove(tokens.access_token.expose_secret());
        self.refresh.remove(tokens.refresh_token.expose_secret());
    }
}

/// Shared account store. Cloning shares the same accounts.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<Mutex<Directory>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Directory> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Token hash of the confirmation still pending for `email`, if any.
    #[must_use]
    pub fn pending_confirmation(&self, email: &str) -> Option<String> {
        let email = email.to_lowercase();
        self.lock()
            .confirmations
            .iter()
            .find(|(_, pending)| **pending == email)
            .map(|(token, _)| token.clone())
    }

    #[must_use]
    pub fn account_count(&self) -> usize {
        self.lock().accounts.len()
    }
}

#[derive(Clone, Default)]
pub struct MemoryConnector {
    directory: MemoryDirectory,
}

impl MemoryConnector {
    #[must_use]
    pub fn new(directory: MemoryDirectory) -> Self {
        Self { directory }
    }

    #[must_use]
    pub fn directory(&self) -> &MemoryDirectory {
        &self.directory
    }
}

impl AuthConnector for MemoryConnector {
    fn connect(&self, tokens: Option<SessionTokens>) -> Arc<dyn AuthBackend> {
        Arc::new(MemoryAuthClient::new(self.directory.clone(), tokens))
    }
}

pub struct MemoryAuthClient {
    directory: MemoryDirectory,
    stored: RwLock<Option<SessionTokens>>,
    events: AuthEvents,
}

impl MemoryAuthClient {
    #[must_use]
    pub fn new(directory: MemoryDirectory, tokens: Option<SessionTokens>) -> Self {
        Self {
            directory,
            stored: RwLock::new(tokens),
            events: AuthEvents::new(),
        }
    }

    fn tokens(&self) -> Option<SessionTokens> {
        self.stored
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_tokens(&self, tokens: Option<SessionTokens>) {
        *self.stored.write().unwrap_or_else(PoisonError::into_inner) = tokens;
    }

    fn establish(&self, event: AuthEvent, session: Session) -> Session {
        self.set_tokens(Some(session.tokens()));
        self.events.emit(event, Some(session.clone()));
        session
    }
}

#[async_trait]
impl AuthBackend for MemoryAuthClient {
    #[instrument(skip(self, password, options))]
    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        options: SignUpOptions,
    ) -> Result<SignUpResponse, AuthError> {
        if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::from_response(
                422,
                format!("Password should be at least {MIN_PASSWORD_LENGTH} characters."),
            ));
        }

        let key = email.to_lowercase();
        let token_hash = Uuid::new_v4().simple().to_string();
        let user = {
            let mut directory = self.directory.lock();
            if directory.accounts.contains_key(&key) {
                return Err(AuthError::from_response(422, "User already registered"));
            }

            let user = User {
                id: Uuid::new_v4().to_string(),
                email: Some(email.to_string()),
                email_confirmed_at: None,
                user_metadata: options.metadata,
            };
            directory.accounts.insert(
                key.clone(),
                Account {
                    user: user.clone(),
                    password: password.clone(),
                    confirmed: false,
                },
            );
            directory.confirmations.insert(token_hash.clone(), key);
            user
        };

        match options
            .email_redirect_to
            .as_deref()
            .and_then(|redirect| Url::parse(redirect).ok())
        {
            Some(mut link) => {
                link.query_pairs_mut()
                    .append_pair("token", &token_hash)
                    .append_pair("type", OtpType::Signup.as_str());
                info!(email, link = %link, "confirmation link issued");
            }
            None => info!(email, token = %token_hash, "confirmation token issued"),
        }

        Ok(SignUpResponse {
            user: Some(user),
            session: None,
        })
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        let key = email.to_lowercase();
        let session = {
            let mut directory = self.directory.lock();
            let account = directory
                .accounts
                .get(&key)
                .filter(|account| {
                    account.password.expose_secret() == password.expose_secret()
                })
                .ok_or_else(|| AuthError::from_response(400, "Invalid login credentials"))?;

            if !account.confirmed {
                return Err(AuthError::from_response(400, "Email not confirmed"));
            }

            directory
                .issue(&key)
                .ok_or_else(|| AuthError::unexpected("account disappeared while signing in"))?
        };

        Ok(self.establish(AuthEvent::SignedIn, session))
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(tokens) = self.tokens() {
            self.directory.lock().revoke(&tokens);
        }
        self.set_tokens(None);
        self.events.emit(AuthEvent::SignedOut, None);
        Ok(())
    }

    #[instrument(skip(self, token_hash))]
    async fn verify_otp(
        &self,
        token_hash: &str,
        otp_type: OtpType,
    ) -> Result<Option<Session>, AuthError> {
        let invalid = || AuthError::from_response(403, "Token has expired or is invalid");
        if !matches!(otp_type, OtpType::Signup | OtpType::Email) {
            return Err(invalid());
        }

        let session = {
            let mut directory = self.directory.lock();
            let email = directory
                .confirmations
                .remove(token_hash)
                .ok_or_else(invalid)?;
            let account = directory.accounts.get_mut(&email).ok_or_else(invalid)?;
            account.confirmed = true;
            account.user.email_confirmed_at = Some(now_unix().to_string());
            directory.issue(&email)
        };

        Ok(session.map(|session| self.establish(AuthEvent::SignedIn, session)))
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(tokens) = self.tokens() else {
            return Ok(None);
        };

        let (session, refreshed) = {
            let mut directory = self.directory.lock();
            let access = directory
                .sessions
                .get(tokens.access_token.expose_secret())
                .cloned();

            if let Some(email) = access {
                let user = directory.accounts.get(&email).map(|account| account.user.clone());
                (
                    user.map(|user| Session {
                        access_token: tokens.access_token.clone(),
                        refresh_token: tokens.refresh_token.clone(),
                        token_type: "bearer".to_string(),
                        expires_at: None,
                        user,
                    }),
                    false,
                )
            } else if let Some(email) = directory
                .refresh
                .get(tokens.refresh_token.expose_secret())
                .cloned()
            {
                debug!("access token unknown, rotating refresh token");
                directory.revoke(&tokens);
                (directory.issue(&email), true)
            } else {
                (None, false)
            }
        };

        match session {
            Some(session) if refreshed => {
                Ok(Some(self.establish(AuthEvent::TokenRefreshed, session)))
            }
            Some(session) => Ok(Some(session)),
            None => {
                self.set_tokens(None);
                self.events.emit(AuthEvent::SignedOut, None);
                Ok(None)
            }
        }
    }

    fn on_auth_state_change(&self) -> Subscription {
        self.events.subscribe()
    }

    fn stored_tokens(&self) -> Option<SessionTokens> {
        self.tokens()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
