//! HTTP client for the Supabase `GoTrue` REST API.
//!
//! Every request carries the project's anon key in the `apikey` header. Calls
//! made on behalf of the visitor (`/user`, `/logout`) use the visitor's access
//! token as bearer; everything else uses the anon key. The client caches the
//! session it resolved so repeated `get_session` calls within one request do
//! not hit the backend again.

use super::{
    AuthBackend, AuthConnector, AuthError, AuthEvent, AuthEvents, OtpType, Session,
    SessionTokens, SignUpOptions, SignUpResponse, Subscription, User,
};
use crate::APP_USER_AGENT;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use std::{
    sync::{Arc, PoisonError, RwLock},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, instrument, warn};
use url::Url;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug)]
pub struct GoTrueConfig {
    url: Url,
    anon_key: SecretString,
    timeout: Duration,
}

impl GoTrueConfig {
    /// `url` is the project URL (e.g. `https://<ref>.supabase.co`), not the
    /// `/auth/v1` endpoint itself.
    #[must_use]
    pub fn new(url: Url, anon_key: SecretString) -> Self {
        Self {
            url,
            anon_key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        let base = self.url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/auth/v1/{}", path.trim_start_matches('/')))
            .map_err(|err| AuthError::unexpected(format!("Invalid auth endpoint: {err}")))
    }
}

/// Shares one connection pool across every browsing context.
#[derive(Clone, Debug)]
pub struct GoTrueConnector {
    config: Arc<GoTrueConfig>,
    http: Client,
}

impl GoTrueConnector {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GoTrueConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }
}

impl AuthConnector for GoTrueConnector {
    fn connect(&self, tokens: Option<SessionTokens>) -> Arc<dyn AuthBackend> {
        Arc::new(GoTrueClient::new(
            self.config.clone(),
            self.http.clone(),
            tokens,
        ))
    }
}

#[derive(Default)]
struct Stored {
    tokens: Option<SessionTokens>,
    session: Option<Session>,
}

pub struct GoTrueClient {
    config: Arc<GoTrueConfig>,
    http: Client,
    stored: RwLock<Stored>,
    events: AuthEvents,
}

/// Body of every endpoint that issues a session.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now_unix: i64) -> Session {
        Session {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at: self
                .expires_at
                .or_else(|| self.expires_in.map(|seconds| now_unix + seconds)),
            user: self.user,
        }
    }
}

impl GoTrueClient {
    #[must_use]
    pub fn new(config: Arc<GoTrueConfig>, http: Client, tokens: Option<SessionTokens>) -> Self {
        Self {
            config,
            http,
            stored: RwLock::new(Stored {
                tokens,
                session: None,
            }),
            events: AuthEvents::new(),
        }
    }

    fn request(&self, method: Method, path: &str, bearer: &str) -> Result<RequestBuilder, AuthError> {
        let url = self.config.endpoint(path)?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", self.config.anon_key.expose_secret())
            .bearer_auth(bearer))
    }

    fn anon_request(&self, method: Method, path: &str) -> Result<RequestBuilder, AuthError> {
        self.request(method, path, self.config.anon_key.expose_secret())
    }

    fn snapshot(&self) -> (Option<SessionTokens>, Option<Session>) {
        let stored = self.stored.read().unwrap_or_else(PoisonError::into_inner);
        (stored.tokens.clone(), stored.session.clone())
    }

    fn store(&self, session: Option<Session>) {
        let mut stored = self.stored.write().unwrap_or_else(PoisonError::into_inner);
        stored.tokens = session.as_ref().map(Session::tokens);
        stored.session = session;
    }

    fn establish(&self, event: AuthEvent, session: Session) -> Session {
        self.store(Some(session.clone()));
        self.events.emit(event, Some(session.clone()));
        session
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let response = self
            .anon_request(Method::POST, "token")?
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into_session(now_unix()))
    }

    async fn fetch_user(&self, access_token: &SecretString) -> Result<Option<User>, AuthError> {
        let response = self
            .request(Method::GET, "user", access_token.expose_secret())?
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<User>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(error_from_response(response).await),
        }
    }

    /// Exchange a refresh token. `Ok(None)` means the token was revoked or expired.
    async fn refresh_session(
        &self,
        refresh_token: &SecretString,
    ) -> Result<Option<Session>, AuthError> {
        match self
            .token_grant(
                "refresh_token",
                json!({ "refresh_token": refresh_token.expose_secret() }),
            )
            .await
        {
            Ok(session) => Ok(Some(session)),
            Err(err)
                if err
                    .status()
                    .is_some_and(|status| (400..500).contains(&status) && status != 429) =>
            {
                debug!("refresh token rejected: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn revoke(&self, tokens: &SessionTokens) -> Result<(), AuthError> {
        let response = self
            .request(Method::POST, "logout", tokens.access_token.expose_secret())?
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // The session is already gone on the backend side.
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(error_from_response(response).await),
        }
    }
}

#[async_trait]
impl AuthBackend for GoTrueClient {
    #[instrument(skip(self, password, options))]
    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        options: SignUpOptions,
    ) -> Result<SignUpResponse, AuthError> {
        let mut request = self.anon_request(Method::POST, "signup")?;
        if let Some(redirect_to) = options.email_redirect_to.as_deref() {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        let response = request
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
                "data": options.metadata,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: Value = response.json().await?;
        let signed_up = parse_sign_up(body, now_unix())?;
        if let Some(session) = &signed_up.session {
            self.establish(AuthEvent::SignedIn, session.clone());
        }

        Ok(signed_up)
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        let session = self
            .token_grant(
                "password",
                json!({ "email": email, "password": password.expose_secret() }),
            )
            .await?;

        Ok(self.establish(AuthEvent::SignedIn, session))
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), AuthError> {
        let (tokens, _) = self.snapshot();
        let result = match &tokens {
            Some(tokens) => self.revoke(tokens).await,
            None => Ok(()),
        };

        // Local state is cleared even when the backend call failed.
        self.store(None);
        self.events.emit(AuthEvent::SignedOut, None);

        result
    }

    #[instrument(skip(self, token_hash))]
    async fn verify_otp(
        &self,
        token_hash: &str,
        otp_type: OtpType,
    ) -> Result<Option<Session>, AuthError> {
        let response = self
            .anon_request(Method::POST, "verify")?
            .json(&json!({ "type": otp_type.as_str(), "token_hash": token_hash }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: Value = response.json().await?;
        if body.get("access_token").is_none() {
            return Ok(None);
        }

        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|err| AuthError::unexpected(format!("Failed to decode session: {err}")))?;
        let session = token.into_session(now_unix());

        Ok(Some(self.establish(AuthEvent::SignedIn, session)))
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let (tokens, cached) = self.snapshot();
        if let Some(session) = cached {
            if !session.is_expired(now_unix()) {
                return Ok(Some(session));
            }
        }

        let Some(tokens) = tokens else {
            return Ok(None);
        };

        if let Some(user) = self.fetch_user(&tokens.access_token).await? {
            let session = Session {
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone(),
                token_type: "bearer".to_string(),
                expires_at: None,
                user,
            };
            self.store(Some(session.clone()));
            return Ok(Some(session));
        }

        debug!("access token rejected, trying refresh token");
        match self.refresh_session(&tokens.refresh_token).await? {
            Some(session) => Ok(Some(self.establish(AuthEvent::TokenRefreshed, session))),
            None => {
                warn!("stored session expired and could not be refreshed");
                self.store(None);
                self.events.emit(AuthEvent::SignedOut, None);
                Ok(None)
            }
        }
    }

    fn on_auth_state_change(&self) -> Subscription {
        self.events.subscribe()
    }

    fn stored_tokens(&self) -> Option<SessionTokens> {
        self.snapshot().0
    }
}

/// Sign-up answers with a full session when the project auto-confirms
/// accounts, and with the bare user (or `{ "user": .. }`) otherwise.
fn parse_sign_up(body: Value, now_unix: i64) -> Result<SignUpResponse, AuthError> {
    let decode = |err: serde_json::Error| {
        AuthError::unexpected(format!("Failed to decode sign-up response: {err}"))
    };

    if body.get("access_token").is_some() {
        let session = serde_json::from_value::<TokenResponse>(body)
            .map_err(decode)?
            .into_session(now_unix);
        return Ok(SignUpResponse {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }

    let user = match body.get("user") {
        Some(user) if user.is_object() => Some(serde_json::from_value(user.clone()).map_err(decode)?),
        _ if body.get("id").is_some() => Some(serde_json::from_value(body).map_err(decode)?),
        _ => None,
    };

    Ok(SignUpResponse {
        user,
        session: None,
    })
}

async fn error_from_response(response: Response) -> AuthError {
    let status = response.status().as_u16();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    AuthError::from_response(status, error_message(&body, status))
}

fn error_message(body: &Value, status: u16) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .filter(|message| !message.is_empty())
        .map_or_else(|| format!("Request failed ({status})"), str::to_string)
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}
