//! Session and wizard cookies, and the per-request browsing context built from them.

use super::state::AppState;
use crate::auth::{AuthBackend, SessionTokens};
use axum::{
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::error;

pub const ACCESS_TOKEN_COOKIE: &str = "savvy_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "savvy_refresh_token";
pub const SIGNUP_COOKIE: &str = "savvy_signup";

const SESSION_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 7;

/// Value of the first cookie named `name` across all `Cookie` headers.
#[must_use]
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name && !value.trim().is_empty()).then(|| value.trim().to_string())
        })
}

/// Both session cookies, or nothing.
#[must_use]
pub fn session_tokens(headers: &HeaderMap) -> Option<SessionTokens> {
    let access = read_cookie(headers, ACCESS_TOKEN_COOKIE)?;
    let refresh = read_cookie(headers, REFRESH_TOKEN_COOKIE)?;
    Some(SessionTokens::new(access, refresh))
}

/// Build an `HttpOnly` cookie.
///
/// # Errors
/// Returns an error if `value` contains characters not allowed in a header.
pub fn cookie(
    name: &str,
    value: &str,
    max_age: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// # Errors
/// Returns an error if `name` contains characters not allowed in a header.
pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(name, "", 0, secure)
}

fn append(headers: &mut HeaderMap, value: Result<HeaderValue, InvalidHeaderValue>) {
    match value {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(err) => error!("Failed to build cookie: {err}"),
    }
}

/// Write (or clear, for `None`) both session cookies.
pub fn set_session_cookies(headers: &mut HeaderMap, tokens: Option<&SessionTokens>, secure: bool) {
    match tokens {
        Some(tokens) => {
            append(
                headers,
                cookie(
                    ACCESS_TOKEN_COOKIE,
                    tokens.access_token.expose_secret(),
                    SESSION_COOKIE_MAX_AGE,
                    secure,
                ),
            );
            append(
                headers,
                cookie(
                    REFRESH_TOKEN_COOKIE,
                    tokens.refresh_token.expose_secret(),
                    SESSION_COOKIE_MAX_AGE,
                    secure,
                ),
            );
        }
        None => {
            append(headers, clear_cookie(ACCESS_TOKEN_COOKIE, secure));
            append(headers, clear_cookie(REFRESH_TOKEN_COOKIE, secure));
        }
    }
}

/// One visitor for the duration of a request: a backend client seeded from
/// the session cookies.
pub struct Visitor {
    client: Arc<dyn AuthBackend>,
    initial: Option<SessionTokens>,
    secure: bool,
}

impl Visitor {
    #[must_use]
    pub fn connect(state: &AppState, headers: &HeaderMap) -> Self {
        let initial = session_tokens(headers);
        Self {
            client: state.connector().connect(initial.clone()),
            initial,
            secure: state.site().secure_cookies(),
        }
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn AuthBackend> {
        self.client.clone()
    }

    #[must_use]
    pub fn backend(&self) -> &dyn AuthBackend {
        self.client.as_ref()
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Persist token changes made during the request.
    pub fn finish(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        let current = self.client.stored_tokens();
        match (&self.initial, &current) {
            (Some(before), Some(after)) if before.same_as(after) => {}
            (None, None) => {}
            (_, current) => set_session_cookies(response.headers_mut(), current.as_ref(), self.secure),
        }
        response
    }

    /// Clear the session cookies regardless of what the client holds.
    pub fn finish_signed_out(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        set_session_cookies(response.headers_mut(), None, self.secure);
        response
    }
}
