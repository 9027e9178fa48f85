//! Handling of the link sent in the signup confirmation email.

use crate::{
    auth::{AuthBackend, OtpType},
    locale,
    session::{Navigator, Route},
};
use serde::Deserialize;
use tracing::{info, warn};

/// Query parameters of a confirmation link.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfirmLink {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmState {
    Pending,
    Confirmed,
    Failed(String),
}

/// Verify a confirmation link. No retry: a failed link stays failed.
pub async fn confirm_email(
    link: &ConfirmLink,
    backend: &dyn AuthBackend,
    navigator: &dyn Navigator,
) -> ConfirmState {
    let token = link.token.as_deref().filter(|token| !token.is_empty());
    let signup = link.kind.as_deref() == Some(OtpType::Signup.as_str());

    let Some(token) = token.filter(|_| signup) else {
        warn!(kind = ?link.kind, "malformed confirmation link");
        return ConfirmState::Failed(locale::INVALID_CONFIRMATION_LINK.to_string());
    };

    match backend.verify_otp(token, OtpType::Signup).await {
        Ok(_) => {
            info!("email confirmed");
            navigator.push(Route::Dashboard);
            ConfirmState::Confirmed
        }
        Err(err) => {
            warn!(kind = ?err.kind(), "email confirmation failed: {err}");
            ConfirmState::Failed(locale::confirmation_error(&err))
        }
    }
}
