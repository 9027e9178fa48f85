use super::redirect;
use crate::{
    flows::{AdvanceOutcome, SignupWizard},
    session::{NavigationLog, Route},
    web::{
        cookies::{SIGNUP_COOKIE, Visitor, clear_cookie, cookie, read_cookie},
        state::AppState,
        views,
    },
};
use axum::{
    extract::{Extension, Form},
    http::{HeaderMap, HeaderValue, header::InvalidHeaderValue, header::SET_COOKIE},
    response::{Html, IntoResponse, Response},
};
use std::collections::HashMap;
use tracing::{debug, error};
use ulid::Ulid;

fn wizard_id(headers: &HeaderMap) -> Option<Ulid> {
    read_cookie(headers, SIGNUP_COOKIE).and_then(|value| Ulid::from_string(&value).ok())
}

fn with_cookie(
    mut response: Response,
    value: Result<HeaderValue, InvalidHeaderValue>,
) -> Response {
    match value {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(err) => error!("Failed to build signup cookie: {err}"),
    }
    response
}

fn signup_cookie(state: &AppState, id: Ulid) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(
        SIGNUP_COOKIE,
        &id.to_string(),
        state.site().signup_ttl().as_secs(),
        state.site().secure_cookies(),
    )
}

/// Render the visitor's wizard. A visitor without one sees the welcome step;
/// the wizard itself is only stored once they submit it.
pub async fn page(Extension(state): Extension<AppState>, headers: HeaderMap) -> Response {
    let id = wizard_id(&headers);
    match state.wizards().get(id).await.zip(id) {
        Some((flow, id)) => {
            let html = views::signup_page(&flow.snapshot());
            with_cookie(Html(html).into_response(), signup_cookie(&state, id))
        }
        None => Html(views::signup_page(&SignupWizard::default())).into_response(),
    }
}

pub async fn submit(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Form(input): Form<HashMap<String, String>>,
) -> Response {
    let visitor = Visitor::connect(&state, &headers);
    let (id, flow) = state
        .wizards()
        .get_or_create(wizard_id(&headers), &state.site().confirm_redirect())
        .await;

    flow.fill(input.iter().filter(|(name, _)| name.as_str() != "action"));

    if input.get("action").is_some_and(|action| action == "back") {
        flow.retreat();
        return with_cookie(redirect(Route::Signup), signup_cookie(&state, id));
    }

    let nav = NavigationLog::new();
    match flow.advance(visitor.backend(), &nav).await {
        AdvanceOutcome::Finished => {
            state.wizards().remove(id).await;
            let response = with_cookie(
                redirect(nav.destination().unwrap_or(Route::Dashboard)),
                clear_cookie(SIGNUP_COOKIE, state.site().secure_cookies()),
            );
            visitor.finish(response)
        }
        outcome => {
            debug!(wizard = %id, ?outcome, "signup step submitted");
            visitor.finish(with_cookie(redirect(Route::Signup), signup_cookie(&state, id)))
        }
    }
}
