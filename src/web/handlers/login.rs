use super::redirect;
use crate::{
    flows::{
        Credentials, LoginForm, LoginGate, LoginOutcome, LoginPresentation, login::LoginState,
        login_gate,
    },
    session::{NavigationLog, Route, SessionProvider},
    web::{cookies::Visitor, state::AppState, views},
};
use axum::{
    extract::{Extension, Form},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

pub async fn page(Extension(state): Extension<AppState>, headers: HeaderMap) -> Response {
    let visitor = Visitor::connect(&state, &headers);
    let nav = Arc::new(NavigationLog::new());
    let provider = SessionProvider::start(visitor.client(), nav.clone());
    provider.ready().await;

    let response = match login_gate(&provider, nav.as_ref()) {
        LoginGate::Redirect(route) => redirect(route),
        LoginGate::ShowForm => Html(views::login_page(&LoginState::default())).into_response(),
        LoginGate::Pending => StatusCode::OK.into_response(),
    };
    provider.shutdown();

    visitor.finish(response)
}

#[derive(Deserialize)]
pub struct LoginInput {
    email: String,
    password: String,
    #[serde(default)]
    presentation: Option<String>,
}

/// Each POST drives its own [`LoginForm`]. Visitors have no identity before
/// they sign in, so the form's loading guard only covers a single submission;
/// concurrent POSTs from one browser each reach the auth service.
pub async fn submit(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Form(input): Form<LoginInput>,
) -> Response {
    let visitor = Visitor::connect(&state, &headers);
    let presentation = match input.presentation.as_deref() {
        Some("popover") => LoginPresentation::Popover,
        _ => LoginPresentation::Page,
    };

    let form = LoginForm::new(presentation);
    let nav = NavigationLog::new();
    let outcome = form
        .submit(
            Credentials::new(input.email, input.password),
            visitor.backend(),
            &nav,
        )
        .await;

    let response = match outcome {
        LoginOutcome::SignedIn => redirect(nav.destination().unwrap_or(Route::Dashboard)),
        LoginOutcome::Failed(_) | LoginOutcome::Busy => {
            let snapshot = form.snapshot();
            let html = match presentation {
                LoginPresentation::Page => views::login_page(&snapshot),
                LoginPresentation::Popover => views::landing(Some(&snapshot)),
            };
            (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response()
        }
    };

    visitor.finish(response)
}
