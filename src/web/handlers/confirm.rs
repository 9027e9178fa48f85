use super::redirect;
use crate::{
    flows::{ConfirmLink, ConfirmState, confirm_email},
    session::{NavigationLog, Route},
    web::{cookies::Visitor, state::AppState, views},
};
use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};

pub async fn confirm(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Query(link): Query<ConfirmLink>,
) -> Response {
    let visitor = Visitor::connect(&state, &headers);
    let nav = NavigationLog::new();

    let response = match confirm_email(&link, visitor.backend(), &nav).await {
        ConfirmState::Confirmed => redirect(nav.destination().unwrap_or(Route::Dashboard)),
        failed => Html(views::confirm_page(&failed)).into_response(),
    };

    visitor.finish(response)
}
