use super::redirect;
use crate::{
    flows::{self, GateDecision, UserMenu, dashboard::find_section, dashboard_gate},
    session::{NavigationLog, Route},
    web::{
        cookies::Visitor,
        state::AppState,
        views::{self, DashboardContent},
    },
};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};

async fn render(state: &AppState, headers: &HeaderMap, content: DashboardContent) -> Response {
    let visitor = Visitor::connect(state, headers);

    let response = match dashboard_gate(visitor.backend()).await {
        GateDecision::Redirect(route) => redirect(route),
        GateDecision::Render(user) => {
            let status = match content {
                DashboardContent::NotFound => StatusCode::NOT_FOUND,
                DashboardContent::Overview | DashboardContent::Section(_) => StatusCode::OK,
            };
            let html = views::dashboard_page(&UserMenu::for_user(&user), content);
            (status, Html(html)).into_response()
        }
    };

    visitor.finish(response)
}

pub async fn overview(Extension(state): Extension<AppState>, headers: HeaderMap) -> Response {
    render(&state, &headers, DashboardContent::Overview).await
}

pub async fn section(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Path(section): Path<String>,
) -> Response {
    let content = find_section(&section).map_or(DashboardContent::NotFound, DashboardContent::Section);
    render(&state, &headers, content).await
}

pub async fn logout(Extension(state): Extension<AppState>, headers: HeaderMap) -> Response {
    let visitor = Visitor::connect(&state, &headers);
    let nav = NavigationLog::new();

    flows::logout(visitor.backend(), &nav).await;

    visitor.finish_signed_out(redirect(nav.destination().unwrap_or(Route::Login)))
}
