use super::redirect;
use crate::{
    flows::OnboardingTour,
    session::{NavigationLog, Route},
    web::views,
};
use axum::{
    extract::{Form, Query},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

pub async fn landing() -> Html<String> {
    Html(views::landing(None))
}

#[derive(Debug, Default, Deserialize)]
pub struct TourQuery {
    #[serde(default)]
    step: usize,
}

pub async fn onboarding(Query(query): Query<TourQuery>) -> Html<String> {
    Html(views::onboarding_page(OnboardingTour::at(query.step)))
}

#[derive(Debug, Deserialize)]
pub struct TourForm {
    step: usize,
}

pub async fn onboarding_next(Form(form): Form<TourForm>) -> Response {
    let nav = NavigationLog::new();
    match OnboardingTour::at(form.step).next(&nav) {
        Some(next) => {
            Redirect::to(&format!("/onboarding?step={}", next.current_index())).into_response()
        }
        None => redirect(nav.destination().unwrap_or(Route::Dashboard)),
    }
}
