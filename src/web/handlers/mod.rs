//! axum handlers. Each request builds a [`Visitor`](super::cookies::Visitor),
//! drives one flow and turns the recorded navigation into a redirect.

pub mod confirm;
pub mod dashboard;
pub mod health;
pub mod login;
pub mod pages;
pub mod signup;

pub use self::health::health;

use crate::session::Route;
use axum::response::{IntoResponse, Redirect, Response};

fn redirect(route: Route) -> Response {
    Redirect::to(route.path()).into_response()
}
