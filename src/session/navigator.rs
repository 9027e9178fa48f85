//! Routing primitives consumed by the session provider and the flows.

use std::sync::{Mutex, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Onboarding,
    AuthConfirm,
    Dashboard,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Onboarding => "/onboarding",
            Self::AuthConfirm => "/auth/confirm",
            Self::Dashboard => "/dashboard",
        }
    }
}

pub trait Navigator: Send + Sync {
    /// Navigate to `route`, keeping the current page in history.
    fn push(&self, route: Route);
    /// Navigate to `route`, replacing the current history entry.
    fn replace(&self, route: Route);
    /// Re-render the current page with fresh server data.
    fn refresh(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Push(Route),
    Replace(Route),
    Refresh,
}

/// Records navigation intents so the HTTP layer can answer with a redirect.
#[derive(Debug, Default)]
pub struct NavigationLog {
    entries: Mutex<Vec<Navigation>>,
}

impl NavigationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, navigation: Navigation) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(navigation);
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Navigation> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The route of the last push or replace.
    #[must_use]
    pub fn destination(&self) -> Option<Route> {
        self.entries().into_iter().rev().find_map(|entry| match entry {
            Navigation::Push(route) | Navigation::Replace(route) => Some(route),
            Navigation::Refresh => None,
        })
    }

    #[must_use]
    pub fn refreshed(&self) -> bool {
        self.entries().contains(&Navigation::Refresh)
    }
}

impl Navigator for NavigationLog {
    fn push(&self, route: Route) {
        self.record(Navigation::Push(route));
    }

    fn replace(&self, route: Route) {
        self.record(Navigation::Replace(route));
    }

    fn refresh(&self) {
        self.record(Navigation::Refresh);
    }
}
