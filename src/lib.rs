//! # Savvy (marketing site and dashboard shell)
//!
//! `savvy` serves the public site of a WhatsApp-automation product together
//! with the account flows that lead into its dashboard: signup wizard, email
//! confirmation, login and logout.
//!
//! ## Authentication backend
//!
//! Credentials, tokens and sessions are owned by an external managed auth
//! service (Supabase `GoTrue`). This crate only consumes its capability set
//! through the [`auth::AuthBackend`] trait; an in-memory implementation exists
//! for local development and tests.
//!
//! ## Browsing contexts
//!
//! Every visitor is a browsing context identified by `HttpOnly` session
//! cookies. Each request connects a fresh backend client seeded with those
//! cookies, and the flows in [`flows`] drive it through the same state
//! machines a single-page client would run. Navigation intents are recorded by
//! a [`session::Navigator`] and turned into HTTP redirects by the [`web`] layer.

pub mod auth;
pub mod cli;
pub mod flows;
pub mod locale;
pub mod session;
pub mod web;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
