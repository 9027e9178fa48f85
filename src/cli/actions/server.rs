use crate::{
    auth::{
        AuthConnector,
        gotrue::{GoTrueConfig, GoTrueConnector},
        memory::{MemoryConnector, MemoryDirectory},
    },
    web::{self, AppState, SiteConfig},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub enum Backend {
    Supabase {
        url: Url,
        anon_key: SecretString,
        timeout_seconds: u64,
    },
    Memory,
}

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub site_url: Url,
    pub signup_ttl_seconds: u64,
    pub backend: Backend,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the auth client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let state = app_state(&args)?;

    web::serve(args.port, state).await
}

/// Wire the configured backend into the shared handler state.
///
/// # Errors
/// Returns an error if the HTTP client for the auth service cannot be built.
pub fn app_state(args: &Args) -> Result<AppState> {
    let connector = connector(&args.backend)?;
    let site =
        SiteConfig::new(args.site_url.clone()).with_signup_ttl_seconds(args.signup_ttl_seconds);
    Ok(AppState::new(connector, site))
}

fn connector(backend: &Backend) -> Result<Arc<dyn AuthConnector>> {
    match backend {
        Backend::Supabase {
            url,
            anon_key,
            timeout_seconds,
        } => {
            let config = GoTrueConfig::new(url.clone(), anon_key.clone())
                .with_timeout_seconds(*timeout_seconds);
            let connector =
                GoTrueConnector::new(config).context("Failed to build auth HTTP client")?;
            Ok(Arc::new(connector))
        }
        Backend::Memory => {
            warn!("Using the in-memory auth backend; accounts are lost on restart");
            Ok(Arc::new(MemoryConnector::new(MemoryDirectory::new())))
        }
    }
}

fn log_startup_args(args: &Args) {
    let (backend, auth_url) = match &args.backend {
        Backend::Supabase { url, .. } => ("supabase", url.to_string()),
        Backend::Memory => ("memory", "n/a".to_string()),
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("site_url", args.site_url.to_string()),
        ("signup_ttl_seconds", args.signup_ttl_seconds.to_string()),
        ("auth_backend", backend.to_string()),
        ("auth_url", auth_url),
        (
            "anon_key_set",
            matches!(args.backend, Backend::Supabase { .. }).to_string(),
        ),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", savvy_banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn savvy_banner() -> String {
    SAVVY_BANNER.replace(
        "{VERSION}",
        &format!(
            " - {} - {}",
            env!("CARGO_PKG_VERSION"),
            short_commit(crate::GIT_COMMIT_HASH)
        ),
    )
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}

const SAVVY_BANNER: &str = r"
   .-----------.
  (  o  o  o    )
   '-.   .-----'
     |/
  S A V V Y {VERSION}";
