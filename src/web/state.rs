//! Shared state handed to every handler.

use crate::{auth::AuthConnector, flows::SignupFlow};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use ulid::Ulid;
use url::Url;

const DEFAULT_SIGNUP_TTL_SECONDS: u64 = 60 * 60;
const DEFAULT_MAX_WIZARDS: usize = 10_000;
const PRUNE_INTERVAL_SECONDS: u64 = 60;

#[derive(Clone, Debug)]
pub struct SiteConfig {
    site_url: Url,
    signup_ttl: Duration,
}

impl SiteConfig {
    #[must_use]
    pub fn new(site_url: Url) -> Self {
        Self {
            site_url,
            signup_ttl: Duration::from_secs(DEFAULT_SIGNUP_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_signup_ttl_seconds(mut self, seconds: u64) -> Self {
        self.signup_ttl = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn site_url(&self) -> &Url {
        &self.site_url
    }

    #[must_use]
    pub fn signup_ttl(&self) -> Duration {
        self.signup_ttl
    }

    /// Where confirmation emails send visitors back to.
    #[must_use]
    pub fn confirm_redirect(&self) -> String {
        format!(
            "{}/auth/confirm",
            self.site_url.as_str().trim_end_matches('/')
        )
    }

    /// Cookies carry `Secure` only when the site is served over HTTPS.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.site_url.scheme() == "https"
    }
}

struct WizardEntry {
    flow: Arc<SignupFlow>,
    touched: Instant,
}

struct Wizards {
    entries: HashMap<Ulid, WizardEntry>,
    last_prune: Instant,
}

/// Signup wizards in progress, keyed by the id stored in the visitor's cookie.
///
/// Entries are only created by a form submission. Expired entries are swept
/// at most once per `prune_interval`, and the oldest entry is evicted when the
/// store is full.
pub struct WizardStore {
    inner: RwLock<Wizards>,
    ttl: Duration,
    capacity: usize,
    prune_interval: Duration,
}

impl WizardStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_WIZARDS)
    }

    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Wizards {
                entries: HashMap::new(),
                last_prune: Instant::now(),
            }),
            ttl,
            capacity: capacity.max(1),
            prune_interval: ttl.min(Duration::from_secs(PRUNE_INTERVAL_SECONDS)),
        }
    }

    /// The live wizard for `id`, if any. Never creates one.
    pub async fn get(&self, id: Option<Ulid>) -> Option<Arc<SignupFlow>> {
        let id = id?;
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        let entry = inner.entries.get_mut(&id)?;
        if now.duration_since(entry.touched) >= self.ttl {
            debug!(wizard = %id, "signup wizard expired");
            inner.entries.remove(&id);
            return None;
        }
        entry.touched = now;
        Some(entry.flow.clone())
    }

    /// Return the live wizard for `id`, or start a new one.
    pub async fn get_or_create(
        &self,
        id: Option<Ulid>,
        redirect_to: &str,
    ) -> (Ulid, Arc<SignupFlow>) {
        if let Some(id) = id {
            if let Some(flow) = self.get(Some(id)).await {
                return (id, flow);
            }
        }

        let now = Instant::now();
        let mut inner = self.inner.write().await;

        if now.duration_since(inner.last_prune) >= self.prune_interval {
            let ttl = self.ttl;
            inner
                .entries
                .retain(|_, entry| now.duration_since(entry.touched) < ttl);
            inner.last_prune = now;
        }

        if inner.entries.len() >= self.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                warn!(wizard = %oldest, "signup wizard store full, evicting oldest");
                inner.entries.remove(&oldest);
            }
        }

        let id = Ulid::new();
        let flow = Arc::new(SignupFlow::new(redirect_to));
        inner.entries.insert(
            id,
            WizardEntry {
                flow: flow.clone(),
                touched: now,
            },
        );
        (id, flow)
    }

    pub async fn remove(&self, id: Ulid) {
        self.inner.write().await.entries.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    connector: Arc<dyn AuthConnector>,
    site: Arc<SiteConfig>,
    wizards: Arc<WizardStore>,
}

impl AppState {
    #[must_use]
    pub fn new(connector: Arc<dyn AuthConnector>, site: SiteConfig) -> Self {
        let wizards = Arc::new(WizardStore::new(site.signup_ttl()));
        Self {
            connector,
            site: Arc::new(site),
            wizards,
        }
    }

    #[must_use]
    pub fn connector(&self) -> &dyn AuthConnector {
        self.connector.as_ref()
    }

    #[must_use]
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    #[must_use]
    pub fn wizards(&self) -> &WizardStore {
        &self.wizards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn confirm_redirect_joins_site_url() -> Result<()> {
        let site = SiteConfig::new(Url::parse("https://savvy.example/")?);
        assert_eq!(site.confirm_redirect(), "https://savvy.example/auth/confirm");
        assert!(site.secure_cookies());

        let local = SiteConfig::new(Url::parse("http://localhost:8080")?);
        assert!(!local.secure_cookies());
        Ok(())
    }

    #[tokio::test]
    async fn store_reuses_live_wizards() {
        let store = WizardStore::new(Duration::from_secs(60));
        let (id, first) = store.get_or_create(None, "http://localhost/auth/confirm").await;
        let (same, second) = store
            .get_or_create(Some(id), "http://localhost/auth/confirm")
            .await;

        assert_eq!(id, same);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len().await, 1);

        store.remove(id).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn store_prunes_expired_wizards() {
        let store = WizardStore::new(Duration::ZERO);
        let (id, _) = store.get_or_create(None, "http://localhost/auth/confirm").await;
        let (fresh, _) = store
            .get_or_create(Some(id), "http://localhost/auth/confirm")
            .await;

        assert_ne!(id, fresh);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn lookup_never_creates() {
        let store = WizardStore::new(Duration::from_secs(60));
        assert!(store.get(None).await.is_none());
        assert!(store.get(Some(Ulid::new())).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn full_store_evicts_oldest() {
        let store = WizardStore::with_capacity(Duration::from_secs(60), 2);
        let (first, _) = store.get_or_create(None, "http://localhost/auth/confirm").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (second, _) = store.get_or_create(None, "http://localhost/auth/confirm").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (third, _) = store.get_or_create(None, "http://localhost/auth/confirm").await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(Some(first)).await.is_none());
        assert!(store.get(Some(second)).await.is_some());
        assert!(store.get(Some(third)).await.is_some());
    }
}
