use std::future::Future;

use tokio::sync::Mutex;

use super::client::VerifiedDomain;

/// Tenant domain used when a user principal name has to be fabricated:
/// the default domain wins, then the initial `*.onmicrosoft.com` domain,
/// then whatever is listed first.
pub fn select_domain(domains: &[VerifiedDomain]) -> Option<&str> {
    domains
        .iter()
        .find(|d| d.is_default)
        .or_else(|| domains.iter().find(|d| d.is_initial))
        .or_else(|| domains.first())
        .map(|d| d.name.as_str())
}

/// Memoizes the resolved tenant domain for the process lifetime.
///
/// The fetch runs while the lock is held, so concurrent first callers
/// collapse into a single upstream query.
pub struct DomainCache {
    cached: Mutex<Option<String>>,
}

impl DomainCache {
    pub fn new() -> Self {
        Self {
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached domain, or fetches the verified-domain list and
    /// caches the selection. `None` (tenant has no verified domains) is not
    /// cached, so a later call observes newly added domains.
    pub async fn resolve<F, Fut, E>(&self, fetch: F) -> Result<Option<String>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<VerifiedDomain>, E>>,
    {
        let mut cached = self.cached.lock().await;
        if let Some(domain) = cached.as_ref() {
            return Ok(Some(domain.clone()));
        }

        let domains = fetch().await?;
        let selected = select_domain(&domains).map(|d| d.to_string());
        if let Some(domain) = &selected {
            tracing::info!(domain = %domain, "Resolved tenant domain");
            *cached = Some(domain.clone());
        }

        Ok(selected)
    }

    /// Drop the memoized domain so the next resolve fetches again.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}
