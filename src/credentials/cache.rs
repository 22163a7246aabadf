//! Shared service-token cache.
//!
//! Reads are lock-free (`ArcSwapOption`); refreshes are serialised by an async
//! mutex so at most one exchange is in flight per expiry window. Callers that
//! queue behind a refresh re-check the slot and reuse the winner's token.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::credentials::fetcher::{ClientCredentialsFetcher, CredentialFetcher};
use crate::credentials::types::CachedToken;
use crate::observability::metrics;

pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Holds at most one service token and refreshes it before it expires.
pub struct TokenCache<F = ClientCredentialsFetcher> {
    fetcher: F,
    slot: ArcSwapOption<CachedToken>,
    refresh: Mutex<()>,
    margin: Duration,
}

impl<F: CredentialFetcher> TokenCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_margin(fetcher, DEFAULT_REFRESH_MARGIN)
    }

    pub fn with_margin(fetcher: F, margin: Duration) -> Self {
        Self {
            fetcher,
            slot: ArcSwapOption::empty(),
            refresh: Mutex::new(()),
            margin,
        }
    }

    /// Return a fresh token, fetching one if needed.
    ///
    /// `None` means no token could be obtained; the failure has already been
    /// logged and counted, and the route's policy decides what happens next.
    pub async fn acquire(&self) -> Option<String> {
        if let Some(value) = self.fresh_value() {
            return Some(value);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(value) = self.fresh_value() {
            return Some(value);
        }

        let fetched_at = Instant::now();
        let fetched = self
            .fetcher
            .fetch()
            .await
            .and_then(|issued| CachedToken::new(issued, fetched_at));
        match fetched {
            Ok(token) => {
                let value = token.value().to_string();
                tracing::debug!(
                    expires_in_secs = token.expires_at().saturating_duration_since(fetched_at).as_secs(),
                    "Service token refreshed"
                );
                self.slot.store(Some(Arc::new(token)));
                metrics::record_token_refresh("success");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Service token refresh failed");
                metrics::record_token_refresh(e.kind());
                None
            }
        }
    }

    /// Current token if present and outside the safety margin.
    pub fn fresh_value(&self) -> Option<String> {
        let guard = self.slot.load();
        guard
            .as_ref()
            .filter(|token| token.is_fresh(Instant::now(), self.margin))
            .map(|token| token.value().to_string())
    }

    /// Snapshot of the cached token, fresh or not.
    pub fn current(&self) -> Option<Arc<CachedToken>> {
        self.slot.load_full()
    }

}

impl<F> std::fmt::Debug for TokenCache<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("cached", &self.slot.load().is_some())
            .field("margin", &self.margin)
            .finish()
    }
}
