//! Token types and error definitions.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// A token freshly issued by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime reported by the provider.
    pub ttl: Duration,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// The single token held by [`TokenCache`](crate::credentials::TokenCache).
#[derive(Clone)]
pub struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    /// `fetched_at` is the instant the exchange was started. A lifetime the
    /// clock cannot represent is rejected as malformed.
    pub fn new(issued: IssuedToken, fetched_at: Instant) -> Result<Self, CredentialError> {
        let expires_at = fetched_at.checked_add(issued.ttl).ok_or_else(|| {
            CredentialError::Malformed(format!("expires_in of {:?} is out of range", issued.ttl))
        })?;
        Ok(Self {
            value: issued.access_token,
            expires_at,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// True while `now` is strictly before `expires_at - margin`.
    pub fn is_fresh(&self, now: Instant, margin: Duration) -> bool {
        match self.expires_at.checked_sub(margin) {
            Some(stale_at) => now < stale_at,
            None => false,
        }
    }
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Errors from the client-credentials exchange.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The token endpoint could not be reached or the exchange timed out.
    #[error("token endpoint unreachable: {0}")]
    Transport(String),

    /// The identity provider answered with a non-success status.
    #[error("token endpoint returned status {0}")]
    Status(u16),

    /// The body was not the expected JSON document.
    #[error("malformed token response: {0}")]
    Malformed(String),

    /// `expires_in` was absent; the token's lifetime cannot be trusted.
    #[error("token response has no expires_in")]
    MissingLifetime,
}

impl CredentialError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialError::Transport(_) => "transport",
            CredentialError::Status(_) => "status",
            CredentialError::Malformed(_) => "malformed",
            CredentialError::MissingLifetime => "missing_lifetime",
        }
    }
}
