//! OAuth2 client-credentials exchange.
//!
//! # Responsibilities
//! - POST a form-encoded `client_credentials` grant to the token endpoint
//! - Turn the JSON answer into an [`IssuedToken`]
//! - Classify every failure; never retry (the next `acquire()` is the retry)

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::config::{ConfigError, IdentityConfig};
use crate::credentials::types::{CredentialError, IssuedToken};
use crate::resilience::OutboundTimeouts;

/// Source of fresh service tokens.
pub trait CredentialFetcher: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<IssuedToken, CredentialError>> + Send;
}

/// Longest lifetime accepted from the identity provider (one year).
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Fetches tokens from a real identity provider.
#[derive(Clone)]
pub struct ClientCredentialsFetcher {
    client: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentialsFetcher {
    pub fn new(identity: &IdentityConfig, timeouts: OutboundTimeouts) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            token_endpoint: identity.token_endpoint.clone(),
            client_id: identity.client_id.clone(),
            client_secret: identity.client_secret.clone(),
        })
    }
}

impl CredentialFetcher for ClientCredentialsFetcher {
    fn fetch(&self) -> impl Future<Output = Result<IssuedToken, CredentialError>> + Send {
        fetch_token(
            &self.client,
            &self.token_endpoint,
            &self.client_id,
            &self.client_secret,
        )
    }
}

impl std::fmt::Debug for ClientCredentialsFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsFetcher")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Perform one client-credentials exchange.
pub async fn fetch_token(
    client: &reqwest::Client,
    token_endpoint: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<IssuedToken, CredentialError> {
    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    let response = client
        .post(token_endpoint)
        .form(&form)
        .send()
        .await
        .map_err(|e| CredentialError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CredentialError::Status(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| CredentialError::Transport(e.to_string()))?;

    parse_token_response(&body)
}

fn parse_token_response(body: &[u8]) -> Result<IssuedToken, CredentialError> {
    let payload: TokenResponse =
        serde_json::from_slice(body).map_err(|e| CredentialError::Malformed(e.to_string()))?;

    let access_token = payload
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CredentialError::Malformed("missing access_token".to_string()))?;
    let ttl = Duration::from_secs(payload.expires_in.ok_or(CredentialError::MissingLifetime)?);
    if ttl > MAX_TOKEN_LIFETIME {
        return Err(CredentialError::Malformed(format!(
            "expires_in of {}s exceeds {}s",
            ttl.as_secs(),
            MAX_TOKEN_LIFETIME.as_secs()
        )));
    }

    Ok(IssuedToken { access_token, ttl })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_response() {
        let token = parse_token_response(
            br#"{"access_token":"abc","expires_in":3600,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_missing_expires_in_is_untrustworthy() {
        let err = parse_token_response(br#"{"access_token":"abc"}"#).unwrap_err();
        assert!(matches!(err, CredentialError::MissingLifetime));
    }

    #[test]
    fn test_huge_expires_in_is_malformed() {
        let bodies: [&[u8]; 2] = [
            br#"{"access_token":"abc","expires_in":18446744073709551615}"#,
            br#"{"access_token":"abc","expires_in":31536001}"#,
        ];
        for body in bodies {
            let err = parse_token_response(body).unwrap_err();
            assert!(matches!(err, CredentialError::Malformed(_)));
        }

        let token = parse_token_response(br#"{"access_token":"abc","expires_in":31536000}"#).unwrap();
        assert_eq!(token.ttl, MAX_TOKEN_LIFETIME);
    }

    #[test]
    fn test_missing_or_empty_access_token() {
        let bodies: [&[u8]; 2] = [
            br#"{"expires_in":60}"#,
            br#"{"access_token":"","expires_in":60}"#,
        ];
        for body in bodies {
            let err = parse_token_response(body).unwrap_err();
            assert!(matches!(err, CredentialError::Malformed(_)));
        }
    }

    #[test]
    fn test_unparsable_body() {
        let err = parse_token_response(b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, CredentialError::Malformed(_)));
    }
}
