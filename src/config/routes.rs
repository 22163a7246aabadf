//! Built-in storefront route table.
//!
//! Auth modes are a per-route policy, not a derived rule: registration is
//! anonymous, phone lookup needs a service token, and customer-facing
//! resources pass the caller's own credentials through. Keep entries in sync
//! with the backends they point at.

use crate::config::schema::{default_allowed_headers, AuthMode, MissingTokenPolicy, RouteConfig};

fn route(
    name: &str,
    mount: &str,
    base_url: &str,
    target_prefix: &str,
    auth: AuthMode,
    methods: &[&str],
) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        mount: mount.to_string(),
        base_url: base_url.to_string(),
        target_prefix: target_prefix.to_string(),
        auth,
        methods: Some(methods.iter().map(|m| m.to_string()).collect()),
        allowed_headers: default_allowed_headers(),
        missing_token: MissingTokenPolicy::ForwardAnonymous,
    }
}

/// The storefront's route families, one per backend domain.
pub fn storefront_routes() -> Vec<RouteConfig> {
    let accounts = "http://accounts-service:8080";

    let mut phone_lookup = route(
        "accounts-phone",
        "/api/accounts/phone",
        accounts,
        "/api/v1/accounts/phone",
        AuthMode::CachedBearerToken,
        &["GET"],
    );
    phone_lookup.missing_token = MissingTokenPolicy::Reject;

    let mut admin_deposits = route(
        "admin-deposits",
        "/api/admin/deposits",
        "http://deposits-service:8080",
        "/api/v1/deposits",
        AuthMode::CachedBearerToken,
        &["GET", "PATCH"],
    );
    admin_deposits.missing_token = MissingTokenPolicy::Reject;

    vec![
        route(
            "accounts-register",
            "/api/accounts/register",
            accounts,
            "/api/v1/accounts/register",
            AuthMode::None,
            &["POST"],
        ),
        phone_lookup,
        route(
            "accounts",
            "/api/accounts",
            accounts,
            "/api/v1/accounts",
            AuthMode::ForwardCallerAuth,
            &["GET", "PUT", "PATCH", "DELETE"],
        ),
        route(
            "otp",
            "/api/otp",
            "http://otp-service:8080",
            "/api/v1/otp",
            AuthMode::CachedBearerToken,
            &["POST"],
        ),
        route(
            "banks",
            "/api/banks",
            "http://banks-service:8080",
            "/api/v1/banks",
            AuthMode::CachedBearerToken,
            &["GET", "POST", "PUT", "DELETE"],
        ),
        route(
            "wallets",
            "/api/wallets",
            "http://wallets-service:8080",
            "/api/v1/wallets",
            AuthMode::ForwardCallerAuth,
            &["GET", "POST", "PATCH"],
        ),
        route(
            "chat",
            "/api/chat",
            "http://chat-service:8080",
            "/api/v1/chat",
            AuthMode::ForwardCallerAuth,
            &["GET", "POST"],
        ),
        admin_deposits,
        route(
            "game-launch",
            "/api/games/launch",
            "http://games-service:8080",
            "/api/v1/launch",
            AuthMode::ForwardCallerAuth,
            &["POST"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_domain_has_a_route() {
        let routes = storefront_routes();
        for name in ["accounts", "otp", "banks", "wallets", "chat", "admin-deposits", "game-launch"] {
            assert!(routes.iter().any(|r| r.name == name), "missing route {}", name);
        }
    }

    #[test]
    fn test_registration_is_anonymous_and_phone_lookup_is_not() {
        let routes = storefront_routes();
        let register = routes.iter().find(|r| r.name == "accounts-register").unwrap();
        assert_eq!(register.auth, AuthMode::None);

        let phone = routes.iter().find(|r| r.name == "accounts-phone").unwrap();
        assert_eq!(phone.auth, AuthMode::CachedBearerToken);
        assert_eq!(phone.missing_token, MissingTokenPolicy::Reject);
    }
}
