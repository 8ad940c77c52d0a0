//! Service principal token credential.
//!
//! Tokens are obtained with the OAuth2 client credentials grant against the login endpoint
//! advertised by the deployment, for the audience advertised alongside it.

use crate::Result;
use async_trait::async_trait;
use azs_core::client::{ClientConfig, TOKEN_DEFAULT_TIMEOUT};
use azs_core::config::ServicePrincipal;
use azs_core::provisioning::{AccessToken, TokenCredential};
use azs_core::types::EndpointSet;
use azs_core::Error;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = concat!("azs-resources/", env!("CARGO_PKG_VERSION"));

/// Tokens are refreshed this many seconds before they expire.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint does not report one.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

/// Token credential for a service principal with a client secret.
pub struct ClientSecretCredential {
    http: Client,
    token_url: Url,
    client_id: String,
    client_secret: SecretString,
    resource: String,
    cached: Mutex<Option<AccessToken>>,
}

impl ClientSecretCredential {
    /// Create a credential.
    ///
    /// # Arguments
    ///
    /// * `authority` - Login endpoint (e.g., "https://login.windows.net/")
    /// * `principal` - Service principal whose tenant, client id and secret are used
    /// * `resource` - Audience tokens are requested for
    /// * `http_config` - HTTP client settings
    ///
    /// # Errors
    ///
    /// Returns an error if the token URL cannot be built or the HTTP client fails to build.
    pub fn new(
        authority: &str,
        principal: &ServicePrincipal,
        resource: impl Into<String>,
        http_config: &ClientConfig,
    ) -> Result<Self> {
        let token_url = Url::parse(&format!(
            "{}/{}/oauth2/token",
            authority.trim_end_matches('/'),
            principal.tenant_id
        ))
        .map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid login endpoint `{authority}`: {err}"))
        })?;

        let http = http_config.build_http_client(USER_AGENT)?;

        Ok(Self {
            http,
            token_url,
            client_id: principal.client_id.clone(),
            client_secret: SecretString::from(principal.secret().to_owned()),
            resource: resource.into(),
            cached: Mutex::new(None),
        })
    }

    /// Create a credential for the login endpoint and audience of a discovered deployment.
    ///
    /// The request timeout of `http_config` is capped at [`TOKEN_DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// See [`ClientSecretCredential::new`].
    pub fn from_endpoints(
        endpoints: &EndpointSet,
        principal: &ServicePrincipal,
        http_config: &ClientConfig,
    ) -> Result<Self> {
        let token_timeout = Duration::from_secs(TOKEN_DEFAULT_TIMEOUT);
        let http_config = http_config
            .clone()
            .with_timeout(http_config.timeout.min(token_timeout));
        Self::new(
            endpoints.active_directory_url(),
            principal,
            endpoints.active_directory_resource_id(),
            &http_config,
        )
    }

    /// The token endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    async fn request_token(&self) -> Result<AccessToken> {
        info!(client_id = %self.client_id, "Requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("resource", self.resource.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::AuthenticationFailed(format!(
                "token endpoint returned {status}: {text}"
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|err| {
            Error::AuthenticationFailed(format!("malformed token response: {err}"))
        })?;

        let lifetime = body
            .expires_in
            .as_ref()
            .and_then(seconds_from_value)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Ok(AccessToken::new(body.access_token, expiry_after(lifetime)))
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn access_token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.expires_within(ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS)) {
                return Ok(AccessToken::new(token.secret(), token.expires_on()));
            }
            debug!("Cached access token is about to expire");
        }

        let token = self.request_token().await?;
        let copy = AccessToken::new(token.secret(), token.expires_on());
        *cached = Some(token);
        Ok(copy)
    }
}

// `expires_in` arrives as a string from the v1 endpoint and as a number elsewhere.
fn seconds_from_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

// Negative lifetimes expire immediately; lifetimes chrono cannot represent fall back
// to the default.
fn expiry_after(lifetime_secs: i64) -> DateTime<Utc> {
    let now = Utc::now();
    ChronoDuration::try_seconds(lifetime_secs.max(0))
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or_else(|| now + ChronoDuration::seconds(DEFAULT_TOKEN_LIFETIME_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn principal() -> ServicePrincipal {
        ServicePrincipal::new("client-1", "tenant-1", "s3cret", "sub-1")
    }

    fn credential(server: &MockServer) -> ClientSecretCredential {
        ClientSecretCredential::new(
            &server.uri(),
            &principal(),
            "https://management.azs.local/aud",
            &ClientConfig::new(),
        )
        .unwrap()
    }

    #[test]
    fn seconds_accepts_strings_and_numbers() {
        assert_eq!(seconds_from_value(&json!("3599")), Some(3599));
        assert_eq!(seconds_from_value(&json!(120)), Some(120));
        assert_eq!(seconds_from_value(&json!(null)), None);
    }

    #[test]
    fn from_endpoints_uses_login_endpoint() {
        let endpoints = EndpointSet::derive(
            "https://management.azs.local",
            "https://gallery.azs.local",
            "https://login.azs.local/",
            "https://management.azs.local/aud",
            "https://graph.azs.local",
        )
        .unwrap();
        let credential =
            ClientSecretCredential::from_endpoints(&endpoints, &principal(), &ClientConfig::new())
                .unwrap();
        assert_eq!(
            credential.token_url().as_str(),
            "https://login.azs.local/tenant-1/oauth2/token"
        );
        assert_eq!(credential.resource, "https://management.azs.local/aud");
    }

    #[test]
    fn token_url_includes_tenant() {
        let credential = ClientSecretCredential::new(
            "https://login.windows.net/",
            &principal(),
            "aud",
            &ClientConfig::new(),
        )
        .unwrap();
        assert_eq!(
            credential.token_url().as_str(),
            "https://login.windows.net/tenant-1/oauth2/token"
        );
    }

    #[tokio::test]
    async fn requests_token_with_client_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": "3599",
                "access_token": "token-abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = credential(&server).access_token().await.unwrap();
        assert_eq!(token.secret(), "token-abc");
        assert!(!token.expires_within(ChronoDuration::minutes(30)));
    }

    #[tokio::test]
    async fn caches_token_until_near_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expires_in": 3600,
                "access_token": "token-abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = credential(&server);
        credential.access_token().await.unwrap();
        let second = credential.access_token().await.unwrap();
        assert_eq!(second.secret(), "token-abc");
    }

    #[tokio::test]
    async fn refreshes_short_lived_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expires_in": 30,
                "access_token": "short"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let credential = credential(&server);
        credential.access_token().await.unwrap();
        credential.access_token().await.unwrap();
    }

    #[tokio::test]
    async fn rejected_credentials_fail_authentication() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let err = credential(&server).access_token().await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed(msg) if msg.contains("invalid_client")));
    }

    #[test]
    fn expiry_clamps_unrepresentable_lifetimes() {
        let before = Utc::now();
        assert!(expiry_after(-30) <= Utc::now());
        assert!(expiry_after(i64::MAX) <= Utc::now() + ChronoDuration::hours(2));
        assert!(expiry_after(120) > before + ChronoDuration::seconds(100));
    }

    #[tokio::test]
    async fn huge_expires_in_uses_default_lifetime() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expires_in": "9223372036854775807",
                "access_token": "long-lived"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = credential(&server);
        let token = credential.access_token().await.unwrap();
        assert_eq!(token.secret(), "long-lived");
        assert!(!token.expires_within(ChronoDuration::minutes(30)));
        assert!(token.expires_within(ChronoDuration::hours(2)));

        credential.access_token().await.unwrap();
    }
}
