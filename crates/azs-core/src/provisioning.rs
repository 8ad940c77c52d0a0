//! Capability traits for token issuance and resource group management.
//!
//! The lifecycle orchestrator only ever talks to a [`ResourceGroupProvisioner`]; the
//! concrete resource manager client and its [`TokenCredential`] live in `azs-resources`.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::types::{ResourceGroup, ResourceGroupSpec, Tags};

/// A bearer token together with its expiry.
pub struct AccessToken {
    secret: SecretString,
    expires_on: DateTime<Utc>,
}

impl AccessToken {
    /// Wrap a raw bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            secret: SecretString::from(token.into()),
            expires_on,
        }
    }

    /// The raw bearer token.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    /// When the token stops being accepted.
    #[must_use]
    pub const fn expires_on(&self) -> DateTime<Utc> {
        self.expires_on
    }

    /// Whether the token expires within `margin` from now.
    #[must_use]
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_on - margin <= Utc::now()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens for the resource manager.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TokenCredential: Send + Sync {
    /// Return a token that is valid for at least a short while.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity provider rejects the credential or is unreachable.
    async fn access_token(&self) -> crate::Result<AccessToken>;
}

/// Resource group operations used by the provisioning lifecycle.
///
/// Implementations perform a single attempt per call. Deletion is submit-only: the call
/// returns once the service has accepted the request and never waits for the group to be
/// gone.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ResourceGroupProvisioner: Send + Sync {
    /// Create a resource group (or update it in place if it already exists).
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the request.
    async fn create_resource_group(&self, spec: &ResourceGroupSpec)
        -> crate::Result<ResourceGroup>;

    /// Replace the tags of an existing resource group.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the group does not exist.
    async fn update_resource_group_tags(
        &self,
        name: &str,
        tags: &Tags,
    ) -> crate::Result<ResourceGroup>;

    /// List every resource group visible to the subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if any page of the listing fails.
    async fn list_resource_groups(&self) -> crate::Result<Vec<ResourceGroup>>;

    /// Submit deletion of a resource group without awaiting its completion.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the group does not exist.
    async fn submit_delete_resource_group(&self, name: &str) -> crate::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use mockall::predicate::eq;

    #[test]
    fn test_access_token_expiry() {
        let token = AccessToken::new("abc", Utc::now() + Duration::minutes(30));
        assert_eq!(token.secret(), "abc");
        assert!(!token.expires_within(Duration::minutes(1)));
        assert!(token.expires_within(Duration::minutes(31)));
    }

    #[test]
    fn test_access_token_debug_redacts() {
        let token = AccessToken::new("super-secret", Utc::now());
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_token_credential_mock() {
        let mut mock = MockTokenCredential::new();
        mock.expect_access_token()
            .times(1)
            .returning(|| Ok(AccessToken::new("t", Utc::now() + Duration::hours(1))));

        let token = mock.access_token().await.unwrap();
        assert_eq!(token.secret(), "t");
    }

    #[tokio::test]
    async fn test_provisioner_mock() {
        let mut mock = MockResourceGroupProvisioner::new();

        mock.expect_submit_delete_resource_group()
            .with(eq("rgRSMA0001"))
            .times(1)
            .returning(|name| Err(Error::NotFound(name.to_string())));

        let err = mock
            .submit_delete_resource_group("rgRSMA0001")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
