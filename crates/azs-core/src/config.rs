//! Process configuration.
//!
//! This module provides the settings a provisioning run needs: the management endpoint
//! used as the discovery seed, the target location, and the service principal used to
//! obtain tokens.

use crate::client::ClientConfig;
use crate::types::dns_suffix_of;
use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Service principal credentials.
///
/// The secret is held in a [`SecretString`] and is never serialized or printed.
#[derive(Debug, Deserialize, Validate)]
pub struct ServicePrincipal {
    /// Application (client) id
    #[validate(length(min = 1))]
    pub client_id: String,

    /// Directory (tenant) id
    #[validate(length(min = 1))]
    pub tenant_id: String,

    /// Client secret
    pub client_secret: SecretString,

    /// Subscription the resource groups are created in
    #[validate(length(min = 1))]
    pub subscription_id: String,
}

impl ServicePrincipal {
    /// Create new service principal credentials.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        tenant_id: impl Into<String>,
        client_secret: impl Into<String>,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            subscription_id: subscription_id.into(),
        }
    }

    /// Get the client secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

/// Configuration for a provisioning run.
#[derive(Debug, Deserialize, Validate)]
pub struct StackConfig {
    /// Resource manager URL of the Azure Stack deployment (the discovery seed)
    #[validate(url)]
    pub arm_endpoint: String,

    /// Location resource groups are created in
    #[validate(length(min = 1))]
    pub location: String,

    /// Service principal credentials
    #[validate(nested)]
    pub credentials: ServicePrincipal,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_tls_verify() -> bool {
    true
}

impl StackConfig {
    /// Create a new configuration with required parameters.
    ///
    /// # Arguments
    ///
    /// * `arm_endpoint` - The resource manager URL (e.g., "https://management.local.azurestack.external")
    /// * `location` - The region to create resource groups in (e.g., "local")
    /// * `credentials` - Service principal used to authenticate
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the endpoint has no `.` to derive DNS
    /// suffixes from.
    pub fn new(
        arm_endpoint: impl Into<String>,
        location: impl Into<String>,
        credentials: ServicePrincipal,
    ) -> Result<Self, Error> {
        let config = Self {
            arm_endpoint: arm_endpoint.into(),
            location: location.into(),
            credentials,
            request_timeout_secs: default_request_timeout_secs(),
            tls_verify: default_tls_verify(),
        };

        config.check()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        let url = self.parse_arm_endpoint()?;
        let has_dotted_host = url.host_str().is_some_and(|host| host.contains('.'));
        if !has_dotted_host || dns_suffix_of(&self.arm_endpoint).is_none() {
            return Err(Error::ConfigError(format!(
                "ARM endpoint `{}` must be a fully qualified host name",
                self.arm_endpoint
            )));
        }

        Ok(())
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// HTTP client settings derived from this configuration.
    #[must_use]
    pub fn http_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(self.timeout())
            .with_tls_verify(self.tls_verify)
    }

    /// Parse and validate the ARM endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_arm_endpoint(&self) -> Result<Url, Error> {
        Url::parse(&self.arm_endpoint)
            .map_err(|e| Error::ConfigError(format!("Invalid ARM endpoint: {e}")))
    }
}
