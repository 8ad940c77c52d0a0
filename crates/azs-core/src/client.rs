//! HTTP client settings shared by every remote client.
//!
//! Every remote call in this workspace is attempted exactly once, so unlike a
//! general purpose client there is no retry policy here: only timeouts and
//! connection pool settings.

use std::time::Duration;

use crate::error::{Error, Result};

// Service-specific timeout configurations (in seconds)

/// Default timeout for the metadata endpoint discovery request
pub const METADATA_DEFAULT_TIMEOUT: u64 = 30;

/// Default timeout for resource manager requests
pub const RESOURCE_MANAGER_DEFAULT_TIMEOUT: u64 = 60;

/// Default timeout for token endpoint requests
pub const TOKEN_DEFAULT_TIMEOUT: u64 = 20;

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// HTTP client configuration.
///
/// Configures timeouts, connection pooling and TLS verification.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Whether to verify TLS certificates
    pub tls_verify: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            tls_verify: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable TLS certificate verification.
    ///
    /// Azure Stack development kits commonly ship self-signed certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Build a [`reqwest::Client`] from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the underlying client cannot be constructed.
    pub fn build_http_client(&self, user_agent: &str) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host);

        if !self.tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_constants() {
        assert_eq!(METADATA_DEFAULT_TIMEOUT, 30);
        assert_eq!(RESOURCE_MANAGER_DEFAULT_TIMEOUT, 60);
        assert_eq!(TOKEN_DEFAULT_TIMEOUT, 20);
        assert_eq!(DEFAULT_CONNECT_TIMEOUT, 10);
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_max_idle_per_host, DEFAULT_POOL_MAX_IDLE_PER_HOST);
        assert!(config.tls_verify);
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(5))
            .with_pool_idle_timeout(Duration::from_secs(120))
            .with_pool_max_idle(20)
            .with_tls_verify(false);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert!(!config.tls_verify);
    }

    #[test]
    fn test_build_http_client() {
        let client = ClientConfig::new()
            .with_tls_verify(false)
            .build_http_client("azs-core-test");
        assert!(client.is_ok());
    }

    #[test]
    fn test_pool_constants() {
        assert_eq!(DEFAULT_POOL_IDLE_TIMEOUT, 90);
        assert_eq!(DEFAULT_POOL_MAX_IDLE_PER_HOST, 10);
    }
}
