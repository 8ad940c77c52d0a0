//! Metadata endpoint client and endpoint set derivation.

use crate::models::MetadataEndpoints;
use crate::Result;
use azs_core::client::{ClientConfig, METADATA_DEFAULT_TIMEOUT};
use azs_core::types::{dns_suffix_of, EndpointSet};
use azs_core::DiscoveryError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("azs-metadata/", env!("CARGO_PKG_VERSION"));

/// Path of the metadata document, relative to the management URL.
pub const METADATA_PATH: &str = "metadata/endpoints";

/// API version requested from the metadata endpoint.
pub const METADATA_API_VERSION: &str = "1.0";

/// `Accept` header sent with the metadata request.
///
/// Deployments answer with JSON regardless; the header value is kept as the established
/// wire contract.
pub const METADATA_ACCEPT: &str = "application/xml";

/// Builder for [`MetadataClient`].
#[derive(Debug, Clone)]
pub struct MetadataClientBuilder {
    http_config: ClientConfig,
}

impl MetadataClientBuilder {
    /// Create a builder with the default metadata timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_config: ClientConfig::new()
                .with_timeout(Duration::from_secs(METADATA_DEFAULT_TIMEOUT)),
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<MetadataClient> {
        if !self.http_config.tls_verify {
            warn!("TLS verification disabled for metadata client");
        }
        let http = self.http_config.build_http_client(USER_AGENT)?;
        Ok(MetadataClient { http })
    }
}

impl Default for MetadataClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the unauthenticated metadata endpoint of an Azure Stack deployment.
///
/// Nothing is cached: every call to [`MetadataClient::discover_endpoints`] issues exactly
/// one request.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: Client,
}

impl MetadataClient {
    /// Construct a client with default settings.
    pub fn new() -> Result<Self> {
        MetadataClientBuilder::new().build()
    }

    /// Start a builder.
    #[must_use]
    pub fn builder() -> MetadataClientBuilder {
        MetadataClientBuilder::new()
    }

    /// Resolve `management_base_url` into the full [`EndpointSet`].
    ///
    /// The seed URL must contain a `.`; the storage and Key Vault suffixes are derived
    /// from the part of it starting at the first `.`.
    ///
    /// # Errors
    ///
    /// Returns [`azs_core::Error::Discovery`] with
    /// - [`DiscoveryError::InvalidSeedUrl`] if the seed URL cannot be used,
    /// - [`DiscoveryError::Transport`] if the request fails,
    /// - [`DiscoveryError::Status`] if the status is not 200,
    /// - [`DiscoveryError::Parse`] if the body is malformed or a field is missing or empty.
    pub async fn discover_endpoints(&self, management_base_url: &str) -> Result<EndpointSet> {
        if dns_suffix_of(management_base_url).is_none() {
            return Err(DiscoveryError::InvalidSeedUrl(management_base_url.to_string()).into());
        }

        let metadata = self.fetch_metadata(management_base_url).await?;
        let audience = metadata.authentication.primary_audience().ok_or_else(|| {
            DiscoveryError::Parse("`authentication.audiences` is empty".to_string())
        })?;

        let endpoints = EndpointSet::derive(
            management_base_url,
            &metadata.gallery_endpoint,
            &metadata.authentication.login_endpoint,
            audience,
            &metadata.graph_endpoint,
        )?;

        debug!(
            storage_suffix = endpoints.storage_endpoint_suffix(),
            key_vault_suffix = endpoints.key_vault_dns_suffix(),
            login = endpoints.active_directory_url(),
            "Derived Azure Stack endpoints"
        );

        Ok(endpoints)
    }

    /// Fetch and parse the raw metadata document.
    ///
    /// # Errors
    ///
    /// Same as [`MetadataClient::discover_endpoints`], except that field values are not
    /// checked for emptiness.
    pub async fn fetch_metadata(&self, management_base_url: &str) -> Result<MetadataEndpoints> {
        let url = metadata_url(management_base_url)?;

        info!(url = %url, "Requesting Azure Stack metadata endpoints");

        let response = self
            .http
            .get(url)
            .query(&[("api-version", METADATA_API_VERSION)])
            .header("Accept", METADATA_ACCEPT)
            .send()
            .await
            .map_err(|err| DiscoveryError::Transport(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DiscoveryError::Status(status.as_u16()).into());
        }

        let body = response
            .text()
            .await
            .map_err(|err| DiscoveryError::Transport(err.to_string()))?;

        serde_json::from_str::<MetadataEndpoints>(&body)
            .map_err(|err| DiscoveryError::Parse(err.to_string()).into())
    }
}

/// Discover endpoints with a default client.
///
/// # Errors
///
/// See [`MetadataClient::discover_endpoints`].
pub async fn discover_endpoints(management_base_url: &str) -> Result<EndpointSet> {
    MetadataClient::new()?
        .discover_endpoints(management_base_url)
        .await
}

fn metadata_url(management_base_url: &str) -> std::result::Result<Url, DiscoveryError> {
    let raw = format!(
        "{}/{METADATA_PATH}",
        management_base_url.trim_end_matches('/')
    );
    Url::parse(&raw).map_err(|_| DiscoveryError::InvalidSeedUrl(management_base_url.to_string()))
}
