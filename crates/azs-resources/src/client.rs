//! Asynchronous resource group client implementation.

use crate::models::{
    CreateResourceGroupRequest, ResourceGroupListResult, ResourceGroupResource,
    UpdateResourceGroupRequest,
};
use crate::Result;
use async_trait::async_trait;
use azs_core::client::{ClientConfig, RESOURCE_MANAGER_DEFAULT_TIMEOUT};
use azs_core::provisioning::{ResourceGroupProvisioner, TokenCredential};
use azs_core::types::{EndpointSet, ResourceGroup, ResourceGroupSpec, Tags};
use azs_core::Error;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("azs-resources/", env!("CARGO_PKG_VERSION"));

/// Resource group API version supported by Azure Stack.
pub const RESOURCE_GROUPS_API_VERSION: &str = "2018-02-01";

/// Builder for [`ResourceGroupClient`].
#[derive(Clone)]
pub struct ResourceGroupClientBuilder {
    base_url: String,
    subscription_id: String,
    credential: Arc<dyn TokenCredential>,
    http_config: ClientConfig,
    api_version: String,
}

impl ResourceGroupClientBuilder {
    /// Create a builder for the given resource manager URL and subscription.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        subscription_id: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            subscription_id: subscription_id.into(),
            credential,
            http_config: ClientConfig::new()
                .with_timeout(Duration::from_secs(RESOURCE_MANAGER_DEFAULT_TIMEOUT)),
            api_version: RESOURCE_GROUPS_API_VERSION.to_string(),
        }
    }

    /// Create a builder targeting the resource manager of a discovered deployment.
    #[must_use]
    pub fn from_endpoints(
        endpoints: &EndpointSet,
        subscription_id: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self::new(endpoints.resource_manager_url(), subscription_id, credential)
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Override the `api-version` sent with every request.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ResourceGroupClient> {
        let base_url = Url::parse(&self.base_url).map_err(|err| {
            Error::InvalidEndpoint(format!(
                "Invalid resource manager URL `{}`: {err}",
                self.base_url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint(format!(
                "Resource manager URL `{base_url}` cannot carry a path"
            )));
        }
        if self.subscription_id.trim().is_empty() {
            return Err(Error::ConfigError("subscription id is empty".to_string()));
        }

        if !self.http_config.tls_verify {
            warn!("TLS verification disabled for resource manager client");
        }
        let http = self.http_config.build_http_client(USER_AGENT)?;

        Ok(ResourceGroupClient {
            http,
            base_url,
            subscription_id: self.subscription_id,
            credential: self.credential,
            api_version: self.api_version,
        })
    }
}

/// Asynchronous client for the resource group endpoints of the resource manager.
///
/// Every call is attempted once. Bearer tokens come from the configured
/// [`TokenCredential`] on each request.
#[derive(Clone)]
pub struct ResourceGroupClient {
    http: Client,
    base_url: Url,
    subscription_id: String,
    credential: Arc<dyn TokenCredential>,
    api_version: String,
}

impl ResourceGroupClient {
    /// Start a builder.
    #[must_use]
    pub fn builder(
        base_url: impl Into<String>,
        subscription_id: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> ResourceGroupClientBuilder {
        ResourceGroupClientBuilder::new(base_url, subscription_id, credential)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the subscription id.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Create a resource group, or update it in place if it exists.
    pub async fn create_resource_group(&self, spec: &ResourceGroupSpec) -> Result<ResourceGroup> {
        let url = self.resource_group_url(&spec.name)?;
        let body = CreateResourceGroupRequest {
            location: spec.location.clone(),
            tags: spec.tags.clone(),
        };

        info!(name = %spec.name, location = %spec.location, "Creating resource group");
        let resource: ResourceGroupResource =
            self.send_json(Method::PUT, url, Some(&body)).await?;
        Ok(resource.into())
    }

    /// Replace the tags of a resource group.
    pub async fn update_resource_group_tags(
        &self,
        name: &str,
        tags: &Tags,
    ) -> Result<ResourceGroup> {
        let url = self.resource_group_url(name)?;
        let body = UpdateResourceGroupRequest { tags: tags.clone() };

        info!(name = %name, tag_count = tags.len(), "Updating resource group tags");
        let resource: ResourceGroupResource =
            self.send_json(Method::PATCH, url, Some(&body)).await?;
        Ok(resource.into())
    }

    /// Fetch a single resource group.
    pub async fn get_resource_group(&self, name: &str) -> Result<ResourceGroup> {
        let url = self.resource_group_url(name)?;
        let resource: ResourceGroupResource =
            self.send_json::<(), _>(Method::GET, url, None).await?;
        Ok(resource.into())
    }

    /// List every resource group in the subscription, following `nextLink` pages.
    ///
    /// Paging stops at the first link already fetched. Links pointing away from the
    /// resource manager are rejected so the bearer token never leaves it.
    pub async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        let mut next = Some(self.collection_url()?);
        let mut visited = HashSet::new();
        let mut groups = Vec::new();

        while let Some(url) = next.take() {
            visited.insert(url.clone());
            debug!(url = %url, "Fetching resource group page");
            let page: ResourceGroupListResult =
                self.send_json::<(), _>(Method::GET, url, None).await?;
            groups.extend(page.value.into_iter().map(ResourceGroup::from));

            let Some(link) = page.next_link.filter(|link| !link.is_empty()) else {
                break;
            };
            let url = self.next_page_url(&link)?;
            if visited.contains(&url) {
                warn!(url = %url, "nextLink repeats an earlier page, stopping");
                break;
            }
            next = Some(url);
        }

        info!(count = groups.len(), "Listed resource groups");
        Ok(groups)
    }

    /// Submit deletion of a resource group.
    ///
    /// Returns once the service has accepted the request. The polling URL of the
    /// long-running operation is ignored.
    pub async fn submit_delete_resource_group(&self, name: &str) -> Result<()> {
        let url = self.resource_group_url(name)?;

        info!(name = %name, "Submitting resource group deletion");
        let response = self.send::<()>(Method::DELETE, url, None).await?;

        match response.status() {
            StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NO_CONTENT => Ok(()),
            status => Err(Error::HttpError(format!(
                "Unexpected status {status} for deletion of `{name}`"
            ))),
        }
    }

    fn next_page_url(&self, link: &str) -> Result<Url> {
        let url = Url::parse(link)
            .map_err(|err| Error::ParseError(format!("Invalid nextLink `{link}`: {err}")))?;
        if url.origin() != self.base_url.origin() {
            return Err(Error::InvalidEndpoint(format!(
                "nextLink `{url}` is outside `{}`",
                self.base_url
            )));
        }
        Ok(url)
    }

    fn collection_url(&self) -> Result<Url> {
        self.build_url(&["subscriptions", &self.subscription_id, "resourcegroups"])
    }

    fn resource_group_url(&self, name: &str) -> Result<Url> {
        if name.is_empty() {
            return Err(Error::ValidationError(
                "resource group name is empty".to_string(),
            ));
        }
        self.build_url(&[
            "subscriptions",
            &self.subscription_id,
            "resourcegroups",
            name,
        ])
    }

    fn build_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidEndpoint(format!("`{}` cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }

    async fn send<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let token = self.credential.access_token().await?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(token.secret())
            .header("Accept", "application/json");
        if let Some(payload) = body {
            request = request.json(payload);
        }

        debug!(method = %method, path = %url.path(), "Sending resource manager request");
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(map_status_to_error(status, text))
    }

    async fn send_json<B, R>(&self, method: Method, url: Url, body: Option<&B>) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let path = url.path().to_string();
        let response = self.send(method, url, body).await?;
        response.json::<R>().await.map_err(|err| {
            Error::ParseError(format!(
                "Failed to parse resource manager response for `{path}`: {err}"
            ))
        })
    }
}

#[async_trait]
impl ResourceGroupProvisioner for ResourceGroupClient {
    async fn create_resource_group(&self, spec: &ResourceGroupSpec) -> Result<ResourceGroup> {
        ResourceGroupClient::create_resource_group(self, spec).await
    }

    async fn update_resource_group_tags(&self, name: &str, tags: &Tags) -> Result<ResourceGroup> {
        ResourceGroupClient::update_resource_group_tags(self, name, tags).await
    }

    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        ResourceGroupClient::list_resource_groups(self).await
    }

    async fn submit_delete_resource_group(&self, name: &str) -> Result<()> {
        ResourceGroupClient::submit_delete_resource_group(self, name).await
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::AuthenticationFailed(format!("resource manager rejected the token: {text}"))
        }
        StatusCode::CONFLICT => Error::Conflict(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => Error::ServiceUnavailable(format!(
            "resource manager temporarily unavailable: {text}"
        )),
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("resource manager error {status}: {text}"))
        }
        _ => Error::HttpError(format!("resource manager error {status}: {text}")),
    }
}
