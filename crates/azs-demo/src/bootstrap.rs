//! Discovery, authentication and client wiring for one provisioning run.

use std::sync::Arc;

use azs_core::config::StackConfig;
use azs_core::provisioning::{ResourceGroupProvisioner, TokenCredential};
use azs_core::types::EndpointSet;
use azs_core::Result;
use azs_lifecycle::{LifecycleOrchestrator, RunReport};
use azs_metadata::MetadataClient;
use azs_resources::{ClientSecretCredential, ResourceGroupClientBuilder};
use tracing::{error, info};

/// Discover the deployment's endpoints, connect, and run the lifecycle once.
///
/// Discovery failures are returned. A failure to authenticate or to build the client is
/// logged and the lifecycle runs without a client, which reports a skipped cleanup.
pub async fn provision(config: &StackConfig) -> Result<RunReport> {
    let endpoints = MetadataClient::builder()
        .with_http_config(config.http_config())
        .build()?
        .discover_endpoints(&config.arm_endpoint)
        .await?;

    info!(
        resource_manager = endpoints.resource_manager_url(),
        login = endpoints.active_directory_url(),
        "Discovered Azure Stack endpoints"
    );

    let orchestrator = match connect(config, &endpoints).await {
        Ok(client) => LifecycleOrchestrator::new(client, config.location.as_str()),
        Err(err) => {
            error!(error = %err, "Failed to connect to the resource manager");
            LifecycleOrchestrator::without_client(config.location.as_str())
        }
    };

    Ok(orchestrator.execute().await)
}

// The first token is acquired here so rejected credentials never reach the lifecycle.
// It stays cached for the client's first requests.
async fn connect(
    config: &StackConfig,
    endpoints: &EndpointSet,
) -> Result<Arc<dyn ResourceGroupProvisioner>> {
    let http_config = config.http_config();
    let credential =
        ClientSecretCredential::from_endpoints(endpoints, &config.credentials, &http_config)?;
    credential.access_token().await?;

    let client = ResourceGroupClientBuilder::from_endpoints(
        endpoints,
        config.credentials.subscription_id.as_str(),
        Arc::new(credential),
    )
    .with_http_config(http_config)
    .build()?;

    Ok(Arc::new(client))
}
