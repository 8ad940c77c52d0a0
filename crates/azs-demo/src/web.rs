//! HTTP controller exposing the lifecycle as a web endpoint.
//!
//! Routes:
//! - `GET /greeting` - static greeting
//! - `GET /result` - run discovery and the lifecycle once, echoing the request parameters
//! - `GET /health` - liveness

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use azs_core::config::StackConfig;
use azs_core::Error;
use azs_lifecycle::RunReport;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::bootstrap::provision;

/// Runs one provisioning pass on behalf of a request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProvisioningRunner: Send + Sync {
    /// Discover endpoints and run the lifecycle.
    async fn run(&self) -> azs_core::Result<RunReport>;
}

/// Runner backed by the process configuration.
pub struct StackRunner {
    config: StackConfig,
}

impl StackRunner {
    /// Create a runner for the given configuration.
    pub fn new(config: StackConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvisioningRunner for StackRunner {
    async fn run(&self) -> azs_core::Result<RunReport> {
        provision(&self.config).await
    }
}

/// Shared state of the controller.
#[derive(Clone)]
pub struct AppState {
    /// Runs provisioning for `/result`.
    pub runner: Arc<dyn ProvisioningRunner>,
}

/// Creates the controller router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/greeting", get(greeting))
        .route("/result", get(result))
        .route("/health", get(health_check))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct GreetingParams {
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct GreetingResponse {
    greeting: String,
}

async fn greeting(Query(params): Query<GreetingParams>) -> Json<GreetingResponse> {
    let name = params.name.as_deref().unwrap_or("World");
    Json(GreetingResponse {
        greeting: format!("Hello, {name}!"),
    })
}

/// Query parameters of `/result`; echoed back, not used by the run.
#[derive(Debug, Deserialize)]
struct ResultParams {
    vmname: String,
    azrgname: String,
    azsrgname: String,
    saname: String,
}

#[derive(Debug, Serialize)]
struct ResultResponse {
    vmname: String,
    azrgname: String,
    azsrgname: String,
    saname: String,
    success: bool,
    cleanup: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_step: Option<&'static str>,
}

async fn result(
    State(state): State<AppState>,
    Query(params): Query<ResultParams>,
) -> Result<Json<ResultResponse>, ApiError> {
    info!(vmname = %params.vmname, "Provisioning run requested");

    let report = state.runner.run().await?;

    Ok(Json(ResultResponse {
        vmname: params.vmname,
        azrgname: params.azrgname,
        azsrgname: params.azsrgname,
        saname: params.saname,
        success: report.succeeded(),
        cleanup: report.cleanup.as_str(),
        failed_step: report.failure.as_ref().map(|failure| failure.step.as_str()),
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Error returned by a route.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Discovery(_) | Error::ServiceUnavailable(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if self.0.should_log() {
            error!(error = %self.0, "Provisioning run could not start");
        }
        (status, Json(self.0.into_error_response())).into_response()
    }
}
