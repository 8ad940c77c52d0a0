//! Azure Stack resource group demo.
//!
//! Discovers the endpoints of an Azure Stack deployment from its resource manager URL,
//! authenticates with a service principal and runs the resource group lifecycle, either
//! once from the command line or on demand behind a small web controller.
//!
//! # Usage
//! ```bash
//! # Run the lifecycle once
//! azs-demo run
//!
//! # Serve /greeting, /result and /health
//! azs-demo serve --bind 0.0.0.0:8080
//! ```
//!
//! Settings are read from `ARM_ENDPOINT`, `RESOURCE_LOCATION`, `CLIENT_ID`, `TENANT_ID`,
//! `CLIENT_SECRET` and `SUBSCRIPTION_ID` unless given as flags.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use azs_core::config::{ServicePrincipal, StackConfig};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod bootstrap;
mod web;

use web::{AppState, StackRunner};

#[derive(Parser)]
#[command(name = "azs-demo")]
#[command(about = "Azure Stack resource group lifecycle demo", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    stack: StackArgs,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the lifecycle once and exit
    Run,

    /// Serve the web controller
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
}

#[derive(Args)]
struct StackArgs {
    /// Resource manager URL of the deployment
    #[arg(long, env = "ARM_ENDPOINT")]
    arm_endpoint: String,

    /// Location resource groups are created in
    #[arg(long, env = "RESOURCE_LOCATION")]
    location: String,

    /// Service principal application id
    #[arg(long, env = "CLIENT_ID")]
    client_id: String,

    /// Directory (tenant) id
    #[arg(long, env = "TENANT_ID")]
    tenant_id: String,

    /// Service principal secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Subscription id
    #[arg(long, env = "SUBSCRIPTION_ID")]
    subscription_id: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "AZS_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// Accept invalid TLS certificates (development kits)
    #[arg(long)]
    insecure: bool,
}

impl StackArgs {
    fn into_config(self) -> Result<StackConfig> {
        let credentials = ServicePrincipal::new(
            self.client_id,
            self.tenant_id,
            self.client_secret,
            self.subscription_id,
        );

        let config = StackConfig::new(self.arm_endpoint, self.location, credentials)?
            .with_timeout(self.request_timeout)
            .with_tls_verify(!self.insecure);
        config.check()?;
        Ok(config)
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("azs=info".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    let config = cli.stack.into_config().context("invalid configuration")?;

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Serve { bind } => {
            serve(config, bind).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(config: StackConfig) -> Result<ExitCode> {
    let report = bootstrap::provision(&config)
        .await
        .context("endpoint discovery failed")?;

    if report.succeeded() {
        info!(cleanup = report.cleanup.as_str(), "Provisioning run succeeded");
        Ok(ExitCode::SUCCESS)
    } else {
        match &report.failure {
            Some(failure) => error!(step = %failure.step, "Provisioning run failed"),
            None => warn!("Provisioning run did not start"),
        }
        Ok(ExitCode::FAILURE)
    }
}

async fn serve(config: StackConfig, bind: SocketAddr) -> Result<()> {
    let state = AppState {
        runner: Arc::new(StackRunner::new(config)),
    };

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %bind, "Web controller listening");

    axum::serve(listener, web::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Web controller stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const BASE_ARGS: [&str; 13] = [
        "azs-demo",
        "--arm-endpoint",
        "https://management.local.azurestack.external",
        "--location",
        "local",
        "--client-id",
        "client",
        "--tenant-id",
        "tenant",
        "--client-secret",
        "secret",
        "--subscription-id",
        "sub",
    ];

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_with_bind() {
        let args = BASE_ARGS.iter().copied().chain(["serve", "--bind", "127.0.0.1:9000"]);
        let cli = Cli::try_parse_from(args).unwrap();

        assert!(matches!(
            cli.command,
            Commands::Serve { bind } if bind == "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        ));
    }

    #[test]
    fn builds_config_from_flags() {
        let args = BASE_ARGS
            .iter()
            .copied()
            .chain(["--insecure", "--request-timeout", "45", "run"]);
        let cli = Cli::try_parse_from(args).unwrap();

        let config = cli.stack.into_config().unwrap();
        assert_eq!(config.location, "local");
        assert_eq!(config.credentials.secret(), "secret");
        assert_eq!(config.request_timeout_secs, 45);
        assert!(!config.tls_verify);
    }

    #[test]
    fn rejects_out_of_range_timeout() {
        let args = BASE_ARGS
            .iter()
            .copied()
            .chain(["--request-timeout", "0", "run"]);
        let cli = Cli::try_parse_from(args).unwrap();

        assert!(cli.stack.into_config().is_err());
    }
}
