//! `manifest-mirror` binary.
//!
//! Exits non-zero only when the run cannot start or is aborted: bad
//! arguments, an unreachable bucket, or an unavailable manifest. Per-file
//! failures are logged and leave the scratch directory in place.

mod cli;
mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use manifest_mirror_source_http::{HttpSettings, ReqwestSourceClient};
use manifest_mirror_storage::{RunSummary, SyncOrchestrator};
use manifest_mirror_storage_crt::CrtStorageClient;
use tracing::{error, info};

use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match logging::init_logging(&logging::LoggingConfig::from_env()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(summary) => {
            if !summary.success {
                info!("run finished with failures, rerun to retry the remaining files");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let message: String = format!("{err:#}");
            error!(error = %message, "mirror run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunSummary> {
    let config: AppConfig = AppConfig::from_cli(cli)?;
    info!(
        endpoint = %config.storage.endpoint,
        region = %config.storage.region,
        bucket = %config.bucket,
        manifest_url = %config.sync.manifest_url,
        max_concurrency = config.sync.max_concurrency,
        "starting mirror run"
    );

    let storage: CrtStorageClient = CrtStorageClient::new(config.storage)
        .await
        .context("failed to create storage client")?;
    let source: ReqwestSourceClient = ReqwestSourceClient::new(HttpSettings::default())
        .context("failed to create HTTP client")?;

    let orchestrator = SyncOrchestrator::new(Arc::new(source), Arc::new(storage), config.bucket)
        .with_options(config.sync);

    let summary: RunSummary = orchestrator.run().await?;
    Ok(summary)
}
