// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crdpurge::config::Config;
use crdpurge::kubernetes::{check_api_server, create_client};
use crdpurge::purge::Purger;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, defaulting to info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting CRD force-removal");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Targets: {}", config.target_crds.join(", "));

    // Nothing is mutated unless the cluster is reachable
    let client = create_client()
        .await
        .context("A working kubeconfig or in-cluster configuration is required")?;
    check_api_server(&client)
        .await
        .context("Kubernetes API server is not reachable")?;

    let summary = Purger::new(client, config).run().await;
    summary.log();

    if !summary.all_targets_gone() {
        warn!("Some CRDs could not be removed, see the messages above");
    }
    info!("Done");
    Ok(())
}
