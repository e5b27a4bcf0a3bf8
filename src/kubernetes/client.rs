// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation and API server reachability checks

use crate::error::{PurgeError, Result};
use kube::{Client, Config as KConfig};
use tracing::{debug, info, instrument};

/// Create a client from the local kubeconfig or in-cluster environment
pub async fn create_client() -> Result<Client> {
    let config = KConfig::infer()
        .await
        .map_err(|e| PurgeError::ClientUnavailable(format!("Failed to infer config: {}", e)))?;

    debug!("Using cluster at {}", config.cluster_url);

    Client::try_from(config)
        .map_err(|e| PurgeError::ClientUnavailable(format!("Failed to create client: {}", e)))
}

/// Make sure the API server answers before anything is mutated
#[instrument(skip(client))]
pub async fn check_api_server(client: &Client) -> Result<()> {
    let version = client.apiserver_version().await.map_err(|e| {
        PurgeError::ClientUnavailable(format!("API server did not answer a version request: {}", e))
    })?;

    info!(
        "Connected to Kubernetes {}.{} ({})",
        version.major, version.minor, version.git_version
    );
    Ok(())
}
