// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD lookup, deletion and finalizer removal

use crate::constants::FINALIZE_SUBRESOURCE;
use crate::error::{PurgeError, Result};
use crate::kubernetes::wait::wait_until_gone;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{DeleteParams, ListParams, Patch, PatchParams, PostParams},
    Api, Client,
};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

fn crd_api(client: &Client) -> Api<CustomResourceDefinition> {
    Api::all(client.clone())
}

/// Fetch a CRD, returning None when it does not exist
pub async fn get_crd(client: &Client, name: &str) -> Result<Option<CustomResourceDefinition>> {
    Ok(crd_api(client).get_opt(name).await?)
}

/// List every CRD whose name ends in `.<suffix>`
pub async fn list_crds_in_group(
    client: &Client,
    suffix: &str,
) -> Result<Vec<CustomResourceDefinition>> {
    let domain = format!(".{}", suffix.trim_start_matches('.'));
    let crds = crd_api(client).list(&ListParams::default()).await?;

    Ok(crds
        .items
        .into_iter()
        .filter(|crd| {
            crd.metadata
                .name
                .as_deref()
                .is_some_and(|n| n.ends_with(&domain))
        })
        .collect())
}

/// Request deletion of a CRD. Returns false if it was already gone.
#[instrument(skip(client))]
pub async fn delete_crd(client: &Client, name: &str) -> Result<bool> {
    match crd_api(client).delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            debug!("Deletion of CRD {} accepted", name);
            Ok(true)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("CRD {} already gone", name);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a CRD and wait, bounded, for it to disappear
#[instrument(skip(client, timeout, interval))]
pub async fn delete_crd_and_wait(
    client: &Client,
    name: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    if !delete_crd(client, name).await? {
        return Ok(());
    }

    wait_until_gone(&format!("CRD {}", name), timeout, interval, move || async move {
        Ok(get_crd(client, name).await?.is_none())
    })
    .await
}

/// Strip every finalizer from a CRD.
///
/// The object with `metadata.finalizers` removed is PUT to the finalize
/// subresource. API servers that do not serve that subresource for CRDs get
/// a merge patch nulling the finalizers instead.
#[instrument(skip(client))]
pub async fn remove_crd_finalizers(client: &Client, name: &str) -> Result<()> {
    let api = crd_api(client);

    let Some(mut crd) = api.get_opt(name).await? else {
        debug!("CRD {} gone before its finalizers were removed", name);
        return Ok(());
    };

    let finalizers = crd.metadata.finalizers.take().unwrap_or_default();
    info!("Clearing finalizers {:?} from CRD {}", finalizers, name);
    let body = serde_json::to_vec(&crd)?;

    match api
        .replace_subresource(FINALIZE_SUBRESOURCE, name, &PostParams::default(), body)
        .await
    {
        Ok(_) => return Ok(()),
        // 404 also means the subresource is not served, so only a missing CRD ends here
        Err(kube::Error::Api(err)) if err.code == 404 => {
            if api.get_opt(name).await?.is_none() {
                debug!("CRD {} gone while its finalizers were removed", name);
                return Ok(());
            }
            warn!(
                "Finalize subresource not served for CRD {}, patching finalizers instead",
                name
            );
        }
        Err(e) => warn!(
            "Finalize subresource rejected CRD {} ({}), patching finalizers instead",
            name, e
        ),
    }

    let patch = json!({ "metadata": { "finalizers": null } });
    match api
        .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
    {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(()),
        Err(e) => Err(PurgeError::from(e)),
    }
}
