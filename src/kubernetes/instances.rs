// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource instance enumeration, deletion and finalizer stripping

use crate::constants::FINALIZE_SUBRESOURCE;
use crate::error::{PurgeError, Result};
use crate::kubernetes::wait::wait_until_gone;
use crate::types::target::CrdTarget;
use kube::{
    api::{DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams},
    Api, Client, ResourceExt,
};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

fn instance_api(
    client: &Client,
    target: &CrdTarget,
    namespace: Option<&str>,
) -> Api<DynamicObject> {
    let ar = target.api_resource();
    match namespace {
        Some(ns) if target.namespaced => Api::namespaced_with(client.clone(), ns, &ar),
        _ => Api::all_with(client.clone(), &ar),
    }
}

fn api_for(client: &Client, target: &CrdTarget, instance: &DynamicObject) -> Api<DynamicObject> {
    instance_api(client, target, instance.namespace().as_deref())
}

/// `namespace/name` for namespaced instances, `name` otherwise
pub fn instance_label(instance: &DynamicObject) -> String {
    match instance.namespace() {
        Some(ns) => format!("{}/{}", ns, instance.name_any()),
        None => instance.name_any(),
    }
}

/// List every instance of the target across all namespaces
#[instrument(skip(client, target), fields(resource = %target.resource_ref()))]
pub async fn list_instances(client: &Client, target: &CrdTarget) -> Result<Vec<DynamicObject>> {
    let list = instance_api(client, target, None)
        .list(&ListParams::default())
        .await?;
    debug!("Found {} instances", list.items.len());
    Ok(list.items)
}

/// Outcome of deleting a batch of instances
#[derive(Debug, Default)]
pub struct BulkDelete {
    pub requested: usize,
    pub errors: Vec<(String, PurgeError)>,
}

impl BulkDelete {
    /// True if any delete was refused because an admission webhook could not be called
    pub fn blocked_by_webhook(&self) -> bool {
        self.errors.iter().any(|(_, e)| e.is_webhook_failure())
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Request deletion of every given instance. Missing instances count as deleted.
#[instrument(skip_all, fields(resource = %target.resource_ref(), count = instances.len()))]
pub async fn delete_instances(
    client: &Client,
    target: &CrdTarget,
    instances: &[DynamicObject],
    dry_run: bool,
) -> BulkDelete {
    let mut report = BulkDelete::default();

    for instance in instances {
        let label = instance_label(instance);
        report.requested += 1;

        if dry_run {
            info!("[dry-run] would delete {} {}", target.resource_ref(), label);
            continue;
        }

        match delete_instance(client, target, instance).await {
            Ok(()) => debug!("Deletion of {} accepted", label),
            Err(e) => report.errors.push((label, e)),
        }
    }

    report
}

async fn delete_instance(
    client: &Client,
    target: &CrdTarget,
    instance: &DynamicObject,
) -> Result<()> {
    match api_for(client, target, instance)
        .delete(&instance.name_any(), &DeleteParams::default())
        .await
    {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Wait, bounded, until no instance of the target is left
pub async fn wait_for_instances_gone(
    client: &Client,
    target: &CrdTarget,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let what = format!("instances of {}", target.resource_ref());
    wait_until_gone(&what, timeout, interval, move || async move {
        Ok(list_instances(client, target).await?.is_empty())
    })
    .await
}

/// Strip the finalizers from one instance and delete it without waiting.
///
/// The live object is fetched, merge-patched to `finalizers: []`, PUT to its
/// finalize subresource with empty finalizers, then deleted. Every step is
/// attempted even when an earlier one failed. Returns true when no step failed.
#[instrument(skip_all, fields(instance = %instance_label(instance)))]
pub async fn force_remove_instance(
    client: &Client,
    target: &CrdTarget,
    instance: &DynamicObject,
    dry_run: bool,
) -> bool {
    let api = api_for(client, target, instance);
    let name = instance.name_any();
    let label = instance_label(instance);

    let mut live = match api.get_opt(&name).await {
        Ok(Some(obj)) => obj,
        Ok(None) => {
            debug!("{} already gone", label);
            return true;
        }
        Err(e) => {
            warn!("Failed to fetch {}: {}, using listed copy", label, e);
            instance.clone()
        }
    };

    if dry_run {
        info!(
            "[dry-run] would clear finalizers {:?} from {} and delete it",
            live.finalizers(),
            label
        );
        return true;
    }

    let mut clean = true;

    let patch = json!({ "metadata": { "finalizers": [] } });
    if let Err(e) = api
        .patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
    {
        clean &= tolerate(&label, "merge-patch finalizers", e);
    }

    live.metadata.finalizers = Some(Vec::new());
    match serde_json::to_vec(&live) {
        Ok(body) => {
            if let Err(e) = api
                .replace_subresource(FINALIZE_SUBRESOURCE, &name, &PostParams::default(), body)
                .await
            {
                clean &= tolerate(&label, "finalize", e);
            }
        }
        Err(e) => {
            warn!("Failed to serialize {}: {}", label, e);
            clean = false;
        }
    }

    if let Err(e) = api.delete(&name, &DeleteParams::default()).await {
        clean &= tolerate(&label, "delete", e);
    }

    if clean {
        info!("Force-removed {}", label);
    }
    clean
}

/// Log a failed sub-step; not found counts as success
fn tolerate(label: &str, step: &str, e: kube::Error) -> bool {
    match e {
        kube::Error::Api(err) if err.code == 404 => true,
        e => {
            warn!("{} of {} failed: {}", step, label, e);
            false
        }
    }
}
