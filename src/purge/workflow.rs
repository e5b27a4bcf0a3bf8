// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The force-removal run: webhooks first, then each target CRD, then verification.

use crate::config::Config;
use crate::kubernetes::crd::{
    delete_crd_and_wait, get_crd, list_crds_in_group, remove_crd_finalizers,
};
use crate::kubernetes::instances::{
    delete_instances, force_remove_instance, list_instances, wait_for_instances_gone,
};
use crate::kubernetes::webhooks::remove_blocking_webhooks;
use crate::purge::report::{remediation_hint, CrdOutcome, RemainingCrd, RunSummary};
use crate::types::target::CrdTarget;
use kube::api::DynamicObject;
use kube::Client;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Runs the force-removal workflow once against a cluster.
/// Every step is best effort: failures are logged and the run carries on.
pub struct Purger {
    client: Client,
    config: Config,
}

impl Purger {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(&self) -> RunSummary {
        if self.config.dry_run {
            info!("Dry run: no changes will be made");
        }
        info!(
            "Purging {} CRDs (fast={}, no_instances={})",
            self.config.target_crds.len(),
            self.config.fast,
            self.config.no_instances
        );

        info!("Removing admission webhooks that may block deletion...");
        let webhooks_removed =
            remove_blocking_webhooks(&self.client, &self.config.matchers, self.config.dry_run)
                .await;

        let mut outcomes = Vec::with_capacity(self.config.target_crds.len());
        for name in &self.config.target_crds {
            let outcome = self.purge_crd(name).await;
            outcomes.push((name.clone(), outcome));
        }

        let remaining = self.verify().await;

        RunSummary {
            webhooks_removed,
            outcomes,
            remaining,
        }
    }

    #[instrument(skip(self))]
    async fn purge_crd(&self, name: &str) -> CrdOutcome {
        let crd = match get_crd(&self.client, name).await {
            Ok(Some(crd)) => crd,
            Ok(None) => {
                info!("CRD {} not found, skipping", name);
                return CrdOutcome::Absent;
            }
            Err(e) => {
                error!("Failed to get CRD {}: {}", name, e);
                return CrdOutcome::Failed(e.to_string());
            }
        };

        if self.config.no_instances {
            info!("NO_INSTANCES set, leaving instances of {} alone", name);
        } else {
            match CrdTarget::from_crd(&crd) {
                Ok(target) => {
                    info!("Cleaning up instances of {}", target.resource_ref());
                    self.purge_instances(&target).await;
                }
                Err(e) => warn!("{}, skipping instance cleanup", e),
            }
        }

        if self.config.dry_run {
            info!("[dry-run] would delete CRD {}", name);
            return CrdOutcome::Planned;
        }

        self.delete_crd(name).await
    }

    async fn purge_instances(&self, target: &CrdTarget) {
        if self.config.fast {
            info!("FAST set, skipping instance enumeration");
        } else {
            match list_instances(&self.client, target).await {
                Ok(instances) if instances.is_empty() => {
                    info!("No instances of {} found", target.resource_ref())
                }
                Ok(instances) => self.bulk_delete(target, &instances).await,
                Err(e) => warn!("Failed to list instances of {}: {}", target.resource_ref(), e),
            }
        }

        if !self.config.dry_run {
            sleep(self.config.settle).await;
        }

        let remaining = match list_instances(&self.client, target).await {
            Ok(remaining) => remaining,
            Err(e) => {
                warn!(
                    "Failed to list remaining instances of {}: {}",
                    target.resource_ref(),
                    e
                );
                return;
            }
        };

        if remaining.is_empty() {
            debug!("No instances of {} remain", target.resource_ref());
            return;
        }

        info!(
            "{} instances of {} remain, stripping finalizers",
            remaining.len(),
            target.resource_ref()
        );
        for instance in &remaining {
            force_remove_instance(&self.client, target, instance, self.config.dry_run).await;
        }
    }

    async fn bulk_delete(&self, target: &CrdTarget, instances: &[DynamicObject]) {
        info!(
            "Deleting {} instances of {} in all namespaces",
            instances.len(),
            target.resource_ref()
        );
        let report = delete_instances(&self.client, target, instances, self.config.dry_run).await;

        if report.blocked_by_webhook() {
            warn!(
                "Deletion of {} blocked by an admission webhook, retrying without waiting",
                target.resource_ref()
            );
            let retry =
                delete_instances(&self.client, target, instances, self.config.dry_run).await;
            for (label, e) in &retry.errors {
                warn!("Retried delete of {} failed: {}", label, e);
            }
            return;
        }

        if !report.is_clean() {
            for (label, e) in &report.errors {
                warn!("Delete of {} failed: {}", label, e);
            }
            return;
        }

        if self.config.dry_run {
            return;
        }

        if let Err(e) = wait_for_instances_gone(
            &self.client,
            target,
            self.config.delete_timeout,
            self.config.poll_interval,
        )
        .await
        {
            warn!("{}, continuing", e);
        }
    }

    /// Delete the CRD, clearing its finalizers when a plain delete does not finish
    async fn delete_crd(&self, name: &str) -> CrdOutcome {
        let timeout = self.config.delete_timeout;
        let interval = self.config.poll_interval;

        info!("Deleting CRD {}", name);
        match delete_crd_and_wait(&self.client, name, timeout, interval).await {
            Ok(()) => {
                info!("CRD {} deleted", name);
                return CrdOutcome::Deleted;
            }
            Err(e) => warn!("CRD {} not deleted: {}", name, e),
        }

        info!("Clearing finalizers of CRD {}", name);
        if let Err(e) = remove_crd_finalizers(&self.client, name).await {
            warn!("Failed to clear finalizers of CRD {}: {}", name, e);
        }

        match delete_crd_and_wait(&self.client, name, timeout, interval).await {
            Ok(()) => {
                info!("CRD {} deleted after clearing finalizers", name);
                CrdOutcome::DeletedAfterFinalize
            }
            Err(e) => {
                error!("CRD {} is still present: {}", name, e);
                warn!("Remove it manually with: {}", remediation_hint(name));
                CrdOutcome::Stuck
            }
        }
    }

    /// List what is left in the target group's domain
    async fn verify(&self) -> Option<Vec<RemainingCrd>> {
        info!("Checking for remaining *.{} CRDs", self.config.group_suffix);
        match list_crds_in_group(&self.client, &self.config.group_suffix).await {
            Ok(crds) => Some(crds.iter().map(RemainingCrd::from).collect()),
            Err(e) => {
                error!("Failed to list remaining CRDs: {}", e);
                None
            }
        }
    }
}
