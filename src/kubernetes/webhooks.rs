// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Discovery and removal of admission webhooks that block deletions

use crate::config::WebhookMatchers;
use crate::error::Result;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use kube::{
    api::{DeleteParams, ListParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WebhookKind {
    Validating,
    Mutating,
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookKind::Validating => write!(f, "validatingwebhookconfiguration"),
            WebhookKind::Mutating => write!(f, "mutatingwebhookconfiguration"),
        }
    }
}

/// A webhook configuration selected for deletion
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WebhookRef {
    pub kind: WebhookKind,
    pub name: String,
}

impl fmt::Display for WebhookRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// The parts of a webhook configuration the matchers look at
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub kind: WebhookKind,
    pub name: String,
    pub webhook_names: Vec<String>,
    pub service_names: Vec<String>,
}

impl WebhookConfig {
    fn reference(&self) -> WebhookRef {
        WebhookRef {
            kind: self.kind,
            name: self.name.clone(),
        }
    }
}

impl From<&ValidatingWebhookConfiguration> for WebhookConfig {
    fn from(config: &ValidatingWebhookConfiguration) -> Self {
        let webhooks = config.webhooks.as_deref().unwrap_or_default();
        Self {
            kind: WebhookKind::Validating,
            name: config.name_any(),
            webhook_names: webhooks.iter().map(|w| w.name.clone()).collect(),
            service_names: webhooks
                .iter()
                .filter_map(|w| w.client_config.service.as_ref())
                .map(|s| s.name.clone())
                .collect(),
        }
    }
}

impl From<&MutatingWebhookConfiguration> for WebhookConfig {
    fn from(config: &MutatingWebhookConfiguration) -> Self {
        let webhooks = config.webhooks.as_deref().unwrap_or_default();
        Self {
            kind: WebhookKind::Mutating,
            name: config.name_any(),
            webhook_names: webhooks.iter().map(|w| w.name.clone()).collect(),
            service_names: webhooks
                .iter()
                .filter_map(|w| w.client_config.service.as_ref())
                .map(|s| s.name.clone())
                .collect(),
        }
    }
}

fn select_by_name_marker(configs: &[WebhookConfig], marker: &str) -> BTreeSet<WebhookRef> {
    if marker.is_empty() {
        return BTreeSet::new();
    }
    configs
        .iter()
        .filter(|c| c.name.contains(marker))
        .map(WebhookConfig::reference)
        .collect()
}

fn select_by_webhook_name(configs: &[WebhookConfig], names: &[String]) -> BTreeSet<WebhookRef> {
    configs
        .iter()
        .filter(|c| c.webhook_names.iter().any(|w| names.contains(w)))
        .map(WebhookConfig::reference)
        .collect()
}

fn select_by_service_name(configs: &[WebhookConfig], names: &[String]) -> BTreeSet<WebhookRef> {
    configs
        .iter()
        .filter(|c| c.service_names.iter().any(|s| names.contains(s)))
        .map(WebhookConfig::reference)
        .collect()
}

/// Apply the three match strategies independently and union the results
pub fn select_matching(
    configs: &[WebhookConfig],
    matchers: &WebhookMatchers,
) -> BTreeSet<WebhookRef> {
    let by_marker = select_by_name_marker(configs, &matchers.name_marker);
    let by_webhook = select_by_webhook_name(configs, &matchers.webhook_names);
    let by_service = select_by_service_name(configs, &matchers.service_names);

    debug!(
        "Webhook matches: {} by name marker, {} by webhook name, {} by service name",
        by_marker.len(),
        by_webhook.len(),
        by_service.len()
    );

    by_marker
        .into_iter()
        .chain(by_webhook)
        .chain(by_service)
        .collect()
}

/// List validating and mutating webhook configurations.
/// A failure to list one kind is logged and the other kind is still returned.
pub async fn list_webhook_configs(client: &Client) -> Vec<WebhookConfig> {
    let mut configs = Vec::new();

    let validating: Api<ValidatingWebhookConfiguration> = Api::all(client.clone());
    match validating.list(&ListParams::default()).await {
        Ok(list) => configs.extend(list.items.iter().map(WebhookConfig::from)),
        Err(e) => error!("Failed to list validating webhook configurations: {}", e),
    }

    let mutating: Api<MutatingWebhookConfiguration> = Api::all(client.clone());
    match mutating.list(&ListParams::default()).await {
        Ok(list) => configs.extend(list.items.iter().map(WebhookConfig::from)),
        Err(e) => error!("Failed to list mutating webhook configurations: {}", e),
    }

    configs
}

/// Delete one webhook configuration. Returns false if it was already gone.
#[instrument(skip(client), fields(webhook = %webhook))]
pub async fn delete_webhook(client: &Client, webhook: &WebhookRef, dry_run: bool) -> Result<bool> {
    if dry_run {
        info!("[dry-run] would delete {}", webhook);
        return Ok(true);
    }

    let dp = DeleteParams::default();
    let result = match webhook.kind {
        WebhookKind::Validating => Api::<ValidatingWebhookConfiguration>::all(client.clone())
            .delete(&webhook.name, &dp)
            .await
            .map(|_| ()),
        WebhookKind::Mutating => Api::<MutatingWebhookConfiguration>::all(client.clone())
            .delete(&webhook.name, &dp)
            .await
            .map(|_| ()),
    };

    match result {
        Ok(()) => Ok(true),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Find the webhooks selected by `matchers` and delete them.
/// Returns the configurations that were deleted.
#[instrument(skip_all)]
pub async fn remove_blocking_webhooks(
    client: &Client,
    matchers: &WebhookMatchers,
    dry_run: bool,
) -> Vec<WebhookRef> {
    let configs = list_webhook_configs(client).await;
    let selected = select_matching(&configs, matchers);

    if selected.is_empty() {
        info!("No matching admission webhooks found");
        return Vec::new();
    }

    let mut removed = Vec::new();
    for webhook in selected {
        match delete_webhook(client, &webhook, dry_run).await {
            Ok(true) => {
                info!("Deleted {}", webhook);
                removed.push(webhook);
            }
            Ok(false) => debug!("{} already gone", webhook),
            Err(e) => warn!("Failed to delete {}: {}", webhook, e),
        }
    }
    removed
}
