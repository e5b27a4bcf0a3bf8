// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{targets, timing, webhooks};
use crate::error::{PurgeError, Result};
use std::env;
use std::time::Duration;

/// Webhook configuration match strategies, each applied independently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookMatchers {
    /// Substring matched against the configuration name
    pub name_marker: String,
    /// Exact matches against the declared webhook names
    pub webhook_names: Vec<String>,
    /// Exact matches against the backing service names
    pub service_names: Vec<String>,
}

impl Default for WebhookMatchers {
    fn default() -> Self {
        Self {
            name_marker: webhooks::DEFAULT_NAME_MARKER.to_string(),
            webhook_names: to_owned_list(webhooks::DEFAULT_WEBHOOK_NAMES),
            service_names: to_owned_list(webhooks::DEFAULT_SERVICE_NAMES),
        }
    }
}

/// Purge configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// CRDs to remove, in order
    pub target_crds: Vec<String>,
    /// Domain suffix reported on during verification
    pub group_suffix: String,
    pub matchers: WebhookMatchers,
    /// Skip the first instance enumeration and bulk delete
    pub fast: bool,
    /// Skip every instance operation
    pub no_instances: bool,
    /// Log mutations instead of issuing them
    pub dry_run: bool,
    pub settle: Duration,
    pub delete_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_crds: to_owned_list(targets::DEFAULT_CRDS),
            group_suffix: targets::DEFAULT_GROUP_SUFFIX.to_string(),
            matchers: WebhookMatchers::default(),
            fast: false,
            no_instances: false,
            dry_run: false,
            settle: Duration::from_secs(timing::SETTLE_SECS),
            delete_timeout: Duration::from_secs(timing::DELETE_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(timing::POLL_INTERVAL_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let flag = |key: &str| lookup(key).is_some_and(|v| v.trim() == "1");

        let matchers = WebhookMatchers {
            name_marker: lookup("WEBHOOK_NAME_MARKER")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.matchers.name_marker),
            webhook_names: lookup("WEBHOOK_NAMES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.matchers.webhook_names),
            service_names: lookup("WEBHOOK_SERVICE_NAMES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.matchers.service_names),
        };

        let target_crds = match lookup("TARGET_CRDS") {
            Some(v) => {
                let list = split_list(&v);
                if list.is_empty() {
                    return Err(PurgeError::InvalidConfig(
                        "TARGET_CRDS is set but names no CRD".to_string(),
                    ));
                }
                list
            }
            None => defaults.target_crds,
        };

        Ok(Config {
            target_crds,
            group_suffix: lookup("CRD_GROUP_SUFFIX")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.group_suffix),
            matchers,
            fast: flag("FAST"),
            no_instances: flag("NO_INSTANCES"),
            dry_run: flag("DRY_RUN"),
            settle: seconds(&lookup, "SETTLE_SECS")?.unwrap_or(defaults.settle),
            delete_timeout: seconds(&lookup, "DELETE_TIMEOUT_SECS")?
                .unwrap_or(defaults.delete_timeout),
            poll_interval: defaults.poll_interval,
        })
    }
}

fn seconds<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| {
                    PurgeError::InvalidConfig(format!("{} must be whole seconds: {}", key, e))
                })
        })
        .transpose()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
