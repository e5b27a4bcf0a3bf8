// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-CRD outcomes and the end-of-run summary.

use crate::kubernetes::webhooks::WebhookRef;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::ResourceExt;
use std::fmt;
use tracing::{info, warn};

/// What happened to one target CRD
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrdOutcome {
    /// Already absent, nothing done
    Absent,
    Deleted,
    /// Deleted once its finalizers were cleared
    DeletedAfterFinalize,
    /// Still present after every attempt; a manual command was printed
    Stuck,
    /// Could not be inspected
    Failed(String),
    /// Dry run, nothing was mutated
    Planned,
}

impl CrdOutcome {
    /// True when the CRD is known not to exist anymore
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            CrdOutcome::Absent | CrdOutcome::Deleted | CrdOutcome::DeletedAfterFinalize
        )
    }
}

impl fmt::Display for CrdOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrdOutcome::Absent => write!(f, "absent"),
            CrdOutcome::Deleted => write!(f, "deleted"),
            CrdOutcome::DeletedAfterFinalize => write!(f, "deleted after clearing finalizers"),
            CrdOutcome::Stuck => write!(f, "still present"),
            CrdOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            CrdOutcome::Planned => write!(f, "planned (dry run)"),
        }
    }
}

/// A CRD found by the verification step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainingCrd {
    pub name: String,
    pub terminating: bool,
    pub finalizers: Vec<String>,
}

impl From<&CustomResourceDefinition> for RemainingCrd {
    fn from(crd: &CustomResourceDefinition) -> Self {
        Self {
            name: crd.name_any(),
            terminating: crd.metadata.deletion_timestamp.is_some(),
            finalizers: crd.finalizers().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub webhooks_removed: Vec<WebhookRef>,
    pub outcomes: Vec<(String, CrdOutcome)>,
    /// None when the verification listing failed
    pub remaining: Option<Vec<RemainingCrd>>,
}

impl RunSummary {
    pub fn outcome(&self, crd: &str) -> Option<&CrdOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == crd)
            .map(|(_, outcome)| outcome)
    }

    pub fn all_targets_gone(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_gone())
    }

    pub fn log(&self) {
        info!("Removed {} webhook configurations", self.webhooks_removed.len());
        for (name, outcome) in &self.outcomes {
            match outcome {
                CrdOutcome::Stuck | CrdOutcome::Failed(_) => warn!("{}: {}", name, outcome),
                _ => info!("{}: {}", name, outcome),
            }
        }

        match &self.remaining {
            Some(remaining) if remaining.is_empty() => info!("No matching CRDs remain"),
            Some(remaining) => {
                for crd in remaining {
                    info!(
                        "Remaining CRD {} (terminating: {}, finalizers: {:?})",
                        crd.name, crd.terminating, crd.finalizers
                    );
                }
            }
            None => warn!("Could not verify which CRDs remain"),
        }
    }
}

/// The command an operator can run by hand to unblock a CRD
pub fn remediation_hint(crd: &str) -> String {
    format!(
        "kubectl patch crd {crd} --type=merge -p '{{\"metadata\":{{\"finalizers\":[]}}}}' \
         && kubectl delete crd {crd}"
    )
}
