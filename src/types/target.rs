// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{PurgeError, Result};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{ApiResource, GroupVersionKind},
    ResourceExt,
};

/// Addressing information for the instances of one target CRD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrdTarget {
    pub crd_name: String,
    pub group: String,
    pub plural: String,
    pub kind: String,
    pub version: String,
    pub namespaced: bool,
}

impl CrdTarget {
    /// Resolve the target from a live CRD, preferring its storage version
    pub fn from_crd(crd: &CustomResourceDefinition) -> Result<Self> {
        let crd_name = crd.name_any();
        let spec = &crd.spec;

        if spec.group.is_empty() || spec.names.plural.is_empty() {
            return Err(PurgeError::InvalidCrd(
                crd_name,
                "spec.group or spec.names.plural is empty".to_string(),
            ));
        }

        let version = spec
            .versions
            .iter()
            .find(|v| v.storage)
            .or_else(|| spec.versions.iter().find(|v| v.served))
            .or_else(|| spec.versions.first())
            .map(|v| v.name.clone())
            .ok_or_else(|| PurgeError::InvalidCrd(crd_name.clone(), "no versions".to_string()))?;

        Ok(Self {
            crd_name,
            group: spec.group.clone(),
            plural: spec.names.plural.clone(),
            kind: spec.names.kind.clone(),
            version,
            namespaced: spec.scope == "Namespaced",
        })
    }

    /// The `plural.group` reference used on the command line
    pub fn resource_ref(&self) -> String {
        format!("{}.{}", self.plural, self.group)
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(&self.group, &self.version, &self.kind),
            &self.plural,
        )
    }
}
