// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes API operations: client setup, CRDs, custom resource instances and admission webhooks.

pub mod client;
pub mod crd;
pub mod instances;
pub mod wait;
pub mod webhooks;

pub use client::{check_api_server, create_client};
pub use webhooks::{remove_blocking_webhooks, WebhookKind, WebhookRef};
