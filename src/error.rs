// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PurgeError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Kubernetes client unavailable: {0}")]
    ClientUnavailable(String),

    #[error("Invalid CRD {0}: {1}")]
    InvalidCrd(String, String),

    #[error("Timed out waiting for {0} to be deleted")]
    DeleteTimeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PurgeError {
    /// True when the API server reported the object as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, PurgeError::KubeError(kube::Error::Api(err)) if err.code == 404)
    }

    /// True when the request was rejected because an admission webhook could not be reached
    pub fn is_webhook_failure(&self) -> bool {
        match self {
            PurgeError::KubeError(kube::Error::Api(err)) => {
                is_webhook_failure_message(&err.message)
            }
            PurgeError::KubeError(e) => is_webhook_failure_message(&e.to_string()),
            _ => false,
        }
    }
}

/// Match the API server's wording for a failed admission webhook call
pub fn is_webhook_failure_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("failed calling webhook") || message.contains("admission webhook")
}

pub type Result<T> = std::result::Result<T, PurgeError>;
