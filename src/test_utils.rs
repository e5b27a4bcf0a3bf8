// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

type Route = (String, String);

/// A request the mock API server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Several responses registered for the same route are served in order; the
/// last one keeps being served once the others are used up. Every request is
/// recorded so tests can assert on what was (or was not) sent.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<Route, VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests with the given method whose path equals `path`
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// True if any request touched a path starting with `prefix`
    pub fn touched(&self, prefix: &str) -> bool {
        self.requests().iter().any(|r| r.path.starts_with(prefix))
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&(method.to_string(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = req
                .into_body()
                .collect()
                .await
                .map(|c| c.to_bytes().to_vec())
                .unwrap_or_default();
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                body,
            });

            let (status, body) =
                response.unwrap_or_else(|| (404, not_found_json("object", "unknown")));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

pub const CRD_PATH: &str = "/apis/apiextensions.k8s.io/v1/customresourcedefinitions";
pub const VALIDATING_PATH: &str =
    "/apis/admissionregistration.k8s.io/v1/validatingwebhookconfigurations";
pub const MUTATING_PATH: &str =
    "/apis/admissionregistration.k8s.io/v1/mutatingwebhookconfigurations";

pub fn crd_path(name: &str) -> String {
    format!("{}/{}", CRD_PATH, name)
}

/// Create a mock CRD JSON response for `<plural>.longhorn.io`
pub fn crd_json(plural: &str, kind: &str, finalizers: &[&str]) -> String {
    crd_value(plural, kind, finalizers).to_string()
}

fn crd_value(plural: &str, kind: &str, finalizers: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "CustomResourceDefinition",
        "metadata": {
            "name": format!("{}.longhorn.io", plural),
            "uid": format!("{}-uid", plural),
            "finalizers": finalizers,
        },
        "spec": {
            "group": "longhorn.io",
            "names": {
                "plural": plural,
                "singular": plural.trim_end_matches('s'),
                "kind": kind,
                "listKind": format!("{}List", kind),
            },
            "scope": "Namespaced",
            "versions": [
                { "name": "v1beta1", "served": true, "storage": false },
                { "name": "v1beta2", "served": true, "storage": true }
            ]
        }
    })
}

/// Create a mock CRD list response from (plural, kind) pairs
pub fn crd_list_json(crds: &[(&str, &str)]) -> String {
    let items: Vec<serde_json::Value> = crds
        .iter()
        .map(|(plural, kind)| crd_value(plural, kind, &[]))
        .collect();
    list_json("apiextensions.k8s.io/v1", "CustomResourceDefinitionList", items)
}

/// Create a mock custom resource instance JSON value
pub fn instance_value(
    kind: &str,
    namespace: &str,
    name: &str,
    finalizers: &[&str],
) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "longhorn.io/v1beta2",
        "kind": kind,
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("{}-uid", name),
            "finalizers": finalizers,
        },
        "spec": {}
    })
}

pub fn list_json(api_version: &str, kind: &str, items: Vec<serde_json::Value>) -> String {
    serde_json::json!({
        "apiVersion": api_version,
        "kind": kind,
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

/// Create a webhook configuration JSON value with (webhook name, service name) entries
pub fn webhook_config_value(
    kind: &str,
    name: &str,
    webhooks: &[(&str, &str)],
) -> serde_json::Value {
    let webhooks: Vec<serde_json::Value> = webhooks
        .iter()
        .map(|(webhook, service)| {
            serde_json::json!({
                "name": webhook,
                "admissionReviewVersions": ["v1"],
                "sideEffects": "None",
                "clientConfig": {
                    "service": { "name": service, "namespace": "longhorn-system" }
                }
            })
        })
        .collect();
    serde_json::json!({
        "apiVersion": "admissionregistration.k8s.io/v1",
        "kind": kind,
        "metadata": { "name": name },
        "webhooks": webhooks
    })
}

pub fn version_json() -> String {
    serde_json::json!({
        "major": "1",
        "minor": "30",
        "gitVersion": "v1.30.4",
        "gitCommit": "a51b3b711150f57ffc1f526a640ec058514ed596",
        "gitTreeState": "clean",
        "buildDate": "2024-08-14T19:04:36Z",
        "goVersion": "go1.22.5",
        "compiler": "gc",
        "platform": "linux/amd64"
    })
    .to_string()
}

/// Create a successful Status response as returned by DELETE
pub fn status_success_json() -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Success",
        "code": 200
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Create the 500 response returned when an admission webhook has no live backend
pub fn webhook_failure_json(webhook: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!(
            "Internal error occurred: failed calling webhook \"{}\": failed to call webhook: \
             Post \"https://longhorn-admission-webhook.longhorn-system.svc:9502/v1/webhook/validation?timeout=10s\": \
             dial tcp 10.152.183.40:9502: connect: connection refused",
            webhook
        ),
        "reason": "InternalError",
        "code": 500
    })
    .to_string()
}
