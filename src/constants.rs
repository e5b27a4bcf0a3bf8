// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Default purge targets and their API group
pub mod targets {
    /// CRDs removed when TARGET_CRDS is not set
    pub const DEFAULT_CRDS: &[&str] = &[
        "engineimages.longhorn.io",
        "nodes.longhorn.io",
        "instancemanagers.longhorn.io",
    ];
    /// Domain suffix used to report leftover CRDs after the run
    pub const DEFAULT_GROUP_SUFFIX: &str = "longhorn.io";
}

/// Heuristics used to find the admission webhooks that block deletion
pub mod webhooks {
    /// Substring looked for in webhook configuration names
    pub const DEFAULT_NAME_MARKER: &str = "longhorn";
    /// Declared webhook names served by the Longhorn admission webhook
    pub const DEFAULT_WEBHOOK_NAMES: &[&str] = &["validator.longhorn.io", "mutator.longhorn.io"];
    /// Service backing the Longhorn admission webhook
    pub const DEFAULT_SERVICE_NAMES: &[&str] = &["longhorn-admission-webhook"];
}

/// Wait and pause tuning
pub mod timing {
    /// Pause between the bulk instance delete and the finalizer sweep
    pub const SETTLE_SECS: u64 = 5;
    /// Upper bound for waiting on a deletion to complete
    pub const DELETE_TIMEOUT_SECS: u64 = 30;
    /// Interval between existence checks while waiting on a deletion
    pub const POLL_INTERVAL_SECS: u64 = 2;
}

/// Name of the subresource used to force-clear finalizers
pub const FINALIZE_SUBRESOURCE: &str = "finalize";
