// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD force-removal workflow and its reporting.

pub mod report;
pub mod workflow;

pub use report::{CrdOutcome, RunSummary};
pub use workflow::Purger;
