// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded polling for deletions to take effect

use crate::error::{PurgeError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Poll `gone` until it reports true or `timeout` elapses.
/// Check errors are logged and polling continues.
pub async fn wait_until_gone<F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut gone: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        match gone().await {
            Ok(true) => {
                debug!("{} is gone", what);
                return Ok(());
            }
            Ok(false) => debug!("{} still present", what),
            Err(e) => warn!("Error checking whether {} is gone: {}", what, e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PurgeError::DeleteTimeout(what.to_string()));
        }
        sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_returns_once_gone() {
        let calls = Cell::new(0);
        let result = wait_until_gone("thing", Duration::from_secs(5), Duration::ZERO, || {
            calls.set(calls.get() + 1);
            let done = calls.get() >= 3;
            async move { Ok(done) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_times_out_when_never_gone() {
        let result = wait_until_gone(
            "thing",
            Duration::from_millis(20),
            Duration::from_millis(5),
            || async { Ok(false) },
        )
        .await;

        assert!(matches!(result, Err(PurgeError::DeleteTimeout(what)) if what == "thing"));
    }

    #[tokio::test]
    async fn test_check_errors_do_not_abort() {
        let calls = Cell::new(0);
        let result = wait_until_gone("thing", Duration::from_secs(5), Duration::ZERO, || {
            calls.set(calls.get() + 1);
            let first = calls.get() == 1;
            async move {
                if first {
                    Err(PurgeError::InvalidConfig("flaky".to_string()))
                } else {
                    Ok(true)
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.get(), 2);
    }
}
