//! Link speed negotiation with a bounded settle window.

use std::sync::Arc;

use jig_core::retry::{retry, RetryPolicy};
use jig_core::types::Mbps;

use crate::hardware::LinkPort;

#[derive(Clone)]
pub struct LinkNegotiator {
    port: Arc<dyn LinkPort>,
    policy: RetryPolicy,
}

impl LinkNegotiator {
    pub fn new(port: Arc<dyn LinkPort>, policy: RetryPolicy) -> Self {
        Self { port, policy }
    }

    /// Kernel-reported rate, 0 when there is no link.
    pub fn current_speed(&self) -> Mbps {
        self.port.speed()
    }

    /// Force the link to `target` and wait for the kernel to report it.
    ///
    /// Polls once per policy interval, at most `policy.attempts` times.
    /// Returns `true` as soon as the observed rate equals `target`.
    pub async fn negotiate(&self, target: Mbps) -> bool {
        if let Err(e) = self.port.force_speed(target).await {
            // The link may already be at the target; keep polling.
            tracing::warn!(target, error = %e, "Link speed command failed");
        }

        let result = retry(&self.policy, |attempt| {
            let observed = self.port.speed();
            async move {
                if observed == target {
                    Ok(observed)
                } else {
                    tracing::trace!(attempt, observed, target, "Link not settled");
                    Err(format!("link at {observed} Mbps, waiting for {target}"))
                }
            }
        })
        .await;

        match result {
            Ok(_) => {
                tracing::info!(target, "Link negotiated");
                true
            }
            Err(e) => {
                tracing::warn!(target, error = %e, "Link negotiation timed out");
                false
            }
        }
    }
}
