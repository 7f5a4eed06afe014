//! Bandwidth measurement against the configured peer.
//!
//! The peer serves one session at a time, so an empty result usually
//! means another unit is being measured. Such runs are retried under the
//! shared policy; only exhaustion produces a 0 measurement.

use std::sync::Arc;

use jig_core::action::ThroughputRole;
use jig_core::iperf::parse_bitrate;
use jig_core::retry::{retry, RetryPolicy};
use jig_core::types::Mbps;

use crate::error::HardwareError;
use crate::hardware::BandwidthTool;
use crate::link::LinkNegotiator;

/// Link rate required before a measurement is meaningful.
pub const PROBE_LINK_MBPS: Mbps = 1000;

pub struct ThroughputProbe {
    tool: Arc<dyn BandwidthTool>,
    link: LinkNegotiator,
    policy: RetryPolicy,
}

impl ThroughputProbe {
    pub fn new(tool: Arc<dyn BandwidthTool>, link: LinkNegotiator, policy: RetryPolicy) -> Self {
        Self { tool, link, policy }
    }

    /// Measure the rate seen by `role` against `peer`, in Mbit/s.
    ///
    /// Brings the link to gigabit first when it is slower. Returns 0 when
    /// every attempt came back empty or failed.
    pub async fn measure(&self, role: ThroughputRole, peer: &str) -> Mbps {
        let at_gigabit = self.link.current_speed() == PROBE_LINK_MBPS
            || self.link.negotiate(PROBE_LINK_MBPS).await;
        if !at_gigabit {
            tracing::warn!("Link not at gigabit, measuring anyway");
        }

        let result = retry(&self.policy, |attempt| async move {
            let output = self.tool.run(peer).await?;
            match parse_bitrate(&output, role) {
                0 => {
                    tracing::debug!(attempt, peer, "Bandwidth peer busy");
                    Err(HardwareError::PeerBusy)
                }
                mbps => Ok(mbps),
            }
        })
        .await;

        match result {
            Ok(mbps) => {
                tracing::info!(role = role.marker(), peer, mbps, "Throughput measured");
                mbps
            }
            Err(e) => {
                tracing::warn!(role = role.marker(), peer, error = %e, "Throughput probe gave up");
                0
            }
        }
    }
}
