//! `iperf3` client runner.

use std::time::Duration;

use async_trait::async_trait;

use super::process::run_tool;
use super::BandwidthTool;
use crate::error::HardwareError;

/// Length of one measurement session in seconds.
const SESSION_SECS: &str = "1";

/// Hard ceiling for one client run, connection setup included.
const RUN_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Iperf3 {
    program: String,
}

impl Iperf3 {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl BandwidthTool for Iperf3 {
    async fn run(&self, peer: &str) -> Result<String, HardwareError> {
        // iperf3 exits non-zero when the server is busy; the caller treats
        // an output without summary lines as a busy peer.
        let output = run_tool(
            &self.program,
            &["-t", SESSION_SECS, "-c", peer],
            RUN_TIMEOUT,
            true,
        )
        .await?;

        if !output.status.success() {
            tracing::debug!(
                peer,
                exit_code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "iperf3 run unsuccessful",
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
