//! sysfs link-rate query and `ethtool` speed forcing.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use jig_core::types::Mbps;

use super::process::run_tool;
use super::LinkPort;
use crate::error::HardwareError;

const ETHTOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Default sysfs directory holding one entry per network interface.
pub const SYSFS_NET: &str = "/sys/class/net";

pub struct SysfsLink {
    iface: String,
    sysfs_root: PathBuf,
    ethtool: String,
}

impl SysfsLink {
    pub fn new(iface: impl Into<String>, ethtool: impl Into<String>) -> Self {
        Self::with_root(iface, ethtool, SYSFS_NET)
    }

    pub fn with_root(
        iface: impl Into<String>,
        ethtool: impl Into<String>,
        sysfs_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            iface: iface.into(),
            sysfs_root: sysfs_root.into(),
            ethtool: ethtool.into(),
        }
    }

    fn speed_path(&self) -> PathBuf {
        self.sysfs_root.join(&self.iface).join("speed")
    }
}

#[async_trait]
impl LinkPort for SysfsLink {
    fn speed(&self) -> Mbps {
        // The kernel reports -1 (or EINVAL on read) while the carrier is down.
        fs::read_to_string(self.speed_path())
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .and_then(|v| Mbps::try_from(v).ok())
            .unwrap_or(0)
    }

    async fn force_speed(&self, mbps: Mbps) -> Result<(), HardwareError> {
        let speed = mbps.to_string();
        tracing::info!(iface = %self.iface, mbps, "Forcing link speed");
        run_tool(
            &self.ethtool,
            &["-s", &self.iface, "speed", &speed, "duplex", "full"],
            ETHTOOL_TIMEOUT,
            false,
        )
        .await?;
        Ok(())
    }
}
