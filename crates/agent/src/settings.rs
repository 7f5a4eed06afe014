//! Runtime settings of the agent, read from `JIG_*` environment variables.

use std::path::PathBuf;

use jig_core::config::ETHERNET_CONFIG_FILE;
use jig_core::error::CoreError;

/// Runtime settings of the agent, loaded from environment variables.
///
/// | Env Var              | Default                                      |
/// |----------------------|----------------------------------------------|
/// | `JIG_SERIAL_DEVICE`  | unset: stdin/stdout                          |
/// | `JIG_NET_IFACE`      | `eth0`                                       |
/// | `JIG_CONFIG_DIR`     | `/boot`                                      |
/// | `JIG_MAC_SERVER_URL` | `http://127.0.0.1:8080`                      |
/// | `JIG_BOARD_MODEL`    | `m1s`                                        |
/// | `JIG_OTP_PATH`       | `/sys/bus/nvmem/devices/rockchip-otp0/nvmem` |
/// | `JIG_OTP_OFFSET`     | `0`                                          |
/// | `JIG_IPERF_BIN`      | `iperf3`                                     |
/// | `JIG_ETHTOOL_BIN`    | `ethtool`                                    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub serial_device: Option<PathBuf>,
    pub net_iface: String,
    pub config_dir: PathBuf,
    pub mac_server_url: String,
    pub board_model: String,
    pub otp_path: PathBuf,
    pub otp_offset: u64,
    pub iperf_bin: String,
    pub ethtool_bin: String,
}

impl AgentSettings {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let otp_offset = match get("JIG_OTP_OFFSET") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                CoreError::Config(format!("JIG_OTP_OFFSET must be a byte offset, got '{raw}'"))
            })?,
            None => 0,
        };

        Ok(Self {
            serial_device: get("JIG_SERIAL_DEVICE").map(PathBuf::from),
            net_iface: get_or("JIG_NET_IFACE", "eth0"),
            config_dir: PathBuf::from(get_or("JIG_CONFIG_DIR", "/boot")),
            mac_server_url: get_or("JIG_MAC_SERVER_URL", "http://127.0.0.1:8080"),
            board_model: get_or("JIG_BOARD_MODEL", "m1s"),
            otp_path: PathBuf::from(get_or(
                "JIG_OTP_PATH",
                "/sys/bus/nvmem/devices/rockchip-otp0/nvmem",
            )),
            otp_offset,
            iperf_bin: get_or("JIG_IPERF_BIN", "iperf3"),
            ethtool_bin: get_or("JIG_ETHTOOL_BIN", "ethtool"),
        })
    }

    /// Location of the Ethernet `peer, threshold` file.
    pub fn ethernet_config_path(&self) -> PathBuf {
        self.config_dir.join(ETHERNET_CONFIG_FILE)
    }
}
