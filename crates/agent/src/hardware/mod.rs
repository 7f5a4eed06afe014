//! Hardware collaborators of the Ethernet module.
//!
//! Each trait is a narrow seam over one external facility so the test
//! logic can run against fakes. The production implementations live in
//! the submodules.

use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use jig_core::types::Mbps;

use crate::error::HardwareError;
use crate::settings::AgentSettings;

pub mod iperf;
pub mod link;
pub mod mac_server;
pub mod netif;
pub mod otp;
mod process;

/// Kernel view of the physical link, plus the speed/duplex force control.
#[async_trait]
pub trait LinkPort: Send + Sync {
    /// Current negotiated rate, 0 when there is no link or no interface.
    fn speed(&self) -> Mbps;

    /// Force the link to `mbps` full duplex. Returns once the command has
    /// been issued; the kernel settles asynchronously.
    async fn force_speed(&self, mbps: Mbps) -> Result<(), HardwareError>;
}

/// IPv4 address lookup for the interface under test.
pub trait AddressSource: Send + Sync {
    fn ipv4(&self) -> Option<Ipv4Addr>;
}

/// External bandwidth-measurement tool.
#[async_trait]
pub trait BandwidthTool: Send + Sync {
    /// Run one client session against `peer` and return its stdout.
    async fn run(&self, peer: &str) -> Result<String, HardwareError>;
}

/// One-time-programmable memory region holding the provisioning record.
pub trait OtpMemory: Send + Sync {
    fn read(&self) -> Result<Vec<u8>, HardwareError>;
    fn write(&self, record: &[u8]) -> Result<(), HardwareError>;
    fn erase(&self) -> Result<(), HardwareError>;
}

/// Network service handing out provisioning records per board model.
#[async_trait]
pub trait MacAllocator: Send + Sync {
    async fn allocate(&self, model: &str) -> Result<String, HardwareError>;
}

/// The full set of collaborators an Ethernet module is built from.
#[derive(Clone)]
pub struct EthernetHardware {
    pub link: Arc<dyn LinkPort>,
    pub address: Arc<dyn AddressSource>,
    pub otp: Arc<dyn OtpMemory>,
    pub bandwidth: Arc<dyn BandwidthTool>,
    pub allocator: Arc<dyn MacAllocator>,
}

impl EthernetHardware {
    /// Production collaborators for the interface and OTP region named in
    /// `settings`.
    pub fn system(settings: &AgentSettings) -> Result<Self, HardwareError> {
        Ok(Self {
            link: Arc::new(link::SysfsLink::new(
                &settings.net_iface,
                &settings.ethtool_bin,
            )),
            address: Arc::new(netif::InterfaceAddress::new(&settings.net_iface)),
            otp: Arc::new(otp::NvmemOtp::new(&settings.otp_path, settings.otp_offset)),
            bandwidth: Arc::new(iperf::Iperf3::new(&settings.iperf_bin)),
            allocator: Arc::new(mac_server::MacServerClient::new(&settings.mac_server_url)?),
        })
    }
}

/// Read-only queries against the environment. Never mutates hardware.
#[derive(Clone)]
pub struct HardwareFacts {
    link: Arc<dyn LinkPort>,
    address: Arc<dyn AddressSource>,
    otp: Arc<dyn OtpMemory>,
}

impl HardwareFacts {
    pub fn new(hw: &EthernetHardware) -> Self {
        Self {
            link: Arc::clone(&hw.link),
            address: Arc::clone(&hw.address),
            otp: Arc::clone(&hw.otp),
        }
    }

    pub fn link_speed(&self) -> Mbps {
        self.link.speed()
    }

    pub fn local_ipv4(&self) -> Option<Ipv4Addr> {
        self.address.ipv4()
    }

    /// Raw provisioning memory contents.
    pub fn provisioning_memory(&self) -> Result<Vec<u8>, HardwareError> {
        self.otp.read()
    }
}
