//! Action vocabulary shared by all device groups, and the typed command
//! set of the Ethernet group.
//!
//! Raw action characters are parsed once at the boundary; handlers only
//! ever match on closed enums.

use crate::error::CoreError;
use crate::types::GroupId;

/// Single-character action code carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCode {
    /// Report the cached value without touching hardware.
    Init,
    /// Read a current value and refresh the cache.
    Read,
    /// Write-class operation (fuse programming, sender role, ...).
    Write,
    /// Force the "set" mode of a device (e.g. 1000 Mbps link).
    Set,
    /// Force the "clear" mode of a device (e.g. 100 Mbps link).
    Clear,
}

impl ActionCode {
    pub fn as_char(self) -> char {
        match self {
            ActionCode::Init => 'I',
            ActionCode::Read => 'R',
            ActionCode::Write => 'W',
            ActionCode::Set => 'S',
            ActionCode::Clear => 'C',
        }
    }
}

impl TryFrom<char> for ActionCode {
    type Error = CoreError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'I' => Ok(ActionCode::Init),
            'R' => Ok(ActionCode::Read),
            'W' => Ok(ActionCode::Write),
            'S' => Ok(ActionCode::Set),
            'C' => Ok(ActionCode::Clear),
            other => Err(CoreError::UnknownAction {
                device: "any",
                action: other,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Ethernet
// ---------------------------------------------------------------------------

/// Device index of the IP address check.
pub const ETHERNET_IP: u8 = 0;
/// Device index of the MAC provisioning check.
pub const ETHERNET_MAC: u8 = 1;
/// Device index of the throughput check.
pub const ETHERNET_IPERF: u8 = 2;
/// Device index of the link speed check.
pub const ETHERNET_LINK: u8 = 3;

/// Which end of the bandwidth session is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThroughputRole {
    Sender,
    Receiver,
}

impl ThroughputRole {
    /// Marker searched for in the summary lines of the bandwidth tool.
    pub fn marker(self) -> &'static str {
        match self {
            ThroughputRole::Sender => "sender",
            ThroughputRole::Receiver => "receiver",
        }
    }
}

/// Every valid (device, action) pair of the Ethernet group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthernetCommand {
    /// Cached last octet of the interface address.
    IpCached,
    /// Live address query.
    IpRead,
    /// Cached MAC suffix.
    MacCached,
    /// Provision the MAC if needed, then report it.
    MacWrite,
    /// Cached receiver-side throughput.
    ThroughputCached,
    /// Fresh measurement in the given role.
    ThroughputMeasure(ThroughputRole),
    LinkCached,
    LinkRead,
    /// Force the link to the given rate.
    LinkForce(u32),
}

impl EthernetCommand {
    pub fn parse(device: u8, action: ActionCode) -> Result<Self, CoreError> {
        use ActionCode::*;

        let command = match (device, action) {
            (ETHERNET_IP, Init) => Self::IpCached,
            (ETHERNET_IP, Read | Write) => Self::IpRead,

            (ETHERNET_MAC, Init | Read) => Self::MacCached,
            (ETHERNET_MAC, Write) => Self::MacWrite,

            (ETHERNET_IPERF, Init) => Self::ThroughputCached,
            (ETHERNET_IPERF, Read) => Self::ThroughputMeasure(ThroughputRole::Receiver),
            (ETHERNET_IPERF, Write) => Self::ThroughputMeasure(ThroughputRole::Sender),

            (ETHERNET_LINK, Init) => Self::LinkCached,
            (ETHERNET_LINK, Read) => Self::LinkRead,
            (ETHERNET_LINK, Set) => Self::LinkForce(1000),
            (ETHERNET_LINK, Clear) => Self::LinkForce(100),

            (ETHERNET_IP | ETHERNET_MAC | ETHERNET_IPERF | ETHERNET_LINK, other) => {
                return Err(CoreError::UnknownAction {
                    device: device_name(device),
                    action: other.as_char(),
                })
            }
            (other, _) => {
                return Err(CoreError::UnknownDevice {
                    group: GroupId::Ethernet,
                    device: other,
                })
            }
        };

        Ok(command)
    }
}

fn device_name(device: u8) -> &'static str {
    match device {
        ETHERNET_IP => "ethernet.ip",
        ETHERNET_MAC => "ethernet.mac",
        ETHERNET_IPERF => "ethernet.iperf",
        ETHERNET_LINK => "ethernet.link",
        _ => "ethernet",
    }
}
