//! In-memory record of the Ethernet module's last known-good values.
//!
//! Owned by the module and mutated only by its handlers. `I` actions are
//! answered straight from here.

use std::net::Ipv4Addr;

use serde::Serialize;

use crate::mac::MacAddress;
use crate::types::Mbps;

/// Link rates this system negotiates. Anything else counts as down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "u32")]
pub enum LinkSpeed {
    #[default]
    Down,
    Fast,
    Gigabit,
}

impl LinkSpeed {
    pub fn from_mbps(mbps: Mbps) -> Self {
        match mbps {
            100 => LinkSpeed::Fast,
            1000 => LinkSpeed::Gigabit,
            _ => LinkSpeed::Down,
        }
    }

    pub fn mbps(self) -> Mbps {
        match self {
            LinkSpeed::Down => 0,
            LinkSpeed::Fast => 100,
            LinkSpeed::Gigabit => 1000,
        }
    }

    pub fn is_up(self) -> bool {
        self != LinkSpeed::Down
    }
}

impl From<LinkSpeed> for u32 {
    fn from(speed: LinkSpeed) -> Self {
        speed.mbps()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EthernetState {
    pub link_speed: LinkSpeed,
    pub ip_address: Option<Ipv4Addr>,
    /// Most recent receiver-role measurement, 0 after a failed probe.
    pub receiver_mbps: Mbps,
    /// Most recent sender-role measurement.
    pub sender_mbps: Mbps,
    mac: Option<MacAddress>,
}

impl EthernetState {
    /// Last octet of the cached address, 0 when the interface has none.
    pub fn ip_last_octet(&self) -> u8 {
        self.ip_address.map(|ip| ip.octets()[3]).unwrap_or(0)
    }

    pub fn has_address(&self) -> bool {
        self.ip_last_octet() != 0
    }

    pub fn mac(&self) -> Option<&MacAddress> {
        self.mac.as_ref()
    }

    pub fn mac_provisioned(&self) -> bool {
        self.mac.is_some()
    }

    /// Record an address obtained from a verified OTP read.
    pub fn set_verified_mac(&mut self, mac: MacAddress) {
        self.mac = Some(mac);
    }

    pub fn clear_mac(&mut self) {
        self.mac = None;
    }
}
