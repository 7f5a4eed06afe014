//! Ethernet device group: address, MAC provisioning, throughput and link
//! speed checks.
//!
//! | Index | Device | `I`          | `R`              | `W`              | `S` / `C`         |
//! |-------|--------|--------------|------------------|------------------|-------------------|
//! | 0     | IP     | cached octet | live octet       | live octet       | --                |
//! | 1     | MAC    | cached MAC   | cached MAC       | provision + MAC  | --                |
//! | 2     | IPERF  | cached rx    | measure receiver | measure sender   | --                |
//! | 3     | LINK   | cached speed | live speed       | --               | force 1000 / 100  |

use async_trait::async_trait;
use jig_core::action::{ActionCode, EthernetCommand, ThroughputRole};
use jig_core::config::EthernetConfig;
use jig_core::error::CoreError;
use jig_core::mac::verify_record;
use jig_core::protocol::{DeviceAddress, DeviceReply};
use jig_core::retry::RetryPolicy;
use jig_core::state::{EthernetState, LinkSpeed};
use jig_core::types::{GroupId, Mbps};

use crate::dispatcher::DeviceGroup;
use crate::hardware::{EthernetHardware, HardwareFacts};
use crate::link::LinkNegotiator;
use crate::provisioning::{ProvisionOutcome, ProvisioningWriter};
use crate::throughput::ThroughputProbe;

pub struct EthernetModule {
    state: EthernetState,
    config: EthernetConfig,
    facts: HardwareFacts,
    link: LinkNegotiator,
    probe: ThroughputProbe,
    writer: ProvisioningWriter,
}

impl EthernetModule {
    pub fn new(
        hw: EthernetHardware,
        config: EthernetConfig,
        policy: RetryPolicy,
        model: impl Into<String>,
    ) -> Self {
        let facts = HardwareFacts::new(&hw);
        let link = LinkNegotiator::new(hw.link, policy);
        let probe = ThroughputProbe::new(hw.bandwidth, link.clone(), policy);
        let writer = ProvisioningWriter::new(hw.otp, hw.allocator, model);

        Self {
            state: EthernetState::default(),
            config,
            facts,
            link,
            probe,
            writer,
        }
    }

    pub fn state(&self) -> &EthernetState {
        &self.state
    }

    pub fn config(&self) -> &EthernetConfig {
        &self.config
    }

    /// Reset the state and repopulate it from live hardware.
    ///
    /// Runs no throughput probe; the throughput slots stay at 0 until a
    /// measurement is requested.
    pub async fn init(&mut self) {
        self.state = EthernetState::default();
        self.state.ip_address = self.facts.local_ipv4();
        self.load_mac();
        self.state.link_speed = self.observe_link();

        match serde_json::to_string(&self.state) {
            Ok(snapshot) => tracing::info!(
                state = %snapshot,
                peer = %self.config.peer_address,
                threshold_mbps = self.config.pass_threshold_mbps,
                "Ethernet module initialised",
            ),
            Err(e) => tracing::warn!(error = %e, "Cannot serialize Ethernet state"),
        }
    }

    pub async fn execute(&mut self, command: EthernetCommand) -> DeviceReply {
        match command {
            EthernetCommand::IpCached => self.ip_reply(),
            EthernetCommand::IpRead => {
                self.state.ip_address = self.facts.local_ipv4();
                self.ip_reply()
            }

            EthernetCommand::MacCached => self.mac_reply(),
            EthernetCommand::MacWrite => {
                match self.writer.provision(self.state.mac()).await {
                    ProvisionOutcome::Provisioned(mac) | ProvisionOutcome::AlreadyProvisioned(mac) => {
                        self.state.set_verified_mac(mac);
                    }
                    ProvisionOutcome::Failed(_) => {}
                }
                self.mac_reply()
            }

            EthernetCommand::ThroughputCached => self.threshold_reply(self.state.receiver_mbps),
            EthernetCommand::ThroughputMeasure(role) => self.measure(role).await,

            EthernetCommand::LinkCached => self.link_reply(),
            EthernetCommand::LinkRead => {
                self.state.link_speed = self.observe_link();
                self.link_reply()
            }
            EthernetCommand::LinkForce(target) => self.force_link(target).await,
        }
    }

    async fn measure(&mut self, role: ThroughputRole) -> DeviceReply {
        self.state.ip_address = self.facts.local_ipv4();
        if !self.state.has_address() {
            tracing::warn!(role = role.marker(), "No IPv4 address, skipping throughput probe");
            return DeviceReply::zero_fail();
        }

        let mbps = self.probe.measure(role, &self.config.peer_address).await;
        match role {
            ThroughputRole::Receiver => self.state.receiver_mbps = mbps,
            ThroughputRole::Sender => self.state.sender_mbps = mbps,
        }
        // The probe may have renegotiated the link.
        self.state.link_speed = self.observe_link();

        self.threshold_reply(mbps)
    }

    async fn force_link(&mut self, target: Mbps) -> DeviceReply {
        if self.link.current_speed() != target && !self.link.negotiate(target).await {
            tracing::warn!(target, "Link did not reach forced speed");
        }

        self.state.link_speed = self.observe_link();
        let speed = self.state.link_speed.mbps();
        DeviceReply::number(speed == target, speed)
    }

    fn load_mac(&mut self) {
        self.state.clear_mac();

        let raw = match self.facts.provisioning_memory() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read OTP memory");
                return;
            }
        };

        if raw.iter().all(|&b| b == 0) {
            tracing::info!("OTP memory blank, MAC not provisioned");
            return;
        }

        match verify_record(&raw) {
            Ok(mac) => self.state.set_verified_mac(mac),
            Err(e) => tracing::warn!(error = %e, "OTP contents invalid, treating as unprovisioned"),
        }
    }

    fn observe_link(&self) -> LinkSpeed {
        let mbps = self.facts.link_speed();
        let speed = LinkSpeed::from_mbps(mbps);
        if mbps != 0 && !speed.is_up() {
            tracing::warn!(mbps, "Unexpected link rate, recording link as down");
        }
        speed
    }

    fn ip_reply(&self) -> DeviceReply {
        let octet = self.state.ip_last_octet();
        DeviceReply::number(octet != 0, u32::from(octet))
    }

    fn mac_reply(&self) -> DeviceReply {
        match self.state.mac() {
            Some(mac) => DeviceReply::text(true, mac.suffix()),
            None => DeviceReply::zero_fail(),
        }
    }

    fn threshold_reply(&self, mbps: Mbps) -> DeviceReply {
        let pass = mbps > 0 && mbps >= self.config.pass_threshold_mbps;
        DeviceReply::number(pass, mbps)
    }

    fn link_reply(&self) -> DeviceReply {
        let speed = self.state.link_speed.mbps();
        DeviceReply::number(speed != 0, speed)
    }
}

#[async_trait]
impl DeviceGroup for EthernetModule {
    fn group(&self) -> GroupId {
        GroupId::Ethernet
    }

    async fn init(&mut self) {
        EthernetModule::init(self).await;
    }

    async fn check(&mut self, did: u16, action: ActionCode) -> Result<DeviceReply, CoreError> {
        let address = DeviceAddress::from_did(did)?;
        let command = EthernetCommand::parse(address.index, action)?;
        tracing::debug!(did, ?command, "Ethernet request");
        Ok(self.execute(command).await)
    }
}
