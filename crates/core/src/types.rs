use std::fmt;

use crate::error::CoreError;

/// Link and throughput rates are reported in whole megabits per second.
pub type Mbps = u32;

/// Hardware domain addressed by the two-digit group id of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupId {
    System,
    Storage,
    Usb,
    Hdmi,
    Adc,
    Ethernet,
    Header,
    Audio,
    Led,
    Pwm,
    Ir,
    Gpio,
    Firmware,
}

impl GroupId {
    /// Every group in wire order.
    pub const ALL: [GroupId; 13] = [
        GroupId::System,
        GroupId::Storage,
        GroupId::Usb,
        GroupId::Hdmi,
        GroupId::Adc,
        GroupId::Ethernet,
        GroupId::Header,
        GroupId::Audio,
        GroupId::Led,
        GroupId::Pwm,
        GroupId::Ir,
        GroupId::Gpio,
        GroupId::Firmware,
    ];

    /// Numeric id as carried on the wire.
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            GroupId::System => "system",
            GroupId::Storage => "storage",
            GroupId::Usb => "usb",
            GroupId::Hdmi => "hdmi",
            GroupId::Adc => "adc",
            GroupId::Ethernet => "ethernet",
            GroupId::Header => "header",
            GroupId::Audio => "audio",
            GroupId::Led => "led",
            GroupId::Pwm => "pwm",
            GroupId::Ir => "ir",
            GroupId::Gpio => "gpio",
            GroupId::Firmware => "fw",
        }
    }
}

impl TryFrom<u8> for GroupId {
    type Error = CoreError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        GroupId::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(CoreError::UnknownGroup(id))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
