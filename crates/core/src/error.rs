use crate::types::GroupId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown group id: {0}")]
    UnknownGroup(u8),

    #[error("Group {0} has no device handler registered")]
    GroupUnavailable(GroupId),

    #[error("Unknown device index {device} in group {group}")]
    UnknownDevice { group: GroupId, device: u8 },

    #[error("Unknown action '{action}' for device {device}")]
    UnknownAction { device: &'static str, action: char },

    #[error("Malformed frame: {0}")]
    Frame(String),

    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("Invalid provisioning record: {0}")]
    InvalidRecord(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
