//! MAC address values and the provisioning record stored in OTP memory.
//!
//! The OTP region holds a 36-character UUID (`8-4-4-4-12`). Its node
//! field (the final 12 hex digits) is the unit's MAC address and must
//! carry the manufacturer prefix. An erased region reads back as zeros.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::CoreError;

/// Manufacturer OUI fixed in the upper half of every address.
pub const MAC_PREFIX: &str = "001E06";

/// Length of a MAC address in hex characters.
pub const MAC_HEX_LEN: usize = 12;

/// Length of the UUID text stored in OTP memory.
pub const RECORD_LEN: usize = 36;

/// Positions of the dashes in the UUID layout.
const DASH_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// A manufacturer-prefixed MAC address, stored as 12 upper-case hex digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse 12 hex digits (any case). The prefix must match [`MAC_PREFIX`].
    pub fn parse(hex: &str) -> Result<Self, CoreError> {
        if hex.len() != MAC_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidMac(format!(
                "'{hex}' is not {MAC_HEX_LEN} hex digits"
            )));
        }
        let normalized = hex.to_ascii_uppercase();
        if !normalized.starts_with(MAC_PREFIX) {
            return Err(CoreError::InvalidMac(format!(
                "'{normalized}' lacks manufacturer prefix {MAC_PREFIX}"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower 6 hex digits, the only part ever reported to the JIG host.
    pub fn suffix(&self) -> &str {
        &self.0[MAC_PREFIX.len()..]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Provisioning record
// ---------------------------------------------------------------------------

/// Structural check of an allocation record or OTP read-back.
///
/// Trailing NUL padding after the record is tolerated; anything else
/// (erased memory, truncation, bad separators, non-hex digits, foreign
/// prefix) is rejected.
pub fn verify_record(raw: &[u8]) -> Result<MacAddress, CoreError> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let (record, padding) = raw.split_at(end);

    if record.is_empty() {
        return Err(CoreError::InvalidRecord("memory is erased".into()));
    }
    if padding.iter().any(|&b| b != 0) {
        return Err(CoreError::InvalidRecord(
            "data after record terminator".into(),
        ));
    }
    if record.len() != RECORD_LEN {
        return Err(CoreError::InvalidRecord(format!(
            "record is {} bytes, expected {RECORD_LEN}",
            record.len()
        )));
    }

    for (idx, &b) in record.iter().enumerate() {
        let ok = if DASH_POSITIONS.contains(&idx) {
            b == b'-'
        } else {
            b.is_ascii_hexdigit()
        };
        if !ok {
            return Err(CoreError::InvalidRecord(format!(
                "unexpected byte 0x{b:02x} at offset {idx}"
            )));
        }
    }

    // Checked above: the record is pure ASCII.
    let text = String::from_utf8_lossy(record);
    MacAddress::parse(&text[RECORD_LEN - MAC_HEX_LEN..])
}
