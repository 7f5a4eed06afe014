//! Serial frame codec shared by the JIG host and the device agent.
//!
//! Requests arrive as packed 19-byte frames:
//!
//! ```text
//! @ | cmd | ui_id(4) | gid(2) | did(3) | action | extra(6) | #
//! ```
//!
//! Responses are 38-byte comma separated records:
//!
//! ```text
//! @,S,<gid:02>,<did:04>,<status>,<data:>20>,#\r\n
//! ```
//!
//! Device handlers never see the envelope; they produce a [`DeviceReply`]
//! which the dispatcher wraps with [`Response::from_reply`].

use std::fmt;

use crate::error::CoreError;

/// Total size of an encoded response, terminator included.
pub const RESPONSE_SIZE: usize = 38;

/// Total size of a packed request frame.
pub const REQUEST_SIZE: usize = 19;

/// Width of the response data field.
pub const DATA_WIDTH: usize = 20;

/// Width of the zero-padded numeric payload produced by device handlers.
pub const VALUE_WIDTH: usize = 6;

/// Largest value representable in [`VALUE_WIDTH`] digits.
pub const VALUE_MAX: u32 = 999_999;

const FRAME_START: char = '@';
const FRAME_END: char = '#';
const RESPONSE_CMD: char = 'S';

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Status marker carried in every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
    /// Unit finished initialisation and is ready for requests.
    Init,
    /// A write-class operation is in progress.
    Write,
}

impl Status {
    pub fn as_char(self) -> char {
        match self {
            Status::Pass => 'P',
            Status::Fail => 'F',
            Status::Init => 'I',
            Status::Write => 'W',
        }
    }

    pub fn from_char(c: char) -> Result<Self, CoreError> {
        match c {
            'P' => Ok(Status::Pass),
            'F' => Ok(Status::Fail),
            'I' => Ok(Status::Init),
            'W' => Ok(Status::Write),
            other => Err(CoreError::Frame(format!("unknown status marker '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Device addressing
// ---------------------------------------------------------------------------

/// Operation class encoded in the tens digit of a device id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    ReadClear,
    WriteSet,
    Link,
    Reserved,
}

/// `did = class * 10 + index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAddress {
    pub class: DeviceClass,
    pub index: u8,
}

impl DeviceAddress {
    pub fn from_did(did: u16) -> Result<Self, CoreError> {
        let class = match did / 10 {
            0 => DeviceClass::ReadClear,
            1 => DeviceClass::WriteSet,
            2 => DeviceClass::Link,
            3 => DeviceClass::Reserved,
            _ => return Err(CoreError::Frame(format!("device id {did} out of range"))),
        };
        Ok(Self {
            class,
            index: (did % 10) as u8,
        })
    }

    pub fn did(&self) -> u16 {
        let class = match self.class {
            DeviceClass::ReadClear => 0,
            DeviceClass::WriteSet => 1,
            DeviceClass::Link => 2,
            DeviceClass::Reserved => 3,
        };
        class * 10 + u16::from(self.index)
    }
}

/// GPIO-only addressing: `did = action * 1000 + pin`, action 0 = clear, 1 = set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioAddress {
    pub set: bool,
    pub pin: u16,
}

impl GpioAddress {
    pub fn from_did(did: u16) -> Result<Self, CoreError> {
        let set = match did / 1000 {
            0 => false,
            1 => true,
            _ => return Err(CoreError::Frame(format!("gpio device id {did} out of range"))),
        };
        Ok(Self {
            set,
            pin: did % 1000,
        })
    }

    pub fn did(&self) -> u16 {
        u16::from(self.set) * 1000 + self.pin
    }
}

// ---------------------------------------------------------------------------
// Device replies
// ---------------------------------------------------------------------------

/// Handler result before it is wrapped into the wire envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReply {
    pub pass: bool,
    pub payload: String,
}

impl DeviceReply {
    /// Numeric payload, zero padded to [`VALUE_WIDTH`] digits.
    ///
    /// Values above [`VALUE_MAX`] are clamped so the field width never grows.
    pub fn number(pass: bool, value: u32) -> Self {
        Self {
            pass,
            payload: format!("{:0width$}", value.min(VALUE_MAX), width = VALUE_WIDTH),
        }
    }

    /// Short textual payload. Commas and anything outside printable ASCII
    /// would break the fixed-width envelope and are replaced; anything
    /// beyond [`DATA_WIDTH`] characters is dropped.
    pub fn text(pass: bool, value: &str) -> Self {
        let payload = value
            .trim()
            .chars()
            .map(|c| {
                if c == ',' || !(c.is_ascii_graphic() || c == ' ') {
                    '_'
                } else {
                    c
                }
            })
            .take(DATA_WIDTH)
            .collect();
        Self { pass, payload }
    }

    /// The uniform failure reply: fail status, all-zero payload.
    pub fn zero_fail() -> Self {
        Self::number(false, 0)
    }

    pub fn status(&self) -> Status {
        if self.pass {
            Status::Pass
        } else {
            Status::Fail
        }
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// A decoded response record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub gid: u8,
    pub did: u16,
    pub status: Status,
    /// Data field without its padding.
    pub data: String,
}

impl Response {
    pub fn from_reply(gid: u8, did: u16, reply: DeviceReply) -> Self {
        Self {
            gid,
            did,
            status: reply.status(),
            data: reply.payload,
        }
    }

    /// One-off announcement sent after all device groups have initialised.
    pub fn ready() -> Self {
        Self {
            gid: 0,
            did: 0,
            status: Status::Init,
            data: "READY".to_string(),
        }
    }

    pub fn encode(&self) -> String {
        let data: String = self.data.chars().take(DATA_WIDTH).collect();
        format!(
            "{FRAME_START},{RESPONSE_CMD},{:02},{:04},{},{:>width$},{FRAME_END}\r\n",
            self.gid % 100,
            self.did % 10_000,
            self.status.as_char(),
            data,
            width = DATA_WIDTH,
        )
    }

    pub fn decode(line: &str) -> Result<Self, CoreError> {
        let body = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = body.split(',').collect();

        let [start, cmd, gid, did, status, data, end] = fields.as_slice() else {
            return Err(CoreError::Frame(format!(
                "expected 7 fields, found {}",
                fields.len()
            )));
        };

        if *start != "@" || *end != "#" {
            return Err(CoreError::Frame("missing frame delimiters".into()));
        }
        if *cmd != "S" {
            return Err(CoreError::Frame(format!("unexpected command '{cmd}'")));
        }
        let data_chars = data.chars().count();
        if data_chars != DATA_WIDTH {
            return Err(CoreError::Frame(format!(
                "data field is {data_chars} characters, expected {DATA_WIDTH}"
            )));
        }

        let mut status_chars = status.chars();
        let status = match (status_chars.next(), status_chars.next()) {
            (Some(c), None) => Status::from_char(c)?,
            _ => return Err(CoreError::Frame(format!("bad status field '{status}'"))),
        };

        Ok(Self {
            gid: parse_digits(gid, 2, "gid")? as u8,
            did: parse_digits(did, 4, "did")? as u16,
            status,
            data: data.trim_start().to_string(),
        })
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encode().trim_end())
    }
}

// ---------------------------------------------------------------------------
// Request frame
// ---------------------------------------------------------------------------

/// A decoded request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub cmd: char,
    pub ui_id: String,
    pub gid: u8,
    pub did: u16,
    pub action: char,
    /// Extra data such as a response delay; opaque to the dispatcher.
    pub extra: String,
}

impl Request {
    /// Decode a packed frame.
    ///
    /// Decoding starts at the last `@` marker, so leading noise and the
    /// remains of a truncated earlier frame are ignored.
    pub fn decode(raw: &str) -> Result<Self, CoreError> {
        let start = raw
            .rfind(FRAME_START)
            .ok_or_else(|| CoreError::Frame("no start marker".into()))?;
        let frame = raw[start..].trim_end();

        if !frame.is_ascii() {
            return Err(CoreError::Frame("non-ASCII frame".into()));
        }
        if frame.len() != REQUEST_SIZE {
            return Err(CoreError::Frame(format!(
                "request is {} bytes, expected {REQUEST_SIZE}",
                frame.len()
            )));
        }
        if !frame.ends_with(FRAME_END) {
            return Err(CoreError::Frame("missing end marker".into()));
        }

        let bytes = frame.as_bytes();
        Ok(Self {
            cmd: char::from(bytes[1]),
            ui_id: frame[2..6].to_string(),
            gid: parse_digits(&frame[6..8], 2, "gid")? as u8,
            did: parse_digits(&frame[8..11], 3, "did")? as u16,
            action: char::from(bytes[11]),
            extra: frame[12..18].to_string(),
        })
    }

    pub fn encode(&self) -> String {
        format!(
            "{FRAME_START}{}{:>4}{:02}{:03}{}{:>6}{FRAME_END}",
            self.cmd, self.ui_id, self.gid, self.did, self.action, self.extra
        )
    }
}

fn parse_digits(field: &str, width: usize, name: &str) -> Result<u32, CoreError> {
    if field.len() != width || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Frame(format!(
            "{name} field '{field}' is not {width} digits"
        )));
    }
    field
        .parse()
        .map_err(|e| CoreError::Frame(format!("{name} field '{field}': {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
