//! Defines the structures for the ECHONET Lite "specified message format" frame.

pub mod codec;

pub use codec::{deserialize_frame, serialize_frame};

/// Well-known ECHONET Object id for a generic air-conditioner.
pub const OBJECT_AIRCON: u32 = 0x013001;
/// Well-known ECHONET Object id for a controller (the node issuing requests).
pub const OBJECT_CONTROLLER: u32 = 0x05FF01;

/// ECHONET Lite service codes (ESV).
///
/// Unknown values round-trip byte-for-byte via the `Unknown` variant; their
/// `Display` rendering is the literal string "Unknown", matching the
/// source protocol's fallback behavior for unrecognized service codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Esv {
    SetI,
    SetC,
    Get,
    InfReq,
    SetGet,
    SetReq,
    GetRes,
    Inf,
    InfC,
    InfCRes,
    SetGetRes,
    SetISna,
    SetCSna,
    GetSna,
    InfSna,
    SetGetSna,
    /// A service code this crate does not assign a name to.
    Unknown(u8),
}

impl Esv {
    pub fn byte(self) -> u8 {
        match self {
            Self::SetI => 0x60,
            Self::SetC => 0x61,
            Self::Get => 0x62,
            Self::InfReq => 0x63,
            Self::SetGet => 0x6E,
            Self::SetReq => 0x71,
            Self::GetRes => 0x72,
            Self::Inf => 0x73,
            Self::InfC => 0x74,
            Self::InfCRes => 0x7A,
            Self::SetGetRes => 0x7E,
            Self::SetISna => 0x50,
            Self::SetCSna => 0x51,
            Self::GetSna => 0x52,
            Self::InfSna => 0x53,
            Self::SetGetSna => 0x5E,
            Self::Unknown(b) => b,
        }
    }
}

impl From<u8> for Esv {
    fn from(value: u8) -> Self {
        match value {
            0x60 => Self::SetI,
            0x61 => Self::SetC,
            0x62 => Self::Get,
            0x63 => Self::InfReq,
            0x6E => Self::SetGet,
            0x71 => Self::SetReq,
            0x72 => Self::GetRes,
            0x73 => Self::Inf,
            0x74 => Self::InfC,
            0x7A => Self::InfCRes,
            0x7E => Self::SetGetRes,
            0x50 => Self::SetISna,
            0x51 => Self::SetCSna,
            0x52 => Self::GetSna,
            0x53 => Self::InfSna,
            0x5E => Self::SetGetSna,
            other => Self::Unknown(other),
        }
    }
}

impl std::fmt::Display for Esv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SetI => "SetI",
            Self::SetC => "SetC",
            Self::Get => "Get",
            Self::InfReq => "InfReq",
            Self::SetGet => "SetGet",
            Self::SetReq => "SetReq",
            Self::GetRes => "GetRes",
            Self::Inf => "Inf",
            Self::InfC => "InfC",
            Self::InfCRes => "InfCRes",
            Self::SetGetRes => "SetGetRes",
            Self::SetISna => "SetISna",
            Self::SetCSna => "SetCSna",
            Self::GetSna => "GetSna",
            Self::InfSna => "InfSna",
            Self::SetGetSna => "SetGetSna",
            Self::Unknown(_) => "Unknown",
        };
        f.write_str(name)
    }
}

/// A single (code, value) pair carried in a `SpecifiedMessage`'s property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub epc: u8,
    pub edt: Vec<u8>,
}

impl Property {
    pub fn new(epc: u8, edt: Vec<u8>) -> Self {
        Self { epc, edt }
    }
}

/// The ECHONET Lite Data (EDATA) body: source/destination objects, service
/// code, and an ordered property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifiedMessage {
    pub seoj: u32,
    pub deoj: u32,
    pub esv: Esv,
    pub properties: Vec<Property>,
}

/// A full ECHONET Lite frame: fixed 4-byte header plus an embedded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub ehd1: u8,
    pub ehd2: u8,
    pub tid: u16,
    pub edata: SpecifiedMessage,
}

/// `EHD1` value for the "specified message format" used throughout this crate.
pub const EHD1_SPECIFIED: u8 = 0x10;
/// `EHD2` value for the "specified message format" used throughout this crate.
pub const EHD2_SPECIFIED: u8 = 0x81;

impl Frame {
    /// Builds a frame with the specified-message header bytes and the given tid/body.
    pub fn new(tid: u16, edata: SpecifiedMessage) -> Self {
        Self {
            ehd1: EHD1_SPECIFIED,
            ehd2: EHD2_SPECIFIED,
            tid,
            edata,
        }
    }
}
