//! Crate-wide error type.
use std::fmt;
use std::io;

/// Describes everything that can go wrong while encoding, decoding, or
/// exchanging ECHONET Lite frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchonetError {
    /// `Controller::start` was called while a listener was already running.
    AlreadyStarted,
    /// A frame handed to the query primitive was not a well-formed `Get` request.
    NotQueryMessage,
    /// `ehd1`/`ehd2` did not match the "specified message format" prefix `0x10 0x81`.
    UnsupportedFrame,
    /// The declared property count (`opc`) disagreed with the number of properties parsed.
    ElementsMismatch,
    /// More than 255 properties were supplied to the encoder.
    TooManyProperties,
    /// A length field (`pdc`, or a raw buffer slice) didn't match the data it described.
    WrongLength,
    /// A query received at least one non-`GetRes` reply.
    QueryFailed,
    /// A response accessor was invoked for an EPC absent from the decoded property set.
    NoResponseForEpc(u8),
    /// A property's `edt` held a well-formed but out-of-range value.
    UnexpectedValue(u8),
    /// A property's `edt` used an encoding this crate does not support.
    UnsupportedValue(u8),
    /// `decode_property_map` was called on a property outside the `0x9B..=0x9F` range.
    UnexpectedEpc(u8),
    /// The property map's declared count disagreed with the number of EPCs decoded from it.
    PropertyCountMismatched,
    /// A socket operation failed. The originating `io::Error` is not `Clone`/`Eq`,
    /// so only its kind and message are preserved.
    Io { kind: io::ErrorKind, message: String },
}

impl fmt::Display for EchonetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "controller is already started"),
            Self::NotQueryMessage => write!(f, "frame is not a query message"),
            Self::UnsupportedFrame => write!(f, "unsupported frame"),
            Self::ElementsMismatch => write!(f, "the number of elements is mismatched"),
            Self::TooManyProperties => write!(f, "too many properties"),
            Self::WrongLength => write!(f, "wrong length"),
            Self::QueryFailed => write!(f, "query failed"),
            Self::NoResponseForEpc(epc) => write!(f, "no response for epc {:#04x}", epc),
            Self::UnexpectedValue(epc) => write!(f, "unexpected value for epc {:#04x}", epc),
            Self::UnsupportedValue(epc) => write!(f, "unsupported value for epc {:#04x}", epc),
            Self::UnexpectedEpc(epc) => write!(f, "unexpected epc {:#04x}", epc),
            Self::PropertyCountMismatched => {
                write!(f, "the number of properties is mismatched")
            }
            Self::Io { kind, message } => write!(f, "io error ({:?}): {}", kind, message),
        }
    }
}

impl std::error::Error for EchonetError {}

impl From<io::Error> for EchonetError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
