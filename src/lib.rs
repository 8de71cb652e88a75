//! A local-network controller for ECHONET Lite residential air-conditioner
//! units: frame codec, multicast controller, and a device-semantics layer
//! for issuing batched property queries and decoding the typed responses.
//!
//! Sending `Set` commands, multi-interface binding, IPv6, rate limiting,
//! retransmission, and authenticated transport are out of scope — this
//! crate only realizes ECHONET Lite `Get` queries over IPv4 multicast.

pub mod controller;
pub mod device;
pub mod error;
pub mod frame;
pub mod property_map;
mod registry;

pub use controller::Controller;
pub use device::AirconDevice;
pub use error::EchonetError;
pub use frame::{Esv, Frame, Property, SpecifiedMessage};
