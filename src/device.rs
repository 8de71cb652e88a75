//! Air-conditioner EPC constants, the query builder, and the response view
//! whose accessors decode each EPC into a typed value.

use crate::controller::Controller;
use crate::error::EchonetError;
use crate::frame::{Esv, Property, SpecifiedMessage, OBJECT_AIRCON, OBJECT_CONTROLLER};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::time::Duration;

pub const EPC_OPERATION_STATUS: u8 = 0x80;
pub const EPC_IDENTIFICATION_NUMBER: u8 = 0x83;
pub const EPC_INSTANTANEOUS_POWER_CONSUMPTION: u8 = 0x84;
pub const EPC_CUMULATIVE_POWER_CONSUMPTION: u8 = 0x85;
pub const EPC_FAULT_STATUS: u8 = 0x88;
pub const EPC_AIRFLOW_RATE: u8 = 0xA0;
pub const EPC_OPERATION_MODE: u8 = 0xB0;
pub const EPC_TEMPERATURE_SETTING: u8 = 0xB3;
pub const EPC_HUMIDITY_SETTING: u8 = 0xB4;
pub const EPC_ROOM_HUMIDITY: u8 = 0xBA;
pub const EPC_ROOM_TEMPERATURE: u8 = 0xBB;
pub const EPC_OUTDOOR_TEMPERATURE: u8 = 0xBE;

const QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Decoded operation mode (EPC `0xB0`). Values outside `0x40..=0x45` are a
/// decode error, not a representable variant — unlike `Esv`, this field has
/// no "unknown" fallback because the wire encoding only ever uses this
/// six-value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Other,
    Auto,
    Cooling,
    Heating,
    Dehumidification,
    Ventilating,
}

impl TryFrom<u8> for OperationMode {
    type Error = EchonetError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x40 => Ok(Self::Other),
            0x41 => Ok(Self::Auto),
            0x42 => Ok(Self::Cooling),
            0x43 => Ok(Self::Heating),
            0x44 => Ok(Self::Dehumidification),
            0x45 => Ok(Self::Ventilating),
            other => Err(EchonetError::UnexpectedValue(other)),
        }
    }
}

/// Facade over a `Controller` exposing ECHONET Lite queries in terms of
/// air-conditioner EPCs.
pub struct AirconDevice<'a> {
    controller: &'a Controller,
}

impl<'a> AirconDevice<'a> {
    pub fn new(controller: &'a Controller) -> Self {
        Self { controller }
    }

    pub fn request(&self) -> QueryRequest<'a> {
        QueryRequest {
            controller: self.controller,
            epcs: BTreeSet::new(),
        }
    }
}

/// A builder that accumulates a set of EPCs to request in a single
/// multicast GET query. Duplicate `.add_epc()` calls collapse by
/// construction since `epcs` is a set.
#[derive(Clone)]
pub struct QueryRequest<'a> {
    controller: &'a Controller,
    epcs: BTreeSet<u8>,
}

impl<'a> QueryRequest<'a> {
    pub fn add_epc(mut self, epc: u8) -> Self {
        self.epcs.insert(epc);
        self
    }

    pub fn operation_status(self) -> Self {
        self.add_epc(EPC_OPERATION_STATUS)
    }

    pub fn identification_number(self) -> Self {
        self.add_epc(EPC_IDENTIFICATION_NUMBER)
    }

    pub fn instantaneous_power_consumption(self) -> Self {
        self.add_epc(EPC_INSTANTANEOUS_POWER_CONSUMPTION)
    }

    pub fn cumulative_power_consumption(self) -> Self {
        self.add_epc(EPC_CUMULATIVE_POWER_CONSUMPTION)
    }

    pub fn fault_status(self) -> Self {
        self.add_epc(EPC_FAULT_STATUS)
    }

    pub fn airflow_rate(self) -> Self {
        self.add_epc(EPC_AIRFLOW_RATE)
    }

    pub fn operation_mode(self) -> Self {
        self.add_epc(EPC_OPERATION_MODE)
    }

    pub fn temperature_setting(self) -> Self {
        self.add_epc(EPC_TEMPERATURE_SETTING)
    }

    pub fn humidity_setting(self) -> Self {
        self.add_epc(EPC_HUMIDITY_SETTING)
    }

    pub fn room_humidity(self) -> Self {
        self.add_epc(EPC_ROOM_HUMIDITY)
    }

    pub fn room_temperature(self) -> Self {
        self.add_epc(EPC_ROOM_TEMPERATURE)
    }

    pub fn outdoor_temperature(self) -> Self {
        self.add_epc(EPC_OUTDOOR_TEMPERATURE)
    }

    /// Issues the multicast GET query and decodes every `GetRes` reply into
    /// a `QueryResponse`. A negative or malformed reply is folded into a
    /// deferred `QueryFailed`, returned alongside whatever valid responses
    /// the same batch produced — callers can see both at once, matching
    /// the query's best-effort, partial-result contract.
    pub async fn query(self) -> Result<(Vec<QueryResponse>, Option<EchonetError>), EchonetError> {
        let mut frame = self.controller.create_frame();
        frame.edata = SpecifiedMessage {
            seoj: OBJECT_CONTROLLER,
            deoj: OBJECT_AIRCON,
            esv: Esv::Get,
            properties: self
                .epcs
                .iter()
                .map(|epc| Property::new(*epc, vec![]))
                .collect(),
        };

        let raw_responses = self
            .controller
            .query_builder()
            .with_timeout(QUERY_TIMEOUT)
            .query(frame)
            .await?;

        Ok(fold_responses(raw_responses))
    }
}

/// Splits raw `(peer_addr, Frame)` replies into decoded `QueryResponse`s and
/// at most one deferred `QueryFailed`, one per non-`GetRes` reply observed
/// (only the last such error is kept, the rest only logged) — matching
/// `QueryRequest::query`'s best-effort, partial-result contract. Factored
/// out of `query()` so the folding logic is testable without a socket.
fn fold_responses(
    raw_responses: Vec<(SocketAddr, crate::frame::Frame)>,
) -> (Vec<QueryResponse>, Option<EchonetError>) {
    let mut responses = Vec::new();
    let mut last_error = None;
    for (peer_addr, frame) in raw_responses {
        if frame.edata.esv != Esv::GetRes {
            warn!(
                "[device] {} replied with non-GetRes esv {}, deferring QueryFailed",
                peer_addr, frame.edata.esv
            );
            last_error = Some(EchonetError::QueryFailed);
            continue;
        }
        let mut data = BTreeMap::new();
        for property in frame.edata.properties {
            data.insert(property.epc, property.edt);
        }
        responses.push(QueryResponse { peer_addr, data });
    }
    (responses, last_error)
}

/// A single responder's decoded property set.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub peer_addr: SocketAddr,
    data: BTreeMap<u8, Vec<u8>>,
}

impl QueryResponse {
    fn edt(&self, epc: u8) -> Result<&[u8], EchonetError> {
        self.data
            .get(&epc)
            .map(Vec::as_slice)
            .ok_or(EchonetError::NoResponseForEpc(epc))
    }

    pub fn operation_status(&self) -> Result<bool, EchonetError> {
        let edt = self.edt(EPC_OPERATION_STATUS)?;
        match edt.first() {
            Some(0x30) => Ok(true),
            Some(0x31) => Ok(false),
            _ => Err(EchonetError::UnexpectedValue(EPC_OPERATION_STATUS)),
        }
    }

    /// The EDT's first byte must be `0xFE`; the remaining 16 bytes are the
    /// manufacturer identification payload, copied out verbatim.
    pub fn identification_number(&self) -> Result<[u8; 16], EchonetError> {
        let edt = self.edt(EPC_IDENTIFICATION_NUMBER)?;
        if edt.first() != Some(&0xFE) {
            return Err(EchonetError::UnsupportedValue(EPC_IDENTIFICATION_NUMBER));
        }
        let mut id = [0u8; 16];
        let body = &edt[1..];
        let len = body.len().min(16);
        id[..len].copy_from_slice(&body[..len]);
        Ok(id)
    }

    pub fn instantaneous_power_consumption(&self) -> Result<u16, EchonetError> {
        let edt = self.edt(EPC_INSTANTANEOUS_POWER_CONSUMPTION)?;
        if edt.len() < 2 {
            return Err(EchonetError::WrongLength);
        }
        Ok(u16::from_be_bytes([edt[0], edt[1]]))
    }

    pub fn cumulative_power_consumption(&self) -> Result<u32, EchonetError> {
        let edt = self.edt(EPC_CUMULATIVE_POWER_CONSUMPTION)?;
        if edt.len() < 4 {
            return Err(EchonetError::WrongLength);
        }
        Ok(u32::from_be_bytes([edt[0], edt[1], edt[2], edt[3]]))
    }

    pub fn fault_status(&self) -> Result<bool, EchonetError> {
        let edt = self.edt(EPC_FAULT_STATUS)?;
        match edt.first() {
            Some(0x41) => Ok(true),
            Some(0x42) => Ok(false),
            _ => Err(EchonetError::UnexpectedValue(EPC_FAULT_STATUS)),
        }
    }

    /// Returns `(rate, auto)`: `0x41` means automatic airflow (rate 0);
    /// any other byte is `byte - 0x30` with `auto = false`.
    pub fn airflow_rate(&self) -> Result<(u8, bool), EchonetError> {
        let edt = self.edt(EPC_AIRFLOW_RATE)?;
        let byte = *edt.first().ok_or(EchonetError::WrongLength)?;
        if byte == 0x41 {
            Ok((0, true))
        } else {
            Ok((byte.wrapping_sub(0x30), false))
        }
    }

    pub fn operation_mode(&self) -> Result<OperationMode, EchonetError> {
        let edt = self.edt(EPC_OPERATION_MODE)?;
        let byte = *edt.first().ok_or(EchonetError::WrongLength)?;
        OperationMode::try_from(byte)
    }

    pub fn temperature_setting(&self) -> Result<u8, EchonetError> {
        self.edt(EPC_TEMPERATURE_SETTING)?
            .first()
            .copied()
            .ok_or(EchonetError::WrongLength)
    }

    pub fn humidity_setting(&self) -> Result<u8, EchonetError> {
        self.edt(EPC_HUMIDITY_SETTING)?
            .first()
            .copied()
            .ok_or(EchonetError::WrongLength)
    }

    pub fn room_humidity(&self) -> Result<u8, EchonetError> {
        self.edt(EPC_ROOM_HUMIDITY)?
            .first()
            .copied()
            .ok_or(EchonetError::WrongLength)
    }

    /// Read as an unsigned byte even though the originating metric's help
    /// text claims a signed -127..125°C range. This matches observed
    /// source behavior; treat it as a likely upstream bug rather than a
    /// spec requirement to silently "fix".
    pub fn room_temperature(&self) -> Result<u8, EchonetError> {
        self.edt(EPC_ROOM_TEMPERATURE)?
            .first()
            .copied()
            .ok_or(EchonetError::WrongLength)
    }

    /// See `room_temperature` — same unsigned-byte-despite-signed-range note.
    pub fn outdoor_temperature(&self) -> Result<u8, EchonetError> {
        self.edt(EPC_OUTDOOR_TEMPERATURE)?
            .first()
            .copied()
            .ok_or(EchonetError::WrongLength)
    }
}
