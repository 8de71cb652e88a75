//! Bit-exact (de)serialization of ECHONET Lite frames, specified messages,
//! and properties. Pure functions, no I/O.

use crate::error::EchonetError;
use crate::frame::{Esv, Frame, Property, SpecifiedMessage, EHD1_SPECIFIED, EHD2_SPECIFIED};
use log::trace;

/// Serializes a frame into `ehd1, ehd2, tid_hi, tid_lo, ...edata`.
pub fn serialize_frame(frame: &Frame) -> Result<Vec<u8>, EchonetError> {
    let mut out = Vec::with_capacity(4 + 8);
    out.push(frame.ehd1);
    out.push(frame.ehd2);
    out.push((frame.tid >> 8) as u8);
    out.push((frame.tid & 0xff) as u8);
    out.extend(serialize_specified_message(&frame.edata)?);
    trace!("serialized frame: tid={:#06x}, len={}", frame.tid, out.len());
    Ok(out)
}

/// Serializes the 6-byte SEOJ/DEOJ, ESV, OPC, and each property in order.
pub fn serialize_specified_message(message: &SpecifiedMessage) -> Result<Vec<u8>, EchonetError> {
    if message.properties.len() > 255 {
        return Err(EchonetError::TooManyProperties);
    }

    let mut out = Vec::with_capacity(8);
    out.push(((message.seoj >> 16) & 0xff) as u8);
    out.push(((message.seoj >> 8) & 0xff) as u8);
    out.push((message.seoj & 0xff) as u8);
    out.push(((message.deoj >> 16) & 0xff) as u8);
    out.push(((message.deoj >> 8) & 0xff) as u8);
    out.push((message.deoj & 0xff) as u8);
    out.push(message.esv.byte());
    out.push(message.properties.len() as u8);

    for property in &message.properties {
        out.extend(serialize_property(property)?);
    }

    Ok(out)
}

/// Serializes a single property as `epc, pdc, ...edt`.
pub fn serialize_property(property: &Property) -> Result<Vec<u8>, EchonetError> {
    if property.edt.len() > 255 {
        return Err(EchonetError::WrongLength);
    }
    let mut out = Vec::with_capacity(2 + property.edt.len());
    out.push(property.epc);
    out.push(property.edt.len() as u8);
    out.extend_from_slice(&property.edt);
    Ok(out)
}

/// Requires at least 4 header bytes; rejects anything whose header prefix
/// isn't `0x10 0x81`.
pub fn deserialize_frame(data: &[u8]) -> Result<Frame, EchonetError> {
    if data.len() < 4 {
        return Err(EchonetError::UnsupportedFrame);
    }
    let ehd1 = data[0];
    let ehd2 = data[1];
    if ehd1 != EHD1_SPECIFIED || ehd2 != EHD2_SPECIFIED {
        return Err(EchonetError::UnsupportedFrame);
    }
    let tid = ((data[2] as u16) << 8) | data[3] as u16;
    let edata = deserialize_specified_message(&data[4..])?;
    trace!("deserialized frame: tid={:#06x}", tid);
    Ok(Frame {
        ehd1,
        ehd2,
        tid,
        edata,
    })
}

/// Reads 3-byte big-endian SEOJ/DEOJ, 1-byte ESV, 1-byte OPC, then walks the
/// remainder parsing properties. The parsed property count must equal OPC.
pub fn deserialize_specified_message(data: &[u8]) -> Result<SpecifiedMessage, EchonetError> {
    if data.len() < 8 {
        return Err(EchonetError::WrongLength);
    }
    let seoj = ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | data[2] as u32;
    let deoj = ((data[3] as u32) << 16) | ((data[4] as u32) << 8) | data[5] as u32;
    let esv = Esv::from(data[6]);
    let opc = data[7] as usize;

    let properties = deserialize_properties(&data[8..])?;
    if properties.len() != opc {
        return Err(EchonetError::ElementsMismatch);
    }

    Ok(SpecifiedMessage {
        seoj,
        deoj,
        esv,
        properties,
    })
}

/// Walks a byte slice holding zero or more back-to-back `epc, pdc, edt...`
/// entries, copying each `edt` into owned storage.
pub fn deserialize_properties(data: &[u8]) -> Result<Vec<Property>, EchonetError> {
    let mut properties = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        if offset + 2 > data.len() {
            return Err(EchonetError::WrongLength);
        }
        let pdc = data[offset + 1] as usize;
        let end = offset
            .checked_add(pdc + 2)
            .ok_or(EchonetError::WrongLength)?;
        if end > data.len() {
            return Err(EchonetError::WrongLength);
        }
        properties.push(deserialize_property(&data[offset..end])?);
        offset = end;
    }
    Ok(properties)
}

/// Expects exactly `pdc + 2` bytes: `epc, pdc, ...edt`.
pub fn deserialize_property(data: &[u8]) -> Result<Property, EchonetError> {
    if data.len() < 2 {
        return Err(EchonetError::WrongLength);
    }
    let epc = data[0];
    let pdc = data[1] as usize;
    if pdc + 2 != data.len() {
        return Err(EchonetError::WrongLength);
    }
    Ok(Property {
        epc,
        edt: data[2..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_frame_with_no_properties() {
        let frame = Frame::new(
            0x1234,
            SpecifiedMessage {
                seoj: 0x123456,
                deoj: 0x789ABC,
                esv: Esv::SetI,
                properties: vec![],
            },
        );
        let bytes = serialize_frame(&frame).unwrap();
        assert_eq!(
            bytes,
            vec![0x10, 0x81, 0x12, 0x34, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x60, 0x00]
        );
        let decoded = deserialize_frame(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn golden_property_with_data() {
        let property = Property::new(0x10, vec![0x01, 0x02]);
        let bytes = serialize_property(&property).unwrap();
        assert_eq!(bytes, vec![0x10, 0x02, 0x01, 0x02]);
        let decoded = deserialize_property(&bytes).unwrap();
        assert_eq!(decoded, property);
    }

    #[test]
    fn golden_message_with_one_property() {
        let message = SpecifiedMessage {
            seoj: 0x123456,
            deoj: 0x789ABC,
            esv: Esv::SetI,
            properties: vec![Property::new(0x10, vec![0x01, 0x02])],
        };
        let bytes = serialize_specified_message(&message).unwrap();
        assert_eq!(
            bytes,
            vec![0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x60, 0x01, 0x10, 0x02, 0x01, 0x02]
        );
    }

    #[test]
    fn property_list_decoding() {
        let data = [0x01, 0x02, 0x02, 0x03, 0x04, 0x03, 0x05, 0x06, 0x07];
        let properties = deserialize_properties(&data).unwrap();
        assert_eq!(
            properties,
            vec![
                Property::new(0x01, vec![0x02, 0x03]),
                Property::new(0x04, vec![0x05, 0x06, 0x07]),
            ]
        );
    }

    #[test]
    fn opc_mismatch_is_rejected() {
        // Declared opc=1, but two properties actually follow.
        let data = [
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x60, 0x01, // header, opc=1
            0x01, 0x00, // property 1
            0x02, 0x00, // property 2 (unexpected)
        ];
        assert_eq!(
            deserialize_specified_message(&data),
            Err(EchonetError::ElementsMismatch)
        );
    }

    #[test]
    fn pdc_overrunning_buffer_is_rejected() {
        let data = [0x01, 0x05, 0x00, 0x00]; // pdc=5 but only 2 bytes follow
        assert_eq!(
            deserialize_properties(&data),
            Err(EchonetError::WrongLength)
        );
    }

    #[test]
    fn bad_header_is_rejected() {
        let data = [0x10, 0x80, 0x00, 0x00];
        assert_eq!(deserialize_frame(&data), Err(EchonetError::UnsupportedFrame));
    }

    #[test]
    fn too_short_is_rejected() {
        assert_eq!(
            deserialize_frame(&[0x10, 0x81, 0x00]),
            Err(EchonetError::UnsupportedFrame)
        );
    }

    #[test]
    fn too_many_properties_is_rejected() {
        let properties = (0..=255).map(|i| Property::new(i, vec![])).collect::<Vec<_>>();
        let message = SpecifiedMessage {
            seoj: 0,
            deoj: 0,
            esv: Esv::Get,
            properties,
        };
        assert_eq!(
            serialize_specified_message(&message),
            Err(EchonetError::TooManyProperties)
        );
    }

    #[test]
    fn wrong_length_edt_is_rejected() {
        let property = Property::new(0x80, vec![0u8; 256]);
        assert_eq!(serialize_property(&property), Err(EchonetError::WrongLength));
    }

    #[test]
    fn unknown_esv_round_trips_and_displays_unknown() {
        let esv = Esv::from(0xFF);
        assert_eq!(esv, Esv::Unknown(0xFF));
        assert_eq!(esv.byte(), 0xFF);
        assert_eq!(esv.to_string(), "Unknown");
    }
}
