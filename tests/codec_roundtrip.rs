// tests/codec_roundtrip.rs

use echonet_lite::frame::codec::{deserialize_frame, serialize_frame};
use echonet_lite::{Esv, Frame, Property, SpecifiedMessage};
use proptest::prelude::*;

fn arb_esv() -> impl Strategy<Value = Esv> {
    prop_oneof![
        Just(Esv::SetI),
        Just(Esv::SetC),
        Just(Esv::Get),
        Just(Esv::InfReq),
        Just(Esv::SetGet),
        Just(Esv::SetReq),
        Just(Esv::GetRes),
        Just(Esv::Inf),
        Just(Esv::InfC),
        Just(Esv::InfCRes),
        Just(Esv::SetGetRes),
        Just(Esv::SetISna),
        Just(Esv::SetCSna),
        Just(Esv::GetSna),
        Just(Esv::InfSna),
        Just(Esv::SetGetSna),
        any::<u8>().prop_map(Esv::Unknown),
    ]
}

fn arb_property() -> impl Strategy<Value = Property> {
    (any::<u8>(), proptest::collection::vec(any::<u8>(), 0..32))
        .prop_map(|(epc, edt)| Property::new(epc, edt))
}

fn arb_frame() -> impl Strategy<Value = Frame> {
    (
        any::<u16>(),
        0u32..=0xFFFFFF,
        0u32..=0xFFFFFF,
        arb_esv(),
        proptest::collection::vec(arb_property(), 0..16),
    )
        .prop_map(|(tid, seoj, deoj, esv, properties)| {
            Frame::new(
                tid,
                SpecifiedMessage {
                    seoj,
                    deoj,
                    esv,
                    properties,
                },
            )
        })
}

proptest! {
    #[test]
    fn deserialize_of_serialize_is_identity(frame in arb_frame()) {
        let bytes = serialize_frame(&frame).unwrap();
        let decoded = deserialize_frame(&bytes).unwrap();
        prop_assert_eq!(decoded, frame);
    }
}
