use echo_codec::{BinaryCodec, BinaryMode, EchoCodec, TextCodec, TextStyle};
use echo_core::EchoObject;
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = EchoObject> {
    prop_oneof![
        Just(()).prop_map(|_| EchoObject::null()),
        any::<u8>().prop_map(EchoObject::from),
        any::<i16>().prop_map(EchoObject::from),
        any::<i32>().prop_map(EchoObject::from),
        any::<u32>().prop_map(EchoObject::from),
        any::<i64>().prop_map(EchoObject::from),
        any::<u64>().prop_map(EchoObject::from),
        (-1.0e6f64..1.0e6).prop_map(EchoObject::from),
        any::<bool>().prop_map(EchoObject::from),
        "[a-z$]{0,6}".prop_map(EchoObject::from),
        proptest::collection::vec(any::<u8>(), 0..8).prop_map(EchoObject::from),
    ]
}

fn tree() -> impl Strategy<Value = EchoObject> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| EchoObject::from_items(items).unwrap()),
            proptest::collection::btree_map("[a-z$]{1,4}", inner, 0..4)
                .prop_map(|entries| EchoObject::from_entries(entries).unwrap()),
        ]
    })
}

proptest! {
    #[test]
    fn binary_round_trips(node in tree(), fast in any::<bool>()) {
        let mode = if fast { BinaryMode::Fast } else { BinaryMode::Compact };
        let codec = BinaryCodec::new(mode);
        let back = codec.decode(&codec.encode(&node).unwrap()).unwrap();
        prop_assert_eq!(back, node);
    }

    #[test]
    fn text_round_trips(node in tree()) {
        let codec = TextCodec::new(TextStyle::Compact);
        let back = codec.decode(&codec.encode(&node).unwrap()).unwrap();
        prop_assert_eq!(back, node);
    }
}
